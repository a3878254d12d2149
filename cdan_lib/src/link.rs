//! Locating the artifact link inside a resolved result page.

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::AcquisitionError;
use crate::render::{data_url, DocumentRenderer, LinkMatcher, PollOutcome, RenderError};

/// Address of a target's artifact as it appeared in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLink(String);

impl ResultLink {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slack granted to a renderer past the poll deadline before it is
/// abandoned.
const POLL_GRACE: Duration = Duration::from_secs(1);

/// Loads `page` into the renderer and waits for the artifact anchor.
///
/// When the renderer rejects the content, the page is loaded a second time
/// through an in-memory `data:` address and queried once more. A match
/// without an `href` counts as not found.
///
/// Each load is bounded by `load_timeout`. A load that runs out of time
/// counts as rejected. Polling is abandoned once `deadline` plus a short
/// grace period has passed, whatever the renderer does.
pub async fn resolve_link<R>(
    renderer: &mut R,
    page: &str,
    matcher: &LinkMatcher,
    deadline: Duration,
    load_timeout: Duration,
) -> Result<ResultLink, AcquisitionError>
where
    R: DocumentRenderer + ?Sized,
{
    let loaded = timeout(load_timeout, renderer.load(page))
        .await
        .unwrap_or_else(|_| Err(load_timed_out(load_timeout)));
    let handle = match loaded {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(error = %err, "renderer rejected page, retrying via data URL");
            timeout(load_timeout, renderer.navigate(&data_url(page)))
                .await
                .unwrap_or_else(|_| Err(load_timed_out(load_timeout)))?
        }
    };

    let polled = timeout(
        deadline + POLL_GRACE,
        renderer.poll_for_element(handle, matcher, deadline),
    )
    .await;
    match polled {
        Ok(outcome) => match outcome? {
            PollOutcome::Found(element) => element
                .href
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty())
                .map(ResultLink::new)
                .ok_or(AcquisitionError::LinkNotFound(deadline)),
            PollOutcome::TimedOut => Err(AcquisitionError::LinkNotFound(deadline)),
        },
        Err(_) => {
            tracing::warn!(?deadline, "renderer overran the poll deadline");
            Err(AcquisitionError::LinkNotFound(deadline))
        }
    }
}

fn load_timed_out(limit: Duration) -> RenderError {
    RenderError::Load(format!("no document after {:?}", limit))
}
