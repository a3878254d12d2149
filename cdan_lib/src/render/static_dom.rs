//! Renderer that parses the page as static HTML.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::time::{sleep, Instant};

use super::{
    decode_data_url, DocumentHandle, DocumentRenderer, ElementRef, LinkMatcher, PollOutcome,
    RenderError,
};

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static anchor selector is valid"));

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Parses pages with `scraper` and answers anchor queries against the
/// markup as served. Embedded scripts are not executed, so a link that only
/// a script would insert is never found.
pub struct StaticRenderer {
    current: Option<(DocumentHandle, String)>,
    next_id: u64,
    poll_interval: Duration,
}

impl Default for StaticRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn replace_document(&mut self, html: String) -> DocumentHandle {
        let handle = DocumentHandle::new(self.next_id);
        self.next_id += 1;
        self.current = Some((handle, html));
        handle
    }
}

/// First qualifying anchor in document order.
fn find_anchor(html: &str, matcher: &LinkMatcher) -> Option<ElementRef> {
    let doc = Html::parse_document(html);
    doc.select(&ANCHOR_SELECTOR).find_map(|a| {
        let href = a.value().attr("href");
        let download = a.value().attr("download");
        matcher.matches(href, download).then(|| ElementRef {
            href: href.map(str::to_string),
            download: download.map(str::to_string),
        })
    })
}

#[async_trait]
impl DocumentRenderer for StaticRenderer {
    async fn load(&mut self, html: &str) -> Result<DocumentHandle, RenderError> {
        Ok(self.replace_document(html.to_string()))
    }

    async fn navigate(&mut self, address: &str) -> Result<DocumentHandle, RenderError> {
        let html = decode_data_url(address)
            .ok_or_else(|| RenderError::UnsupportedAddress(address.to_string()))?;
        Ok(self.replace_document(html))
    }

    async fn poll_for_element(
        &mut self,
        handle: DocumentHandle,
        matcher: &LinkMatcher,
        deadline: Duration,
    ) -> Result<PollOutcome, RenderError> {
        let html = match &self.current {
            Some((current, html)) if *current == handle => html.clone(),
            _ => return Err(RenderError::UnknownHandle(handle)),
        };
        let started = Instant::now();
        loop {
            if let Some(element) = find_anchor(&html, matcher) {
                return Ok(PollOutcome::Found(element));
            }
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return Ok(PollOutcome::TimedOut);
            }
            sleep(self.poll_interval.min(deadline - elapsed)).await;
        }
    }
}
