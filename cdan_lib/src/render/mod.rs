//! The rendering seam: a document service that loads HTML, lets it settle,
//! and answers queries for the artifact anchor.
//!
//! [`StaticRenderer`] parses pages without running scripts. A
//! script-executing engine plugs in by implementing [`DocumentRenderer`].

mod static_dom;

pub use static_dom::StaticRenderer;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors from the rendering service itself, as opposed to "no match".
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("document could not be loaded: {0}")]
    Load(String),
    #[error("unsupported document address {0:?}")]
    UnsupportedAddress(String),
    #[error("document handle {0:?} is not loaded")]
    UnknownHandle(DocumentHandle),
}

/// Opaque reference to a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Attributes of a matched anchor element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRef {
    pub href: Option<String>,
    pub download: Option<String>,
}

/// Result of polling a document until a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Found(ElementRef),
    TimedOut,
}

/// Predicate selecting the anchor that points at the artifact.
///
/// An anchor qualifies when its `download` attribute or its `href` ends in
/// the artifact extension, or its `href` contains the file-hosting segment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkMatcher {
    /// Artifact extension without the dot.
    pub extension: String,
    /// Path segment the service serves generated files under.
    pub hosting_segment: String,
}

impl Default for LinkMatcher {
    fn default() -> Self {
        Self {
            extension: "xlsx".to_string(),
            hosting_segment: "/files/files/".to_string(),
        }
    }
}

impl LinkMatcher {
    pub fn matches(&self, href: Option<&str>, download: Option<&str>) -> bool {
        let suffix = format!(".{}", self.extension);
        download.is_some_and(|d| d.ends_with(&suffix))
            || href.is_some_and(|h| h.ends_with(&suffix) || h.contains(&self.hosting_segment))
    }
}

/// A stateful document service. One document context is used at a time and
/// may be replaced by every `load`/`navigate`.
#[async_trait]
pub trait DocumentRenderer: Send {
    /// Loads `html` as a live document.
    async fn load(&mut self, html: &str) -> Result<DocumentHandle, RenderError>;

    /// Loads the document at `address`. Used with `data:` addresses when
    /// [`DocumentRenderer::load`] rejects the content.
    async fn navigate(&mut self, address: &str) -> Result<DocumentHandle, RenderError>;

    /// Queries the document repeatedly until an anchor satisfying `matcher`
    /// appears, or `deadline` elapses. The first match in document order wins.
    async fn poll_for_element(
        &mut self,
        handle: DocumentHandle,
        matcher: &LinkMatcher,
        deadline: Duration,
    ) -> Result<PollOutcome, RenderError>;
}

const DATA_URL_PREFIX: &str = "data:text/html,";

/// In-memory document address carrying `html`.
pub fn data_url(html: &str) -> String {
    format!("{}{}", DATA_URL_PREFIX, urlencoding::encode(html))
}

/// Inverse of [`data_url`]. `None` for other addresses or bad escapes.
pub fn decode_data_url(address: &str) -> Option<String> {
    let encoded = address.strip_prefix(DATA_URL_PREFIX)?;
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
