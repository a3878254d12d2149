//! Shared helpers for acquisition integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cdan_lib::render::{DocumentHandle, ElementRef, PollOutcome};
use cdan_lib::{DocumentRenderer, Endpoints, FetchConfig, LinkMatcher, RenderError};
use wiremock::MockServer;

pub const RESULT_PAGE: &str = r#"<html><body>
    <h1>FIRST Crash Report</h1>
    <a href="/SASJobExecution/help">Help</a>
    <a href="/files/files/ca.xlsx" download="CrashReport.xlsx">Download Excel</a>
</body></html>"#;

pub const PROGRESS_PAGE: &str = r#"<html><body onload="document.ProgressForm.submit()">
    <form name="ProgressForm" method="post" action="/SASJobExecution/progress">
      <input type="hidden" name="_jobid" value="job-42">
      <input type="hidden" name="_program" value="/Public/OTRA/Apps/FIRST/FIRST">
    </form></body></html>"#;

pub const EMPTY_RESULT_PAGE: &str =
    r#"<html><body><p>The job is still running.</p><a href="/query">Back</a></body></html>"#;

pub const XLSX_BYTES: &[u8] = b"PK\x03\x04\x14\x00fake-xlsx-payload";

/// Config pointing at the mock server with short timings.
pub fn test_config(server: &MockServer, out_dir: &Path) -> FetchConfig {
    FetchConfig {
        endpoints: Endpoints::default().with_base_url(&server.uri()),
        out_dir: out_dir.to_path_buf(),
        pacing: Duration::ZERO,
        poll_deadline: Duration::from_millis(200),
        poll_interval: Duration::from_millis(10),
        ..FetchConfig::default()
    }
}

/// What a [`ScriptedRenderer`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Load(String),
    Navigate(String),
    Poll,
}

/// Renderer that replays scripted poll outcomes in order. Once the script
/// runs out every poll times out.
pub struct ScriptedRenderer {
    outcomes: VecDeque<PollOutcome>,
    reject_load: bool,
    calls: Arc<Mutex<Vec<RenderCall>>>,
    next_id: u64,
}

impl ScriptedRenderer {
    pub fn new(outcomes: Vec<PollOutcome>) -> Self {
        Self {
            outcomes: outcomes.into(),
            reject_load: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: 1,
        }
    }

    pub fn found(href: &str) -> PollOutcome {
        PollOutcome::Found(ElementRef {
            href: Some(href.to_string()),
            download: None,
        })
    }

    /// Makes every `load` fail so the data URL fallback is taken.
    pub fn rejecting_load(mut self) -> Self {
        self.reject_load = true;
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<RenderCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn handle(&mut self) -> DocumentHandle {
        let handle = DocumentHandle::new(self.next_id);
        self.next_id += 1;
        handle
    }
}

#[async_trait]
impl DocumentRenderer for ScriptedRenderer {
    async fn load(&mut self, html: &str) -> Result<DocumentHandle, RenderError> {
        self.record(RenderCall::Load(html.to_string()));
        if self.reject_load {
            return Err(RenderError::Load("content rejected".into()));
        }
        Ok(self.handle())
    }

    async fn navigate(&mut self, address: &str) -> Result<DocumentHandle, RenderError> {
        self.record(RenderCall::Navigate(address.to_string()));
        Ok(self.handle())
    }

    async fn poll_for_element(
        &mut self,
        _handle: DocumentHandle,
        _matcher: &LinkMatcher,
        deadline: Duration,
    ) -> Result<PollOutcome, RenderError> {
        self.record(RenderCall::Poll);
        match self.outcomes.pop_front() {
            Some(PollOutcome::Found(element)) => Ok(PollOutcome::Found(element)),
            _ => {
                tokio::time::sleep(deadline).await;
                Ok(PollOutcome::TimedOut)
            }
        }
    }
}

/// Renderer that never finishes any request.
pub struct HangingRenderer;

#[async_trait]
impl DocumentRenderer for HangingRenderer {
    async fn load(&mut self, _html: &str) -> Result<DocumentHandle, RenderError> {
        std::future::pending().await
    }

    async fn navigate(&mut self, _address: &str) -> Result<DocumentHandle, RenderError> {
        std::future::pending().await
    }

    async fn poll_for_element(
        &mut self,
        _handle: DocumentHandle,
        _matcher: &LinkMatcher,
        _deadline: Duration,
    ) -> Result<PollOutcome, RenderError> {
        std::future::pending().await
    }
}
