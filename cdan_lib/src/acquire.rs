//! Per-target acquisition: submit, answer the SSO challenge, resolve the
//! progress form, find the result link, download and save.
//!
//! Targets run one at a time in input order over a single session and a
//! single renderer. A failed target is logged and classified; the run always
//! moves on to the next one after the pacing delay.

use std::fmt;
use std::path::PathBuf;

use cdan_api::{ChallengeStep, Client};
use tokio::time::sleep;
use tracing::Instrument;

use crate::artifact::Artifact;
use crate::config::FetchConfig;
use crate::error::{AcquisitionError, ConfigError};
use crate::link::resolve_link;
use crate::render::DocumentRenderer;
use crate::targets::Target;

/// Steps a target passes through on its way to a saved artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Submitted,
    Challenged,
    Reauthenticated,
    Resubmitted,
    FormResolved,
    LinkResolved,
    Downloaded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::Submitted => "submitted",
            Self::Challenged => "challenged",
            Self::Reauthenticated => "reauthenticated",
            Self::Resubmitted => "resubmitted",
            Self::FormResolved => "form resolved",
            Self::LinkResolved => "link resolved",
            Self::Downloaded => "downloaded",
        };
        f.write_str(label)
    }
}

impl From<ChallengeStep> for Stage {
    fn from(step: ChallengeStep) -> Self {
        match step {
            ChallengeStep::Challenged => Self::Challenged,
            ChallengeStep::Reauthenticated => Self::Reauthenticated,
            ChallengeStep::Resubmitted => Self::Resubmitted,
        }
    }
}

/// Terminal result for one target.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Target,
    pub result: Result<PathBuf, AcquisitionError>,
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a run, in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Events emitted while a run progresses.
#[derive(Debug)]
pub enum Progress<'a> {
    Started {
        index: usize,
        total: usize,
        target: &'a Target,
    },
    Finished(&'a TargetOutcome),
}

/// Drives acquisitions for a list of targets over one session.
pub struct Acquirer<R> {
    client: Client,
    renderer: R,
    config: FetchConfig,
}

impl<R: DocumentRenderer> Acquirer<R> {
    pub fn new(client: Client, renderer: R, config: FetchConfig) -> Self {
        Self {
            client,
            renderer,
            config,
        }
    }

    /// Builds the session client from `config`.
    pub fn from_config(config: FetchConfig, renderer: R) -> Result<Self, ConfigError> {
        let client = config.client()?;
        Ok(Self::new(client, renderer, config))
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Runs every target in order, reporting through `on_progress`.
    ///
    /// The session is warmed up once first; a failed warm-up is only logged.
    /// Failures never stop the loop.
    pub async fn run<F>(&mut self, targets: &[Target], mut on_progress: F) -> RunReport
    where
        F: FnMut(Progress<'_>),
    {
        if let Err(err) = self.client.warm_up().await {
            tracing::warn!(error = %err, "session warm-up failed, continuing");
        }

        let mut report = RunReport::default();
        let total = targets.len();
        for (index, target) in targets.iter().enumerate() {
            if index > 0 && !self.config.pacing.is_zero() {
                sleep(self.config.pacing).await;
            }
            on_progress(Progress::Started {
                index,
                total,
                target,
            });

            let result = self.acquire(target).await;
            if let Err(err) = &result {
                tracing::error!(
                    id = %target.id,
                    name = %target.name,
                    kind = %err.kind(),
                    error = %err,
                    "acquisition failed"
                );
            }
            report.outcomes.push(TargetOutcome {
                target: target.clone(),
                result,
            });
            if let Some(outcome) = report.outcomes.last() {
                on_progress(Progress::Finished(outcome));
            }
        }
        report
    }

    /// Acquires one target's artifact and returns where it was saved.
    pub async fn acquire(&mut self, target: &Target) -> Result<PathBuf, AcquisitionError> {
        let span = tracing::info_span!("target", id = %target.id, name = %target.name);
        self.acquire_inner(target).instrument(span).await
    }

    async fn acquire_inner(&mut self, target: &Target) -> Result<PathBuf, AcquisitionError> {
        let mut stage = Stage::Start;

        let query = self.config.report.for_state(&target.id);
        let submission = self
            .client
            .submit_observed(&query, |step| advance(&mut stage, step.into()))
            .await
            .map_err(AcquisitionError::from_submission)?;
        if !submission.challenged {
            advance(&mut stage, Stage::Submitted);
        }
        if submission.response.status >= 400 {
            tracing::warn!(
                status = submission.response.status,
                "job endpoint returned an error status, searching the page anyway"
            );
        }

        let page = self
            .client
            .resolve_page(submission.response.body)
            .await
            .map_err(AcquisitionError::FormSubmission)?;
        if page.form_submitted {
            advance(&mut stage, Stage::FormResolved);
        }

        let link = resolve_link(
            &mut self.renderer,
            &page.body,
            &self.config.link,
            self.config.poll_deadline,
            self.config.request_timeout,
        )
        .await?;
        advance(&mut stage, Stage::LinkResolved);
        tracing::info!(link = %link, "found result link");

        let artifact =
            Artifact::fetch(&self.client, &link, self.config.artifact_path(target)).await?;
        artifact.persist().await?;
        advance(&mut stage, Stage::Downloaded);
        tracing::info!(path = %artifact.path.display(), bytes = artifact.bytes.len(), "saved artifact");
        Ok(artifact.path)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "stage");
    *stage = next;
}
