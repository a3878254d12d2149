//! Error types for the library layer.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::render::RenderError;

/// Startup failures. Any of these aborts the run before a target is tried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("target list is empty")]
    EmptyTargets,
    #[error("failed to parse target list: {0}")]
    TargetsJson(#[from] serde_json::Error),
    #[error("target list contains no targets")]
    NoTargets,
    #[error("duplicate target id {0:?}")]
    DuplicateTarget(String),
    #[error("targets {0:?} and {1:?} would be saved under the same file name")]
    DuplicateArtifactName(String, String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Classification of a per-target failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Submission,
    ChallengeUnresolvable,
    FormSubmission,
    Render,
    LinkNotFound,
    Download,
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Submission => "submission failed",
            Self::ChallengeUnresolvable => "challenge unresolvable",
            Self::FormSubmission => "form submission failed",
            Self::Render => "render failed",
            Self::LinkNotFound => "link not found",
            Self::Download => "download failed",
            Self::Write => "write failed",
        };
        f.write_str(label)
    }
}

/// Why a single target's acquisition stopped short of a saved artifact.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("job submission failed: {0}")]
    Submission(#[source] cdan_api::Error),
    #[error("{0}")]
    ChallengeUnresolvable(String),
    #[error("progress form submission failed: {0}")]
    FormSubmission(#[source] cdan_api::Error),
    #[error("result page could not be rendered: {0}")]
    Render(#[from] RenderError),
    #[error("no result link found within {}s", .0.as_secs())]
    LinkNotFound(Duration),
    #[error("download failed: {0}")]
    Download(#[source] cdan_api::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AcquisitionError {
    /// Maps a submission-stage client error, keeping SSO failures apart
    /// from transport failures.
    pub fn from_submission(err: cdan_api::Error) -> Self {
        match err {
            cdan_api::Error::ChallengeUnresolvable(reason) => Self::ChallengeUnresolvable(reason),
            other => Self::Submission(other),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Submission(_) => FailureKind::Submission,
            Self::ChallengeUnresolvable(_) => FailureKind::ChallengeUnresolvable,
            Self::FormSubmission(_) => FailureKind::FormSubmission,
            Self::Render(_) => FailureKind::Render,
            Self::LinkNotFound(_) => FailureKind::LinkNotFound,
            Self::Download(_) => FailureKind::Download,
            Self::Write { .. } => FailureKind::Write,
        }
    }

    /// HTTP status behind a download failure, when the service sent one.
    pub fn download_status(&self) -> Option<u16> {
        match self {
            Self::Download(cdan_api::Error::HttpStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
