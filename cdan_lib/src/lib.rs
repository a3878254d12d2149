//! Library layer for CDAN report acquisition: configuration, target loading,
//! result-link rendering, artifact persistence and the per-target orchestrator.
//!
//! Wraps the `cdan_api` session client and drives one acquisition per target,
//! isolating failures so a run always reaches the last target.

pub mod acquire;
pub mod artifact;
pub mod config;
pub mod error;
pub mod link;
pub mod render;
pub mod targets;

pub use cdan_api;
pub use cdan_api::{Client, Endpoints, Query, ReportQuery, ReportTemplate};

pub use acquire::{Acquirer, Progress, RunReport, Stage, TargetOutcome};
pub use artifact::Artifact;
pub use config::FetchConfig;
pub use error::{AcquisitionError, ConfigError, FailureKind};
pub use link::ResultLink;
pub use render::{DocumentRenderer, LinkMatcher, RenderError, StaticRenderer};
pub use targets::{load_targets, Target};
