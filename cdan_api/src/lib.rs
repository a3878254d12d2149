//! Client for the CDAN SAS job-execution service.
//!
//! Covers the remote half of report acquisition: building the job query,
//! submitting it over a cookie-backed session, answering the SSO challenge,
//! resolving the auto-submitting progress form and retrieving artifacts.

mod address;
mod challenge;
mod client;
mod errors;
mod form;
mod query;

pub use self::address::resolve_reference;
pub use self::challenge::Challenge;
pub use self::client::{
    ChallengeStep, Client, Endpoints, JobResponse, ResolvedPage, Submission, SSO_CHALLENGE_STATUS,
};
pub use self::errors::Error;
pub use self::form::IntermediateForm;
pub use self::query::{Query, ReportQuery, ReportTemplate};
