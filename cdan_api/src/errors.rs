//! Error types for the job-service client.

/// Errors that can occur while talking to the job-execution service.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be sent or its body could not be read
    /// (connection failure, timeout, TLS).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// An SSO challenge arrived without a usable follow-up address, or
    /// arrived again after the single re-authentication attempt.
    #[error("SSO challenge could not be resolved: {0}")]
    ChallengeUnresolvable(String),
    /// The configured base address is not an absolute http(s) URL.
    #[error("invalid base address {0:?}")]
    InvalidBaseUrl(String),
}
