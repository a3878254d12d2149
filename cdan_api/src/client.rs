//! Session-bound HTTP client for the SAS job-execution service.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Deserialize;
use url::Url;

use crate::{
    address::resolve_reference, challenge::Challenge, form::IntermediateForm, query::Query, Error,
};

/// Status the service returns when the caller must re-authenticate.
pub const SSO_CHALLENGE_STATUS: u16 = 449;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_ARTIFACT_TIMEOUT: Duration = Duration::from_secs(120);
const PREVIEW_LEN: usize = 400;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Addresses and routing fields of the job service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Scheme and host every relative reference resolves against.
    pub base_url: String,
    /// Job-execution endpoint, relative to `base_url`.
    pub job_path: String,
    /// Interactive query page. Sent as the referer and visited once to
    /// seed the session cookies.
    pub query_path: String,
    /// `_program` routing field.
    pub program: String,
    /// `_apphostname` routing field.
    pub app_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "https://cdan.dot.gov".to_string(),
            job_path: "/SASJobExecution/?sso_guest=true".to_string(),
            query_path: "/query".to_string(),
            program: "/Public/OTRA/Apps/FIRST/FIRST".to_string(),
            app_host: "cdan.dot.gov".to_string(),
        }
    }
}

impl Endpoints {
    /// Same endpoints against a different host. Used for testing with wiremock.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Checks that the base address is an absolute http(s) URL and returns
    /// its origin.
    pub fn origin(&self) -> Result<String, Error> {
        let url = Url::parse(&self.base_url)
            .map_err(|_| Error::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(url.origin().ascii_serialization())
    }

    pub fn job_url(&self) -> String {
        resolve_reference(&self.base_url, &self.job_path)
    }

    pub fn query_url(&self) -> String {
        resolve_reference(&self.base_url, &self.query_path)
    }
}

/// Raw answer to a POST against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResponse {
    pub status: u16,
    pub body: String,
}

impl JobResponse {
    pub fn is_challenge(&self) -> bool {
        self.status == SSO_CHALLENGE_STATUS
    }
}

/// Outcome of a job submission, including whether the SSO path ran.
#[derive(Debug, Clone)]
pub struct Submission {
    pub response: JobResponse,
    /// Set when the first attempt was challenged and re-submitted.
    pub challenged: bool,
}

/// Steps of the SSO path, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStep {
    /// The first submission answered with the challenge status.
    Challenged,
    /// The follow-up address was visited.
    Reauthenticated,
    /// The query was sent a second time.
    Resubmitted,
}

/// The page to search for the result link.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    pub body: String,
    /// Set when a progress form was found and submitted.
    pub form_submitted: bool,
}

/// HTTP client for the job service.
///
/// Holds the session for a whole run: one `reqwest::Client` with a cookie
/// store, so cookies set during warm-up or re-authentication apply to every
/// later request. Requests carry the headers of an interactive same-origin
/// page.
pub struct Client {
    endpoints: Endpoints,
    origin: String,
    http: reqwest::Client,
    request_timeout: Duration,
    artifact_timeout: Duration,
}

impl Client {
    /// Creates a client pointing at the production service.
    pub fn new() -> Result<Self, Error> {
        Self::with_endpoints(Endpoints::default())
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_endpoints(Endpoints::default().with_base_url(base_url))
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Result<Self, Error> {
        let origin = endpoints.origin()?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            endpoints,
            origin,
            http,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            artifact_timeout: DEFAULT_ARTIFACT_TIMEOUT,
        })
    }

    /// Overrides the per-request timeouts. `request` applies to every call
    /// except artifact retrieval, which uses `artifact`.
    pub fn with_timeouts(mut self, request: Duration, artifact: Duration) -> Self {
        self.request_timeout = request;
        self.artifact_timeout = artifact;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Absolute address for a reference found in a response.
    pub fn absolute_url(&self, reference: &str) -> String {
        resolve_reference(&self.endpoints.base_url, reference)
    }

    fn interactive(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("referer", self.endpoints.query_url())
            .header("origin", &self.origin)
    }

    /// Visits the query page so the service can set its initial cookies.
    pub async fn warm_up(&self) -> Result<(), Error> {
        let resp = self
            .http
            .get(self.endpoints.query_url())
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: preview(&resp.text().await.unwrap_or_default()),
            });
        }
        Ok(())
    }

    /// Submits the job query once. Any status, including the challenge
    /// status, is returned to the caller.
    pub async fn submit_job(&self, query: &impl Query) -> Result<JobResponse, Error> {
        let query_string = query.to_query_string();
        let form = [
            ("SASQueryString", query_string.as_str()),
            ("_program", self.endpoints.program.as_str()),
            ("_apphostname", self.endpoints.app_host.as_str()),
        ];
        let resp = self
            .interactive(self.http.post(self.endpoints.job_url()))
            .header("x-requested-with", "XMLHttpRequest")
            .header("accept", "*/*")
            .form(&form)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        tracing::debug!(
            status,
            length = body.len(),
            preview = %preview(&body),
            "job submission response"
        );
        Ok(JobResponse { status, body })
    }

    /// Follows a challenge's address so the session picks up fresh cookies.
    /// The response body is ignored.
    pub async fn reauthenticate(&self, challenge: &Challenge) -> Result<(), Error> {
        let auth_url = self.absolute_url(&challenge.uri);
        tracing::info!(url = %auth_url, "following SSO auth URI");
        let resp = self
            .interactive(self.http.get(&auth_url))
            .timeout(self.request_timeout)
            .send()
            .await?;
        tracing::debug!(status = resp.status().as_u16(), "SSO auth response");
        Ok(())
    }

    /// Submits the job query, answering at most one SSO challenge.
    ///
    /// On a challenge, the follow-up address is visited and the query is
    /// re-submitted exactly once. A challenge without a usable address, a
    /// failed re-authentication request, or a second challenge all yield
    /// [`Error::ChallengeUnresolvable`].
    pub async fn submit_with_challenge(&self, query: &impl Query) -> Result<Submission, Error> {
        self.submit_observed(query, |_| {}).await
    }

    /// Same as [`Client::submit_with_challenge`], reporting each challenge
    /// step to `on_step` as soon as it has happened, including on the
    /// paths that end in an error.
    pub async fn submit_observed<F>(
        &self,
        query: &impl Query,
        mut on_step: F,
    ) -> Result<Submission, Error>
    where
        F: FnMut(ChallengeStep),
    {
        let first = self.submit_job(query).await?;
        if !first.is_challenge() {
            return Ok(Submission {
                response: first,
                challenged: false,
            });
        }
        on_step(ChallengeStep::Challenged);

        let challenge = Challenge::from_body(&first.body).ok_or_else(|| {
            Error::ChallengeUnresolvable("challenge response carried no follow-up URI".into())
        })?;
        self.reauthenticate(&challenge).await.map_err(|e| {
            Error::ChallengeUnresolvable(format!("re-authentication request failed: {}", e))
        })?;
        on_step(ChallengeStep::Reauthenticated);

        let retry = self.submit_job(query).await?;
        on_step(ChallengeStep::Resubmitted);
        if retry.is_challenge() {
            return Err(Error::ChallengeUnresolvable(
                "challenged again after re-authentication".into(),
            ));
        }
        Ok(Submission {
            response: retry,
            challenged: true,
        })
    }

    /// Posts a progress form's fields to its action, once.
    pub async fn submit_form(&self, form: &IntermediateForm) -> Result<JobResponse, Error> {
        let action = match form.action.as_deref() {
            Some(action) => self.absolute_url(action),
            None => self.endpoints.job_url(),
        };
        tracing::info!(action = %action, fields = form.fields.len(), "submitting progress form");
        let resp = self
            .interactive(self.http.post(&action))
            .form(&form.fields)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        tracing::debug!(status, length = body.len(), "progress form response");
        Ok(JobResponse { status, body })
    }

    /// Resolves the page holding the result link. A body without a
    /// progress form is passed through untouched; otherwise the form is
    /// submitted once and its response is the page. Nested forms in that
    /// response are not followed.
    pub async fn resolve_page(&self, body: String) -> Result<ResolvedPage, Error> {
        match IntermediateForm::extract(&body) {
            None => Ok(ResolvedPage {
                body,
                form_submitted: false,
            }),
            Some(form) => {
                let resp = self.submit_form(&form).await?;
                Ok(ResolvedPage {
                    body: resp.body,
                    form_submitted: true,
                })
            }
        }
    }

    /// Retrieves an artifact. `reference` may be relative to the base.
    pub async fn download(&self, reference: &str) -> Result<Vec<u8>, Error> {
        let url = self.absolute_url(reference);
        tracing::info!(url = %url, "downloading artifact");
        let resp = self
            .interactive(self.http.get(&url))
            .timeout(self.artifact_timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: preview(&resp.text().await.unwrap_or_default()),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Short single-line rendering of a response body for logs.
fn preview(body: &str) -> String {
    let cut = body
        .char_indices()
        .nth(PREVIEW_LEN)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    body[..cut].replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.job_url(),
            "https://cdan.dot.gov/SASJobExecution/?sso_guest=true"
        );
        assert_eq!(endpoints.query_url(), "https://cdan.dot.gov/query");
        assert_eq!(endpoints.origin().unwrap(), "https://cdan.dot.gov");
    }

    #[test]
    fn rejects_relative_base() {
        let endpoints = Endpoints::default().with_base_url("cdan.dot.gov");
        assert!(matches!(endpoints.origin(), Err(Error::InvalidBaseUrl(_))));
        let endpoints = Endpoints::default().with_base_url("ftp://cdan.dot.gov");
        assert!(endpoints.origin().is_err());
    }

    #[test]
    fn origin_drops_path() {
        let endpoints = Endpoints::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(endpoints.origin().unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn preview_truncates_and_escapes() {
        let body = format!("line1\nline2{}", "x".repeat(1000));
        let p = preview(&body);
        assert!(p.starts_with("line1\\nline2"));
        assert_eq!(p.chars().filter(|c| *c == 'x').count(), PREVIEW_LEN - 11);
    }

    #[test]
    fn challenge_status_detection() {
        let resp = JobResponse {
            status: SSO_CHALLENGE_STATUS,
            body: String::new(),
        };
        assert!(resp.is_challenge());
    }
}
