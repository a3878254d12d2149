//! Run configuration: defaults, an optional TOML file, then environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cdan_api::{Client, Endpoints, ReportTemplate};
use serde::Deserialize;

use crate::artifact::artifact_path;
use crate::error::ConfigError;
use crate::render::LinkMatcher;
use crate::targets::Target;

/// Everything a run needs besides the target list. Built once at startup
/// and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub endpoints: Endpoints,
    pub report: ReportTemplate,
    pub link: LinkMatcher,
    /// Directory artifacts are written to.
    pub out_dir: PathBuf,
    /// Fixed part of every artifact name, between target name and extension.
    pub suffix: String,
    /// Pause between consecutive targets.
    pub pacing: Duration,
    pub request_timeout: Duration,
    pub artifact_timeout: Duration,
    /// How long the result page may take to show its link.
    pub poll_deadline: Duration,
    pub poll_interval: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            report: ReportTemplate::default(),
            link: LinkMatcher::default(),
            out_dir: PathBuf::from("scraped"),
            suffix: "dui-data".to_string(),
            pacing: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
            artifact_timeout: Duration::from_secs(120),
            poll_deadline: Duration::from_secs(180),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    endpoints: Endpoints,
    report: ReportTemplate,
    link: LinkMatcher,
    output: OutputSection,
    timing: TimingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OutputSection {
    dir: Option<PathBuf>,
    suffix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimingSection {
    pacing_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    artifact_timeout_secs: Option<u64>,
    poll_deadline_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
}

impl FetchConfig {
    /// Parses a TOML document. Omitted keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let defaults = Self::default();
        let timing = file.timing;
        Ok(Self {
            endpoints: file.endpoints,
            report: file.report,
            link: file.link,
            out_dir: file.output.dir.unwrap_or(defaults.out_dir),
            suffix: file.output.suffix.unwrap_or(defaults.suffix),
            pacing: timing
                .pacing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
            request_timeout: timing
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            artifact_timeout: timing
                .artifact_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.artifact_timeout),
            poll_deadline: timing
                .poll_deadline_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_deadline),
            poll_interval: timing
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        })
    }

    /// Defaults, overlaid with the TOML file at `path` when given, then with
    /// `CDAN_*` environment variables. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `CDAN_BASE_URL`, `CDAN_OUT_DIR`, `CDAN_PACING_MS` and
    /// `CDAN_POLL_DEADLINE_SECS` as returned by `lookup`. Unparsable numbers
    /// are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup("CDAN_BASE_URL") {
            self.endpoints = self.endpoints.with_base_url(&base_url);
        }
        if let Some(dir) = lookup("CDAN_OUT_DIR") {
            self.out_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_u64(&lookup, "CDAN_PACING_MS") {
            self.pacing = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "CDAN_POLL_DEADLINE_SECS") {
            self.poll_deadline = Duration::from_secs(secs);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoints
            .origin()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.link.extension.trim().is_empty() {
            return Err(ConfigError::Invalid("artifact extension is empty".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll interval must be positive".into()));
        }
        Ok(())
    }

    /// Session client configured with this run's endpoints and timeouts.
    pub fn client(&self) -> Result<Client, ConfigError> {
        Client::with_endpoints(self.endpoints.clone())
            .map(|c| c.with_timeouts(self.request_timeout, self.artifact_timeout))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Where the artifact for `target` is written.
    pub fn artifact_path(&self, target: &Target) -> PathBuf {
        artifact_path(&self.out_dir, target, &self.suffix, &self.link.extension)
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_public_service() {
        let config = FetchConfig::default();
        assert_eq!(config.endpoints.base_url, "https://cdan.dot.gov");
        assert_eq!(config.pacing, Duration::from_secs(1));
        assert_eq!(config.poll_deadline, Duration::from_secs(180));
        assert_eq!(
            config.artifact_path(&Target::new("06", "California")),
            PathBuf::from("scraped/California-dui-data.xlsx")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FetchConfig::from_toml_str(
            r#"
            [report]
            first_year = 2018

            [output]
            dir = "out"

            [timing]
            pacing_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.report.first_year, 2018);
        assert_eq!(config.report.last_year, 2023);
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.suffix, "dui-data");
        assert_eq!(config.pacing, Duration::from_millis(2500));
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FetchConfig::from_toml_str("[timing]\npace = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let config = FetchConfig::default().with_overrides(|key| match key {
            "CDAN_BASE_URL" => Some("http://127.0.0.1:4000/".to_string()),
            "CDAN_PACING_MS" => Some("0".to_string()),
            "CDAN_POLL_DEADLINE_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.endpoints.base_url, "http://127.0.0.1:4000");
        assert_eq!(config.pacing, Duration::ZERO);
        assert_eq!(config.poll_deadline, Duration::from_secs(180));
    }

    #[test]
    fn invalid_base_url_fails_validation() {
        let mut config = FetchConfig::default();
        config.endpoints.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn example_file_matches_defaults() {
        let config = FetchConfig::from_toml_str(include_str!("../../cdan.example.toml")).unwrap();
        assert_eq!(config, FetchConfig::default());
    }
}
