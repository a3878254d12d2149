//! Loading the ordered list of targets.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// One region to fetch a report for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    /// Region code the job query filters on (e.g. `"06"`).
    #[serde(rename = "Id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name; also the stem of the artifact file.
    #[serde(rename = "StateName", default = "unknown_name")]
    pub name: String,
}

fn unknown_name() -> String {
    "unknown".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl Target {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The display name with path separators replaced, safe as a file stem.
    pub fn file_stem(&self) -> String {
        self.name.replace(['/', '\\'], "-")
    }
}

/// Parses a JSON array of `{"Id": ..., "StateName": ...}` records.
pub fn parse_targets(text: &str) -> Result<Vec<Target>, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptyTargets);
    }
    let targets: Vec<Target> = serde_json::from_str(text)?;
    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    let mut seen = HashSet::new();
    let mut stems = HashMap::new();
    for target in &targets {
        if !seen.insert(target.id.as_str()) {
            return Err(ConfigError::DuplicateTarget(target.id.clone()));
        }
        if let Some(earlier) = stems.insert(target.file_stem(), target.id.as_str()) {
            return Err(ConfigError::DuplicateArtifactName(
                earlier.to_string(),
                target.id.clone(),
            ));
        }
    }
    Ok(targets)
}

/// Reads and parses the target file at `path`.
pub fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(bytes = text.len(), path = %path.display(), "read target list");
    parse_targets(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let targets = parse_targets(
            r#"[{"Id":"06","StateName":"California"},{"Id":48,"StateName":"Texas"}]"#,
        )
        .unwrap();
        assert_eq!(
            targets,
            vec![Target::new("06", "California"), Target::new("48", "Texas")]
        );
    }

    #[test]
    fn missing_name_defaults_to_unknown() {
        let targets = parse_targets(r#"[{"Id":"11"}]"#).unwrap();
        assert_eq!(targets[0].name, "unknown");
    }

    #[test]
    fn rejects_empty_and_malformed_input() {
        assert!(matches!(parse_targets("  \n"), Err(ConfigError::EmptyTargets)));
        assert!(matches!(parse_targets("[]"), Err(ConfigError::NoTargets)));
        assert!(matches!(
            parse_targets(r#"{"Id":"06"}"#),
            Err(ConfigError::TargetsJson(_))
        ));
        assert!(matches!(
            parse_targets(r#"[{"StateName":"Nowhere"}]"#),
            Err(ConfigError::TargetsJson(_))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = parse_targets(r#"[{"Id":"06","StateName":"A"},{"Id":"06","StateName":"B"}]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTarget(id) if id == "06"));
    }

    #[test]
    fn rejects_names_sharing_a_file_stem() {
        let err = parse_targets(r#"[{"Id":"1","StateName":"A/B"},{"Id":"2","StateName":"A-B"}]"#)
            .unwrap_err();
        match err {
            ConfigError::DuplicateArtifactName(first, second) => {
                assert_eq!((first.as_str(), second.as_str()), ("1", "2"));
            }
            other => panic!("expected DuplicateArtifactName, got {:?}", other),
        }
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(Target::new("1", "A/B\\C").file_stem(), "A-B-C");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_targets(Path::new("/nonexistent/state-list.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bundled_state_list_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../state-list.json");
        let targets = load_targets(&path).unwrap();
        assert_eq!(targets.len(), 51);
        assert_eq!(targets[4], Target::new("06", "California"));
    }
}
