//! SSO challenge bodies.

use serde_json::Value;

const URI_FIELD: &str = "uri";

/// Re-authentication instruction carried by a challenge response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Follow-up address, possibly relative to the service base.
    pub uri: String,
}

impl Challenge {
    /// Extracts the follow-up address from a challenge body.
    ///
    /// The service is inconsistent about casing (`uri`, `URI`), so the exact
    /// name wins and any ASCII case variant is accepted otherwise. Returns
    /// `None` when the body is not a JSON object or the field is missing,
    /// blank, or not a string.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let fields = value.as_object()?;
        let uri = fields
            .get(URI_FIELD)
            .or_else(|| {
                fields
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(URI_FIELD))
                    .map(|(_, v)| v)
            })?
            .as_str()?
            .trim();
        if uri.is_empty() {
            return None;
        }
        Some(Self {
            uri: uri.to_string(),
        })
    }
}
