//! Shared query infrastructure: the [`Query`] trait.

/// Trait implemented by job queries. Provides serialization into the
/// `SASQueryString` form field the job endpoint expects.
pub trait Query {
    /// Ordered parameter pairs, values unescaped.
    fn pairs(&self) -> Vec<(&'static str, String)>;

    /// Renders the pairs as `&key=value` segments.
    ///
    /// Values are left raw: the whole string is form-encoded once when it is
    /// submitted, and the job service parses it verbatim on its side.
    fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(key, value)| format!("&{}={}", key, value))
            .collect()
    }
}
