/// Turns a reference found in a response into an absolute address.
///
/// Absolute http(s) references are returned unchanged, a leading `/` is
/// appended to the base, and anything else is joined to the base with `/`.
pub fn resolve_reference(base: &str, reference: &str) -> String {
    let base = base.trim_end_matches('/');
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        reference.to_string()
    } else if reference.starts_with('/') {
        format!("{}{}", base, reference)
    } else {
        format!("{}/{}", base, reference)
    }
}
