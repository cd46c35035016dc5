//! Field normalization helpers.

/// Collapse runs of whitespace (including newlines) into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a leading `doi:` prefix (any case, optional space after the colon) and
/// surrounding whitespace. Summary responses report DOIs as e.g.
/// `doi: 10.1148/ryai.2021200267`.
pub fn normalize_doi(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("doi:") => trimmed[4..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}
