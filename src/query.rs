//! PubMed search query construction.

/// Build an esearch term for a journal and publication-date range, optionally
/// restricted to research articles.
pub fn build_search_query(
    journal: &str,
    from_year: &str,
    to_year: &str,
    research_only: bool,
) -> String {
    let mut query = format!("\"{}\"[Journal] AND {}:{}[pdat]", journal, from_year, to_year);

    if research_only {
        query.push_str(
            " AND (\"Journal Article\"[Publication Type] \
             NOT \"Review\"[Publication Type] \
             NOT \"Editorial\"[Publication Type] \
             NOT \"Letter\"[Publication Type] \
             NOT \"Comment\"[Publication Type])",
        );
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_query() {
        let query = build_search_query("Radiol Artif Intell", "2019", "3000", false);
        assert_eq!(
            query,
            "\"Radiol Artif Intell\"[Journal] AND 2019:3000[pdat]"
        );
    }

    #[test]
    fn test_research_only_excludes_other_types() {
        let query = build_search_query("Radiol Artif Intell", "2019", "3000", true);
        assert!(query.starts_with("\"Radiol Artif Intell\"[Journal] AND 2019:3000[pdat] AND ("));
        assert!(query.contains("\"Journal Article\"[Publication Type]"));
        assert!(query.contains("NOT \"Review\"[Publication Type]"));
        assert!(query.contains("NOT \"Editorial\"[Publication Type]"));
        assert!(query.contains("NOT \"Letter\"[Publication Type]"));
        assert!(query.contains("NOT \"Comment\"[Publication Type]"));
    }
}
