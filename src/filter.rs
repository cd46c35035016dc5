//! Keyword filtering over completed records.

use crate::models::ArticleRecord;

/// True when any keyword appears in the text, case-insensitively.
pub fn contains_any_keyword(text: &str, keywords: &[String]) -> bool {
    let text_lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text_lower.contains(&keyword.to_lowercase()))
}

/// Keep records whose title or abstract contains at least one keyword.
pub fn filter_by_keywords(records: Vec<ArticleRecord>, keywords: &[String]) -> Vec<ArticleRecord> {
    records
        .into_iter()
        .filter(|record| {
            contains_any_keyword(
                &format!("{} {}", record.title, record.abstract_text),
                keywords,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_contains_any_keyword_case_insensitive() {
        let kw = keywords(&["language model", "GPT"]);
        assert!(contains_any_keyword("A Large Language Model study", &kw));
        assert!(contains_any_keyword("we used gpt-4", &kw));
        assert!(!contains_any_keyword("segmentation network", &kw));
    }

    #[test]
    fn test_filter_matches_title_or_abstract() {
        let mut in_title = ArticleRecord::new("1");
        in_title.title = "Transformer models in chest CT".to_string();

        let mut in_abstract = ArticleRecord::new("2");
        in_abstract.title = "A study".to_string();
        in_abstract.abstract_text = "We evaluated a language model.".to_string();

        let mut neither = ArticleRecord::new("3");
        neither.title = "Bone age estimation".to_string();

        let kept = filter_by_keywords(
            vec![in_title, in_abstract, neither],
            &keywords(&["transformer", "language model"]),
        );
        let pmids: Vec<_> = kept.iter().map(|r| r.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["1", "2"]);
    }
}
