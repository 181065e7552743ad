use crate::error::Result;
use crate::tree::SearchIndex;
use regex::RegexBuilder;

/// Find every alias whose name, or any leaf value beneath it, matches
/// `term` as a regular expression.
///
/// Matching is case-insensitive unless `case_sensitive` is set. Results come
/// back in index order, each alias at most once.
pub fn search(index: &SearchIndex, term: &str, case_sensitive: bool) -> Result<Vec<String>> {
    let re = RegexBuilder::new(term)
        .case_insensitive(!case_sensitive)
        .build()?;

    Ok(index
        .iter()
        .filter(|(name, values)| re.is_match(name) || values.iter().any(|v| re.is_match(v)))
        .map(|(name, _)| name.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SearchIndex {
        let mut index = SearchIndex::new();
        index.insert("SCOTT".into(), vec!["TCP".into(), "scott.cloud03.local".into()]);
        index.insert("TIGER".into(), vec!["TCP".into(), "tiger.cloud02.local".into()]);
        index
    }

    #[test]
    fn test_matches_value() {
        assert_eq!(search(&index(), "cloud03", false).unwrap(), vec!["SCOTT"]);
    }

    #[test]
    fn test_matches_name() {
        assert_eq!(search(&index(), "^tig", false).unwrap(), vec!["TIGER"]);
    }

    #[test]
    fn test_case_sensitivity() {
        assert_eq!(search(&index(), "CLOUD", false).unwrap(), vec!["SCOTT", "TIGER"]);
        assert!(search(&index(), "CLOUD", true).unwrap().is_empty());
        assert_eq!(search(&index(), "tcp", false).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = search(&index(), "(unclosed", false).unwrap_err();
        assert_eq!(err.code(), "tns-invalid-pattern");
    }
}
