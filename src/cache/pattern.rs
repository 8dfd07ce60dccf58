/// Cache key patterns for bulk invalidation
///
/// A pattern is matched against the start of a key: `*` matches any run of
/// characters, `?` matches exactly one, everything else is literal. A pattern
/// with no wildcards is a plain prefix, so `GetTransactions` matches every
/// cached variant of that operation.

use regex::Regex;

#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');

        let mut literal = String::new();
        for c in pattern.chars() {
            match c {
                '*' | '?' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    source.push_str(if c == '*' { "(?s:.*)" } else { "(?s:.)" });
                }
                _ => literal.push(c),
            }
        }
        source.push_str(&regex::escape(&literal));

        Ok(Self {
            regex: Regex::new(&source)?,
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        KeyPattern::new(pattern).unwrap().matches(key)
    }

    #[test]
    fn test_plain_pattern_is_prefix() {
        assert!(matches("GetTransactions", "GetTransactions(user_id=\"a\")"));
        assert!(matches("GetTransactions", "GetTransactions()"));
        assert!(!matches("GetTransactions", "GetExpenseCategories()"));
        assert!(!matches("Transactions", "GetTransactions()"));
    }

    #[test]
    fn test_exact_operation_with_open_paren() {
        assert!(matches("GetAssets(", "GetAssets(user_id=\"a\")"));
        assert!(!matches("GetAssets(", "GetAssetsSummary(user_id=\"a\")"));
    }

    #[test]
    fn test_star_wildcard() {
        assert!(matches("Get*(user_id=\"a\")", "GetAssets(user_id=\"a\")"));
        assert!(matches("Get*(user_id=\"a\")", "GetTransactions(user_id=\"a\")"));
        assert!(!matches("Get*(user_id=\"a\")", "GetTransactions(user_id=\"b\")"));
        assert!(matches("*", "anything"));
    }

    #[test]
    fn test_question_wildcard() {
        assert!(matches("Get?ssets", "GetAssets()"));
        assert!(!matches("Get?ssets", "GetXXssets()"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("Op(a=1)", "Op(a=1)"));
        assert!(!matches("Op.a", "Opxa"));
        assert!(matches("Op[1]+", "Op[1]+"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches("gettransactions", "GetTransactions()"));
    }
}
