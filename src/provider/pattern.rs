//! Name patterns for metadata listings

/// Parsed form of a listing pattern
///
/// - `*` matches every name
/// - `foo*` matches names starting with `foo`
/// - anything else matches the exact name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    All,
    Prefix(String),
    Exact(String),
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            NamePattern::All
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            NamePattern::Prefix(prefix.to_string())
        } else {
            NamePattern::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::All => true,
            NamePattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
            NamePattern::Exact(exact) => name == exact,
        }
    }
}

impl From<&str> for NamePattern {
    fn from(pattern: &str) -> Self {
        NamePattern::parse(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(NamePattern::parse("*"), NamePattern::All);
        assert_eq!(NamePattern::parse("foo*"), NamePattern::Prefix("foo".to_string()));
        assert_eq!(NamePattern::parse("foo"), NamePattern::Exact("foo".to_string()));
        // only the last star is a wildcard
        assert_eq!(NamePattern::parse("a**"), NamePattern::Prefix("a*".to_string()));
    }

    #[test]
    fn test_matches() {
        let prefix = NamePattern::parse("foo*");
        assert!(prefix.matches("foo"));
        assert!(prefix.matches("foobar"));
        assert!(!prefix.matches("barfoo"));

        let exact = NamePattern::parse("foo");
        assert!(exact.matches("foo"));
        assert!(!exact.matches("foobar"));

        assert!(NamePattern::All.matches(""));
    }

    #[test]
    fn test_empty_pattern_is_exact_empty_name() {
        let pattern = NamePattern::parse("");
        assert!(pattern.matches(""));
        assert!(!pattern.matches("x"));
    }
}
