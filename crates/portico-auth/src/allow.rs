//! Allow-list matching.
//!
//! Paths matching an allow-list rule skip authentication entirely. Rules
//! are either literal path substrings (from the auth config document) or
//! regex patterns (added at runtime), evaluated in declaration order with
//! first-match semantics against the trailing-slash-stripped request
//! path.

use regex::Regex;

/// One allow-list rule.
#[derive(Debug, Clone)]
pub enum AllowRule {
    /// Matches when the normalized path contains this substring.
    Literal(String),
    /// Matches when the pattern matches the normalized path.
    Pattern(Regex),
}

impl AllowRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(s) => path.contains(s.as_str()),
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

/// Ordered set of paths exempt from authentication.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    rules: Vec<AllowRule>,
}

impl AllowList {
    /// Creates an empty allow-list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list of literal rules from the config document entries.
    #[must_use]
    pub fn from_literals(entries: &[String]) -> Self {
        Self {
            rules: entries
                .iter()
                .map(|e| AllowRule::Literal(e.clone()))
                .collect(),
        }
    }

    /// Appends a literal rule.
    pub fn push_literal(&mut self, literal: impl Into<String>) {
        self.rules.push(AllowRule::Literal(literal.into()));
    }

    /// Appends a pattern rule.
    pub fn push_pattern(&mut self, pattern: Regex) {
        self.rules.push(AllowRule::Pattern(pattern));
    }

    /// True if any rule matches the request path, first match wins.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        self.rules.iter().any(|rule| rule.matches(normalized))
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the list holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Strips the trailing slash for comparison; the root path stays `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_substring_match() {
        let list = AllowList::from_literals(&["/public".to_string(), "/health".to_string()]);
        assert!(list.matches("/public/css/site.css"));
        assert!(list.matches("/health"));
        assert!(!list.matches("/dashboard"));
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let list = AllowList::from_literals(&["/health".to_string()]);
        assert!(list.matches("/health/"));
    }

    #[test]
    fn test_root_path_survives_normalization() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/a/"), "/a");
    }

    #[test]
    fn test_pattern_rule() {
        let mut list = AllowList::new();
        list.push_pattern(Regex::new(r"^/api/v\d+/status$").unwrap());
        assert!(list.matches("/api/v1/status"));
        assert!(list.matches("/api/v2/status/"));
        assert!(!list.matches("/api/status"));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = AllowList::new();
        assert!(!list.matches("/"));
        assert!(!list.matches("/anything"));
    }
}
