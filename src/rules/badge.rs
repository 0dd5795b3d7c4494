// src/rules/badge.rs
//! Qualified rule identity: `Department/RuleName`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `(namespace, name)` identity of a rule.
///
/// Constructed once per rule class at registration time and once per
/// user-supplied string at config resolution; immutable thereafter. An
/// unqualified badge (no namespace) *matches* any qualified badge with the
/// same name, which is what makes partial names in configs and suppression
/// comments work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Badge {
    namespace: Option<String>,
    name: String,
}

impl Badge {
    /// Parses `"Lint/UnusedVariable"` or a bare `"UnusedVariable"`.
    /// Only the last path segment is the rule name; everything before it is
    /// the (possibly nested) department.
    ///
    /// # Panics
    ///
    /// Panics on an empty rule name - badges are built from rule class
    /// declarations and registry-validated strings, so an empty name is a
    /// programming error.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        let qualified = qualified.trim();
        match qualified.rsplit_once('/') {
            Some((ns, name)) => {
                assert!(!name.is_empty(), "badge name must not be empty");
                Self {
                    namespace: Some(ns.to_string()),
                    name: name.to_string(),
                }
            }
            None => {
                assert!(!qualified.is_empty(), "badge name must not be empty");
                Self {
                    namespace: None,
                    name: qualified.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let badge = Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        };
        assert!(!badge.name.is_empty(), "badge name must not be empty");
        badge
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }

    /// Partial-name matching: an unqualified badge matches any badge with
    /// the same name; qualified badges match only exactly.
    #[must_use]
    pub fn matches(&self, other: &Badge) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.namespace, &other.namespace) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Department used for severity defaults. Nested namespaces report
    /// their first segment (`Lint/Debug/Foo` -> `Lint`).
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .map(|ns| ns.split('/').next().unwrap_or(ns))
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified() {
        let badge = Badge::parse("Lint/UnusedVariable");
        assert_eq!(badge.namespace(), Some("Lint"));
        assert_eq!(badge.name(), "UnusedVariable");
        assert_eq!(badge.to_string(), "Lint/UnusedVariable");
    }

    #[test]
    fn test_parse_bare() {
        let badge = Badge::parse("UnusedVariable");
        assert_eq!(badge.namespace(), None);
        assert_eq!(badge.name(), "UnusedVariable");
    }

    #[test]
    fn test_nested_namespace() {
        let badge = Badge::parse("Lint/Debug/Trace");
        assert_eq!(badge.namespace(), Some("Lint/Debug"));
        assert_eq!(badge.name(), "Trace");
        assert_eq!(badge.department(), Some("Lint"));
    }

    #[test]
    fn test_partial_match() {
        let bare = Badge::parse("Breakpoint");
        let full = Badge::parse("Lint/Breakpoint");
        let other = Badge::parse("Style/Breakpoint");
        assert!(bare.matches(&full));
        assert!(bare.matches(&other));
        assert!(full.matches(&bare));
        assert!(!full.matches(&other));
    }

    #[test]
    fn test_equality_needs_both_fields() {
        assert_ne!(Badge::parse("Lint/X"), Badge::parse("Style/X"));
        assert_ne!(Badge::parse("Lint/X"), Badge::parse("X"));
        assert_eq!(Badge::parse("Lint/X"), Badge::qualified("Lint", "X"));
    }

    #[test]
    #[should_panic(expected = "badge name must not be empty")]
    fn test_empty_name_panics() {
        let _ = Badge::parse("Lint/");
    }
}
