use std::fmt;
use std::sync::OnceLock;

use globset::GlobBuilder;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A list of glob patterns matched against request paths.
///
/// Patterns use glob syntax (`*`, `?`, `[...]`) and match case-insensitively
/// anywhere in the path, so `/admin` matches `/admin/users`. Compilation is
/// deferred until the first match; invalid patterns are dropped at that point
/// and never match.
#[derive(Clone, Default)]
pub struct GlobPatterns {
    patterns: Vec<String>,
    compiled: OnceLock<Vec<Regex>>,
}

impl GlobPatterns {
    /// Creates a new pattern list.
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            compiled: OnceLock::new(),
        }
    }

    /// Returns `true` if the list of patterns is empty.
    pub fn is_empty(&self) -> bool {
        // Check the configured list and not the compiled globs: invalid
        // patterns still serialize and still count as configuration.
        self.patterns.is_empty()
    }

    /// Returns `true` if any of the patterns match the given path.
    pub fn is_match<S>(&self, path: S) -> bool
    where
        S: AsRef<str>,
    {
        let path = path.as_ref();
        if path.is_empty() {
            return false;
        }

        let compiled = self
            .compiled
            .get_or_init(|| self.patterns.iter().filter_map(|p| compile(p)).collect());

        compiled.iter().any(|pattern| pattern.is_match(path))
    }
}

/// Translates a glob into an unanchored, case-insensitive regex.
fn compile(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }

    let glob = GlobBuilder::new(pattern).build().ok()?;
    // Strip the anchors from the generated regex so that patterns match
    // anywhere in the path, like substring search with wildcards.
    let unanchored = glob
        .regex()
        .trim_start_matches("(?-u)")
        .trim_start_matches('^')
        .trim_end_matches('$');
    RegexBuilder::new(unanchored)
        .case_insensitive(true)
        .build()
        .ok()
}

impl fmt::Debug for GlobPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.patterns.fmt(f)
    }
}

impl Serialize for GlobPatterns {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.patterns.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GlobPatterns {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let patterns = Deserialize::deserialize(deserializer)?;
        Ok(GlobPatterns::new(patterns))
    }
}

impl PartialEq for GlobPatterns {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl<S> FromIterator<S> for GlobPatterns
where
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! globs {
        ($($pattern:literal),*) => {
            GlobPatterns::new(vec![
                $($pattern.to_owned()),*
            ])
        };
    }

    #[test]
    fn test_match_empty() {
        let globs = globs!("");
        assert!(!globs.is_match("foo"));
        assert!(!globs.is_match(""));
    }

    #[test]
    fn test_match_literal_substring() {
        let globs = globs!("/admin");
        assert!(globs.is_match("/admin"));
        assert!(globs.is_match("/admin/users"));
        assert!(!globs.is_match("/api/v1/users"));
    }

    #[test]
    fn test_match_wildcard() {
        let globs = globs!("/api/v*/checkout");
        assert!(globs.is_match("/api/v1/checkout"));
        assert!(globs.is_match("/api/v2/checkout/confirm"));
        assert!(!globs.is_match("/api/v1/cart"));
    }

    #[test]
    fn test_match_any_of_several() {
        let globs = globs!("/internal", "/admin");
        assert!(globs.is_match("/admin/flags"));
        assert!(globs.is_match("/internal/healthz"));
        assert!(!globs.is_match("/public"));
    }

    #[test]
    fn test_match_case_insensitive() {
        let globs = globs!("/Admin");
        assert!(globs.is_match("/admin/users"));
    }

    #[test]
    fn test_serde_as_string_list() {
        let globs: GlobPatterns = serde_json::from_str(r#"["/admin", "/api/*"]"#).unwrap();
        assert!(globs.is_match("/admin"));
        assert_eq!(
            serde_json::to_string(&globs).unwrap(),
            r#"["/admin","/api/*"]"#
        );
    }
}
