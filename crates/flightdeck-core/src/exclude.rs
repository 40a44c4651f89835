//! Exclusion-path matching for the authentication gate.
//!
//! Patterns are literal paths, optionally with a single trailing `*` that
//! matches any suffix from that point on. `*` anywhere else is not special.

/// A compiled exclusion pattern.
///
/// Two forms exist:
/// - `Literal`: matches the path exactly.
/// - `Prefix`: built from a trailing `*`; matches any path starting with the
///   stem. When the stem ends in `/` the bare stem without that slash also
///   matches, so `"/public/*"` covers `/public` as well as `/public/x/y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionPattern {
    Literal(String),
    Prefix { stem: String, bare: Option<String> },
}

impl ExclusionPattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(stem) => {
                let bare = stem
                    .strip_suffix('/')
                    .filter(|b| !b.is_empty())
                    .map(String::from);
                ExclusionPattern::Prefix {
                    stem: stem.to_string(),
                    bare,
                }
            }
            None => ExclusionPattern::Literal(pattern.to_string()),
        }
    }

    /// Whether the given request path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExclusionPattern::Literal(literal) => path == literal,
            ExclusionPattern::Prefix { stem, bare } => {
                path.starts_with(stem.as_str())
                    || bare.as_deref().is_some_and(|b| path == b)
            }
        }
    }
}

/// The compiled set of exclusion rules. Matching is existential: a path is
/// excluded if any rule matches, in no particular order.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    patterns: Vec<String>,
    compiled: Vec<ExclusionPattern>,
}

impl ExclusionList {
    /// Compile a list of pattern strings.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = patterns
            .iter()
            .map(|p| ExclusionPattern::compile(p))
            .collect();
        Self { patterns, compiled }
    }

    /// Whether any rule excludes the given path.
    pub fn matches(&self, path: &str) -> bool {
        self.compiled.iter().any(|p| p.matches(path))
    }

    /// The configured pattern strings.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl From<Vec<String>> for ExclusionList {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exactly() {
        let pattern = ExclusionPattern::compile("/health");
        assert!(pattern.matches("/health"));
        assert!(!pattern.matches("/healthy"));
        assert!(!pattern.matches("/health/"));
        assert!(!pattern.matches("/api/health"));
    }

    #[test]
    fn wildcard_matches_any_suffix() {
        let pattern = ExclusionPattern::compile("/public/*");
        assert!(pattern.matches("/public/"));
        assert!(pattern.matches("/public/anything"));
        assert!(pattern.matches("/public/a/b"));
        assert!(!pattern.matches("/publicx"));
        assert!(!pattern.matches("/private/doc"));
    }

    // Flagged for product sign-off: the bare prefix without a trailing
    // slash is excluded too.
    #[test]
    fn wildcard_matches_bare_prefix() {
        let pattern = ExclusionPattern::compile("/public/*");
        assert!(pattern.matches("/public"));
    }

    #[test]
    fn wildcard_without_slash_is_plain_prefix() {
        let pattern = ExclusionPattern::compile("/files*");
        assert!(pattern.matches("/files"));
        assert!(pattern.matches("/files/2024"));
        assert!(pattern.matches("/filesystem"));
        assert!(!pattern.matches("/file"));
    }

    #[test]
    fn inner_star_is_literal() {
        // Only a trailing wildcard is special.
        let pattern = ExclusionPattern::compile("/a*/b");
        assert!(pattern.matches("/a*/b"));
        assert!(!pattern.matches("/ax/b"));
    }

    #[test]
    fn list_matches_existentially() {
        let list = ExclusionList::new(["/health", "/public/*"]);
        assert!(list.matches("/health"));
        assert!(list.matches("/public/report/2024"));
        assert!(!list.matches("/users/me"));
        assert!(!list.matches("/healthy"));
    }

    #[test]
    fn empty_list_matches_nothing() {
        let list = ExclusionList::default();
        assert!(list.is_empty());
        assert!(!list.matches("/"));
        assert!(!list.matches("/health"));
    }

    #[test]
    fn root_literal_only_matches_root() {
        let list = ExclusionList::new(["/"]);
        assert!(list.matches("/"));
        assert!(!list.matches("/users/me"));
    }
}
