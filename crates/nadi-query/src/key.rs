//! Query keys

use std::fmt;

/// Ordered key segments identifying one cached query
///
/// `["offDays", "<site>"]` names the closures of one site. Invalidation
/// matches by prefix, so `["offDays"]` covers every site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Key with a single root segment
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    /// Append a segment
    #[must_use]
    pub fn with(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    /// Append a segment, or `none` when absent
    #[must_use]
    pub fn with_opt<S: fmt::Display>(self, segment: Option<S>) -> Self {
        match segment {
            Some(segment) => self.with(segment),
            None => self.with("none"),
        }
    }

    /// Key segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check whether `prefix` is a leading run of this key's segments
    #[inline]
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| (*s).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching() {
        let key = QueryKey::new("offDays").with("site-1");
        assert!(key.starts_with(&QueryKey::new("offDays")));
        assert!(key.starts_with(&key));
        assert!(!key.starts_with(&QueryKey::new("offDays").with("site-2")));
        assert!(!QueryKey::new("offDays").starts_with(&key));
        assert!(!QueryKey::new("offDaysArchive").starts_with(&QueryKey::new("offDays")));
    }

    #[test]
    fn display_and_absent_segments() {
        let key = QueryKey::new("leaveBalances").with_opt(None::<&str>);
        assert_eq!(key.to_string(), "leaveBalances/none");
        assert_eq!(QueryKey::from(["a", "b"]).segments(), ["a", "b"]);
    }
}
