use serde::{Deserialize, Serialize};
use std::fmt;

/// One structurally comparable segment of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Null,
    Flag(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Null => f.write_str("null"),
            KeySegment::Flag(b) => write!(f, "{}", b),
            KeySegment::Int(i) => write!(f, "{}", i),
            KeySegment::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Text(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Text(value)
    }
}

impl From<&String> for KeySegment {
    fn from(value: &String) -> Self {
        KeySegment::Text(value.clone())
    }
}

impl From<bool> for KeySegment {
    fn from(value: bool) -> Self {
        KeySegment::Flag(value)
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        KeySegment::Int(value)
    }
}

impl<T: Into<KeySegment>> From<Option<T>> for KeySegment {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeySegment::Null)
    }
}

/// Identifies one cached resource, e.g. `["library", "albums", "midnight", true]`.
///
/// Keys compare structurally, so two consumers building the same key from
/// the same parameters share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a segment.
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Returns true if `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Default for QueryKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", segment)?;
        }
        f.write_str("]")
    }
}

/// Builds a [`QueryKey`] from a list of segments.
///
/// ```
/// use vibe_core::query_key;
///
/// let key = query_key!["library", "albums", "midnight", true];
/// assert_eq!(key.to_string(), r#"["library", "albums", "midnight", true]"#);
/// ```
#[macro_export]
macro_rules! query_key {
    ($($segment:expr),* $(,)?) => {
        $crate::query::QueryKey::new()$(.with($segment))*
    };
}

/// Selects the entries affected by an invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    /// Exactly this key
    Exact(QueryKey),
    /// Every key starting with these segments
    Prefix(QueryKey),
    /// Every entry
    All,
}

impl KeyFilter {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::Exact(exact) => exact == key,
            KeyFilter::Prefix(prefix) => key.starts_with(prefix),
            KeyFilter::All => true,
        }
    }
}

impl fmt::Display for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFilter::Exact(key) => write!(f, "exact {}", key),
            KeyFilter::Prefix(key) => write!(f, "prefix {}", key),
            KeyFilter::All => f.write_str("all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_key;

    #[test]
    fn test_structural_equality() {
        let a = query_key!["library", "albums", "midnight", true];
        let b = query_key!["library", "albums", String::from("midnight"), true];
        assert_eq!(a, b);
        assert_ne!(a, query_key!["library", "albums", "midnight", false]);
    }

    #[test]
    fn test_prefix_filter() {
        let list = query_key!["accounts", "list"];
        let active = query_key!["accounts", "active", "dev"];
        let jobs = query_key!["jobs", "list"];
        let filter = KeyFilter::Prefix(query_key!["accounts"]);

        assert!(filter.matches(&list));
        assert!(filter.matches(&active));
        assert!(!filter.matches(&jobs));
        assert!(KeyFilter::Exact(list.clone()).matches(&list));
        assert!(!KeyFilter::Exact(query_key!["accounts"]).matches(&list));
        assert!(KeyFilter::All.matches(&jobs));
    }

    #[test]
    fn test_optional_segment() {
        let none: Option<&str> = None;
        let key = query_key!["jobs", "history", none];
        assert_eq!(key.segments()[2], KeySegment::Null);
    }
}
