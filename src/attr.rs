//! Ordered attribute and class collections
//!
//! Every collection here preserves insertion order. Serialization output
//! is byte-stable because nothing is ever re-sorted.

use compact_str::CompactString;
use smallvec::SmallVec;

/// Element attributes as ordered key-value pairs
///
/// `class`, `id` and the behavior attribute are never stored here; they
/// live in dedicated fields of [`Node`](crate::node::Node).
pub type Attrs = Vec<(String, String)>;

/// Extension trait for ordered-map operations on `Attrs`
///
/// Also used for style declarations, which share the same shape.
pub trait AttrsExt {
    /// Get a value by name
    fn get_attr(&self, name: &str) -> Option<&str>;

    /// Check if a name exists
    fn has_attr(&self, name: &str) -> bool;

    /// Set a value (update in place, or append at the end)
    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>);

    /// Remove by name, returning the old value if present
    fn remove_attr(&mut self, name: &str) -> Option<String>;
}

impl AttrsExt for Attrs {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_attr(&self, name: &str) -> bool {
        self.iter().any(|(k, _)| k == name)
    }

    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.iter_mut().find(|(k, _)| k == &name) {
            attr.1 = value;
        } else {
            self.push((name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }
}

// =============================================================================
// ClassList
// =============================================================================

/// Ordered set of class names
///
/// Insertion order is kept for deterministic output; duplicates collapse
/// onto the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(SmallVec<[CompactString; 4]>);

impl ClassList {
    /// Create an empty class list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a whitespace-separated `class` attribute value
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        for token in value.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Add a class; returns `false` if it was already present
    pub fn add(&mut self, class: &str) -> bool {
        if class.is_empty() || self.contains(class) {
            return false;
        }
        self.0.push(CompactString::from(class));
        true
    }

    /// Remove a class; returns `true` if it was present
    pub fn remove(&mut self, class: &str) -> bool {
        match self.0.iter().position(|c| c == class) {
            Some(pos) => {
                self.0.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Check membership
    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in stored order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.as_str())
    }

    /// Space-joined form, as written into the `class` attribute
    pub fn to_attr_value(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

impl<'a> FromIterator<&'a str> for ClassList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut list = Self::new();
        for class in iter {
            list.add(class);
        }
        list
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_operations() {
        let mut attrs: Attrs = Vec::new();

        attrs.set_attr("src", "a.png");
        attrs.set_attr("alt", "front");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get_attr("src"), Some("a.png"));
        assert_eq!(attrs.get_attr("href"), None);

        // Update keeps position
        attrs.set_attr("src", "b.png");
        assert_eq!(attrs[0], ("src".to_string(), "b.png".to_string()));
        assert_eq!(attrs.len(), 2);

        let removed = attrs.remove_attr("src");
        assert_eq!(removed.as_deref(), Some("b.png"));
        assert!(!attrs.has_attr("src"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_class_list_collapses_duplicates() {
        let classes = ClassList::parse("  card front card  night ");
        assert_eq!(classes.iter().collect::<Vec<_>>(), vec!["card", "front", "night"]);
        assert_eq!(classes.to_attr_value(), "card front night");
    }

    #[test]
    fn test_class_list_add_remove() {
        let mut classes = ClassList::new();
        assert!(classes.add("b"));
        assert!(classes.add("a"));
        assert!(!classes.add("b"));
        assert!(!classes.add(""));
        assert_eq!(classes.to_attr_value(), "b a");

        assert!(classes.remove("b"));
        assert!(!classes.remove("b"));
        assert_eq!(classes.len(), 1);
        assert!(classes.contains("a"));
    }
}
