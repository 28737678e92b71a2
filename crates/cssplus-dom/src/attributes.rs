//! Ordered attribute list.
//!
//! [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
//! "An element has an associated attribute list", which is ordered. Output
//! HTML keeps attributes in source order, with newly added ones last.

/// An ordered list of `(name, value)` pairs with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether an attribute with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set an attribute. An existing attribute keeps its position.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some((_, v)) = self.0.iter_mut().find(|(n, _)| n == name) {
            value.clone_into(v);
        } else {
            self.0.push((name.to_string(), value.to_string()));
        }
    }

    /// Insert only when no attribute with this name exists yet.
    /// "When the parser encounters a duplicate attribute, it is ignored."
    pub fn insert_if_absent(&mut self, name: &str, value: &str) {
        if !self.contains(name) {
            self.0.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            let name = name.into();
            let value = value.into();
            attrs.insert_if_absent(&name, &value);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_position() {
        let mut attrs: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        attrs.set("a", "3");
        attrs.set("c", "4");
        let names: Vec<&str> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(attrs.get("a"), Some("3"));
    }

    #[test]
    fn test_duplicates_ignored_on_collect() {
        let attrs: Attributes = [("id", "x"), ("id", "y")].into_iter().collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("id"), Some("x"));
    }
}
