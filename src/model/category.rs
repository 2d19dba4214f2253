//! Label -> category id resolution.

use std::collections::HashMap;

/// An export category: a distinct label string and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// 1-based identifier, assigned by first appearance
    pub id: u32,
    /// Label text
    pub name: String,
}

impl Category {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Categories in first-seen order of their labels.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    categories: Vec<Category>,
    by_name: HashMap<String, u32>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from labels in the order they are encountered.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::new();
        for label in labels {
            map.resolve(label);
        }
        map
    }

    /// Category id of `label`, registering it if unseen.
    pub fn resolve(&mut self, label: &str) -> u32 {
        if let Some(&id) = self.by_name.get(label) {
            return id;
        }
        let id = self.categories.len() as u32 + 1;
        self.categories.push(Category::new(id, label));
        self.by_name.insert(label.to_string(), id);
        id
    }

    pub fn id_of(&self, label: &str) -> Option<u32> {
        self.by_name.get(label).copied()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let map = CategoryMap::from_labels(["dog", "cat", "dog", "bird", "cat"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.id_of("dog"), Some(1));
        assert_eq!(map.id_of("cat"), Some(2));
        assert_eq!(map.id_of("bird"), Some(3));
        assert_eq!(map.id_of("fish"), None);
        let names: Vec<&str> = map.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["dog", "cat", "bird"]);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let map = CategoryMap::from_labels(["Cat", "cat"]);
        assert_eq!(map.len(), 2);
    }
}
