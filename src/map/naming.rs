//! Output names for materials.

use std::collections::{HashMap, HashSet};

/// Turns source material names into names a map file can hold.
///
/// Spaces become underscores. Two different source names that end up the
/// same after that get a numeric suffix, so every source name keeps its own
/// output name. A registry lives for exactly one export run.
///
/// # Example
///
/// ```
/// use brushsmith::map::NameRegistry;
///
/// let mut names = NameRegistry::new();
/// assert_eq!(names.resolve("brick wall"), "brick_wall");
/// assert_eq!(names.resolve("brick_wall"), "brick_wall_1");
/// assert_eq!(names.resolve("brick wall"), "brick_wall");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl NameRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `name` out of the assignable names, so that no source name is
    /// written as `name` itself.
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// The output name of `source`, assigning one on first use.
    pub fn resolve(&mut self, source: &str) -> &str {
        if !self.assigned.contains_key(source) {
            let base = sanitize(source);
            let mut name = base.clone();
            let mut suffix = 1;
            while self.taken.contains(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            self.taken.insert(name.clone());
            self.assigned.insert(source.to_string(), name);
        }
        &self.assigned[source]
    }

    /// Number of distinct source names seen.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether no name has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Replace characters that would split a material token.
pub fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '"' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("rock face 02"), "rock_face_02");
        assert_eq!(sanitize("  padded "), "padded");
        assert_eq!(sanitize("tab\there"), "tab_here");
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let mut names = NameRegistry::new();
        assert_eq!(names.resolve("a b"), "a_b");
        assert_eq!(names.resolve("a_b"), "a_b_1");
        assert_eq!(names.resolve("a  b"), "a__b");
        assert_eq!(names.resolve("a\tb"), "a_b_2");
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut names = NameRegistry::new();
        assert_eq!(names.resolve("x_1"), "x_1");
        assert_eq!(names.resolve("x"), "x");
        assert_eq!(names.resolve("x "), "x_2");
    }

    #[test]
    fn test_reserved_name_is_never_assigned() {
        let mut names = NameRegistry::new();
        names.reserve("skip");
        assert_eq!(names.resolve("skip"), "skip_1");
        assert_eq!(names.resolve("stone"), "stone");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_fresh_registry_forgets() {
        let mut first = NameRegistry::new();
        first.resolve("a b");
        first.resolve("a_b");
        let mut second = NameRegistry::new();
        assert!(second.is_empty());
        assert_eq!(second.resolve("a_b"), "a_b");
    }
}
