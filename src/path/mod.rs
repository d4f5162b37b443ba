//! Hierarchical path strings.
//!
//! A node is identified by the names on the route from the root joined with
//! [`DELIMITER`], e.g. `"Life > Animal > Bird"`. Everything here is a pure
//! function over `&str`; no allocation happens unless a new path is produced.
//!
//! The delimiter is always treated as a hard boundary: `"Cat > Siamese"`
//! descends from `"Cat"`, but `"Category"` does not.

/// Separator between path segments.
pub const DELIMITER: &str = " > ";

/// Split a path into its segments, root first.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(DELIMITER).collect()
}

/// Last segment of a path (the node's display name).
pub fn name(path: &str) -> &str {
    path.rsplit_once(DELIMITER).map_or(path, |(_, last)| last)
}

/// Parent path, or `None` for a single-segment (root) path.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once(DELIMITER).map(|(head, _)| head)
}

/// Depth of a path; the root is depth 0.
pub fn depth(path: &str) -> usize {
    path.matches(DELIMITER).count()
}

/// Whether the path names the root (has a single segment).
pub fn is_root(path: &str) -> bool {
    !path.contains(DELIMITER)
}

/// Append a child name to a parent path.
pub fn join(parent: &str, child_name: &str) -> String {
    let mut out = String::with_capacity(parent.len() + DELIMITER.len() + child_name.len());
    out.push_str(parent);
    out.push_str(DELIMITER);
    out.push_str(child_name);
    out
}

/// The remainder of `path` below `ancestor`, if `path` strictly descends from it.
fn strip_ancestor<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    path.strip_prefix(ancestor)?
        .strip_prefix(DELIMITER)
        .filter(|rest| !rest.is_empty())
}

/// Whether `path` is a strict descendant of `ancestor`.
pub fn is_descendant(ancestor: &str, path: &str) -> bool {
    strip_ancestor(ancestor, path).is_some()
}

/// Whether `path` is an immediate child of `parent_path`.
pub fn is_child_of(parent_path: &str, path: &str) -> bool {
    strip_ancestor(parent_path, path).is_some_and(|rest| !rest.contains(DELIMITER))
}

/// Proper ancestors of a path, root first.
///
/// ```
/// use taxonomy_explorer::path::ancestors;
///
/// let chain: Vec<&str> = ancestors("a > b > c").collect();
/// assert_eq!(chain, ["a", "a > b"]);
/// ```
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(DELIMITER).map(move |(idx, _)| &path[..idx])
}

/// The immediate child of `ancestor` on the route to `target`.
///
/// Returns `None` when `target` does not descend from `ancestor` or equals it.
///
/// ```
/// use taxonomy_explorer::path::step_toward;
///
/// assert_eq!(step_toward("a", "a > b > c"), Some("a > b"));
/// assert_eq!(step_toward("a > b", "a > b"), None);
/// assert_eq!(step_toward("Cat", "Category > x"), None);
/// ```
pub fn step_toward<'a>(ancestor: &str, target: &'a str) -> Option<&'a str> {
    let rest = strip_ancestor(ancestor, target)?;
    let next_len = rest.find(DELIMITER).unwrap_or(rest.len());
    let end = target.len() - rest.len() + next_len;
    Some(&target[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_and_name() {
        assert_eq!(segments("root > A > B"), vec!["root", "A", "B"]);
        assert_eq!(segments("root"), vec!["root"]);
        assert_eq!(name("root > A > B"), "B");
        assert_eq!(name("root"), "root");
    }

    #[test]
    fn test_names_with_inner_punctuation() {
        // Names may contain '>' or spaces; only the full delimiter splits.
        let path = "root > a>b > c d";
        assert_eq!(segments(path), vec!["root", "a>b", "c d"]);
        assert_eq!(parent(path), Some("root > a>b"));
    }

    #[test]
    fn test_parent_and_depth() {
        assert_eq!(parent("root > A > B"), Some("root > A"));
        assert_eq!(parent("root > A"), Some("root"));
        assert_eq!(parent("root"), None);
        assert_eq!(depth("root"), 0);
        assert_eq!(depth("root > A > B"), 2);
        assert!(is_root("root"));
        assert!(!is_root("root > A"));
    }

    #[test]
    fn test_join_round_trips_with_parent() {
        let joined = join("root > A", "B");
        assert_eq!(joined, "root > A > B");
        assert_eq!(parent(&joined), Some("root > A"));
        assert_eq!(name(&joined), "B");
    }

    #[test]
    fn test_descendant_is_delimiter_bounded() {
        assert!(is_descendant("Cat", "Cat > Siamese"));
        assert!(!is_descendant("Cat", "Category"));
        assert!(!is_descendant("Cat", "Category > x"));
        assert!(!is_descendant("Cat", "Cat"));
        assert!(!is_descendant("Cat", "Cat > "));
    }

    #[test]
    fn test_is_child_of() {
        assert!(is_child_of("root", "root > A"));
        assert!(!is_child_of("root", "root > A > B"));
        assert!(!is_child_of("root", "rootish > A"));
    }

    #[test]
    fn test_ancestors() {
        let chain: Vec<&str> = ancestors("r > a > b > c").collect();
        assert_eq!(chain, vec!["r", "r > a", "r > a > b"]);
        assert_eq!(ancestors("r").count(), 0);
    }

    #[test]
    fn test_step_toward() {
        assert_eq!(step_toward("r", "r > a > b > c"), Some("r > a"));
        assert_eq!(step_toward("r > a", "r > a > b > c"), Some("r > a > b"));
        assert_eq!(step_toward("r > a > b", "r > a > b > c"), Some("r > a > b > c"));
        assert_eq!(step_toward("r > a > b > c", "r > a > b > c"), None);
        assert_eq!(step_toward("r > x", "r > a > b"), None);
        assert_eq!(step_toward("Cat", "Category > Siamese"), None);
    }
}
