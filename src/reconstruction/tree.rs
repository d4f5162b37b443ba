//! Traversal over assembled trees.
//!
//! This module provides iterators and lookups for [`TreeNode`] trees,
//! including depth-tracking iteration and path-based lookup.

use std::collections::VecDeque;

use crate::model::TreeNode;
use crate::path;

/// Iterator over tree nodes in depth-first (pre-order) order.
///
/// Yields each node together with its depth (root = 0).
pub struct DepthFirstIterator<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> DepthFirstIterator<'a> {
    /// Create a new depth-first iterator.
    pub fn new(root: &'a TreeNode) -> Self {
        Self {
            stack: vec![(0, root)],
        }
    }
}

impl<'a> Iterator for DepthFirstIterator<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Push children in reverse order so we process them in order
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

/// Iterator over tree nodes in breadth-first order.
pub struct BreadthFirstIterator<'a> {
    queue: VecDeque<(usize, &'a TreeNode)>,
}

impl<'a> BreadthFirstIterator<'a> {
    /// Create a new breadth-first iterator.
    pub fn new(root: &'a TreeNode) -> Self {
        Self {
            queue: VecDeque::from([(0, root)]),
        }
    }
}

impl<'a> Iterator for BreadthFirstIterator<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.queue.pop_front()?;
        for child in &node.children {
            self.queue.push_back((depth + 1, child));
        }
        Some((depth, node))
    }
}

impl TreeNode {
    /// Get a depth-first iterator over all nodes.
    pub fn iter_depth_first(&self) -> DepthFirstIterator<'_> {
        DepthFirstIterator::new(self)
    }

    /// Get a breadth-first iterator over all nodes.
    pub fn iter_breadth_first(&self) -> BreadthFirstIterator<'_> {
        BreadthFirstIterator::new(self)
    }

    /// Count all nodes in the tree, including this one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter_depth_first().count()
    }

    /// Length of the longest root-to-leaf route, in edges.
    #[must_use]
    pub fn height(&self) -> usize {
        self.iter_depth_first()
            .map(|(depth, _)| depth)
            .max()
            .unwrap_or(0)
    }

    /// Get all nodes at a specific depth, in breadth-first order.
    #[must_use]
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<&TreeNode> {
        self.iter_breadth_first()
            .skip_while(|(d, _)| *d < depth)
            .take_while(|(d, _)| *d == depth)
            .map(|(_, node)| node)
            .collect()
    }

    /// Find a node by full path, where the first segment must name this node.
    #[must_use]
    pub fn find(&self, node_path: &str) -> Option<&TreeNode> {
        let mut segments = path::segments(node_path).into_iter();
        if segments.next()? != self.name {
            return None;
        }
        segments.try_fold(self, |node, segment| {
            node.children.iter().find(|child| child.name == segment)
        })
    }

    /// Render the tree as indented text, one node per line.
    ///
    /// `max_depth` limits how deep the rendering goes; deeper levels are
    /// summarized with an ellipsis line under their parent.
    #[must_use]
    pub fn render_indented(&self, max_depth: Option<usize>) -> String {
        let mut out = String::new();
        for (depth, node) in self.iter_depth_first() {
            if max_depth.is_some_and(|max| depth > max) {
                continue;
            }
            out.push_str(&"  ".repeat(depth));
            out.push_str(&node.name);
            if node.size > 0 {
                out.push_str(&format!(" ({})", node.size));
            }
            out.push('\n');
            if max_depth == Some(depth) && !node.is_leaf() {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(&format!("… {} more\n", node.children.len()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode {
            name: "r".to_string(),
            size: 4,
            children: vec![
                TreeNode {
                    name: "a".to_string(),
                    size: 1,
                    children: vec![TreeNode::leaf("a1", 0)],
                },
                TreeNode::leaf("b", 0),
            ],
        }
    }

    #[test]
    fn test_depth_first_order() {
        let tree = sample();
        let order: Vec<(usize, &str)> = tree
            .iter_depth_first()
            .map(|(d, n)| (d, n.name.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "r"), (1, "a"), (2, "a1"), (1, "b")]);
    }

    #[test]
    fn test_breadth_first_order() {
        let tree = sample();
        let names: Vec<&str> = tree.iter_breadth_first().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["r", "a", "b", "a1"]);
    }

    #[test]
    fn test_counts_and_levels() {
        let tree = sample();
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.height(), 2);
        let level: Vec<&str> = tree.nodes_at_depth(1).iter().map(|n| n.name.as_str()).collect();
        assert_eq!(level, vec!["a", "b"]);
        assert!(tree.nodes_at_depth(5).is_empty());
    }

    #[test]
    fn test_find_by_path() {
        let tree = sample();
        assert_eq!(tree.find("r > a > a1").map(|n| n.name.as_str()), Some("a1"));
        assert_eq!(tree.find("r").map(|n| n.name.as_str()), Some("r"));
        assert!(tree.find("r > c").is_none());
        assert!(tree.find("x > a").is_none());
    }

    #[test]
    fn test_render_indented() {
        let tree = sample();
        assert_eq!(tree.render_indented(None), "r (4)\n  a (1)\n    a1\n  b\n");
        assert_eq!(tree.render_indented(Some(1)), "r (4)\n  a (1)\n    … 1 more\n  b\n");
    }
}
