//! Document type and traversal
//!
//! The root container: an ordered forest plus its style table, with query
//! and normalization APIs.

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::field::render_field;
use crate::id::{NodeId, StableId};
use crate::issue::Issues;
use crate::style::{StyleRule, Subject, selector_subjects};

use super::Node;

// =============================================================================
// Document
// =============================================================================

/// Root container: top-level siblings and the style table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub roots: Vec<Node>,
    pub styles: Vec<StyleRule>,
    /// Diagnostics attached by import; empty for editor-built documents
    pub issues: Issues,
}

impl Document {
    /// Create a normalized document.
    pub fn new(roots: Vec<Node>, styles: Vec<StyleRule>) -> Self {
        let mut doc = Self {
            roots,
            styles,
            issues: Issues::new(),
        };
        doc.normalize();
        doc
    }

    /// Bring derived fields up to date after the editor changed the tree:
    /// assigns ids to detached nodes, rewrites placeholder text of bound
    /// nodes and relinks style references.
    pub fn normalize(&mut self) {
        self.assign_ids();
        self.for_each_node_mut(|node| {
            if let Some(name) = &node.field_binding {
                node.text_content = render_field(name);
            }
        });
        self.link_styles();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Give every detached node a synthetic id.
    ///
    /// Ids that are already assigned are kept, and a freshly computed id
    /// never collides with one of them.
    pub fn assign_ids(&mut self) {
        let mut taken: FxHashSet<StableId> = FxHashSet::default();
        for node in self.iter_nodes() {
            if let NodeId::Synthetic(id) = node.id {
                if !id.is_detached() {
                    taken.insert(id);
                }
            }
        }
        Self::assign_ids_in(&mut self.roots, 0, &mut taken);
    }

    fn assign_ids_in(nodes: &mut [Node], parent_seed: u64, taken: &mut FxHashSet<StableId>) {
        let sibling_count = nodes.len();
        let mut occurrences: FxHashMap<CompactString, usize> = FxHashMap::default();
        for node in nodes.iter_mut() {
            let count = occurrences.entry(node.tag.clone()).or_insert(0);
            let occurrence = *count;
            *count += 1;

            if node.id.is_detached() {
                let mut salt = occurrence;
                let mut id = StableId::for_node(&node.tag, salt, parent_seed);
                while taken.contains(&id) {
                    salt += sibling_count;
                    id = StableId::for_node(&node.tag, salt, parent_seed);
                }
                taken.insert(id);
                node.id = NodeId::Synthetic(id);
            }
            let seed = node.id.seed();
            Self::assign_ids_in(&mut node.children, seed, taken);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Style linking
    // ─────────────────────────────────────────────────────────────────────────

    /// Recompute every node's `style_refs` from the style table.
    pub fn link_styles(&mut self) {
        let keyed: Vec<(String, Vec<Subject>)> = self
            .styles
            .iter()
            .flat_map(StyleRule::walk)
            .map(|rule| (rule.selector.clone(), selector_subjects(&rule.selector)))
            .filter(|(_, subjects)| !subjects.is_empty())
            .collect();

        self.for_each_node_mut(|node| {
            let mut refs: Vec<String> = Vec::new();
            for (selector, subjects) in &keyed {
                let hit = subjects.iter().any(|s| {
                    s.matches(&node.tag, |c| node.class_names.contains(c), node.id.explicit())
                });
                if hit && !refs.contains(selector) {
                    refs.push(selector.clone());
                }
            }
            node.style_refs = refs;
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query API
    // ─────────────────────────────────────────────────────────────────────────

    /// Iterate over all nodes (depth-first, document order)
    pub fn iter_nodes(&self) -> NodeIter<'_> {
        NodeIter::new(&self.roots)
    }

    /// Find first node matching predicate
    pub fn find<F>(&self, predicate: F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.iter_nodes().find(|n| predicate(n))
    }

    /// Find all nodes matching predicate
    pub fn find_all<F>(&self, predicate: F) -> Vec<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.iter_nodes().filter(|n| predicate(n)).collect()
    }

    pub fn find_by_id(&self, id: &NodeId) -> Option<&Node> {
        self.find(|n| &n.id == id)
    }

    /// Find first node matching predicate (mutable)
    pub fn find_mut<F>(&mut self, predicate: F) -> Option<&mut Node>
    where
        F: Fn(&Node) -> bool + Copy,
    {
        Self::find_in_mut(&mut self.roots, predicate)
    }

    fn find_in_mut<F>(nodes: &mut [Node], predicate: F) -> Option<&mut Node>
    where
        F: Fn(&Node) -> bool + Copy,
    {
        for node in nodes {
            if predicate(node) {
                return Some(node);
            }
            if let Some(found) = Self::find_in_mut(&mut node.children, predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Count all nodes
    pub fn node_count(&self) -> usize {
        self.iter_nodes().count()
    }

    /// Every class name used by some node
    pub fn class_names(&self) -> FxHashSet<&str> {
        self.iter_nodes()
            .flat_map(|n| n.class_names.iter())
            .collect()
    }

    /// Every explicit id used by some node
    pub fn explicit_ids(&self) -> FxHashSet<&str> {
        self.iter_nodes().filter_map(|n| n.id.explicit()).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Closure-based traversal
    // ─────────────────────────────────────────────────────────────────────────

    /// Visit all nodes with a closure (mutable, depth-first)
    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Node),
    {
        Self::visit_mut_recursive(&mut self.roots, &mut f);
    }

    fn visit_mut_recursive<F>(nodes: &mut [Node], f: &mut F)
    where
        F: FnMut(&mut Node),
    {
        for node in nodes {
            f(node);
            Self::visit_mut_recursive(&mut node.children, f);
        }
    }
}

// =============================================================================
// NodeIter - depth-first traversal
// =============================================================================

/// Depth-first iterator over a forest
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> NodeIter<'a> {
    pub(crate) fn new(roots: &'a [Node]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            vec![
                Node::new("div")
                    .with_class("card")
                    .child(Node::field("span", "Front"))
                    .child(Node::new("span").with_class("hint")),
                Node::new("hr").with_id("answer"),
            ],
            vec![
                StyleRule::new(".card").declare("color", "red"),
                StyleRule::new(".card .hint, #answer").declare("margin", "0"),
                StyleRule::new("@media print").nest(StyleRule::new(".hint").declare("display", "none")),
            ],
        )
    }

    #[test]
    fn test_ids_assigned_and_unique() {
        let doc = sample();
        let ids: Vec<&NodeId> = doc.iter_nodes().map(|n| &n.id).collect();
        assert!(ids.iter().all(|id| !id.is_detached()));
        let unique: FxHashSet<&NodeId> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(doc.roots[1].id.explicit(), Some("answer"));
    }

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(sample(), sample());
    }

    #[test]
    fn test_inserted_node_gets_fresh_id() {
        let mut doc = sample();
        doc.roots[0].children.insert(0, Node::new("span"));
        doc.normalize();
        let ids: FxHashSet<&NodeId> = doc.iter_nodes().map(|n| &n.id).collect();
        assert_eq!(ids.len(), doc.node_count());
    }

    #[test]
    fn test_link_styles() {
        let doc = sample();
        assert_eq!(doc.roots[0].style_refs, vec![".card"]);
        assert_eq!(
            doc.roots[0].children[1].style_refs,
            vec![".card .hint, #answer", ".hint"]
        );
        assert_eq!(doc.roots[1].style_refs, vec![".card .hint, #answer"]);
        assert!(doc.roots[0].children[0].style_refs.is_empty());
    }

    #[test]
    fn test_normalize_syncs_placeholder() {
        let mut doc = sample();
        doc.roots[0].children[0].text_content = "stale".into();
        doc.normalize();
        assert_eq!(doc.roots[0].children[0].text_content, "{{Front}}");
    }

    #[test]
    fn test_queries() {
        let doc = sample();
        assert_eq!(doc.node_count(), 4);
        assert!(doc.class_names().contains("hint"));
        assert!(doc.explicit_ids().contains("answer"));
        let span = doc.find(|n| n.field_binding.is_some()).unwrap();
        assert_eq!(span.tag, "span");
        assert_eq!(doc.find_all(|n| n.tag == "span").len(), 2);
        assert!(doc.find_by_id(&NodeId::Explicit("answer".into())).is_some());
    }

    #[test]
    fn test_find_mut() {
        let mut doc = sample();
        let hr = doc.find_mut(|n| n.tag == "hr").unwrap();
        hr.class_names.add("divider");
        assert!(doc.class_names().contains("divider"));
    }
}
