//! Document validation
//!
//! Checks the invariants a [`Document`] should hold and reports each
//! violation as an [`Issue`]. Nothing is repaired here; the editor decides
//! whether to block the user, and export refuses only what it cannot write.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::ConverterConfig;
use crate::field::{CLOSE, FieldRef, OPEN, is_valid_field_name, render_field};
use crate::id::NodeId;
use crate::issue::{Issue, IssueKind, Issues};
use crate::node::{Document, Node};
use crate::render::is_lossless_attr_value;
use crate::style::{StyleRule, Subject, selector_subjects};

/// Check every document invariant with the default attribute names.
/// Never mutates.
pub fn validate(doc: &Document) -> Issues {
    validate_with(doc, &ConverterConfig::default())
}

/// Check every document invariant; `config` names the reserved attributes.
pub fn validate_with(doc: &Document, config: &ConverterConfig) -> Issues {
    let mut checker = Checker::new(doc, config);
    for node in doc.iter_nodes() {
        checker.check_node(node);
    }
    checker.finish()
}

// =============================================================================
// Checker
// =============================================================================

/// An open `{{#Name}}` / `{{^Name}}` section
struct OpenSection<'a> {
    name: &'a str,
    node: NodeId,
}

struct Checker<'a> {
    config: &'a ConverterConfig,
    /// Selector -> subjects, over every rule including nested ones
    selectors: FxHashMap<&'a str, Vec<Subject>>,
    seen_ids: FxHashSet<&'a NodeId>,
    sections: Vec<OpenSection<'a>>,
    issues: Issues,
}

impl<'a> Checker<'a> {
    fn new(doc: &'a Document, config: &'a ConverterConfig) -> Self {
        let selectors = doc
            .styles
            .iter()
            .flat_map(StyleRule::walk)
            .map(|rule| (rule.selector.as_str(), selector_subjects(&rule.selector)))
            .collect();
        Self {
            config,
            selectors,
            seen_ids: FxHashSet::default(),
            sections: Vec::new(),
            issues: Issues::new(),
        }
    }

    fn check_node(&mut self, node: &'a Node) {
        self.check_identity(node);
        self.check_structure(node);
        self.check_attributes(node);
        self.check_style_refs(node);
        self.check_fields(node);
        self.check_behaviors(node);
    }

    fn report(&mut self, kind: IssueKind, node: &Node, message: String) {
        self.issues.push(Issue::new(kind, message).with_node(node.id.clone()));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────────

    fn check_identity(&mut self, node: &'a Node) {
        if node.id.is_detached() {
            return;
        }
        if !self.seen_ids.insert(&node.id) {
            self.report(IssueKind::DuplicateId, node, format!("id {} is used by more than one node", node.id));
        }
    }

    fn check_structure(&mut self, node: &Node) {
        if let Some(what) = node.element_only_data() {
            self.report(IssueKind::EmptyTag, node, format!("text run carries {what}"));
        }
        if node.is_void() && node.has_content() {
            self.report(
                IssueKind::VoidWithContent,
                node,
                format!("void <{}> has content that export will drop", node.tag),
            );
        }
    }

    fn check_attributes(&mut self, node: &Node) {
        for (name, value) in &node.attributes {
            if self.config.is_reserved_attr(name) {
                self.report(
                    IssueKind::ReservedAttribute,
                    node,
                    format!("attribute {name} is reserved; export skips it"),
                );
            } else if !is_lossless_attr_value(value) {
                self.report(
                    IssueKind::LossyAttribute,
                    node,
                    format!("attribute {name} holds both ' and &quot;; import will not read it back"),
                );
            }
        }
    }

    fn check_style_refs(&mut self, node: &Node) {
        for selector in &node.style_refs {
            let message = match self.selectors.get(selector.as_str()) {
                None => format!("style reference {selector:?} names no rule"),
                Some(subjects) => {
                    let hit = subjects.iter().any(|s| {
                        s.matches(&node.tag, |c| node.class_names.contains(c), node.id.explicit())
                    });
                    if hit {
                        continue;
                    }
                    format!("style reference {selector:?} no longer matches the node's classes or id")
                }
            };
            self.report(IssueKind::DanglingStyleRef, node, message);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fields
    // ─────────────────────────────────────────────────────────────────────────

    fn check_fields(&mut self, node: &'a Node) {
        match &node.field_binding {
            Some(name) => {
                if !is_valid_field_name(name) {
                    self.report(IssueKind::InvalidFieldName, node, format!("field name {name:?} cannot be written as a placeholder"));
                    return;
                }
                let expected = render_field(name);
                if node.text_content != expected {
                    self.report(
                        IssueKind::StaleFieldText,
                        node,
                        format!("text {:?} differs from placeholder {expected}", node.text_content),
                    );
                }
                self.track_section(node, name);
            }
            None if !node.is_raw_text() => {
                for name in placeholder_names(&node.text_content) {
                    self.track_section(node, name);
                }
            }
            None => {}
        }
    }

    fn track_section(&mut self, node: &Node, name: &'a str) {
        match FieldRef::parse(name) {
            FieldRef::Section(base) | FieldRef::Inverted(base) => self.sections.push(OpenSection {
                name: base,
                node: node.id.clone(),
            }),
            FieldRef::Close(base) => match self.sections.iter().rposition(|s| s.name == base) {
                Some(index) => {
                    for open in self.sections.drain(index + 1..).collect::<Vec<_>>() {
                        self.issues.push(
                            Issue::new(
                                IssueKind::UnbalancedSection,
                                format!("section {:?} is not closed before {{{{/{base}}}}}", open.name),
                            )
                            .with_node(open.node),
                        );
                    }
                    self.sections.truncate(index);
                }
                None => self.report(
                    IssueKind::UnbalancedSection,
                    node,
                    format!("{{{{/{base}}}}} closes a section that was never opened"),
                ),
            },
            FieldRef::Field { .. } => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Behaviors
    // ─────────────────────────────────────────────────────────────────────────

    fn check_behaviors(&mut self, node: &Node) {
        for behavior in &node.behaviors {
            for key in behavior.non_primitive_params() {
                self.issues.push(
                    Issue::new(
                        IssueKind::NonPrimitiveParam,
                        format!("param {key:?} of action {:?} is not a primitive", behavior.action),
                    )
                    .with_node(node.id.clone()),
                );
            }
        }
    }

    fn finish(mut self) -> Issues {
        for open in std::mem::take(&mut self.sections) {
            self.issues.push(
                Issue::new(IssueKind::UnbalancedSection, format!("section {:?} is never closed", open.name))
                    .with_node(open.node),
            );
        }
        self.issues
    }
}

/// Placeholder names inside literal text, in order
fn placeholder_names(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find(OPEN)? + OPEN.len();
        let len = rest[start..].find(CLOSE)?;
        let name = rest[start..start + len].trim();
        rest = &rest[start + len + CLOSE.len()..];
        Some(name)
    })
}

// =============================================================================
// Tests
// =============================================================================
