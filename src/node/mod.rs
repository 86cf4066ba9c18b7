//! Document tree types.
//!
//! A [`Node`] is either an element or, when its tag is empty, a bare text
//! run. Every node keeps its own class list, attributes, field binding and
//! behaviors as separate typed fields; the markup form interleaves them.
//!
//! # Content
//!
//! - `field_binding` set: the content is the placeholder, nothing else
//! - `children` non-empty: the content is the children
//! - otherwise: the content is `text_content`

mod document;

pub use document::{Document, NodeIter};

use compact_str::CompactString;

use crate::attr::{Attrs, AttrsExt, ClassList};
use crate::behavior::Behavior;
use crate::field::render_field;
use crate::id::NodeId;
use crate::style::{self, Declarations};

/// Tag given to nodes created without one
pub const DEFAULT_TAG: &str = "div";

/// Elements that never have content or a closing tag
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is kept verbatim
pub const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Check if a tag is a void element.
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Check if a tag holds raw text.
pub fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

// =============================================================================
// Node
// =============================================================================

/// One element (or text run) of the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Element name; empty for a bare text run
    pub tag: CompactString,
    pub class_names: ClassList,
    /// Everything except `class`, `id` and the behavior attribute
    pub attributes: Attrs,
    pub text_content: String,
    pub children: Vec<Node>,
    /// Field whose placeholder is this node's only content
    pub field_binding: Option<String>,
    pub behaviors: Vec<Behavior>,
    /// Selectors of the style rules that target this node
    pub style_refs: Vec<String>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl Node {
    /// Create an element; the tag is stored lowercase, as markup reads it.
    pub fn new(tag: &str) -> Self {
        Self {
            id: NodeId::default(),
            tag: CompactString::from(tag.to_ascii_lowercase()),
            class_names: ClassList::new(),
            attributes: Attrs::new(),
            text_content: String::new(),
            children: Vec::new(),
            field_binding: None,
            behaviors: Vec::new(),
            style_refs: Vec::new(),
        }
    }

    /// Create a bare text run
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new("");
        node.text_content = content.into();
        node
    }

    /// Create an element bound to a field
    pub fn field(tag: &str, name: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.bind_field(name);
        node
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = NodeId::Explicit(id.into());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class_names.add(class);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Field binding
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind to a field; the text becomes its placeholder.
    pub fn bind_field(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.text_content = render_field(&name);
        self.field_binding = Some(name);
    }

    /// Remove the binding, leaving empty literal text.
    pub fn unbind_field(&mut self) -> Option<String> {
        let name = self.field_binding.take()?;
        self.text_content.clear();
        Some(name)
    }

    /// Replace the literal text; refused while a field is bound.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if self.field_binding.is_some() {
            return false;
        }
        self.text_content = text.into();
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_text_run(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }

    pub fn is_raw_text(&self) -> bool {
        is_raw_text_tag(&self.tag)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if the node has text, a field or children
    pub fn has_content(&self) -> bool {
        self.field_binding.is_some() || self.has_children() || !self.text_content.is_empty()
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get_attr(name)
    }

    /// Declarations of the inline `style` attribute
    pub fn inline_style(&self) -> Declarations {
        self.get_attr("style")
            .map(style::decode_declarations)
            .unwrap_or_default()
    }

    /// Element-only data a text run must not carry, for diagnostics
    pub fn element_only_data(&self) -> Option<&'static str> {
        if !self.is_text_run() {
            return None;
        }
        if self.has_children() {
            Some("children")
        } else if !self.class_names.is_empty() {
            Some("classes")
        } else if !self.attributes.is_empty() {
            Some("attributes")
        } else if self.id.explicit().is_some() {
            Some("an explicit id")
        } else if !self.behaviors.is_empty() {
            Some("behaviors")
        } else {
            None
        }
    }

    /// Depth-first iterator over this node and its descendants
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter::new(std::slice::from_ref(self))
    }
}

// =============================================================================
// Tests
// =============================================================================
