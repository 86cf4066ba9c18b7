//! Host collaborators
//!
//! The converter never consults these: field names and actions are opaque
//! strings all the way through import and export. The editor uses them to
//! populate pickers and to point out references the host cannot satisfy.

use crate::field::{FieldRef, referenced_fields};
use crate::node::Document;

/// Read-only list of fields of the active note type
pub trait FieldCatalog {
    fn field_names(&self) -> Vec<String>;
}

/// Read-only list of actions the host can bind behaviors to
pub trait ActionCatalog {
    fn action_names(&self) -> Vec<String>;
}

/// External HTML/CSS sanitizer run on exported text before it is persisted.
pub trait Sanitizer {
    fn sanitize_markup(&self, markup: &str) -> String;
    fn sanitize_styles(&self, styles: &str) -> String;
}

/// Catalog backed by fixed lists
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub fields: Vec<String>,
    pub actions: Vec<String>,
}

impl StaticCatalog {
    pub fn new<F, A>(fields: F, actions: A) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

impl FieldCatalog for StaticCatalog {
    fn field_names(&self) -> Vec<String> {
        self.fields.clone()
    }
}

impl ActionCatalog for StaticCatalog {
    fn action_names(&self) -> Vec<String> {
        self.actions.clone()
    }
}

/// Sanitizer that returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSanitizer;

impl Sanitizer for NoopSanitizer {
    fn sanitize_markup(&self, markup: &str) -> String {
        markup.to_string()
    }

    fn sanitize_styles(&self, styles: &str) -> String {
        styles.to_string()
    }
}

// =============================================================================
// Editor helpers
// =============================================================================

/// Fields the document refers to that the catalog does not know.
///
/// Reserved names (`FrontSide`, `Tags`, ...) are provided by the host and
/// never reported.
pub fn unknown_fields(doc: &Document, catalog: &dyn FieldCatalog) -> Vec<String> {
    let known = catalog.field_names();
    referenced_fields(doc)
        .into_iter()
        .filter(|name| FieldRef::parse(name).reserved().is_none())
        .filter(|name| !known.contains(name))
        .collect()
}

/// Actions bound by behaviors that the catalog does not offer, first
/// occurrence order.
pub fn unknown_actions(doc: &Document, catalog: &dyn ActionCatalog) -> Vec<String> {
    let known = catalog.action_names();
    let mut out: Vec<String> = Vec::new();
    for behavior in doc.iter_nodes().flat_map(|n| n.behaviors.iter()) {
        if !known.contains(&behavior.action) && !out.contains(&behavior.action) {
            out.push(behavior.action.clone());
        }
    }
    out
}
