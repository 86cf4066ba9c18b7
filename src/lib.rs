//! card-template - Bidirectional converter between card templates and a block tree
//!
//! ## Core Concepts
//!
//! A flashcard host stores each card side as two strings: markup with
//! `{{Field}}` placeholders and a stylesheet. The editor works on a
//! [`Document`] instead: a forest of typed [`Node`]s plus a style table.
//! Import is lenient and never fails; export is canonical, so exporting an
//! imported template is a fixed point.
//!
//! ## Modules
//! - `node`: Node and Document types, id assignment, style linking
//! - `parse`: markup parser (text → forest)
//! - `render`: markup generator (forest → text)
//! - `style`: style table codec
//! - `behavior`: behavior attribute codec and glue generation
//! - `field`: placeholder resolution
//! - `validate`: invariant checks
//! - `converter`: import/export facade
//! - `catalog`: host collaborator traits
//!
//! ## Usage
//!
//! ```
//! use card_template::{export_template, import_template};
//!
//! let doc = import_template(r#"<div class="card"><span>{{Front}}</span></div>"#, "");
//! assert_eq!(doc.roots[0].children[0].field_binding.as_deref(), Some("Front"));
//!
//! let template = export_template(&doc).unwrap();
//! assert_eq!(template.markup, r#"<div class="card"><span>{{Front}}</span></div>"#);
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// Node types: Document, Node
pub mod node;

/// Attribute types
pub mod attr;

/// Stable identity for nodes
pub mod id;

/// Content hashing for ids
pub mod hash;

/// Field placeholders
pub mod field;

/// Behavior codec
pub mod behavior;

/// Style table codec
pub mod style;

/// Markup parsing
pub mod parse;

/// Markup rendering
pub mod render;

/// Invariant checks
pub mod validate;

/// Diagnostics
pub mod issue;

/// Error types
pub mod error;

/// Converter configuration
pub mod config;

/// Import/export facade
pub mod converter;

/// Host collaborators
pub mod catalog;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Document, Node, NodeIter};

// Facade
pub use converter::{Converter, Template, export_template, import_template, validate};

// Codecs
pub use behavior::Behavior;
pub use style::StyleRule;

// Attribute types
pub use attr::{Attrs, AttrsExt, ClassList};

// Identity
pub use hash::StableHasher;
pub use id::{NodeId, StableId};

// Diagnostics and errors
pub use error::{ConvertError, ConvertResult};
pub use issue::{Issue, IssueCategory, IssueKind, Issues, Severity};

// Configuration
pub use config::ConverterConfig;

// Collaborators
pub use catalog::{ActionCatalog, FieldCatalog, Sanitizer, StaticCatalog};
