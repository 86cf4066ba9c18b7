//! Prelude module for common imports.
//!
//! ```ignore
//! use card_template::prelude::*;
//! ```

// Node types
pub use crate::node::{Document, Node, NodeIter};

// Facade
pub use crate::converter::{Converter, Template, export_template, import_template, validate};

// Configuration
pub use crate::config::{
    ConverterConfig, DEFAULT_BEHAVIOR_ATTR, DEFAULT_GLUE_ATTR, DEFAULT_GLUE_HOST,
};

// Attributes
pub use crate::attr::{Attrs, AttrsExt, ClassList};

// Identity
pub use crate::id::{NodeId, StableId};

// Fields
pub use crate::field::{FieldRef, ReservedField, extract_field, render_field};

// Codecs
pub use crate::behavior::Behavior;
pub use crate::style::{Declarations, StyleRule};

// Diagnostics
pub use crate::error::{ConvertError, ConvertResult};
pub use crate::issue::{Issue, IssueCategory, IssueKind, Issues, Severity};

// Collaborators
pub use crate::catalog::{
    ActionCatalog, FieldCatalog, NoopSanitizer, Sanitizer, StaticCatalog, unknown_actions,
    unknown_fields,
};
