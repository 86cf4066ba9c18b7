//! Field placeholders
//!
//! The host substitutes `{{Name}}` tokens at review time. A text node is
//! *field-bound* only when its whole trimmed content is exactly one token;
//! text that mixes literals with a token (`Answer: {{Back}}`) stays literal.

use rustc_hash::FxHashSet;

use crate::node::Document;

/// Opening delimiter of a placeholder
pub const OPEN: &str = "{{";
/// Closing delimiter of a placeholder
pub const CLOSE: &str = "}}";

/// Classify a text node.
///
/// Returns `(Some(name), "")` when the trimmed text is exactly one
/// placeholder, otherwise `(None, text)` with the input untouched. The name
/// is trimmed and keeps its case.
pub fn extract_field(text: &str) -> (Option<String>, &str) {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix(OPEN)
        .and_then(|rest| rest.strip_suffix(CLOSE))
    else {
        return (None, text);
    };
    // `{{a}} {{b}}` also starts and ends with delimiters
    if inner.contains(CLOSE) {
        return (None, text);
    }
    let name = inner.trim();
    if name.is_empty() {
        return (None, text);
    }
    (Some(name.to_string()), "")
}

/// Render the placeholder token for a field name.
pub fn render_field(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + OPEN.len() + CLOSE.len());
    out.push_str(OPEN);
    out.push_str(name);
    out.push_str(CLOSE);
    out
}

/// A field name that the host cannot emit back verbatim
pub fn is_valid_field_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(CLOSE)
}

// =============================================================================
// FieldRef - typed view over a placeholder name
// =============================================================================

/// Structure of a placeholder name
///
/// The converter stores names as opaque strings; this view exists for the
/// editor and for section balance checks in validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef<'a> {
    /// `{{#Name}}` - rendered only when the field is non-empty
    Section(&'a str),
    /// `{{^Name}}` - rendered only when the field is empty
    Inverted(&'a str),
    /// `{{/Name}}` - closes a section
    Close(&'a str),
    /// `{{filter:...:Name}}` or plain `{{Name}}`
    Field {
        filters: Vec<&'a str>,
        name: &'a str,
    },
}

impl<'a> FieldRef<'a> {
    pub fn parse(name: &'a str) -> Self {
        let name = name.trim();
        if let Some(rest) = name.strip_prefix('#') {
            return FieldRef::Section(rest.trim());
        }
        if let Some(rest) = name.strip_prefix('^') {
            return FieldRef::Inverted(rest.trim());
        }
        if let Some(rest) = name.strip_prefix('/') {
            return FieldRef::Close(rest.trim());
        }
        let mut parts: Vec<&str> = name.split(':').map(str::trim).collect();
        let base = parts.pop().unwrap_or_default();
        FieldRef::Field {
            filters: parts,
            name: base,
        }
    }

    /// The underlying field name without section markers or filters
    pub fn base_name(&self) -> &'a str {
        match self {
            FieldRef::Section(n) | FieldRef::Inverted(n) | FieldRef::Close(n) => n,
            FieldRef::Field { name, .. } => name,
        }
    }

    pub fn reserved(&self) -> Option<ReservedField> {
        ReservedField::from_name(self.base_name())
    }

    pub fn opens_section(&self) -> bool {
        matches!(self, FieldRef::Section(_) | FieldRef::Inverted(_))
    }
}

/// Names the host fills in itself rather than from note fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedField {
    /// The rendered other side of the card
    FrontSide,
    Tags,
    /// Card type name
    Type,
    Deck,
    Subdeck,
    Card,
    CardFlag,
    CardId,
}

impl ReservedField {
    pub const ALL: [ReservedField; 8] = [
        ReservedField::FrontSide,
        ReservedField::Tags,
        ReservedField::Type,
        ReservedField::Deck,
        ReservedField::Subdeck,
        ReservedField::Card,
        ReservedField::CardFlag,
        ReservedField::CardId,
    ];

    /// Canonical spelling
    pub fn as_str(self) -> &'static str {
        match self {
            ReservedField::FrontSide => "FrontSide",
            ReservedField::Tags => "Tags",
            ReservedField::Type => "Type",
            ReservedField::Deck => "Deck",
            ReservedField::Subdeck => "Subdeck",
            ReservedField::Card => "Card",
            ReservedField::CardFlag => "CardFlag",
            ReservedField::CardId => "CardID",
        }
    }

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(name))
    }
}

/// Base field names the document refers to, first occurrence order
///
/// Reserved names and section markers are included by base name, so the
/// editor can compare the list against its field catalog.
pub fn referenced_fields(doc: &Document) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for node in doc.iter_nodes() {
        if let Some(binding) = &node.field_binding {
            let base = FieldRef::parse(binding).base_name();
            if !base.is_empty() && seen.insert(base.to_string()) {
                out.push(base.to_string());
            }
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
