//! Non-fatal diagnostics.
//!
//! Import never fails; whatever it had to skip or repair is described by an
//! [`Issue`]. Validation reports through the same type.

use std::fmt;

use thiserror::Error;

use crate::id::NodeId;

/// How bad an issue is for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The result is usable; something was dropped or looks wrong
    Warning,
    /// Export would refuse this document
    Error,
}

/// Which part of the error taxonomy an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCategory {
    /// Lenient parsing dropped or repaired a fragment of the input
    MalformedInput,
    /// The tree breaks a document invariant; not auto-repaired
    StructuralInvariant,
    /// The tree cannot be serialized at all
    ContractViolation,
}

/// What an issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Stray closing tag, implicitly closed element, unterminated comment
    UnbalancedMarkup,
    /// Stylesheet fragment skipped by the style codec
    MalformedStyle,
    /// Behavior attribute that is not a valid JSON behavior list
    MalformedBehavior,
    /// Behavior parameter that is an object or array
    NonPrimitiveParam,
    /// `{{#Name}}` without `{{/Name}}`, or the reverse
    UnbalancedSection,
    /// Field name that is empty or contains `}}`
    InvalidFieldName,
    /// Style reference to a class or id no node carries
    DanglingStyleRef,
    /// Void element with children or text
    VoidWithContent,
    /// Two nodes share one id
    DuplicateId,
    /// Field-bound node whose text differs from its placeholder
    StaleFieldText,
    /// `class`, `id`, behavior or glue attribute stored as a plain attribute
    ReservedAttribute,
    /// Attribute value that cannot be written so that import reads it back
    LossyAttribute,
    /// Text run (empty tag) carrying element-only data
    EmptyTag,
}

impl IssueKind {
    pub fn category(self) -> IssueCategory {
        match self {
            IssueKind::UnbalancedMarkup
            | IssueKind::MalformedStyle
            | IssueKind::MalformedBehavior
            | IssueKind::NonPrimitiveParam
            | IssueKind::UnbalancedSection
            | IssueKind::InvalidFieldName => IssueCategory::MalformedInput,
            IssueKind::DanglingStyleRef
            | IssueKind::VoidWithContent
            | IssueKind::DuplicateId
            | IssueKind::StaleFieldText
            | IssueKind::ReservedAttribute
            | IssueKind::LossyAttribute => IssueCategory::StructuralInvariant,
            IssueKind::EmptyTag => IssueCategory::ContractViolation,
        }
    }

    pub fn severity(self) -> Severity {
        match self.category() {
            IssueCategory::ContractViolation => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::UnbalancedMarkup => "unbalanced-markup",
            IssueKind::MalformedStyle => "malformed-style",
            IssueKind::MalformedBehavior => "malformed-behavior",
            IssueKind::NonPrimitiveParam => "non-primitive-param",
            IssueKind::UnbalancedSection => "unbalanced-section",
            IssueKind::InvalidFieldName => "invalid-field-name",
            IssueKind::DanglingStyleRef => "dangling-style-ref",
            IssueKind::VoidWithContent => "void-with-content",
            IssueKind::DuplicateId => "duplicate-id",
            IssueKind::StaleFieldText => "stale-field-text",
            IssueKind::ReservedAttribute => "reserved-attribute",
            IssueKind::LossyAttribute => "lossy-attribute",
            IssueKind::EmptyTag => "empty-tag",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Issue
// =============================================================================

/// One diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}{}", format_context(.node, .hint))]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// The node the issue is about (if applicable)
    pub node: Option<NodeId>,
    /// Source hint for locating the problem (e.g. the offending fragment)
    pub hint: Option<String>,
}

fn format_context(node: &Option<NodeId>, hint: &Option<String>) -> String {
    let mut ctx = String::new();
    if let Some(id) = node {
        ctx.push_str(&format!(" [node: {id}]"));
    }
    if let Some(hint) = hint {
        ctx.push_str(&format!(" ({hint})"));
    }
    ctx
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            node: None,
            hint: None,
        }
    }

    /// Attach the node the issue is about.
    pub fn with_node(mut self, id: NodeId) -> Self {
        self.node = Some(id);
        self
    }

    /// Attach a source hint, shortened to keep diagnostics one line.
    pub fn with_hint(mut self, hint: impl AsRef<str>) -> Self {
        const MAX_HINT: usize = 60;
        let hint = hint.as_ref().trim();
        let short = match hint.char_indices().nth(MAX_HINT) {
            Some((cut, _)) => format!("{}…", &hint[..cut]),
            None => hint.to_string(),
        };
        self.hint = Some(short);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn category(&self) -> IssueCategory {
        self.kind.category()
    }
}

// =============================================================================
// Issues
// =============================================================================

/// Diagnostics collected from one import or validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Issues {
    issues: Vec<Issue>,
}

impl Issues {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn push(&mut self, issue: Issue) {
        log::debug!(target: "card_template::issue", "{issue}");
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// Issues about one node.
    pub fn by_node<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.node.as_ref() == Some(id))
    }

    pub fn by_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// True if any issue would make export refuse the document.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Error)
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl FromIterator<Issue> for Issues {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        let mut issues = Issues::new();
        issues.extend(iter);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::StableId;

    #[test]
    fn test_issue_display() {
        let issue = Issue::new(IssueKind::DuplicateId, "id used twice")
            .with_node(NodeId::Explicit("answer".into()))
            .with_hint("<hr id=answer>");
        assert_eq!(
            issue.to_string(),
            "duplicate-id: id used twice [node: #answer] (<hr id=answer>)"
        );
    }

    #[test]
    fn test_hint_is_shortened() {
        let long = "x".repeat(200);
        let issue = Issue::new(IssueKind::MalformedStyle, "bad").with_hint(&long);
        assert_eq!(issue.hint.as_deref().map(|h| h.chars().count()), Some(61));
    }

    #[test]
    fn test_taxonomy() {
        assert_eq!(IssueKind::MalformedBehavior.category(), IssueCategory::MalformedInput);
        assert_eq!(IssueKind::VoidWithContent.category(), IssueCategory::StructuralInvariant);
        assert_eq!(IssueKind::EmptyTag.severity(), Severity::Error);
        assert_eq!(IssueKind::DanglingStyleRef.severity(), Severity::Warning);
    }

    #[test]
    fn test_issues_filters() {
        let id = NodeId::Synthetic(StableId::from_raw(9));
        let issues: Issues = vec![
            Issue::new(IssueKind::MalformedStyle, "a"),
            Issue::new(IssueKind::EmptyTag, "b").with_node(id.clone()),
        ]
        .into_iter()
        .collect();

        assert_eq!(issues.len(), 2);
        assert!(issues.has_errors());
        assert_eq!(issues.by_node(&id).count(), 1);
        assert_eq!(issues.by_kind(IssueKind::MalformedStyle).count(), 1);
    }
}
