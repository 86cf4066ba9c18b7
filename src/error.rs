//! Error types for card-template.
//!
//! Only programming-contract violations are errors. Everything the
//! converter can recover from is reported as an [`Issue`](crate::issue::Issue).

use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A bare text run (empty tag) carries element-only data and cannot be
    /// written as markup without corrupting the output.
    #[error("node {node} has an empty tag but carries {what}")]
    EmptyTag {
        /// Display form of the offending node id
        node: String,
        /// What the text run carries that only elements can hold
        what: &'static str,
    },

    /// The behavior attribute is not a valid JSON behavior list
    #[error("invalid behavior list: {0}")]
    Behavior(#[from] serde_json::Error),
}

/// Result type alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

impl ConvertError {
    /// Create an empty-tag contract violation.
    pub fn empty_tag(node: impl ToString, what: &'static str) -> Self {
        Self::EmptyTag {
            node: node.to_string(),
            what,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::empty_tag("n7b", "children");
        assert_eq!(err.to_string(), "node n7b has an empty tag but carries children");

        let json_err = serde_json::from_str::<Vec<u8>>("[").unwrap_err();
        let err = ConvertError::from(json_err);
        assert!(err.to_string().starts_with("invalid behavior list:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConvertError>();
    }
}
