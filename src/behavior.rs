//! Behavior codec
//!
//! Behaviors travel with their node as a JSON array stored in one reserved
//! attribute, so the markup grammar never grows. At export time they are
//! additionally expanded into a glue script that calls into the host.
//! Whether the host actually provides an action is never checked here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConvertResult;

/// Trigger assumed when a stored behavior omits one
pub const DEFAULT_TRIGGER: &str = "activate";

/// Declarative binding of an event to a host capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// Host capability name (opaque)
    pub action: String,
    /// Event the action fires on
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Element the action applies to, when not the owning node
    #[serde(default, rename = "target", skip_serializing_if = "Option::is_none")]
    pub target_selector: Option<String>,
    /// Free-form parameters, insertion ordered
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

fn default_trigger() -> String {
    DEFAULT_TRIGGER.to_string()
}

impl Behavior {
    pub fn new(action: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            trigger: trigger.into(),
            target_selector: None,
            params: Map::new(),
        }
    }

    /// Builder: apply the action to another element
    pub fn target(mut self, selector: impl Into<String>) -> Self {
        self.target_selector = Some(selector.into());
        self
    }

    /// Builder: add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Parameter keys whose values are objects or arrays
    pub fn non_primitive_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|(_, v)| v.is_object() || v.is_array())
            .map(|(k, _)| k.as_str())
    }
}

// =============================================================================
// Attribute codec
// =============================================================================

/// Strictly decode an attribute value.
///
/// Empty input is an empty list; a single JSON object is accepted in place
/// of a one-element array.
pub fn try_decode(value: &str) -> ConvertResult<Vec<Behavior>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let json: Value = serde_json::from_str(value)?;
    let behaviors = match json {
        Value::Object(_) => vec![serde_json::from_value(json)?],
        other => serde_json::from_value(other)?,
    };
    Ok(behaviors)
}

/// Decode an attribute value; malformed input yields an empty list.
pub fn decode(value: &str) -> Vec<Behavior> {
    match try_decode(value) {
        Ok(behaviors) => behaviors,
        Err(err) => {
            log::debug!(target: "card_template::behavior", "dropping behavior list: {err}");
            Vec::new()
        }
    }
}

/// Encode a behavior list as a JSON array attribute value.
///
/// Apostrophes are written as `\u0027` so the value is always safe inside a
/// single-quoted attribute.
pub fn encode(behaviors: &[Behavior]) -> String {
    to_json(&behaviors).replace('\'', "\\u0027")
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            log::error!(target: "card_template::behavior", "behavior serialization failed: {err}");
            "null".to_string()
        }
    }
}

// =============================================================================
// Glue generation
// =============================================================================

/// JSON literal that cannot terminate an enclosing `<script>`
fn script_literal<T: Serialize + ?Sized>(value: &T) -> String {
    to_json(value).replace("</", "<\\/")
}

/// One host call for one behavior.
///
/// A pure function of the behavior's fields; `el` is bound by the
/// surrounding script emitted by [`render_glue`].
pub fn glue_statement(behavior: &Behavior, host: &str) -> String {
    let target = match &behavior.target_selector {
        Some(selector) => script_literal(selector.as_str()),
        None => "null".to_string(),
    };
    format!(
        "{host}.bind(el, {}, {}, {target}, {});",
        script_literal(behavior.trigger.as_str()),
        script_literal(behavior.action.as_str()),
        script_literal(&behavior.params),
    )
}

/// Glue script for every behavior-bearing element, in document order.
///
/// `groups[i]` belongs to the i-th element carrying `behavior_attr`, which
/// is also the i-th match of `querySelectorAll` at review time.
pub fn render_glue(groups: &[&[Behavior]], behavior_attr: &str, glue_attr: &str, host: &str) -> String {
    let mut out = String::new();
    out.push_str("<script ");
    out.push_str(glue_attr);
    out.push_str(">\n(function () {\n");
    out.push_str("  var els = document.querySelectorAll(");
    out.push_str(&script_literal(format!("[{behavior_attr}]").as_str()));
    out.push_str(");\n");
    for (index, behaviors) in groups.iter().enumerate() {
        out.push_str("  (function (el) {\n");
        for behavior in behaviors.iter() {
            out.push_str("    ");
            out.push_str(&glue_statement(behavior, host));
            out.push('\n');
        }
        out.push_str(&format!("  }})(els[{index}]);\n"));
    }
    out.push_str("})();\n</script>");
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reveal() -> Behavior {
        Behavior::new("reveal", "activate").param("delay", 0)
    }

    #[test]
    fn test_encode_then_decode_preserves_values() {
        let behaviors = vec![reveal(), Behavior::new("speak", "load").target("#back")];
        let encoded = encode(&behaviors);
        assert_eq!(
            encoded,
            r##"[{"action":"reveal","trigger":"activate","params":{"delay":0}},{"action":"speak","trigger":"load","target":"#back"}]"##
        );
        assert_eq!(decode(&encoded), behaviors);
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let b = Behavior::new("play", "activate").param("z", 1).param("a", 2);
        assert_eq!(encode(&[b]), r#"[{"action":"play","trigger":"activate","params":{"z":1,"a":2}}]"#);
    }

    #[test]
    fn test_malformed_or_absent_is_empty() {
        assert!(decode("").is_empty());
        assert!(decode("[{").is_empty());
        assert!(decode(r#"[{"trigger":"load"}]"#).is_empty());
        assert!(decode("42").is_empty());
        assert!(try_decode("[{").is_err());
    }

    #[test]
    fn test_single_object_and_default_trigger() {
        let decoded = decode(r#"{"action":"flip"}"#);
        assert_eq!(decoded, vec![Behavior::new("flip", DEFAULT_TRIGGER)]);
    }

    #[test]
    fn test_apostrophes_are_escaped() {
        let b = Behavior::new("say", "activate").param("text", "it's");
        let encoded = encode(&[b.clone()]);
        assert!(!encoded.contains('\''));
        assert_eq!(decode(&encoded), vec![b]);
    }

    #[test]
    fn test_glue_statement() {
        let stmt = glue_statement(&reveal(), "cardHost");
        assert_eq!(stmt, r#"cardHost.bind(el, "activate", "reveal", null, {"delay":0});"#);

        let targeted = Behavior::new("toggle", "activate").target("#hint");
        assert_eq!(
            glue_statement(&targeted, "h"),
            r##"h.bind(el, "activate", "toggle", "#hint", {});"##
        );
    }

    #[test]
    fn test_glue_cannot_close_script() {
        let b = Behavior::new("say", "activate").param("text", "</script>");
        assert!(!glue_statement(&b, "h").contains("</script>"));
    }

    #[test]
    fn test_render_glue_indexes_groups() {
        let first = vec![reveal()];
        let second = vec![Behavior::new("speak", "load")];
        let script = render_glue(&[&first, &second], "data-behaviors", "data-behavior-glue", "cardHost");
        assert!(script.starts_with("<script data-behavior-glue>"));
        assert!(script.contains(r#"document.querySelectorAll("[data-behaviors]")"#));
        assert!(script.contains("})(els[0]);"));
        assert!(script.contains("})(els[1]);"));
        assert!(script.ends_with("</script>"));
    }

    #[test]
    fn test_non_primitive_params() {
        let b = Behavior::new("x", "load")
            .param("ok", 1)
            .param("list", json!([1, 2]))
            .param("obj", json!({"a": 1}));
        assert_eq!(b.non_primitive_params().collect::<Vec<_>>(), vec!["list", "obj"]);
    }
}
