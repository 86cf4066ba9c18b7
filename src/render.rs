//! Markup rendering
//!
//! Renders a forest of [`Node`]s back to template markup and the style
//! table back to stylesheet text. Output is canonical: attributes in a
//! fixed order, siblings one per line, no re-sorting of anything the
//! editor ordered.

use crate::behavior::{self, Behavior};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::field::render_field;
use crate::node::Node;
use crate::style::{self, StyleRule};

// =============================================================================
// Entry points
// =============================================================================

/// Render markup and stylesheet text.
pub fn render(roots: &[Node], styles: &[StyleRule], config: &ConverterConfig) -> ConvertResult<(String, String)> {
    let markup = render_markup(roots, config)?;
    Ok((markup, style::encode(styles)))
}

/// Render markup only, appending behavior glue when configured.
pub fn render_markup(roots: &[Node], config: &ConverterConfig) -> ConvertResult<String> {
    let mut renderer = Renderer::new(config);
    for (i, node) in roots.iter().enumerate() {
        if i > 0 {
            renderer.output.push('\n');
        }
        renderer.render_node(node)?;
    }

    if config.emit_glue && !renderer.groups.is_empty() {
        let glue = behavior::render_glue(
            &renderer.groups,
            config.behavior_attr(),
            config.glue_attr(),
            config.glue_host(),
        );
        if !renderer.output.is_empty() {
            renderer.output.push('\n');
        }
        renderer.output.push_str(&glue);
    }
    Ok(renderer.output)
}

// =============================================================================
// Renderer
// =============================================================================

struct Renderer<'a> {
    config: &'a ConverterConfig,
    output: String,
    /// Behavior lists of rendered elements, in document order
    groups: Vec<&'a [Behavior]>,
}

impl<'a> Renderer<'a> {
    fn new(config: &'a ConverterConfig) -> Self {
        Self {
            config,
            output: String::new(),
            groups: Vec::new(),
        }
    }

    fn render_node(&mut self, node: &'a Node) -> ConvertResult<()> {
        if let Some(what) = node.element_only_data() {
            return Err(ConvertError::empty_tag(&node.id, what));
        }
        if node.is_text_run() {
            self.render_content_text(node);
            return Ok(());
        }

        self.output.push('<');
        push_tag(&mut self.output, &node.tag);
        self.render_attrs(node);

        // Void elements
        if node.is_void() {
            if node.has_content() {
                log::debug!(
                    target: "card_template::render",
                    "dropping content of void <{}> {}",
                    node.tag,
                    node.id
                );
            }
            self.output.push_str(" />");
            return Ok(());
        }

        self.output.push('>');
        if node.field_binding.is_some() {
            self.render_content_text(node);
        } else if node.has_children() {
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    self.output.push('\n');
                }
                self.render_node(child)?;
            }
        } else {
            self.output.push_str(&node.text_content);
        }
        self.output.push_str("</");
        push_tag(&mut self.output, &node.tag);
        self.output.push('>');
        Ok(())
    }

    /// Placeholder of a bound node, otherwise its literal text.
    fn render_content_text(&mut self, node: &Node) {
        match &node.field_binding {
            Some(name) => self.output.push_str(&render_field(name)),
            None => self.output.push_str(&node.text_content),
        }
    }

    /// `class`, `id`, plain attributes, then the behavior list.
    ///
    /// Reserved names left in `attributes` are skipped: they would duplicate
    /// `class`/`id` or shift the glue's element lookup.
    fn render_attrs(&mut self, node: &'a Node) {
        if !node.class_names.is_empty() {
            push_attr(&mut self.output, "class", &node.class_names.to_attr_value());
        }
        if let Some(id) = node.id.explicit() {
            push_attr(&mut self.output, "id", id);
        }
        for (name, value) in &node.attributes {
            if self.config.is_reserved_attr(name) {
                log::debug!(
                    target: "card_template::render",
                    "skipping reserved attribute {name} on <{}> {}",
                    node.tag,
                    node.id
                );
                continue;
            }
            push_attr(&mut self.output, name, value);
        }
        if !node.behaviors.is_empty() {
            push_attr(&mut self.output, self.config.behavior_attr(), &behavior::encode(&node.behaviors));
            self.groups.push(&node.behaviors);
        }
    }
}

/// Tag names are written lowercase, the form the parser reads them in.
fn push_tag(output: &mut String, tag: &str) {
    output.extend(tag.chars().map(|c| c.to_ascii_lowercase()));
}

/// Entity written for `"` inside a double-quoted value that also holds `'`
pub const QUOT_ENTITY: &str = "&quot;";

/// Whether a value survives export and re-import unchanged.
///
/// Only a value holding both `'` and a literal `&quot;` is lost: it must be
/// double quoted, and import decodes the entity.
pub fn is_lossless_attr_value(value: &str) -> bool {
    !(value.contains('\'') && value.contains(QUOT_ENTITY))
}

/// Append ` name="value"`, picking quotes the value does not contain.
///
/// Values holding `"` or a literal `&quot;` go in single quotes, which
/// import reads verbatim.
fn push_attr(output: &mut String, name: &str, value: &str) {
    output.push(' ');
    output.push_str(name);
    if value.is_empty() {
        // Boolean attribute
        return;
    }
    let needs_single = value.contains('"') || value.contains(QUOT_ENTITY);
    let has_single = value.contains('\'');
    match (needs_single, has_single) {
        (true, false) => {
            output.push_str("='");
            output.push_str(value);
            output.push('\'');
        }
        (true, true) => {
            log::debug!(
                target: "card_template::render",
                "attribute {name} mixes both quote kinds; writing \" as {QUOT_ENTITY}"
            );
            output.push_str("=\"");
            output.push_str(&value.replace('"', QUOT_ENTITY));
            output.push('"');
        }
        (false, _) => {
            output.push_str("=\"");
            output.push_str(value);
            output.push('"');
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(roots: &[Node]) -> String {
        render_markup(roots, &ConverterConfig::TREE).unwrap()
    }

    #[test]
    fn test_card_scenario() {
        let roots = vec![Node::new("div").with_class("card").child(Node::field("span", "Front"))];
        assert_eq!(markup(&roots), r#"<div class="card"><span>{{Front}}</span></div>"#);
    }

    #[test]
    fn test_attribute_order() {
        let node = Node::new("div")
            .attr("data-z", "1")
            .with_id("main")
            .attr("data-a", "2")
            .with_class("b")
            .with_class("a");
        assert_eq!(
            markup(&[node]),
            r#"<div class="b a" id="main" data-z="1" data-a="2"></div>"#
        );
    }

    #[test]
    fn test_synthetic_id_not_rendered() {
        let mut node = Node::new("p").with_text("x");
        node.id = crate::id::NodeId::Synthetic(crate::id::StableId::from_raw(7));
        assert_eq!(markup(&[node]), "<p>x</p>");
    }

    #[test]
    fn test_field_binding_wins_over_stale_text() {
        let mut node = Node::field("span", "Back");
        node.text_content = "stale".into();
        assert_eq!(markup(&[node]), "<span>{{Back}}</span>");
    }

    #[test]
    fn test_children_joined_by_newline() {
        let node = Node::new("div")
            .child(Node::field("", "Front"))
            .child(Node::new("hr").with_id("answer"))
            .child(Node::text("tail"));
        assert_eq!(markup(&[node]), "<div>{{Front}}\n<hr id=\"answer\" />\ntail</div>");
    }

    #[test]
    fn test_void_drops_content() {
        let node = Node::new("br").with_text("oops").child(Node::new("span"));
        let out = markup(&[node]);
        assert_eq!(out, "<br />");
        assert!(!out.contains("</br>"));
    }

    #[test]
    fn test_quoting() {
        let node = Node::new("div")
            .attr("title", r#"say "hi""#)
            .attr("alt", "it's")
            .attr("data-mix", r#"it's "x""#)
            .attr("hidden", "");
        assert_eq!(
            markup(&[node]),
            r#"<div title='say "hi"' alt="it's" data-mix="it's &quot;x&quot;" hidden></div>"#
        );
    }

    #[test]
    fn test_literal_entity_single_quoted() {
        let node = Node::new("div").attr("data-raw", "&quot;kept&quot;");
        assert_eq!(markup(&[node]), "<div data-raw='&quot;kept&quot;'></div>");
        assert!(is_lossless_attr_value("&quot;kept&quot;"));
        assert!(is_lossless_attr_value(r#"it's "x""#));
        assert!(!is_lossless_attr_value("it's &quot;x&quot;"));
    }

    #[test]
    fn test_tag_written_lowercase() {
        let mut node = Node::new("div").with_text("x");
        node.tag = "DIV".into();
        assert_eq!(markup(&[node]), "<div>x</div>");
    }

    #[test]
    fn test_reserved_attributes_skipped() {
        let roots = vec![
            Node::new("div")
                .with_class("card")
                .with_id("main")
                .attr("CLASS", "other")
                .attr("id", "shadow")
                .attr("data-behaviors", "[]")
                .attr("data-behavior-glue", ""),
            Node::new("button").behavior(Behavior::new("reveal", "activate")),
        ];
        let out = render_markup(&roots, &ConverterConfig::TEMPLATE).unwrap();
        let (tree, glue) = out.split_once("\n<script").unwrap();
        assert!(tree.starts_with(r#"<div class="card" id="main"></div>"#));
        assert_eq!(tree.matches("data-behaviors=").count(), 1);
        assert!(tree.contains("<button data-behaviors="));
        assert!(glue.contains("els[0]"));
        assert!(!glue.contains("els[1]"));
    }

    #[test]
    fn test_behavior_attribute_single_quoted() {
        let node = Node::new("button")
            .with_text("Show")
            .behavior(Behavior::new("reveal", "activate").param("delay", 0));
        assert_eq!(
            markup(&[node]),
            r#"<button data-behaviors='[{"action":"reveal","trigger":"activate","params":{"delay":0}}]'>Show</button>"#
        );
    }

    #[test]
    fn test_glue_appended_when_configured() {
        let roots = vec![
            Node::new("button").behavior(Behavior::new("reveal", "activate")),
            Node::new("p").with_text("plain"),
        ];
        let out = render_markup(&roots, &ConverterConfig::TEMPLATE).unwrap();
        assert!(out.starts_with("<button data-behaviors="));
        assert!(out.contains("</button>\n<p>plain</p>\n<script data-behavior-glue>"));
        assert!(out.contains(r#"cardHost.bind(el, "activate", "reveal", null, {});"#));

        let plain = render_markup(&roots[1..], &ConverterConfig::TEMPLATE).unwrap();
        assert_eq!(plain, "<p>plain</p>");
    }

    #[test]
    fn test_empty_tag_is_contract_violation() {
        let roots = vec![Node::new("div").child(Node::text("x").with_class("bad"))];
        let err = render_markup(&roots, &ConverterConfig::TREE).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyTag { what: "classes", .. }));
    }

    #[test]
    fn test_render_styles() {
        let (out, css) = render(
            &[Node::new("div").with_class("card")],
            &[StyleRule::new(".card").declare("color", "red")],
            &ConverterConfig::TREE,
        )
        .unwrap();
        assert_eq!(out, r#"<div class="card"></div>"#);
        assert_eq!(css, ".card {\n  color: red;\n}\n");
    }
}
