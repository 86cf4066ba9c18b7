//! Converter facade
//!
//! Stateless entry points: template text in, [`Document`] out, and back.
//!
//! ```text
//! import:  markup ──parse──┐
//!          styles ──decode─┴─▶ Document::new ──validate──▶ Document (+ issues)
//!
//! export:  Document ──render──▶ Template { markup, styles }
//! ```

use crate::catalog::Sanitizer;
use crate::config::ConverterConfig;
use crate::error::ConvertResult;
use crate::issue::Issues;
use crate::node::Document;
use crate::{parse, render, style, validate as check};

/// The two strings the host persists for one card side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pub markup: String,
    pub styles: String,
}

impl Template {
    pub fn new(markup: impl Into<String>, styles: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            styles: styles.into(),
        }
    }
}

/// Converter between template text and documents
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Import template text. Never fails.
    ///
    /// Whatever had to be skipped or repaired, plus every validation
    /// finding, is attached to [`Document::issues`].
    pub fn import_template(&self, markup: &str, styles: &str) -> Document {
        let (roots, parse_issues) = parse::parse_with(markup, &self.config);
        let (rules, style_issues) = style::decode(styles);

        let mut doc = Document::new(roots, rules);
        let mut issues = Issues::new();
        issues.extend(parse_issues);
        issues.extend(style_issues);
        issues.extend(check::validate_with(&doc, &self.config));
        doc.issues = issues;

        log::debug!(
            target: "card_template::converter",
            "imported {} nodes, {} style rules, {} issues",
            doc.node_count(),
            doc.styles.len(),
            doc.issues.len()
        );
        doc
    }

    /// Export a document as template text.
    ///
    /// Fails only for a text run carrying element-only data, which cannot
    /// be written without corrupting the markup.
    pub fn export_template(&self, doc: &Document) -> ConvertResult<Template> {
        let (markup, styles) = render::render(&doc.roots, &doc.styles, &self.config)?;
        log::debug!(
            target: "card_template::converter",
            "exported {} bytes of markup, {} bytes of styles",
            markup.len(),
            styles.len()
        );
        Ok(Template { markup, styles })
    }

    /// Export, then pass both strings through the host's sanitizer.
    pub fn export_sanitized(&self, doc: &Document, sanitizer: &dyn Sanitizer) -> ConvertResult<Template> {
        let template = self.export_template(doc)?;
        Ok(Template {
            markup: sanitizer.sanitize_markup(&template.markup),
            styles: sanitizer.sanitize_styles(&template.styles),
        })
    }

    /// Check document invariants. Never mutates.
    pub fn validate(&self, doc: &Document) -> Issues {
        check::validate_with(doc, &self.config)
    }

    /// Export many documents, e.g. every card type of a note type.
    #[cfg(feature = "parallel")]
    pub fn export_all(&self, docs: &[Document]) -> Vec<ConvertResult<Template>> {
        use rayon::prelude::*;
        docs.par_iter().map(|doc| self.export_template(doc)).collect()
    }

    /// Export many documents, e.g. every card type of a note type.
    #[cfg(not(feature = "parallel"))]
    pub fn export_all(&self, docs: &[Document]) -> Vec<ConvertResult<Template>> {
        docs.iter().map(|doc| self.export_template(doc)).collect()
    }
}

// =============================================================================
// Free functions (default configuration)
// =============================================================================

/// Import with [`ConverterConfig::TEMPLATE`].
pub fn import_template(markup: &str, styles: &str) -> Document {
    Converter::default().import_template(markup, styles)
}

/// Export with [`ConverterConfig::TEMPLATE`].
pub fn export_template(doc: &Document) -> ConvertResult<Template> {
    Converter::default().export_template(doc)
}

pub fn validate(doc: &Document) -> Issues {
    check::validate(doc)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Behavior;
    use crate::catalog::NoopSanitizer;
    use crate::error::ConvertError;
    use crate::issue::IssueKind;
    use crate::node::Node;
    use crate::style::StyleRule;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Document: Send, Sync);
    assert_impl_all!(Converter: Send, Sync);
    assert_impl_all!(Template: Send, Sync);
    assert_impl_all!(ConvertError: Send, Sync);

    const CARD: &str = r#"<div class="card"><span>{{Front}}</span></div>"#;

    /// Structural view that ignores derived data (ids, style refs, issues)
    fn shape(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| {
                format!(
                    "{}|{}|{:?}|{:?}|{:?}|{}|{:?}|[{}]",
                    n.tag,
                    n.class_names.to_attr_value(),
                    n.id.explicit(),
                    n.attributes,
                    n.field_binding,
                    n.text_content,
                    n.behaviors,
                    shape(&n.children).join(",")
                )
            })
            .collect()
    }

    fn round_trip(converter: &Converter, template: &Template) -> Template {
        let doc = converter.import_template(&template.markup, &template.styles);
        converter.export_template(&doc).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Concrete scenarios
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_card_import() {
        let doc = import_template(CARD, "");
        assert!(doc.issues.is_empty());
        assert_eq!(doc.roots.len(), 1);
        let card = &doc.roots[0];
        assert_eq!(card.tag, "div");
        assert!(card.class_names.contains("card"));
        assert_eq!(card.children.len(), 1);
        assert_eq!(card.children[0].tag, "span");
        assert_eq!(card.children[0].field_binding.as_deref(), Some("Front"));
    }

    #[test]
    fn test_card_export_is_byte_equal() {
        let doc = import_template(CARD, "");
        let template = export_template(&doc).unwrap();
        assert_eq!(template.markup, CARD);
        assert_eq!(template.styles, "");
    }

    #[test]
    fn test_stylesheet_scenario() {
        let doc = import_template("", ".card { color: red; font-size: 12px }");
        assert_eq!(doc.styles.len(), 1);
        assert_eq!(doc.styles[0].selector, ".card");
        assert_eq!(
            doc.styles[0].declarations,
            vec![
                ("color".to_string(), "red".to_string()),
                ("font-size".to_string(), "12px".to_string()),
            ]
        );
        let css = export_template(&doc).unwrap().styles;
        assert_eq!(css, ".card {\n  color: red;\n  font-size: 12px;\n}\n");

        let spread = import_template("", ".card {\ncolor: red;\n\n\nfont-size: 12px }");
        assert_eq!(export_template(&spread).unwrap().styles, css);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_behavior_preservation() {
        let reveal = Behavior::new("reveal", "activate").param("delay", 0);
        let doc = Document::new(
            vec![Node::new("button").with_text("Show").behavior(reveal.clone())],
            vec![],
        );
        for config in [ConverterConfig::TEMPLATE, ConverterConfig::TREE] {
            let converter = Converter::new(config);
            let template = converter.export_template(&doc).unwrap();
            let back = converter.import_template(&template.markup, &template.styles);
            assert_eq!(back.roots.len(), 1, "glue must not come back as a node");
            assert_eq!(back.roots[0].behaviors, vec![reveal.clone()]);
        }
    }

    #[test]
    fn test_malformed_css_tolerance() {
        for css in [".a { color: red }\n.b { color: blue", ".b { color: blue\n.a { color: red }"] {
            let doc = import_template("", css);
            assert_eq!(doc.styles.len(), 1, "{css}");
            assert_eq!(doc.styles[0].selector, ".a");
            assert_eq!(doc.issues.by_kind(IssueKind::MalformedStyle).count(), 1);
        }
    }

    #[test]
    fn test_void_safety() {
        let doc = Document::new(
            vec![
                Node::new("hr").with_text("x"),
                Node::new("img").attr("src", "a.png").child(Node::new("b").with_text("y")),
            ],
            vec![],
        );
        let markup = export_template(&doc).unwrap().markup;
        assert_eq!(markup, "<hr />\n<img src=\"a.png\" />");
        assert!(!markup.contains("</hr>") && !markup.contains("</img>"));
        assert_eq!(validate(&doc).by_kind(IssueKind::VoidWithContent).count(), 2);
    }

    #[test]
    fn test_field_binding_exclusivity() {
        let mut doc = import_template("<p>{{Back}}</p><p>Answer: {{Back}}</p>", "");
        doc.roots[0].text_content = "typed over".into();
        let markup = export_template(&doc).unwrap().markup;
        assert_eq!(markup, "<p>{{Back}}</p>\n<p>Answer: {{Back}}</p>");
        assert!(doc.roots[1].field_binding.is_none());
    }

    #[test]
    fn test_export_is_fixed_point() {
        let messy = Template::new(
            "\n  <div   class=\"front  card\" data-side=front>\n    {{Front}}\n    <hr id=answer>\n    <p  title='say \"hi\"'>  {{ Back }} </p>\n  </div>\n<!-- note -->\n",
            "/* theme */\n.card{color:red;font-size:12px}\n@media (max-width: 600px){.card{font-size:10px}}",
        );
        let converter = Converter::default();
        let once = round_trip(&converter, &messy);
        let twice = round_trip(&converter, &once);
        assert_eq!(once, twice);
        assert!(once.markup.contains("<hr id=\"answer\" />"));
        assert!(once.markup.contains("<p title='say \"hi\"'>{{Back}}</p>"));
    }

    #[test]
    fn test_document_round_trip() {
        let doc = Document::new(
            vec![
                Node::new("div")
                    .with_class("card")
                    .with_class("front")
                    .attr("data-type", "question")
                    .child(Node::field("h1", "Front"))
                    .child(Node::new("p").with_class("hint").with_text("Think first"))
                    .child(
                        Node::new("button")
                            .with_id("show")
                            .with_text("Show")
                            .behavior(Behavior::new("reveal", "activate").target("#back").param("delay", 250)),
                    ),
                Node::new("hr").with_id("answer"),
                Node::new("div").with_id("back").child(Node::field("", "Back")).child(Node::new("br")),
            ],
            vec![
                StyleRule::new(".card").declare("color", "red"),
                StyleRule::new(".hint, #back").declare("font-style", "italic"),
            ],
        );

        let template = export_template(&doc).unwrap();
        let back = import_template(&template.markup, &template.styles);

        assert_eq!(shape(&back.roots), shape(&doc.roots));
        assert_eq!(back.styles, doc.styles);
        assert!(back.issues.is_empty(), "{:?}", back.issues);
        // Derived data is recomputed identically
        assert_eq!(back.roots, doc.roots);
    }

    #[test]
    fn test_mixed_quotes_round_trip() {
        let doc = Document::new(
            vec![
                Node::new("p")
                    .attr("title", r#"it's "x""#)
                    .attr("data-raw", "&quot;literal&quot;")
                    .with_text("q"),
            ],
            vec![],
        );
        assert!(validate(&doc).is_empty());
        let template = export_template(&doc).unwrap();
        let back = import_template(&template.markup, &template.styles);
        assert_eq!(back.roots[0].attributes, doc.roots[0].attributes);
    }

    #[test]
    fn test_uppercase_tag_round_trip() {
        let doc = Document::new(vec![Node::new("DIV").child(Node::new("Span").with_text("x"))], vec![]);
        let template = export_template(&doc).unwrap();
        assert_eq!(template.markup, "<div><span>x</span></div>");
        let back = import_template(&template.markup, &template.styles);
        assert_eq!(back.roots, doc.roots);
    }

    #[test]
    fn test_reserved_attribute_cannot_shift_glue() {
        let reveal = Behavior::new("reveal", "activate");
        let doc = Document::new(
            vec![
                Node::new("div").attr("data-behaviors", "[]").attr("id", "dup"),
                Node::new("button").with_text("Show").behavior(reveal.clone()),
            ],
            vec![],
        );
        assert_eq!(validate(&doc).by_kind(IssueKind::ReservedAttribute).count(), 2);

        let template = export_template(&doc).unwrap();
        assert!(template.markup.starts_with("<div></div>\n<button data-behaviors="));
        assert_eq!(template.markup.matches("data-behaviors=").count(), 1);

        let back = import_template(&template.markup, &template.styles);
        assert!(back.roots[0].behaviors.is_empty());
        assert_eq!(back.roots[1].behaviors, vec![reveal]);
    }

    #[test]
    fn test_import_is_deterministic() {
        let a = import_template(CARD, ".card { color: red }");
        let b = import_template(CARD, ".card { color: red }");
        assert_eq!(a, b);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diagnostics and contract
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_import_never_fails() {
        let doc = import_template(
            "<div><span data-behaviors='[oops'>{{Front}}</b></div><p>unclosed",
            ".x { color: red; .y { }",
        );
        assert!(!doc.roots.is_empty());
        assert!(doc.issues.by_kind(IssueKind::UnbalancedMarkup).count() >= 2);
        assert_eq!(doc.issues.by_kind(IssueKind::MalformedBehavior).count(), 1);
        assert!(!doc.issues.has_errors());
    }

    #[test]
    fn test_import_attaches_validation() {
        let doc = import_template("<img src=a.png><p>{{#Extra}}</p>", "");
        assert_eq!(doc.issues.by_kind(IssueKind::UnbalancedSection).count(), 1);
    }

    #[test]
    fn test_export_rejects_empty_tag_with_children() {
        let doc = Document::new(vec![Node::text("").child(Node::new("b"))], vec![]);
        assert!(validate(&doc).has_errors());
        let err = export_template(&doc).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyTag { what: "children", .. }));
    }

    #[test]
    fn test_type_label_is_opaque_attribute() {
        let doc = import_template(r#"<div data-block="flip-card" class="x">{{Front}}</div>"#, "");
        assert_eq!(doc.roots[0].get_attr("data-block"), Some("flip-card"));
        assert_eq!(
            export_template(&doc).unwrap().markup,
            r#"<div class="x" data-block="flip-card">{{Front}}</div>"#
        );
    }

    #[test]
    fn test_export_sanitized_and_all() {
        let converter = Converter::new(ConverterConfig::TREE);
        let docs = vec![import_template(CARD, ""), import_template("<p>x</p>", "")];
        let all: Vec<Template> = converter
            .export_all(&docs)
            .into_iter()
            .collect::<ConvertResult<_>>()
            .unwrap();
        assert_eq!(all[0].markup, CARD);
        assert_eq!(all[1].markup, "<p>x</p>");
        assert_eq!(converter.export_sanitized(&docs[0], &NoopSanitizer).unwrap(), all[0]);
    }
}
