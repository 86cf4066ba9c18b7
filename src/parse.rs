//! Markup parser
//!
//! Turns template markup into a forest of [`Node`]s with a depth-first
//! stack machine. The input is often hand-edited, so nothing here fails:
//! stray closing tags are ignored, unclosed elements are closed at the end,
//! and every repair is reported as an [`Issue`].
//!
//! # Flow
//!
//! ```text
//! markup ──Tokenizer──▶ Start / End / Text tokens
//!                            │
//!                            ▼ TreeBuilder (stack of open frames)
//!                       Vec<Node>  (ids still detached)
//! ```

use crate::attr::{Attrs, AttrsExt, ClassList};
use crate::behavior;
use crate::config::ConverterConfig;
use crate::field::extract_field;
use crate::id::NodeId;
use crate::issue::{Issue, IssueKind};
use crate::node::{Node, is_raw_text_tag, is_void_tag};
use crate::render::QUOT_ENTITY;

/// Parse markup with the default configuration.
pub fn parse(markup: &str) -> Vec<Node> {
    parse_with(markup, &ConverterConfig::default()).0
}

/// Parse markup, returning the forest and the repairs that were made.
pub fn parse_with(markup: &str, config: &ConverterConfig) -> (Vec<Node>, Vec<Issue>) {
    let mut tokenizer = Tokenizer::new(markup);
    let mut builder = TreeBuilder::new(config);

    while let Some(token) = tokenizer.next_token() {
        log::trace!(target: "card_template::parse", "token: {token:?}");
        match token {
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let raw = if is_raw_text_tag(&name) && !self_closing {
                    let (content, terminated) = tokenizer.raw_text(&name);
                    if !terminated {
                        builder.issue(
                            Issue::new(IssueKind::UnbalancedMarkup, format!("<{name}> is never closed"))
                                .with_hint(content),
                        );
                    }
                    Some(content)
                } else {
                    None
                };
                builder.start(&name, attrs, self_closing, raw);
            }
            Token::End { name } => builder.end(&name),
            Token::Text(text) => builder.text(text),
            Token::Skipped => {}
            Token::Unterminated(what, rest) => builder.issue(
                Issue::new(IssueKind::UnbalancedMarkup, format!("unterminated {what}; rest of input dropped"))
                    .with_hint(rest),
            ),
        }
    }
    builder.finish()
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug)]
enum Token<'a> {
    Start {
        name: String,
        attrs: Attrs,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(&'a str),
    /// Comment, doctype or processing instruction
    Skipped,
    Unterminated(&'static str, &'a str),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        let rest = &src[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if !rest.starts_with('<') {
            return Some(self.text());
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            return Some(match body.find("-->") {
                Some(end) => {
                    self.pos += 4 + end + 3;
                    Token::Skipped
                }
                None => self.unterminated("comment"),
            });
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            return Some(match rest.find('>') {
                Some(end) => {
                    self.pos += end + 1;
                    Token::Skipped
                }
                None => self.unterminated("declaration"),
            });
        }
        if let Some(body) = rest.strip_prefix("</") {
            if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
                return Some(self.text());
            }
            return Some(match body.find('>') {
                Some(end) => {
                    let name = tag_name(body);
                    self.pos += 2 + end + 1;
                    Token::End { name }
                }
                None => self.unterminated("closing tag"),
            });
        }
        if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Some(self.text());
        }

        let body = &rest[1..];
        let name = tag_name(body);
        let after_name = &body[name.len()..];
        let Some(end) = find_tag_end(after_name) else {
            return Some(self.unterminated("tag"));
        };
        let mut inner = after_name[..end].trim_end();
        let self_closing = inner.ends_with('/');
        if self_closing {
            inner = &inner[..inner.len() - 1];
        }
        self.pos += 1 + name.len() + end + 1;
        Some(Token::Start {
            name,
            attrs: parse_attributes(inner),
            self_closing,
        })
    }

    /// Literal text up to the next `<` (a leading `<` is part of the text).
    fn text(&mut self) -> Token<'a> {
        let src = self.src;
        let rest = &src[self.pos..];
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let len = rest[first..].find('<').map_or(rest.len(), |i| i + first);
        self.pos += len;
        Token::Text(&rest[..len])
    }

    fn unterminated(&mut self, what: &'static str) -> Token<'a> {
        let rest = &self.src[self.pos..];
        self.pos = self.src.len();
        Token::Unterminated(what, rest)
    }

    /// Verbatim content of a raw-text element up to its closing tag.
    ///
    /// Returns the content and whether the closing tag was found.
    fn raw_text(&mut self, tag: &str) -> (&'a str, bool) {
        let src = self.src;
        let rest = &src[self.pos..];
        let needle = format!("</{}", tag.to_ascii_lowercase());
        // ASCII lowercasing keeps byte offsets intact
        match rest.to_ascii_lowercase().find(&needle) {
            Some(start) => {
                let close_end = rest[start..].find('>').map_or(rest.len(), |i| start + i + 1);
                self.pos += close_end;
                (&rest[..start], true)
            }
            None => {
                self.pos = src.len();
                (rest, false)
            }
        }
    }
}

/// Leading tag name of `body`, lowercased
fn tag_name(body: &str) -> String {
    let len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
        .unwrap_or(body.len());
    body[..len].to_ascii_lowercase()
}

/// Offset of the `>` closing a start tag, skipping quoted attribute values
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Parse HTML-style attributes from the inside of a start tag
///
/// Input: `class="card" data-x='1' width=3 hidden`
/// Output: `[("class", "card"), ("data-x", "1"), ("width", "3"), ("hidden", "")]`
///
/// Names are lowercased; on duplicates the first occurrence wins.
fn parse_attributes(s: &str) -> Attrs {
    let mut attrs = Attrs::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '/' {
            continue;
        }

        let mut name = String::new();
        name.push(c);
        while let Some(&next) = chars.peek() {
            if next == '=' || next.is_whitespace() {
                break;
            }
            name.push(next);
            chars.next();
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let value = if chars.peek() == Some(&'=') {
            chars.next();
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut val = String::new();
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        val.push(c);
                    }
                    // Export writes `"` as `&quot;` only inside double quotes
                    if quote == '"' && val.contains(QUOT_ENTITY) {
                        val = val.replace(QUOT_ENTITY, "\"");
                    }
                    val
                }
                _ => {
                    let mut val = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        val.push(c);
                        chars.next();
                    }
                    val
                }
            }
        } else {
            // Boolean attribute
            String::new()
        };

        let name = name.to_ascii_lowercase();
        if !attrs.has_attr(&name) {
            attrs.push((name, value));
        }
    }

    attrs
}

// =============================================================================
// TreeBuilder
// =============================================================================

/// An element whose closing tag has not been seen yet
struct Frame {
    node: Node,
    /// Text seen since the last child, not yet classified
    pending: String,
    /// Derived output (behavior glue) that must not enter the tree
    discard: bool,
}

struct TreeBuilder<'c> {
    config: &'c ConverterConfig,
    stack: Vec<Frame>,
    roots: Vec<Node>,
    root_pending: String,
    issues: Vec<Issue>,
}

impl<'c> TreeBuilder<'c> {
    fn new(config: &'c ConverterConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            roots: Vec::new(),
            root_pending: String::new(),
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(frame) => frame.pending.push_str(text),
            None => self.root_pending.push_str(text),
        }
    }

    /// Turn text seen before a new child into a text-run sibling.
    fn flush_pending(&mut self) {
        match self.stack.last_mut() {
            Some(frame) => {
                let pending = std::mem::take(&mut frame.pending);
                if let Some(run) = text_run(&pending) {
                    frame.node.children.push(run);
                }
            }
            None => {
                let pending = std::mem::take(&mut self.root_pending);
                if let Some(run) = text_run(&pending) {
                    self.roots.push(run);
                }
            }
        }
    }

    fn start(&mut self, name: &str, attrs: Attrs, self_closing: bool, raw: Option<&str>) {
        self.flush_pending();

        let mut node = Node::new(name);
        let mut discard = false;
        for (key, value) in attrs {
            if key == "class" {
                node.class_names = ClassList::parse(&value);
            } else if key == "id" {
                if !value.trim().is_empty() {
                    node.id = NodeId::Explicit(value);
                }
            } else if key == self.config.behavior_attr() {
                match behavior::try_decode(&value) {
                    Ok(behaviors) => node.behaviors = behaviors,
                    Err(err) => self.issues.push(
                        Issue::new(IssueKind::MalformedBehavior, format!("<{name}> behaviors dropped: {err}"))
                            .with_hint(&value),
                    ),
                }
            } else if key == self.config.glue_attr() {
                discard = true;
            } else {
                node.attributes.push((key, value));
            }
        }

        if let Some(content) = raw {
            node.text_content = content.trim().to_string();
            self.attach(node, discard);
        } else if self_closing || is_void_tag(name) {
            self.attach(node, discard);
        } else {
            self.stack.push(Frame {
                node,
                pending: String::new(),
                discard,
            });
        }
    }

    fn end(&mut self, name: &str) {
        let Some(index) = self.stack.iter().rposition(|f| f.node.tag == name) else {
            self.issues.push(
                Issue::new(IssueKind::UnbalancedMarkup, format!("unexpected closing tag </{name}> ignored"))
                    .with_hint(format!("</{name}>")),
            );
            return;
        };
        while self.stack.len() > index + 1 {
            if let Some(frame) = self.stack.pop() {
                let issue = unclosed(&frame, format!("implicitly closed by </{name}>"));
                self.issues.push(issue);
                self.close(frame);
            }
        }
        if let Some(frame) = self.stack.pop() {
            self.close(frame);
        }
    }

    fn close(&mut self, mut frame: Frame) {
        if frame.node.children.is_empty() {
            apply_text(&mut frame.node, &frame.pending);
        } else if let Some(run) = text_run(&frame.pending) {
            frame.node.children.push(run);
        }
        self.attach(frame.node, frame.discard);
    }

    fn attach(&mut self, node: Node, discard: bool) {
        if discard || self.stack.last().is_some_and(|f| f.discard) {
            log::trace!(target: "card_template::parse", "dropping derived <{}>", node.tag);
            return;
        }
        match self.stack.last_mut() {
            Some(parent) => parent.node.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finish(mut self) -> (Vec<Node>, Vec<Issue>) {
        while let Some(frame) = self.stack.pop() {
            let issue = unclosed(&frame, "closed at end of input".to_string());
            self.issues.push(issue);
            self.close(frame);
        }
        self.flush_pending();
        (self.roots, self.issues)
    }
}

/// Repair report for an element whose closing tag was missing.
///
/// Synthetic ids are not assigned yet, so only an explicit id is attached.
fn unclosed(frame: &Frame, what: String) -> Issue {
    let tag = &frame.node.tag;
    let issue = Issue::new(IssueKind::UnbalancedMarkup, format!("<{tag}> {what}")).with_hint(format!("<{tag}>"));
    match frame.node.id.explicit() {
        Some(_) => issue.with_node(frame.node.id.clone()),
        None => issue,
    }
}

/// Classify text as a node's own content.
fn apply_text(node: &mut Node, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match extract_field(text) {
        (Some(name), _) => node.bind_field(name),
        (None, literal) => node.text_content = literal.to_string(),
    }
}

/// Text between element siblings as a bare text run.
fn text_run(text: &str) -> Option<Node> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut run = Node::text("");
    apply_text(&mut run, text);
    Some(run)
}

// =============================================================================
// Tests
// =============================================================================
