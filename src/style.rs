//! Style table codec
//!
//! Converts stylesheet text to an ordered list of [`StyleRule`]s and back.
//! Values stay opaque strings. Decoding is lenient: broken rules are skipped
//! with an [`Issue`] and never abort the rest of the sheet.
//!
//! Encoding has exactly one layout, so exported sheets diff cleanly:
//!
//! ```text
//! .card {
//!   color: red;
//!   font-size: 12px;
//! }
//!
//! .front {
//!   ...
//! }
//! ```

use crate::attr::{Attrs, AttrsExt};
use crate::issue::{Issue, IssueKind};

/// Ordered property → value map, property names in kebab-case
pub type Declarations = Attrs;

/// At-rules whose block holds rules rather than declarations
const NESTING_AT_RULES: &[&str] = &[
    "@media",
    "@supports",
    "@container",
    "@layer",
    "@document",
    "@keyframes",
    "@-webkit-keyframes",
    "@-moz-keyframes",
];

const INDENT: &str = "  ";

// =============================================================================
// StyleRule
// =============================================================================

/// One selector group with its declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRule {
    /// Canonical selector text (`.a, .b` / `.a.b` / `@media print`)
    pub selector: String,
    pub declarations: Declarations,
    /// Rules inside a nesting at-rule such as `@media`
    pub nested: Vec<StyleRule>,
}

impl StyleRule {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: canonical_selector(selector),
            declarations: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Builder: add a declaration (property given in kebab-case)
    pub fn declare(mut self, property: &str, value: impl Into<String>) -> Self {
        self.declarations.set_attr(property.trim(), value);
        self
    }

    /// Builder: add a rule inside this at-rule
    pub fn nest(mut self, rule: StyleRule) -> Self {
        self.nested.push(rule);
        self
    }

    /// Build from tree-side declarations whose names are camelCase.
    pub fn from_camel<K, V>(selector: &str, declarations: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut rule = Self::new(selector);
        for (name, value) in declarations {
            rule.declarations.set_attr(to_kebab_case(name.as_ref()), value);
        }
        rule
    }

    /// Declarations with camelCase names, for the tree/UI side.
    pub fn camel_declarations(&self) -> Vec<(String, String)> {
        self.declarations
            .iter()
            .map(|(name, value)| (to_camel_case(name), value.clone()))
            .collect()
    }

    pub fn is_at_rule(&self) -> bool {
        self.selector.starts_with('@')
    }

    /// This rule and all nested rules, depth-first
    pub fn walk(&self) -> Vec<&StyleRule> {
        let mut out = vec![self];
        for rule in &self.nested {
            out.extend(rule.walk());
        }
        out
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode stylesheet text.
///
/// Returns the well-formed rules in source order plus one warning per
/// skipped fragment.
pub fn decode(css: &str) -> (Vec<StyleRule>, Vec<Issue>) {
    let mut issues = Vec::new();
    let source = strip_comments(css, &mut issues);
    let mut scanner = Scanner {
        src: &source,
        pos: 0,
        issues,
    };
    let rules = scanner.parse_block(0);
    (rules, scanner.issues)
}

/// Decode a bare declaration list such as an inline `style` attribute.
pub fn decode_declarations(text: &str) -> Declarations {
    let mut issues = Vec::new();
    let decls = parse_declarations(text, &mut issues);
    for issue in issues {
        log::debug!(target: "card_template::style", "{issue}");
    }
    decls
}

fn strip_comments(css: &str, issues: &mut Vec<Issue>) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                issues.push(
                    Issue::new(IssueKind::MalformedStyle, "unterminated comment; rest of sheet dropped")
                        .with_hint(&rest[start..]),
                );
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    issues: Vec<Issue>,
}

impl<'a> Scanner<'a> {
    fn warn(&mut self, message: String, hint: &str) {
        log::debug!(target: "card_template::style", "{message}");
        self.issues
            .push(Issue::new(IssueKind::MalformedStyle, message).with_hint(hint));
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    /// Advance to the first of `stops` outside quotes and return it.
    /// On end of input the position is left at the end.
    fn scan_until(&mut self, stops: &[char]) -> Option<char> {
        let src = self.src;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (offset, c) in src[self.pos..].char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            if c == '"' || c == '\'' {
                quote = Some(c);
            } else if stops.contains(&c) {
                self.pos += offset;
                return Some(c);
            }
        }
        self.pos = src.len();
        None
    }

    /// Skip the rest of a block whose `{` was already consumed.
    fn skip_block(&mut self) {
        let mut depth = 1usize;
        while let Some(c) = self.scan_until(&['{', '}']) {
            self.pos += 1;
            if c == '{' {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn parse_block(&mut self, depth: usize) -> Vec<StyleRule> {
        let src = self.src;
        let mut rules = Vec::new();
        loop {
            self.skip_ws();
            let Some(next) = src[self.pos..].chars().next() else {
                if depth > 0 {
                    self.warn("at-rule block is missing a closing brace".to_string(), "");
                }
                return rules;
            };
            if next == '}' {
                self.pos += 1;
                if depth > 0 {
                    return rules;
                }
                self.warn("stray closing brace".to_string(), "}");
                continue;
            }

            let start = self.pos;
            match self.scan_until(&['{', ';', '}']) {
                Some('{') => {
                    let prelude = src[start..self.pos].trim().to_string();
                    self.pos += 1;
                    if is_nesting_at_rule(&prelude) {
                        let nested = self.parse_block(depth + 1);
                        let mut rule = StyleRule::new(&prelude);
                        rule.nested = nested;
                        rules.push(rule);
                    } else {
                        self.parse_rule_body(prelude, &mut rules);
                    }
                }
                Some(';') => {
                    let statement = src[start..self.pos].trim().to_string();
                    self.pos += 1;
                    self.warn(format!("statement `{statement}` skipped"), &statement);
                }
                Some(_) => {
                    let text = src[start..self.pos].trim();
                    self.warn("text without a declaration block skipped".to_string(), text);
                }
                None => {
                    let text = src[start..].trim();
                    self.warn("trailing text without a declaration block".to_string(), text);
                }
            }
        }
    }

    /// Read declarations up to `}`; the opening `{` is already consumed.
    fn parse_rule_body(&mut self, prelude: String, rules: &mut Vec<StyleRule>) {
        let src = self.src;
        let mut selector = prelude;
        loop {
            let body_start = self.pos;
            match self.scan_until(&['{', '}']) {
                Some('}') => {
                    let body = &src[body_start..self.pos];
                    self.pos += 1;
                    if selector.is_empty() {
                        self.warn("rule with empty selector skipped".to_string(), body);
                        return;
                    }
                    let mut rule = StyleRule::new(&selector);
                    rule.declarations = parse_declarations(body, &mut self.issues);
                    rules.push(rule);
                    return;
                }
                Some(_) => {
                    // A second `{` before `}`: the rule never closed.
                    let body = &src[body_start..self.pos];
                    let resync = resync_selector(body);
                    self.pos += 1;
                    self.warn(
                        format!("rule `{selector}` is missing a closing brace"),
                        &selector,
                    );
                    match resync {
                        Some(next) => selector = next,
                        None => {
                            self.skip_block();
                            return;
                        }
                    }
                }
                None => {
                    self.warn(
                        format!("rule `{selector}` is missing a closing brace"),
                        &selector,
                    );
                    return;
                }
            }
        }
    }
}

fn is_nesting_at_rule(prelude: &str) -> bool {
    let keyword = prelude
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    NESTING_AT_RULES
        .iter()
        .any(|at| at.eq_ignore_ascii_case(keyword))
}

/// Selector that starts the rule hiding at the end of an unclosed body.
///
/// `color: blue .front` → `.front`
fn resync_selector(body: &str) -> Option<String> {
    let tail = body.rsplit(';').next().unwrap_or(body);
    let tokens: Vec<&str> = tail.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|t| t.starts_with(['.', '#', '*', '[']))?;
    Some(tokens[start..].join(" "))
}

/// Split on `sep` outside quotes and parentheses.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if c == sep && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_declarations(body: &str, issues: &mut Vec<Issue>) -> Declarations {
    let mut decls = Declarations::new();
    for raw in split_top_level(body, ';') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Some((name, value)) = raw.split_once(':') else {
            issues.push(Issue::new(IssueKind::MalformedStyle, "declaration without `:` skipped").with_hint(raw));
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            issues.push(Issue::new(IssueKind::MalformedStyle, "incomplete declaration skipped").with_hint(raw));
            continue;
        }
        decls.set_attr(name, value);
    }
    decls
}

/// Comma groups trimmed and joined with `", "`; inner whitespace collapsed.
pub fn canonical_selector(selector: &str) -> String {
    split_top_level(selector, ',')
        .into_iter()
        .map(|group| group.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|group| !group.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode rules in the given order, blank-line separated.
pub fn encode(rules: &[StyleRule]) -> String {
    let mut out = String::new();
    write_rules(rules, 0, &mut out);
    out
}

fn write_rules(rules: &[StyleRule], depth: usize, out: &mut String) {
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_rule(rule, depth, out);
    }
}

fn write_rule(rule: &StyleRule, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push_str(&rule.selector);
    out.push_str(" {\n");
    for (name, value) in &rule.declarations {
        out.push_str(&indent);
        out.push_str(INDENT);
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    write_rules(&rule.nested, depth + 1, out);
    out.push_str(&indent);
    out.push_str("}\n");
}

// =============================================================================
// Selector subjects
// =============================================================================

/// Right-most compound of one comma group, reduced to what a node carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub ids: Vec<String>,
}

impl Subject {
    /// Does a node with this tag, class test and explicit id match?
    pub fn matches(&self, tag: &str, has_class: impl Fn(&str) -> bool, id: Option<&str>) -> bool {
        if let Some(t) = &self.tag {
            if !t.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.classes.iter().all(|c| has_class(c)) && self.ids.iter().all(|i| Some(i.as_str()) == id)
    }
}

/// Subjects of a selector that name at least one class or id.
///
/// Groups whose subject uses attribute selectors, or only a tag, have no
/// class/id key and are left out.
pub fn selector_subjects(selector: &str) -> Vec<Subject> {
    if selector.starts_with('@') {
        return Vec::new();
    }
    split_top_level(selector, ',')
        .into_iter()
        .filter_map(|group| {
            let compound = group
                .split(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
                .filter(|part| !part.is_empty())
                .last()?;
            parse_compound(compound)
        })
        .collect()
}

fn parse_compound(compound: &str) -> Option<Subject> {
    if compound.contains('[') {
        return None;
    }
    // Pseudo-classes and pseudo-elements do not change which node is styled
    let compound = compound.split(':').next().unwrap_or_default();
    let mut subject = Subject::default();
    let mut rest = compound;
    let head_len = rest.find(['.', '#']).unwrap_or(rest.len());
    let head = &rest[..head_len];
    if !head.is_empty() && head != "*" {
        subject.tag = Some(head.to_string());
    }
    rest = &rest[head_len..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let len = body.find(['.', '#']).unwrap_or(body.len());
        let name = &body[..len];
        if !name.is_empty() {
            if marker == '.' {
                subject.classes.push(name.to_string());
            } else {
                subject.ids.push(name.to_string());
            }
        }
        rest = &body[len..];
    }
    if subject.classes.is_empty() && subject.ids.is_empty() {
        return None;
    }
    Some(subject)
}

// =============================================================================
// Case conversion
// =============================================================================

/// `font-size` → `fontSize`, `-webkit-transition` → `WebkitTransition`.
///
/// Custom properties (`--x`) are returned unchanged.
pub fn to_camel_case(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let (vendor, body) = match name.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, name),
    };
    let mut out = String::with_capacity(body.len());
    for (i, segment) in body.split('-').filter(|s| !s.is_empty()).enumerate() {
        let capitalize = if i == 0 { vendor && segment != "ms" } else { true };
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if capitalize {
                out.extend(first.to_uppercase());
            } else {
                out.push(first);
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `fontSize` → `font-size`, `WebkitTransition` → `-webkit-transition`,
/// `msFlex` → `-ms-flex`. Kebab-case input passes through unchanged.
pub fn to_kebab_case(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    let vendor = name.starts_with(|c: char| c.is_ascii_uppercase())
        || (name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()));
    if vendor {
        out.push('-');
    }
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
