//! HTML parser – turns a prepared document into a small DOM tree.
//!
//! Only the subset produced by the document builders and typical report
//! fragments is understood:
//! - Structural: div, p, h1-h3, ul, ol, li, table, tr, td, th, img, br
//! - Inline: span, b, strong
//! - Styling via `<style>` blocks, `class` and `style` attributes

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    B,
    Strong,
    Br,
    Img,
    Style,
    Body,
    Html,
    Head,
    /// Anything else; laid out like a div.
    Unknown(String),
}

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "img", "meta", "link", "hr", "input", "wbr"];

impl Tag {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "br" => Tag::Br,
            "img" => Tag::Img,
            "style" => Tag::Style,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Lower-case tag name, as matched by CSS type selectors.
    pub fn name(&self) -> &str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::B => "b",
            Tag::Strong => "strong",
            Tag::Br => "br",
            Tag::Img => "img",
            Tag::Style => "style",
            Tag::Body => "body",
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Unknown(name) => name,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::B | Tag::Strong | Tag::Br)
    }

    /// Elements that produce no boxes.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Tag::Style | Tag::Head)
            || matches!(self, Tag::Unknown(n) if n == "meta" || n == "link" || n == "title")
    }

    pub fn is_table_part(&self) -> bool {
        matches!(self, Tag::Table | Tag::Tr | Tag::Td | Tag::Th)
    }
}

/// A node in the DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    /// The `dir` attribute, lower-cased.
    pub fn dir(&self) -> Option<String> {
        self.attributes.get("dir").map(|d| d.trim().to_ascii_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_blank_between_tags();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let end = self.rest().find('<').map_or(self.input.len(), |i| self.pos + i);
        let text = &self.input[self.pos..end];
        self.pos = end;
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let tag_name = self.parse_name();
        let tag = Tag::parse(&tag_name);
        let mut elem = ElementNode::new(tag.clone());

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character that cannot start an attribute.
                self.advance_char();
                continue;
            }
            elem.attributes.insert(key.to_ascii_lowercase(), value);
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if VOID_ELEMENTS.contains(&tag_name.to_ascii_lowercase().as_str()) {
            return DomNode::Element(elem);
        }

        if tag == Tag::Style {
            // Raw text up to the closing tag.
            let end = find_ci(self.rest(), "</style").map_or(self.input.len(), |i| self.pos + i);
            elem.children.push(DomNode::Text(self.input[self.pos..end].to_string()));
            self.pos = end;
        } else {
            elem.children = self.parse_nodes();
        }

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }

        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let end = self.rest().find(quote).map_or(self.input.len(), |i| self.pos + i);
                let val = decode_entities(&self.input[self.pos..end]);
                self.pos = (end + 1).min(self.input.len());
                val
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.advance_char();
                }
                self.input[start..self.pos].to_string()
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    /// Skip whitespace only when it sits between two tags.
    fn skip_blank_between_tags(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, marker: &str) {
        self.pos = self
            .rest()
            .find(marker)
            .map_or(self.input.len(), |i| self.pos + i + marker.len());
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}

/// Concatenated contents of every `<style>` element, in document order.
pub fn stylesheet_text(nodes: &[DomNode]) -> String {
    let mut css = String::new();
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Style {
                for child in &e.children {
                    if let DomNode::Text(t) = child {
                        css.push_str(t);
                        css.push('\n');
                    }
                }
            } else {
                css.push_str(&stylesheet_text(&e.children));
            }
        }
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &ElementNode {
        match node {
            DomNode::Element(e) => e,
            DomNode::Text(t) => panic!("expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parse_classed_div() {
        let nodes = parse_html(r#"<div class="arabic-title extra"><p>مرحبا</p></div>"#);
        assert_eq!(nodes.len(), 1);
        let e = element(&nodes[0]);
        assert_eq!(e.tag, Tag::Div);
        assert_eq!(e.classes(), vec!["arabic-title", "extra"]);
        assert_eq!(e.children.len(), 1);
    }

    #[test]
    fn br_is_void_in_both_spellings() {
        let nodes = parse_html("<p>سطر<br />سطر<br>سطر</p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 5);
        assert_eq!(element(&p.children[1]).tag, Tag::Br);
        assert_eq!(element(&p.children[3]).tag, Tag::Br);
    }

    #[test]
    fn style_content_is_raw_text() {
        let html = "<style>\n.quran-text { font-size: 16px; }\n</style>\n<div class=\"quran-text\">نص</div>";
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[0]).tag, Tag::Style);
        assert!(stylesheet_text(&nodes).contains(".quran-text { font-size: 16px; }"));
    }

    #[test]
    fn escaped_text_is_decoded_once() {
        let nodes = parse_html("<p>&lt;b&gt; &amp;amp; &#039;x&#039;</p>");
        let p = element(&nodes[0]);
        match &p.children[0] {
            DomNode::Text(t) => assert_eq!(t, "<b> &amp; 'x'"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn parse_table() {
        let html = "<table><tr><th>الاسم</th><th>العمر</th></tr><tr><td>علي</td><td>30</td></tr></table>";
        let nodes = parse_html(html);
        let table = element(&nodes[0]);
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.children.len(), 2);
    }

    #[test]
    fn body_is_unwrapped() {
        let html = "<html dir=\"rtl\"><head><meta charset=\"utf-8\"></head><body><p>نص</p></body></html>";
        let nodes = parse_html(html);
        let body = body_children(&nodes);
        assert_eq!(body.len(), 1);
        assert_eq!(element(&nodes[0]).dir().as_deref(), Some("rtl"));
    }
}
