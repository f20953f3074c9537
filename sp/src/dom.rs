//! Owned, mutable HTML tree
//!
//! `scraper` parses HTML the way a browser does but its tree is read-only.
//! Slides need renaming, attribute edits and script rewrites, so the parsed
//! document is copied into this small owned tree and serialised back.

use scraper::{ElementRef, Html};
use tracing::debug;

/// Elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source", "track",
    "wbr",
];

/// Elements whose text content is written verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Name and classes of an element above the one being visited
#[derive(Debug, Clone)]
pub struct Ancestor {
    pub name: String,
    pub classes: Vec<String>,
}

impl Ancestor {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Parse a full document and return its `<html>` element
///
/// Missing `<head>`/`<body>` are created by the parser.
pub fn parse_document(html: &str) -> Element {
    let document = Html::parse_document(html);
    let root = convert(document.root_element());
    debug!(children = root.children.len(), "parse_document: done");
    root
}

fn convert(element: ElementRef<'_>) -> Element {
    let value = element.value();
    let mut out = Element {
        name: value.name().to_string(),
        attrs: value.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        children: Vec::new(),
    };

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            out.children.push(Node::Element(convert(child_element)));
        } else if let Some(text) = child.value().as_text() {
            out.children.push(Node::Text(String::from(&**text)));
        } else if let Some(comment) = child.value().as_comment() {
            out.children.push(Node::Comment(String::from(&**comment)));
        }
    }
    out
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class").is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    /// Append a class unless already present
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with one text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// The only child, when it is a text node
    pub fn sole_text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Node::Text(t)] => Some(t),
            _ => None,
        }
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First descendant (or self) in document order matching `pred`
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|n| match n {
            Node::Element(e) => e.find(pred),
            _ => None,
        })
    }

    /// Visit self and every descendant element, pre-order
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Element),
    {
        f(self);
        for child in &self.children {
            if let Node::Element(e) = child {
                e.walk(f);
            }
        }
    }

    /// Visit self and every descendant element, pre-order, with its ancestors
    pub fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element, &[Ancestor]),
    {
        let mut stack = Vec::new();
        visit(self, &mut stack, f);
    }

    /// Serialise this element and its subtree
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    /// Serialise the children only
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, self.is_raw_text(), &mut out);
        }
        out
    }

    fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.name.as_str())
    }
}

fn visit<F>(element: &mut Element, stack: &mut Vec<Ancestor>, f: &mut F)
where
    F: FnMut(&mut Element, &[Ancestor]),
{
    f(element, stack);
    stack.push(Ancestor {
        name: element.name.clone(),
        classes: element.classes(),
    });
    for child in element.child_elements_mut() {
        visit(child, stack, f);
    }
    stack.pop();
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            Node::Comment(_) => {}
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.name.as_str()) {
        return;
    }

    // The parser drops one leading newline in these, so write it back
    if matches!(element.name.as_str(), "pre" | "textarea" | "listing")
        && matches!(element.children.first(), Some(Node::Text(t)) if t.starts_with('\n'))
    {
        out.push('\n');
    }

    for child in &element.children {
        write_node(child, element.is_raw_text(), out);
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_node(node: &Node, raw: bool, out: &mut String) {
    match node {
        Node::Element(e) => write_element(e, out),
        Node::Text(t) if raw => out.push_str(t),
        Node::Text(t) => escape_into(t, false, out),
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
    }
}

fn escape_into(text: &str, attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr => out.push_str("&quot;"),
            '<' if !attr => out.push_str("&lt;"),
            '>' if !attr => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
