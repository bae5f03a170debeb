//! In-memory HTML document trees.
//!
//! Every other pipeline stage operates on the tree defined here: the metadata
//! extractor walks it, the template composer mutates it in place, and the
//! output writer serializes it back to markup.
//!
//! ## Parsing Model
//!
//! Posts are hand-authored HTML, so the parser is deliberately forgiving.
//! It folds a quick-xml event stream (well-formedness checks disabled, HTML
//! attribute syntax allowed) into a node tree with these recovery rules:
//!
//! - HTML void elements (`<meta>`, `<link>`, `<img>`, ...) are leaves whether
//!   or not they use self-closing syntax.
//! - An end tag with no matching open element is dropped; elements left open
//!   when an ancestor closes are closed implicitly.
//! - Recovery events are recorded in [`Document::errors`] — the parse itself
//!   never aborts on structural problems.
//!
//! ## Serialization
//!
//! [`serialize`] re-emits the doctype, escapes text and attribute values, and
//! writes void elements in self-closing form. A freshly parsed, unmutated
//! document round-trips to semantically equivalent markup: the element tag
//! sequence is preserved exactly, whitespace may differ.
//!
//! ## Mutation Surface
//!
//! Trees are mutated through an explicit traversal
//! ([`Document::visit_elements_mut`], document order) and targeted lookups
//! ([`Document::find_element_mut`]) — no implicit shared walk state.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialized markup is not valid UTF-8")]
    NonUtf8Output,
}

/// Element tags that never carry children in HTML.
///
/// Hand-authored posts write these without self-closing syntax
/// (`<meta name=...>`), so the parser must not wait for an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// A single node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element: tag name, attributes in document order, ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// First value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// A parsed document: the single root of the tree.
///
/// `errors` holds best-effort recovery notes from parsing malformed markup.
/// They are informational — a document with recorded errors is still usable.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub doctype: Option<String>,
    pub children: Vec<Node>,
    pub errors: Vec<String>,
}

impl Document {
    /// First element with the given tag, in document order.
    pub fn find_element(&self, tag: &str) -> Option<&Element> {
        find_in_nodes(&self.children, tag)
    }

    /// Mutable variant of [`find_element`](Self::find_element).
    pub fn find_element_mut(&mut self, tag: &str) -> Option<&mut Element> {
        find_in_nodes_mut(&mut self.children, tag)
    }

    /// Visit every element in document order, mutably.
    pub fn visit_elements_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        visit_nodes_mut(&mut self.children, f);
    }

    /// Visit every element in document order, read-only.
    pub fn visit_elements(&self, f: &mut impl FnMut(&Element)) {
        visit_nodes(&self.children, f);
    }

    /// Element tag names in document order. Used to compare structural
    /// equivalence of two parses of the same markup.
    pub fn tag_sequence(&self) -> Vec<String> {
        let mut tags = Vec::new();
        self.visit_elements(&mut |el| tags.push(el.tag.clone()));
        tags
    }
}

fn find_in_nodes<'a>(nodes: &'a [Node], tag: &str) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.tag == tag {
                return Some(el);
            }
            if let Some(found) = find_in_nodes(&el.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_nodes_mut<'a>(nodes: &'a mut [Node], tag: &str) -> Option<&'a mut Element> {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            if el.tag == tag {
                return Some(el);
            }
            if let Some(found) = find_in_nodes_mut(&mut el.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

fn visit_nodes_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut Element)) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            f(el);
            visit_nodes_mut(&mut el.children, f);
        }
    }
}

fn visit_nodes(nodes: &[Node], f: &mut impl FnMut(&Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit_nodes(&el.children, f);
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a full HTML document (doctype expected but not required).
pub fn parse(content: &str) -> Document {
    parse_nodes(content)
}

/// Parse a standalone fragment (template chrome like `header.html`).
///
/// Identical recovery rules to [`parse`]; fragments simply have no doctype
/// and no enclosing `<html>` wrapper.
pub fn parse_fragment(content: &str) -> Document {
    parse_nodes(content)
}

fn parse_nodes(content: &str) -> Document {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    // Not covered by `enable_all_checks(false)`: without it quick-xml errors
    // on orphan end tags before `close_element` can record and drop them.
    reader.config_mut().allow_unmatched_ends = true;

    let mut doc = Document::default();
    // Open elements awaiting their end tag. The document itself is the
    // implicit bottom of the stack.
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let elem = element_from_start(&reader, &e);
                if is_void(&elem.tag) {
                    append(&mut stack, &mut doc.children, Node::Element(elem));
                } else {
                    stack.push(elem);
                }
            }
            Ok(Event::Empty(e)) => {
                let elem = element_from_start(&reader, &e);
                append(&mut stack, &mut doc.children, Node::Element(elem));
            }
            Ok(Event::Text(e)) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), |t| t.into_owned());
                if !text.is_empty() {
                    append(&mut stack, &mut doc.children, Node::Text(text));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append(&mut stack, &mut doc.children, Node::Text(text));
            }
            Ok(Event::GeneralRef(e)) => {
                let name = reader
                    .decoder()
                    .decode(&e)
                    .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), |t| t.into_owned());
                append(&mut stack, &mut doc.children, Node::Text(decode_entity(&name)));
            }
            Ok(Event::DocType(e)) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), |t| t.into_owned());
                doc.doctype = Some(text.trim().to_string());
            }
            Ok(Event::End(e)) => {
                let tag = decode_name(&reader, e.name().as_ref());
                close_element(&mut stack, &mut doc, &tag);
            }
            Ok(Event::Eof) => break,
            // Comments, XML declarations, and processing instructions carry
            // no content the pipeline consumes.
            Ok(Event::Comment(_)) | Ok(Event::Decl(_)) | Ok(Event::PI(_)) => {}
            Err(e) => {
                doc.errors.push(format!(
                    "parse error at byte {}: {}",
                    reader.error_position(),
                    e
                ));
                break;
            }
        }
    }

    // Anything still open at EOF closes implicitly.
    while let Some(elem) = stack.pop() {
        doc.errors
            .push(format!("unclosed <{}> implicitly closed at end of input", elem.tag));
        append(&mut stack, &mut doc.children, Node::Element(elem));
    }

    doc
}

/// Append a completed node to the innermost open element (or the document).
/// Adjacent text nodes merge, so entity references split across events come
/// back as a single text child.
fn append(stack: &mut Vec<Element>, top: &mut Vec<Node>, node: Node) {
    let siblings = match stack.last_mut() {
        Some(open) => &mut open.children,
        None => top,
    };
    if let (Node::Text(incoming), Some(Node::Text(prev))) = (&node, siblings.last_mut()) {
        prev.push_str(incoming);
        return;
    }
    siblings.push(node);
}

/// Handle an end tag: close the matching open element, implicitly closing
/// anything opened inside it. Orphan end tags are dropped with a note.
fn close_element(stack: &mut Vec<Element>, doc: &mut Document, tag: &str) {
    let Some(pos) = stack.iter().rposition(|el| el.tag == tag) else {
        doc.errors.push(format!("orphan </{tag}> ignored"));
        return;
    };
    while stack.len() > pos + 1 {
        let unclosed = stack.pop().expect("stack deeper than pos");
        doc.errors.push(format!(
            "unclosed <{}> implicitly closed by </{tag}>",
            unclosed.tag
        ));
        append(stack, &mut doc.children, Node::Element(unclosed));
    }
    let elem = stack.pop().expect("matching element present");
    append(stack, &mut doc.children, Node::Element(elem));
}

fn element_from_start(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Element {
    let mut elem = Element::new(decode_name(reader, e.name().as_ref()));
    // html_attributes accepts unquoted values, which hand-authored posts use.
    for attr in e.html_attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            |v| v.into_owned(),
        );
        elem.attrs.push((key, value));
    }
    elem
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        |n| n.into_owned(),
    )
}

/// Decode a general entity reference to its text value.
///
/// Unknown named entities are kept literally so no author content is lost.
fn decode_entity(name: &str) -> String {
    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => "\u{a0}".to_string(),
        _ => {
            let code = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()));
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => format!("&{name};"),
            }
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize a document tree back to markup.
pub fn serialize(doc: &Document) -> Result<String, DomError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    if let Some(doctype) = &doc.doctype {
        writer.write_event(Event::DocType(BytesText::new(doctype)))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;
    }
    write_nodes(&mut writer, &doc.children)?;
    String::from_utf8(writer.into_inner().into_inner()).map_err(|_| DomError::NonUtf8Output)
}

fn write_nodes(writer: &mut Writer<Cursor<Vec<u8>>>, nodes: &[Node]) -> Result<(), DomError> {
    for node in nodes {
        match node {
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            Node::Element(el) => {
                let mut start = BytesStart::new(el.tag.as_str());
                for (k, v) in &el.attrs {
                    start.push_attribute((k.as_str(), v.as_str()));
                }
                if is_void(&el.tag) {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    write_nodes(writer, &el.children)?;
                    writer.write_event(Event::End(BytesEnd::new(el.tag.as_str())))?;
                }
            }
        }
    }
    Ok(())
}
