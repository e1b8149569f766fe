//! Whitespace-preserving XML documents
//!
//! Manifest files are hand-formatted, so they must round-trip byte-for-byte
//! apart from the nodes that were actually mutated. [`Document`] wraps an
//! [`xot::Xot`] arena, which keeps whitespace and comments as ordinary
//! sibling nodes, and remembers the text before and after the document
//! element verbatim (XML declaration, leading comments, trailing newline).
//!
//! Mutations go through node insertion and removal. The `*_indented`
//! helpers copy the indentation of neighbouring nodes so new elements line
//! up with hand-written ones.

use std::fmt;

use xot::output::{NoopNormalizer, Output, TokenSerializeParameters};
use xot::{Value, Xot};

use crate::error::{Error, Result};

pub use xot::Node;

/// Byte-order mark as it appears when UTF-8 bytes are decoded as code page 437.
const PSEUDO_BOM: &str = "\u{2229}\u{2557}\u{2510}";

fn xml_error(error: xot::Error) -> Error {
    Error::MalformedDocument {
        message: error.to_string(),
    }
}

/// A parsed XML document that preserves formatting.
pub struct Document {
    xot: Xot,
    root: Node,
    prolog: String,
    epilog: String,
}

impl Document {
    /// Load raw text into a document.
    ///
    /// A leading byte-order mark (real or mis-decoded) is dropped. Empty,
    /// whitespace-only, truncated or otherwise malformed input fails with
    /// [`Error::MalformedDocument`].
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw
            .strip_prefix(PSEUDO_BOM)
            .or_else(|| raw.strip_prefix('\u{feff}'))
            .unwrap_or(raw);

        let mut xot = Xot::new();
        let root = xot.parse(text).map_err(|e| Error::MalformedDocument {
            message: e.to_string(),
        })?;

        let prolog_end = prolog_len(text);
        let body_end = text.len() - epilog_len(text);
        Ok(Self {
            xot,
            root,
            prolog: text[..prolog_end].to_string(),
            epilog: text[body_end..].to_string(),
        })
    }

    /// Serialize the document, restoring the text around the document element.
    ///
    /// Empty elements are written as `<Name />`.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut body = String::new();
        if let Some(element) = self.root_element() {
            let tokens = self
                .xot
                .tokens(element, TokenSerializeParameters::default(), NoopNormalizer);
            for (_, output, token) in tokens {
                if token.space {
                    body.push(' ');
                }
                match output {
                    Output::StartTagClose if token.text == "/>" => body.push_str(" />"),
                    _ => body.push_str(&token.text),
                }
            }
        }
        Ok(format!("{}{}{}", self.prolog, body, self.epilog))
    }

    /// The document element, if the document has one.
    pub fn root_element(&self) -> Option<Node> {
        self.xot.document_element(self.root).ok()
    }

    /// Local name of an element node; `None` for any other node kind.
    pub fn local_name(&self, node: Node) -> Option<&str> {
        self.xot
            .element(node)
            .map(|element| self.xot.local_name_str(element.name()))
    }

    /// Whether `node` is an element with exactly this local name.
    pub fn is_named(&self, node: Node, name: &str) -> bool {
        self.local_name(node) == Some(name)
    }

    /// Whether `node` is an element whose local name matches ignoring ASCII case.
    pub fn is_named_ignore_case(&self, node: Node, name: &str) -> bool {
        self.local_name(node)
            .is_some_and(|local| local.eq_ignore_ascii_case(name))
    }

    pub fn is_element(&self, node: Node) -> bool {
        self.xot.is_element(node)
    }

    pub fn is_comment(&self, node: Node) -> bool {
        self.xot.is_comment(node)
    }

    /// Whether `node` is a text node made only of whitespace.
    pub fn is_whitespace(&self, node: Node) -> bool {
        self.xot
            .text_str(node)
            .is_some_and(|text| text.trim().is_empty())
    }

    pub fn parent(&self, node: Node) -> Option<Node> {
        self.xot.parent(node)
    }

    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.xot.first_child(node)
    }

    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        self.xot.next_sibling(node)
    }

    /// All child nodes, in document order.
    pub fn children(&self, node: Node) -> Vec<Node> {
        self.xot.children(node).collect()
    }

    /// Child element nodes, in document order.
    pub fn child_elements(&self, node: Node) -> Vec<Node> {
        self.xot
            .children(node)
            .filter(|child| self.xot.is_element(*child))
            .collect()
    }

    /// Descendant elements of `node` (excluding `node`), in document order.
    pub fn descendant_elements(&self, node: Node) -> Vec<Node> {
        self.xot
            .descendants(node)
            .filter(|descendant| *descendant != node && self.xot.is_element(*descendant))
            .collect()
    }

    /// First child element with the given local name.
    pub fn find_child(&self, parent: Node, name: &str) -> Option<Node> {
        self.xot
            .children(parent)
            .find(|child| self.is_named(*child, name))
    }

    /// Attribute value by (un-namespaced) name.
    pub fn attribute(&self, node: Node, name: &str) -> Option<String> {
        let name_id = self.xot.name(name)?;
        self.xot.attributes(node).get(name_id).cloned()
    }

    /// Set an attribute, appending it when absent and keeping its position otherwise.
    pub fn set_attribute(&mut self, node: Node, name: &str, value: &str) {
        let name_id = self.xot.add_name(name);
        self.xot
            .attributes_mut(node)
            .insert(name_id, value.to_string());
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self, node: Node) -> String {
        self.xot
            .descendants(node)
            .filter_map(|descendant| self.xot.text_str(descendant))
            .collect()
    }

    /// Replace the content of an element with a single text node.
    pub fn set_text(&mut self, node: Node, value: &str) -> Result<()> {
        let children: Vec<Node> = self.xot.children(node).collect();
        for child in children {
            self.xot.remove(child).map_err(xml_error)?;
        }
        if !value.is_empty() {
            let text = self.xot.new_text(value);
            self.xot.append(node, text).map_err(xml_error)?;
        }
        Ok(())
    }

    /// Text of a comment node.
    pub fn comment_text(&self, node: Node) -> Option<&str> {
        match self.xot.value(node) {
            Value::Comment(comment) => Some(comment.get()),
            _ => None,
        }
    }

    /// Create a detached element in the document element's namespace.
    pub fn create_element(&mut self, local_name: &str) -> Node {
        let namespace = self
            .root_element()
            .and_then(|root| self.xot.element(root))
            .map(|element| self.xot.namespace_for_name(element.name()));
        let name = match namespace {
            Some(namespace) => self.xot.add_name_ns(local_name, namespace),
            None => self.xot.add_name(local_name),
        };
        self.xot.new_element(name)
    }

    /// Create a detached element holding a single text node.
    pub fn create_text_element(&mut self, local_name: &str, value: &str) -> Result<Node> {
        let element = self.create_element(local_name);
        self.set_text(element, value)?;
        Ok(element)
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, text: &str) -> Node {
        self.xot.new_comment(text)
    }

    /// Indentation (text after the last newline) of the whitespace before `node`.
    fn indent_before(&self, node: Node) -> Option<String> {
        let previous = self.xot.previous_sibling(node)?;
        let text = self.xot.text_str(previous)?;
        if !text.trim().is_empty() {
            return None;
        }
        text.rfind('\n').map(|i| text[i + 1..].to_string())
    }

    /// Indentation used by the children of `parent`.
    fn child_indent(&self, parent: Node) -> String {
        self.xot
            .children(parent)
            .filter(|child| self.xot.is_element(*child) || self.xot.is_comment(*child))
            .find_map(|child| self.indent_before(child))
            .unwrap_or_else(|| format!("{}  ", self.indent_before(parent).unwrap_or_default()))
    }

    fn has_markup_children(&self, parent: Node) -> bool {
        self.xot
            .children(parent)
            .any(|child| self.xot.is_element(child) || self.xot.is_comment(child))
    }

    /// Append `child` as the last child of `parent`, on its own indented line.
    pub fn append_indented(&mut self, parent: Node, child: Node) -> Result<()> {
        let indent = self.child_indent(parent);
        match self.xot.last_child(parent) {
            Some(last) if self.is_whitespace(last) => {
                self.xot.insert_before(last, child).map_err(xml_error)?;
                let whitespace = self.xot.new_text(&format!("\n{}", indent));
                self.xot.insert_before(child, whitespace).map_err(xml_error)?;
            }
            _ => {
                let closing = format!("\n{}", self.indent_before(parent).unwrap_or_default());
                let whitespace = self.xot.new_text(&format!("\n{}", indent));
                self.xot.append(parent, whitespace).map_err(xml_error)?;
                self.xot.append(parent, child).map_err(xml_error)?;
                let closing = self.xot.new_text(&closing);
                self.xot.append(parent, closing).map_err(xml_error)?;
            }
        }
        Ok(())
    }

    /// Insert `child` as the first element or comment of `parent`.
    pub fn prepend_indented(&mut self, parent: Node, child: Node) -> Result<()> {
        if !self.has_markup_children(parent) {
            return self.append_indented(parent, child);
        }
        let indent = self.child_indent(parent);
        match self.xot.first_child(parent) {
            Some(first) if self.is_whitespace(first) => {
                self.xot.insert_after(first, child).map_err(xml_error)?;
                let whitespace = self.xot.new_text(&format!("\n{}", indent));
                self.xot.insert_after(child, whitespace).map_err(xml_error)?;
            }
            Some(first) => {
                self.xot.insert_before(first, child).map_err(xml_error)?;
            }
            None => self.xot.append(parent, child).map_err(xml_error)?,
        }
        Ok(())
    }

    /// Insert `node` right after `reference`, on its own line at the same indentation.
    pub fn insert_after_indented(&mut self, reference: Node, node: Node) -> Result<()> {
        self.xot.insert_after(reference, node).map_err(xml_error)?;
        if let Some(indent) = self.indent_before(reference) {
            let whitespace = self.xot.new_text(&format!("\n{}", indent));
            self.xot.insert_before(node, whitespace).map_err(xml_error)?;
        }
        Ok(())
    }

    /// Replace `old` by `new` in place.
    pub fn replace(&mut self, old: Node, new: Node) -> Result<()> {
        self.xot.insert_before(old, new).map_err(xml_error)?;
        self.xot.remove(old).map_err(xml_error)
    }

    /// Remove a node together with the whitespace that indents it.
    pub fn remove(&mut self, node: Node) -> Result<()> {
        if let Some(previous) = self.xot.previous_sibling(node) {
            if self.is_whitespace(previous) {
                self.xot.remove(previous).map_err(xml_error)?;
            }
        }
        self.xot.remove(node).map_err(xml_error)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_xml_string() {
            Ok(text) => f.debug_tuple("Document").field(&text).finish(),
            Err(_) => f.write_str("Document(<unserializable>)"),
        }
    }
}

/// Length of the text preceding the document element: declaration,
/// processing instructions, comments, doctype and whitespace.
fn prolog_len(text: &str) -> usize {
    let mut position = 0;
    loop {
        let rest = &text[position..];
        let trimmed = rest.trim_start();
        let whitespace = rest.len() - trimmed.len();
        let end = if trimmed.starts_with("<?") {
            trimmed.find("?>").map(|i| i + 2)
        } else if trimmed.starts_with("<!--") {
            trimmed.find("-->").map(|i| i + 3)
        } else if trimmed.starts_with("<!DOCTYPE") {
            trimmed.find('>').map(|i| i + 1)
        } else {
            None
        };
        match end {
            Some(end) => position += whitespace + end,
            None => return position + whitespace,
        }
    }
}

/// Length of the text following the document element: comments,
/// processing instructions and whitespace.
fn epilog_len(text: &str) -> usize {
    let mut end = text.len();
    loop {
        let trimmed = text[..end].trim_end();
        let start = if trimmed.ends_with("-->") {
            trimmed.rfind("<!--")
        } else if trimmed.ends_with("?>") {
            trimmed.rfind("<?")
        } else {
            None
        };
        match start {
            Some(start) => end = start,
            None => return text.len() - trimmed.len(),
        }
    }
}
