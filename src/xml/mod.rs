//! Owned markup tree shared by the encoder, signer, QR generator and validator.
//!
//! Names are kept exactly as written (`prefix:local`), and namespace
//! declarations stay in the attribute list, so a parsed document serializes
//! and canonicalizes to the same bytes it was built from.

mod parse;
mod writer;

use std::collections::BTreeMap;

pub use writer::XmlWriter;

use crate::core::SifenError;

/// SIFEN document namespace.
pub const SIFEN_NS: &str = "http://ekuatia.set.gov.py/sifen/xsd";

/// XML Schema instance namespace.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A child of an element.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    line: usize,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: 0,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Leaf element holding only text.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Node::Text(text.into()));
        element
    }

    /// 1-based source line when parsed, 0 when built in memory.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Prefix of the name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute value, or append the attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append a text-only child element.
    pub fn push_leaf(&mut self, name: &str, text: impl Into<String>) {
        self.children.push(Node::Element(Element::leaf(name, text)));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// First element (self included, pre-order) with the given local name.
    pub fn find(&self, local: &str) -> Option<&Element> {
        if self.local_name() == local {
            return Some(self);
        }
        self.elements().find_map(|child| child.find(local))
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut Element> {
        if self.local_name() == local {
            return Some(self);
        }
        self.elements_mut().find_map(|child| child.find_mut(local))
    }

    /// All descendant elements (self excluded) with the given local name.
    pub fn find_all<'a>(&'a self, local: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.local_name() == local {
                out.push(child);
            }
            child.find_all(local, out);
        }
    }

    /// Element whose `Id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.attr("Id") == Some(id) {
            return Some(self);
        }
        self.elements().find_map(|child| child.find_by_id(id))
    }

    /// Insert `element` right after the first child with local name `sibling`.
    /// Returns false when there is no such child.
    pub fn insert_after(&mut self, sibling: &str, element: Element) -> bool {
        let position = self.children.iter().position(
            |node| matches!(node, Node::Element(e) if e.local_name() == sibling),
        );
        match position {
            Some(index) => {
                self.children.insert(index + 1, Node::Element(element));
                true
            }
            None => false,
        }
    }

    /// Remove every child element with the given local name.
    pub fn remove_children(&mut self, local: &str) {
        self.children
            .retain(|node| !matches!(node, Node::Element(e) if e.local_name() == local));
    }
}

pub(crate) fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// Prefix → namespace URI. The default namespace uses the empty prefix.
#[cfg_attr(not(any(feature = "sign", feature = "schema")), allow(dead_code))]
pub(crate) type Namespaces = BTreeMap<String, String>;

/// `xmlns` or `xmlns:*`.
#[cfg_attr(not(any(feature = "sign", feature = "schema")), allow(dead_code))]
pub(crate) fn is_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

#[cfg_attr(not(any(feature = "sign", feature = "schema")), allow(dead_code))]
impl Element {
    /// Namespace bindings declared on this element.
    pub(crate) fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|(name, value)| {
            if name == "xmlns" {
                Some(("", value.as_str()))
            } else {
                name.strip_prefix("xmlns:")
                    .map(|prefix| (prefix, value.as_str()))
            }
        })
    }

    /// `parent` extended with this element's own declarations.
    pub(crate) fn scope(&self, parent: &Namespaces) -> Namespaces {
        let mut scope = parent.clone();
        for (prefix, uri) in self.declarations() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
        scope
    }
}

/// A complete document: the root element plus an implied UTF-8 declaration.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse serialized bytes. Malformed input is a [`SifenError::Syntax`]
    /// carrying the byte position of the fault.
    pub fn parse(bytes: &[u8]) -> Result<Self, SifenError> {
        parse::parse_document(bytes).map(Self::new)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn find(&self, local: &str) -> Option<&Element> {
        self.root.find(local)
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.root.find_mut(local)
    }

    /// Text of the first element with the given local name.
    pub fn find_text(&self, local: &str) -> Option<String> {
        self.find(local).map(Element::text)
    }

    /// Compact serialization: declaration, then the tree with no added whitespace.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SifenError> {
        let mut writer = XmlWriter::new()?;
        writer.write_element(&self.root)?;
        Ok(writer.into_bytes())
    }

    pub fn to_xml_string(&self) -> Result<String, SifenError> {
        String::from_utf8(self.to_bytes()?)
            .map_err(|e| SifenError::Xml(format!("XML UTF-8 error: {e}")))
    }
}
