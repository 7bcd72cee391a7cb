use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use super::{Element, Node};
use crate::core::SifenError;

fn xml_io(e: impl std::fmt::Display) -> SifenError {
    SifenError::Xml(format!("XML write error: {e}"))
}

/// Compact writer: UTF-8 declaration, no indentation, escaped text.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, SifenError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
    ) -> Result<&mut Self, SifenError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((k.as_str(), v.as_str()));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, SifenError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text(&mut self, text: &str) -> Result<&mut Self, SifenError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write an element and its whole subtree.
    pub fn write_element(&mut self, element: &Element) -> Result<&mut Self, SifenError> {
        self.start_element_with_attrs(&element.name, &element.attributes)?;
        for child in &element.children {
            match child {
                Node::Element(inner) => {
                    self.write_element(inner)?;
                }
                Node::Text(text) => {
                    self.text(text)?;
                }
            }
        }
        self.end_element(&element.name)
    }
}
