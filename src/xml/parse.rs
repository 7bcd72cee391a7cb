use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Element, Node};
use crate::core::SifenError;

fn syntax(position: u64, message: impl Into<String>) -> SifenError {
    SifenError::Syntax {
        position,
        message: message.into(),
    }
}

/// Tracks line numbers while the reader advances through the input.
struct LineCounter<'a> {
    input: &'a [u8],
    offset: usize,
    line: usize,
}

impl LineCounter<'_> {
    fn line_at(&mut self, position: u64) -> usize {
        let target = usize::try_from(position)
            .unwrap_or(self.input.len())
            .min(self.input.len());
        if target > self.offset {
            self.line += self.input[self.offset..target]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = target;
        }
        self.line
    }
}

fn start_element(e: &BytesStart<'_>, line: usize, position: u64) -> Result<Element, SifenError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| syntax(position, format!("invalid element name: {err}")))?
        .to_string();

    let mut element = Element::new(name);
    element.line = line;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| syntax(position, format!("invalid attribute: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| syntax(position, format!("invalid attribute name: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| syntax(position, format!("invalid attribute value: {err}")))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), SifenError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(syntax(position, "content after the root element")),
    }
}

pub(super) fn parse_document(bytes: &[u8]) -> Result<Element, SifenError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| syntax(e.valid_up_to() as u64, "document is not valid UTF-8"))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut lines = LineCounter {
        input: bytes,
        offset: 0,
        line: 1,
    };
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let line = lines.line_at(position);
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(syntax(position, "content after the root element"));
                }
                stack.push(start_element(e, line, position)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e, line, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| syntax(position, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Ok(Event::Text(ref e)) => {
                let content = e
                    .unescape()
                    .map_err(|err| syntax(position, format!("invalid text: {err}")))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(content.into_owned())),
                    None if content.trim().is_empty() => {}
                    None => return Err(syntax(position, "text outside the root element")),
                }
            }
            Ok(Event::CData(e)) => {
                let content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(content)),
                    None => return Err(syntax(position, "CDATA outside the root element")),
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions and doctype carry no content.
            Ok(_) => {}
            Err(e) => {
                let position = reader.buffer_position() as u64;
                return Err(syntax(position, e.to_string()));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(syntax(
            reader.buffer_position() as u64,
            format!("unclosed element '{}'", open.name),
        ));
    }
    root.ok_or_else(|| syntax(0, "document has no root element"))
}
