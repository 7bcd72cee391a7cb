//! Exclusive XML canonicalization 1.0, without comments.
//!
//! Works on the owned tree, so there are no comments or processing
//! instructions to drop. Only namespaces an element visibly uses are
//! rendered, and only when the nearest rendering ancestor did not already
//! declare the same binding.

use crate::core::SifenError;
use crate::xml::{Element, Namespaces, Node, is_declaration};

use super::DSIG_NS;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespaces in scope at `target` (its own declarations included), found by
/// walking down from `root`. `None` when `target` is not inside `root`.
pub(crate) fn in_scope(root: &Element, target: &Element) -> Option<Namespaces> {
    let mut scope = Namespaces::new();
    if path_scope(root, target, &mut scope) {
        Some(scope)
    } else {
        None
    }
}

fn path_scope(current: &Element, target: &Element, scope: &mut Namespaces) -> bool {
    let extended = current.scope(scope);
    let saved = std::mem::replace(scope, extended);
    if std::ptr::eq(current, target) {
        return true;
    }
    for child in current.elements() {
        if path_scope(child, target, scope) {
            return true;
        }
    }
    *scope = saved;
    false
}

/// Canonical bytes of `element`.
///
/// `inherited` holds the bindings from its ancestors (see [`in_scope`]).
/// With `enveloped` set, descendant `Signature` elements in the XML-DSig
/// namespace are left out.
pub(crate) fn canonicalize(
    element: &Element,
    inherited: &Namespaces,
    enveloped: bool,
) -> Result<Vec<u8>, SifenError> {
    let mut out = String::new();
    let scope = element.scope(inherited);
    write_element(element, &scope, &Namespaces::new(), enveloped, &mut out)?;
    Ok(out.into_bytes())
}

fn resolve<'a>(scope: &'a Namespaces, prefix: &str) -> Result<&'a str, SifenError> {
    match prefix {
        "xml" => Ok(XML_NS),
        "" => Ok(scope.get("").map_or("", String::as_str)),
        _ => scope
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| SifenError::Signature(format!("unbound namespace prefix '{prefix}'"))),
    }
}

fn write_element(
    element: &Element,
    scope: &Namespaces,
    rendered: &Namespaces,
    enveloped: bool,
    out: &mut String,
) -> Result<(), SifenError> {
    // Prefixes this element visibly uses.
    let mut used = vec![element.prefix().unwrap_or("")];
    for (name, _) in &element.attributes {
        if is_declaration(name) {
            continue;
        }
        if let Some((prefix, _)) = name.split_once(':') {
            if prefix != "xml" && !used.contains(&prefix) {
                used.push(prefix);
            }
        }
    }

    let mut rendered = rendered.clone();
    let mut declarations: Vec<(&str, &str)> = Vec::new();
    for prefix in used {
        let uri = resolve(scope, prefix)?;
        let already = rendered.get(prefix).map_or("", String::as_str);
        let needed = match prefix {
            // An empty default is only written to undo an inherited one.
            "" => uri != already,
            _ => !rendered.contains_key(prefix) || uri != already,
        };
        if needed {
            declarations.push((prefix, uri));
            rendered.insert(prefix.to_string(), uri.to_string());
        }
    }
    declarations.sort_unstable();

    let mut attributes: Vec<(&str, &str, &str, &str)> = Vec::new();
    for (name, value) in &element.attributes {
        if is_declaration(name) {
            continue;
        }
        let (uri, local) = match name.split_once(':') {
            Some((prefix, local)) => (resolve(scope, prefix)?, local),
            None => ("", name.as_str()),
        };
        attributes.push((uri, local, name, value));
    }
    attributes.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    out.push('<');
    out.push_str(&element.name);
    for (prefix, uri) in declarations {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attribute(uri, out);
        out.push('"');
    }
    for (_, _, name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Text(text) => escape_text(text, out),
            Node::Element(inner) => {
                let inner_scope = inner.scope(scope);
                if enveloped && is_signature(inner, &inner_scope)? {
                    continue;
                }
                write_element(inner, &inner_scope, &rendered, enveloped, out)?;
            }
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
    Ok(())
}

fn is_signature(element: &Element, scope: &Namespaces) -> Result<bool, SifenError> {
    Ok(element.local_name() == "Signature"
        && resolve(scope, element.prefix().unwrap_or(""))? == DSIG_NS)
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;

    fn c14n(xml: &str, target: &str) -> String {
        let doc = Document::parse(xml.as_bytes()).unwrap();
        let element = doc.find(target).unwrap();
        let scope = in_scope(doc.root(), element).unwrap();
        String::from_utf8(canonicalize(element, &scope, true).unwrap()).unwrap()
    }

    #[test]
    fn renders_only_visible_namespaces() {
        let xml = r#"<rDE xmlns="urn:a" xmlns:xsi="urn:xsi" xsi:schemaLocation="x"><DE Id="1"><b>t</b></DE></rDE>"#;
        insta::assert_snapshot!(c14n(xml, "DE"), @r#"<DE xmlns="urn:a" Id="1"><b>t</b></DE>"#);
    }

    #[test]
    fn sorts_attributes_and_expands_empty_elements() {
        let xml = r#"<a xmlns:p="urn:p" z="1" p:b="2" b="3"><e/></a>"#;
        insta::assert_snapshot!(
            c14n(xml, "a"),
            @r#"<a xmlns:p="urn:p" b="3" z="1" p:b="2"><e></e></a>"#
        );
    }

    #[test]
    fn prefixed_declaration_moves_to_first_user() {
        let xml = r#"<r xmlns:p="urn:p"><x><p:y>1</p:y><p:z>2</p:z></x></r>"#;
        insta::assert_snapshot!(
            c14n(xml, "x"),
            @r#"<x><p:y xmlns:p="urn:p">1</p:y><p:z xmlns:p="urn:p">2</p:z></x>"#
        );
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let mut e = Element::new("a").with_attr("v", "x\"<&\n");
        e.push_text("1 < 2 & 3 > 0\r");
        let out = canonicalize(&e, &Namespaces::new(), false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<a v=\"x&quot;&lt;&amp;&#xA;\">1 &lt; 2 &amp; 3 &gt; 0&#xD;</a>"
        );
    }

    #[test]
    fn enveloped_signature_is_skipped() {
        let xml = format!(
            r#"<r xmlns="urn:a"><d>1</d><Signature xmlns="{DSIG_NS}"><x/></Signature></r>"#
        );
        insta::assert_snapshot!(c14n(&xml, "r"), @r#"<r xmlns="urn:a"><d>1</d></r>"#);
    }

    #[test]
    fn unbound_prefix_is_an_error() {
        let e = Element::new("q:a");
        assert!(matches!(
            canonicalize(&e, &Namespaces::new(), false),
            Err(SifenError::Signature(_))
        ));
    }
}
