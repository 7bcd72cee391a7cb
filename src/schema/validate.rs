//! Instance validation against a compiled [`Model`].
//!
//! Validation never stops at the first problem: every element is visited and
//! every finding is collected with its line and path.

use std::collections::BTreeSet;

use crate::core::{Location, SchemaIssue, Severity};
use crate::xml::{Element, Namespaces, XSI_NS, is_declaration};

use super::model::{
    ComplexType, Content, Model, Particle, Process, QName, Term, TypeRef, Wildcard,
};

/// Collect every issue in the tree rooted at `root`.
pub(super) fn validate(model: &Model, root: &Element) -> Vec<SchemaIssue> {
    let mut validator = Validator {
        model,
        issues: Vec::new(),
    };
    let scope = root.scope(&Namespaces::new());
    let path = format!("/{}", root.local_name());
    let name = element_name(root, &scope);
    match model.globals.get(&name) {
        Some(&decl) => validator.element(root, model.elements[decl].ty, &scope, &path),
        None => validator.report(
            root,
            &path,
            Severity::Error,
            format!("no global declaration for root element '{}'", root.name),
        ),
    }
    validator.issues
}

fn element_name(element: &Element, scope: &Namespaces) -> QName {
    let prefix = element.prefix().unwrap_or("");
    let ns = scope.get(prefix).map_or("", String::as_str);
    QName::new(ns, element.local_name())
}

struct Validator<'m> {
    model: &'m Model,
    issues: Vec<SchemaIssue>,
}

/// How a child element was admitted by its parent's content model.
enum Admission<'m> {
    Declared(usize),
    Wildcard(&'m Wildcard),
}

impl<'m> Validator<'m> {
    fn report(&mut self, at: &Element, path: &str, severity: Severity, message: String) {
        self.issues.push(SchemaIssue {
            location: Location {
                line: at.line(),
                path: path.to_string(),
            },
            message,
            severity,
        });
    }

    fn element(&mut self, element: &Element, ty: TypeRef, scope: &Namespaces, path: &str) {
        match ty {
            TypeRef::Any => {}
            TypeRef::Simple(index) => {
                self.attributes(element, None, scope, path);
                if element.elements().next().is_some() {
                    self.report(
                        element,
                        path,
                        Severity::Error,
                        "child elements are not allowed in a simple-typed element".into(),
                    );
                }
                self.text(element, index, path);
            }
            TypeRef::Complex(index) => {
                let complex = &self.model.complex[index];
                self.attributes(element, Some(complex), scope, path);
                match &complex.content {
                    Content::Empty => {
                        if element.elements().next().is_some()
                            || !element.text().trim().is_empty()
                        {
                            self.report(
                                element,
                                path,
                                Severity::Error,
                                "element must be empty".into(),
                            );
                        }
                    }
                    Content::Simple(simple) => {
                        if element.elements().next().is_some() {
                            self.report(
                                element,
                                path,
                                Severity::Error,
                                "child elements are not allowed in simple content".into(),
                            );
                        }
                        self.text(element, *simple, path);
                    }
                    Content::Elements(particle) => self.children(element, particle, scope, path),
                }
            }
        }
    }

    fn text(&mut self, element: &Element, simple: usize, path: &str) {
        if let Err(message) = self.model.simple[simple].check(&element.text()) {
            self.report(element, path, Severity::Error, message);
        }
    }

    fn attributes(
        &mut self,
        element: &Element,
        complex: Option<&ComplexType>,
        scope: &Namespaces,
        path: &str,
    ) {
        let declared = complex.map_or(&[][..], |c| c.attributes.as_slice());
        let open = complex.is_some_and(|c| c.any_attribute);

        for (name, value) in &element.attributes {
            if is_declaration(name) {
                continue;
            }
            if let Some((prefix, _)) = name.split_once(':') {
                let ns = scope.get(prefix).map(String::as_str);
                if prefix == "xml" || ns == Some(XSI_NS) || open {
                    continue;
                }
                self.report(
                    element,
                    path,
                    Severity::Error,
                    format!("attribute '{name}' is not allowed"),
                );
                continue;
            }
            match declared.iter().find(|a| &a.name == name) {
                Some(decl) => {
                    if let Err(message) = self.model.simple[decl.ty].check(value) {
                        self.report(
                            element,
                            path,
                            Severity::Error,
                            format!("attribute '{name}': {message}"),
                        );
                    } else if let Some(fixed) = decl.fixed.as_deref().filter(|f| f != value) {
                        self.report(
                            element,
                            path,
                            Severity::Error,
                            format!("attribute '{name}' must be '{fixed}'"),
                        );
                    }
                }
                None if open => {}
                None => self.report(
                    element,
                    path,
                    Severity::Error,
                    format!("attribute '{name}' is not allowed"),
                ),
            }
        }

        for decl in declared.iter().filter(|a| a.required) {
            if element.attr(&decl.name).is_none() {
                self.report(
                    element,
                    path,
                    Severity::Error,
                    format!("required attribute '{}' is missing", decl.name),
                );
            }
        }
    }

    fn children(&mut self, element: &Element, particle: &'m Particle, scope: &Namespaces, path: &str) {
        if !element.text().trim().is_empty() {
            self.report(
                element,
                path,
                Severity::Error,
                "text is not allowed in element-only content".into(),
            );
        }

        let children: Vec<&Element> = element.elements().collect();
        let scopes: Vec<Namespaces> = children.iter().map(|c| c.scope(scope)).collect();
        let names: Vec<QName> = children
            .iter()
            .zip(&scopes)
            .map(|(child, scope)| element_name(child, scope))
            .collect();

        let mut matcher = Matcher {
            model: self.model,
            names: &names,
            furthest: 0,
            expected: BTreeSet::new(),
        };
        let end = matcher.particle(particle, 0);
        let failed_at = match end {
            Some(end) if end == names.len() => None,
            Some(end) => Some(end.max(matcher.furthest)),
            None => Some(matcher.furthest),
        };
        if let Some(position) = failed_at {
            let expected = matcher.expected_list();
            match children.get(position) {
                Some(child) => {
                    let child_path = format!("{path}/{}", child.local_name());
                    let message = if expected.is_empty() {
                        format!("unexpected element '{}'", child.name)
                    } else {
                        format!("unexpected element '{}'; expected {expected}", child.name)
                    };
                    self.report(child, &child_path, Severity::Error, message);
                }
                None => self.report(
                    element,
                    path,
                    Severity::Error,
                    format!("content is incomplete; expected {expected}"),
                ),
            }
        }

        for ((child, child_scope), name) in children.iter().zip(&scopes).zip(&names) {
            let child_path = format!("{path}/{}", child.local_name());
            match admission(self.model, particle, name) {
                Some(Admission::Declared(decl)) => {
                    self.element(child, self.model.elements[decl].ty, child_scope, &child_path);
                }
                Some(Admission::Wildcard(wildcard)) => {
                    self.wildcard(child, wildcard.process, name, child_scope, &child_path);
                }
                // Already reported by the content match.
                None => {}
            }
        }
    }

    fn wildcard(
        &mut self,
        element: &Element,
        process: Process,
        name: &QName,
        scope: &Namespaces,
        path: &str,
    ) {
        if process == Process::Skip {
            return;
        }
        match self.model.globals.get(name) {
            Some(&decl) => self.element(element, self.model.elements[decl].ty, scope, path),
            None if process == Process::Lax => self.report(
                element,
                path,
                Severity::Warning,
                format!("no declaration for '{}'; content not checked", element.name),
            ),
            None => self.report(
                element,
                path,
                Severity::Error,
                format!("no declaration for '{}'", element.name),
            ),
        }
    }
}

/// The declaration (or wildcard) in `particle` that admits `name`.
///
/// Same-named elements in one content model share a type, so the first
/// declaration found is the right one.
fn admission<'m>(model: &'m Model, particle: &'m Particle, name: &QName) -> Option<Admission<'m>> {
    fn declared(model: &Model, particle: &Particle, name: &QName) -> Option<usize> {
        match &particle.term {
            Term::Element(index) => (model.elements[*index].name == *name).then_some(*index),
            Term::Sequence(items) | Term::Choice(items) => {
                items.iter().find_map(|item| declared(model, item, name))
            }
            Term::Any(_) => None,
        }
    }
    fn wildcard<'p>(particle: &'p Particle, name: &QName) -> Option<&'p Wildcard> {
        match &particle.term {
            Term::Any(w) => w.allows(&name.ns).then_some(w),
            Term::Sequence(items) | Term::Choice(items) => {
                items.iter().find_map(|item| wildcard(item, name))
            }
            Term::Element(_) => None,
        }
    }
    declared(model, particle, name)
        .map(Admission::Declared)
        .or_else(|| wildcard(particle, name).map(Admission::Wildcard))
}

/// Greedy content-model matcher over a run of child names.
///
/// Remembers the furthest position any branch reached and what would have
/// been accepted there, for the error message.
struct Matcher<'a> {
    model: &'a Model,
    names: &'a [QName],
    furthest: usize,
    expected: BTreeSet<String>,
}

impl Matcher<'_> {
    fn expect(&mut self, position: usize, label: String) {
        if position > self.furthest {
            self.furthest = position;
            self.expected.clear();
        }
        if position == self.furthest {
            self.expected.insert(label);
        }
    }

    fn expected_list(&self) -> String {
        self.expected
            .iter()
            .map(|label| format!("'{label}'"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Position after matching `particle` at `position`, or `None`.
    fn particle(&mut self, particle: &Particle, position: usize) -> Option<usize> {
        let mut count = 0;
        let mut at = position;
        while particle.max.is_none_or(|max| count < max) {
            match self.term(&particle.term, at) {
                Some(next) if next > at => {
                    at = next;
                    count += 1;
                }
                // Further rounds would match nothing again.
                Some(_) => {
                    count = count.max(particle.min);
                    break;
                }
                None => break,
            }
        }
        (count >= particle.min).then_some(at)
    }

    fn term(&mut self, term: &Term, position: usize) -> Option<usize> {
        match term {
            Term::Element(index) => {
                let decl = &self.model.elements[*index];
                if self.names.get(position) == Some(&decl.name) {
                    Some(position + 1)
                } else {
                    self.expect(position, decl.name.local.clone());
                    None
                }
            }
            Term::Any(wildcard) => match self.names.get(position) {
                Some(name) if wildcard.allows(&name.ns) => Some(position + 1),
                _ => {
                    self.expect(position, "any element".into());
                    None
                }
            },
            Term::Sequence(items) => items
                .iter()
                .try_fold(position, |at, item| self.particle(item, at)),
            Term::Choice(items) => items
                .iter()
                .filter_map(|item| self.particle(item, position))
                .max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Schema;
    use crate::xml::Document;

    const XSD: &str = r###"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:t"
           targetNamespace="urn:t" elementFormDefault="qualified">
  <xs:simpleType name="tCode">
    <xs:restriction base="xs:string">
      <xs:pattern value="[0-9]{3}"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:element name="r">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="a" type="tCode"/>
        <xs:choice>
          <xs:element name="b" type="xs:integer"/>
          <xs:element name="c" type="xs:string"/>
        </xs:choice>
        <xs:element name="d" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
        <xs:any namespace="##other" processContents="lax" minOccurs="0"/>
      </xs:sequence>
      <xs:attribute name="v" type="xs:string" use="required" fixed="1"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"###;

    fn issues(xml: &str) -> Vec<String> {
        let schema = Schema::parse(XSD).unwrap();
        let doc = Document::parse(xml.as_bytes()).unwrap();
        schema
            .validate_document(&doc)
            .issues()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn valid_instance() {
        let xml = r#"<r xmlns="urn:t" v="1"><a>123</a><c>x</c><d/><d/></r>"#;
        assert!(issues(xml).is_empty());
    }

    #[test]
    fn reports_every_issue_with_location() {
        let xml = "<r xmlns=\"urn:t\" v=\"2\" w=\"x\">\n<a>12</a>\n<b>x</b>\n</r>";
        insta::assert_debug_snapshot!(issues(xml), @r#"
        [
            "[error] line 1 /r: attribute 'v' must be '1'",
            "[error] line 1 /r: attribute 'w' is not allowed",
            "[error] line 2 /r/a: '12' does not match pattern ^(?:[0-9]{3})$",
            "[error] line 3 /r/b: 'x' is not an integer",
        ]
        "#);
    }

    #[test]
    fn content_model_errors() {
        let unexpected = issues(r#"<r xmlns="urn:t" v="1"><a>123</a><d/></r>"#);
        assert_eq!(
            unexpected,
            ["[error] line 1 /r/d: unexpected element 'd'; expected 'b', 'c'"]
        );
        let incomplete = issues(r#"<r xmlns="urn:t" v="1"><a>123</a></r>"#);
        assert_eq!(
            incomplete,
            ["[error] line 1 /r: content is incomplete; expected 'b', 'c'"]
        );
    }

    #[test]
    fn lax_wildcard_without_declaration_warns() {
        let xml = r#"<r xmlns="urn:t" v="1"><a>123</a><b>1</b><x:e xmlns:x="urn:x"/></r>"#;
        let schema = Schema::parse(XSD).unwrap();
        let doc = Document::parse(xml.as_bytes()).unwrap();
        let result = schema.validate_document(&doc);
        assert!(result.is_valid());
    }
}
