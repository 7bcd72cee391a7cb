//! XSD subset → [`Model`].
//!
//! Supported: global and local elements (`type`, `ref`, inline types),
//! named and anonymous complex types with `sequence` / `choice` / `any`,
//! occurrence bounds, attributes, `anyAttribute`, `simpleContent` extension,
//! simple-type restriction with the usual facets, `include` and `import`.
//! Anything else makes the contract unusable.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::core::SifenError;
use crate::xml::{Document, Element, Namespaces};

use super::model::{
    AttributeDecl, Builtin, ComplexType, Content, ElementDecl, Facets, Model, NamespaceConstraint,
    Particle, Process, QName, SimpleType, Term, TypeRef, Wildcard,
};

/// XML Schema namespace.
const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

fn unavailable(message: impl Into<String>) -> SifenError {
    SifenError::ContractUnavailable(message.into())
}

/// One schema document of the contract.
pub(super) struct SchemaDoc {
    root: Element,
    scope: Namespaces,
    target: String,
    qualified: bool,
}

/// Read `path` and every document it includes or imports.
pub(super) fn load_sources(path: &Path) -> Result<Vec<SchemaDoc>, SifenError> {
    let mut docs = Vec::new();
    let mut seen = HashSet::new();
    load_file(path, &mut docs, &mut seen)?;
    Ok(docs)
}

/// Compile a contract given as text; relative locations resolve against `base`.
pub(super) fn parse_sources(text: &str, base: &Path) -> Result<Vec<SchemaDoc>, SifenError> {
    let root = Document::parse(text.as_bytes())
        .map_err(|e| unavailable(format!("schema is not well-formed: {e}")))?
        .into_root();
    let mut docs = Vec::new();
    let mut seen = HashSet::new();
    add_document(root, base, &mut docs, &mut seen)?;
    Ok(docs)
}

fn load_file(
    path: &Path,
    docs: &mut Vec<SchemaDoc>,
    seen: &mut HashSet<PathBuf>,
) -> Result<(), SifenError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !seen.insert(key) {
        return Ok(());
    }
    let bytes = std::fs::read(path)
        .map_err(|e| unavailable(format!("cannot read {}: {e}", path.display())))?;
    let root = Document::parse(&bytes)
        .map_err(|e| unavailable(format!("{} is not well-formed: {e}", path.display())))?
        .into_root();
    tracing::debug!(path = %path.display(), "schema document read");
    add_document(root, path.parent().unwrap_or(Path::new("")), docs, seen)
}

fn add_document(
    root: Element,
    base: &Path,
    docs: &mut Vec<SchemaDoc>,
    seen: &mut HashSet<PathBuf>,
) -> Result<(), SifenError> {
    if root.local_name() != "schema" {
        return Err(unavailable(format!(
            "root element is '{}', not xs:schema",
            root.name
        )));
    }
    for child in root.elements() {
        if matches!(child.local_name(), "include" | "import") {
            let location = child.attr("schemaLocation").ok_or_else(|| {
                unavailable(format!("xs:{} without schemaLocation", child.local_name()))
            })?;
            load_file(&base.join(location), docs, seen)?;
        }
    }
    let scope = root.scope(&Namespaces::new());
    let target = root.attr("targetNamespace").unwrap_or_default().to_string();
    let qualified = root.attr("elementFormDefault") == Some("qualified");
    docs.push(SchemaDoc {
        root,
        scope,
        target,
        qualified,
    });
    Ok(())
}

/// Compile all documents into one model.
pub(super) fn compile(docs: &[SchemaDoc]) -> Result<Model, SifenError> {
    let mut compiler = Compiler {
        model: Model::default(),
        simple_names: HashMap::new(),
        complex_names: HashMap::new(),
        builtins: HashMap::new(),
        pending_simple: HashMap::new(),
        in_progress: HashSet::new(),
    };

    let mut complex_bodies = Vec::new();
    let mut element_bodies = Vec::new();
    for doc in docs {
        for child in doc.root.elements() {
            let local = child.local_name();
            if matches!(local, "include" | "import" | "annotation") {
                continue;
            }
            let name = child
                .attr("name")
                .ok_or_else(|| unavailable(format!("top-level xs:{local} without a name")))?;
            let qname = QName::new(doc.target.as_str(), name);
            match local {
                "complexType" => {
                    let index = compiler.model.complex.len();
                    compiler.model.complex.push(ComplexType {
                        content: Content::Empty,
                        attributes: Vec::new(),
                        any_attribute: false,
                    });
                    if compiler.complex_names.insert(qname, index).is_some() {
                        return Err(unavailable(format!("duplicate complex type '{name}'")));
                    }
                    complex_bodies.push((index, doc, child));
                }
                "simpleType" => {
                    let index = compiler.model.simple.len();
                    compiler
                        .model
                        .simple
                        .push(SimpleType::builtin(Builtin::String));
                    if compiler.simple_names.insert(qname, index).is_some() {
                        return Err(unavailable(format!("duplicate simple type '{name}'")));
                    }
                    compiler.pending_simple.insert(index, (doc, child));
                }
                "element" => {
                    let index = compiler.model.elements.len();
                    compiler.model.elements.push(ElementDecl {
                        name: qname.clone(),
                        ty: TypeRef::Any,
                    });
                    if compiler.model.globals.insert(qname, index).is_some() {
                        return Err(unavailable(format!("duplicate global element '{name}'")));
                    }
                    element_bodies.push((index, doc, child));
                }
                other => return Err(unavailable(format!("unsupported top-level xs:{other}"))),
            }
        }
    }

    let mut pending: Vec<usize> = compiler.pending_simple.keys().copied().collect();
    pending.sort_unstable();
    for index in pending {
        compiler.ensure_simple(index)?;
    }
    for (index, doc, element) in complex_bodies {
        let scope = element.scope(&doc.scope);
        compiler.model.complex[index] = compiler.complex_type(doc, element, &scope)?;
    }
    for (index, doc, element) in element_bodies {
        let scope = element.scope(&doc.scope);
        compiler.model.elements[index].ty = compiler.element_type(doc, element, &scope)?;
    }

    tracing::debug!(
        elements = compiler.model.elements.len(),
        complex_types = compiler.model.complex.len(),
        simple_types = compiler.model.simple.len(),
        "schema compiled"
    );
    Ok(compiler.model)
}

struct Compiler<'d> {
    model: Model,
    simple_names: HashMap<QName, usize>,
    complex_names: HashMap<QName, usize>,
    builtins: HashMap<String, usize>,
    pending_simple: HashMap<usize, (&'d SchemaDoc, &'d Element)>,
    in_progress: HashSet<usize>,
}

/// Children that carry meaning (annotations dropped).
fn content(element: &Element) -> impl Iterator<Item = &Element> {
    element.elements().filter(|e| e.local_name() != "annotation")
}

fn resolve_qname(scope: &Namespaces, value: &str) -> Result<QName, SifenError> {
    let (prefix, local) = value.split_once(':').unwrap_or(("", value));
    let ns = match scope.get(prefix) {
        Some(uri) => uri.as_str(),
        None if prefix.is_empty() => "",
        None => return Err(unavailable(format!("unbound prefix in '{value}'"))),
    };
    Ok(QName::new(ns, local))
}

fn occurs(element: &Element) -> Result<(u32, Option<u32>), SifenError> {
    let parse = |name: &str, value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| unavailable(format!("invalid {name} '{value}'")))
    };
    let min = element
        .attr("minOccurs")
        .map(|v| parse("minOccurs", v))
        .transpose()?
        .unwrap_or(1);
    let max = match element.attr("maxOccurs") {
        Some("unbounded") => None,
        Some(v) => Some(parse("maxOccurs", v)?),
        None => Some(1),
    };
    if max.is_some_and(|m| m < min) {
        return Err(unavailable(format!("maxOccurs below minOccurs on '{}'", element.name)));
    }
    Ok((min, max))
}

impl<'d> Compiler<'d> {
    fn builtin(&mut self, local: &str) -> Result<usize, SifenError> {
        let builtin = Builtin::by_name(local)
            .ok_or_else(|| unavailable(format!("unsupported built-in type xs:{local}")))?;
        if let Some(&index) = self.builtins.get(local) {
            return Ok(index);
        }
        let index = self.model.simple.len();
        self.model.simple.push(SimpleType::builtin(builtin));
        self.builtins.insert(local.to_string(), index);
        Ok(index)
    }

    fn resolve_simple(&mut self, name: &QName) -> Result<usize, SifenError> {
        if name.ns == XS_NS {
            return self.builtin(&name.local);
        }
        let index = *self
            .simple_names
            .get(name)
            .ok_or_else(|| unavailable(format!("unknown simple type '{}'", name.local)))?;
        self.ensure_simple(index)?;
        Ok(index)
    }

    fn resolve_type(&mut self, name: &QName) -> Result<TypeRef, SifenError> {
        if name.ns == XS_NS && name.local == "anyType" {
            return Ok(TypeRef::Any);
        }
        if let Some(&index) = self.complex_names.get(name) {
            return Ok(TypeRef::Complex(index));
        }
        self.resolve_simple(name).map(TypeRef::Simple)
    }

    fn ensure_simple(&mut self, index: usize) -> Result<(), SifenError> {
        let Some(&(doc, element)) = self.pending_simple.get(&index) else {
            return Ok(());
        };
        if !self.in_progress.insert(index) {
            return Err(unavailable(format!(
                "simple type '{}' derives from itself",
                element.attr("name").unwrap_or_default()
            )));
        }
        let scope = element.scope(&doc.scope);
        let compiled = self.simple_type(doc, element, &scope)?;
        self.in_progress.remove(&index);
        self.pending_simple.remove(&index);
        self.model.simple[index] = compiled;
        Ok(())
    }

    fn simple_type(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<SimpleType, SifenError> {
        let mut parts = content(element);
        let restriction = match parts.next() {
            Some(r) if r.local_name() == "restriction" => r,
            Some(other) => {
                return Err(unavailable(format!(
                    "unsupported simple type derivation xs:{}",
                    other.local_name()
                )));
            }
            None => return Err(unavailable("empty xs:simpleType")),
        };
        let scope = restriction.scope(scope);

        let mut base = match restriction.attr("base") {
            Some(base) => {
                let index = self.resolve_simple(&resolve_qname(&scope, base)?)?;
                self.model.simple[index].clone()
            }
            None => {
                let inline = content(restriction)
                    .find(|e| e.local_name() == "simpleType")
                    .ok_or_else(|| unavailable("xs:restriction without a base"))?;
                let inner_scope = inline.scope(&scope);
                self.simple_type(doc, inline, &inner_scope)?
            }
        };

        let mut enumeration = Vec::new();
        let mut patterns = Vec::new();
        for facet in content(restriction) {
            let local = facet.local_name();
            if local == "simpleType" {
                continue;
            }
            let value = facet
                .attr("value")
                .ok_or_else(|| unavailable(format!("xs:{local} without a value")))?;
            apply_facet(&mut base, local, value, &mut enumeration, &mut patterns)?;
        }
        if !enumeration.is_empty() {
            base.facets.enumeration = Some(enumeration);
        }
        if !patterns.is_empty() {
            let source = format!("^(?:{})$", patterns.join("|"));
            let regex = Regex::new(&source)
                .map_err(|e| unavailable(format!("unsupported pattern {source}: {e}")))?;
            base.facets.patterns.push(regex);
        }
        Ok(base)
    }

    fn complex_type(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<ComplexType, SifenError> {
        if element.attr("mixed") == Some("true") {
            return Err(unavailable("mixed content is not supported"));
        }
        let mut ty = ComplexType {
            content: Content::Empty,
            attributes: Vec::new(),
            any_attribute: false,
        };
        for part in content(element) {
            let part_scope = part.scope(scope);
            match part.local_name() {
                "sequence" | "choice" => {
                    ty.content = Content::Elements(self.particle(doc, part, &part_scope)?);
                }
                "attribute" => ty.attributes.push(self.attribute(doc, part, &part_scope)?),
                "anyAttribute" => ty.any_attribute = true,
                "simpleContent" => {
                    let extension = content(part)
                        .find(|e| e.local_name() == "extension")
                        .ok_or_else(|| {
                            unavailable("xs:simpleContent is only supported with xs:extension")
                        })?;
                    let ext_scope = extension.scope(&part_scope);
                    let base = extension
                        .attr("base")
                        .ok_or_else(|| unavailable("xs:extension without a base"))?;
                    let base = resolve_qname(&ext_scope, base)?;
                    ty.content = Content::Simple(self.resolve_simple(&base)?);
                    for attr in content(extension) {
                        let attr_scope = attr.scope(&ext_scope);
                        match attr.local_name() {
                            "attribute" => {
                                ty.attributes.push(self.attribute(doc, attr, &attr_scope)?)
                            }
                            "anyAttribute" => ty.any_attribute = true,
                            other => {
                                return Err(unavailable(format!(
                                    "unsupported xs:{other} in xs:extension"
                                )));
                            }
                        }
                    }
                }
                other => {
                    return Err(unavailable(format!(
                        "unsupported xs:{other} in xs:complexType"
                    )));
                }
            }
        }
        Ok(ty)
    }

    fn particle(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<Particle, SifenError> {
        let (min, max) = occurs(element)?;
        let term = match element.local_name() {
            "element" => self.element_term(doc, element, scope)?,
            "sequence" | "choice" => {
                let mut items = Vec::new();
                for child in content(element) {
                    let child_scope = child.scope(scope);
                    items.push(self.particle(doc, child, &child_scope)?);
                }
                if element.local_name() == "sequence" {
                    Term::Sequence(items)
                } else {
                    Term::Choice(items)
                }
            }
            "any" => Term::Any(wildcard(doc, element)?),
            other => return Err(unavailable(format!("unsupported particle xs:{other}"))),
        };
        Ok(Particle { min, max, term })
    }

    fn element_term(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<Term, SifenError> {
        if let Some(reference) = element.attr("ref") {
            let name = resolve_qname(scope, reference)?;
            let index = *self
                .model
                .globals
                .get(&name)
                .ok_or_else(|| unavailable(format!("unknown element ref '{reference}'")))?;
            return Ok(Term::Element(index));
        }
        let name = element
            .attr("name")
            .ok_or_else(|| unavailable("local xs:element without name or ref"))?;
        let qualified = match element.attr("form") {
            Some(form) => form == "qualified",
            None => doc.qualified,
        };
        let ns = if qualified { doc.target.as_str() } else { "" };
        let index = self.model.elements.len();
        self.model.elements.push(ElementDecl {
            name: QName::new(ns, name),
            ty: TypeRef::Any,
        });
        self.model.elements[index].ty = self.element_type(doc, element, scope)?;
        Ok(Term::Element(index))
    }

    fn element_type(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<TypeRef, SifenError> {
        if let Some(ty) = element.attr("type") {
            return self.resolve_type(&resolve_qname(scope, ty)?);
        }
        for inline in content(element) {
            let inner_scope = inline.scope(scope);
            match inline.local_name() {
                "complexType" => {
                    let compiled = self.complex_type(doc, inline, &inner_scope)?;
                    self.model.complex.push(compiled);
                    return Ok(TypeRef::Complex(self.model.complex.len() - 1));
                }
                "simpleType" => {
                    let compiled = self.simple_type(doc, inline, &inner_scope)?;
                    self.model.simple.push(compiled);
                    return Ok(TypeRef::Simple(self.model.simple.len() - 1));
                }
                _ => {}
            }
        }
        Ok(TypeRef::Any)
    }

    fn attribute(
        &mut self,
        doc: &'d SchemaDoc,
        element: &'d Element,
        scope: &Namespaces,
    ) -> Result<AttributeDecl, SifenError> {
        let name = element
            .attr("name")
            .ok_or_else(|| unavailable("xs:attribute without a name"))?;
        let ty = match element.attr("type") {
            Some(ty) => self.resolve_simple(&resolve_qname(scope, ty)?)?,
            None => match content(element).find(|e| e.local_name() == "simpleType") {
                Some(inline) => {
                    let inner_scope = inline.scope(scope);
                    let compiled = self.simple_type(doc, inline, &inner_scope)?;
                    self.model.simple.push(compiled);
                    self.model.simple.len() - 1
                }
                None => self.builtin("string")?,
            },
        };
        Ok(AttributeDecl {
            name: name.to_string(),
            ty,
            required: element.attr("use") == Some("required"),
            fixed: element.attr("fixed").map(str::to_string),
        })
    }
}

fn wildcard(doc: &SchemaDoc, element: &Element) -> Result<Wildcard, SifenError> {
    let namespaces = match element.attr("namespace").unwrap_or("##any") {
        "##any" => NamespaceConstraint::Any,
        "##other" => NamespaceConstraint::Other(doc.target.clone()),
        list => NamespaceConstraint::List(
            list.split_whitespace()
                .map(|token| match token {
                    "##targetNamespace" => doc.target.clone(),
                    "##local" => String::new(),
                    uri => uri.to_string(),
                })
                .collect(),
        ),
    };
    let process = match element.attr("processContents").unwrap_or("strict") {
        "strict" => Process::Strict,
        "lax" => Process::Lax,
        "skip" => Process::Skip,
        other => return Err(unavailable(format!("invalid processContents '{other}'"))),
    };
    Ok(Wildcard {
        namespaces,
        process,
    })
}

fn apply_facet(
    ty: &mut SimpleType,
    facet: &str,
    value: &str,
    enumeration: &mut Vec<String>,
    patterns: &mut Vec<String>,
) -> Result<(), SifenError> {
    let count = || {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| unavailable(format!("invalid xs:{facet} value '{value}'")))
    };
    let number = || {
        Decimal::from_str(value.trim())
            .map_err(|_| unavailable(format!("invalid xs:{facet} value '{value}'")))
    };
    if facet.ends_with("clusive") && !matches!(ty.builtin, Builtin::Decimal | Builtin::Integer { .. }) {
        return Err(unavailable(format!(
            "xs:{facet} is only supported on numeric types"
        )));
    }
    let facets: &mut Facets = &mut ty.facets;
    match facet {
        "enumeration" => enumeration.push(value.to_string()),
        "pattern" => patterns.push(value.to_string()),
        "length" => facets.length = Some(count()?),
        "minLength" => facets.min_length = Some(count()?),
        "maxLength" => facets.max_length = Some(count()?),
        "totalDigits" => facets.total_digits = Some(count()?),
        "fractionDigits" => facets.fraction_digits = Some(count()?),
        "minInclusive" => facets.min_inclusive = Some(number()?),
        "maxInclusive" => facets.max_inclusive = Some(number()?),
        "minExclusive" => facets.min_exclusive = Some(number()?),
        "maxExclusive" => facets.max_exclusive = Some(number()?),
        "whiteSpace" => {}
        other => return Err(unavailable(format!("unsupported facet xs:{other}"))),
    }
    Ok(())
}
