//! Owned, namespace-aware element tree.
//!
//! Parsing goes through roxmltree; the borrowed roxmltree nodes are copied
//! into [`Element`]s so that a [`Document`] can outlive the response text
//! and be kept inside cached extractors. Markup roxmltree rejects even after
//! repair is rebuilt by the lenient reader in [`super::lenient`].

use std::collections::{BTreeMap, HashSet};

use roxmltree::{Node, ParsingOptions};

use crate::error::{Result, SdmxError};

use super::lenient::{check_depth, parse_lenient};
use super::path::{Axis, Path, ResolvedStep};
use super::recover::repair;

/// Namespace bindings (prefix → URI) declared on a document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

impl Namespaces {
    /// Build bindings from `(prefix, uri)` pairs.
    pub fn from_pairs<P, U>(pairs: impl IntoIterator<Item = (P, U)>) -> Self
    where
        P: Into<String>,
        U: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(prefix, uri)| (prefix.into(), uri.into()))
                .collect(),
        )
    }

    /// Namespace URI bound to `prefix`, if any.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    /// Namespace URI bound to `prefix`.
    ///
    /// # Errors
    /// [`SdmxError::UnboundPrefix`] when the document does not declare it.
    pub fn resolve(&self, prefix: &str) -> Result<&str> {
        self.get(prefix)
            .ok_or_else(|| SdmxError::UnboundPrefix(prefix.to_string()))
    }

    /// Iterate over `(prefix, uri)` bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Expanded element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

/// An XML element with its attributes, leading text and element children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: QName,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub(super) fn new(
        name: QName,
        attributes: Vec<(String, String)>,
        text: Option<String>,
        children: Vec<Element>,
    ) -> Self {
        Self {
            name,
            attributes,
            text,
            children,
        }
    }

    fn from_node(node: Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        Self {
            name: QName {
                namespace: tag.namespace().map(str::to_string),
                local: tag.name().to_string(),
            },
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: node.text().map(str::to_string),
            children: node
                .children()
                .filter(Node::is_element)
                .map(Self::from_node)
                .collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Tag name without namespace.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// Attribute value by (unqualified) name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Leading text content, trimmed. `None` when absent or blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Element children in document order.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Evaluate a path relative to this element.
    ///
    /// # Examples
    /// ```
    /// use sdmx_rest::xml::Document;
    ///
    /// let doc = Document::parse(
    ///     r#"<m:Root xmlns:m="urn:m"><m:A id="1"/><m:B><m:A id="2"/></m:B></m:Root>"#,
    /// ).unwrap();
    /// let found = doc.root().find_all(".//m:A", doc.namespaces()).unwrap();
    /// assert_eq!(found.len(), 2);
    /// let direct = doc.root().find_all("m:A", doc.namespaces()).unwrap();
    /// assert_eq!(direct.len(), 1);
    /// ```
    pub fn find_all<'a>(&'a self, path: &str, namespaces: &Namespaces) -> Result<Vec<&'a Element>> {
        let path = Path::parse(path)?;
        let steps = path.resolve(namespaces)?;

        let mut current: Vec<&Element> = vec![self];
        for step in &steps {
            let mut next = Vec::new();
            let mut seen: HashSet<*const Element> = HashSet::new();
            for context in &current {
                match step.axis {
                    Axis::Child => {
                        next.extend(context.children.iter().filter(|c| matches_step(c, step)));
                    }
                    Axis::Descendant => {
                        for found in context.descendants().filter(|c| matches_step(c, step)) {
                            if seen.insert(std::ptr::from_ref(found)) {
                                next.push(found);
                            }
                        }
                    }
                }
            }
            current = next;
        }

        Ok(current)
    }

    /// First element matching a path, if any.
    pub fn find_first<'a>(
        &'a self,
        path: &str,
        namespaces: &Namespaces,
    ) -> Result<Option<&'a Element>> {
        Ok(self.find_all(path, namespaces)?.into_iter().next())
    }

    /// Attribute that must be present.
    ///
    /// # Errors
    /// [`SdmxError::MissingField`] naming `@name` and `context`.
    pub fn required_attribute(&self, name: &str, context: &str) -> Result<&str> {
        self.attribute(name)
            .ok_or_else(|| SdmxError::missing(format!("@{name}"), context))
    }

    /// Element at `path` that must be present.
    pub fn required<'a>(
        &'a self,
        path: &str,
        namespaces: &Namespaces,
        context: &str,
    ) -> Result<&'a Element> {
        self.find_first(path, namespaces)?
            .ok_or_else(|| SdmxError::missing(path, context))
    }

    /// Text of the element at `path`, which must be present.
    ///
    /// A present but empty element yields an empty string.
    pub fn required_text<'a>(
        &'a self,
        path: &str,
        namespaces: &Namespaces,
        context: &str,
    ) -> Result<&'a str> {
        Ok(self
            .required(path, namespaces, context)?
            .text()
            .unwrap_or_default())
    }
}

fn matches_step(element: &Element, step: &ResolvedStep<'_>) -> bool {
    if element.name.local != step.local {
        return false;
    }
    if let Some(namespace) = step.namespace {
        if element.name.namespace.as_deref() != Some(namespace) {
            return false;
        }
    }
    match step.predicate {
        Some((name, value)) => element.attribute(name) == Some(value),
        None => true,
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// A parsed XML document together with its root namespace bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
    namespaces: Namespaces,
}

impl Document {
    pub(super) fn new(root: Element, namespaces: Namespaces) -> Self {
        Self { root, namespaces }
    }

    /// Parse XML text, recovering from markup that strict parsing rejects.
    ///
    /// Strict parsing is tried first, then again on the [`repair`]ed text,
    /// and finally the repaired text is rebuilt leniently, closing unclosed
    /// and truncated elements. Documents nested deeper than
    /// [`MAX_DEPTH`](super::MAX_DEPTH) are rejected before any tree is built.
    ///
    /// # Errors
    /// [`SdmxError::MalformedDocument`] when the text holds no markup or is
    /// nested too deeply; the first strict parse error when not even a root
    /// element can be read.
    pub fn parse(text: &str) -> Result<Self> {
        let repaired = repair(text);
        check_depth(&repaired)?;

        let first = match parse_strict(text) {
            Ok(doc) => return Ok(doc),
            Err(first) => first,
        };
        if repaired.trim().is_empty() {
            return Err(SdmxError::MalformedDocument(
                "document contains no markup".to_string(),
            ));
        }

        tracing::warn!(error = %first, "XML is not well-formed, retrying with recovery");
        match parse_strict(&repaired) {
            Ok(doc) => Ok(doc),
            Err(second) => {
                tracing::warn!(error = %second, "rebuilding damaged XML structure");
                parse_lenient(&repaired)?.ok_or(first)
            }
        }
    }

    /// Root element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Namespace bindings declared on the root element.
    #[must_use]
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Evaluate a path relative to the root element with the root's bindings.
    pub fn find_all(&self, path: &str) -> Result<Vec<&Element>> {
        self.root.find_all(path, &self.namespaces)
    }
}

fn parse_strict(text: &str) -> Result<Document> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;
    let root = doc.root_element();

    let namespaces = Namespaces::from_pairs(
        root.namespaces()
            .filter_map(|ns| ns.name().map(|prefix| (prefix, ns.uri()))),
    );

    Ok(Document {
        root: Element::from_node(root),
        namespaces,
    })
}
