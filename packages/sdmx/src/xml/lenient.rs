//! Tolerant tree building for structurally damaged markup.
//!
//! Used as the last resort of [`Document::parse`](super::Document::parse)
//! once strict parsing has failed on both the original and the repaired text.
//! The quick-xml reader runs with end-name checks disabled: a close tag pops
//! back to the nearest open element of the same name, a close tag with no
//! open counterpart is dropped, and whatever is still open at the end of the
//! input (or at the first unreadable byte) is closed there.

use std::collections::BTreeMap;
use std::rc::Rc;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, SdmxError};

use super::tree::{Document, Element, Namespaces, QName};

/// Deepest element nesting accepted from a service.
///
/// Building and walking the element tree recurses once per level.
pub const MAX_DEPTH: usize = 256;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

type Scope = Rc<BTreeMap<String, String>>;

/// Maximum element nesting of `text`, counted up to the first syntax error.
///
/// # Examples
/// ```
/// use sdmx_rest::xml::nesting_depth;
///
/// assert_eq!(nesting_depth("<a><b><c/></b><b/></a>"), 3);
/// assert_eq!(nesting_depth("<a><b></a></b></a>"), 2);
/// ```
#[must_use]
pub fn nesting_depth(text: &str) -> usize {
    let mut reader = reader(text);
    let mut depth = 0usize;
    let mut deepest = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Ok(Event::Empty(_)) => deepest = deepest.max(depth + 1),
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    deepest
}

/// Reject documents nested beyond [`MAX_DEPTH`].
pub(super) fn check_depth(text: &str) -> Result<()> {
    let depth = nesting_depth(text);
    if depth > MAX_DEPTH {
        return Err(too_deep());
    }
    Ok(())
}

fn too_deep() -> SdmxError {
    SdmxError::MalformedDocument(format!(
        "elements nested deeper than {MAX_DEPTH} levels"
    ))
}

fn reader(text: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

/// An element whose close tag has not been seen yet.
struct Open {
    qname: String,
    name: QName,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
    scope: Scope,
}

impl Open {
    fn start(start: &BytesStart<'_>, parent_scope: &Scope) -> Self {
        let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut declared = Vec::new();
        let mut attributes = Vec::new();
        let mut raw = start.attributes();
        raw.with_checks(false);
        for attribute in raw.flatten() {
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = decode(&attribute.value);
            if key == "xmlns" {
                declared.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push((prefix.to_string(), value));
            } else {
                attributes.push((local_part(&key).to_string(), value));
            }
        }

        let scope = if declared.is_empty() {
            Rc::clone(parent_scope)
        } else {
            let mut scope = (**parent_scope).clone();
            scope.extend(declared);
            Rc::new(scope)
        };

        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", qname.as_str()),
        };
        let name = QName {
            namespace: scope.get(prefix).filter(|uri| !uri.is_empty()).cloned(),
            local: local.to_string(),
        };

        Self {
            qname,
            name,
            attributes,
            text: None,
            children: Vec::new(),
            scope,
        }
    }

    fn push_text(&mut self, text: &str) {
        // Only text before the first child element is kept
        if self.children.is_empty() {
            self.text.get_or_insert_with(String::new).push_str(text);
        }
    }

    fn close(self) -> Element {
        Element::new(self.name, self.attributes, self.text, self.children)
    }
}

/// Builds the tree while tracking open elements.
struct Builder {
    stack: Vec<Open>,
    root: Option<(Element, Scope)>,
    base_scope: Scope,
}

impl Builder {
    fn new() -> Self {
        let base = BTreeMap::from([("xml".to_string(), XML_NAMESPACE.to_string())]);
        Self {
            stack: Vec::new(),
            root: None,
            base_scope: Rc::new(base),
        }
    }

    fn scope(&self) -> &Scope {
        self.stack.last().map_or(&self.base_scope, |open| &open.scope)
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(too_deep());
        }
        let open = Open::start(start, self.scope());
        self.stack.push(open);
        Ok(())
    }

    fn close_named(&mut self, qname: &str) {
        let Some(index) = self.stack.iter().rposition(|open| open.qname == qname) else {
            tracing::debug!(tag = qname, "dropping close tag without open element");
            return;
        };
        while self.stack.len() > index {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let scope = Rc::clone(&open.scope);
        let element = open.close();
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.root = Some((element, scope)),
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(open) = self.stack.last_mut() {
            open.push_text(text);
        }
    }

    fn is_done(&self) -> bool {
        self.root.is_some()
    }

    fn finish(mut self) -> Option<Document> {
        if !self.stack.is_empty() {
            tracing::warn!(
                open = self.stack.len(),
                "closing elements left open at end of input"
            );
        }
        while !self.stack.is_empty() {
            self.close_top();
        }

        let (root, scope) = self.root?;
        let namespaces = Namespaces::from_pairs(
            scope
                .iter()
                .filter(|(prefix, _)| !prefix.is_empty())
                .map(|(prefix, uri)| (prefix.as_str(), uri.as_str())),
        );
        Some(Document::new(root, namespaces))
    }
}

/// Build a document from markup with unclosed, mismatched or truncated tags.
///
/// Returns `Ok(None)` when no root element could be read at all.
pub(super) fn parse_lenient(text: &str) -> Result<Option<Document>> {
    let mut reader = reader(text);
    let mut builder = Builder::new();

    while !builder.is_done() {
        match reader.read_event() {
            Ok(Event::Start(start)) => builder.open(&start)?,
            Ok(Event::Empty(start)) => {
                builder.open(&start)?;
                builder.close_top();
            }
            Ok(Event::End(end)) => {
                builder.close_named(&String::from_utf8_lossy(end.name().as_ref()));
            }
            Ok(Event::Text(text)) => builder.text(&decode(&text)),
            Ok(Event::CData(data)) => builder.text(&String::from_utf8_lossy(&data)),
            Ok(Event::GeneralRef(reference)) => {
                let raw = format!("&{};", String::from_utf8_lossy(&reference));
                builder.text(&decode(raw.as_bytes()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(
                    %error,
                    position = reader.buffer_position(),
                    "stopping at unreadable markup"
                );
                break;
            }
        }
    }

    Ok(builder.finish())
}

/// Resolve entity and character references, keeping the raw text when one is unknown.
fn decode(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match unescape(&raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.into_owned(),
    }
}

fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lenient(text: &str) -> Document {
        parse_lenient(text).unwrap().unwrap()
    }

    #[test]
    fn test_stray_open_tag_is_closed_by_parent() {
        let doc = lenient(
            r#"<s:Code xmlns:s="urn:s" value="Q"><s:Description>Quarterly<br></s:Description></s:Code>"#,
        );
        let description = &doc.root().children()[0];

        assert_eq!(description.local_name(), "Description");
        assert_eq!(description.name().namespace.as_deref(), Some("urn:s"));
        assert_eq!(description.text(), Some("Quarterly"));
        assert_eq!(description.children()[0].local_name(), "br");
        assert_eq!(doc.root().attribute("value"), Some("Q"));
    }

    #[test]
    fn test_unmatched_close_tag_is_dropped() {
        let doc = lenient("<root><a>1</b></a><c/></root>");
        let names: Vec<_> = doc.root().children().iter().map(Element::local_name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(doc.root().children()[0].text(), Some("1"));
    }

    #[test]
    fn test_truncated_input_closes_open_elements() {
        let doc = lenient(r#"<m:R xmlns:m="urn:m"><m:A id="1"/><m:B><m:A id="2"/><m:A i"#);
        assert_eq!(doc.namespaces().get("m"), Some("urn:m"));
        assert_eq!(doc.find_all(".//m:A").unwrap().len(), 2);
    }

    #[test]
    fn test_references_are_resolved() {
        let doc = lenient(r#"<r name="a &amp; b"><t>x &lt; y &#65;<open></r>"#);
        assert_eq!(doc.root().attribute("name"), Some("a & b"));
        assert_eq!(doc.root().children()[0].text(), Some("x < y A"));
    }

    #[test]
    fn test_default_namespace_is_applied_but_not_bound() {
        let doc = lenient(r#"<r xmlns="urn:d" xmlns:p="urn:p"><c><p:x></r>"#);
        assert_eq!(doc.root().name().namespace.as_deref(), Some("urn:d"));
        assert_eq!(doc.namespaces().get(""), None);
        assert_eq!(doc.find_all(".//p:x").unwrap().len(), 1);
    }

    #[test]
    fn test_trailing_content_after_root_is_ignored() {
        let doc = lenient("<a><b/></a><c/>");
        assert_eq!(doc.root().local_name(), "a");
    }

    #[test]
    fn test_no_markup_yields_none() {
        assert!(parse_lenient("plain text").unwrap().is_none());
    }

    #[test]
    fn test_depth_limit() {
        let deep = "<a>".repeat(MAX_DEPTH + 1);
        assert_eq!(nesting_depth(&deep), MAX_DEPTH + 1);
        assert!(matches!(check_depth(&deep), Err(SdmxError::MalformedDocument(_))));
        assert!(matches!(parse_lenient(&deep), Err(SdmxError::MalformedDocument(_))));

        let shallow = "<a>".repeat(MAX_DEPTH);
        assert!(check_depth(&shallow).is_ok());
        assert!(parse_lenient(&shallow).unwrap().is_some());
    }
}
