//! Concept extraction.
//!
//! Concepts may be listed on their own or inside a `structure:ConceptScheme`.
//! A concept nested in a scheme that omits `agencyID` or `version` takes
//! them from the scheme, which is how SDMX 2.0 scopes maintainable artifacts.

use crate::error::{Result, SdmxError};
use crate::model::{Concept, ConceptMap};
use crate::xml::{Document, Element, Namespaces};

use super::Artifact;

/// Concepts (`{base}/Concept[/{flowRef}/{agency}]`).
#[derive(Debug)]
pub struct Concepts;

/// Maintenance attributes inherited from an enclosing scheme.
#[derive(Clone, Copy, Default)]
struct Scope<'a> {
    agency_id: Option<&'a str>,
    version: Option<&'a str>,
}

impl Artifact for Concepts {
    const KIND: &'static str = "Concept";
    type Output = ConceptMap;

    fn walk(document: &Document) -> Result<ConceptMap> {
        let ns = document.namespaces();
        let structure = ns.resolve("structure")?;
        let mut concepts = ConceptMap::new();

        visit(document.root(), structure, ns, Scope::default(), &mut concepts)?;

        Ok(concepts)
    }
}

/// Recursion depth is bounded by [`MAX_DEPTH`](crate::xml::MAX_DEPTH), enforced at parse time.
fn visit<'a>(
    element: &'a Element,
    structure: &str,
    ns: &Namespaces,
    scope: Scope<'a>,
    concepts: &mut ConceptMap,
) -> Result<()> {
    for child in element.children() {
        let in_structure = child.name().namespace.as_deref() == Some(structure);

        match child.local_name() {
            "Concept" if in_structure => {
                let (id, concept) = read_concept(child, ns, scope)?;
                concepts.insert(id, concept);
            }
            "ConceptScheme" if in_structure => {
                let inner = Scope {
                    agency_id: child.attribute("agencyID").or(scope.agency_id),
                    version: child.attribute("version").or(scope.version),
                };
                visit(child, structure, ns, inner, concepts)?;
            }
            _ => visit(child, structure, ns, scope, concepts)?,
        }
    }
    Ok(())
}

fn read_concept(element: &Element, ns: &Namespaces, scope: Scope<'_>) -> Result<(String, Concept)> {
    let id = element.required_attribute("id", Concepts::KIND)?;
    let context = format!("{} {id}", Concepts::KIND);

    let agency_id = element
        .attribute("agencyID")
        .or(scope.agency_id)
        .ok_or_else(|| SdmxError::missing("@agencyID", &context))?;
    let version = element
        .attribute("version")
        .or(scope.version)
        .ok_or_else(|| SdmxError::missing("@version", &context))?;
    let name = element.required_text("structure:Name", ns, &context)?;

    Ok((
        id.to_string(),
        Concept {
            agency_id: agency_id.to_string(),
            version: version.to_string(),
            name: name.to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn structure(body: &str) -> Document {
        Document::parse(&format!(
            r#"<message:Structure xmlns:message="urn:message" xmlns:structure="urn:structure">
                 <message:Concepts>{body}</message:Concepts>
               </message:Structure>"#
        ))
        .unwrap()
    }

    fn concept(agency: &str, version: &str, name: &str) -> Concept {
        Concept {
            agency_id: agency.to_string(),
            version: version.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_standalone_concepts() {
        let doc = structure(
            r#"<structure:Concept id="FREQ" agencyID="ECB" version="1.0">
                 <structure:Name>Frequency</structure:Name>
               </structure:Concept>
               <structure:Concept id="CURRENCY" agencyID="ECB" version="1.0">
                 <structure:Name>Currency</structure:Name>
               </structure:Concept>"#,
        );
        let concepts = Concepts::walk(&doc).unwrap();

        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts["FREQ"], concept("ECB", "1.0", "Frequency"));
        assert_eq!(concepts["CURRENCY"], concept("ECB", "1.0", "Currency"));
    }

    #[test]
    fn test_concepts_inherit_from_scheme() {
        let doc = structure(
            r#"<structure:ConceptScheme id="ECB_CONCEPTS" agencyID="ECB" version="2.0">
                 <structure:Name>ECB concepts</structure:Name>
                 <structure:Concept id="OBS_STATUS"><structure:Name>Observation status</structure:Name></structure:Concept>
                 <structure:Concept id="TITLE" version="3.1"><structure:Name>Title</structure:Name></structure:Concept>
               </structure:ConceptScheme>"#,
        );
        let concepts = Concepts::walk(&doc).unwrap();

        assert_eq!(concepts["OBS_STATUS"], concept("ECB", "2.0", "Observation status"));
        assert_eq!(concepts["TITLE"], concept("ECB", "3.1", "Title"));
    }

    #[test]
    fn test_missing_agency_fails() {
        let doc = structure(
            r#"<structure:Concept id="FREQ" version="1.0"><structure:Name>Frequency</structure:Name></structure:Concept>"#,
        );
        let err = Concepts::walk(&doc).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: @agencyID in Concept FREQ");
    }

    #[test]
    fn test_other_namespace_is_ignored() {
        let doc = Document::parse(
            r#"<message:Structure xmlns:message="urn:message" xmlns:structure="urn:structure" xmlns:x="urn:x">
                 <x:Concept id="IGNORED"/>
               </message:Structure>"#,
        )
        .unwrap();
        assert!(Concepts::walk(&doc).unwrap().is_empty());
    }
}
