//! Category scheme extraction.

use crate::error::Result;
use crate::model::{Category, CategorySchemeMap, DataflowRef};
use crate::xml::{Document, Element, Namespaces};

use super::Artifact;

/// Category schemes (`{base}/CategoryScheme[/{flowRef}]`).
#[derive(Debug)]
pub struct CategorySchemes;

impl Artifact for CategorySchemes {
    const KIND: &'static str = "CategoryScheme";
    type Output = CategorySchemeMap;

    /// Nested categories are flattened in document order. Each category
    /// appears once, with only the dataflow references it holds directly;
    /// categories without references are kept with an empty list.
    fn walk(document: &Document) -> Result<CategorySchemeMap> {
        let ns = document.namespaces();
        let mut schemes = CategorySchemeMap::new();

        for container in document.find_all(".//message:CategorySchemes")? {
            for scheme in container.find_all(".//structure:CategoryScheme", ns)? {
                let name = scheme.required_text("structure:Name", ns, Self::KIND)?;
                let context = format!("{} {name}", Self::KIND);

                let categories = scheme
                    .find_all(".//structure:Category", ns)?
                    .into_iter()
                    .map(|category| read_category(category, ns, &context))
                    .collect::<Result<Vec<_>>>()?;

                schemes.insert(name.to_string(), categories);
            }
        }

        Ok(schemes)
    }
}

fn read_category(category: &Element, ns: &Namespaces, scheme: &str) -> Result<Category> {
    let id = category.required_attribute("id", scheme)?;
    let context = format!("{scheme}, category {id}");
    let name = category.required_text("structure:Name", ns, &context)?;

    let dataflows = category
        .find_all("structure:DataflowRef", ns)?
        .into_iter()
        .map(|reference| -> Result<DataflowRef> {
            Ok(DataflowRef {
                agency_id: reference
                    .required_text("structure:AgencyID", ns, &context)?
                    .to_string(),
                version: reference
                    .required_text("structure:Version", ns, &context)?
                    .to_string(),
                dataflow_id: reference
                    .required_text("structure:DataflowID", ns, &context)?
                    .to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Category {
        id: id.to_string(),
        name: name.to_string(),
        dataflows,
    })
}
