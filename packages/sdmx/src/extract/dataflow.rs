//! Dataflow extraction.

use crate::error::Result;
use crate::model::{Dataflow, DataflowMap};
use crate::xml::Document;

use super::Artifact;

/// Dataflows (`{base}/Dataflow[/{id}]`).
#[derive(Debug)]
pub struct Dataflows;

impl Artifact for Dataflows {
    const KIND: &'static str = "Dataflow";
    type Output = DataflowMap;

    /// Every `structure:Dataflow` becomes one record keyed by its `id`.
    fn walk(document: &Document) -> Result<DataflowMap> {
        let ns = document.namespaces();
        let mut dataflows = DataflowMap::new();

        for dataflow in document.find_all(".//structure:Dataflow")? {
            let id = dataflow.required_attribute("id", Self::KIND)?;
            let context = format!("{} {id}", Self::KIND);

            let key_family_ref = dataflow.required(".//structure:KeyFamilyRef", ns, &context)?;
            let category_ref = dataflow.required(".//structure:CategoryRef", ns, &context)?;

            let record = Dataflow {
                agency_id: dataflow.required_attribute("agencyID", &context)?.to_string(),
                version: dataflow.required_attribute("version", &context)?.to_string(),
                name: dataflow
                    .required_text("structure:Name", ns, &context)?
                    .to_string(),
                key_family_id: key_family_ref
                    .required_text("structure:KeyFamilyID", ns, &context)?
                    .to_string(),
                key_family_agency_id: key_family_ref
                    .required_text("structure:KeyFamilyAgencyID", ns, &context)?
                    .to_string(),
                category_scheme_id: category_ref
                    .required_text("structure:CategorySchemeID", ns, &context)?
                    .to_string(),
                category_id: category_ref
                    .required_text(".//structure:ID", ns, &context)?
                    .to_string(),
            };

            dataflows.insert(id.to_string(), record);
        }

        Ok(dataflows)
    }
}
