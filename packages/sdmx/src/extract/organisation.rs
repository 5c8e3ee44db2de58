//! Organisation scheme extraction.

use crate::error::Result;
use crate::model::{Agency, OrganisationSchemeMap};
use crate::xml::Document;

use super::Artifact;

/// Organisation schemes (`{base}/OrganisationScheme`).
#[derive(Debug)]
pub struct OrganisationSchemes;

impl Artifact for OrganisationSchemes {
    const KIND: &'static str = "OrganisationScheme";
    type Output = OrganisationSchemeMap;

    fn walk(document: &Document) -> Result<OrganisationSchemeMap> {
        let ns = document.namespaces();
        let mut schemes = OrganisationSchemeMap::new();

        for container in document.find_all(".//message:OrganisationSchemes")? {
            for scheme in container.find_all(".//structure:OrganisationScheme", ns)? {
                let name = scheme.required_text("structure:Name", ns, Self::KIND)?;
                let context = format!("{} {name}", Self::KIND);

                let agencies = scheme
                    .find_all(".//structure:Agency", ns)?
                    .into_iter()
                    .map(|agency| -> Result<Agency> {
                        let id = agency.required_attribute("id", &context)?;
                        let name = agency.required_text(
                            "structure:Name",
                            ns,
                            &format!("{context}, agency {id}"),
                        )?;
                        Ok(Agency::new(id, name))
                    })
                    .collect::<Result<Vec<_>>>()?;

                schemes.insert(name.to_string(), agencies);
            }
        }

        Ok(schemes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMES: &str = r#"<message:Structure xmlns:message="urn:message" xmlns:structure="urn:structure">
  <message:OrganisationSchemes>
    <structure:OrganisationScheme id="AGENCIES" agencyID="SDMX" version="1.0">
      <structure:Name>SDMX Agency Scheme</structure:Name>
      <structure:Agencies>
        <structure:Agency id="ECB"><structure:Name>European Central Bank</structure:Name></structure:Agency>
        <structure:Agency id="BIS"><structure:Name>Bank for International Settlements</structure:Name></structure:Agency>
      </structure:Agencies>
    </structure:OrganisationScheme>
  </message:OrganisationSchemes>
</message:Structure>"#;

    #[test]
    fn test_organisation_scheme() {
        let doc = Document::parse(SCHEMES).unwrap();
        let schemes = OrganisationSchemes::walk(&doc).unwrap();

        assert_eq!(
            schemes["SDMX Agency Scheme"],
            vec![
                Agency::new("ECB", "European Central Bank"),
                Agency::new("BIS", "Bank for International Settlements"),
            ]
        );
    }

    #[test]
    fn test_agency_without_name_fails() {
        let xml = SCHEMES.replace(
            "<structure:Name>Bank for International Settlements</structure:Name>",
            "",
        );
        let doc = Document::parse(&xml).unwrap();
        let err = OrganisationSchemes::walk(&doc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required field: structure:Name in OrganisationScheme SDMX Agency Scheme, agency BIS"
        );
    }
}
