//! Service description (WSDL) extraction.
//!
//! Lists the XML schemas the SOAP interface imports, which tells a caller
//! which SDMX-ML schema versions the service speaks.

use crate::error::Result;
use crate::model::{SchemaImport, SchemaImportMap};
use crate::xml::Document;

use super::Artifact;

/// Service description (`{base}/services/SDMXQuery?wsdl`).
#[derive(Debug)]
pub struct ServiceDescription;

impl Artifact for ServiceDescription {
    const KIND: &'static str = "ServiceDescription";
    type Output = SchemaImportMap;

    fn walk(document: &Document) -> Result<SchemaImportMap> {
        let ns = document.namespaces();
        let mut imports = SchemaImportMap::new();

        for schema in document.find_all(".//xsd:schema")? {
            for import in schema.find_all(".//xsd:import", ns)? {
                let namespace = import.required_attribute("namespace", "xsd:import")?;
                let schema_location = import.required_attribute(
                    "schemaLocation",
                    &format!("xsd:import {namespace}"),
                )?;

                imports.insert(
                    namespace.to_string(),
                    SchemaImport {
                        namespace: namespace.to_string(),
                        schema_location: schema_location.to_string(),
                    },
                );
            }
        }

        Ok(imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WSDL: &str = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <wsdl:types>
    <xsd:schema targetNamespace="http://www.ecb.int/services/SDMXQuery">
      <xsd:import namespace="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/message"
                  schemaLocation="http://sdw-ws.ecb.europa.eu/schemas/SDMXMessage.xsd"/>
      <xsd:import namespace="http://www.SDMX.org/resources/SDMXML/schemas/v2_0/query"
                  schemaLocation="http://sdw-ws.ecb.europa.eu/schemas/SDMXQuery.xsd"/>
    </xsd:schema>
  </wsdl:types>
</wsdl:definitions>"#;

    #[test]
    fn test_schema_imports() {
        let doc = Document::parse(WSDL).unwrap();
        let imports = ServiceDescription::walk(&doc).unwrap();

        assert_eq!(imports.len(), 2);
        let message = &imports["http://www.SDMX.org/resources/SDMXML/schemas/v2_0/message"];
        assert_eq!(
            message.schema_location,
            "http://sdw-ws.ecb.europa.eu/schemas/SDMXMessage.xsd"
        );
    }

    #[test]
    fn test_import_without_location_fails() {
        let xml = WSDL.replace(
            r#"schemaLocation="http://sdw-ws.ecb.europa.eu/schemas/SDMXQuery.xsd""#,
            "",
        );
        let doc = Document::parse(&xml).unwrap();
        assert!(ServiceDescription::walk(&doc).is_err());
    }
}
