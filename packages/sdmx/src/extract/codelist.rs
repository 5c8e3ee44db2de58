//! Code list and key family extraction.
//!
//! Both artifacts are served as `message:CodeLists` blocks and share one walk:
//! every `structure:CodeList` maps its name to its codes in document order.

use crate::error::Result;
use crate::model::{Code, CodeListMap};
use crate::xml::Document;

use super::Artifact;

/// Code lists (`{base}/CodeList/...`).
#[derive(Debug)]
pub struct CodeLists;

/// Key families (`{base}/KeyFamily/...`), same shape as code lists.
#[derive(Debug)]
pub struct KeyFamilies;

impl Artifact for CodeLists {
    const KIND: &'static str = "CodeList";
    type Output = CodeListMap;

    fn walk(document: &Document) -> Result<CodeListMap> {
        walk_code_lists(document, Self::KIND)
    }
}

impl Artifact for KeyFamilies {
    const KIND: &'static str = "KeyFamily";
    type Output = CodeListMap;

    fn walk(document: &Document) -> Result<CodeListMap> {
        walk_code_lists(document, Self::KIND)
    }
}

fn walk_code_lists(document: &Document, kind: &str) -> Result<CodeListMap> {
    let ns = document.namespaces();
    let mut code_lists = CodeListMap::new();

    for container in document.find_all(".//message:CodeLists")? {
        for list in container.find_all(".//structure:CodeList", ns)? {
            let name = list.required_text("structure:Name", ns, kind)?;
            let context = format!("{kind} {name}");

            let codes = list
                .find_all(".//structure:Code", ns)?
                .into_iter()
                .map(|code| -> Result<Code> {
                    let value = code.required_attribute("value", &context)?;
                    let description =
                        code.required_text("structure:Description", ns, &context)?;
                    Ok(Code::new(value, description))
                })
                .collect::<Result<Vec<_>>>()?;

            code_lists.insert(name.to_string(), codes);
        }
    }

    Ok(code_lists)
}
