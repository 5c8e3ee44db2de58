//! A small element path language for walking SDMX documents.
//!
//! Supported syntax is the subset needed to address SDMX-ML nodes:
//!
//! - steps separated by `/` (child axis) or `//` (descendant axis)
//! - a leading `./` or `.//` (relative to the context element)
//! - `prefix:Local` or bare `Local` names (bare names match any namespace)
//! - one `[@attribute='value']` predicate per step
//!
//! Prefixes are resolved against the document's own [`Namespaces`].

use crate::error::{Result, SdmxError};

use super::tree::Namespaces;

/// Axis a step is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

/// One parsed path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub prefix: Option<String>,
    pub local: String,
    pub predicate: Option<(String, String)>,
}

/// A parsed element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    steps: Vec<Step>,
}

/// A step whose prefix has been resolved to a namespace URI.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedStep<'p> {
    pub axis: Axis,
    /// `None` matches elements in any namespace.
    pub namespace: Option<&'p str>,
    pub local: &'p str,
    pub predicate: Option<(&'p str, &'p str)>,
}

impl Path {
    /// Parse a path expression.
    ///
    /// # Examples
    /// ```
    /// use sdmx_rest::xml::{Axis, Path};
    ///
    /// let path = Path::parse(".//structure:CodeList/structure:Name").unwrap();
    /// assert_eq!(path.steps().len(), 2);
    /// assert_eq!(path.steps()[0].axis, Axis::Descendant);
    /// assert_eq!(path.steps()[1].axis, Axis::Child);
    /// ```
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = || SdmxError::InvalidPath(expr.to_string());

        let (mut axis, rest) = if let Some(rest) = expr.strip_prefix(".//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = expr.strip_prefix("//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = expr.strip_prefix("./") {
            (Axis::Child, rest)
        } else {
            (Axis::Child, expr)
        };

        let mut steps = Vec::new();
        for segment in split_segments(rest).ok_or_else(invalid)? {
            if segment.is_empty() {
                // `a//b`: the empty segment turns the next step into a descendant step
                if axis == Axis::Descendant {
                    return Err(invalid());
                }
                axis = Axis::Descendant;
                continue;
            }
            steps.push(parse_step(segment, axis).ok_or_else(invalid)?);
            axis = Axis::Child;
        }

        if steps.is_empty() || axis == Axis::Descendant {
            return Err(invalid());
        }

        Ok(Self { steps })
    }

    /// The parsed steps, in evaluation order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolve every prefix against the given bindings.
    pub(crate) fn resolve<'p>(
        &'p self,
        namespaces: &'p Namespaces,
    ) -> Result<Vec<ResolvedStep<'p>>> {
        self.steps
            .iter()
            .map(|step| -> Result<ResolvedStep<'p>> {
                let namespace = match &step.prefix {
                    Some(prefix) => Some(namespaces.resolve(prefix)?),
                    None => None,
                };
                Ok(ResolvedStep {
                    axis: step.axis,
                    namespace,
                    local: &step.local,
                    predicate: step
                        .predicate
                        .as_ref()
                        .map(|(name, value)| (name.as_str(), value.as_str())),
                })
            })
            .collect()
    }
}

/// Split on `/` outside of `[...]` predicates.
fn split_segments(expr: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in expr.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            '/' if depth == 0 => {
                segments.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    segments.push(&expr[start..]);
    Some(segments)
}

fn parse_step(segment: &str, axis: Axis) -> Option<Step> {
    let (name, predicate) = match segment.find('[') {
        Some(open) => {
            let inner = segment[open..].strip_prefix('[')?.strip_suffix(']')?;
            (&segment[..open], Some(parse_predicate(inner)?))
        }
        None => (segment, None),
    };

    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    };

    if !is_name(local) || prefix.is_some_and(|p| !is_name(p)) {
        return None;
    }

    Some(Step {
        axis,
        prefix: prefix.map(str::to_string),
        local: local.to_string(),
        predicate,
    })
}

/// Parse `@name='value'` (single or double quotes).
fn parse_predicate(inner: &str) -> Option<(String, String)> {
    let (name, value) = inner.trim().strip_prefix('@')?.split_once('=')?;
    let name = name.trim();
    let value = value.trim();

    let unquoted = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))?;

    if !is_name(name) {
        return None;
    }
    Some((name.to_string(), unquoted.to_string()))
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
