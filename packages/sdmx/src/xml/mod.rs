//! XML document model used by the extractors.
//!
//! - [`tree`]: owned element tree and namespace bindings
//! - [`path`]: element path expressions
//! - [`recover`]: best-effort repair of malformed markup
//! - [`lenient`]: tree building for structurally damaged markup

pub mod lenient;
pub mod path;
pub mod recover;
pub mod tree;

pub use lenient::{nesting_depth, MAX_DEPTH};
pub use path::{Axis, Path, Step};
pub use recover::repair;
pub use tree::{Descendants, Document, Element, Namespaces, QName};
