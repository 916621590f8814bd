//! Schema domain module.
//!
//! Pure translation of the generic parameter schemas an upstream catalog
//! advertises into runtime validation models. No I/O, no state.
//!
//! - `node.rs` - the closed schema-kind tree
//! - `model.rs` - the runtime-checkable validation model
//! - `translator.rs` - the total translation function

mod model;
mod node;
mod translator;

pub use model::{FieldModel, ValidationModel, Violation};
pub use node::{SchemaKind, SchemaNode};
pub use translator::{translate, translate_input_schema};
