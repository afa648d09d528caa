// Submodules for separation of concerns
mod context;
pub mod eval;
mod exec;
pub mod options;
mod parse;
mod render;
mod types;

// Public API re-exports
pub use context::CallContext;
pub use exec::{find_many, find_one, list_collections};
pub use options::{OptionKey, ResolveOptions, ShapeMismatch, resolve};
pub use parse::{decode_value, json_object_to_document, json_to_bson, parse_filter_json, parse_reference};
pub use render::{render_document, render_documents};
pub use types::{DecodedValue, FilterSet, FilterTuple, FindManyModifiers, FindOneModifiers};
