//! Read-only MongoDB operations for callers that speak loosely-typed JSON.
//!
//! Positional JSON arguments are decoded into ordered BSON filters (inferring object references
//! from `{"ObjectId": "<hex>"}` wrappers) and typed query modifiers, executed against a [`Store`],
//! and rendered back as JSON.
//!
//! ```
//! use mongopod::query::{self, CallContext};
//! use mongopod::store::MemoryStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! store.insert_many("app", "people", vec![bson::doc! {"name": "alice"}]);
//! let filters = query::parse_filter_json(r#"[["name", "alice"]]"#).unwrap();
//! let doc = query::find_one(&store, &CallContext::background(), "app", "people", &filters, None)
//!     .await
//!     .unwrap();
//! assert_eq!(doc.get_str("name").unwrap(), "alice");
//! # });
//! ```

pub mod config;
pub mod errors;
pub mod logger;
pub mod pod;
pub mod query;
pub mod store;
pub mod types;

pub use errors::{ErrorKind, PodError};
pub use pod::MongoPod;
pub use store::{Store, StoreError};

include!(concat!(env!("OUT_DIR"), "/compiled_features.rs"));
