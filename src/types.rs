pub type DatabaseName = String;
pub type CollectionName = String;

/// A document as returned by the store. Treated opaquely by the query layer.
pub type ResultDocument = bson::Document;

/// Loosely-typed options supplied by the caller, keyed by option name.
pub type OptionsBag = serde_json::Map<String, serde_json::Value>;
