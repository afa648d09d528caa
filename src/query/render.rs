use bson::{Bson, Document};
use serde_json::Value;

/// Renders a result document as relaxed Extended JSON. Object references become
/// `{"$oid": "<hex>"}`, which the filter decoder accepts back as a reference.
#[must_use]
pub fn render_document(doc: Document) -> Value {
    Bson::Document(doc).into_relaxed_extjson()
}

#[must_use]
pub fn render_documents(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(render_document).collect())
}
