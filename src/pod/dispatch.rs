//! Adapter between positional JSON arguments and the query operations.

use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;
use std::sync::Arc;

use super::describe::{DEFAULT_NAMESPACE, DescribeResponse};
use crate::errors::PodError;
use crate::query::{self, CallContext, FilterSet, render_document, render_documents};
use crate::store::Store;
use crate::types::{CollectionName, DatabaseName, OptionsBag};

/// Serves the pod operations against a shared store.
#[derive(Clone)]
pub struct MongoPod {
    store: Arc<dyn Store>,
    namespace: String,
}

impl MongoPod {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, namespace: DEFAULT_NAMESPACE.to_string() }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn describe(&self) -> DescribeResponse {
        DescribeResponse::for_namespace(&self.namespace)
    }

    /// Invokes `var` (bare or namespace-qualified) with positional arguments.
    ///
    /// # Errors
    /// Any `PodError`; `UnknownOperation` when `var` is not served.
    pub async fn invoke(
        &self,
        ctx: &CallContext,
        var: &str,
        args: &[Box<RawValue>],
    ) -> Result<Value, PodError> {
        let name = match var.split_once('/') {
            Some((ns, name)) if ns == self.namespace => name,
            Some(_) => return Err(PodError::UnknownOperation(var.to_string())),
            None => var,
        };
        let store = self.store.as_ref();
        match name {
            "list-collections" => {
                expect_arity(name, args, &[1])?;
                let db: DatabaseName = decode_arg(args, 0, "database name")?;
                let names = query::list_collections(store, ctx, &db).await?;
                Ok(Value::from(names))
            }
            "find-one" => {
                let call = FindCall::decode(name, args)?;
                let doc = query::find_one(
                    store,
                    ctx,
                    &call.db,
                    &call.collection,
                    &call.filters,
                    call.options.as_ref(),
                )
                .await?;
                Ok(render_document(doc))
            }
            "find-many" => {
                let call = FindCall::decode(name, args)?;
                let docs = query::find_many(
                    store,
                    ctx,
                    &call.db,
                    &call.collection,
                    &call.filters,
                    call.options.as_ref(),
                )
                .await?;
                Ok(render_documents(docs))
            }
            _ => Err(PodError::UnknownOperation(var.to_string())),
        }
    }
}

impl std::fmt::Debug for MongoPod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoPod").field("namespace", &self.namespace).finish_non_exhaustive()
    }
}

// Decoded arguments shared by find-one and find-many.
struct FindCall {
    db: DatabaseName,
    collection: CollectionName,
    filters: FilterSet,
    options: Option<OptionsBag>,
}

impl FindCall {
    // 3 arguments: no options; 4 arguments: the last is the options bag (null means none).
    fn decode(op: &str, args: &[Box<RawValue>]) -> Result<Self, PodError> {
        expect_arity(op, args, &[3, 4])?;
        let options = if args.len() == 4 { decode_arg(args, 3, "options")? } else { None };
        Ok(Self {
            db: decode_arg(args, 0, "database name")?,
            collection: decode_arg(args, 1, "collection name")?,
            filters: decode_arg(args, 2, "filters")?,
            options,
        })
    }
}

fn expect_arity(op: &str, args: &[Box<RawValue>], allowed: &[usize]) -> Result<(), PodError> {
    if allowed.contains(&args.len()) {
        return Ok(());
    }
    let expected = allowed.iter().map(ToString::to_string).collect::<Vec<_>>().join(" or ");
    Err(PodError::Argument(format!("{op} expects {expected} arguments but got {}", args.len())))
}

fn decode_arg<T: DeserializeOwned>(
    args: &[Box<RawValue>],
    idx: usize,
    what: &str,
) -> Result<T, PodError> {
    let raw = args
        .get(idx)
        .ok_or_else(|| PodError::Argument(format!("missing argument {idx} ({what})")))?;
    serde_json::from_str(raw.get()).map_err(|e| PodError::Decode(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn raw(v: &str) -> Box<RawValue> {
        RawValue::from_string(v.to_string()).unwrap()
    }

    #[tokio::test]
    async fn qualified_and_bare_names_resolve() {
        let store = MemoryStore::new();
        store.create_collection("app", "people");
        let pod = MongoPod::new(Arc::new(store)).with_namespace("ns");
        let ctx = CallContext::background();
        let args = vec![raw("\"app\"")];
        assert_eq!(pod.invoke(&ctx, "ns/list-collections", &args).await.unwrap(), serde_json::json!(["people"]));
        assert_eq!(pod.invoke(&ctx, "list-collections", &args).await.unwrap(), serde_json::json!(["people"]));
        let e = pod.invoke(&ctx, "other/list-collections", &args).await.unwrap_err();
        assert!(matches!(e, PodError::UnknownOperation(_)));
        let e = pod.invoke(&ctx, "drop-database", &args).await.unwrap_err();
        assert!(matches!(e, PodError::UnknownOperation(_)));
    }

    #[tokio::test]
    async fn default_namespace_qualifies_vars() {
        let store = MemoryStore::new();
        store.create_collection("app", "people");
        let pod = MongoPod::new(Arc::new(store));
        let v = pod
            .invoke(&CallContext::background(), "netpod.jlabath.mongo/list-collections", &[raw("\"app\"")])
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!(["people"]));
    }

    #[tokio::test]
    async fn wrong_arity_is_rejected_before_decoding() {
        let pod = MongoPod::new(Arc::new(MemoryStore::new()));
        let ctx = CallContext::background();
        let e = pod.invoke(&ctx, "list-collections", &[]).await.unwrap_err();
        assert!(matches!(e, PodError::Argument(_)));
        let e = pod.invoke(&ctx, "find-one", &[raw("1"), raw("2")]).await.unwrap_err();
        assert_eq!(e.to_string(), "Argument error: find-one expects 3 or 4 arguments but got 2");
    }

    #[tokio::test]
    async fn bad_argument_types_are_decode_errors() {
        let pod = MongoPod::new(Arc::new(MemoryStore::new()));
        let ctx = CallContext::background();
        let e = pod.invoke(&ctx, "find-many", &[raw("1"), raw("\"c\""), raw("[]")]).await.unwrap_err();
        assert!(matches!(e, PodError::Decode(ref m) if m.starts_with("database name")));
        let args = [raw("\"d\""), raw("\"c\""), raw("[]"), raw("[1]")];
        let e = pod.invoke(&ctx, "find-many", &args).await.unwrap_err();
        assert!(matches!(e, PodError::Decode(ref m) if m.starts_with("options")));
    }

    #[tokio::test]
    async fn null_options_mean_none() {
        let store = MemoryStore::new();
        store.insert_many("d", "c", vec![bson::doc! {"a": 1}]);
        let pod = MongoPod::new(Arc::new(store));
        let args = [raw("\"d\""), raw("\"c\""), raw("[]"), raw("null")];
        let v = pod.invoke(&CallContext::background(), "find-many", &args).await.unwrap();
        assert_eq!(v, serde_json::json!([{"a": 1}]));
    }
}
