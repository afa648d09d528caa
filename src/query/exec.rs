use super::context::CallContext;
use super::options::{describe_sort, resolve};
use super::types::{FilterSet, FindManyModifiers, FindOneModifiers};
use crate::errors::PodError;
use crate::store::Store;
use crate::types::{OptionsBag, ResultDocument};

/// Names of the collections in `db`.
///
/// # Errors
/// `Store` if the listing fails, `Canceled` if `ctx` ends first.
pub async fn list_collections(
    store: &dyn Store,
    ctx: &CallContext,
    db: &str,
) -> Result<Vec<String>, PodError> {
    let names = ctx
        .run(store.list_collection_names(db))
        .await?
        .map_err(|e| PodError::store("trouble when ListCollectionNames", e))?;
    log::debug!("list-collections db={db} count={}", names.len());
    Ok(names)
}

/// The first document matching `filters`. Only the `projection` option is honoured.
///
/// # Errors
/// `NotFound` when nothing matches, `Store` on driver failure, `Canceled` if `ctx` ends first.
pub async fn find_one(
    store: &dyn Store,
    ctx: &CallContext,
    db: &str,
    collection: &str,
    filters: &FilterSet,
    options: Option<&OptionsBag>,
) -> Result<ResultDocument, PodError> {
    let modifiers: FindOneModifiers = resolve(options);
    log::debug!("find-one {db}.{collection} filters={}", filters.len());
    ctx.run(store.find_one(db, collection, filters.to_document(), &modifiers))
        .await?
        .map_err(|e| PodError::store("findOne failed with", e))?
        .ok_or(PodError::NotFound)
}

/// Every document matching `filters`, in cursor order. No match is an empty vector.
///
/// # Errors
/// `Store` when the query or cursor fails, `Canceled` if `ctx` ends first.
pub async fn find_many(
    store: &dyn Store,
    ctx: &CallContext,
    db: &str,
    collection: &str,
    filters: &FilterSet,
    options: Option<&OptionsBag>,
) -> Result<Vec<ResultDocument>, PodError> {
    let modifiers: FindManyModifiers = resolve(options);
    if let Some(sort) = &modifiers.sort {
        log::debug!("find-many {db}.{collection} sort={}", describe_sort(sort));
    }
    let cursor = ctx
        .run(store.find(db, collection, filters.to_document(), &modifiers))
        .await?
        .map_err(|e| PodError::store("findMany failed with", e))?;
    let docs = ctx
        .run(cursor.materialize_all())
        .await?
        .map_err(|e| PodError::store("findMany cursor failed with", e))?;
    log::debug!("find-many {db}.{collection} filters={} results={}", filters.len(), docs.len());
    Ok(docs)
}
