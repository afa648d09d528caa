//! In-memory store: databases of collections of BSON documents.

use async_trait::async_trait;
use bson::Document;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{DocumentCursor, Store, StoreResult};
use crate::query::eval::{compare_docs, matches_filter, project};
use crate::query::{FindManyModifiers, FindOneModifiers};

type Collections = BTreeMap<String, Vec<Document>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: RwLock<BTreeMap<String, Collections>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every store call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn create_collection(&self, db: &str, collection: &str) {
        self.databases
            .write()
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
    }

    /// Appends documents in insertion order, creating the collection if needed.
    pub fn insert_many(&self, db: &str, collection: &str, docs: impl IntoIterator<Item = Document>) {
        self.databases
            .write()
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    async fn simulate_latency(&self) {
        if let Some(d) = self.latency {
            tokio::time::sleep(d).await;
        }
    }

    fn matching(&self, db: &str, collection: &str, filter: &Document) -> Vec<Document> {
        let guard = self.databases.read();
        guard
            .get(db)
            .and_then(|cols| cols.get(collection))
            .map(|docs| docs.iter().filter(|d| matches_filter(d, filter)).cloned().collect())
            .unwrap_or_default()
    }
}

struct MemoryCursor {
    docs: Vec<Document>,
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn materialize_all(self: Box<Self>) -> StoreResult<Vec<Document>> {
        Ok(self.docs)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_collection_names(&self, db: &str) -> StoreResult<Vec<String>> {
        self.simulate_latency().await;
        Ok(self.databases.read().get(db).map(|cols| cols.keys().cloned().collect()).unwrap_or_default())
    }

    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindOneModifiers,
    ) -> StoreResult<Option<Document>> {
        self.simulate_latency().await;
        let first = self.matching(db, collection, &filter).into_iter().next();
        Ok(match (&modifiers.projection, first) {
            (Some(p), Some(d)) => Some(project(&d, p)),
            (_, d) => d,
        })
    }

    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindManyModifiers,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        self.simulate_latency().await;
        let mut docs = self.matching(db, collection, &filter);
        if let Some(sort) = &modifiers.sort {
            docs.sort_by(|a, b| compare_docs(a, b, sort));
        }
        // 0 means no limit; a negative limit behaves like its absolute value
        if let Some(limit) = modifiers.limit.filter(|l| *l != 0) {
            docs.truncate(usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX));
        }
        if let Some(p) = &modifiers.projection {
            docs = docs.iter().map(|d| project(d, p)).collect();
        }
        Ok(Box::new(MemoryCursor { docs }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_many(
            "app",
            "people",
            vec![
                doc! {"name": "alice", "age": 30},
                doc! {"name": "bob", "age": 40},
                doc! {"name": "carol", "age": 35},
            ],
        );
        store.create_collection("app", "empty");
        store
    }

    #[tokio::test]
    async fn lists_collections_in_name_order() {
        let store = seeded();
        assert_eq!(store.list_collection_names("app").await.unwrap(), vec!["empty", "people"]);
        assert!(store.list_collection_names("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_sorts_limits_and_projects() {
        let store = seeded();
        let m = FindManyModifiers {
            sort: Some(doc! {"age": -1}),
            limit: Some(-2),
            projection: Some(doc! {"name": 1}),
            allow_disk_use: Some(true),
        };
        let docs = store.find("app", "people", doc! {}, &m).await.unwrap().materialize_all().await.unwrap();
        assert_eq!(docs, vec![doc! {"name": "bob"}, doc! {"name": "carol"}]);
    }

    #[tokio::test]
    async fn find_one_returns_first_in_insertion_order() {
        let store = seeded();
        let d = store.find_one("app", "people", doc! {}, &FindOneModifiers::default()).await.unwrap();
        assert_eq!(d.unwrap().get_str("name").unwrap(), "alice");
        let none = store
            .find_one("app", "people", doc! {"name": "zed"}, &FindOneModifiers::default())
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
