//! MongoDB-backed store using the official async driver.

use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::{Client, Collection, Cursor};

use super::{DocumentCursor, Store, StoreResult};
use crate::query::{FindManyModifiers, FindOneModifiers};

#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Connects using a `mongodb://` or `mongodb+srv://` URI. Connections are established lazily
    /// by the driver; call `ping` to verify the server is reachable.
    ///
    /// # Errors
    /// Returns an error if the URI cannot be parsed or resolved.
    pub async fn connect(uri: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn collection(&self, db: &str, collection: &str) -> Collection<Document> {
        self.client.database(db).collection(collection)
    }
}

struct MongoCursor(Cursor<Document>);

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn materialize_all(self: Box<Self>) -> StoreResult<Vec<Document>> {
        Ok(self.0.try_collect().await?)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn list_collection_names(&self, db: &str) -> StoreResult<Vec<String>> {
        Ok(self.client.database(db).list_collection_names().await?)
    }

    async fn find_one(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindOneModifiers,
    ) -> StoreResult<Option<Document>> {
        let mut opts = FindOneOptions::default();
        opts.projection.clone_from(&modifiers.projection);
        Ok(self.collection(db, collection).find_one(filter).with_options(opts).await?)
    }

    async fn find(
        &self,
        db: &str,
        collection: &str,
        filter: Document,
        modifiers: &FindManyModifiers,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        let mut opts = FindOptions::default();
        opts.projection.clone_from(&modifiers.projection);
        opts.sort.clone_from(&modifiers.sort);
        opts.allow_disk_use = modifiers.allow_disk_use;
        opts.limit = modifiers.limit;
        let cursor = self.collection(db, collection).find(filter).with_options(opts).await?;
        Ok(Box::new(MongoCursor(cursor)))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client.database("admin").run_command(doc! {"ping": 1}).await?;
        Ok(())
    }
}
