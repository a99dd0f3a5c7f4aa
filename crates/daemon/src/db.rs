use std::marker::PhantomData;
use std::path::Path;

use async_trait::async_trait;
use bark_core::store::{Document, DocumentStore};
use bark_core::{Error, Result};
use serde::{Deserialize, Serialize};
use surrealdb::{
    engine::any::{connect, Any},
    Surreal,
};
use tracing::debug;

/// Database wrapper for SurrealDB.
#[derive(Clone)]
pub struct Db {
    inner: Surreal<Any>,
}

impl Db {
    /// Connects to `endpoint`; the Any engine picks the backend by scheme
    /// (`surrealkv://`, `mem://`, ...).
    pub async fn connect(endpoint: &str) -> anyhow::Result<Self> {
        if let Some(dir) = endpoint.strip_prefix("surrealkv://") {
            tokio::fs::create_dir_all(Path::new(dir)).await?;
        }
        let db = connect(endpoint).await?;
        db.use_ns("bark").use_db("bark").await?;
        debug!(endpoint, "database connected");
        Ok(Self { inner: db })
    }

    /// Document store for `T`, kept in the table named by `T::KIND`.
    pub fn store<T: Document>(&self) -> SurrealStore<T> {
        SurrealStore {
            db: self.inner.clone(),
            _doc: PhantomData,
        }
    }
}

// Documents carry their own `id` field, which SurrealDB reserves for the
// record ID, so they are nested one level down.
#[derive(Serialize, Deserialize)]
struct Record<T> {
    document: T,
}

/// [`DocumentStore`] backed by a SurrealDB table.
pub struct SurrealStore<T> {
    db: Surreal<Any>,
    _doc: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Document> DocumentStore<T> for SurrealStore<T> {
    async fn get(&self, id: &str) -> Result<T> {
        let record: Option<Record<T>> = self
            .db
            .select((T::KIND, id.to_string()))
            .await
            .map_err(Error::store)?;
        record
            .map(|r| r.document)
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }

    async fn put(&self, doc: &T) -> Result<()> {
        let _: Option<Record<T>> = self
            .db
            .upsert((T::KIND, doc.id().to_string()))
            .content(Record {
                document: doc.clone(),
            })
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let removed: Option<Record<T>> = self
            .db
            .delete((T::KIND, id.to_string()))
            .await
            .map_err(Error::store)?;
        removed
            .map(|_| ())
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }
}
