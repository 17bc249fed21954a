use crate::models::Product;
use crate::services::query::{paged_pipeline, split_facet, Pagination};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::ClientOptions,
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl MongoDb {
    /// Builds the client. The driver connects lazily, so an unreachable
    /// server only shows up on the first operation (or [`Self::health_check`]).
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, collection = %collection, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some("catalog-service".to_string());

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);

        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn products(&self) -> Collection<Product> {
        self.db.collection(&self.collection)
    }

    /// Fetches one window of `filter` matches together with the total count.
    pub async fn page(
        &self,
        filter: Document,
        pagination: &Pagination,
    ) -> Result<(Vec<Product>, u64), AppError> {
        let mut cursor = self
            .products()
            .aggregate(paged_pipeline(filter, pagination), None)
            .await
            .map_err(AppError::from)?;

        let facet = cursor
            .try_next()
            .await
            .map_err(AppError::from)?
            .unwrap_or_default();

        Ok(split_facet(facet))
    }

    /// Inserts `product` verbatim and returns the stored `_id`.
    pub async fn insert(&self, product: Product) -> Result<Bson, AppError> {
        let result = self
            .products()
            .insert_one(product, None)
            .await
            .map_err(AppError::from)?;

        Ok(result.inserted_id)
    }

    /// Closes connection pools once in-flight operations have finished.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
