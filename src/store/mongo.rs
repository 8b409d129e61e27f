//! MongoDB-backed product store

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Cursor, Database};
use tracing::debug;

use crate::config::StoreConfig;

use super::{Product, ProductStore, StoreConnector, StoreError, StoreHandle};

const APP_NAME: &str = "catalogue";

/// Connects to MongoDB or a DocumentDB-compatible cluster
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoConnector;

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self, config: &StoreConfig) -> Result<StoreHandle, StoreError> {
        debug!("Connecting to {}", config.redacted_url());

        let mut options = ClientOptions::parse(config.url.as_str())
            .await
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        options.app_name = Some(APP_NAME.to_string());

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connect(e.to_string()))?;
        let store = MongoStore::new(&client, &config.database, &config.collection);

        // The driver connects lazily; only a server round-trip proves the link.
        store.ping().await.map_err(|e| match e {
            StoreError::Query(message) => StoreError::Connect(message),
            other => other,
        })?;

        Ok(Arc::new(store))
    }
}

/// Product collection in a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        let database = client.database(database);
        let collection = database.collection::<Document>(collection);
        Self {
            database,
            collection,
        }
    }
}

fn query_error(e: mongodb::error::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn to_json(document: Document) -> Product {
    bson_to_json(Bson::Document(document))
}

/// Relaxed extended JSON, except object ids become hex strings and dates
/// become RFC 3339 strings.
fn bson_to_json(value: Bson) -> serde_json::Value {
    match value {
        Bson::ObjectId(id) => serde_json::Value::String(id.to_hex()),
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(formatted) => serde_json::Value::String(formatted),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::Document(document) => serde_json::Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(bson_to_json).collect())
        }
        other => other.into_relaxed_extjson(),
    }
}

async fn collect(cursor: Cursor<Document>) -> Result<Vec<Product>, StoreError> {
    let documents: Vec<Document> = cursor.try_collect().await.map_err(query_error)?;
    Ok(documents.into_iter().map(to_json).collect())
}

#[async_trait]
impl ProductStore for MongoStore {
    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let cursor = self.collection.find(doc! {}).await.map_err(query_error)?;
        collect(cursor).await
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let found = self
            .collection
            .find_one(doc! { "sku": sku })
            .await
            .map_err(query_error)?;
        Ok(found.map(to_json))
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "categories": category })
            .sort(doc! { "name": 1 })
            .await
            .map_err(query_error)?;
        collect(cursor).await
    }

    async fn categories(&self) -> Result<Vec<serde_json::Value>, StoreError> {
        let values = self
            .collection
            .distinct("categories", doc! {})
            .await
            .map_err(query_error)?;
        Ok(values.into_iter().map(bson_to_json).collect())
    }

    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "$text": { "$search": text } })
            .await
            .map_err(query_error)?;
        collect(cursor).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_uses_relaxed_extended_json() {
        let document = doc! {
            "sku": "STR1",
            "price": 9.99,
            "instock": 12,
            "categories": ["stars"],
        };
        let value = to_json(document);
        assert_eq!(value["sku"], json!("STR1"));
        assert_eq!(value["price"], json!(9.99));
        assert_eq!(value["instock"], json!(12));
        assert_eq!(value["categories"], json!(["stars"]));
    }

    #[test]
    fn test_to_json_flattens_ids_and_dates() {
        let id = mongodb::bson::oid::ObjectId::parse_str("5f1e2d3c4b5a697887766554").unwrap();
        let document = doc! {
            "_id": id,
            "sku": "STR1",
            "added": mongodb::bson::DateTime::from_millis(0),
            "variants": [{ "_id": id, "colour": "red" }],
        };
        let value = to_json(document);
        assert_eq!(value["_id"], json!("5f1e2d3c4b5a697887766554"));
        assert_eq!(value["added"], json!("1970-01-01T00:00:00Z"));
        assert_eq!(value["variants"][0]["_id"], json!("5f1e2d3c4b5a697887766554"));
        assert_eq!(value["variants"][0]["colour"], json!("red"));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let config = StoreConfig::new(crate::config::ConnectionMode::Plain).with_url("not-a-url");
        let result = MongoConnector.connect(&config).await;
        assert!(matches!(result, Err(StoreError::InvalidUrl(_))));
    }
}
