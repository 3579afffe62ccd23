//! In-memory document store.
//!
//! Used for offline mode and tests. Data is lost on restart.

use crate::db::{Direction, Document, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type Collection = BTreeMap<String, Value>;

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Other(format!("memory store lock poisoned: {}", e))
}

/// Order two field values the way the remote store would for mixed data:
/// timestamps chronologically, numbers numerically, strings lexically.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        self.collections
            .write()
            .map_err(poisoned)?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data.clone());
        Ok(())
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.to_string(), data.clone());
        Ok(true)
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Documents lacking the order field sort last in either direction.
        docs.sort_by(|a, b| match (a.data.get(order_by), b.data.get(order_by)) {
            (Some(x), Some(y)) => match direction {
                Direction::Ascending => compare_values(x, y),
                Direction::Descending => compare_values(y, x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(docs)
    }
}
