//! Database layer: the document store abstraction and its backends.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLUBS: &str = "clubs";
}

/// Sort direction for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A stored document: its ID plus its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

impl Document {
    /// Deserialize the document fields, injecting the document ID as `id`.
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = match &self.data {
            serde_json::Value::Object(map) => map.clone(),
            other => {
                return Err(StoreError::Malformed {
                    id: self.id.clone(),
                    reason: format!("expected an object, found {}", json_kind(other)),
                })
            }
        };
        fields.insert("id".to_string(), serde_json::Value::String(self.id.clone()));

        serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
            StoreError::Malformed {
                id: self.id.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Deserialize the document fields as-is.
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Malformed {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Remote key/document service with eventual-consistency semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if absent.
    async fn get_document(&self, collection: &str, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Create a document only if none exists with this ID.
    ///
    /// Returns `false` when the document already existed; it is left untouched.
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<bool, StoreError>;

    /// Fetch every document in a collection ordered by one field.
    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn test_to_record_injects_id() {
        let doc = Document {
            id: "abc".to_string(),
            data: serde_json::json!({ "name": "Chess" }),
        };
        let named: Named = doc.to_record().unwrap();
        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "Chess");
    }

    #[test]
    fn test_to_record_rejects_non_object() {
        let doc = Document {
            id: "abc".to_string(),
            data: serde_json::json!(["not", "a", "map"]),
        };
        let err = doc.to_record::<Named>().err().unwrap();
        assert!(matches!(err, StoreError::Malformed { ref id, .. } if id == "abc"));
    }
}
