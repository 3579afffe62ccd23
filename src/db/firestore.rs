// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`DocumentStore`].

use crate::db::{Direction, Document, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // The emulator accepts any bearer token; skip the credential lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("Database not connected (offline mode)".into()))
    }
}

/// Convert a raw Firestore document into a [`Document`].
fn to_document(doc: &firestore::FirestoreDocument) -> Result<Document, StoreError> {
    let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let data = firestore::FirestoreDb::deserialize_doc_to::<serde_json::Value>(doc).map_err(|e| {
        StoreError::Malformed {
            id: id.clone(),
            reason: e.to_string(),
        }
    })?;
    Ok(Document { id, data })
}

fn map_err(e: FirestoreError) -> StoreError {
    let message = e.to_string();
    match e {
        FirestoreError::NetworkError(_) => StoreError::Unavailable(message),
        _ if message.contains("PermissionDenied") => StoreError::PermissionDenied(message),
        _ => StoreError::Other(message),
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let doc = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .one(id)
            .await
            .map_err(map_err)?;

        doc.as_ref().map(to_document).transpose()
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(data)
            .execute()
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<bool, StoreError> {
        // Firestore rejects a create on an existing ID with ALREADY_EXISTS,
        // which makes this the race-free half of create-if-absent.
        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(data)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(collection, id, "Document already exists, create skipped");
                Ok(false)
            }
            Err(e) => Err(map_err(e)),
        }
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError> {
        let direction = match direction {
            Direction::Ascending => firestore::FirestoreQueryDirection::Ascending,
            Direction::Descending => firestore::FirestoreQueryDirection::Descending,
        };

        let docs = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .order_by([(order_by, direction)])
            .query()
            .await
            .map_err(map_err)?;

        docs.iter().map(to_document).collect()
    }
}
