// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed blob store.
//!
//! Each key becomes one document in the `blobs` collection holding the raw
//! JSON string plus a write timestamp.

use serde::{Deserialize, Serialize};

use super::{BlobStore, StoreError};

/// Collection holding one document per storage key.
pub const BLOBS_COLLECTION: &str = "blobs";

/// Stored document shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobDocument {
    value: String,
    updated_at: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Connect to the emulator with a dummy unsigned token.
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
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline client; every operation returns [`StoreError::Offline`].
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::Offline)
    }
}

/// Firestore document ids may not contain `/`.
fn document_id(key: &str) -> String {
    key.replace('/', "_")
}

impl BlobStore for FirestoreStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let doc: Option<BlobDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(BLOBS_COLLECTION)
            .obj()
            .one(&document_id(key))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(doc.map(|d| d.value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let doc = BlobDocument {
            value,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(BLOBS_COLLECTION)
            .document_id(document_id(key))
            .object(&doc)
            .execute()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::debug!(key, "Wrote blob to Firestore");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(BLOBS_COLLECTION)
            .document_id(document_id(key))
            .execute()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_strips_slashes() {
        assert_eq!(document_id("@territory_users"), "@territory_users");
        assert_eq!(document_id("a/b"), "a_b");
    }

    #[tokio::test]
    async fn test_mock_store_is_offline() {
        let store = FirestoreStore::new_mock();
        assert!(matches!(store.get("k").await, Err(StoreError::Offline)));
        assert!(matches!(
            store.set("k", "v".to_string()).await,
            Err(StoreError::Offline)
        ));
    }
}
