// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value blob storage.
//!
//! The services persist each collection as one JSON array under a fixed
//! key. Backends only move opaque strings around; [`load_collection`] and
//! [`save_collection`] do the JSON encoding on top.

pub mod file;
pub mod firestore;
pub mod memory;

pub use file::FileStore;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

/// Storage keys as constants.
pub mod keys {
    pub const TERRITORIES: &str = "@territory_territories";
    pub const ACTIVITIES: &str = "@territory_activities";
    /// Players that have started at least one session
    pub const USERS: &str = "@territory_users";
    /// Editable player profiles, created at sign-up
    pub const PROFILES: &str = "@territory_profiles";
}

/// Errors from blob storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage not connected (offline mode)")]
    Offline,
}

/// Minimal get/set/remove contract over string keys.
pub trait BlobStore: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Store `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read the JSON array stored under `key`. A missing key is an empty
/// collection; a blob that does not parse is [`StoreError::Serialization`].
pub async fn load_collection<S, T>(store: &S, key: &str) -> Result<Vec<T>, StoreError>
where
    S: BlobStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(blob) => Ok(serde_json::from_str(&blob)?),
        None => Ok(Vec::new()),
    }
}

/// Encode `items` as one JSON array and store it under `key`.
pub async fn save_collection<S, T>(store: &S, key: &str, items: &[T]) -> Result<(), StoreError>
where
    S: BlobStore,
    T: Serialize + Sync,
{
    let blob = serde_json::to_string(items)?;
    store.set(key, blob).await
}

/// Backend selected at startup.
#[derive(Clone)]
pub enum Storage {
    Memory(MemoryStore),
    File(FileStore),
    Firestore(FirestoreStore),
}

impl Storage {
    pub fn name(&self) -> &'static str {
        match self {
            Storage::Memory(_) => "memory",
            Storage::File(_) => "file",
            Storage::Firestore(_) => "firestore",
        }
    }
}

impl BlobStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Storage::Memory(store) => store.get(key).await,
            Storage::File(store) => store.get(key).await,
            Storage::Firestore(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        match self {
            Storage::Memory(store) => store.set(key, value).await,
            Storage::File(store) => store.set(key, value).await,
            Storage::Firestore(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Storage::Memory(store) => store.remove(key).await,
            Storage::File(store) => store.remove(key).await,
            Storage::Firestore(store) => store.remove(key).await,
        }
    }
}

impl From<MemoryStore> for Storage {
    fn from(store: MemoryStore) -> Self {
        Storage::Memory(store)
    }
}

impl From<FileStore> for Storage {
    fn from(store: FileStore) -> Self {
        Storage::File(store)
    }
}

impl From<FirestoreStore> for Storage {
    fn from(store: FirestoreStore) -> Self {
        Storage::Firestore(store)
    }
}
