// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player profiles.
//!
//! Profiles live in one collection under [`keys::PROFILES`]. Unlike claims,
//! profile writes are all or nothing: when the store rejects a write the
//! in-memory collection is rolled back and the error is returned.

use tokio::sync::Mutex;

use crate::db::{keys, save_collection, BlobStore, StoreError};
use crate::models::{Player, Profile, ProfileUpdate};
use crate::services::territory::load_or_empty;

pub struct ProfileService<S> {
    store: S,
    profiles: Mutex<Vec<Profile>>,
}

impl<S: BlobStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            profiles: Mutex::new(Vec::new()),
        }
    }

    /// Restore persisted profiles. An unreadable collection starts empty.
    pub async fn load(store: S) -> Self {
        let profiles: Vec<Profile> = load_or_empty(&store, keys::PROFILES).await;
        tracing::info!(profiles = profiles.len(), "Loaded profiles");

        Self {
            store,
            profiles: Mutex::new(profiles),
        }
    }

    /// Create (or reset) the profile for a newly registered player.
    pub async fn create_profile(
        &self,
        player: &Player,
        email: &str,
    ) -> Result<Profile, StoreError> {
        let profile = Profile::new(player, email);
        let mut profiles = self.profiles.lock().await;

        let mut next = profiles.clone();
        match next.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => next.push(profile.clone()),
        }

        save_collection(&self.store, keys::PROFILES, &next).await?;
        *profiles = next;

        tracing::info!(user_id = %profile.id, "Profile created");
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> Option<Profile> {
        self.profiles
            .lock()
            .await
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
    }

    /// Apply `update` to the profile of `user_id`.
    ///
    /// Returns `Ok(None)` when the player has no profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let mut profiles = self.profiles.lock().await;

        let mut next = profiles.clone();
        let Some(profile) = next.iter_mut().find(|p| p.id == user_id) else {
            return Ok(None);
        };
        profile.apply(update);
        let updated = profile.clone();

        save_collection(&self.store, keys::PROFILES, &next).await?;
        *profiles = next;

        tracing::info!(user_id, "Profile updated");
        Ok(Some(updated))
    }

    /// Remove the profile of `user_id`. Returns whether one existed.
    pub async fn delete_profile(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.lock().await;
        if !profiles.iter().any(|p| p.id == user_id) {
            return Ok(false);
        }

        let next: Vec<Profile> = profiles
            .iter()
            .filter(|p| p.id != user_id)
            .cloned()
            .collect();

        save_collection(&self.store, keys::PROFILES, &next).await?;
        *profiles = next;

        tracing::info!(user_id, "Profile deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{load_collection, MemoryStore};

    fn ana() -> Player {
        Player::new("ana", "Ana")
    }

    #[tokio::test]
    async fn test_create_get_update_persist() {
        let store = MemoryStore::new();
        let service = ProfileService::new(store.clone());

        let created = service
            .create_profile(&ana(), "ana@example.com")
            .await
            .unwrap();
        assert_eq!(service.get_profile("ana").await, Some(created));

        let updated = service
            .update_profile(
                "ana",
                ProfileUpdate {
                    bio: Some("Runs at dawn".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Runs at dawn"));

        let persisted: Vec<Profile> = load_collection(&store, keys::PROFILES).await.unwrap();
        assert_eq!(persisted, vec![updated.clone()]);

        let reloaded = ProfileService::load(store).await;
        assert_eq!(reloaded.get_profile("ana").await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_profile() {
        let service = ProfileService::new(MemoryStore::new());
        let result = service
            .update_profile("nobody", ProfileUpdate::default())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_profiles_unchanged() {
        let store = MemoryStore::new();
        let service = ProfileService::new(store.clone());
        let created = service
            .create_profile(&ana(), "ana@example.com")
            .await
            .unwrap();

        store.set_fail_writes(true);

        let bia = Player::new("bia", "Bia");
        assert!(service
            .create_profile(&bia, "bia@example.com")
            .await
            .is_err());
        assert_eq!(service.get_profile("bia").await, None);

        let update = ProfileUpdate {
            name: Some("Ana Maria".to_string()),
            ..Default::default()
        };
        assert!(service.update_profile("ana", update).await.is_err());
        assert!(service.delete_profile("ana").await.is_err());
        assert_eq!(service.get_profile("ana").await, Some(created));
    }

    #[tokio::test]
    async fn test_delete_profile() {
        let service = ProfileService::new(MemoryStore::new());
        service
            .create_profile(&ana(), "ana@example.com")
            .await
            .unwrap();

        assert!(service.delete_profile("ana").await.unwrap());
        assert!(!service.delete_profile("ana").await.unwrap());
        assert_eq!(service.get_profile("ana").await, None);
    }
}
