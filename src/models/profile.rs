//! Player profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::models::Player;

/// Longest bio accepted from the client.
pub const MAX_BIO_CHARS: usize = 280;

/// Profile created at sign-up and edited by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// Identity provider user ID
    pub id: String,
    pub name: String,
    pub email: String,
    /// Profile picture URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Profile {
    /// Fresh profile for a newly registered player.
    pub fn new(player: &Player, email: impl Into<String>) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            email: email.into(),
            avatar_url: None,
            bio: None,
        }
    }

    /// Apply a validated update. Absent fields are left alone; an empty
    /// `avatar_url` or `bio` clears it.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(avatar_url) = update.avatar_url {
            self.avatar_url = Some(avatar_url).filter(|url| !url.is_empty());
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio).filter(|bio| !bio.is_empty());
        }
    }
}

/// Partial update sent by the owner.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_avatar_url"))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 280, message = "must be at most 280 characters"))]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Trim surrounding whitespace from every field that is present.
    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            name: trim(self.name),
            avatar_url: trim(self.avatar_url),
            bio: trim(self.bio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar_url.is_none() && self.bio.is_none()
    }
}

/// Empty clears the avatar; anything else must be an http(s) URL.
fn validate_avatar_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("url").with_message("must be an http(s) URL".into())),
    }
}
