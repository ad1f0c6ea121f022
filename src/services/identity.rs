// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted identity provider client.
//!
//! Talks to a GoTrue-compatible auth API:
//! - Password sign-in
//! - Sign-up with a display name
//! - Re-sending the sign-up confirmation email
//! - Deleting a just-created account when sign-up cannot be completed
//!
//! Provider failures are folded into the closed [`IdentityError`] set so
//! callers never inspect raw provider payloads.

use serde::Deserialize;

use crate::models::Player;

/// Everything that can go wrong when talking to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been confirmed")]
    EmailUnconfirmed,

    #[error("Email address is already registered")]
    AlreadyRegistered,

    #[error("Identity provider error: {0}")]
    Unexpected(String),
}

impl IdentityError {
    /// Map a provider error code and message onto the closed error set.
    ///
    /// Older provider versions only send a message (and use `invalid_grant`
    /// for both bad passwords and unconfirmed accounts), so the message is
    /// checked before the code.
    pub fn from_provider(code: Option<&str>, message: Option<&str>) -> Self {
        let message_lower = message.map(str::to_ascii_lowercase).unwrap_or_default();

        if message_lower.contains("email not confirmed") {
            return IdentityError::EmailUnconfirmed;
        }
        if message_lower.contains("already registered") {
            return IdentityError::AlreadyRegistered;
        }

        match code {
            Some("invalid_credentials") | Some("invalid_grant") | Some("user_not_found") => {
                IdentityError::InvalidCredentials
            }
            Some("email_not_confirmed") => IdentityError::EmailUnconfirmed,
            Some("email_address_already_exists")
            | Some("user_already_exists")
            | Some("email_exists") => IdentityError::AlreadyRegistered,
            _ => IdentityError::Unexpected(
                message
                    .or(code)
                    .unwrap_or("unknown provider error")
                    .to_string(),
            ),
        }
    }
}

/// Error payload; field names vary across provider versions.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ProviderErrorBody {
    fn into_error(self) -> IdentityError {
        let code = self.error_code.or(self.error);
        let message = self.msg.or(self.message).or(self.error_description);
        IdentityError::from_provider(code.as_deref(), message.as_deref())
    }
}

/// User object returned by the provider.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl ProviderUser {
    fn into_player(self) -> Player {
        let name = self
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        Player::new(self.id, name)
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: ProviderUser,
}

/// Identity provider REST client.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Verify email + password and return the player identity.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Player, IdentityError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Sign-in request failed: {}", e)))?;

        let session: SessionResponse = Self::check_response_json(response).await?;
        tracing::info!(user_id = %session.user.id, "Sign-in succeeded");
        Ok(session.user.into_player())
    }

    /// Create an account. The provider sends the confirmation email.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Player, IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Sign-up request failed: {}", e)))?;

        let body: serde_json::Value = Self::check_response_json(response).await?;
        let user = parse_sign_up_user(body)?;
        tracing::info!(user_id = %user.id, "Sign-up succeeded");
        Ok(user)
    }

    /// Ask the provider to send the sign-up confirmation email again.
    pub async fn resend_verification(&self, email: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/resend", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "type": "signup", "email": email }))
            .send()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Resend request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(response).await)
    }

    /// Delete an account through the provider's `delete-auth-user` function.
    ///
    /// Only used to undo a sign-up whose profile could not be stored.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let url = format!("{}/functions/v1/delete-auth-user", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "userId": user_id }))
            .send()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Delete request failed: {}", e)))?;

        if response.status().is_success() {
            tracing::info!(user_id, "Account deleted");
            return Ok(());
        }
        Err(Self::error_from_response(response).await)
    }

    async fn check_response_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Invalid provider response: {}", e)))
    }

    async fn error_from_response(response: reqwest::Response) -> IdentityError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Identity provider returned an error");
        parse_error_body(status.as_u16(), &body)
    }
}

/// Sign-up returns either a session (`{user: {...}}`) or the bare user.
fn parse_sign_up_user(body: serde_json::Value) -> Result<Player, IdentityError> {
    let user_value = match body.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => body,
    };

    serde_json::from_value::<ProviderUser>(user_value)
        .map(ProviderUser::into_player)
        .map_err(|e| IdentityError::Unexpected(format!("Invalid sign-up response: {}", e)))
}

fn parse_error_body(status: u16, body: &str) -> IdentityError {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) => parsed.into_error(),
        Err(_) => IdentityError::Unexpected(format!("HTTP {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_known_codes() {
        assert_eq!(
            IdentityError::from_provider(Some("invalid_credentials"), None),
            IdentityError::InvalidCredentials
        );
        assert_eq!(
            IdentityError::from_provider(Some("email_not_confirmed"), None),
            IdentityError::EmailUnconfirmed
        );
        assert_eq!(
            IdentityError::from_provider(Some("email_address_already_exists"), None),
            IdentityError::AlreadyRegistered
        );
        assert_eq!(
            IdentityError::from_provider(Some("user_already_exists"), None),
            IdentityError::AlreadyRegistered
        );
    }

    #[test]
    fn test_message_wins_over_generic_code() {
        assert_eq!(
            IdentityError::from_provider(Some("invalid_grant"), Some("Email not confirmed")),
            IdentityError::EmailUnconfirmed
        );
        assert_eq!(
            IdentityError::from_provider(None, Some("User already registered")),
            IdentityError::AlreadyRegistered
        );
    }

    #[test]
    fn test_unknown_code_is_unexpected() {
        assert_eq!(
            IdentityError::from_provider(Some("weak_password"), Some("Password too short")),
            IdentityError::Unexpected("Password too short".to_string())
        );
        assert_eq!(
            IdentityError::from_provider(Some("over_request_rate_limit"), None),
            IdentityError::Unexpected("over_request_rate_limit".to_string())
        );
    }

    #[test]
    fn test_parse_error_body_variants() {
        let current =
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(
            parse_error_body(400, current),
            IdentityError::InvalidCredentials
        );

        let legacy = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
        assert_eq!(parse_error_body(400, legacy), IdentityError::EmailUnconfirmed);

        assert_eq!(
            parse_error_body(503, "upstream down"),
            IdentityError::Unexpected("HTTP 503: upstream down".to_string())
        );
    }

    #[test]
    fn test_sign_up_user_shapes() {
        let bare = serde_json::json!({
            "id": "u-1",
            "email": "ana@example.com",
            "user_metadata": { "name": "Ana" }
        });
        assert_eq!(parse_sign_up_user(bare).unwrap(), Player::new("u-1", "Ana"));

        let wrapped = serde_json::json!({
            "access_token": "t",
            "user": { "id": "u-2", "email": "bia@example.com", "user_metadata": {} }
        });
        assert_eq!(
            parse_sign_up_user(wrapped).unwrap(),
            Player::new("u-2", "bia")
        );

        assert!(parse_sign_up_user(serde_json::json!({ "nope": true })).is_err());
    }
}
