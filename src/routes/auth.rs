// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes backed by the identity provider.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_DAYS, TOKEN_COOKIE};
use crate::models::Player;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/verification/resend", post(resend_verification))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Successful login: the session token plus the signed-in player.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: Player,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub user: Player,
    /// Always true: the account must be confirmed before login
    pub verification_sent: bool,
}

/// Sign in with email + password and start a session.
///
/// The token is returned in the body for mobile clients and set as an
/// HttpOnly cookie for the web client.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let player = state
        .identity
        .sign_in(payload.email.trim(), &payload.password)
        .await?;

    let token = create_jwt(&player, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_DAYS));

    tracing::info!(user_id = %player.id, "Session started");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: player,
        }),
    ))
}

/// Create an account and its profile. No session is started until the
/// email is confirmed.
///
/// If the profile cannot be stored the new account is deleted again, so a
/// failed registration can simply be retried.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    payload.validate()?;

    let email = payload.email.trim();
    let user = state
        .identity
        .sign_up(payload.name.trim(), email, &payload.password)
        .await?;

    if let Err(e) = state.profile_service.create_profile(&user, email).await {
        tracing::error!(
            user_id = %user.id,
            error = %e,
            "Profile creation failed, rolling back sign-up"
        );
        if let Err(rollback) = state.identity.delete_user(&user.id).await {
            tracing::error!(user_id = %user.id, error = %rollback, "Sign-up rollback failed");
        }
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            verification_sent: true,
        }),
    ))
}

async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResendRequest>,
) -> Result<StatusCode> {
    payload.validate()?;
    state
        .identity
        .resend_verification(payload.email.trim())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the session cookie. Bearer-token clients just drop their token.
async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (StatusCode::NO_CONTENT, jar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_login_requires_password() {
        let req = LoginRequest {
            email: "ana@example.com".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
