//! Token issuing, password hashing and the `/api/auth` endpoint.
//!
//! Unknown usernames are registered on their first successful call: the
//! password they sent becomes their credential.

use std::time::Duration;

use api_types::auth::{AuthRequest, AuthResponse};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use engine::{Account, EngineError};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ServerError, server::ServerState};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),
    #[error("wrong password")]
    WrongPassword,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 secret shared by issuing and validation.
    pub signing_key: String,
    pub token_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.signing_key.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: config.token_ttl,
        }
    }

    pub fn issue(&self, account_id: i32) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: account_id,
            iat,
            exp: iat.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    })
    .await
    .map_err(|err| AuthError::Hashing(err.to_string()))?
}

async fn verify_password(password: String, credential: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&credential).map_err(|err| AuthError::Hashing(err.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::WrongPassword)
    })
    .await
    .map_err(|err| AuthError::Hashing(err.to_string()))?
}

async fn login_or_register(
    state: &ServerState,
    username: &str,
    password: &str,
) -> Result<Account, ServerError> {
    match state.engine.credential(username).await {
        Ok((account, credential)) => {
            verify_password(password.to_string(), credential).await?;
            return Ok(account);
        }
        Err(EngineError::AccountNotFound(_)) => {}
        Err(err) => return Err(err.into()),
    }

    let hash = hash_password(password.to_string()).await?;
    match state.engine.register(username, &hash).await {
        Ok(account) => Ok(account),
        // Registered concurrently by another request.
        Err(EngineError::ExistingAccount(_)) => {
            let (account, credential) = state.engine.credential(username).await?;
            verify_password(password.to_string(), credential).await?;
            Ok(account)
        }
        Err(err) => Err(err.into()),
    }
}

/// Handle `POST /api/auth`
pub async fn authenticate(
    State(state): State<ServerState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ServerError> {
    let Json(payload) = payload.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "username and password are required".to_string(),
        ));
    }

    let account = login_or_register(&state, &payload.username, &payload.password).await?;
    let token = state.tokens.issue(account.id)?;
    tracing::debug!(account_id = account.id, "token issued");

    Ok(Json(AuthResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ttl: Duration) -> TokenKeys {
        TokenKeys::new(&AuthConfig {
            signing_key: "secret".to_string(),
            token_ttl: ttl,
        })
    }

    #[test]
    fn issued_token_carries_account_id() {
        let keys = keys(Duration::from_secs(3600));
        let token = keys.issue(7).unwrap();
        assert_eq!(keys.verify(&token).unwrap().user_id, 7);
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let token = keys(Duration::from_secs(3600)).issue(7).unwrap();
        let other = TokenKeys::new(&AuthConfig {
            signing_key: "other".to_string(),
            token_ttl: Duration::from_secs(3600),
        });
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            keys(Duration::from_secs(60)).verify("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn password_round_trip() {
        let hash = hash_password("hunter2".to_string()).await.unwrap();
        assert!(verify_password("hunter2".to_string(), hash.clone()).await.is_ok());
        assert!(matches!(
            verify_password("hunter3".to_string(), hash).await,
            Err(AuthError::WrongPassword)
        ));
    }
}
