use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use quiz_types::UserId;

/// Caller identity extracted from a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}

/// Claims of a token issued by the account provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,              // User id
    pub name: Option<String>,     // Display name
    pub exp: u64,                 // Expiry, seconds since the epoch
}

#[derive(Deserialize)]
struct DevClaims {
    id: String,
    username: Option<String>,
}

/// Resolves bearer tokens into identities.
///
/// Outside dev mode only HS256 tokens signed with the shared provider
/// secret are accepted. Dev mode instead takes unsigned `user_id:username`
/// or `{"id": ..., "username": ...}` tokens.
pub struct AuthService {
    decoding_key: Option<DecodingKey>,
    admin_ids: HashSet<UserId>,
    dev_mode: bool,
}

impl AuthService {
    pub fn new(jwt_secret: &str, admin_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            decoding_key: Some(DecodingKey::from_secret(jwt_secret.as_bytes())),
            admin_ids: admin_ids.into_iter().collect(),
            dev_mode: false,
        }
    }

    pub fn new_dev_mode(admin_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            decoding_key: None,
            admin_ids: admin_ids.into_iter().collect(),
            dev_mode: true,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<Identity, AuthError> {
        let header = auth_header.ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        self.validate_token(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        let Some(decoding_key) = &self.decoding_key else {
            return Err(AuthError::InvalidToken);
        };
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<IdentityClaims>(token, decoding_key, &validation).map_err(|e| {
                tracing::warn!("JWT token validation failed: {:?}", e);
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;
        to_identity(claims.sub, claims.name)
    }

    fn validate_dev_token(&self, token: &str) -> Result<Identity, AuthError> {
        let (id, username) = if token.starts_with('{') {
            let claims: DevClaims = serde_json::from_str(token).map_err(|e| {
                tracing::warn!("Failed to parse dev token: {}", e);
                AuthError::InvalidToken
            })?;
            (claims.id, claims.username)
        } else {
            match token.split_once(':') {
                Some((id, username)) => (id.to_string(), Some(username.to_string())),
                None => (token.to_string(), None),
            }
        };

        to_identity(id, username)
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin_ids.contains(&identity.id)
    }

    pub fn require_admin(&self, identity: &Identity) -> Result<(), AuthError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            tracing::warn!("User {} attempted an admin action", identity.id);
            Err(AuthError::Forbidden)
        }
    }
}

fn to_identity(id: String, username: Option<String>) -> Result<Identity, AuthError> {
    let id = id.trim().to_string();
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        tracing::warn!("Rejected token with malformed user id");
        return Err(AuthError::InvalidToken);
    }

    let username = username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.clone());

    Ok(Identity { id, username })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Admin access required")]
    Forbidden,
}
