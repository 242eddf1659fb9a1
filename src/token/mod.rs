/// Token issuance and verification
///
/// Access and refresh tokens are self-contained HS256 JWTs with separate
/// signing secrets and lifetimes. Verification is stateless; the stateful
/// half of refresh rotation (the stored-token compare-and-swap) lives in
/// the credential store.
use crate::{
    config::AuthConfig,
    db::account::Account,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Which of the two token families a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Access token claims: enough identity to serve a request without a lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token claims: the account id only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies both token kinds
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            access_secret: auth.access_token_secret.clone(),
            refresh_secret: auth.refresh_token_secret.clone(),
            access_ttl_secs: auth.access_token_ttl_secs,
            refresh_ttl_secs: auth.refresh_token_ttl_secs,
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    /// Issue a short-lived access token carrying the public identity claims
    pub fn issue_access_token(&self, account: &Account) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: account.id.clone(),
            email: account.email.clone(),
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(TokenKind::Access)),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to sign access token: {}", e)))
    }

    /// Issue a refresh token carrying only the account id
    ///
    /// The caller is responsible for persisting the returned value onto the
    /// account record; this service never touches storage.
    pub fn issue_refresh_token(&self, account: &Account) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: account.id.clone(),
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(TokenKind::Refresh)),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to sign refresh token: {}", e)))
    }

    /// Verify an access token and return its claims
    pub fn verify_access(&self, token: &str) -> ApiResult<AccessClaims> {
        self.decode_claims::<AccessClaims>(token, TokenKind::Access)
    }

    /// Verify a refresh token and return its claims
    pub fn verify_refresh(&self, token: &str) -> ApiResult<RefreshClaims> {
        self.decode_claims::<RefreshClaims>(token, TokenKind::Refresh)
    }

    fn decode_claims<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> ApiResult<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;

        decode::<T>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ApiError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::Authentication("Invalid token signature".to_string())
            }
            _ => ApiError::Authentication("Invalid token".to_string()),
        })
    }
}
