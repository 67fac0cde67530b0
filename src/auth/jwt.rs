//! Session token service
//! Access and refresh tokens are signed with two independent HS256 keys

use crate::{config::SecurityConfig, error::AppError, models::user::User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token validation failures. Messages never carry key or token material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// Claims carried by both access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    /// Unique per issuance
    pub token_id: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Both tokens of a session together with their expiry instants
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// One signing key with its lifetime
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: u64,
}

impl KeyPair {
    fn new(secret: &str, lifetime_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }
}

/// JWT service
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl JwtService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_token_exp_secs: u64,
        refresh_token_exp_secs: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Self {
            access: KeyPair::new(access_secret, access_token_exp_secs),
            refresh: KeyPair::new(refresh_secret, refresh_token_exp_secs),
            validation,
        }
    }

    /// Create JWT service from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let access = config.access_token_secret.expose_secret();
        let refresh = config.refresh_token_secret.expose_secret();

        if access.len() < 32 || refresh.len() < 32 {
            return Err(AppError::Config("token secrets too short (min 32 chars)".to_string()));
        }
        if access == refresh {
            return Err(AppError::Config(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(Self::new(
            access,
            refresh,
            config.access_token_exp_secs,
            config.refresh_token_exp_secs,
        ))
    }

    pub fn access_token_exp_secs(&self) -> u64 {
        self.access.lifetime_secs
    }

    pub fn refresh_token_exp_secs(&self) -> u64 {
        self.refresh.lifetime_secs
    }

    /// Issue an access token for the user
    pub fn issue_access_token(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        Self::issue(&self.access, user, Utc::now())
    }

    /// Issue a refresh token for the user
    pub fn issue_refresh_token(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        Self::issue(&self.refresh, user, Utc::now())
    }

    /// Issue both tokens for a new session (login and refresh rotation)
    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let (access_token, access_expires_at) = Self::issue(&self.access, user, now)?;
        let (refresh_token, refresh_expires_at) = Self::issue(&self.refresh, user, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn issue(
        key: &KeyPair,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + Duration::seconds(key.lifetime_secs as i64);

        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            token_id: Uuid::new_v4(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &key.encoding).map_err(|e| {
            tracing::error!(error = ?e.kind(), "Failed to encode token");
            AppError::internal_error("failed to encode token")
        })?;

        Ok((token, expires_at))
    }

    /// Check signature and expiry of an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(token, &self.access)
    }

    /// Check signature and expiry of a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(token, &self.refresh)
    }

    /// Claims of a valid access token
    pub fn extract_claims(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_access_token(token)
    }

    fn decode(&self, token: &str, key: &KeyPair) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &key.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = classify(e.kind());
                tracing::debug!(reason = %err, "Token validation failed");
                err
            })
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "access-secret-for-unit-tests-0123456789";
    const REFRESH: &str = "refresh-secret-for-unit-tests-0123456789";

    fn service() -> JwtService {
        JwtService::new(ACCESS, REFRESH, 86400, 604800)
    }

    fn user() -> User {
        User::new("alice".to_string(), "alice@example.com".to_string(), "hash".to_string())
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = service();
        let user = user();

        let (token, _) = service.issue_access_token(&user).unwrap();
        let claims = service.extract_claims(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let service = service();
        let user = user();

        let pair_a = service.issue_token_pair(&user).unwrap();
        let pair_b = service.issue_token_pair(&user).unwrap();
        assert_ne!(pair_a.access_token, pair_b.access_token);

        let a = service.validate_access_token(&pair_a.access_token).unwrap();
        let b = service.validate_access_token(&pair_b.access_token).unwrap();
        assert_ne!(a.token_id, b.token_id);
    }

    #[test]
    fn test_keys_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_token_pair(&user()).unwrap();

        assert_eq!(
            service.validate_access_token(&pair.refresh_token),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            service.validate_refresh_token(&pair.access_token),
            Err(TokenError::InvalidSignature)
        );
        assert!(service.validate_refresh_token(&pair.refresh_token).is_ok());
        assert!(pair.refresh_expires_at > pair.access_expires_at);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = service();
        assert_eq!(service.extract_claims("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(service.extract_claims(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_classify_error_kinds() {
        assert_eq!(classify(&ErrorKind::ExpiredSignature), TokenError::Expired);
        assert_eq!(classify(&ErrorKind::InvalidAlgorithm), TokenError::InvalidSignature);
        assert_eq!(classify(&ErrorKind::InvalidToken), TokenError::Malformed);
    }
}
