//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Password hasher with configurable cost
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher from explicit argon2 cost parameters
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Config(format!("Invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::internal_error("failed to hash password")
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash (constant time)
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored password hash is unparsable: {:?}", e);
            AppError::internal_error("stored password hash is unparsable")
        })?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)
    }

    /// `hash` on the blocking pool
    pub async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
    }

    /// `verify` on the blocking pool
    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<(), AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
    }

    /// Validate password against policy
    pub fn validate_password_policy(
        password: &str,
        policy: &SecurityConfig,
    ) -> Result<(), AppError> {
        if password.chars().count() < policy.password_min_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                policy.password_min_length
            )));
        }

        if policy.password_require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::BadRequest(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        if policy.password_require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::BadRequest(
                "Password must contain at least one digit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    // Minimum argon2 cost keeps the tests fast
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(8, 1, 1).unwrap()
    }

    fn policy(uppercase: bool, digit: bool) -> SecurityConfig {
        SecurityConfig {
            access_token_secret: Secret::new("a".repeat(32)),
            refresh_token_secret: Secret::new("b".repeat(32)),
            access_token_exp_secs: 86400,
            refresh_token_exp_secs: 604800,
            password_min_length: 8,
            password_require_uppercase: uppercase,
            password_require_digit: digit,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("TestPassword123!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        hasher.verify("TestPassword123!", &hash).unwrap();
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("TestPassword123!").unwrap();

        assert!(matches!(
            hasher.verify("WrongPassword", &hash),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();

        assert_ne!(hash1, hash2);
        hasher.verify("same-password", &hash1).unwrap();
        hasher.verify("same-password", &hash2).unwrap();
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = hasher();
        let hash = hasher.hash_blocking("on-the-pool".to_string()).await.unwrap();

        assert!(hasher
            .verify_blocking("on-the-pool".to_string(), hash.clone())
            .await
            .is_ok());
        assert!(hasher
            .verify_blocking("elsewhere".to_string(), hash)
            .await
            .is_err());
    }

    #[test]
    fn test_rejects_invalid_cost() {
        assert!(PasswordHasher::new(1, 0, 1).is_err());
    }

    #[test]
    fn test_password_policy_validation() {
        let strict = policy(true, true);
        assert!(PasswordHasher::validate_password_policy("Test1234", &strict).is_ok());
        assert!(PasswordHasher::validate_password_policy("Test1", &strict).is_err());
        assert!(PasswordHasher::validate_password_policy("test1234", &strict).is_err());
        assert!(PasswordHasher::validate_password_policy("Testtest", &strict).is_err());

        let relaxed = policy(false, false);
        assert!(PasswordHasher::validate_password_policy("testtest", &relaxed).is_ok());
    }
}
