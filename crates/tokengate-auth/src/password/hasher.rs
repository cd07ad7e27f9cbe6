//! Argon2id password hashing and verification.

use std::time::Duration;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use tokengate_core::config::AuthConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::timeout::with_timeout;

/// Handles password hashing and verification using Argon2id.
///
/// The async methods run the CPU-bound work on the blocking pool and bound
/// it with the credential deadline.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Argon2id cost parameters.
    params: Params,
    /// Deadline for one hash or verify call.
    timeout: Duration,
    /// Hash of a throwaway secret with the same cost, verified when there is
    /// no real digest to check.
    decoy_hash: String,
}

impl PasswordHasher {
    /// Creates a hasher from auth configuration.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let params = Params::new(config.argon2_memory_kib, config.argon2_iterations, 1, None)
            .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        let mut hasher = Self {
            params,
            timeout: Duration::from_millis(config.credential_timeout_ms),
            decoy_hash: String::new(),
        };
        hasher.decoy_hash = hasher.hash_password(&uuid::Uuid::new_v4().to_string())?;
        Ok(hasher)
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// [`hash_password`](Self::hash_password) off the async runtime.
    pub async fn hash(&self, password: &str) -> AppResult<String> {
        let hasher = self.clone();
        let password = password.to_string();
        self.run_blocking("password.hash", move || hasher.hash_password(&password))
            .await
    }

    /// [`verify_password`](Self::verify_password) off the async runtime.
    pub async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        self.run_blocking("password.verify", move || {
            hasher.verify_password(&password, &hash)
        })
        .await
    }

    /// Runs a full verification against the decoy digest and discards the
    /// outcome, so a missing account costs as much as a wrong password.
    pub async fn verify_decoy(&self, password: &str) -> AppResult<()> {
        let decoy = self.decoy_hash.clone();
        self.verify(password, &decoy).await.map(|_| ())
    }

    async fn run_blocking<T, F>(&self, operation: &'static str, work: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        with_timeout(operation, self.timeout, async move {
            tokio::task::spawn_blocking(work).await.map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Credential task failed", e)
            })?
        })
        .await
    }
}
