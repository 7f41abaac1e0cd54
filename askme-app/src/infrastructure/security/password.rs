use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use askme_errors::AppError;

/// Argon2id hashing with a random per-password salt.
pub struct Passwords;

impl Passwords {
    pub fn hash(password: &str) -> Result<String, AppError> {
        // v4 UUIDs carry 122 random bits from the OS generator
        let salt_bytes = uuid::Uuid::new_v4();
        let salt = SaltString::encode_b64(salt_bytes.as_bytes())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hashing is CPU-bound, so it runs on the blocking pool.
    pub async fn hash_blocking(password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }

    pub async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = Passwords::hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(Passwords::verify("correct horse", &hash).unwrap());
        assert!(!Passwords::verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = Passwords::hash("same").unwrap();
        let b = Passwords::hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(Passwords::verify("pw", "not a phc string").is_err());
    }
}
