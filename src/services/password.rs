//! Password hashing and verification using bcrypt.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use crate::models::errors::AppError;

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal_error(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("Verification task failed: {}", e)))?
        .map_err(|e| AppError::internal_error(format!("Invalid password hash: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("secret", TEST_COST).await.unwrap();
        assert_ne!(hash, "secret");
        assert!(verify_password("secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let hash = hash_password("secret", TEST_COST).await.unwrap();
        assert!(!verify_password("Secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("secret", "not-a-bcrypt-hash").await.is_err());
    }
}
