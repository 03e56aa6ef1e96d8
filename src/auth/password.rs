use bcrypt::BcryptError;

/// Hash a plaintext password for storage.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// Constant-time check of a plaintext password against a stored hash.
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
