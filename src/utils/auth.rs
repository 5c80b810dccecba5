use uuid::Uuid;

const BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to hash the password")]
    PasswordHash,
    #[error("failed to hash the auth secret")]
    SecretHash,
}

/// Salted commitment for an optional session password.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|_| AuthError::PasswordHash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Issues a fresh player credential. Returns the secret handed out to the
/// client once and the hash kept on the player.
pub fn issue_token() -> Result<(String, String), AuthError> {
    let token = Uuid::new_v4().to_string();
    let hash = bcrypt::hash(&token, BCRYPT_COST).map_err(|_| AuthError::SecretHash)?;
    Ok((token, hash))
}

pub fn verify_token(token: &str, hash: &str) -> bool {
    bcrypt::verify(token, hash).unwrap_or(false)
}
