use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use plads_common::models::auth::Claims;

/// Access token lifetime: 1 hour
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create an access token (JWT) with 1-hour TTL
pub fn create_access_token(user_id: &str, email: &str, jwt_secret: &str) -> Result<String> {
    create_access_token_with_ttl(user_id, email, jwt_secret, TOKEN_TTL_SECS)
}

fn create_access_token_with_ttl(
    user_id: &str,
    email: &str,
    jwt_secret: &str,
    ttl_secs: i64,
) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .context("Failed to create access token")
}

/// Validate an access token and return claims. Expiry is checked with
/// zero leeway: a token is rejected the second its horizon passes.
pub fn validate_access_token(token: &str, jwt_secret: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .context("Invalid access token")?;
    Ok(token_data.claims)
}
