use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let token = generate_access_token(4, "ana@empresa.com".into(), 2, "s3cret", 60).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.user_id, 4);
        assert_eq!(claims.sub, "ana@empresa.com");
        assert_eq!(claims.role, 2);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(4, "ana@empresa.com".into(), 2, "s3cret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
