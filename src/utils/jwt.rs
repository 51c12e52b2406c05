use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};

const SESSION_DAYS: i64 = 7;
const RESET_MINUTES: i64 = 30;
const RESET_PURPOSE: &str = "password-reset";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: String,
    exp: usize,
    purpose: String,
}

/// Signing secret shared by session and reset tokens.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Vec<u8>,
}

fn expires_in(duration: chrono::Duration) -> usize {
    (chrono::Utc::now() + duration).timestamp() as usize
}

impl JwtKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self { secret: secret.as_ref().to_vec() }
    }

    pub fn generate_token(&self, user_id: &str, roles: Vec<String>) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_in(chrono::Duration::days(SESSION_DAYS)),
            roles,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .map(|data| data.claims)
    }

    /// Reset tokens are keyed on the current password hash as well, so they
    /// stop working once the password changes.
    pub fn generate_reset_token(&self, user_id: &str, password_hash: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = ResetClaims {
            sub: user_id.to_string(),
            exp: expires_in(chrono::Duration::minutes(RESET_MINUTES)),
            purpose: RESET_PURPOSE.to_string(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.reset_key(password_hash)))
    }

    pub fn validate_reset_token(&self, token: &str, user_id: &str, password_hash: &str) -> bool {
        decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(&self.reset_key(password_hash)),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .map(|data| data.claims.sub == user_id && data.claims.purpose == RESET_PURPOSE)
        .unwrap_or(false)
    }

    fn reset_key(&self, password_hash: &str) -> Vec<u8> {
        let mut key = self.secret.clone();
        key.extend_from_slice(password_hash.as_bytes());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_carries_roles() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.generate_token("user-1", vec!["Admin".into()]).unwrap();
        let claims = keys.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.roles, vec!["Admin".to_string()]);

        assert!(JwtKeys::new("other-secret").validate_token(&token).is_err());
    }

    #[test]
    fn reset_token_dies_with_password_change() {
        let keys = JwtKeys::new("test-secret");
        let token = keys.generate_reset_token("user-1", "hash-a").unwrap();

        assert!(keys.validate_reset_token(&token, "user-1", "hash-a"));
        assert!(!keys.validate_reset_token(&token, "user-2", "hash-a"));
        assert!(!keys.validate_reset_token(&token, "user-1", "hash-b"));
    }

    #[test]
    fn reset_token_is_not_a_session_token() {
        let keys = JwtKeys::new("test-secret");
        let session = keys.generate_token("user-1", Vec::new()).unwrap();
        assert!(!keys.validate_reset_token(&session, "user-1", ""));
    }
}
