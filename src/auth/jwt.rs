use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{CryptError, CryptResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: Uuid, email: &str, role: &str, ttl_hours: i64) -> Self {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp,
        }
    }

    /// Account the token was issued for.
    pub fn user_id(&self) -> CryptResult<Uuid> {
        self.sub
            .parse()
            .map_err(|_| CryptError::InvalidSubject(self.sub.clone()))
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_roundtrip_keeps_claims() {
        let id = Uuid::new_v4();
        let claims = UserClaims::new(id, "a@b.io", "student", 1);
        let token = generate_token(claims, "key").unwrap();

        let data = process_token(&token, "key").unwrap();
        assert_eq!(data.claims.sub, id.to_string());
        assert_eq!(data.claims.role, "student");
    }

    #[test]
    fn subject_must_be_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(UserClaims::new(id, "a@b.io", "student", 1).user_id().unwrap(), id);

        let mut claims = UserClaims::new(id, "a@b.io", "student", 1);
        claims.sub = String::from("42");
        assert!(matches!(claims.user_id(), Err(CryptError::InvalidSubject(s)) if s == "42"));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let claims = UserClaims::new(Uuid::new_v4(), "a@b.io", "admin", 1);
        let token = generate_token(claims, "key").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = UserClaims::new(Uuid::new_v4(), "a@b.io", "student", -2);
        let token = generate_token(claims, "key").unwrap();
        assert!(process_token(&token, "key").is_err());
    }
}
