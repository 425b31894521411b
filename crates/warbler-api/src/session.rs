//! Cookie sessions. The cookie holds a signed JWT whose subject is the user
//! id; nothing else about the user lives client-side.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use warbler_types::models::UserId;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "warbler_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
    secure: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_days: i64, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::days(ttl_days),
            secure,
        }
    }

    /// Binds `user` to the session, replacing whoever was bound before.
    pub fn login(&self, jar: CookieJar, user: UserId) -> Result<CookieJar, ApiError> {
        let claims = Claims {
            sub: user.to_string(),
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("session token: {e}")))?;

        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        Ok(jar.add(cookie))
    }

    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    /// The user id bound to this session. Missing, expired, and tampered
    /// cookies all read as "nobody".
    pub fn user_id(&self, jar: &CookieJar) -> Option<UserId> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match decode::<Claims>(cookie.value(), &self.decoding, &Validation::default()) {
            Ok(data) => data.claims.sub.parse().ok(),
            Err(e) => {
                debug!("Ignoring invalid session cookie: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_with(value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, value.to_string()))
    }

    #[test]
    fn login_roundtrip() {
        let keys = SessionKeys::new("test-secret", 1, false);
        let jar = keys.login(CookieJar::new(), 42).unwrap();
        assert_eq!(keys.user_id(&jar), Some(42));

        let jar = keys.logout(jar);
        assert_eq!(keys.user_id(&jar), None);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = SessionKeys::new("ours", 1, false);
        let theirs = SessionKeys::new("theirs", 1, false);
        let jar = theirs.login(CookieJar::new(), 7).unwrap();
        assert_eq!(ours.user_id(&jar), None);
    }

    #[test]
    fn expired_and_garbage_tokens_are_rejected() {
        let keys = SessionKeys::new("secret", -2, false);
        let jar = keys.login(CookieJar::new(), 7).unwrap();
        assert_eq!(keys.user_id(&jar), None);

        assert_eq!(keys.user_id(&jar_with("not.a.jwt")), None);
        assert_eq!(keys.user_id(&CookieJar::new()), None);
    }
}
