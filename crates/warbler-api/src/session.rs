//! Cookie-backed session and flash messages.
//!
//! The session cookie `curr_user` carries an HS256 token whose subject is the
//! logged-in user's id. Flash messages ride in a separate cookie until the
//! next rendered page consumes them.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use warbler_types::api::Claims;

/// Session key under which the current user's id is stored.
pub const CURR_USER_KEY: &str = "curr_user";

const FLASH_KEY: &str = "flash";
const SESSION_DAYS: i64 = 7;

pub fn encode_session(secret: &str, user_id: i64) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// The user id in a session token, or `None` if the token is forged or expired.
pub fn decode_session(secret: &str, token: &str) -> Option<i64> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .ok()
}

pub fn session_user_id(jar: &CookieJar, secret: &str) -> Option<i64> {
    jar.get(CURR_USER_KEY)
        .and_then(|cookie| decode_session(secret, cookie.value()))
}

pub fn login(
    jar: CookieJar,
    secret: &str,
    user_id: i64,
) -> jsonwebtoken::errors::Result<CookieJar> {
    let token = encode_session(secret, user_id)?;
    Ok(jar.add(
        Cookie::build((CURR_USER_KEY, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    ))
}

pub fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(CURR_USER_KEY).path("/"))
}

// -- Flash --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

/// Queues a message for the next rendered page.
pub fn flash(jar: CookieJar, category: &str, message: impl Into<String>) -> CookieJar {
    let mut flashes = read_flashes(&jar);
    flashes.push(Flash {
        category: category.to_string(),
        message: message.into(),
    });

    match serde_json::to_vec(&flashes) {
        Ok(json) => jar.add(
            Cookie::build((FLASH_KEY, B64.encode(json)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ),
        Err(e) => {
            warn!("Failed to encode flash messages: {}", e);
            jar
        }
    }
}

/// Pending flash messages, clearing the cookie that carried them.
pub fn take_flashes(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    if jar.get(FLASH_KEY).is_none() {
        return (jar, Vec::new());
    }
    let flashes = read_flashes(&jar);
    (jar.remove(Cookie::build(FLASH_KEY).path("/")), flashes)
}

fn read_flashes(jar: &CookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_KEY) else {
        return Vec::new();
    };

    B64.decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| {
            warn!("Discarding malformed flash cookie");
            Vec::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_carries_user_id() {
        let token = encode_session("secret", 9999).unwrap();
        assert_eq!(decode_session("secret", &token), Some(9999));
    }

    #[test]
    fn session_token_rejects_other_secret() {
        let token = encode_session("secret", 9999).unwrap();
        assert_eq!(decode_session("another", &token), None);
        assert_eq!(decode_session("secret", "not-a-token"), None);
    }

    #[test]
    fn login_then_logout() {
        let jar = login(CookieJar::new(), "secret", 42).unwrap();
        assert_eq!(session_user_id(&jar, "secret"), Some(42));

        let jar = logout(jar);
        assert_eq!(session_user_id(&jar, "secret"), None);
    }

    #[test]
    fn flashes_accumulate_and_are_consumed() {
        let jar = flash(CookieJar::new(), "danger", "Access unauthorized.");
        let jar = flash(jar, "success", "Hello, testuser!");

        let (jar, flashes) = take_flashes(jar);
        assert_eq!(
            flashes,
            vec![
                Flash { category: "danger".into(), message: "Access unauthorized.".into() },
                Flash { category: "success".into(), message: "Hello, testuser!".into() },
            ]
        );

        let (_, flashes) = take_flashes(jar);
        assert!(flashes.is_empty());
    }

    #[test]
    fn malformed_flash_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_KEY, "%%%"));
        let (_, flashes) = take_flashes(jar);
        assert!(flashes.is_empty());
    }
}
