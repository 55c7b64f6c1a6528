//! Database row types. These map directly to SQLite rows and stay
//! independent of the HTML form shapes in warbler-types.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl fmt::Display for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

/// Insert payload for a user whose password is already hashed.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub image_url: Option<&'a str>,
}

/// Profile fields a user may change. Blank image URLs fall back to the defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub messages: i64,
    pub following: i64,
    pub followers: i64,
    pub likes: i64,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: String,
}

impl MessageRow {
    /// SQLite stores `datetime('now')` as "YYYY-MM-DD HH:MM:SS" without a zone.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .parse::<DateTime<Utc>>()
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|ndt| ndt.and_utc())
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeRow {
    pub user_id: i64,
    pub message_id: i64,
}
