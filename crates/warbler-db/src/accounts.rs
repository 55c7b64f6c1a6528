use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::{info, warn};

use crate::models::{NewUser, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    /// Hashes the password with Argon2id and inserts the user.
    ///
    /// An empty password is rejected before the database is touched. Empty or
    /// duplicate usernames and emails come back as [`DbError::Integrity`].
    pub fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<UserRow> {
        let password_hash = hash_password(password)?;

        let user = self.insert_user(&NewUser {
            username,
            email,
            password_hash: &password_hash,
            image_url: image_url.filter(|url| !url.trim().is_empty()),
        })?;

        info!(user_id = user.id, "User signed up: {}", user.username);
        Ok(user)
    }

    /// Returns the user when `password` matches, `None` otherwise.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        if verify_password(&user.password, password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(DbError::InvalidPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Hash(e.to_string()))
}

/// False for a wrong password and for stored values that are not PHC hashes.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password is not a valid hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
