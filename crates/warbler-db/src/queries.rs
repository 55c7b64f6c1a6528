use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{
    DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, LikeRow, MessageRow, NewUser, UserRow, UserStats,
    UserUpdate,
};
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, image_url, header_image_url, bio, location";

// JOIN users so listings carry the author's name and avatar in one query
const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON m.user_id = u.id";

impl Database {
    // -- Users --

    /// Inserts a user whose password has already been hashed.
    pub fn insert_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url, header_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.image_url.unwrap_or(DEFAULT_IMAGE_URL),
                    DEFAULT_HEADER_IMAGE_URL,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id", id).and_then(|row| row.ok_or_else(missing_row))
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    /// All users, or those whose username contains `search`.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| match search {
            Some(term) => {
                let pattern = format!("%{}%", escape_like(term));
                query_users(
                    conn,
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ESCAPE '\\' ORDER BY id"
                    ),
                    params![pattern],
                )
            }
            None => query_users(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
                params![],
            ),
        })
    }

    /// Returns the updated row, or `None` if the user does not exist.
    pub fn update_user(&self, id: i64, update: &UserUpdate<'_>) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4,
                     bio = ?5, location = ?6
                 WHERE id = ?7",
                params![
                    update.username,
                    update.email,
                    non_blank(update.image_url).unwrap_or(DEFAULT_IMAGE_URL),
                    non_blank(update.header_image_url).unwrap_or(DEFAULT_HEADER_IMAGE_URL),
                    non_blank(update.bio),
                    non_blank(update.location),
                    id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "id", id)
        })
    }

    /// Deletes the user along with their messages, follows and likes.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn user_stats(&self, id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(UserStats {
                        messages: row.get(0)?,
                        following: row.get(1)?,
                        followers: row.get(2)?,
                        likes: row.get(3)?,
                    })
                },
            )?)
        })
    }

    // -- Follows --

    /// Adds the edge follower -> followed. Following twice is a no-op.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (followed_id, follower_id) VALUES (?1, ?2)",
                params![followed_id, follower_id],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE followed_id = ?1 AND follower_id = ?2",
                params![followed_id, follower_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Is `user_id` following `other_id`?
    pub fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, user_id, other_id))
    }

    /// Is `user_id` followed by `other_id`?
    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, other_id, user_id))
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                     ORDER BY id"
                ),
                params![user_id],
            )
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            query_users(
                conn,
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE id IN (SELECT follower_id FROM follows WHERE followed_id = ?1)
                     ORDER BY id"
                ),
                params![user_id],
            )
        })
    }

    // -- Messages --

    pub fn create_message(&self, user_id: i64, text: &str) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
                params![text, user_id],
            )?;
            let id = conn.last_insert_rowid();
            query_message(conn, id).and_then(|row| row.ok_or_else(missing_row))
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM messages WHERE id = ?1", [id])? > 0))
    }

    /// A user's own messages, newest first.
    pub fn user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT}
                     WHERE m.user_id = ?1
                     ORDER BY m.timestamp DESC, m.id DESC
                     LIMIT ?2"
                ),
                params![user_id, limit],
            )
        })
    }

    /// Messages by the user and everyone they follow, newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT}
                     WHERE m.user_id = ?1
                        OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                     ORDER BY m.timestamp DESC, m.id DESC
                     LIMIT ?2"
                ),
                params![user_id, limit],
            )
        })
    }

    // -- Likes --

    /// Records a like. Liking the same message twice is a no-op.
    pub fn add_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
                params![user_id, message_id],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn remove_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Removes the like if present, inserts it otherwise.
    /// Returns true when the message is liked afterwards.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                params![user_id, message_id],
            )?;
            Ok(true)
        })
    }

    pub fn likes_by_user(&self, user_id: i64) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            query_likes(
                conn,
                "SELECT user_id, message_id FROM likes WHERE user_id = ?1 ORDER BY message_id",
                user_id,
            )
        })
    }

    pub fn likes_for_message(&self, message_id: i64) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            query_likes(
                conn,
                "SELECT user_id, message_id FROM likes WHERE message_id = ?1 ORDER BY user_id",
                message_id,
            )
        })
    }

    pub fn liked_message_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        Ok(self
            .likes_by_user(user_id)?
            .into_iter()
            .map(|like| like.message_id)
            .collect())
    }

    /// Messages the user has liked, newest first.
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT}
                     JOIN likes l ON l.message_id = m.id
                     WHERE l.user_id = ?1
                     ORDER BY m.timestamp DESC, m.id DESC"
                ),
                params![user_id],
            )
        })
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        header_image_url: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        author_image_url: row.get(5)?,
    })
}

/// `column` is always one of our own identifiers, never user input.
fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    column: &str,
    value: P,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"
    ))?;
    Ok(stmt.query_row([value], map_user).optional()?)
}

fn query_users(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"))?;
    Ok(stmt.query_row([id], map_message).optional()?)
}

fn query_messages(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_likes(conn: &Connection, sql: &str, id: i64) -> Result<Vec<LikeRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([id], |row| {
            Ok(LikeRow {
                user_id: row.get(0)?,
                message_id: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn follow_exists(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn missing_row() -> DbError {
    DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
}
