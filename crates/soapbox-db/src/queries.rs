use crate::models::{PostPatch, PostRow, PostWithVotesRow, UserRow, VoteOutcome};
use crate::Database;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};
use soapbox_types::models::VoteDirection;

/// Column list shared by every post query; `post_from_row` relies on this order.
const POST_COLUMNS: &str =
    "p.id, p.title, p.content, p.published, p.created_at, p.owner_id, u.email";

impl Database {
    // -- Users --

    /// Returns the new user's id, or `None` if the email is already registered.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (email, password) VALUES (?1, ?2)",
                (email, password_hash),
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, password, created_at FROM users WHERE email = ?1",
                [email],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, password, created_at FROM users WHERE id = ?1",
                [id],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, email, password, created_at FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Removes a user along with their posts and votes. Admin-only; there is
    /// no HTTP route for it.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Posts --

    pub fn create_post(
        &self,
        owner_id: i64,
        title: &str,
        content: &str,
        published: bool,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, published, owner_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![title, content, published, owner_id],
            )?;
            let id = conn.last_insert_rowid();
            query_post(conn, id)?.ok_or_else(|| anyhow!("Post {} missing right after insert", id))
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn get_post_with_votes(&self, id: i64) -> Result<Option<PostWithVotesRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS}, COUNT(v.post_id)
                 FROM posts p
                 JOIN users u ON u.id = p.owner_id
                 LEFT JOIN votes v ON v.post_id = p.id
                 WHERE p.id = ?1
                 GROUP BY p.id"
            );
            conn.query_row(&sql, [id], post_with_votes_from_row).optional()
        })
    }

    /// Posts whose title contains `search` (case-insensitive), with vote counts.
    pub fn list_posts_with_votes(
        &self,
        search: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PostWithVotesRow>> {
        self.with_conn(|conn| {
            // LEFT JOIN so posts without votes still show up with a zero count
            let sql = format!(
                "SELECT {POST_COLUMNS}, COUNT(v.post_id)
                 FROM posts p
                 JOIN users u ON u.id = p.owner_id
                 LEFT JOIN votes v ON v.post_id = p.id
                 WHERE fold(p.title) LIKE fold(?1) ESCAPE '\\'
                 GROUP BY p.id
                 ORDER BY p.id
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![like_pattern(search), limit, offset],
                    post_with_votes_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies `patch` and returns the updated post, or `None` if it does not exist.
    pub fn update_post(&self, id: i64, patch: &PostPatch) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts
                 SET title = COALESCE(?1, title),
                     content = COALESCE(?2, content),
                     published = COALESCE(?3, published)
                 WHERE id = ?4",
                rusqlite::params![patch.title, patch.content, patch.published, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_post(conn, id)
        })
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Votes --

    pub fn has_voted(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| query_vote_exists(conn, user_id, post_id))
    }

    /// Move the (user, post) vote between "no vote" and "voted".
    ///
    /// The post is checked before the vote state, so a missing post always
    /// reports `PostMissing` regardless of direction.
    pub fn cast_vote(&self, user_id: i64, post_id: i64, dir: VoteDirection) -> Result<VoteOutcome> {
        self.with_conn(|conn| {
            let post_exists = conn
                .query_row("SELECT 1 FROM posts WHERE id = ?1", [post_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !post_exists {
                return Ok(VoteOutcome::PostMissing);
            }

            let already_voted = query_vote_exists(conn, user_id, post_id)?;

            match (dir, already_voted) {
                (VoteDirection::Cast, true) => Ok(VoteOutcome::AlreadyVoted),
                (VoteDirection::Cast, false) => {
                    let inserted = conn.execute(
                        "INSERT INTO votes (user_id, post_id) VALUES (?1, ?2)",
                        (user_id, post_id),
                    );
                    match inserted {
                        Ok(_) => Ok(VoteOutcome::Added),
                        // Primary key backstop for a concurrent duplicate
                        Err(rusqlite::Error::SqliteFailure(e, _))
                            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                        {
                            Ok(VoteOutcome::AlreadyVoted)
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                (VoteDirection::Retract, true) => {
                    conn.execute(
                        "DELETE FROM votes WHERE user_id = ?1 AND post_id = ?2",
                        (user_id, post_id),
                    )?;
                    Ok(VoteOutcome::Removed)
                }
                (VoteDirection::Retract, false) => Ok(VoteOutcome::NotVoted),
            }
        })
    }
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let sql = format!(
        "SELECT {POST_COLUMNS}
         FROM posts p
         JOIN users u ON u.id = p.owner_id
         WHERE p.id = ?1"
    );
    conn.query_row(&sql, [id], post_from_row).optional()
}

fn query_vote_exists(conn: &Connection, user_id: i64, post_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM votes WHERE user_id = ?1 AND post_id = ?2",
            (user_id, post_id),
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        published: row.get(3)?,
        created_at: row.get(4)?,
        owner_id: row.get(5)?,
        owner_email: row.get(6)?,
    })
}

fn post_with_votes_from_row(row: &Row<'_>) -> rusqlite::Result<PostWithVotesRow> {
    Ok(PostWithVotesRow {
        post: post_from_row(row)?,
        votes: row.get(7)?,
    })
}

/// LIKE pattern matching `search` as a literal substring.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
