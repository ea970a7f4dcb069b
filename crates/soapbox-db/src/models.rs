//! Database row types. These map directly to SQLite rows.
//! Distinct from soapbox-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

/// A post joined with its owner's email.
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: String,
    pub owner_id: i64,
    pub owner_email: String,
}

pub struct PostWithVotesRow {
    pub post: PostRow,
    pub votes: i64,
}

/// Fields to overwrite on an existing post. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Result of applying a vote direction to a (user, post) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Added,
    Removed,
    PostMissing,
    AlreadyVoted,
    NotVoted,
}
