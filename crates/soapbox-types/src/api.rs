use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::VoteDirection;

// -- JWT Claims --

/// Bearer token payload. `exp` is a unix timestamp in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: usize,
}

// -- Auth --

/// OAuth2-style password form. `username` carries the email address.
///
/// Missing fields decode as empty strings so that they fail the same way as
/// wrong credentials instead of surfacing as a validation error.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

/// Only the supplied fields are written; absent ones keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner: UserResponse,
}

/// A post together with the number of votes it has received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithVotes {
    #[serde(rename = "Post")]
    pub post: PostResponse,
    pub votes: i64,
}

// -- Votes --

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub post_id: i64,
    pub dir: VoteDirection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
