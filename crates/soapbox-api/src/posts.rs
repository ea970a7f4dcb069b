use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use anyhow::anyhow;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use soapbox_db::models::{PostPatch, PostRow, PostWithVotesRow};
use soapbox_types::api::{
    CreatePostRequest, PostResponse, PostWithVotes, UpdatePostRequest, UserResponse,
};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::sanitize;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub search: String,
}

fn default_limit() -> u32 {
    10
}

/// Any authenticated user can read every post; ownership only gates writes.
pub async fn get_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PostQuery>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, move |db| {
        Ok(db.list_posts_with_votes(&query.search, query.limit, query.offset)?)
    })
    .await?;

    let posts = rows
        .into_iter()
        .map(post_with_votes)
        .collect::<Result<Vec<PostWithVotes>, _>>()?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_blocking(&state, move |db| Ok(db.get_post_with_votes(id)?))
        .await?
        .ok_or_else(|| post_not_found(id))?;

    Ok(Json(post_with_votes(row)?))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = sanitize::clean(&req.title);
    let content = sanitize::clean(&req.content);
    let published = req.published;
    let owner_id = user.id;

    let row = run_blocking(&state, move |db| {
        Ok(db.create_post(owner_id, &title, &content, published)?)
    })
    .await?;

    info!("Post {} created by {}", row.id, user.email);

    Ok((StatusCode::CREATED, Json(post_response(row)?)))
}

pub async fn update_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = PostPatch {
        title: req.title.as_deref().map(sanitize::clean),
        content: req.content.as_deref().map(sanitize::clean),
        published: req.published,
    };
    let caller = user.id;

    let row = run_blocking(&state, move |db| {
        let existing = db.get_post(id)?.ok_or_else(|| post_not_found(id))?;
        if existing.owner_id != caller {
            warn!("User {} tried to update post {} owned by {}", caller, id, existing.owner_id);
            return Err(ApiError::Forbidden);
        }

        db.update_post(id, &patch)?.ok_or_else(|| post_not_found(id))
    })
    .await?;

    info!("Post {} updated by {}", id, user.email);

    Ok(Json(post_response(row)?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    let caller = user.id;

    run_blocking(&state, move |db| {
        let existing = db.get_post(id)?.ok_or_else(|| post_not_found(id))?;
        if existing.owner_id != caller {
            warn!("User {} tried to delete post {} owned by {}", caller, id, existing.owner_id);
            return Err(ApiError::Forbidden);
        }

        db.delete_post(id)?;
        Ok(())
    })
    .await?;

    info!("Post {} deleted by {}", id, user.email);

    Ok(StatusCode::NO_CONTENT)
}

fn post_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("post with id: {} was not found", id))
}

fn post_with_votes(row: PostWithVotesRow) -> Result<PostWithVotes, ApiError> {
    Ok(PostWithVotes {
        post: post_response(row.post)?,
        votes: row.votes,
    })
}

fn post_response(row: PostRow) -> Result<PostResponse, ApiError> {
    let created_at = parse_created_at(&row.created_at).ok_or_else(|| {
        anyhow!("Corrupt created_at '{}' on post {}", row.created_at, row.id)
    })?;

    Ok(PostResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        published: row.published,
        created_at,
        owner_id: row.owner_id,
        owner: UserResponse {
            id: row.owner_id,
            email: row.owner_email,
        },
    })
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}
