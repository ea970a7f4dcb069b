use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use soapbox_db::models::VoteOutcome;
use soapbox_types::api::{MessageResponse, VoteRequest};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::middleware::CurrentUser;

/// POST /vote/: `dir: 1` casts the caller's vote on a post, `dir: 0` retracts it.
pub async fn vote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user.id;
    let post_id = req.post_id;
    let dir = req.dir;

    let outcome = run_blocking(&state, move |db| Ok(db.cast_vote(user_id, post_id, dir)?)).await?;

    let message = match outcome {
        VoteOutcome::Added => "Successfully added vote",
        VoteOutcome::Removed => "Successfully deleted vote",
        VoteOutcome::PostMissing => {
            return Err(ApiError::NotFound(format!(
                "post with id: {} doesn't exist",
                post_id
            )));
        }
        VoteOutcome::AlreadyVoted => {
            return Err(ApiError::Conflict(format!(
                "user {} has already voted on post {}",
                user_id, post_id
            )));
        }
        VoteOutcome::NotVoted => return Err(ApiError::NotFound("Vote not found".to_string())),
    };

    info!("User {} vote on post {}: {:?}", user_id, post_id, outcome);

    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))))
}
