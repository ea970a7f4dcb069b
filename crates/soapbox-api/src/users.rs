use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use soapbox_types::api::{CreateUserRequest, UserResponse};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::password;
use crate::sanitize;

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, |db| Ok(db.list_users()?)).await?;

    let users: Vec<UserResponse> = rows
        .into_iter()
        .map(|row| UserResponse {
            id: row.id,
            email: row.email,
        })
        .collect();

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation(
            "value is not a valid email address".to_string(),
        ));
    }

    let email = sanitize::clean(&normalize_email(&req.email));
    let plaintext = req.password;

    let user = run_blocking(&state, move |db| {
        if db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::EmailTaken(email));
        }

        let password_hash = password::hash_password(&plaintext)?;
        // The unique index settles a registration race for the same email
        let Some(id) = db.create_user(&email, &password_hash)? else {
            return Err(ApiError::EmailTaken(email));
        };
        Ok(UserResponse { id, email })
    })
    .await?;

    info!("Registered user {} <{}>", user.id, user.email);

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_blocking(&state, move |db| Ok(db.get_user_by_id(id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User with id: {} was not found", id)))?;

    Ok(Json(UserResponse {
        id: row.id,
        email: row.email,
    }))
}

/// Domains are case-insensitive, so the domain part is stored lowercased.
/// The local part is kept as typed.
pub(crate) fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Structural address check: `local@domain.tld`, ASCII only.
fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    tld_ok
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
