use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{error, info, warn};

use soapbox_db::Database;
use soapbox_types::api::{LoginForm, Token};

use crate::config::Settings;
use crate::error::ApiError;
use crate::extract::OptionalForm;
use crate::password;
use crate::sanitize;
use crate::users::normalize_email;
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
}

impl AppStateInner {
    pub fn new(db: Database, settings: &Settings) -> AppState {
        Arc::new(Self {
            db,
            tokens: TokenService::from_settings(settings),
        })
    }
}

/// Run blocking DB work (and password hashing) off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}

/// POST /login: exchange email + password for a bearer token.
///
/// Unknown email, wrong password, missing fields and a missing body all
/// produce the same 403 so callers cannot tell which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    OptionalForm(form): OptionalForm<LoginForm>,
) -> Result<Json<Token>, ApiError> {
    let email = sanitize::clean(&normalize_email(&form.username));
    let password = form.password;

    let user_id = run_blocking(&state, move |db| {
        let Some(user) = db.get_user_by_email(&email)? else {
            warn!("Login attempt for unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        if !password::verify_password(&password, &user.password) {
            warn!("Login attempt with wrong password for user {}", user.id);
            return Err(ApiError::InvalidCredentials);
        }

        Ok(user.id)
    })
    .await?;

    let access_token = state.tokens.issue(user_id)?;
    info!("User {} logged in", user_id);

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
