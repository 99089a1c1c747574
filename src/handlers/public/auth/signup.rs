use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::hash_password;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::handlers::{duplicate_as, non_blank};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /signup - Create an account
///
/// Expected Input:
/// ```json
/// { "username": "string", "password": "string", "name": "string (optional)" }
/// ```
///
/// The password is stored only as a bcrypt hash. A taken username yields
/// 409 and never creates a second account.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> ApiResult {
    let (username, password) = match (non_blank(body.username), body.password) {
        (Some(username), Some(password)) if !password.is_empty() => (username, password),
        _ => {
            return Err(ApiError::bad_request(
                "Please include both username and password to signup.",
            ))
        }
    };

    if state.run(state.store.find_user_by_username(&username)).await?.is_some() {
        warn!("Signup rejected, username '{}' already taken", username);
        return Err(ApiError::conflict(DUPLICATE_USERNAME));
    }

    let password_hash = hash_password(password, state.config.security.bcrypt_cost).await?;

    // The unique index still guards against a concurrent signup slipping past the check above
    let user = state
        .timed(state.store.insert_user(NewUser {
            name: body.name,
            username,
            password_hash,
        }))
        .await
        .map_err(|e| duplicate_as(e, DUPLICATE_USERNAME))?;

    info!("Created user '{}' ({})", user.username, user.id);
    Ok(ApiResponse::message("Successfully created new user.").created())
}
