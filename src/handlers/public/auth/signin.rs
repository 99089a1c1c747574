use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{generate_jwt, verify_password, Claims, TOKEN_SCHEME};
use crate::error::ApiError;
use crate::handlers::non_blank;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

const AUTH_FAILED: &str = "Authentication failed.";

#[derive(Debug, Default, Deserialize)]
pub struct SigninRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /signin - Verify credentials and issue a token
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "msg": "...", "token": "JWT eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// The token value is sent back verbatim in the `Authorization` header.
/// Unknown usernames and wrong passwords both produce the same 401.
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SigninRequest>,
) -> ApiResult<String> {
    let (username, password) = match (non_blank(body.username), body.password) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(ApiError::bad_request(
                "Please include both username and password to signin.",
            ))
        }
    };

    let Some(user) = state.run(state.store.find_user_by_username(&username)).await? else {
        warn!("Signin failed, no user '{}'", username);
        return Err(ApiError::unauthorized(AUTH_FAILED));
    };

    if !verify_password(password, user.password.clone()).await? {
        warn!("Signin failed, bad password for '{}'", username);
        return Err(ApiError::unauthorized(AUTH_FAILED));
    }

    let security = &state.config.security;
    let claims = Claims::new(user.id, user.username, security.jwt_expiry_hours)?;
    let jwt = generate_jwt(&claims, &security.jwt_secret)?;

    info!("Issued token for '{}'", claims.username);
    Ok(ApiResponse::with(
        "Authentication successful.",
        "token",
        format!("{} {}", TOKEN_SCHEME, jwt),
    ))
}
