use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Review, ReviewInput};
use crate::error::ApiError;
use crate::handlers::{non_blank, parse_id};
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const NOT_FOUND: &str = "Review not found.";
const MISSING_ID: &str = "No Id entered.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListRequest {
    pub movie_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUpdateRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: ReviewInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewDeleteRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

/// GET /review - reviews for one movie, unordered
///
/// `movieId` is read from the JSON body, falling back to `?movieId=`.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewListRequest>,
    ApiJson(body): ApiJson<ReviewListRequest>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let movie_id = non_blank(body.movie_id)
        .or_else(|| non_blank(query.movie_id))
        .ok_or_else(|| ApiError::bad_request(MISSING_ID))?;

    let reviews = state.run(state.store.list_reviews(&movie_id)).await?;
    Ok(Json(reviews))
}

/// POST /review - requires movieId, userName, review and rating (1-5)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> ApiResult<Review> {
    if input.missing_required() {
        return Err(ApiError::bad_request("Please include all required fields."));
    }
    let review = input.validate_new()?;

    let created = state.run(state.store.insert_review(review)).await?;

    info!("{} reviewed movie {} ({})", user.username, created.movie_id, created.id);
    Ok(ApiResponse::with("Review added successfully.", "review", created).created())
}

/// PUT /review - partial update keyed by `_id`
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<ReviewUpdateRequest>,
) -> ApiResult<Review> {
    let raw = non_blank(body.id).ok_or_else(|| ApiError::bad_request(MISSING_ID))?;
    let id = parse_id(&raw, "review")?;
    let patch = body.fields.validate_patch()?;

    let updated = state
        .run(state.store.update_review(id, patch))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("{} updated review {}", user.username, updated.id);
    Ok(ApiResponse::with("Review updated successfully.", "review", updated))
}

/// DELETE /review - body `{ "_id": "..." }`
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<ReviewDeleteRequest>,
) -> ApiResult {
    let raw = non_blank(body.id).ok_or_else(|| ApiError::bad_request(MISSING_ID))?;
    let id = parse_id(&raw, "review")?;

    let deleted = state
        .run(state.store.delete_review(id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("{} deleted review {}", user.username, deleted.id);
    Ok(ApiResponse::message("Review deleted successfully."))
}
