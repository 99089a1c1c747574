use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Movie, MovieInput, MIN_ACTORS};
use crate::error::ApiError;
use crate::handlers::{duplicate_as, non_blank, parse_id};
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const DUPLICATE_TITLE: &str = "Movie already exists.";
const NOT_FOUND: &str = "Movie not found.";

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    /// `review=true` joins reviews and the average rating
    pub review: Option<String>,
}

impl ReviewQuery {
    fn wants_reviews(&self) -> bool {
        self.review.as_deref() == Some("true")
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieUpdateRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: MovieInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieDeleteRequest {
    pub title: Option<String>,
}

/// GET /movies?review=true|false
///
/// With reviews: every movie plus `reviews` and `avgRating`, best rated
/// first, unrated last, ties by title. Without: plain documents, unordered.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Response, ApiError> {
    if query.wants_reviews() {
        let movies = state.run(state.store.list_movies_with_reviews()).await?;
        Ok(Json(movies).into_response())
    } else {
        let movies = state.run(state.store.list_movies()).await?;
        Ok(Json(movies).into_response())
    }
}

/// GET /movies/:movieId?review=true|false
///
/// A missing movie is 404 whether or not reviews were requested.
pub async fn get(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Response, ApiError> {
    let id = parse_id(&movie_id, "movie")?;

    if query.wants_reviews() {
        let movie = state
            .run(state.store.find_movie_with_reviews(id))
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        Ok(Json(movie).into_response())
    } else {
        let movie = state
            .run(state.store.find_movie(id))
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        Ok(Json(movie).into_response())
    }
}

/// POST /movies - requires title, releaseDate, genre and at least 3 actors
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<MovieInput>,
) -> ApiResult<Movie> {
    if input.missing_required() {
        return Err(ApiError::bad_request("Please include all required fields."));
    }
    if input.actors.as_ref().map_or(0, Vec::len) < MIN_ACTORS {
        return Err(ApiError::bad_request(format!(
            "Please include at least {} actors.",
            MIN_ACTORS
        )));
    }
    let movie = input.validate_new()?;

    // Check-then-insert; the unique index on title closes the race
    if state.run(state.store.find_movie_by_title(&movie.title)).await?.is_some() {
        return Err(ApiError::conflict(DUPLICATE_TITLE));
    }

    let created = state
        .timed(state.store.insert_movie(movie))
        .await
        .map_err(|e| duplicate_as(e, DUPLICATE_TITLE))?;

    info!("{} created movie '{}' ({})", user.username, created.title, created.id);
    Ok(ApiResponse::with("Movie added successfully.", "movie", created).created())
}

/// PUT /movies - partial update keyed by `_id`
///
/// Without `_id` the body's `title` selects the movie instead, and the title
/// itself is left unchanged.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<MovieUpdateRequest>,
) -> ApiResult<Movie> {
    let id = match non_blank(body.id) {
        Some(raw) => parse_id(&raw, "movie")?,
        None => {
            let title = body
                .fields
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| ApiError::bad_request("_id or title is required to update a movie."))?;
            state
                .run(state.store.find_movie_by_title(title))
                .await?
                .ok_or_else(|| ApiError::not_found(NOT_FOUND))?
                .id
        }
    };

    let patch = body.fields.validate_patch()?;
    let updated = state
        .timed(state.store.update_movie(id, patch))
        .await
        .map_err(|e| duplicate_as(e, "Another movie already has that title."))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("{} updated movie '{}' ({})", user.username, updated.title, updated.id);
    Ok(ApiResponse::with("Movie updated successfully.", "movie", updated))
}

/// DELETE /movies - body `{ "title": "..." }`
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<MovieDeleteRequest>,
) -> ApiResult {
    let title = non_blank(body.title)
        .ok_or_else(|| ApiError::bad_request("Please include the title of the movie to delete."))?;

    let deleted = state
        .run(state.store.delete_movie_by_title(&title))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("{} deleted movie '{}' ({})", user.username, deleted.title, deleted.id);
    Ok(ApiResponse::message("Movie deleted successfully."))
}
