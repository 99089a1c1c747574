use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Movie, MoviePatch, MovieWithReviews, NewMovie, NewReview, NewUser, Review, ReviewPatch, User,
};

/// Errors surfaced by any `Store` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Duplicate value for unique field: {0}")]
    Duplicate(String),

    #[error("Store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Document store holding movies, reviews and users.
///
/// Each method is a single store round trip. Lookups that can miss return
/// `Option`; uniqueness violations come back as `StoreError::Duplicate`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    /// Every movie with its reviews and average rating, ordered by
    /// `sort_by_rating`
    async fn list_movies_with_reviews(&self) -> Result<Vec<MovieWithReviews>, StoreError>;

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError>;

    async fn find_movie_with_reviews(&self, id: Uuid) -> Result<Option<MovieWithReviews>, StoreError>;

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError>;

    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError>;

    async fn update_movie(&self, id: Uuid, patch: MoviePatch) -> Result<Option<Movie>, StoreError>;

    async fn delete_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError>;

    async fn list_reviews(&self, movie_id: &str) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn update_review(&self, id: Uuid, patch: ReviewPatch) -> Result<Option<Review>, StoreError>;

    async fn delete_review(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Release pooled resources on shutdown
    async fn close(&self) {}
}
