use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    sort_by_rating, Movie, MoviePatch, MovieWithReviews, NewMovie, NewReview, NewUser, Review,
    ReviewPatch, User,
};
use crate::database::store::{Store, StoreError};

#[derive(Debug, Default)]
struct Collections {
    movies: Vec<Movie>,
    reviews: Vec<Review>,
    users: Vec<User>,
}

impl Collections {
    fn reviews_for(&self, movie_id: &str) -> Vec<Review> {
        self.reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect()
    }

    fn joined(&self, movie: &Movie) -> MovieWithReviews {
        MovieWithReviews::from_reviews(movie.clone(), self.reviews_for(&movie.id.to_string()))
    }
}

/// Process-local store used for development without a database and for tests.
///
/// Unique constraints on movie title and username are enforced under the
/// write lock, so concurrent inserts cannot race past them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`; lets tests drive the request timeout
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            data: RwLock::default(),
            latency: Some(latency),
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.pause().await;
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.pause().await;
        Ok(self.data.read().await.movies.clone())
    }

    async fn list_movies_with_reviews(&self) -> Result<Vec<MovieWithReviews>, StoreError> {
        self.pause().await;
        let data = self.data.read().await;
        let mut movies: Vec<MovieWithReviews> = data.movies.iter().map(|m| data.joined(m)).collect();
        sort_by_rating(&mut movies);
        Ok(movies)
    }

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        self.pause().await;
        Ok(self.data.read().await.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn find_movie_with_reviews(&self, id: Uuid) -> Result<Option<MovieWithReviews>, StoreError> {
        self.pause().await;
        let data = self.data.read().await;
        Ok(data.movies.iter().find(|m| m.id == id).map(|m| data.joined(m)))
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        self.pause().await;
        Ok(self.data.read().await.movies.iter().find(|m| m.title == title).cloned())
    }

    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        if data.movies.iter().any(|m| m.title == movie.title) {
            return Err(StoreError::Duplicate(format!("movies.title = {}", movie.title)));
        }
        let stored = Movie {
            id: Uuid::new_v4(),
            title: movie.title,
            release_date: movie.release_date,
            genre: movie.genre,
            actors: movie.actors,
            image_url: movie.image_url,
        };
        data.movies.push(stored.clone());
        Ok(stored)
    }

    async fn update_movie(&self, id: Uuid, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        if let Some(title) = &patch.title {
            if data.movies.iter().any(|m| m.id != id && &m.title == title) {
                return Err(StoreError::Duplicate(format!("movies.title = {}", title)));
            }
        }
        Ok(data.movies.iter_mut().find(|m| m.id == id).map(|movie| {
            patch.apply(movie);
            movie.clone()
        }))
    }

    async fn delete_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        let index = data.movies.iter().position(|m| m.title == title);
        Ok(index.map(|i| data.movies.remove(i)))
    }

    async fn list_reviews(&self, movie_id: &str) -> Result<Vec<Review>, StoreError> {
        self.pause().await;
        Ok(self.data.read().await.reviews_for(movie_id))
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        self.pause().await;
        let stored = Review {
            id: Uuid::new_v4(),
            movie_id: review.movie_id,
            user_name: review.user_name,
            review: review.review,
            rating: review.rating,
        };
        self.data.write().await.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn update_review(&self, id: Uuid, patch: ReviewPatch) -> Result<Option<Review>, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        Ok(data.reviews.iter_mut().find(|r| r.id == id).map(|review| {
            patch.apply(review);
            review.clone()
        }))
    }

    async fn delete_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        let index = data.reviews.iter().position(|r| r.id == id);
        Ok(index.map(|i| data.reviews.remove(i)))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.pause().await;
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("users.username = {}", user.username)));
        }
        let stored = User {
            id: Uuid::new_v4(),
            name: user.name,
            username: user.username,
            password: user.password_hash,
        };
        data.users.push(stored.clone());
        Ok(stored)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.pause().await;
        Ok(self
            .data
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}
