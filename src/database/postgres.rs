use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{
    Actor, Genre, Movie, MoviePatch, MovieWithReviews, NewMovie, NewReview, NewUser, Review,
    ReviewPatch, User,
};
use crate::database::store::{Store, StoreError};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Schema applied on connect. Each entry is one statement.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS movies (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL UNIQUE,
        release_date INTEGER NOT NULL CHECK (release_date BETWEEN 1900 AND 2100),
        genre TEXT NOT NULL,
        actors JSONB NOT NULL DEFAULT '[]'::jsonb,
        image_url TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY,
        movie_id TEXT NOT NULL,
        user_name TEXT NOT NULL,
        review TEXT NOT NULL,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5)
    )"#,
    "CREATE INDEX IF NOT EXISTS reviews_movie_id_idx ON reviews (movie_id)",
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )"#,
];

const MOVIE_COLUMNS: &str = "id, title, release_date, genre, actors, image_url";

// Left-joins each movie to its reviews in one pass. AVG over an empty set is
// NULL, which is exactly the "no reviews" average. Titles sort bytewise.
const MOVIES_WITH_REVIEWS: &str = r#"
    SELECT m.id, m.title, m.release_date, m.genre, m.actors, m.image_url,
           COALESCE(r.reviews, '[]'::jsonb) AS reviews,
           r.avg_rating
    FROM movies m
    LEFT JOIN LATERAL (
        SELECT jsonb_agg(jsonb_build_object(
                   '_id', rv.id,
                   'movieId', rv.movie_id,
                   'userName', rv.user_name,
                   'review', rv.review,
                   'rating', rv.rating)) AS reviews,
               AVG(rv.rating)::float8 AS avg_rating
        FROM reviews rv
        WHERE rv.movie_id = m.id::text
    ) r ON TRUE
"#;

const RATING_ORDER: &str = r#" ORDER BY r.avg_rating DESC NULLS LAST, m.title COLLATE "C" ASC"#;

#[derive(Debug, FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    release_date: i32,
    genre: String,
    actors: Json<Vec<Actor>>,
    image_url: Option<String>,
}

impl TryFrom<MovieRow> for Movie {
    type Error = StoreError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        let genre = row
            .genre
            .parse::<Genre>()
            .map_err(|e| StoreError::QueryError(format!("movie {}: {}", row.id, e)))?;
        Ok(Movie {
            id: row.id,
            title: row.title,
            release_date: row.release_date,
            genre,
            actors: row.actors.0,
            image_url: row.image_url,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovieWithReviewsRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    reviews: Json<Vec<Review>>,
    avg_rating: Option<f64>,
}

impl TryFrom<MovieWithReviewsRow> for MovieWithReviews {
    type Error = StoreError;

    fn try_from(row: MovieWithReviewsRow) -> Result<Self, Self::Error> {
        Ok(MovieWithReviews {
            movie: row.movie.try_into()?,
            reviews: row.reviews.0,
            avg_rating: row.avg_rating,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: Uuid,
    movie_id: String,
    user_name: String,
    review: String,
    rating: i32,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            movie_id: row.movie_id,
            user_name: row.user_name,
            review: row.review,
            rating: row.rating,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: Option<String>,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            username: row.username,
            password: row.password,
        }
    }
}

/// Maps unique-constraint failures to `Duplicate`, everything else passes through
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db.constraint().unwrap_or("unique constraint").to_string();
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Sqlx(err)
}

/// Postgres-backed store. Owns the pool for the life of the process.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        info!("Connected store (max_connections={})", config.max_connections);
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationError(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let sql = format!("SELECT {} FROM movies", MOVIE_COLUMNS);
        sqlx::query_as::<_, MovieRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Movie::try_from)
            .collect()
    }

    async fn list_movies_with_reviews(&self) -> Result<Vec<MovieWithReviews>, StoreError> {
        let sql = format!("{}{}", MOVIES_WITH_REVIEWS, RATING_ORDER);
        sqlx::query_as::<_, MovieWithReviewsRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(MovieWithReviews::try_from)
            .collect()
    }

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let sql = format!("SELECT {} FROM movies WHERE id = $1", MOVIE_COLUMNS);
        sqlx::query_as::<_, MovieRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Movie::try_from)
            .transpose()
    }

    async fn find_movie_with_reviews(&self, id: Uuid) -> Result<Option<MovieWithReviews>, StoreError> {
        let sql = format!("{} WHERE m.id = $1", MOVIES_WITH_REVIEWS);
        sqlx::query_as::<_, MovieWithReviewsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(MovieWithReviews::try_from)
            .transpose()
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        let sql = format!("SELECT {} FROM movies WHERE title = $1", MOVIE_COLUMNS);
        sqlx::query_as::<_, MovieRow>(&sql)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?
            .map(Movie::try_from)
            .transpose()
    }

    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        let sql = format!(
            "INSERT INTO movies ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = MOVIE_COLUMNS
        );
        sqlx::query_as::<_, MovieRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&movie.title)
            .bind(movie.release_date)
            .bind(movie.genre.as_str())
            .bind(Json(&movie.actors))
            .bind(&movie.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?
            .try_into()
    }

    async fn update_movie(&self, id: Uuid, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        let sql = format!(
            "UPDATE movies SET
                title = COALESCE($2, title),
                release_date = COALESCE($3, release_date),
                genre = COALESCE($4, genre),
                actors = COALESCE($5, actors),
                image_url = COALESCE($6, image_url)
             WHERE id = $1
             RETURNING {}",
            MOVIE_COLUMNS
        );
        sqlx::query_as::<_, MovieRow>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.release_date)
            .bind(patch.genre.map(|g| g.as_str()))
            .bind(patch.actors.map(Json))
            .bind(patch.image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .map(Movie::try_from)
            .transpose()
    }

    async fn delete_movie_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        let sql = format!("DELETE FROM movies WHERE title = $1 RETURNING {}", MOVIE_COLUMNS);
        sqlx::query_as::<_, MovieRow>(&sql)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?
            .map(Movie::try_from)
            .transpose()
    }

    async fn list_reviews(&self, movie_id: &str) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, movie_id, user_name, review, rating FROM reviews WHERE movie_id = $1",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (id, movie_id, user_name, review, rating)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, movie_id, user_name, review, rating",
        )
        .bind(Uuid::new_v4())
        .bind(&review.movie_id)
        .bind(&review.user_name)
        .bind(&review.review)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_review(&self, id: Uuid, patch: ReviewPatch) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "UPDATE reviews SET
                movie_id = COALESCE($2, movie_id),
                user_name = COALESCE($3, user_name),
                review = COALESCE($4, review),
                rating = COALESCE($5, rating)
             WHERE id = $1
             RETURNING id, movie_id, user_name, review, rating",
        )
        .bind(id)
        .bind(patch.movie_id)
        .bind(patch.user_name)
        .bind(patch.review)
        .bind(patch.rating)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn delete_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "DELETE FROM reviews WHERE id = $1 RETURNING id, movie_id, user_name, review, rating",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, name, username, password)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, username, password",
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, username, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed store connection pool");
    }
}
