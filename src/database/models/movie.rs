use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{is_blank, Review, Violation};

pub const MIN_RELEASE_YEAR: i64 = 1900;
pub const MAX_RELEASE_YEAR: i64 = 2100;

/// Minimum cast size accepted when a movie is first created
pub const MIN_ACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Mystery,
    Thriller,
    Western,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Comedy,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Mystery,
        Genre::Thriller,
        Genre::Western,
        Genre::ScienceFiction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::Western => "Western",
            Genre::ScienceFiction => "Science Fiction",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid genre", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default)]
    pub actor_name: String,
    #[serde(default)]
    pub character_name: String,
}

/// Stored movie document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub release_date: i32,
    pub genre: Genre,
    pub actors: Vec<Actor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Movie joined with its reviews and the derived average rating.
///
/// `avg_rating` serializes as `null` (never omitted, never zero) for a movie
/// without reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieWithReviews {
    #[serde(flatten)]
    pub movie: Movie,
    pub reviews: Vec<Review>,
    pub avg_rating: Option<f64>,
}

impl MovieWithReviews {
    pub fn from_reviews(movie: Movie, reviews: Vec<Review>) -> Self {
        let avg_rating = average_rating(&reviews);
        Self {
            movie,
            reviews,
            avg_rating,
        }
    }
}

/// Mean rating over `reviews`, or `None` when there are none
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    Some(total as f64 / reviews.len() as f64)
}

/// Orders by average rating descending with unrated movies last, then by title
/// ascending (byte order).
pub fn sort_by_rating(movies: &mut [MovieWithReviews]) {
    movies.sort_by(|a, b| {
        let by_rating = match (a.avg_rating, b.avg_rating) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_rating.then_with(|| a.movie.title.cmp(&b.movie.title))
    });
}

/// Loosely typed movie body as sent by clients for both create and update.
///
/// Every field is optional so that a missing field becomes a validation
/// message instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    pub title: Option<String>,
    pub release_date: Option<i64>,
    pub genre: Option<String>,
    pub actors: Option<Vec<Actor>>,
    pub image_url: Option<String>,
}

/// Validated payload ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: i32,
    pub genre: Genre,
    pub actors: Vec<Actor>,
    pub image_url: Option<String>,
}

/// Validated partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub release_date: Option<i32>,
    pub genre: Option<Genre>,
    pub actors: Option<Vec<Actor>>,
    pub image_url: Option<String>,
}

impl MoviePatch {
    /// Merge onto an existing document
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
        if let Some(genre) = self.genre {
            movie.genre = genre;
        }
        if let Some(actors) = self.actors {
            movie.actors = actors;
        }
        if let Some(image_url) = self.image_url {
            movie.image_url = Some(image_url);
        }
    }
}

impl MovieInput {
    /// True when any field required at creation is absent or blank
    pub fn missing_required(&self) -> bool {
        is_blank(&self.title)
            || self.release_date.is_none()
            || is_blank(&self.genre)
            || self.actors.is_none()
    }

    pub fn validate_new(self) -> Result<NewMovie, Vec<Violation>> {
        let mut violations = Vec::new();

        let title = match self.title {
            Some(t) if !t.trim().is_empty() => Some(t),
            _ => {
                violations.push(Violation::new("title", "Title is required"));
                None
            }
        };

        let release_date = match self.release_date {
            Some(year) => check_release_date(year, &mut violations),
            None => {
                violations.push(Violation::new("releaseDate", "Release date is required"));
                None
            }
        };

        let genre = match self.genre.as_deref() {
            Some(g) => check_genre(g, &mut violations),
            None => {
                violations.push(Violation::new("genre", "Genre is required"));
                None
            }
        };

        let actors = self.actors.unwrap_or_default();
        if actors.len() < MIN_ACTORS {
            violations.push(Violation::new(
                "actors",
                format!("At least {} actors are required", MIN_ACTORS),
            ));
        }

        match (title, release_date, genre) {
            (Some(title), Some(release_date), Some(genre)) if violations.is_empty() => Ok(NewMovie {
                title,
                release_date,
                genre,
                actors,
                image_url: self.image_url,
            }),
            _ => Err(violations),
        }
    }

    pub fn validate_patch(self) -> Result<MoviePatch, Vec<Violation>> {
        let mut violations = Vec::new();

        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                violations.push(Violation::new("title", "Title cannot be empty"));
            }
        }
        let release_date = self
            .release_date
            .and_then(|year| check_release_date(year, &mut violations));
        let genre = self
            .genre
            .as_deref()
            .and_then(|g| check_genre(g, &mut violations));

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(MoviePatch {
            title: self.title,
            release_date,
            genre,
            actors: self.actors,
            image_url: self.image_url,
        })
    }
}

fn check_release_date(year: i64, violations: &mut Vec<Violation>) -> Option<i32> {
    if year < MIN_RELEASE_YEAR {
        violations.push(Violation::new("releaseDate", "Must be greater than 1899"));
        None
    } else if year > MAX_RELEASE_YEAR {
        violations.push(Violation::new("releaseDate", "Must be less than 2101"));
        None
    } else {
        i32::try_from(year).ok()
    }
}

fn check_genre(value: &str, violations: &mut Vec<Violation>) -> Option<Genre> {
    match value.parse::<Genre>() {
        Ok(genre) => Some(genre),
        Err(msg) => {
            violations.push(Violation::new("genre", msg));
            None
        }
    }
}
