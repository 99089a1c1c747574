pub mod movie;
pub mod review;
pub mod user;

use serde::Serialize;

pub use movie::{
    average_rating, sort_by_rating, Actor, Genre, Movie, MovieInput, MoviePatch, MovieWithReviews,
    NewMovie, MIN_ACTORS,
};
pub use review::{NewReview, Review, ReviewInput, ReviewPatch};
pub use user::{NewUser, User};

/// A single failed field constraint, reported back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Treats `None` and blank strings alike, the way form-style clients send "nothing"
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}
