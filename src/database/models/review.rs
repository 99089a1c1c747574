use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{is_blank, Violation};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Stored review document. `movie_id` is a plain reference; nothing checks
/// that the movie exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub movie_id: String,
    pub user_name: String,
    pub review: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub movie_id: Option<String>,
    pub user_name: Option<String>,
    pub review: Option<String>,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub movie_id: String,
    pub user_name: String,
    pub review: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub movie_id: Option<String>,
    pub user_name: Option<String>,
    pub review: Option<String>,
    pub rating: Option<i32>,
}

impl ReviewPatch {
    pub fn apply(self, review: &mut Review) {
        if let Some(movie_id) = self.movie_id {
            review.movie_id = movie_id;
        }
        if let Some(user_name) = self.user_name {
            review.user_name = user_name;
        }
        if let Some(text) = self.review {
            review.review = text;
        }
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
    }
}

impl ReviewInput {
    pub fn missing_required(&self) -> bool {
        is_blank(&self.movie_id)
            || is_blank(&self.user_name)
            || is_blank(&self.review)
            || self.rating.is_none()
    }

    pub fn validate_new(self) -> Result<NewReview, Vec<Violation>> {
        let mut violations = Vec::new();

        if is_blank(&self.movie_id) {
            violations.push(Violation::new("movieId", "Movie id is required"));
        }
        if is_blank(&self.user_name) {
            violations.push(Violation::new("userName", "User name is required"));
        }
        if is_blank(&self.review) {
            violations.push(Violation::new("review", "Review text is required"));
        }
        let rating = match self.rating {
            Some(r) => check_rating(r, &mut violations),
            None => {
                violations.push(Violation::new("rating", "Rating is required"));
                None
            }
        };

        match (self.movie_id, self.user_name, self.review, rating) {
            (Some(movie_id), Some(user_name), Some(review), Some(rating)) if violations.is_empty() => {
                Ok(NewReview {
                    movie_id,
                    user_name,
                    review,
                    rating,
                })
            }
            _ => Err(violations),
        }
    }

    pub fn validate_patch(self) -> Result<ReviewPatch, Vec<Violation>> {
        let mut violations = Vec::new();

        if let Some(movie_id) = &self.movie_id {
            if movie_id.trim().is_empty() {
                violations.push(Violation::new("movieId", "Movie id cannot be empty"));
            }
        }
        let rating = self.rating.and_then(|r| check_rating(r, &mut violations));

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ReviewPatch {
            movie_id: self.movie_id,
            user_name: self.user_name,
            review: self.review,
            rating,
        })
    }
}

fn check_rating(rating: i64, violations: &mut Vec<Violation>) -> Option<i32> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        i32::try_from(rating).ok()
    } else {
        violations.push(Violation::new(
            "rating",
            format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING),
        ));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rating: i64) -> ReviewInput {
        ReviewInput {
            movie_id: Some(Uuid::new_v4().to_string()),
            user_name: Some("critic".to_string()),
            review: Some("Loved it".to_string()),
            rating: Some(rating),
        }
    }

    #[test]
    fn accepts_ratings_one_through_five() {
        for r in 1..=5 {
            assert_eq!(input(r).validate_new().unwrap().rating, r as i32);
        }
    }

    #[test]
    fn rejects_out_of_range_rating() {
        for r in [0, 6, -1] {
            let violations = input(r).validate_new().unwrap_err();
            assert_eq!(violations, vec![Violation::new("rating", "Rating must be between 1 and 5")]);
        }
    }

    #[test]
    fn missing_required_detects_blank_movie_id() {
        let mut i = input(3);
        assert!(!i.missing_required());
        i.movie_id = Some(" ".to_string());
        assert!(i.missing_required());
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let mut review = Review {
            id: Uuid::new_v4(),
            movie_id: "m1".to_string(),
            user_name: "critic".to_string(),
            review: "meh".to_string(),
            rating: 2,
        };
        let patch = ReviewInput {
            rating: Some(4),
            ..Default::default()
        }
        .validate_patch()
        .unwrap();
        patch.apply(&mut review);
        assert_eq!(review.rating, 4);
        assert_eq!(review.review, "meh");
    }

    #[test]
    fn patch_rejects_blank_movie_id() {
        let err = ReviewInput {
            movie_id: Some(String::new()),
            ..Default::default()
        }
        .validate_patch()
        .unwrap_err();
        assert_eq!(err[0].field, "movieId");
    }
}
