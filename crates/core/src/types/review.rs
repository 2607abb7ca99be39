//! Shop reviews.
//!
//! Reviews are written once and never edited. They are not sent to the
//! backend; the site keeps them with the visitor's session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user::User;

/// Highest star rating a review can give.
pub const MAX_RATING: u8 = 5;

/// A review left on a shop's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub shop_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    /// `YYYY-MM-DD`.
    pub created_at: String,
}

/// Reasons a review is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be between 1 and {MAX_RATING}")]
    Rating,
    #[error("comment cannot be empty")]
    EmptyComment,
}

impl Review {
    /// Create a review, attributing it to `author` or to a guest.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Rating`] for a rating outside `1..=5` and
    /// [`ReviewError::EmptyComment`] for a blank comment.
    pub fn create(
        shop_id: &str,
        author: Option<&User>,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ReviewError> {
        if !(1..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::Rating);
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        let (user_id, user_name) = match author {
            Some(user) if !user.full_name().is_empty() => (user.userid.clone(), user.full_name()),
            Some(user) => (user.userid.clone(), user.email.clone()),
            None => ("guest".to_string(), "Guest User".to_string()),
        };

        Ok(Self {
            id: format!("new-{}", now.timestamp_millis()),
            shop_id: shop_id.to_string(),
            user_id,
            user_name,
            rating,
            comment: comment.to_string(),
            created_at: now.format("%Y-%m-%d").to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::Role;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_guest_review() {
        let review = Review::create("DMP-2025-1001", None, 4, "  Friendly staff ", now()).unwrap();
        assert_eq!(review.user_id, "guest");
        assert_eq!(review.user_name, "Guest User");
        assert_eq!(review.comment, "Friendly staff");
        assert_eq!(review.created_at, "2025-03-14");
        assert_eq!(review.id, format!("new-{}", now().timestamp_millis()));
    }

    #[test]
    fn test_signed_in_review_uses_name() {
        let user = User {
            userid: "2".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: String::new(),
            address: String::new(),
            role: Role::User,
        };
        let review = Review::create("x", Some(&user), 5, "Great", now()).unwrap();
        assert_eq!(review.user_id, "2");
        assert_eq!(review.user_name, "John Doe");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            Review::create("x", None, 0, "ok", now()),
            Err(ReviewError::Rating)
        );
        assert_eq!(
            Review::create("x", None, 6, "ok", now()),
            Err(ReviewError::Rating)
        );
        assert_eq!(
            Review::create("x", None, 3, "   ", now()),
            Err(ReviewError::EmptyComment)
        );
    }
}
