//! Customer review store.
//!
//! Reviews live as one JSON array under a single store key. The collection is
//! append-only: new reviews are prepended and nothing is ever edited or removed.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::{Store, StoreError};
use crate::models::{
    Review, ReviewAggregate, ReviewInput, ReviewPage, DEFAULT_SERVICE_TYPE,
    LOCATION_NOT_SPECIFIED,
};

/// Store key holding the serialized review collection.
pub const REVIEWS_KEY: &str = "castleCrewReviews";

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_REVIEW_CHARS: usize = 15;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to persist reviews: {0}")]
    Persistence(#[from] StoreError),
}

/// Append-only review collection over an injected store.
pub struct ReviewStore {
    store: Arc<dyn Store>,
    write_lock: Mutex<()>,
}

impl ReviewStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All reviews, best rated first and newest first within a rating.
    pub async fn load(&self) -> Vec<Review> {
        let mut reviews = self.read_raw().await;
        sort_reviews(&mut reviews);
        reviews
    }

    /// Validate and publish a review.
    pub async fn add(&self, input: ReviewInput) -> Result<Review, ReviewError> {
        let rating = validate(&input)?;

        let now = Utc::now();
        let review = Review {
            id: new_review_id(now.timestamp_millis()),
            customer_name: input.customer_name.trim().to_string(),
            location: non_blank_or(input.location.as_deref(), LOCATION_NOT_SPECIFIED),
            rating,
            review_text: input.review_text.trim().to_string(),
            service_type: non_blank_or(input.service_type.as_deref(), DEFAULT_SERVICE_TYPE),
            date: now,
            timestamp: now.timestamp_millis(),
        };

        let _guard = self.write_lock.lock().await;
        // A collection that cannot be read must not be replaced
        let mut reviews = self.read_strict().await?;
        reviews.insert(0, review.clone());

        let payload = serde_json::to_string(&reviews).map_err(StoreError::from)?;
        self.store.write(REVIEWS_KEY, &payload).await?;

        tracing::info!(
            review_id = %review.id,
            rating = review.rating,
            total = reviews.len(),
            "Review published"
        );
        Ok(review)
    }

    /// Aggregate statistics, recomputed from the stored collection.
    pub async fn stats(&self) -> ReviewAggregate {
        aggregate(&self.load().await)
    }

    /// One page of the ordered list; the page index wraps around.
    pub async fn page(&self, page: usize, per_page: usize) -> ReviewPage {
        paginate(self.load().await, page, per_page)
    }

    /// Collection in stored (insertion) order; unreadable data counts as empty.
    async fn read_raw(&self) -> Vec<Review> {
        self.read_strict().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read reviews, treating as empty: {}", e);
            Vec::new()
        })
    }

    /// Collection in stored order. Only an absent key counts as empty.
    async fn read_strict(&self) -> Result<Vec<Review>, StoreError> {
        match self.store.read(REVIEWS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Checks fields in a fixed order and returns the validated rating.
fn validate(input: &ReviewInput) -> Result<u8, ValidationError> {
    if input.customer_name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError {
            field: "customerName",
            message: "Please enter your full name".to_string(),
        });
    }
    if input.review_text.trim().chars().count() < MIN_REVIEW_CHARS {
        return Err(ValidationError {
            field: "reviewText",
            message: format!(
                "Please write a more detailed review (at least {} characters)",
                MIN_REVIEW_CHARS
            ),
        });
    }
    match input.rating.as_ref().and_then(whole_number) {
        Some(r @ 1..=5) => Ok(r as u8),
        _ => Err(ValidationError {
            field: "rating",
            message: "Please select a valid rating".to_string(),
        }),
    }
}

/// Integer ratings, also when sent as a numeric string ("5").
fn whole_number(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn new_review_id(millis: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("review_{}_{}", millis, &suffix[..9])
}

/// Stable sort: rating descending, then date descending.
pub fn sort_reviews(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| match b.rating.cmp(&a.rating) {
        Ordering::Equal => b.date.cmp(&a.date),
        other => other,
    });
}

pub fn aggregate(reviews: &[Review]) -> ReviewAggregate {
    if reviews.is_empty() {
        return ReviewAggregate {
            average: 0.0,
            total: 0,
            distribution: BTreeMap::new(),
        };
    }

    let total = reviews.len();
    let sum: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    let average = ((sum as f64 / total as f64) * 10.0).round() / 10.0;

    let mut distribution = BTreeMap::new();
    for review in reviews {
        *distribution.entry(review.rating).or_insert(0) += 1;
    }

    ReviewAggregate {
        average,
        total,
        distribution,
    }
}

pub fn paginate(reviews: Vec<Review>, page: usize, per_page: usize) -> ReviewPage {
    let per_page = per_page.max(1);
    let total_pages = reviews.len().div_ceil(per_page);
    if total_pages == 0 {
        return ReviewPage {
            reviews,
            page: 0,
            per_page,
            total_pages,
        };
    }

    let page = page % total_pages;
    let reviews = reviews
        .into_iter()
        .skip(page * per_page)
        .take(per_page)
        .collect();

    ReviewPage {
        reviews,
        page,
        per_page,
        total_pages,
    }
}
