//! Review API endpoints.

use axum::{
    extract::{Query, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{Review, ReviewAggregate, ReviewInput, ReviewPage, ReviewPageQuery};
use crate::AppState;

/// GET /api/reviews - List all reviews, best rated first.
pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Vec<Review>> {
    success(state.reviews.load().await)
}

/// POST /api/reviews - Publish a review.
pub async fn create_review(
    State(state): State<AppState>,
    Json(input): Json<ReviewInput>,
) -> ApiResult<Review> {
    let review = state.reviews.add(input).await?;
    success(review)
}

/// GET /api/reviews/stats - Average rating and distribution.
pub async fn review_stats(State(state): State<AppState>) -> ApiResult<ReviewAggregate> {
    success(state.reviews.stats().await)
}

/// GET /api/reviews/page - One page of the carousel.
pub async fn review_page(
    State(state): State<AppState>,
    Query(query): Query<ReviewPageQuery>,
) -> ApiResult<ReviewPage> {
    success(state.reviews.page(query.page, query.per_page).await)
}
