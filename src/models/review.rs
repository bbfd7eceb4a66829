//! Customer review models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location stored when the reviewer leaves it blank.
pub const LOCATION_NOT_SPECIFIED: &str = "Not specified";
/// Service type stored when the reviewer selects none.
pub const DEFAULT_SERVICE_TYPE: &str = "General Service";

/// A published customer review. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub customer_name: String,
    pub location: String,
    pub rating: u8,
    pub review_text: String,
    pub service_type: String,
    pub date: DateTime<Utc>,
    /// Creation instant in epoch milliseconds
    pub timestamp: i64,
}

/// Request body for publishing a review.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Raw JSON so malformed ratings reach validation instead of failing to parse
    #[serde(default)]
    pub rating: Option<serde_json::Value>,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub service_type: Option<String>,
}

/// Summary statistics over the review collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAggregate {
    pub average: f64,
    pub total: usize,
    pub distribution: BTreeMap<u8, usize>,
}

/// One page of the ordered review list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Query string for `GET /api/reviews/page`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPageQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    3
}
