use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::Review;

/// RatingSummary
///
/// The derived aggregate over a restaurant's review set: arithmetic mean rating
/// and review count. Never persisted; recomputed wherever a rating is displayed
/// so a stale value can never be served after a review changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RatingSummary {
    // Unrounded mean; rounding happens at presentation time only.
    pub average_rating: f64,
    pub count: i64,
}

/// aggregate
///
/// Single entry point for rating aggregation. An empty review set yields
/// `{ average_rating: 0.0, count: 0 }`.
pub fn aggregate(reviews: &[Review]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary {
            average_rating: 0.0,
            count: 0,
        };
    }

    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    RatingSummary {
        average_rating: sum as f64 / reviews.len() as f64,
        count: reviews.len() as i64,
    }
}
