use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Account
///
/// Canonical identity record stored in the `accounts` table. The credential hash
/// lives on this struct for the login/password paths only; it is never serialized,
/// so the row type stays internal and `AccountResponse` is the API-facing shape.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    // Normalized (lowercased, trimmed) email. Unique at the database level.
    pub email: String,
    pub password_hash: String,
    // The RBAC field: 'lurker', 'user' or 'admin'. Parsed into `lifecycle::Role`
    // wherever the state machine needs it.
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Restaurant
///
/// An establishment record from the `restaurants` table. The (name, address) pair
/// carries a database unique constraint as the concurrency backstop behind the
/// semantic duplicate check.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    // Human-readable address as returned by the geocoder (or manually entered).
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    // Cuisine type; empty string means unset.
    pub cuisine_type: String,
    pub description: Option<String>,
    // FK to accounts.id (submitter).
    pub created_by: Uuid,
    // Self-service submissions are auto-validated; the flag is persisted but
    // never gates reads (no moderation queue exists for restaurants).
    pub is_validated: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Review
///
/// A single rating/comment from the `reviews` table. At most one review exists per
/// (author, restaurant) pair, enforced by a composite unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub author_id: Uuid,
    // Integer rating in [1, 5].
    pub rating: i32,
    pub comment: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Maximum length accepted for a review comment.
pub const MAX_COMMENT_LEN: usize = 500;

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public signup endpoint (POST /register). New accounts
/// always start as lurkers; only an admin can validate them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// ChangePasswordRequest
///
/// Input payload for PUT /me/password. The current password is re-verified before
/// any mutation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// ChangeRoleRequest
///
/// Input payload for the admin role-transition endpoint. `email_confirmation` is
/// only consulted when promoting a non-admin into the admin role, where it must
/// match the target's email (case-insensitively).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangeRoleRequest {
    pub new_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_confirmation: Option<String>,
}

/// FirstReview
///
/// Optional review attached to a restaurant submission, persisted only after the
/// restaurant itself has been created.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FirstReview {
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// ResolvedAddress
///
/// A pre-validated address carried on re-submission after a geocoding miss. Its
/// presence bypasses the gateway call in the intake pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ResolvedAddress {
    pub lat: f64,
    pub lon: f64,
    pub display_address: String,
}

/// SubmitRestaurantRequest
///
/// Input payload for the intake pipeline (POST /restaurants).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmitRestaurantRequest {
    pub name: String,
    // Free-text city or full address; combined with the name for forward geocoding.
    pub city_or_address: String,
    // Mandatory at submission, unlike on direct edits where it may remain blank.
    pub cuisine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_review: Option<FirstReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedAddress>,
}

/// UpdateRestaurantRequest
///
/// Partial update payload for PUT /restaurants/{id}. Admins may touch every field;
/// owners are limited to `cuisine_type` and `description` since the other fields
/// feed the duplicate-detection identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRestaurantRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreateReviewRequest
///
/// Input payload for POST /reviews.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub restaurant_id: Uuid,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// UpdateReviewRequest
///
/// Partial update payload for PUT /reviews/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// --- Output Schemas ---

/// AccountResponse
///
/// API-facing account shape. Strips the credential hash from the internal row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// TokenResponse
///
/// Output of a successful login: the minted credential plus the resolved account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    pub account: AccountResponse,
}

/// RoleChangeResponse
///
/// Output of a successful role transition. The message reflects the semantic
/// direction of the change (validation, promotion, demotion) for audit/UX use;
/// it is derived from (old role, new role) and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleChangeResponse {
    pub message: String,
    pub account: AccountResponse,
}

/// RatedRestaurant
///
/// A restaurant enriched with its derived rating summary. The aggregate is
/// recomputed from the review set on every read, so it can never go stale.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RatedRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub average_rating: f64,
    pub review_count: i64,
}

/// IntakeResponse
///
/// Output of a successful restaurant submission. `warning` is populated when the
/// restaurant was created but the attached first review could not be persisted
/// (acceptable partial outcome, no rollback).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct IntakeResponse {
    pub restaurant: Restaurant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// DuplicateResponse
///
/// Returned with 409 when the duplicate-match engine recognizes the submission.
/// Carries the existing restaurant so the caller can offer attaching the pending
/// review to it instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DuplicateResponse {
    pub message: String,
    pub existing: Restaurant,
}

/// ReverseGeocodeResponse
///
/// Output of GET /geocode/reverse.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReverseGeocodeResponse {
    pub address: String,
}

/// ErrorBody
///
/// Uniform JSON error payload. Every discriminated error outcome maps to a status
/// code plus one of these.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorBody {
    pub message: String,
}
