use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any account that has passed the
/// authentication layer. Role gates beyond "logged in" are enforced inside the
/// handlers and the intake pipeline: lurkers can reach these endpoints but are
/// rejected when they try to contribute.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module, so handlers always
/// receive a resolved identity with the account's current role.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the authenticated account's own profile.
        .route("/me", get(handlers::get_me))
        // PUT /me/password
        // Changes the caller's password after re-verifying the current one.
        .route("/me/password", put(handlers::change_password))
        // --- Restaurant Intake & Maintenance ---
        // POST /restaurants
        // Submits a new restaurant through the intake pipeline (role gate,
        // cuisine gate, geocoding, duplicate check, optional first review).
        .route("/restaurants", post(handlers::submit_restaurant))
        // PUT/DELETE /restaurants/{id}
        // Owner-or-admin maintenance. Ownership and the owner's restricted
        // field set are enforced within the handler logic.
        .route(
            "/restaurants/{id}",
            put(handlers::update_restaurant).delete(handlers::delete_restaurant),
        )
        // --- Reviews ---
        // POST /reviews
        // Posts a review. One per author per restaurant, enforced by the
        // store's composite unique constraint.
        .route("/reviews", post(handlers::create_review))
        // PUT/DELETE /reviews/{id}
        // Author-or-admin maintenance of an existing review.
        .route(
            "/reviews/{id}",
            put(handlers::update_review).delete(handlers::delete_review),
        )
}
