use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// Anonymous visitors can browse the full catalogue (reading never requires an
/// account, only contributing does), and the identity gateway endpoints
/// (register/login) live here by necessity.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New account creation. Every new account starts in the 'lurker' role
        // and must be validated by an administrator before contributing.
        .route("/register", post(handlers::register))
        // POST /login
        // Credential verification and session-token minting.
        .route("/login", post(handlers::login))
        // GET /restaurants?cuisine=...&search=...
        // Lists restaurants with cuisine and free-text filters. Each entry
        // carries its rating summary, derived from the review set on read.
        .route("/restaurants", get(handlers::list_restaurants))
        // GET /restaurants/meta/cuisines
        // Distinct cuisine types currently in use, for the client's filter UI.
        // Registered before the {id} route so it is never captured as an ID.
        .route("/restaurants/meta/cuisines", get(handlers::list_cuisines))
        // GET /restaurants/{id}
        // Detailed view of a single restaurant with its rating summary.
        .route("/restaurants/{id}", get(handlers::get_restaurant_details))
        // GET /restaurants/{id}/reviews
        // All reviews for a restaurant, newest first.
        .route("/restaurants/{id}/reviews", get(handlers::list_reviews))
        // GET /geocode/search?q=...
        // Forward geocoding through the rate-limited gateway. Public because
        // the map view uses it for address lookups before login.
        .route("/geocode/search", get(handlers::geocode_search))
        // GET /geocode/reverse?lat=...&lon=...
        // Reverse geocoding for the map's click-to-address feature.
        .route("/geocode/reverse", get(handlers::geocode_reverse))
}
