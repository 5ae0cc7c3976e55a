use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Defines the account-lifecycle routes exclusively accessible to accounts with
/// the 'admin' role: the validation queue, role transitions and account removal.
///
/// Access Control:
/// This entire router is nested under '/admin' behind the authentication layer;
/// the explicit `role == "admin"` check happens inside each handler, after the
/// `AuthUser` extractor has resolved the caller's current role from the store.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/accounts
        // Lists every active account, ordered by role then name.
        .route("/accounts", get(handlers::list_accounts))
        // GET /admin/accounts/lurkers
        // The validation queue: active lurkers awaiting promotion, oldest first.
        .route("/accounts/lurkers", get(handlers::list_lurkers))
        // PUT /admin/accounts/{id}/role
        // The account state machine: validation, promotion (with email
        // confirmation), demotion. All guards run before anything is persisted.
        .route("/accounts/{id}/role", put(handlers::change_role))
        // PUT /admin/accounts/{id}/validate
        // Legacy lurker-to-user fast path kept for older clients; rejects any
        // target that is not a lurker.
        .route("/accounts/{id}/validate", put(handlers::validate_account))
        // DELETE /admin/accounts/{id}
        // Removes an account. The seed admin and the caller's own account are
        // protected by the lifecycle guards.
        .route(
            "/accounts/{id}",
            axum::routing::delete(handlers::delete_account),
        )
}
