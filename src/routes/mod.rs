/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the access tiers of the role model.

/// Routes accessible to everyone, including anonymous visitors: browsing
/// restaurants and reviews, registration, login, geocoding lookups.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a valid session; role-specific checks happen in the handlers.
pub mod authenticated;

/// Routes restricted exclusively to accounts with the 'admin' role:
/// the account-lifecycle endpoints.
pub mod admin;
