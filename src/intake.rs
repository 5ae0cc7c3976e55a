use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::dedupe::DuplicateMatcher;
use crate::geocode::{GeocodeError, Geocoded, Geocoder};
use crate::lifecycle::Role;
use crate::models::{MAX_COMMENT_LEN, Restaurant, Review, SubmitRestaurantRequest};
use crate::repository::{RepoError, Repository};

/// IntakeError
///
/// Rejections of a restaurant submission. The first two are local synchronous
/// validations; `GeocodeFailed` is recoverable by re-submitting with a manually
/// entered, pre-resolved address; `GeocodeUnavailable` is a provider outage the
/// caller may retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("your account must be validated by an administrator before submitting restaurants")]
    InsufficientRole,
    #[error("a cuisine type is required when submitting a restaurant")]
    CuisineRequired,
    #[error("the address could not be resolved")]
    GeocodeFailed,
    #[error("geocoding provider unavailable: {0}")]
    GeocodeUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// IntakeOutcome
///
/// The two steerable results of a submission. `Duplicate` is not a failure: the
/// caller is expected to offer attaching the pending first review to the
/// existing restaurant instead.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    Created {
        restaurant: Restaurant,
        review: Option<Review>,
        /// Set when the restaurant was persisted but its first review was not
        /// (acceptable partial outcome; never rolled back).
        warning: Option<String>,
    },
    Duplicate(Restaurant),
}

/// submit
///
/// The restaurant intake pipeline. Steps run in strict order with no partial
/// persistence before the restaurant insert:
/// 1. lurkers are rejected;
/// 2. a blank cuisine type is rejected (mandatory at submission, unlike on
///    direct edits);
/// 3. the address is forward-geocoded as "name, city" unless the request
///    carries a pre-resolved address;
/// 4. the duplicate-match engine runs against every known restaurant using the
///    resolved display address — a hit returns the existing record and creates
///    nothing;
/// 5. the restaurant is persisted, auto-validated;
/// 6. the optional first review is persisted, invalid or conflicting reviews
///    degrading to a warning on the created outcome.
///
/// A unique-constraint conflict on the restaurant insert (two submissions
/// racing past step 4) is resolved by re-running the match and reporting
/// `Duplicate`.
pub async fn submit(
    repo: &dyn Repository,
    geocoder: &dyn Geocoder,
    matcher: &dyn DuplicateMatcher,
    actor: &AuthUser,
    mut request: SubmitRestaurantRequest,
) -> Result<IntakeOutcome, IntakeError> {
    // 1. Role gate.
    let role = Role::parse(&actor.role).map_err(|_| IntakeError::InsufficientRole)?;
    if !role.may_contribute() {
        return Err(IntakeError::InsufficientRole);
    }

    // 2. Cuisine gate.
    if request.cuisine_type.trim().is_empty() {
        return Err(IntakeError::CuisineRequired);
    }

    // 3. Address resolution. A pre-resolved address (manual-entry fallback after
    // an earlier GeocodeFailed) bypasses the gateway entirely.
    let resolved = match request.resolved.take() {
        Some(manual) => {
            // Out-of-range coordinates make the manual address unusable, which
            // is the same situation as a failed resolution.
            if !(-90.0..=90.0).contains(&manual.lat)
                || !(-180.0..=180.0).contains(&manual.lon)
                || manual.display_address.trim().is_empty()
            {
                return Err(IntakeError::GeocodeFailed);
            }
            Geocoded {
                lat: manual.lat,
                lon: manual.lon,
                display_address: manual.display_address,
            }
        }
        None => {
            let query = format!("{}, {}", request.name.trim(), request.city_or_address.trim());
            match geocoder.resolve(&query).await {
                Ok(geocoded) => geocoded,
                Err(GeocodeError::NotFound) => return Err(IntakeError::GeocodeFailed),
                Err(GeocodeError::Unavailable(reason)) => {
                    return Err(IntakeError::GeocodeUnavailable(reason));
                }
            }
        }
    };

    // 4. Duplicate check against all currently known restaurants, using the
    // geocoder's display address as the candidate address.
    let known = repo.list_restaurants(None, None).await;
    if let Some(existing) = matcher.find_existing(&request.name, &resolved.display_address, &known)
    {
        return Ok(IntakeOutcome::Duplicate(existing.clone()));
    }

    // 5. Persist, auto-validated (no moderation queue exists for restaurants).
    let candidate = Restaurant {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        address: resolved.display_address,
        lat: resolved.lat,
        lon: resolved.lon,
        cuisine_type: request.cuisine_type.trim().to_string(),
        description: request.description.clone(),
        created_by: actor.id,
        is_validated: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let restaurant = match repo.create_restaurant(candidate).await {
        Ok(restaurant) => restaurant,
        Err(RepoError::Conflict) => {
            // Lost the race to a concurrent submission: the store's unique
            // (name, address) constraint fired. Report the winner as the duplicate.
            let known = repo.list_restaurants(None, None).await;
            return match matcher.find_existing(request.name.trim(), &address_of(&known, &request), &known) {
                Some(existing) => Ok(IntakeOutcome::Duplicate(existing.clone())),
                None => Err(IntakeError::Storage(
                    "conflicting restaurant exists but could not be loaded".to_string(),
                )),
            };
        }
        Err(RepoError::Database(reason)) => return Err(IntakeError::Storage(reason)),
    };

    // 6. Optional first review; failures here degrade to a warning.
    let mut review = None;
    let mut warning = None;
    if let Some(first) = request.first_review {
        if !(1..=5).contains(&first.rating) {
            warning = Some("first review skipped: rating must be between 1 and 5".to_string());
        } else if first
            .comment
            .as_deref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
        {
            warning = Some(format!(
                "first review skipped: comment exceeds {MAX_COMMENT_LEN} characters"
            ));
        } else {
            let candidate = Review {
                id: Uuid::new_v4(),
                restaurant_id: restaurant.id,
                author_id: actor.id,
                rating: first.rating,
                comment: first.comment.unwrap_or_default(),
                created_at: Utc::now(),
            };
            match repo.create_review(candidate).await {
                Ok(created) => review = Some(created),
                Err(RepoError::Conflict) => {
                    warning =
                        Some("first review skipped: you already reviewed this restaurant".to_string());
                }
                Err(RepoError::Database(reason)) => {
                    tracing::warn!("first review not persisted: {}", reason);
                    warning = Some("restaurant created, but the first review could not be saved".to_string());
                }
            }
        }
    }

    Ok(IntakeOutcome::Created {
        restaurant,
        review,
        warning,
    })
}

/// Best-effort candidate address for the post-conflict re-match: the stored
/// twin's address if a same-named restaurant exists, otherwise the raw input.
fn address_of(known: &[Restaurant], request: &SubmitRestaurantRequest) -> String {
    known
        .iter()
        .find(|r| r.name.trim().to_lowercase() == request.name.trim().to_lowercase())
        .map(|r| r.address.clone())
        .unwrap_or_else(|| request.city_or_address.trim().to_string())
}
