mod common;

use bistromap::{
    dedupe::ContainmentMatcher,
    geocode::{Geocoded, MockGeocoder},
    intake::{self, IntakeError, IntakeOutcome},
    models::{FirstReview, ResolvedAddress, SubmitRestaurantRequest},
};
use common::{MemoryRepository, USER_ID, lurker_user, restaurant, standard_user};
use tokio::test;

const MATCHER: ContainmentMatcher = ContainmentMatcher;

fn submission(name: &str, city: &str) -> SubmitRestaurantRequest {
    SubmitRestaurantRequest {
        name: name.to_string(),
        city_or_address: city.to_string(),
        cuisine_type: "French".to_string(),
        description: None,
        first_review: None,
        resolved: None,
    }
}

fn quimper_geocoder() -> MockGeocoder {
    MockGeocoder::new().with_result(
        "Crêperie Eliot, Quimper",
        Geocoded {
            lat: 47.996,
            lon: -4.102,
            display_address: "12 Rue Kéréon, 29000 Quimper, France".to_string(),
        },
    )
}

// --- HAPPY PATH ---

#[test]
async fn test_submission_creates_geocoded_validated_restaurant() {
    let repo = MemoryRepository::new();

    let outcome = intake::submit(
        &repo,
        &quimper_geocoder(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap();

    let IntakeOutcome::Created {
        restaurant,
        review,
        warning,
    } = outcome
    else {
        panic!("expected a created outcome");
    };

    assert_eq!(restaurant.name, "Crêperie Eliot");
    assert_eq!(restaurant.address, "12 Rue Kéréon, 29000 Quimper, France");
    assert_eq!(restaurant.lat, 47.996);
    assert_eq!(restaurant.created_by, USER_ID);
    assert!(restaurant.is_validated);
    assert!(review.is_none());
    assert!(warning.is_none());
    assert_eq!(repo.restaurant_count(), 1);
}

#[test]
async fn test_first_review_is_attached_to_created_restaurant() {
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.first_review = Some(FirstReview {
        rating: 5,
        comment: Some("Best galettes in town".to_string()),
    });

    let outcome = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap();

    let IntakeOutcome::Created {
        restaurant, review, ..
    } = outcome
    else {
        panic!("expected a created outcome");
    };

    let review = review.unwrap();
    assert_eq!(review.restaurant_id, restaurant.id);
    assert_eq!(review.author_id, USER_ID);
    assert_eq!(review.rating, 5);
    assert_eq!(repo.review_count(), 1);
}

// --- GATES ---

#[test]
async fn test_lurker_is_rejected_before_any_side_effect() {
    let repo = MemoryRepository::new();

    let err = intake::submit(
        &repo,
        &quimper_geocoder(),
        &MATCHER,
        &lurker_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, IntakeError::InsufficientRole);
    assert_eq!(repo.restaurant_count(), 0);
}

#[test]
async fn test_blank_cuisine_is_rejected() {
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.cuisine_type = "   ".to_string();

    let err = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap_err();

    assert_eq!(err, IntakeError::CuisineRequired);
}

// --- GEOCODING OUTCOMES ---

#[test]
async fn test_unresolvable_address_is_recoverable_failure() {
    let repo = MemoryRepository::new();

    let err = intake::submit(
        &repo,
        &MockGeocoder::new(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Atlantis"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, IntakeError::GeocodeFailed);
    assert_eq!(repo.restaurant_count(), 0);
}

#[test]
async fn test_provider_outage_is_distinct_from_not_found() {
    let repo = MemoryRepository::new();

    let err = intake::submit(
        &repo,
        &MockGeocoder::new_failing(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, IntakeError::GeocodeUnavailable(_)));
}

#[test]
async fn test_pre_resolved_address_bypasses_the_geocoder() {
    // A failing geocoder proves the gateway is never consulted when the request
    // carries a manually resolved address.
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.resolved = Some(ResolvedAddress {
        lat: 47.996,
        lon: -4.102,
        display_address: "12 Rue Kéréon, Quimper".to_string(),
    });

    let outcome = intake::submit(
        &repo,
        &MockGeocoder::new_failing(),
        &MATCHER,
        &standard_user(),
        request,
    )
    .await
    .unwrap();

    assert!(matches!(outcome, IntakeOutcome::Created { .. }));
}

#[test]
async fn test_out_of_range_manual_coordinates_are_rejected() {
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.resolved = Some(ResolvedAddress {
        lat: 91.0,
        lon: -4.102,
        display_address: "12 Rue Kéréon, Quimper".to_string(),
    });

    let err = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap_err();

    assert_eq!(err, IntakeError::GeocodeFailed);
}

// --- DUPLICATE DETECTION ---

#[test]
async fn test_duplicate_is_reported_and_nothing_created() {
    let existing = restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID);
    let repo = MemoryRepository::new().with_restaurants(vec![existing.clone()]);

    // The geocoder returns a longer, fully-qualified address; the containment
    // matcher still recognizes the stored establishment.
    let outcome = intake::submit(
        &repo,
        &quimper_geocoder(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap();

    let IntakeOutcome::Duplicate(found) = outcome else {
        panic!("expected a duplicate outcome");
    };
    assert_eq!(found.id, existing.id);
    assert_eq!(repo.restaurant_count(), 1);
}

#[test]
async fn test_same_name_in_another_city_is_not_a_duplicate() {
    let existing = restaurant("Crêperie Eliot", "3 Place de la Mairie, Brest", USER_ID);
    let repo = MemoryRepository::new().with_restaurants(vec![existing]);

    let outcome = intake::submit(
        &repo,
        &quimper_geocoder(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, IntakeOutcome::Created { .. }));
    assert_eq!(repo.restaurant_count(), 2);
}

#[test]
async fn test_lost_insert_race_is_reported_as_duplicate() {
    // Two submissions race past the duplicate check; the loser's insert hits
    // the store's unique (name, address) constraint and must surface the
    // winner as a duplicate instead of an error.
    let winner = restaurant(
        "Crêperie Eliot",
        "12 Rue Kéréon, 29000 Quimper, France",
        common::ADMIN_ID,
    );
    let repo = MemoryRepository::new().with_racing_restaurant(winner.clone());

    let outcome = intake::submit(
        &repo,
        &quimper_geocoder(),
        &MATCHER,
        &standard_user(),
        submission("Crêperie Eliot", "Quimper"),
    )
    .await
    .unwrap();

    let IntakeOutcome::Duplicate(found) = outcome else {
        panic!("expected a duplicate outcome");
    };
    assert_eq!(found.id, winner.id);
    assert_eq!(repo.restaurant_count(), 1);
}

// --- FIRST-REVIEW DEGRADATION ---

#[test]
async fn test_invalid_first_review_rating_degrades_to_warning() {
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.first_review = Some(FirstReview {
        rating: 6,
        comment: None,
    });

    let outcome = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap();

    let IntakeOutcome::Created {
        review, warning, ..
    } = outcome
    else {
        panic!("expected a created outcome");
    };

    // The restaurant survives; only the review is dropped.
    assert!(review.is_none());
    assert!(warning.unwrap().contains("rating"));
    assert_eq!(repo.restaurant_count(), 1);
    assert_eq!(repo.review_count(), 0);
}

#[test]
async fn test_oversized_first_review_comment_degrades_to_warning() {
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.first_review = Some(FirstReview {
        rating: 4,
        comment: Some("x".repeat(501)),
    });

    let outcome = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap();

    let IntakeOutcome::Created {
        review, warning, ..
    } = outcome
    else {
        panic!("expected a created outcome");
    };

    assert!(review.is_none());
    assert!(warning.unwrap().contains("comment"));
    assert_eq!(repo.restaurant_count(), 1);
}

#[test]
async fn test_comment_length_is_counted_in_characters_not_bytes() {
    // 500 accented characters encode as 1000 UTF-8 bytes; the limit is on
    // characters, so this first review must be accepted.
    let repo = MemoryRepository::new();
    let mut request = submission("Crêperie Eliot", "Quimper");
    request.first_review = Some(FirstReview {
        rating: 4,
        comment: Some("é".repeat(500)),
    });

    let outcome = intake::submit(&repo, &quimper_geocoder(), &MATCHER, &standard_user(), request)
        .await
        .unwrap();

    let IntakeOutcome::Created {
        review, warning, ..
    } = outcome
    else {
        panic!("expected a created outcome");
    };

    assert!(review.is_some());
    assert!(warning.is_none());
    assert_eq!(repo.review_count(), 1);
}
