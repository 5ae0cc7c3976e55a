mod common;

use bistromap::dedupe::{ContainmentMatcher, DuplicateMatcher};
use common::{USER_ID, restaurant};

const MATCHER: ContainmentMatcher = ContainmentMatcher;

#[test]
fn test_exact_match_is_found() {
    let existing = vec![restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID)];

    let found = MATCHER.find_existing("Crêperie Eliot", "12 Rue Kéréon, Quimper", &existing);

    assert!(found.is_some());
}

#[test]
fn test_match_is_case_and_whitespace_insensitive() {
    let existing = vec![restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID)];

    let found = MATCHER.find_existing("  crêperie eliot ", "12 RUE KÉRÉON, QUIMPER", &existing);

    assert!(found.is_some());
}

#[test]
fn test_shorter_stored_address_contained_in_candidate() {
    // The geocoder often returns a longer, fully-qualified address than what was
    // stored earlier; containment must work in both directions.
    let existing = vec![restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID)];

    let found = MATCHER.find_existing(
        "Crêperie Eliot",
        "12 Rue Kéréon, 29000 Quimper, Finistère, France",
        &existing,
    );

    assert!(found.is_some());
}

#[test]
fn test_longer_stored_address_contains_candidate() {
    let existing = vec![restaurant(
        "Crêperie Eliot",
        "12 Rue Kéréon, 29000 Quimper, Finistère, France",
        USER_ID,
    )];

    let found = MATCHER.find_existing("Crêperie Eliot", "12 rue kéréon, 29000 quimper", &existing);

    assert!(found.is_some());
}

#[test]
fn test_interposed_postal_code_does_not_break_the_match() {
    // Nominatim qualifies addresses with a postal code between street and city;
    // the stored shorter form must still be recognized.
    let existing = vec![restaurant("Crêperie Eliot", "12 rue kéréon, quimper", USER_ID)];

    let found = MATCHER.find_existing(
        "Crêperie Eliot",
        "12 rue kéréon, 29000 quimper, france",
        &existing,
    );

    assert!(found.is_some());
}

#[test]
fn test_same_address_different_name_is_no_match() {
    // Two distinct establishments can share a building.
    let existing = vec![restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID)];

    let found = MATCHER.find_existing("Pizzeria Marco", "12 Rue Kéréon, Quimper", &existing);

    assert!(found.is_none());
}

#[test]
fn test_same_name_unrelated_address_is_no_match() {
    // Chains: the same name in another city is a different restaurant.
    let existing = vec![restaurant("Le Bistrot", "3 Place de la Mairie, Brest", USER_ID)];

    let found = MATCHER.find_existing("Le Bistrot", "45 Avenue Foch, Rennes", &existing);

    assert!(found.is_none());
}

#[test]
fn test_empty_candidate_fields_never_match() {
    let existing = vec![restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID)];

    assert!(MATCHER.find_existing("", "12 Rue Kéréon, Quimper", &existing).is_none());
    assert!(MATCHER.find_existing("Crêperie Eliot", "   ", &existing).is_none());
}

#[test]
fn test_empty_stored_fields_never_match() {
    let existing = vec![restaurant("Crêperie Eliot", "", USER_ID)];

    // An empty stored address is contained in everything; it must not match.
    let found = MATCHER.find_existing("Crêperie Eliot", "12 Rue Kéréon, Quimper", &existing);

    assert!(found.is_none());
}

#[test]
fn test_first_match_in_slice_order_wins() {
    let first = restaurant("Crêperie Eliot", "12 Rue Kéréon, Quimper", USER_ID);
    let second = restaurant("Crêperie Eliot", "12 Rue Kéréon, 29000 Quimper", USER_ID);
    let existing = vec![first.clone(), second];

    let found = MATCHER
        .find_existing("Crêperie Eliot", "12 Rue Kéréon, Quimper", &existing)
        .unwrap();

    assert_eq!(found.id, first.id);
}
