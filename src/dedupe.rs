use crate::models::Restaurant;

/// DuplicateMatcher
///
/// Decides whether a candidate (name, address) pair already semantically exists
/// among the stored restaurants. The matching strategy lives behind this trait so
/// it can be swapped (token containment today, a fuzzy-distance metric tomorrow)
/// without touching the intake pipeline.
pub trait DuplicateMatcher: Send + Sync {
    /// Returns the first stored restaurant considered equivalent to the
    /// candidate, in slice order. No ranking or scoring.
    fn find_existing<'a>(
        &self,
        candidate_name: &str,
        candidate_address: &str,
        existing: &'a [Restaurant],
    ) -> Option<&'a Restaurant>;
}

/// ContainmentMatcher
///
/// The default strategy: normalized names must be exactly equal, and one
/// address's word set must contain the other's. Addresses are compared as sets
/// of case-folded words with purely numeric tokens (house numbers, postal
/// codes) dropped, so the geocoder's fully-qualified form ("12 Rue Kéréon,
/// 29000 Quimper, France") still recognizes a stored "12 Rue Kéréon, Quimper"
/// despite the interposed postal code. Exact name equality keeps chains apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

/// Trim and case-fold for comparison.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-folded address words, with purely numeric tokens discarded. Numbers
/// vary with address qualification (postal codes appear and disappear between
/// geocoder responses) and would defeat the containment comparison.
fn address_tokens(address: &str) -> Vec<String> {
    address
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

fn is_subset(smaller: &[String], larger: &[String]) -> bool {
    smaller.iter().all(|t| larger.contains(t))
}

impl DuplicateMatcher for ContainmentMatcher {
    fn find_existing<'a>(
        &self,
        candidate_name: &str,
        candidate_address: &str,
        existing: &'a [Restaurant],
    ) -> Option<&'a Restaurant> {
        let name = normalize(candidate_name);
        let tokens = address_tokens(candidate_address);

        // An empty name or address never matches anything.
        if name.is_empty() || tokens.is_empty() {
            return None;
        }

        existing.iter().find(|r| {
            let other_name = normalize(&r.name);
            let other_tokens = address_tokens(&r.address);
            if other_name.is_empty() || other_tokens.is_empty() {
                return false;
            }
            other_name == name
                && (is_subset(&other_tokens, &tokens) || is_subset(&tokens, &other_tokens))
        })
    }
}
