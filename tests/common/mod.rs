#![allow(dead_code)]

use async_trait::async_trait;
use bistromap::{
    AppState,
    auth::{AuthUser, MockCredentials},
    config::AppConfig,
    geocode::MockGeocoder,
    models::{Account, Restaurant, Review, UpdateRestaurantRequest},
    repository::{RepoError, Repository},
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY IMPLEMENTATION ---

// The central control point for testing handler and pipeline logic without a
// live database. It enforces the same unique constraints as the real schema
// (email, restaurant identity, one review per author per restaurant), so the
// conflict-handling paths behave exactly as they would against Postgres.
#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    restaurants: Vec<Restaurant>,
    reviews: Vec<Review>,
    /// When set, the next restaurant insert loses a simulated race: this
    /// restaurant is stored as the winner and the insert reports `Conflict`.
    racing_restaurant: Option<Restaurant>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads accounts before the test runs.
    pub fn with_accounts(self, accounts: Vec<Account>) -> Self {
        self.state.lock().unwrap().accounts = accounts;
        self
    }

    /// Pre-loads restaurants before the test runs.
    pub fn with_restaurants(self, restaurants: Vec<Restaurant>) -> Self {
        self.state.lock().unwrap().restaurants = restaurants;
        self
    }

    /// Pre-loads reviews before the test runs.
    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        self.state.lock().unwrap().reviews = reviews;
        self
    }

    /// Arranges for the next restaurant insert to lose a race: the given
    /// restaurant lands in the store as the concurrent winner and the insert
    /// reports a unique-constraint conflict.
    pub fn with_racing_restaurant(self, winner: Restaurant) -> Self {
        self.state.lock().unwrap().racing_restaurant = Some(winner);
        self
    }

    pub fn restaurant_count(&self) -> usize {
        self.state.lock().unwrap().restaurants.len()
    }

    pub fn review_count(&self) -> usize {
        self.state.lock().unwrap().reviews.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- Accounts ---

    async fn create_account(&self, account: Account) -> Result<Account, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state
            .accounts
            .iter()
            .any(|a| a.email.to_lowercase() == account.email.to_lowercase())
        {
            return Err(RepoError::Conflict);
        }
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Option<Account> {
        let state = self.state.lock().unwrap();
        state.accounts.iter().find(|a| a.id == id).cloned()
    }

    async fn find_account_by_email(&self, email: &str) -> Option<Account> {
        let needle = email.trim().to_lowercase();
        let state = self.state.lock().unwrap();
        state
            .accounts
            .iter()
            .find(|a| a.email.to_lowercase() == needle)
            .cloned()
    }

    async fn list_accounts(&self) -> Vec<Account> {
        let state = self.state.lock().unwrap();
        let mut accounts: Vec<Account> = state
            .accounts
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.role.cmp(&b.role).then(a.name.cmp(&b.name)));
        accounts
    }

    async fn list_lurkers(&self) -> Vec<Account> {
        let state = self.state.lock().unwrap();
        let mut lurkers: Vec<Account> = state
            .accounts
            .iter()
            .filter(|a| a.role == "lurker" && a.is_active)
            .cloned()
            .collect();
        lurkers.sort_by_key(|a| a.created_at);
        lurkers
    }

    async fn set_account_role(&self, id: Uuid, role: &str) -> Option<Account> {
        let mut state = self.state.lock().unwrap();
        let account = state.accounts.iter_mut().find(|a| a.id == id)?;
        account.role = role.to_string();
        Some(account.clone())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password_hash = hash.to_string();
                true
            }
            None => false,
        }
    }

    async fn delete_account(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != id);
        state.accounts.len() < before
    }

    // --- Restaurants ---

    async fn list_restaurants(
        &self,
        cuisine: Option<String>,
        search: Option<String>,
    ) -> Vec<Restaurant> {
        let state = self.state.lock().unwrap();
        let needle = search.map(|s| s.to_lowercase());
        let mut restaurants: Vec<Restaurant> = state
            .restaurants
            .iter()
            .filter(|r| r.is_validated)
            .filter(|r| cuisine.as_ref().is_none_or(|c| &r.cuisine_type == c))
            .filter(|r| {
                needle.as_ref().is_none_or(|n| {
                    r.name.to_lowercase().contains(n) || r.address.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        restaurants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        restaurants
    }

    async fn get_restaurant(&self, id: Uuid) -> Option<Restaurant> {
        let state = self.state.lock().unwrap();
        state.restaurants.iter().find(|r| r.id == id).cloned()
    }

    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Restaurant, RepoError> {
        let mut state = self.state.lock().unwrap();
        if let Some(winner) = state.racing_restaurant.take() {
            state.restaurants.push(winner);
            return Err(RepoError::Conflict);
        }
        if state.restaurants.iter().any(|r| {
            r.name.to_lowercase() == restaurant.name.to_lowercase()
                && r.address.to_lowercase() == restaurant.address.to_lowercase()
        }) {
            return Err(RepoError::Conflict);
        }
        state.restaurants.push(restaurant.clone());
        Ok(restaurant)
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        req: UpdateRestaurantRequest,
    ) -> Option<Restaurant> {
        let mut state = self.state.lock().unwrap();
        let restaurant = state.restaurants.iter_mut().find(|r| r.id == id)?;
        if let Some(name) = req.name {
            restaurant.name = name;
        }
        if let Some(address) = req.address {
            restaurant.address = address;
        }
        if let Some(lat) = req.lat {
            restaurant.lat = lat;
        }
        if let Some(lon) = req.lon {
            restaurant.lon = lon;
        }
        if let Some(cuisine_type) = req.cuisine_type {
            restaurant.cuisine_type = cuisine_type;
        }
        if let Some(description) = req.description {
            restaurant.description = Some(description);
        }
        restaurant.updated_at = Utc::now();
        Some(restaurant.clone())
    }

    async fn delete_restaurant(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.restaurants.len();
        state.restaurants.retain(|r| r.id != id);
        // Reviews cascade, matching the FK constraint.
        state.reviews.retain(|r| r.restaurant_id != id);
        state.restaurants.len() < before
    }

    async fn list_cuisines(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut cuisines: Vec<String> = state
            .restaurants
            .iter()
            .map(|r| r.cuisine_type.clone())
            .filter(|c| !c.is_empty())
            .collect();
        cuisines.sort();
        cuisines.dedup();
        cuisines
    }

    // --- Reviews ---

    async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> Vec<Review> {
        let state = self.state.lock().unwrap();
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }

    async fn get_review(&self, id: Uuid) -> Option<Review> {
        let state = self.state.lock().unwrap();
        state.reviews.iter().find(|r| r.id == id).cloned()
    }

    async fn create_review(&self, review: Review) -> Result<Review, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state
            .reviews
            .iter()
            .any(|r| r.author_id == review.author_id && r.restaurant_id == review.restaurant_id)
        {
            return Err(RepoError::Conflict);
        }
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(
        &self,
        id: Uuid,
        rating: Option<i32>,
        comment: Option<String>,
    ) -> Option<Review> {
        let mut state = self.state.lock().unwrap();
        let review = state.reviews.iter_mut().find(|r| r.id == id)?;
        if let Some(rating) = rating {
            review.rating = rating;
        }
        if let Some(comment) = comment {
            review.comment = comment;
        }
        Some(review.clone())
    }

    async fn delete_review(&self, id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.reviews.len();
        state.reviews.retain(|r| r.id != id);
        state.reviews.len() < before
    }
}

// --- TEST UTILITIES ---

pub const ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const USER_ID: Uuid = Uuid::from_u128(2);
pub const LURKER_ID: Uuid = Uuid::from_u128(3);

/// Creates an AppState using mock components.
pub fn create_test_state(repo: Arc<MemoryRepository>, geocoder: MockGeocoder) -> AppState {
    AppState {
        repo,
        geocoder: Arc::new(geocoder),
        credentials: Arc::new(MockCredentials::new()),
        config: AppConfig::default(),
    }
}

/// An account fixture with the mock credential scheme for the given password.
pub fn account(id: Uuid, name: &str, email: &str, role: &str) -> Account {
    Account {
        id,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "hashed:secret123".to_string(),
        role: role.to_string(),
        is_active: true,
        created_at: Utc::now(),
    }
}

/// The standard trio of accounts most handler tests start from.
pub fn seeded_accounts() -> Vec<Account> {
    vec![
        account(ADMIN_ID, "Administrator", "admin", "admin"),
        account(USER_ID, "Valentine", "valentine@example.com", "user"),
        account(LURKER_ID, "Newcomer", "newcomer@example.com", "lurker"),
    ]
}

pub fn restaurant(name: &str, address: &str, created_by: Uuid) -> Restaurant {
    Restaurant {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: address.to_string(),
        lat: 47.99,
        lon: -4.1,
        cuisine_type: "French".to_string(),
        description: None,
        created_by,
        is_validated: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn review(restaurant_id: Uuid, author_id: Uuid, rating: i32) -> Review {
    Review {
        id: Uuid::new_v4(),
        restaurant_id,
        author_id,
        rating,
        comment: String::new(),
        created_at: Utc::now(),
    }
}

// AuthUser fixtures for direct handler calls.
pub fn admin_user() -> AuthUser {
    AuthUser {
        id: ADMIN_ID,
        role: "admin".to_string(),
    }
}

pub fn standard_user() -> AuthUser {
    AuthUser {
        id: USER_ID,
        role: "user".to_string(),
    }
}

pub fn lurker_user() -> AuthUser {
    AuthUser {
        id: LURKER_ID,
        role: "lurker".to_string(),
    }
}
