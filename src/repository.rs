use crate::models::{Account, Restaurant, Review, UpdateRestaurantRequest};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepoError
///
/// Failure modes of write operations that ride a unique constraint. `Conflict`
/// is the store's native backstop firing (duplicate email, duplicate
/// (name, address) pair, second review per author) and callers must branch on
/// it; `Database` is everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("a conflicting record already exists")]
    Conflict,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return RepoError::Conflict;
            }
        }
        RepoError::Database(e.to_string())
    }
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers and the intake
/// pipeline to interact with the data layer without knowing the specific
/// implementation (Postgres, in-memory, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// Reads return `Vec`/`Option` directly; writes whose uniqueness matters to the
/// business rules return `Result` so the caller can branch on `Conflict`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    /// Inserts a new account. The unique email constraint is the backstop
    /// against concurrent registrations.
    async fn create_account(&self, account: Account) -> Result<Account, RepoError>;
    async fn get_account(&self, id: Uuid) -> Option<Account>;
    async fn find_account_by_email(&self, email: &str) -> Option<Account>;
    // All active accounts, ordered by role then name (admin panel listing).
    async fn list_accounts(&self) -> Vec<Account>;
    // Pending lurkers only, oldest first (the validation queue).
    async fn list_lurkers(&self) -> Vec<Account>;
    async fn set_account_role(&self, id: Uuid, role: &str) -> Option<Account>;
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> bool;
    async fn delete_account(&self, id: Uuid) -> bool;

    // --- Restaurants ---
    // Validated restaurants with optional cuisine filter and name/address search.
    async fn list_restaurants(
        &self,
        cuisine: Option<String>,
        search: Option<String>,
    ) -> Vec<Restaurant>;
    async fn get_restaurant(&self, id: Uuid) -> Option<Restaurant>;
    /// Inserts a new restaurant. The unique (name, address) constraint is the
    /// backstop when two submissions race past the in-memory duplicate check.
    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Restaurant, RepoError>;
    async fn update_restaurant(
        &self,
        id: Uuid,
        req: UpdateRestaurantRequest,
    ) -> Option<Restaurant>;
    /// Deletes a restaurant; associated reviews cascade at the database level.
    async fn delete_restaurant(&self, id: Uuid) -> bool;
    // Distinct non-empty cuisine types currently in use.
    async fn list_cuisines(&self) -> Vec<String>;

    // --- Reviews ---
    async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> Vec<Review>;
    async fn get_review(&self, id: Uuid) -> Option<Review>;
    /// Inserts a new review. The unique (author, restaurant) constraint enforces
    /// the one-review-per-author-per-restaurant invariant.
    async fn create_review(&self, review: Review) -> Result<Review, RepoError>;
    async fn update_review(
        &self,
        id: Uuid,
        rating: Option<i32>,
        comment: Option<String>,
    ) -> Option<Review>;
    async fn delete_review(&self, id: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are runtime-checked (`sqlx::query_as::<_, T>`) so the crate builds
/// without a live database connection.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLS: &str = "id, name, email, password_hash, role, is_active, created_at";
const RESTAURANT_COLS: &str =
    "id, name, address, lat, lon, cuisine_type, description, created_by, is_validated, created_at, updated_at";
const REVIEW_COLS: &str = "id, restaurant_id, author_id, rating, comment, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- ACCOUNTS ---

    async fn create_account(&self, account: Account) -> Result<Account, RepoError> {
        let sql = format!(
            "INSERT INTO accounts (id, name, email, password_hash, role, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ACCOUNT_COLS}"
        );
        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.role)
            .bind(account.is_active)
            .bind(account.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_account(&self, id: Uuid) -> Option<Account> {
        let sql = format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_account error: {:?}", e);
                None
            })
    }

    async fn find_account_by_email(&self, email: &str) -> Option<Account> {
        let sql = format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE email = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(email.to_lowercase().trim())
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_account_by_email error: {:?}", e);
                None
            })
    }

    /// list_accounts
    ///
    /// Admin panel listing: every active account, grouped by role then name.
    async fn list_accounts(&self) -> Vec<Account> {
        let sql = format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE is_active = true ORDER BY role ASC, name ASC"
        );
        match sqlx::query_as::<_, Account>(&sql).fetch_all(&self.pool).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("list_accounts error: {:?}", e);
                vec![]
            }
        }
    }

    /// list_lurkers
    ///
    /// The validation queue: active lurkers, oldest registration first.
    async fn list_lurkers(&self) -> Vec<Account> {
        let sql = format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE role = 'lurker' AND is_active = true ORDER BY created_at ASC"
        );
        match sqlx::query_as::<_, Account>(&sql).fetch_all(&self.pool).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("list_lurkers error: {:?}", e);
                vec![]
            }
        }
    }

    async fn set_account_role(&self, id: Uuid, role: &str) -> Option<Account> {
        let sql = format!("UPDATE accounts SET role = $2 WHERE id = $1 RETURNING {ACCOUNT_COLS}");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_account_role error: {:?}", e);
                None
            })
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> bool {
        match sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_password_hash error: {:?}", e);
                false
            }
        }
    }

    async fn delete_account(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_account error: {:?}", e);
                false
            }
        }
    }

    // --- RESTAURANTS ---

    /// list_restaurants
    ///
    /// Implements flexible search/filtering using QueryBuilder for safe
    /// parameterization. Restricted to validated restaurants.
    async fn list_restaurants(
        &self,
        cuisine: Option<String>,
        search: Option<String>,
    ) -> Vec<Restaurant> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {RESTAURANT_COLS} FROM restaurants WHERE is_validated = true "
        ));

        if let Some(c) = cuisine {
            builder.push(" AND cuisine_type = ");
            builder.push_bind(c);
        }

        if let Some(s) = search {
            // Case-insensitive search across name and address.
            let pattern = format!("%{}%", s);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR address ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder
            .build_query_as::<Restaurant>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(restaurants) => restaurants,
            Err(e) => {
                tracing::error!("list_restaurants error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_restaurant(&self, id: Uuid) -> Option<Restaurant> {
        let sql = format!("SELECT {RESTAURANT_COLS} FROM restaurants WHERE id = $1");
        sqlx::query_as::<_, Restaurant>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_restaurant error: {:?}", e);
                None
            })
    }

    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Restaurant, RepoError> {
        let sql = format!(
            "INSERT INTO restaurants (id, name, address, lat, lon, cuisine_type, description, created_by, is_validated, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) RETURNING {RESTAURANT_COLS}"
        );
        let created = sqlx::query_as::<_, Restaurant>(&sql)
            .bind(restaurant.id)
            .bind(&restaurant.name)
            .bind(&restaurant.address)
            .bind(restaurant.lat)
            .bind(restaurant.lon)
            .bind(&restaurant.cuisine_type)
            .bind(&restaurant.description)
            .bind(restaurant.created_by)
            .bind(restaurant.is_validated)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// update_restaurant
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    async fn update_restaurant(
        &self,
        id: Uuid,
        req: UpdateRestaurantRequest,
    ) -> Option<Restaurant> {
        let sql = format!(
            "UPDATE restaurants \
             SET name = COALESCE($2, name), \
                 address = COALESCE($3, address), \
                 lat = COALESCE($4, lat), \
                 lon = COALESCE($5, lon), \
                 cuisine_type = COALESCE($6, cuisine_type), \
                 description = COALESCE($7, description), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {RESTAURANT_COLS}"
        );
        sqlx::query_as::<_, Restaurant>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.address)
            .bind(req.lat)
            .bind(req.lon)
            .bind(req.cuisine_type)
            .bind(req.description)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_restaurant error: {:?}", e);
                None
            })
    }

    async fn delete_restaurant(&self, id: Uuid) -> bool {
        // Reviews cascade via the FK constraint.
        match sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_restaurant error: {:?}", e);
                false
            }
        }
    }

    async fn list_cuisines(&self) -> Vec<String> {
        match sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT cuisine_type FROM restaurants WHERE cuisine_type <> '' ORDER BY cuisine_type",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(types) => types,
            Err(e) => {
                tracing::error!("list_cuisines error: {:?}", e);
                vec![]
            }
        }
    }

    // --- REVIEWS ---

    async fn reviews_for_restaurant(&self, restaurant_id: Uuid) -> Vec<Review> {
        let sql = format!(
            "SELECT {REVIEW_COLS} FROM reviews WHERE restaurant_id = $1 ORDER BY created_at DESC"
        );
        match sqlx::query_as::<_, Review>(&sql)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(reviews) => reviews,
            Err(e) => {
                tracing::error!("reviews_for_restaurant error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_review(&self, id: Uuid) -> Option<Review> {
        let sql = format!("SELECT {REVIEW_COLS} FROM reviews WHERE id = $1");
        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_review error: {:?}", e);
                None
            })
    }

    async fn create_review(&self, review: Review) -> Result<Review, RepoError> {
        let sql = format!(
            "INSERT INTO reviews (id, restaurant_id, author_id, rating, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {REVIEW_COLS}"
        );
        let created = sqlx::query_as::<_, Review>(&sql)
            .bind(review.id)
            .bind(review.restaurant_id)
            .bind(review.author_id)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_review(
        &self,
        id: Uuid,
        rating: Option<i32>,
        comment: Option<String>,
    ) -> Option<Review> {
        let sql = format!(
            "UPDATE reviews SET rating = COALESCE($2, rating), comment = COALESCE($3, comment) \
             WHERE id = $1 RETURNING {REVIEW_COLS}"
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(rating)
            .bind(comment)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_review error: {:?}", e);
                None
            })
    }

    async fn delete_review(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_review error: {:?}", e);
                false
            }
        }
    }
}
