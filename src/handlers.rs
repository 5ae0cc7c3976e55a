use crate::{
    AppState,
    auth::{AuthUser, mint_token},
    dedupe::ContainmentMatcher,
    geocode::{GeocodeError, Geocoded},
    intake::{self, IntakeError, IntakeOutcome},
    lifecycle::{
        LifecycleError, SeedAdminGuard, authorize_account_deletion, plan_role_change,
    },
    models::{
        Account, AccountResponse, ChangePasswordRequest, ChangeRoleRequest, CreateReviewRequest,
        DuplicateResponse, ErrorBody, IntakeResponse, LoginRequest, MAX_COMMENT_LEN,
        RatedRestaurant, RegisterRequest, Restaurant, ReverseGeocodeResponse, Review,
        RoleChangeResponse, SubmitRestaurantRequest, TokenResponse, UpdateRestaurantRequest,
        UpdateReviewRequest,
    },
    rating,
    repository::RepoError,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// RestaurantFilter
///
/// Accepted query parameters for the public restaurant listing endpoint
/// (GET /restaurants).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RestaurantFilter {
    /// Optional cuisine-type filter.
    pub cuisine: Option<String>,
    /// Optional case-insensitive search string matched against name and address.
    pub search: Option<String>,
}

/// GeocodeSearchParams
///
/// Query parameters for the forward-geocoding endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct GeocodeSearchParams {
    /// Free-text address or place query.
    pub q: String,
}

/// ReverseGeocodeParams
///
/// Query parameters for the reverse-geocoding endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReverseGeocodeParams {
    pub lat: f64,
    pub lon: f64,
}

// --- Shared helpers ---

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

/// Every lifecycle guard violation is a local validation problem: 400, no state
/// mutated.
fn lifecycle_error(e: LifecycleError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string())
}

/// Attaches the derived rating summary to a restaurant. Recomputed from the
/// review set on every call, so a stale aggregate can never be served.
async fn with_rating(state: &AppState, restaurant: Restaurant) -> RatedRestaurant {
    let reviews = state.repo.reviews_for_restaurant(restaurant.id).await;
    let summary = rating::aggregate(&reviews);
    RatedRestaurant {
        restaurant,
        average_rating: summary.average_rating,
        review_count: summary.count,
    }
}

// --- Account & Session Handlers ---

/// register
///
/// [Public Route] Creates a new account in the `lurker` role. Lurkers can browse
/// but must be validated by an administrator before contributing.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AccountResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let name = payload.name.trim();
    // Character count, not bytes: accented names must not be over-counted.
    let name_len = name.chars().count();
    if name_len < 2 || name_len > 50 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "name must be between 2 and 50 characters",
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(api_error(StatusCode::BAD_REQUEST, "a valid email is required"));
    }

    if payload.password.len() < 6 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "password must contain at least 6 characters",
        ));
    }

    let password_hash = state
        .credentials
        .hash(&payload.password)
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "registration failed"))?;

    let account = Account {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        password_hash,
        role: "lurker".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };

    match state.repo.create_account(account).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created.into()))),
        Err(RepoError::Conflict) => Err(api_error(
            StatusCode::CONFLICT,
            "an account with this email already exists",
        )),
        Err(RepoError::Database(_)) => {
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "registration failed"))
        }
    }
}

/// login
///
/// [Public Route] Verifies credentials and mints a session token. The failure
/// message never distinguishes an unknown email from a wrong password.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || api_error(StatusCode::UNAUTHORIZED, "invalid email or password");

    let account = state
        .repo
        .find_account_by_email(&payload.email)
        .await
        .filter(|a| a.is_active)
        .ok_or_else(invalid)?;

    if !state.credentials.verify(&payload.password, &account.password_hash) {
        return Err(invalid());
    }

    let token = mint_token(account.id, &state.config.jwt_secret)
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "login failed"))?;

    Ok(Json(TokenResponse {
        token,
        account: account.into(),
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the authenticated account's profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = AccountResponse))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, StatusCode> {
    match state.repo.get_account(id).await {
        Some(account) => Ok(Json(account.into())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// change_password
///
/// [Authenticated Route] Changes the caller's own password after re-verifying
/// the current one.
#[utoipa::path(
    put,
    path = "/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short", body = ErrorBody),
        (status = 401, description = "Current password incorrect", body = ErrorBody)
    )
)]
pub async fn change_password(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if payload.new_password.len() < 6 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "the new password must contain at least 6 characters",
        ));
    }

    let account = state
        .repo
        .get_account(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    if !state
        .credentials
        .verify(&payload.current_password, &account.password_hash)
    {
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "the current password is incorrect",
        ));
    }

    let hash = state
        .credentials
        .hash(&payload.new_password)
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "password change failed"))?;

    if state.repo.set_password_hash(id, &hash).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "password change failed"))
    }
}

// --- Admin Account Handlers ---

/// list_accounts
///
/// [Admin Route] Lists every active account (lurkers, users and admins),
/// ordered by role then name.
#[utoipa::path(
    get,
    path = "/admin/accounts",
    responses((status = 200, description = "All accounts", body = [AccountResponse]))
)]
pub async fn list_accounts(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    let accounts = state.repo.list_accounts().await;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// list_lurkers
///
/// [Admin Route] Lists the validation queue: active lurkers, oldest first.
#[utoipa::path(
    get,
    path = "/admin/accounts/lurkers",
    responses((status = 200, description = "Pending lurkers", body = [AccountResponse]))
)]
pub async fn list_lurkers(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    let lurkers = state.repo.list_lurkers().await;
    Ok(Json(lurkers.into_iter().map(Into::into).collect()))
}

/// change_role
///
/// [Admin Route] Runs the account state machine: validation (lurker to user),
/// promotion into admin (requires email confirmation), demotion and lateral
/// changes. All guards are evaluated in `lifecycle::plan_role_change` before
/// anything is persisted, so a rejected transition leaves the role untouched.
#[utoipa::path(
    put,
    path = "/admin/accounts/{id}/role",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = RoleChangeResponse),
        (status = 400, description = "Guard violation", body = ErrorBody),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Account not found", body = ErrorBody)
    )
)]
pub async fn change_role(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    if actor.role != "admin" {
        return Err(api_error(StatusCode::FORBIDDEN, "admin access required"));
    }

    let target = state
        .repo
        .get_account(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    let guard = SeedAdminGuard::new(&state.config.seed_admin_email);
    let change = plan_role_change(
        actor.id,
        &target,
        &payload.new_role,
        payload.email_confirmation.as_deref(),
        &guard,
    )
    .map_err(lifecycle_error)?;

    let updated = state
        .repo
        .set_account_role(target.id, change.new_role.as_str())
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    Ok(Json(RoleChangeResponse {
        message: change.message,
        account: updated.into(),
    }))
}

/// validate_account
///
/// [Admin Route] Legacy fast path promoting a lurker to user. Newer clients use
/// the role endpoint; this one rejects any non-lurker target.
#[utoipa::path(
    put,
    path = "/admin/accounts/{id}/validate",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Validated", body = RoleChangeResponse),
        (status = 400, description = "Not a lurker", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    )
)]
pub async fn validate_account(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    if actor.role != "admin" {
        return Err(api_error(StatusCode::FORBIDDEN, "admin access required"));
    }

    let target = state
        .repo
        .get_account(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    if target.role != "lurker" {
        return Err(api_error(StatusCode::BAD_REQUEST, "this account is not a lurker"));
    }

    let guard = SeedAdminGuard::new(&state.config.seed_admin_email);
    let change = plan_role_change(actor.id, &target, "user", None, &guard)
        .map_err(lifecycle_error)?;

    let updated = state
        .repo
        .set_account_role(target.id, change.new_role.as_str())
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    Ok(Json(RoleChangeResponse {
        message: change.message,
        account: updated.into(),
    }))
}

/// delete_account
///
/// [Admin Route] Deletes an account. The seed admin and the actor's own account
/// are never deletable; the guards live in `lifecycle::authorize_account_deletion`.
#[utoipa::path(
    delete,
    path = "/admin/accounts/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Guard violation", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    )
)]
pub async fn delete_account(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if actor.role != "admin" {
        return Err(api_error(StatusCode::FORBIDDEN, "admin access required"));
    }

    let target = state
        .repo
        .get_account(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "account not found"))?;

    let guard = SeedAdminGuard::new(&state.config.seed_admin_email);
    authorize_account_deletion(actor.id, &target, &guard).map_err(lifecycle_error)?;

    if state.repo.delete_account(target.id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "account not found"))
    }
}

// --- Restaurant Handlers ---

/// list_restaurants
///
/// [Public Route] Lists validated restaurants with cuisine/search filters. Each
/// entry carries its rating summary, recomputed from the review set on read.
#[utoipa::path(
    get,
    path = "/restaurants",
    params(RestaurantFilter),
    responses((status = 200, description = "Restaurants", body = [RatedRestaurant]))
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(filter): Query<RestaurantFilter>,
) -> Json<Vec<RatedRestaurant>> {
    let restaurants = state
        .repo
        .list_restaurants(filter.cuisine, filter.search)
        .await;

    let mut rated = Vec::with_capacity(restaurants.len());
    for restaurant in restaurants {
        rated.push(with_rating(&state, restaurant).await);
    }
    Json(rated)
}

/// get_restaurant_details
///
/// [Public Route] Retrieves a single restaurant with its rating summary.
#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Found", body = RatedRestaurant),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_restaurant_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatedRestaurant>, StatusCode> {
    match state.repo.get_restaurant(id).await {
        Some(restaurant) => Ok(Json(with_rating(&state, restaurant).await)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// list_cuisines
///
/// [Public Route] Distinct non-empty cuisine types currently in use, for the
/// client's filter dropdown.
#[utoipa::path(
    get,
    path = "/restaurants/meta/cuisines",
    responses((status = 200, description = "Cuisine types", body = [String]))
)]
pub async fn list_cuisines(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.repo.list_cuisines().await)
}

/// submit_restaurant
///
/// [Authenticated Route] Runs the intake pipeline: role gate, cuisine gate,
/// geocoding (unless a pre-resolved address is supplied), duplicate check,
/// persistence, optional first review.
///
/// Outcome mapping: created submissions return 201; a recognized duplicate
/// returns 409 with the existing restaurant so the client can offer attaching
/// the pending review to it; an unresolvable address returns 422 and the client
/// falls back to manual entry; a provider outage returns 502.
#[utoipa::path(
    post,
    path = "/restaurants",
    request_body = SubmitRestaurantRequest,
    responses(
        (status = 201, description = "Created", body = IntakeResponse),
        (status = 400, description = "Cuisine required", body = ErrorBody),
        (status = 403, description = "Account not validated", body = ErrorBody),
        (status = 409, description = "Duplicate establishment", body = DuplicateResponse),
        (status = 422, description = "Address not resolvable", body = ErrorBody),
        (status = 502, description = "Geocoding provider unavailable", body = ErrorBody)
    )
)]
pub async fn submit_restaurant(
    actor: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitRestaurantRequest>,
) -> Response {
    let matcher = ContainmentMatcher;
    let outcome = intake::submit(
        state.repo.as_ref(),
        state.geocoder.as_ref(),
        &matcher,
        &actor,
        payload,
    )
    .await;

    match outcome {
        Ok(IntakeOutcome::Created {
            restaurant,
            review,
            warning,
        }) => (
            StatusCode::CREATED,
            Json(IntakeResponse {
                restaurant,
                review,
                warning,
            }),
        )
            .into_response(),
        Ok(IntakeOutcome::Duplicate(existing)) => (
            StatusCode::CONFLICT,
            Json(DuplicateResponse {
                message: "this establishment already exists".to_string(),
                existing,
            }),
        )
            .into_response(),
        Err(e) => {
            let status = match e {
                IntakeError::InsufficientRole => StatusCode::FORBIDDEN,
                IntakeError::CuisineRequired => StatusCode::BAD_REQUEST,
                IntakeError::GeocodeFailed => StatusCode::UNPROCESSABLE_ENTITY,
                IntakeError::GeocodeUnavailable(_) => StatusCode::BAD_GATEWAY,
                IntakeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            api_error(status, e.to_string()).into_response()
        }
    }
}

/// update_restaurant
///
/// [Authenticated Route] Edits a restaurant. Admins may change every field; the
/// owner is limited to cuisine type and description, since the other fields feed
/// the duplicate-detection identity.
#[utoipa::path(
    put,
    path = "/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Updated", body = Restaurant),
        (status = 400, description = "Invalid coordinates", body = ErrorBody),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_restaurant(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> Result<Json<Restaurant>, ApiError> {
    let restaurant = state
        .repo
        .get_restaurant(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "restaurant not found"))?;

    let is_admin = role == "admin";
    let is_owner = restaurant.created_by == user_id;
    if !is_admin && !is_owner {
        return Err(api_error(StatusCode::FORBIDDEN, "you cannot edit this restaurant"));
    }

    // Owner edits are restricted to the non-identity fields.
    let payload = if is_admin {
        payload
    } else {
        UpdateRestaurantRequest {
            cuisine_type: payload.cuisine_type,
            description: payload.description,
            ..UpdateRestaurantRequest::default()
        }
    };

    if payload.lat.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        return Err(api_error(StatusCode::BAD_REQUEST, "latitude must be within [-90, 90]"));
    }
    if payload.lon.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "longitude must be within [-180, 180]",
        ));
    }

    match state.repo.update_restaurant(id, payload).await {
        Some(updated) => Ok(Json(updated)),
        None => Err(api_error(StatusCode::NOT_FOUND, "restaurant not found")),
    }
}

/// delete_restaurant
///
/// [Authenticated Route] Deletes a restaurant (owner or admin). All associated
/// reviews cascade at the store level.
#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_restaurant(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let Some(restaurant) = state.repo.get_restaurant(id).await else {
        return StatusCode::NOT_FOUND;
    };

    if role != "admin" && restaurant.created_by != user_id {
        return StatusCode::FORBIDDEN;
    }

    if state.repo.delete_restaurant(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Review Handlers ---

/// list_reviews
///
/// [Public Route] Retrieves all reviews for a restaurant, newest first.
#[utoipa::path(
    get,
    path = "/restaurants/{id}/reviews",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> Json<Vec<Review>> {
    Json(state.repo.reviews_for_restaurant(restaurant_id).await)
}

fn validate_review_fields(rating: Option<i32>, comment: Option<&str>) -> Result<(), ApiError> {
    if rating.is_some_and(|r| !(1..=5).contains(&r)) {
        return Err(api_error(StatusCode::BAD_REQUEST, "rating must be between 1 and 5"));
    }
    if comment.is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("comment cannot exceed {MAX_COMMENT_LEN} characters"),
        ));
    }
    Ok(())
}

/// create_review
///
/// [Authenticated Route] Posts a review. Lurkers are rejected; the store's
/// composite unique constraint enforces one review per author per restaurant
/// even under concurrent attempts.
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added", body = Review),
        (status = 400, description = "Invalid rating or comment", body = ErrorBody),
        (status = 403, description = "Account not validated", body = ErrorBody),
        (status = 404, description = "Restaurant not found", body = ErrorBody),
        (status = 409, description = "Already reviewed", body = ErrorBody)
    )
)]
pub async fn create_review(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if role == "lurker" {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "your account must be validated by an administrator to leave a review",
        ));
    }

    validate_review_fields(Some(payload.rating), payload.comment.as_deref())?;

    if state.repo.get_restaurant(payload.restaurant_id).await.is_none() {
        return Err(api_error(StatusCode::NOT_FOUND, "restaurant not found"));
    }

    let review = Review {
        id: Uuid::new_v4(),
        restaurant_id: payload.restaurant_id,
        author_id: user_id,
        rating: payload.rating,
        comment: payload.comment.unwrap_or_default(),
        created_at: Utc::now(),
    };

    match state.repo.create_review(review).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(RepoError::Conflict) => Err(api_error(
            StatusCode::CONFLICT,
            "you have already reviewed this restaurant",
        )),
        Err(RepoError::Database(_)) => {
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "review creation failed"))
        }
    }
}

/// update_review
///
/// [Authenticated Route] Edits a review. Only its author or an admin may do so.
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated", body = Review),
        (status = 400, description = "Invalid rating or comment", body = ErrorBody),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_review(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    validate_review_fields(payload.rating, payload.comment.as_deref())?;

    let review = state
        .repo
        .get_review(id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "review not found"))?;

    if review.author_id != user_id && role != "admin" {
        return Err(api_error(StatusCode::FORBIDDEN, "you can only edit your own reviews"));
    }

    match state
        .repo
        .update_review(id, payload.rating, payload.comment)
        .await
    {
        Some(updated) => Ok(Json(updated)),
        None => Err(api_error(StatusCode::NOT_FOUND, "review not found")),
    }
}

/// delete_review
///
/// [Authenticated Route] Deletes a review (author or admin).
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_review(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let Some(review) = state.repo.get_review(id).await else {
        return StatusCode::NOT_FOUND;
    };

    if review.author_id != user_id && role != "admin" {
        return StatusCode::FORBIDDEN;
    }

    if state.repo.delete_review(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Geocoding Handlers ---

/// geocode_search
///
/// [Public Route] Forward-geocodes a free-text query through the rate-limited
/// gateway. Zero results map to 404; provider outages map to 502 so the client
/// can offer a retry or manual entry, never a silent generic failure.
#[utoipa::path(
    get,
    path = "/geocode/search",
    params(GeocodeSearchParams),
    responses(
        (status = 200, description = "Resolved", body = Geocoded),
        (status = 404, description = "No result", body = ErrorBody),
        (status = 502, description = "Provider unavailable", body = ErrorBody)
    )
)]
pub async fn geocode_search(
    State(state): State<AppState>,
    Query(params): Query<GeocodeSearchParams>,
) -> Result<Json<Geocoded>, ApiError> {
    match state.geocoder.resolve(&params.q).await {
        Ok(geocoded) => Ok(Json(geocoded)),
        Err(e @ GeocodeError::NotFound) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
        Err(e @ GeocodeError::Unavailable(_)) => {
            Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// geocode_reverse
///
/// [Public Route] Reverse-geocodes coordinates to a display address.
#[utoipa::path(
    get,
    path = "/geocode/reverse",
    params(ReverseGeocodeParams),
    responses(
        (status = 200, description = "Resolved", body = ReverseGeocodeResponse),
        (status = 404, description = "No result", body = ErrorBody),
        (status = 502, description = "Provider unavailable", body = ErrorBody)
    )
)]
pub async fn geocode_reverse(
    State(state): State<AppState>,
    Query(params): Query<ReverseGeocodeParams>,
) -> Result<Json<ReverseGeocodeResponse>, ApiError> {
    match state.geocoder.reverse_resolve(params.lat, params.lon).await {
        Ok(address) => Ok(Json(ReverseGeocodeResponse { address })),
        Err(e @ GeocodeError::NotFound) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
        Err(e @ GeocodeError::Unavailable(_)) => {
            Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
