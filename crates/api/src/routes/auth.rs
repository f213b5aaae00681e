//! Authentication and profile routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{AppState, middleware::AuthUser};
use tally_core::auth::{hash_password, verify_password};
use tally_db::repositories::{CreateUserInput, UserError, UserRepository};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Creates the protected profile router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me", patch(update_me))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Plaintext password (hashed before storage).
    #[validate(length(min = 8))]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Request body for profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub name: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /auth/register - Create a user account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": e.to_string()
            })),
        )
            .into_response();
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo
        .create(CreateUserInput {
            email: payload.email.trim().to_lowercase(),
            name: payload.name.trim().to_string(),
            password_hash,
            is_admin: false,
        })
        .await
    {
        Ok(u) => u,
        Err(UserError::DuplicateEmail(email)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_taken",
                    "message": format!("Email '{email}' is already registered")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return internal_error();
        }
    };

    info!(user_id = %user.id, "User registered");

    // Welcome email is best-effort; never block or fail registration.
    let email_service = state.email_service.clone();
    let to_email = user.email.clone();
    let to_name = user.name.clone();
    tokio::spawn(async move {
        if let Err(e) = email_service
            .send_registration_email(&to_email, &to_name)
            .await
        {
            warn!(error = %e, "Failed to send registration email");
        }
    });

    (
        StatusCode::CREATED,
        Json(json!({
            "user": {
                "id": user.id,
                "email": user.email,
                "name": user.name,
            }
        })),
    )
        .into_response()
}

/// POST /auth/login - Authenticate and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_email(&payload.email.to_lowercase()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error();
        }
    }

    let access_token = match state.jwt_service.generate_access_token(user.id, user.is_admin) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": state.jwt_service.access_token_expires_in(),
        })),
    )
        .into_response()
}

/// GET /me - Return the authenticated user's profile.
async fn me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({
                "id": user.id,
                "email": user.email,
                "name": user.name,
                "is_admin": user.is_admin,
                "created_at": user.created_at.to_rfc3339(),
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load profile");
            internal_error()
        }
    }
}

/// PATCH /me - Update the authenticated user's profile.
async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let Some(name) = payload.name.map(|n| n.trim().to_string()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "nothing_to_update",
                "message": "No updatable fields provided"
            })),
        )
            .into_response();
    };
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "missing_name",
                "message": "Name must not be empty"
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.update_name(auth.user_id(), name).await {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({
                "id": user.id,
                "email": user.email,
                "name": user.name,
                "updated_at": user.updated_at.to_rfc3339(),
            })),
        )
            .into_response(),
        Err(UserError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update profile");
            internal_error()
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid email or password"
        })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
