//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::{audit::audit_middleware, auth::auth_middleware},
};

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod health;
pub mod transfers;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication. Layer order matters:
    // the auth layer is added last so it runs first and the audit layer
    // sees the authenticated claims.
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(transfers::routes())
        .merge(admin::routes())
        .merge(auth::profile_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
