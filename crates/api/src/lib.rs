//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the authentication surface
//! - JWT bearer middleware
//! - Response types

pub mod middleware;
pub mod routes;

use std::iter::once;
use std::sync::Arc;

use axum::Router;
use http::header::AUTHORIZATION;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use florin_auth::{AuthService, TwoFactorService};
use florin_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication orchestrator.
    pub auth: Arc<AuthService>,
    /// Second-factor service.
    pub two_factor: Arc<TwoFactorService>,
    /// JWT service for bearer validation.
    pub jwt: Arc<JwtService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
