//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/resolver/token wiring shared by handlers and the gate
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use axum::Router;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    Router::new()
        .merge(routes::public())
        .merge(routes::authenticated(&services))
        .merge(routes::rbac(&services))
        .merge(routes::tenant_scoped(&services))
        .with_state(services)
}
