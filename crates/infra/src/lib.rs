//! Infrastructure layer: session store and tenancy adapters (in-memory, Postgres).

pub mod db;
pub mod session_store;
pub mod tenancy;

#[cfg(test)]
mod integration_tests;

pub use db::{apply_schema, connect, SCHEMA_SQL};
pub use session_store::{InMemorySessionStore, PgSessionStore};
pub use tenancy::{InMemoryOrganizationResolver, PgOrganizationResolver};
