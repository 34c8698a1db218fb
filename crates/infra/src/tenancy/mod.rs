//! `OrganizationResolver` adapters (host subdomain → organization).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryOrganizationResolver;
pub use postgres::PgOrganizationResolver;
