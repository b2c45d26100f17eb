//! Relational persistence for the auth/tenancy core.
//!
//! Four principal tables — `tenants`, `users`, `access_keys`,
//! `bucket_permissions` — with every cross-entity operation (cascading
//! deletes, quota counters, lockout, 2FA) exposed as a method on [`Store`]
//! rather than left to callers to compose, so the transactional boundaries
//! live in one place.

mod access_keys;
mod error;
mod grants;
mod schema;
mod store;
mod tenants;
mod users;

pub use error::{StoreError, StoreResult};
pub use store::Store;
