//! Storage backends for the CraftNest core.
//!
//! Both backends implement the `domain` storage traits over a single
//! shared handle, so the catalog, order, and review tables live in one
//! place: a process-wide locked table set for tests and development, and
//! a PostgreSQL pool for production.

mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
