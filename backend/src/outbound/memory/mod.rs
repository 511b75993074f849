//! In-process adapters for running without PostgreSQL.
//!
//! [`InMemoryStore`] implements every repository port against one shared
//! state, mirroring the relational rules of the Diesel adapters: cascading
//! deletes, step revisions, and unique usernames and emails. The server
//! falls back to it when no database URL is configured, and behaviour
//! suites use it to drive the domain services end to end.

mod store;

pub use store::InMemoryStore;
