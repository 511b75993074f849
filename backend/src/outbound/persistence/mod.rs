//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel, with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Ordering decisions are made by the domain; this layer
//!   writes the resulting order numbers and guards them with the manual's
//!   step revision.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Sanitised errors**: driver messages are logged, never returned.
//!
//! # Example
//!
//! ```ignore
//! use guideforge::outbound::persistence::{DbPool, DieselManualRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/guideforge")).await?;
//! let manuals = DieselManualRepository::new(pool);
//! ```

mod diesel_image_repository;
mod diesel_manual_repository;
mod diesel_step_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_image_repository::DieselImageRepository;
pub use diesel_manual_repository::DieselManualRepository;
pub use diesel_step_repository::DieselStepRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
