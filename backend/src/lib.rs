//! Guideforge backend: manual authoring over a REST API.
//!
//! - [`domain`]: manuals, ordered steps, images and accounts, the step
//!   ordering engine, the search contract, and the ports services depend on.
//! - [`inbound`]: the actix-web adapter under `/api/v1`.
//! - [`outbound`]: Diesel/PostgreSQL and in-memory repositories, plus the
//!   upload directory used for image clean-up.
//! - [`settings`]: layered configuration.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
