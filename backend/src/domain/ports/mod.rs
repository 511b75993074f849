//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`ImageStorage`]) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`,
//! [`LoginService`]) are implemented by domain services and called by the
//! HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod image_command;
mod image_repository;
mod image_storage;
mod login_service;
mod manual_command;
mod manual_query;
mod manual_repository;
mod step_command;
mod step_repository;
mod user_account_command;
mod user_profile_query;
mod user_repository;

pub use image_command::ImageCommand;
#[cfg(test)]
pub use image_command::MockImageCommand;
#[cfg(test)]
pub use image_repository::MockImageRepository;
pub use image_repository::{ImageRepository, ImageRepositoryError};
#[cfg(test)]
pub use image_storage::MockImageStorage;
pub use image_storage::{FixtureImageStorage, ImageStorage, ImageStorageError};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use manual_command::ManualCommand;
#[cfg(test)]
pub use manual_command::MockManualCommand;
pub use manual_query::ManualQuery;
#[cfg(test)]
pub use manual_query::MockManualQuery;
#[cfg(test)]
pub use manual_repository::MockManualRepository;
pub use manual_repository::{ManualRepository, ManualRepositoryError, NewManual};
#[cfg(test)]
pub use step_command::MockStepCommand;
pub use step_command::StepCommand;
#[cfg(test)]
pub use step_repository::MockStepRepository;
pub use step_repository::{NewStep, StepRepository, StepRepositoryError, StepSet};
#[cfg(test)]
pub use user_account_command::MockUserAccountCommand;
pub use user_account_command::UserAccountCommand;
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
