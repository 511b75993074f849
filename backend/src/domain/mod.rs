//! Domain primitives, aggregates and services.
//!
//! Purpose: define the manual authoring model (users, manuals, steps,
//! images), the step ordering engine, and the manual search contract,
//! independent of transport and storage. Adapters reach the domain only
//! through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Manual, Step, Image, User and their draft/changes inputs.
//! - OrderedSequence: positional step mutations with change reporting.
//! - ManualSearch: filter, sort and pagination contract.
//! - ManualService / AccountService: driving port implementations.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod ids;
pub mod image;
pub mod manual;
pub mod manuals;
pub mod ordering;
pub mod ports;
pub mod relation;
pub mod search;
pub mod step;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::accounts::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError, FieldErrors};
pub use self::ids::{IdValidationError, ImageId, ManualId, StepId, UserId};
pub use self::image::{Image, ImageUpload};
pub use self::manual::{Manual, ManualChanges, ManualDraft, Visibility};
pub use self::manuals::{MAX_ATTEMPTS, ManualService};
pub use self::ordering::{OrderChange, Ordered, OrderedSequence, OrderingError};
pub use self::relation::Relation;
pub use self::search::{ManualSearch, SearchScope, SortField, SortOrder};
pub use self::step::{Step, StepChanges, StepDraft, StepOrderUpdate};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, NewUser, PasswordChange, PasswordDigest, PasswordHashError, ProfileChanges,
    Registration, StoredCredentials, User, UserValidationError, Username,
};
pub use self::validation::{
    ContentPolicy, ValidationError, validate_image, validate_manual, validate_manual_changes,
    validate_step, validate_step_changes,
};
