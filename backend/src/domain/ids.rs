//! Numeric entity identifiers.
//!
//! Every persisted entity is keyed by a positive 64-bit integer assigned by
//! storage. Each entity gets its own newtype so a step id can never be passed
//! where a manual id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation errors raised when constructing an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// Identifiers start at 1.
    NonPositive { kind: &'static str, value: i64 },
    /// The raw text was not an integer.
    Malformed { kind: &'static str, raw: String },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { kind, value } => {
                write!(f, "{kind} id must be a positive integer, got {value}")
            }
            Self::Malformed { kind, raw } => write!(f, "{kind} id must be an integer, got '{raw}'"),
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(value: i64) -> Result<Self, IdValidationError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(IdValidationError::NonPositive { kind: $kind, value })
                }
            }

            /// Raw integer value as stored.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdValidationError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let value = raw.trim().parse::<i64>().map_err(|_| IdValidationError::Malformed {
                    kind: $kind,
                    raw: raw.to_owned(),
                })?;
                Self::new(value)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a registered user.
    UserId => "user"
);
define_entity_id!(
    /// Identifier of a manual.
    ManualId => "manual"
);
define_entity_id!(
    /// Identifier of a step within a manual.
    StepId => "step"
);
define_entity_id!(
    /// Identifier of an image attached to a step.
    ImageId => "image"
);

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-7)]
    fn non_positive_values_are_rejected(#[case] value: i64) {
        let err = ManualId::new(value).expect_err("non-positive id");
        assert_eq!(err, IdValidationError::NonPositive { kind: "manual", value });
    }

    #[rstest]
    #[case("42", Some(42))]
    #[case(" 7 ", Some(7))]
    #[case("abc", None)]
    #[case("0", None)]
    fn parses_from_path_segments(#[case] raw: &str, #[case] expected: Option<i64>) {
        let parsed = raw.parse::<StepId>().ok().map(StepId::get);
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn serialises_as_plain_integer() {
        let id = ImageId::new(9).expect("valid id");
        assert_eq!(serde_json::to_value(id).expect("serialise"), serde_json::json!(9));
        assert!(serde_json::from_value::<ImageId>(serde_json::json!(-1)).is_err());
    }
}
