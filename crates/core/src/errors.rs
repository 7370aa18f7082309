use thiserror::Error;

use crate::domain::lifecycle::SubmissionStage;
use crate::validation::FieldViolation;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("credential was not supplied")]
    Missing,
    #[error("credential does not match the configured key")]
    Invalid,
}

/// Every way a submission can be rejected. Notification failures are not
/// part of this taxonomy because they never reach the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("malformed submission body: {0}")]
    Shape(String),
    #[error("submission failed validation with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("order persistence failed: {0}")]
    Storage(String),
}

impl IntakeError {
    /// Caller-safe message. Never includes internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Shape(_) => "Invalid request body",
            Self::Validation(_) => "Validation failed",
            Self::Auth(_) => "Invalid or missing API key",
            Self::Storage(_) => "Failed to submit order. Please try again.",
        }
    }

    pub fn terminal_stage(&self) -> SubmissionStage {
        match self {
            Self::Shape(_) | Self::Validation(_) => SubmissionStage::RejectedValidation,
            Self::Auth(_) => SubmissionStage::RejectedAuth,
            Self::Storage(_) => SubmissionStage::RejectedStorage,
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}
