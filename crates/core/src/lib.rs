pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use auth::Authenticator;
pub use domain::lifecycle::{NotificationStatus, SubmissionStage};
pub use domain::order::{NewOrder, Order, OrderId, OrderReceipt};
pub use domain::submission::{ContactMethod, RawSubmission, Submission};
pub use errors::{AuthError, IntakeError};
pub use validation::{FieldViolation, ViolationKind};
