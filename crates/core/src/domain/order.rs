use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::submission::Submission;

/// Store-assigned identifier. Unique and monotonic per store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated submission waiting for its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub submission: Submission,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Timestamps are kept at millisecond precision, matching what the store
    /// persists.
    pub fn new(submission: Submission, created_at: DateTime<Utc>) -> Self {
        Self { submission, created_at: created_at.trunc_subsecs(3) }
    }

    pub fn into_order(self, id: OrderId) -> Order {
        Order { id, submission: self.submission, created_at: self.created_at }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub submission: Submission,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            id: self.id.0,
            name: self.submission.name.clone(),
            email: self.submission.email.clone(),
            created_at: format_timestamp(&self.created_at),
        }
    }
}

/// Public projection returned to the caller. Phone and free-text message
/// never leave the service through this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
