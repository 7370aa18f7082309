use serde::Serialize;

/// Stages a single submission moves through. Rejections are terminal, and a
/// failed notification still ends in `Accepted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Received,
    Authenticated,
    Validated,
    Persisted,
    Notified,
    NotifySkipped,
    NotifyFailed,
    RejectedAuth,
    RejectedValidation,
    RejectedStorage,
    Accepted,
}

impl SubmissionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Authenticated => "authenticated",
            Self::Validated => "validated",
            Self::Persisted => "persisted",
            Self::Notified => "notified",
            Self::NotifySkipped => "notify_skipped",
            Self::NotifyFailed => "notify_failed",
            Self::RejectedAuth => "rejected_auth",
            Self::RejectedValidation => "rejected_validation",
            Self::RejectedStorage => "rejected_storage",
            Self::Accepted => "accepted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::RejectedAuth | Self::RejectedValidation | Self::RejectedStorage | Self::Accepted
        )
    }
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the best-effort notification of an accepted order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Delivered,
    Skipped,
    Failed,
}

impl NotificationStatus {
    pub fn stage(self) -> SubmissionStage {
        match self {
            Self::Delivered => SubmissionStage::Notified,
            Self::Skipped => SubmissionStage::NotifySkipped,
            Self::Failed => SubmissionStage::NotifyFailed,
        }
    }
}
