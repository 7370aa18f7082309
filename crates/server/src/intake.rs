use std::sync::Arc;

use chrono::Utc;
use intake_core::domain::lifecycle::{NotificationStatus, SubmissionStage};
use intake_core::domain::order::{NewOrder, Order};
use intake_core::domain::submission::RawSubmission;
use intake_core::errors::{AuthError, IntakeError};
use intake_core::validation;
use intake_core::Authenticator;
use intake_db::OrderRepository;
use intake_notify::OrderNotifier;
use tracing::{error, info, warn};

/// Everything one submission needs. Cloned per request; the repository and
/// notifier are shared.
#[derive(Clone)]
pub struct IntakeContext {
    pub orders: Arc<dyn OrderRepository>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub authenticator: Authenticator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub order: Order,
    pub notification: NotificationStatus,
}

/// Runs one submission through authenticate, validate, persist and notify.
/// At most one store write and one notification attempt happen, in that
/// order, and a failed notification never turns into a rejection.
pub async fn submit_order(
    context: &IntakeContext,
    credential: Option<&str>,
    body: &[u8],
    correlation_id: &str,
) -> Result<SubmissionOutcome, IntakeError> {
    info!(
        event_name = "intake.submission.received",
        correlation_id,
        stage = %SubmissionStage::Received,
        body_bytes = body.len(),
        "order submission received"
    );

    if let Err(auth_error) = context.authenticator.verify(credential) {
        let reason = match auth_error {
            AuthError::Missing => "missing",
            AuthError::Invalid => "invalid",
        };
        warn!(
            event_name = "intake.submission.rejected",
            correlation_id,
            stage = %SubmissionStage::RejectedAuth,
            reason,
            "order submission rejected by authenticator"
        );
        return Err(auth_error.into());
    }

    let raw = RawSubmission::from_json(body).map_err(|shape_error| {
        warn!(
            event_name = "intake.submission.rejected",
            correlation_id,
            stage = %SubmissionStage::RejectedValidation,
            error = %shape_error,
            "order submission body is malformed"
        );
        shape_error
    })?;

    let submission = validation::validate(raw).map_err(|violations| {
        let fields: Vec<&str> = violations.iter().map(|violation| violation.field).collect();
        warn!(
            event_name = "intake.submission.rejected",
            correlation_id,
            stage = %SubmissionStage::RejectedValidation,
            fields = ?fields,
            "order submission failed validation"
        );
        IntakeError::Validation(violations)
    })?;

    let order =
        context.orders.insert(NewOrder::new(submission, Utc::now())).await.map_err(|db_error| {
            error!(
                event_name = "intake.submission.rejected",
                correlation_id,
                stage = %SubmissionStage::RejectedStorage,
                error = %db_error,
                "order could not be persisted"
            );
            IntakeError::Storage(db_error.to_string())
        })?;
    info!(
        event_name = "intake.order.persisted",
        correlation_id,
        order_id = %order.id,
        stage = %SubmissionStage::Persisted,
        "order persisted"
    );

    let notification = notify(context.notifier.as_ref(), &order, correlation_id).await;

    info!(
        event_name = "intake.submission.accepted",
        correlation_id,
        order_id = %order.id,
        stage = %SubmissionStage::Accepted,
        notification = %notification.stage(),
        "order submission accepted"
    );

    Ok(SubmissionOutcome { order, notification })
}

async fn notify(
    notifier: &dyn OrderNotifier,
    order: &Order,
    correlation_id: &str,
) -> NotificationStatus {
    match notifier.notify(order).await {
        Ok(status) => {
            info!(
                event_name = "intake.order.notification",
                correlation_id,
                order_id = %order.id,
                sink = notifier.sink_name(),
                stage = %status.stage(),
                "order notification finished"
            );
            status
        }
        Err(notify_error) => {
            warn!(
                event_name = "intake.order.notification",
                correlation_id,
                order_id = %order.id,
                sink = notifier.sink_name(),
                stage = %SubmissionStage::NotifyFailed,
                error = %notify_error,
                "order notification failed; order stays accepted"
            );
            NotificationStatus::Failed
        }
    }
}
