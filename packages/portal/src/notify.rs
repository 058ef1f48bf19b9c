//! Best-effort notices to requesters and organizers.
//!
//! Notices go out after the workflow transaction commits. A failed delivery is
//! logged and never undoes the state change that triggered it.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    JoinRequested,
    JoinApproved,
    JoinRejected,
    OrganizerUpgradeRequested,
    OrganizerPromoted,
    MeetupRequested,
    MeetupApproved,
    MeetupRejected,
    SupportRequested,
    SupportApproved,
    RoleGranted,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub recipients: Vec<i32>,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, recipients: Vec<i32>, message: impl Into<String>) -> Self {
        Self {
            kind,
            recipients,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()>;
}

/// Writes notices to the log. Used when no delivery channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()> {
        info!(
            kind = ?notice.kind,
            recipients = ?notice.recipients,
            "{}",
            notice.message
        );
        Ok(())
    }
}

/// Send a notice, logging instead of failing when delivery breaks.
pub async fn dispatch(notifier: &dyn Notifier, notice: Notice) {
    if notice.recipients.is_empty() {
        return;
    }
    if let Err(e) = notifier.notify(&notice).await {
        warn!(kind = ?notice.kind, error = %e, "Notification delivery failed");
    }
}
