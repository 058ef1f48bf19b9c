//! Request and approval workflows.
//!
//! Every mutating entry point runs in one transaction: look up the target,
//! check the caller's capability on it, apply the change together with any
//! role grants, commit, and only then send notices. Expected business results
//! come back as an [`Outcome`]; hard failures are [`AppError`]s.

mod comment;
mod community;
mod location;
mod meetup;
mod membership;
pub mod messages;
mod rsvp;
mod support;

pub use comment::CommentOn;

pub use community::RoleChange;

use common::{ObjectKind, ObjectRef, PermissionCatalog, WorkflowStatus};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, SqlErr};
use serde::Serialize;

use crate::error::AppError;
use crate::notify::{self, Notice, Notifier};
use crate::state::AppState;
use crate::utils::access::{find_community, find_location};

/// Result of a workflow call that completed without a hard failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Outcome<T> {
    pub status: WorkflowStatus,
    /// User-facing text describing what happened.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: WorkflowStatus::Ok,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A non-success business result. Nothing was changed.
    pub fn refused(status: WorkflowStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            status: self.status,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

/// Entry point for the portal's workflows, borrowed from the shared state.
pub struct Workflow<'a> {
    db: &'a DatabaseConnection,
    catalog: &'a PermissionCatalog,
    notifier: &'a dyn Notifier,
}

impl<'a> Workflow<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            catalog: &state.catalog,
            notifier: state.notifier.as_ref(),
        }
    }

    async fn notify(&self, notice: Notice) {
        notify::dispatch(self.notifier, notice).await;
    }
}

/// "community <name>" or "meetup location <name>", 404 when the target is gone.
async fn describe<C: ConnectionTrait>(db: &C, target: ObjectRef) -> Result<String, AppError> {
    Ok(match target.kind {
        ObjectKind::Community => {
            format!("community {}", find_community(db, target.id).await?.name)
        }
        ObjectKind::MeetupLocation => {
            format!("meetup location {}", find_location(db, target.id).await?.name)
        }
    })
}

/// A unique violation on a slugged row becomes a 409 naming the slug.
fn slug_conflict(err: DbErr, slug: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(messages::slug_already_exists(slug))
        }
        _ => AppError::from(err),
    }
}
