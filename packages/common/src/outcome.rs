use serde::{Deserialize, Serialize};
use std::fmt;

/// Business outcome of a workflow call.
///
/// These are expected results reported back to the caller, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[serde(rename = "success")]
    Ok,
    SlugAlreadyExists,
    AlreadyRequested,
    AlreadyMember,
    AlreadyOrganizer,
    NotAMember,
    SoleOrganizer,
}

impl WorkflowStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::SlugAlreadyExists => "slug_already_exists",
            Self::AlreadyRequested => "already_requested",
            Self::AlreadyMember => "already_member",
            Self::AlreadyOrganizer => "already_organizer",
            Self::NotAMember => "not_a_member",
            Self::SoleOrganizer => "sole_organizer",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
