//! Decision rules for member and organizer changes.
//!
//! Every organizer is also a member, and a location that has organizers keeps
//! at least one. The functions here only decide; callers apply the result
//! inside their own transaction.

use serde::Serialize;

/// Where a user stands in one entity's membership relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Outsider,
    Member,
    Organizer,
}

impl Standing {
    pub fn from_row(is_organizer: Option<bool>) -> Self {
        match is_organizer {
            None => Self::Outsider,
            Some(false) => Self::Member,
            Some(true) => Self::Organizer,
        }
    }

    pub fn is_member(&self) -> bool {
        !matches!(self, Self::Outsider)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinPlan {
    Create,
    AlreadyMember,
    AlreadyRequested,
}

/// A join request is only recorded for an outsider without one already pending.
pub fn plan_join(standing: Standing, has_pending: bool) -> JoinPlan {
    if standing.is_member() {
        JoinPlan::AlreadyMember
    } else if has_pending {
        JoinPlan::AlreadyRequested
    } else {
        JoinPlan::Create
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradePlan {
    Create,
    NotAMember,
    AlreadyOrganizer,
    AlreadyRequested,
}

pub fn plan_upgrade(standing: Standing, has_pending: bool) -> UpgradePlan {
    match standing {
        Standing::Outsider => UpgradePlan::NotAMember,
        Standing::Organizer => UpgradePlan::AlreadyOrganizer,
        Standing::Member if has_pending => UpgradePlan::AlreadyRequested,
        Standing::Member => UpgradePlan::Create,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromotionPlan {
    Promote,
    AlreadyOrganizer,
    NotAMember,
}

pub fn plan_promotion(standing: Standing) -> PromotionPlan {
    match standing {
        Standing::Outsider => PromotionPlan::NotAMember,
        Standing::Member => PromotionPlan::Promote,
        Standing::Organizer => PromotionPlan::AlreadyOrganizer,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemotionPlan {
    Demote,
    /// Target holds no organizer status; nothing to do.
    NotOrganizer,
    /// Target is the last organizer; nothing changes.
    SoleOrganizer,
}

/// Demotion only touches organizer status and never removes the last organizer.
pub fn plan_demotion(standing: Standing, organizer_count: u64) -> DemotionPlan {
    match standing {
        Standing::Organizer if organizer_count <= 1 => DemotionPlan::SoleOrganizer,
        Standing::Organizer => DemotionPlan::Demote,
        _ => DemotionPlan::NotOrganizer,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalPlan {
    RemoveMember,
    RemoveOrganizerAndMember,
    /// The last organizer stays both organizer and member.
    SoleOrganizer,
    NotAMember,
}

/// Removing an organizer drops both statuses together, unless they are the last one,
/// in which case the membership is left untouched as well.
pub fn plan_removal(standing: Standing, organizer_count: u64) -> RemovalPlan {
    match standing {
        Standing::Outsider => RemovalPlan::NotAMember,
        Standing::Member => RemovalPlan::RemoveMember,
        Standing::Organizer if organizer_count <= 1 => RemovalPlan::SoleOrganizer,
        Standing::Organizer => RemovalPlan::RemoveOrganizerAndMember,
    }
}
