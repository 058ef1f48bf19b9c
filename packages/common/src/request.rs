#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::object::ObjectKind;

/// Lifecycle of a pending ask.
///
/// `Pending` moves to `Approved` or `Rejected` once and never back.
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "approved"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
}

impl RequestStatus {
    pub const ALL: &'static [RequestStatus] = &[Self::Pending, Self::Approved, Self::Rejected];

    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(self, Self::Pending) && next.is_final()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid request status '{0}'. Valid values: pending, approved, rejected")]
pub struct ParseRequestStatusError(String);

impl FromStr for RequestStatus {
    type Err = ParseRequestStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseRequestStatusError(s.to_string())),
        }
    }
}

/// What a membership request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Join a community.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "community_join"))]
    CommunityJoin,
    /// Join a meetup location.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "location_join"))]
    LocationJoin,
    /// Become an organizer of a meetup location the requester already belongs to.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "location_upgrade"))]
    LocationUpgrade,
}

impl RequestKind {
    pub fn target_kind(&self) -> ObjectKind {
        match self {
            Self::CommunityJoin => ObjectKind::Community,
            Self::LocationJoin | Self::LocationUpgrade => ObjectKind::MeetupLocation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommunityJoin => "community_join",
            Self::LocationJoin => "location_join",
            Self::LocationUpgrade => "location_upgrade",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
