use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of entity that object-level permissions are scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Community,
    MeetupLocation,
}

impl ObjectKind {
    pub const ALL: &'static [ObjectKind] = &[Self::Community, Self::MeetupLocation];

    /// Returns the value stored in the `target_kind` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::MeetupLocation => "meetup_location",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid object kind '{0}'. Valid values: community, meetup_location")]
pub struct ParseObjectKindError(String);

impl FromStr for ObjectKind {
    type Err = ParseObjectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community" => Ok(Self::Community),
            "meetup_location" => Ok(Self::MeetupLocation),
            _ => Err(ParseObjectKindError(s.to_string())),
        }
    }
}

/// A concrete entity instance that a capability can be granted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: i32,
}

impl ObjectRef {
    pub fn community(id: i32) -> Self {
        Self {
            kind: ObjectKind::Community,
            id,
        }
    }

    pub fn meetup_location(id: i32) -> Self {
        Self {
            kind: ObjectKind::MeetupLocation,
            id,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}
