#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a comment is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum CommentTarget {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "meetup"))]
    Meetup,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "support_request"))]
    SupportRequest,
}

impl CommentTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meetup => "meetup",
            Self::SupportRequest => "support_request",
        }
    }
}

impl fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
