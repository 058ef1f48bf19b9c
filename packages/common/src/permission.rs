//! Role templates and the capabilities each one grants.
//!
//! The catalog is built once at startup and shared read-only afterwards. Within
//! an object kind, templates are ranked by tier, and a higher tier must declare
//! every capability of each lower tier. [`PermissionCatalog::new`] rejects a
//! table that breaks this, so lookups never have to re-check it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::object::ObjectKind;

pub const COMMUNITY_MODERATOR: &str = "community_moderator";
pub const COMMUNITY_LEADER: &str = "community_leader";
pub const MEETUP_LOCATION_MEMBER: &str = "meetup_location_member";
pub const MEETUP_LOCATION_ORGANIZER: &str = "meetup_location_organizer";

/// Capability codes checked by the workflow layer.
pub mod capability {
    pub const CHANGE_COMMUNITY: &str = "change_community";
    pub const ADD_COMMUNITY: &str = "add_community";
    pub const APPROVE_COMMUNITY_JOINREQUEST: &str = "approve_community_joinrequest";
    pub const ADD_SUPPORT_REQUEST: &str = "add_support_request";
    pub const ADD_MEETUP_RSVP: &str = "add_meetup_rsvp";
    pub const ADD_SUPPORT_REQUEST_COMMENT: &str = "add_support_request_comment";
    pub const VIEW_MEETUP_REQUEST: &str = "view_meetup_location_meetuprequest";
    pub const APPROVE_MEETUP_REQUEST: &str = "approve_meetup_location_meetuprequest";
    pub const REJECT_MEETUP_REQUEST: &str = "reject_meetup_location_meetuprequest";
    pub const ADD_LOCATION_MEMBER: &str = "add_meetup_location_member";
    pub const DELETE_LOCATION_MEMBER: &str = "delete_meetup_location_member";
    pub const ADD_LOCATION_ORGANIZER: &str = "add_meetup_location_organizer";
    pub const DELETE_LOCATION_ORGANIZER: &str = "delete_meetup_location_organizer";
    pub const APPROVE_LOCATION_JOINREQUEST: &str = "approve_meetup_location_joinrequest";
    pub const REJECT_LOCATION_JOINREQUEST: &str = "reject_meetup_location_joinrequest";
    pub const APPROVE_SUPPORT_REQUEST: &str = "approve_support_request";
    pub const REJECT_SUPPORT_REQUEST: &str = "reject_support_request";
}

const COMMUNITY_MODERATOR_PERMISSIONS: &[&str] = &[
    "add_tag",
    "change_tag",
    "add_resourcetype",
    "change_resourcetype",
    "add_community_news",
    "change_community_news",
    "add_community_resource",
    "change_community_resource",
    "delete_tag",
    "delete_resourcetype",
    "delete_community_news",
    "delete_community_resource",
    "add_community_page",
    "change_community_page",
    "delete_community_page",
    "approve_community_comment",
    "delete_community_comment",
    "add_community_systersuser",
    "change_community_systersuser",
    "delete_community_systersuser",
    capability::APPROVE_COMMUNITY_JOINREQUEST,
];

const COMMUNITY_LEADER_EXTRA: &[&str] = &[capability::CHANGE_COMMUNITY, capability::ADD_COMMUNITY];

const LOCATION_MEMBER_PERMISSIONS: &[&str] = &[
    capability::ADD_MEETUP_RSVP,
    capability::ADD_SUPPORT_REQUEST,
    capability::ADD_SUPPORT_REQUEST_COMMENT,
];

const LOCATION_ORGANIZER_EXTRA: &[&str] = &[
    capability::VIEW_MEETUP_REQUEST,
    capability::APPROVE_MEETUP_REQUEST,
    capability::REJECT_MEETUP_REQUEST,
    capability::ADD_LOCATION_MEMBER,
    capability::DELETE_LOCATION_MEMBER,
    capability::ADD_LOCATION_ORGANIZER,
    capability::DELETE_LOCATION_ORGANIZER,
    capability::APPROVE_LOCATION_JOINREQUEST,
    capability::REJECT_LOCATION_JOINREQUEST,
    capability::APPROVE_SUPPORT_REQUEST,
    capability::REJECT_SUPPORT_REQUEST,
];

/// A named bundle of capabilities that can be granted on one kind of object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleTemplate {
    pub role_id: String,
    /// Display label; `{}` is replaced with the entity name.
    pub label_format: String,
    pub target: ObjectKind,
    /// Rank inside the object kind. Higher tiers contain all lower-tier capabilities.
    pub tier: u8,
    pub permission_codes: Vec<String>,
}

impl RoleTemplate {
    pub fn new(
        role_id: &str,
        label_format: &str,
        target: ObjectKind,
        tier: u8,
        codes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            role_id: role_id.to_string(),
            label_format: label_format.to_string(),
            target,
            tier,
            permission_codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn label(&self, entity_name: &str) -> String {
        self.label_format.replacen("{}", entity_name, 1)
    }

    pub fn grants(&self, capability: &str) -> bool {
        self.permission_codes.iter().any(|c| c == capability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Role id must not be empty")]
    EmptyRoleId,

    #[error("Role '{0}' is declared more than once")]
    DuplicateRole(String),

    #[error("Role '{role}' must include '{missing}' granted by lower-tier role '{lower}'")]
    NotSuperset {
        role: String,
        lower: String,
        missing: String,
    },
}

/// Immutable role → capability table.
#[derive(Clone, Debug)]
pub struct PermissionCatalog {
    roles: BTreeMap<String, RoleTemplate>,
}

impl PermissionCatalog {
    /// Build a catalog, verifying the tier superset rule for every object kind.
    pub fn new(templates: Vec<RoleTemplate>) -> Result<Self, CatalogError> {
        let mut roles = BTreeMap::new();
        for template in templates {
            if template.role_id.trim().is_empty() {
                return Err(CatalogError::EmptyRoleId);
            }
            if roles.contains_key(&template.role_id) {
                return Err(CatalogError::DuplicateRole(template.role_id));
            }
            roles.insert(template.role_id.clone(), template);
        }

        for higher in roles.values() {
            for lower in roles.values() {
                if lower.target != higher.target || lower.tier >= higher.tier {
                    continue;
                }
                if let Some(missing) = lower
                    .permission_codes
                    .iter()
                    .find(|code| !higher.grants(code))
                {
                    return Err(CatalogError::NotSuperset {
                        role: higher.role_id.clone(),
                        lower: lower.role_id.clone(),
                        missing: missing.clone(),
                    });
                }
            }
        }

        Ok(Self { roles })
    }

    /// The community and meetup-location roles used by the portal.
    pub fn standard() -> Result<Self, CatalogError> {
        let leader = COMMUNITY_MODERATOR_PERMISSIONS
            .iter()
            .chain(COMMUNITY_LEADER_EXTRA);
        let organizer = LOCATION_MEMBER_PERMISSIONS
            .iter()
            .chain(LOCATION_ORGANIZER_EXTRA);

        Self::new(vec![
            RoleTemplate::new(
                COMMUNITY_MODERATOR,
                "{}: Community Moderator",
                ObjectKind::Community,
                1,
                COMMUNITY_MODERATOR_PERMISSIONS.iter().copied(),
            ),
            RoleTemplate::new(
                COMMUNITY_LEADER,
                "{}: Community Leader",
                ObjectKind::Community,
                2,
                leader.copied(),
            ),
            RoleTemplate::new(
                MEETUP_LOCATION_MEMBER,
                "{}: Member",
                ObjectKind::MeetupLocation,
                0,
                LOCATION_MEMBER_PERMISSIONS.iter().copied(),
            ),
            RoleTemplate::new(
                MEETUP_LOCATION_ORGANIZER,
                "{}: Organizer",
                ObjectKind::MeetupLocation,
                1,
                organizer.copied(),
            ),
        ])
    }

    pub fn template(&self, role_id: &str) -> Option<&RoleTemplate> {
        self.roles.get(role_id)
    }

    /// Capability codes for a role, in declaration order. Unknown roles grant nothing.
    pub fn permissions_for(&self, role_id: &str) -> &[String] {
        self.roles
            .get(role_id)
            .map(|t| t.permission_codes.as_slice())
            .unwrap_or(&[])
    }

    /// Every role whose template lists the capability.
    pub fn roles_declaring(&self, capability: &str) -> BTreeSet<&str> {
        self.roles
            .values()
            .filter(|t| t.grants(capability))
            .map(|t| t.role_id.as_str())
            .collect()
    }

    /// Union of the capabilities granted by the given roles.
    pub fn capabilities_of<'a, I>(&self, role_ids: I) -> BTreeSet<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        role_ids
            .into_iter()
            .flat_map(|r| self.permissions_for(r))
            .map(String::as_str)
            .collect()
    }

    /// Roles that can be granted on the given kind of object, lowest tier first.
    pub fn roles_for(&self, kind: ObjectKind) -> Vec<&RoleTemplate> {
        let mut roles: Vec<_> = self.roles.values().filter(|t| t.target == kind).collect();
        roles.sort_by_key(|t| t.tier);
        roles
    }

    pub fn label(&self, role_id: &str, entity_name: &str) -> Option<String> {
        self.template(role_id).map(|t| t.label(entity_name))
    }
}
