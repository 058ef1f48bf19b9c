//! Object-level permission grants.
//!
//! [`RoleGrantEngine`] turns role assignments into capability rows through any
//! [`PermissionStore`]; [`DbPermissionStore`] is the SeaORM-backed store used by
//! the service.

mod engine;
mod store;

pub use engine::{GrantError, RoleGrantEngine};
pub use store::{DbPermissionStore, PermissionStore, StoreError};
