pub mod comment;
pub mod membership;
pub mod object;
pub mod outcome;
pub mod permission;
pub mod request;

pub use comment::CommentTarget;
pub use object::{ObjectKind, ObjectRef};
pub use outcome::WorkflowStatus;
pub use permission::{CatalogError, PermissionCatalog, RoleTemplate};
pub use request::{RequestKind, RequestStatus};
