use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{comment, meetup_request, object_permission, role_assignment};

/// Partial unique indexes guarding "one pending request" rules. Decided rows
/// are kept for audit, so each constraint only covers `pending`.
const PENDING_REQUEST_INDEXES: &[(&str, &str)] = &[
    (
        "idx_membership_request_pending",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_membership_request_pending \
         ON membership_request (kind, target_id, requester_id) \
         WHERE status = 'pending'",
    ),
    (
        "idx_meetup_request_pending_slug",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_meetup_request_pending_slug \
         ON meetup_request (location_id, slug) \
         WHERE status = 'pending'",
    ),
    (
        "idx_support_request_pending",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_support_request_pending \
         ON support_request (meetup_id, volunteer_id) \
         WHERE status = 'pending'",
    ),
];

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite or partial indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Pending-request guards are load-bearing; fail startup without them.
    for (name, stmt) in PENDING_REQUEST_INDEXES {
        db.execute_unprepared(stmt).await?;
        info!("Ensured index {} exists", name);
    }

    // Capability lookups:
    // SELECT ... FROM object_permission WHERE user_id = ? AND target_kind = ? AND target_id = ?
    let permission_lookup = Index::create()
        .if_not_exists()
        .name("idx_object_permission_lookup")
        .table(object_permission::Entity)
        .col(object_permission::Column::UserId)
        .col(object_permission::Column::TargetKind)
        .col(object_permission::Column::TargetId)
        .to_string(PostgresQueryBuilder);

    // Union recompute on revoke reads all roles a user holds on one object
    let role_lookup = Index::create()
        .if_not_exists()
        .name("idx_role_assignment_lookup")
        .table(role_assignment::Entity)
        .col(role_assignment::Column::UserId)
        .col(role_assignment::Column::TargetKind)
        .col(role_assignment::Column::TargetId)
        .to_string(PostgresQueryBuilder);

    // Pending meetup requests per location
    let meetup_queue = Index::create()
        .if_not_exists()
        .name("idx_meetup_request_location_status")
        .table(meetup_request::Entity)
        .col(meetup_request::Column::LocationId)
        .col(meetup_request::Column::Status)
        .to_string(PostgresQueryBuilder);

    // Comment threads
    let comment_thread = Index::create()
        .if_not_exists()
        .name("idx_comment_target")
        .table(comment::Entity)
        .col(comment::Column::Target)
        .col(comment::Column::TargetId)
        .to_string(PostgresQueryBuilder);

    for (name, stmt) in [
        ("idx_object_permission_lookup", permission_lookup),
        ("idx_role_assignment_lookup", role_lookup),
        ("idx_meetup_request_location_status", meetup_queue),
        ("idx_comment_target", comment_thread),
    ] {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
