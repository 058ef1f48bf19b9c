use ::common::RequestKind;
use portal::entity::{location_member, meetup, meetup_request, membership_request, object_permission};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn creator_is_the_first_organizer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;

        let id = app.create_location(&admin.token, "berlin").await;

        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
        let res = app.get_without_token(&routes::location(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Location berlin");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_location() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::LOCATIONS,
                &json!({"name": "Berlin", "slug": "berlin"}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod join_and_upgrade {
    use super::*;

    #[tokio::test]
    async fn approved_join_request_grants_member_rights() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .action_with_token(&routes::location_join(id), &alice.token)
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["data"]["kind"], "location_join");
        let request_id = res.data_id();

        let res = app
            .action_with_token(&routes::location_request_approve(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 200, "approve failed: {}", res.text);
        assert_eq!(res.body["message"], "alice is now a member of meetup location Location berlin.");

        let roster = app.location_roster(id).await;
        assert!(roster.contains(&(alice.id as i64, false)));

        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(
            res.body["roles"],
            json!([{"role": "meetup_location_member", "target": {"kind": "meetup_location", "id": id}}])
        );
    }

    #[tokio::test]
    async fn outsider_cannot_ask_for_organizer_upgrade() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .action_with_token(&routes::location_upgrade(id), &alice.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "not_a_member");
    }

    #[tokio::test]
    async fn organizer_cannot_ask_for_upgrade_again() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .action_with_token(&routes::location_upgrade(id), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "already_organizer");
    }

    #[tokio::test]
    async fn approved_upgrade_makes_member_an_organizer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;

        let res = app
            .action_with_token(&routes::location_upgrade(id), &alice.token)
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["data"]["kind"], "location_upgrade");
        let request_id = res.data_id();

        let res = app
            .action_with_token(&routes::location_upgrade(id), &alice.token)
            .await;
        assert_eq!(res.body["status"], "already_requested");

        let res = app
            .action_with_token(&routes::location_request_approve(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");

        assert!(app.location_roster(id).await.contains(&(alice.id as i64, true)));
        assert!(app.location_request_ids(id, &alice.token).await.is_empty());
    }

    #[tokio::test]
    async fn direct_add_settles_pending_join_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        app.action_with_token(&routes::location_join(id), &alice.token)
            .await;
        assert_eq!(app.location_request_ids(id, &admin.token).await.len(), 1);

        app.add_location_member(id, alice.id, &admin.token).await;

        assert!(app.location_request_ids(id, &admin.token).await.is_empty());
    }

    #[tokio::test]
    async fn rejected_request_cannot_be_decided_again() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let res = app
            .action_with_token(&routes::location_join(id), &alice.token)
            .await;
        let request_id = res.data_id();

        let res = app
            .action_with_token(&routes::location_request_reject(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .action_with_token(&routes::location_request_reject(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 404);

        let roster = app.location_roster(id).await;
        assert!(!roster.iter().any(|(uid, _)| *uid == alice.id as i64));
    }

    #[tokio::test]
    async fn community_request_is_not_visible_through_a_location() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let community_id = app.create_community(&admin.token, "rust").await;
        let location_id = app.create_location(&admin.token, "berlin").await;
        let res = app
            .action_with_token(&routes::community_join(community_id), &alice.token)
            .await;
        let request_id = res.data_id();

        // Ids line up across tables; the request kind must still be checked.
        assert_eq!(community_id, location_id);
        let res = app
            .action_with_token(
                &routes::location_request_approve(location_id, request_id),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod members {
    use super::*;

    #[tokio::test]
    async fn adding_an_existing_member_is_already_member() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .post_with_token(
                &routes::location_members(id),
                &json!({"user_id": admin.id}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "already_member");
    }

    #[tokio::test]
    async fn plain_member_cannot_add_members() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;

        let res = app
            .post_with_token(
                &routes::location_members(id),
                &json!({"user_id": bob.id}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn removing_a_member_revokes_their_rights() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;

        let res = app
            .delete_with_token(&routes::location_member(id, alice.id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");

        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(res.body["roles"], json!([]));
    }

    #[tokio::test]
    async fn removal_drops_pending_upgrade_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let res = app
            .action_with_token(&routes::location_upgrade(id), &alice.token)
            .await;
        assert_eq!(res.status, 201);
        let request_id = res.data_id();

        app.delete_with_token(&routes::location_member(id, alice.id), &admin.token)
            .await;

        assert!(app.location_request_ids(id, &admin.token).await.is_empty());
        let res = app
            .action_with_token(&routes::location_request_approve(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn removing_a_non_member_is_refused() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .delete_with_token(&routes::location_member(id, alice.id), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "not_a_member");
    }

    #[tokio::test]
    async fn sole_organizer_cannot_be_removed() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .delete_with_token(&routes::location_member(id, admin.id), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "sole_organizer");
        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
    }

    #[tokio::test]
    async fn removing_an_organizer_drops_both_statuses() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.promote_organizer(id, alice.id, &admin.token).await;

        let res = app
            .delete_with_token(&routes::location_member(id, alice.id), &admin.token)
            .await;
        assert_eq!(res.body["status"], "success");

        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(res.body["roles"], json!([]));
    }
}

mod organizers {
    use super::*;

    #[tokio::test]
    async fn promoted_organizer_can_add_members() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.promote_organizer(id, alice.id, &admin.token).await;

        app.add_location_member(id, bob.id, &alice.token).await;

        assert!(app.location_roster(id).await.contains(&(bob.id as i64, false)));
    }

    #[tokio::test]
    async fn promoting_an_organizer_again_changes_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .post_with_token(
                &routes::location_organizers(id),
                &json!({"user_id": admin.id}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");
        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
    }

    #[tokio::test]
    async fn outsider_cannot_be_promoted() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .post_with_token(
                &routes::location_organizers(id),
                &json!({"user_id": alice.id}),
                &admin.token,
            )
            .await;

        assert_eq!(res.body["status"], "not_a_member");
        assert_eq!(app.location_roster(id).await.len(), 1);
    }

    #[tokio::test]
    async fn sole_organizer_cannot_be_demoted() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .delete_with_token(&routes::location_organizer(id, admin.id), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "sole_organizer");
        assert_eq!(app.location_roster(id).await, vec![(admin.id as i64, true)]);
    }

    #[tokio::test]
    async fn demoted_organizer_keeps_membership_rights() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.promote_organizer(id, alice.id, &admin.token).await;

        let res = app
            .delete_with_token(&routes::location_organizer(id, alice.id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");
        assert_eq!(res.body["data"]["is_organizer"], false);

        assert!(app.location_roster(id).await.contains(&(alice.id as i64, false)));
        let res = app
            .post_with_token(
                &routes::location_members(id),
                &json!({"user_id": bob.id}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(
            res.body["roles"],
            json!([{"role": "meetup_location_member", "target": {"kind": "meetup_location", "id": id}}])
        );
    }
}

mod admin {
    use super::*;

    #[tokio::test]
    async fn admin_renames_location() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .patch_with_token(&routes::location(id), &json!({"name": "Berlin Mitte"}), &admin.token)
            .await;
        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["name"], "Berlin Mitte");
        assert_eq!(res.body["slug"], "berlin");
        assert_eq!(res.body["description"], "Monthly meetups");

        let res = app
            .patch_with_token(&routes::location(id), &json!({"name": "  "}), &admin.token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn organizer_cannot_edit_or_delete_location() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.promote_organizer(id, alice.id, &admin.token).await;

        let res = app
            .patch_with_token(&routes::location(id), &json!({"name": "Mine"}), &alice.token)
            .await;
        assert_eq!(res.status, 403);
        let res = app.delete_with_token(&routes::location(id), &alice.token).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn deleting_location_clears_members_meetups_and_grants() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let meetup_id = app.create_meetup(id, "launch", &alice.token, &admin.token).await;
        app.volunteer(id, meetup_id, &alice.token).await;
        app.propose_meetup(id, "retro", &alice.token).await;
        let res = app.action_with_token(&routes::location_join(id), &bob.token).await;
        assert_eq!(res.status, 201);

        let res = app.delete_with_token(&routes::location(id), &admin.token).await;
        assert_eq!(res.status, 204, "delete failed: {}", res.text);

        let res = app.get_without_token(&routes::location(id)).await;
        assert_eq!(res.status, 404);
        let members = location_member::Entity::find()
            .filter(location_member::Column::LocationId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let meetups = meetup::Entity::find()
            .filter(meetup::Column::LocationId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let grants = object_permission::Entity::find()
            .filter(object_permission::Column::TargetKind.eq("meetup_location"))
            .filter(object_permission::Column::TargetId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let proposals = meetup_request::Entity::find()
            .filter(meetup_request::Column::LocationId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let joins = membership_request::Entity::find()
            .filter(membership_request::Column::Kind.eq(RequestKind::LocationJoin))
            .filter(membership_request::Column::TargetId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!((members, meetups, grants, proposals, joins), (0, 0, 0, 0, 0));

        // The slug is free again
        app.create_location(&admin.token, "berlin").await;
    }
}

