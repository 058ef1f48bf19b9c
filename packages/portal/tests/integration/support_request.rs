use ::common::RequestStatus;
use chrono::Utc;
use portal::entity::support_request;
use sea_orm::{ActiveModelTrait, Set, SqlErr};
use serde_json::json;

use crate::common::{TestApp, routes};

mod volunteer {
    use super::*;

    #[tokio::test]
    async fn member_can_volunteer_once() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let body = json!({"description": "I can bring a projector"});

        let res = app
            .post_with_token(&routes::support_requests(id, meetup_id), &body, &alice.token)
            .await;
        assert_eq!(res.status, 201, "volunteer failed: {}", res.text);
        assert_eq!(res.body["data"]["status"], "pending");
        assert_eq!(res.body["data"]["volunteer_id"], alice.id);

        let res = app
            .post_with_token(&routes::support_requests(id, meetup_id), &body, &alice.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "already_requested");
    }

    #[tokio::test]
    async fn storage_keeps_one_pending_offer_per_volunteer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let res = app
            .post_with_token(
                &routes::support_requests(id, meetup_id),
                &json!({"description": "Happy to help"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 201);

        let duplicate = support_request::ActiveModel {
            meetup_id: Set(meetup_id),
            volunteer_id: Set(admin.id),
            description: Set("Still happy to help".into()),
            status: Set(RequestStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&app.db)
        .await;

        let err = duplicate.expect_err("second pending offer should be refused");
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn outsider_cannot_volunteer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;

        let res = app
            .post_with_token(
                &routes::support_requests(id, meetup_id),
                &json!({"description": "Happy to help"}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn meetup_of_another_location_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let berlin = app.create_location(&admin.token, "berlin").await;
        let paris = app.create_location(&admin.token, "paris").await;
        let meetup_id = app.create_meetup(berlin, "launch", &admin.token, &admin.token).await;

        let res = app
            .post_with_token(
                &routes::support_requests(paris, meetup_id),
                &json!({"description": "Happy to help"}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod review {
    use super::*;

    async fn volunteered(app: &TestApp) -> (i32, i32, i32, String) {
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let res = app
            .post_with_token(
                &routes::support_requests(id, meetup_id),
                &json!({"description": "Happy to help"}),
                &alice.token,
            )
            .await;
        (id, meetup_id, res.data_id(), admin.token)
    }

    #[tokio::test]
    async fn organizer_approves_support_request() {
        let app = TestApp::spawn().await;
        let (id, meetup_id, request_id, admin) = volunteered(&app).await;

        let res = app
            .get_with_token(&routes::support_requests(id, meetup_id), &admin)
            .await;
        assert_eq!(res.body[0]["id"], request_id);

        let res = app
            .action_with_token(
                &routes::support_request_approve(id, meetup_id, request_id),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"]["status"], "approved");

        let res = app
            .action_with_token(
                &routes::support_request_approve(id, meetup_id, request_id),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn rejected_support_request_is_deleted() {
        let app = TestApp::spawn().await;
        let (id, meetup_id, request_id, admin) = volunteered(&app).await;

        let res = app
            .action_with_token(
                &routes::support_request_reject(id, meetup_id, request_id),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "Support request successfully rejected!");

        let res = app
            .get_with_token(&routes::support_requests(id, meetup_id), &admin)
            .await;
        assert_eq!(res.body, json!([]));
    }
}

mod manage {
    use super::*;

    #[tokio::test]
    async fn volunteer_edits_own_offer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.add_location_member(id, bob.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;
        let path = routes::support_request(id, meetup_id, request_id);

        let res = app
            .patch_with_token(&path, &json!({"description": "I can run the coat check"}), &alice.token)
            .await;
        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["description"], "I can run the coat check");
        assert_eq!(res.body["status"], "pending");

        let res = app
            .patch_with_token(&path, &json!({"description": "Taken over"}), &bob.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(&path, &json!({"description": ""}), &alice.token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn volunteer_withdraws_offer() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;

        let res = app
            .delete_with_token(&routes::support_request(id, meetup_id, request_id), &alice.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_with_token(&routes::support_requests(id, meetup_id), &admin.token)
            .await;
        assert!(res.body.as_array().unwrap().is_empty());

        // Withdrawing frees the slot for a new offer
        let res = app
            .post_with_token(
                &routes::support_requests(id, meetup_id),
                &json!({"description": "Back again"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 201);
    }

    #[tokio::test]
    async fn accepted_volunteers_are_public() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.add_location_member(id, bob.id, &admin.token).await;
        let accepted = app.volunteer(id, meetup_id, &alice.token).await;
        app.volunteer(id, meetup_id, &bob.token).await;
        let res = app
            .action_with_token(
                &routes::support_request_approve(id, meetup_id, accepted),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .get_without_token(&routes::volunteers(id, meetup_id))
            .await;
        assert_eq!(res.status, 200);
        let listed = res.body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], accepted);
        assert_eq!(listed[0]["volunteer_id"], alice.id);
    }
}

