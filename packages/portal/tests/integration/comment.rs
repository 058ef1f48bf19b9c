use ::common::CommentTarget;
use portal::entity::comment;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};

mod meetup_comments {
    use super::*;

    #[tokio::test]
    async fn any_signed_in_user_can_comment() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;

        let res = app
            .post_with_token(
                &routes::meetup_comments(id, meetup_id),
                &json!({"body": "Is there parking nearby?"}),
                &bob.token,
            )
            .await;
        assert_eq!(res.status, 201, "comment failed: {}", res.text);
        assert_eq!(res.body["author"], "bob");
        assert_eq!(res.body["target"], "meetup");
        assert_eq!(res.body["target_id"], meetup_id);
        assert!(res.body["updated_at"].is_null());

        let res = app
            .get_without_token(&routes::meetup_comments(id, meetup_id))
            .await;
        assert_eq!(res.status, 200);
        let comments = res.body.as_array().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["body"], "Is there parking nearby?");
        assert_eq!(comments[0]["author_id"], bob.id);
    }

    #[tokio::test]
    async fn anonymous_and_blank_comments_are_refused() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;

        let res = app
            .post_without_token(&routes::meetup_comments(id, meetup_id), &json!({"body": "hi"}))
            .await;
        assert_eq!(res.status, 401);

        let res = app
            .post_with_token(
                &routes::meetup_comments(id, meetup_id),
                &json!({"body": "   "}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn only_the_author_edits() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let comment_id = app
            .post_with_token(
                &routes::meetup_comments(id, meetup_id),
                &json!({"body": "See you thre"}),
                &bob.token,
            )
            .await
            .id();
        let path = routes::meetup_comment(id, meetup_id, comment_id);

        let res = app
            .patch_with_token(&path, &json!({"body": "See you there"}), &bob.token)
            .await;
        assert_eq!(res.status, 200, "edit failed: {}", res.text);
        assert_eq!(res.body["body"], "See you there");
        assert!(!res.body["updated_at"].is_null());

        for token in [&carol.token, &admin.token] {
            let res = app
                .patch_with_token(&path, &json!({"body": "Hijacked"}), token)
                .await;
            assert_eq!(res.status, 403);
        }
    }

    #[tokio::test]
    async fn author_or_admin_deletes() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let mut ids = Vec::new();
        for body in ["first", "second"] {
            let res = app
                .post_with_token(
                    &routes::meetup_comments(id, meetup_id),
                    &json!({"body": body}),
                    &bob.token,
                )
                .await;
            ids.push(res.id());
        }

        let res = app
            .delete_with_token(&routes::meetup_comment(id, meetup_id, ids[0]), &carol.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .delete_with_token(&routes::meetup_comment(id, meetup_id, ids[0]), &bob.token)
            .await;
        assert_eq!(res.status, 204);
        let res = app
            .delete_with_token(&routes::meetup_comment(id, meetup_id, ids[1]), &admin.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_without_token(&routes::meetup_comments(id, meetup_id))
            .await;
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_is_reached_only_through_its_meetup() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let first = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let second = app.create_meetup(id, "retro", &admin.token, &admin.token).await;
        let comment_id = app
            .post_with_token(
                &routes::meetup_comments(id, first),
                &json!({"body": "Slides please"}),
                &admin.token,
            )
            .await
            .id();

        let res = app
            .patch_with_token(
                &routes::meetup_comment(id, second, comment_id),
                &json!({"body": "Moved"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 404);
        let res = app
            .delete_with_token(&routes::meetup_comment(id, second, comment_id), &admin.token)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod support_request_comments {
    use super::*;

    #[tokio::test]
    async fn member_comments_on_support_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.add_location_member(id, bob.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;

        let res = app
            .post_with_token(
                &routes::support_request_comments(id, meetup_id, request_id),
                &json!({"body": "I can help you set up"}),
                &bob.token,
            )
            .await;
        assert_eq!(res.status, 201, "comment failed: {}", res.text);
        assert_eq!(res.body["target"], "support_request");
        assert_eq!(res.body["target_id"], request_id);

        let res = app
            .get_without_token(&routes::support_request_comments(id, meetup_id, request_id))
            .await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);

        // Meetup comments are a separate thread
        let res = app
            .get_without_token(&routes::meetup_comments(id, meetup_id))
            .await;
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn outsider_cannot_comment_on_support_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;

        let res = app
            .post_with_token(
                &routes::support_request_comments(id, meetup_id, request_id),
                &json!({"body": "Me too"}),
                &bob.token,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn author_edits_support_request_comment() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;
        let comment_id = app
            .post_with_token(
                &routes::support_request_comments(id, meetup_id, request_id),
                &json!({"body": "Arriving at 6"}),
                &alice.token,
            )
            .await
            .id();
        let path = routes::support_request_comment(id, meetup_id, request_id, comment_id);

        let res = app
            .patch_with_token(&path, &json!({"body": "Arriving at 5"}), &alice.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["body"], "Arriving at 5");

        let res = app.delete_with_token(&path, &alice.token).await;
        assert_eq!(res.status, 204);
        let res = app.delete_with_token(&path, &alice.token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn withdrawn_request_takes_its_comments() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;
        let res = app
            .post_with_token(
                &routes::support_request_comments(id, meetup_id, request_id),
                &json!({"body": "Thanks!"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 201);

        let res = app
            .delete_with_token(&routes::support_request(id, meetup_id, request_id), &alice.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_without_token(&routes::support_request_comments(id, meetup_id, request_id))
            .await;
        assert_eq!(res.status, 404);

        let left = comment::Entity::find()
            .filter(comment::Column::Target.eq(CommentTarget::SupportRequest))
            .filter(comment::Column::TargetId.eq(request_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}
