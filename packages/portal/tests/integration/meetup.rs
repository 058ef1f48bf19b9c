use ::common::CommentTarget;
use portal::entity::{comment, rsvp, support_request};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn meetup_body(slug: &str, date: &str) -> Value {
    json!({
        "title": format!("Meetup {slug}"),
        "slug": slug,
        "date": date,
        "time": "19:00:00",
        "venue": "Community hall",
    })
}

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_meetup_without_review() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let res = app
            .post_with_token(&routes::meetups(id), &meetup_body("launch", "2030-01-10"), &admin.token)
            .await;
        assert_eq!(res.status, 201, "create failed: {}", res.text);
        assert_eq!(res.body["slug"], "launch");
        assert_eq!(res.body["created_by"], admin.id);

        let res = app.get_without_token(&routes::meetup(id, res.id())).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn organizer_still_needs_a_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        app.promote_organizer(id, alice.id, &admin.token).await;

        let res = app
            .post_with_token(&routes::meetups(id), &meetup_body("launch", "2030-01-10"), &alice.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn taken_slug_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.create_meetup(id, "launch", &admin.token, &admin.token).await;

        let res = app
            .post_with_token(&routes::meetups(id), &meetup_body("launch", "2030-01-10"), &admin.token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod list {
    use super::*;

    fn slugs(body: &Value) -> Vec<String> {
        body.as_array()
            .expect("meetups should be an array")
            .iter()
            .map(|m| m["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn upcoming_and_past_split_on_today() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        for (slug, date) in [("later", "2099-03-01"), ("earlier", "2001-03-01"), ("soon", "2098-01-01")] {
            let res = app
                .post_with_token(&routes::meetups(id), &meetup_body(slug, date), &admin.token)
                .await;
            assert_eq!(res.status, 201);
        }

        let res = app.get_without_token(&routes::meetups(id)).await;
        assert_eq!(slugs(&res.body), ["earlier", "soon", "later"]);

        let res = app
            .get_without_token(&format!("{}?when=upcoming", routes::meetups(id)))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(slugs(&res.body), ["soon", "later"]);

        let res = app
            .get_without_token(&format!("{}?when=past", routes::meetups(id)))
            .await;
        assert_eq!(slugs(&res.body), ["earlier"]);

        let res = app
            .get_without_token(&format!("{}?when=someday", routes::meetups(id)))
            .await;
        assert_eq!(res.status, 400);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn admin_edits_only_given_fields() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let path = routes::meetup(id, meetup_id);

        let res = app
            .patch_with_token(&path, &json!({"title": "Launch party", "venue": "Roof"}), &admin.token)
            .await;
        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["title"], "Launch party");
        assert_eq!(res.body["venue"], "Roof");
        assert_eq!(res.body["slug"], "launch");

        let res = app.patch_with_token(&path, &json!({}), &admin.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Launch party");
    }

    #[tokio::test]
    async fn slug_change_respects_uniqueness() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        let retro = app.create_meetup(id, "retro", &admin.token, &admin.token).await;

        let res = app
            .patch_with_token(&routes::meetup(id, retro), &json!({"slug": "launch"}), &admin.token)
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .patch_with_token(&routes::meetup(id, retro), &json!({"slug": "Bad Slug"}), &admin.token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn organizer_cannot_edit() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &alice.token, &admin.token).await;

        let res = app
            .patch_with_token(&routes::meetup(id, meetup_id), &json!({"title": "Mine"}), &alice.token)
            .await;
        assert_eq!(res.status, 403);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_meetup_removes_what_hangs_off_it() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.volunteer(id, meetup_id, &alice.token).await;
        app.post_with_token(&routes::rsvps(id, meetup_id), &json!({"coming": true}), &alice.token)
            .await;
        app.post_with_token(
            &routes::meetup_comments(id, meetup_id),
            &json!({"body": "Count me in"}),
            &alice.token,
        )
        .await;
        app.post_with_token(
            &routes::support_request_comments(id, meetup_id, request_id),
            &json!({"body": "Thanks"}),
            &admin.token,
        )
        .await;

        let res = app
            .delete_with_token(&routes::meetup(id, meetup_id), &alice.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .delete_with_token(&routes::meetup(id, meetup_id), &admin.token)
            .await;
        assert_eq!(res.status, 204);
        let res = app.get_without_token(&routes::meetup(id, meetup_id)).await;
        assert_eq!(res.status, 404);

        let answers = rsvp::Entity::find()
            .filter(rsvp::Column::MeetupId.eq(meetup_id))
            .count(&app.db)
            .await
            .unwrap();
        let offers = support_request::Entity::find()
            .filter(support_request::Column::MeetupId.eq(meetup_id))
            .count(&app.db)
            .await
            .unwrap();
        let meetup_comments = comment::Entity::find()
            .filter(comment::Column::Target.eq(CommentTarget::Meetup))
            .filter(comment::Column::TargetId.eq(meetup_id))
            .count(&app.db)
            .await
            .unwrap();
        let request_comments = comment::Entity::find()
            .filter(comment::Column::Target.eq(CommentTarget::SupportRequest))
            .filter(comment::Column::TargetId.eq(request_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!((answers, offers, meetup_comments, request_comments), (0, 0, 0, 0));
    }
}
