use ::common::RequestStatus;
use chrono::{NaiveDate, NaiveTime, Utc};
use portal::entity::meetup_request;
use sea_orm::{ActiveModelTrait, Set, SqlErr};
use serde_json::json;

use crate::common::{TestApp, routes};

mod propose {
    use super::*;

    #[tokio::test]
    async fn any_user_can_propose_and_organizer_sees_it() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;

        let request_id = app.propose_meetup(id, "spring-talks", &alice.token).await;

        let res = app
            .get_with_token(&routes::meetup_requests(id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["id"], request_id);
        assert_eq!(res.body[0]["status"], "pending");
        assert_eq!(res.body[0]["created_by"], alice.id);
    }

    #[tokio::test]
    async fn same_slug_twice_is_already_requested() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.propose_meetup(id, "spring-talks", &alice.token).await;

        let res = app
            .post_with_token(
                &routes::meetup_requests(id),
                &json!({
                    "title": "Spring talks again",
                    "slug": "spring-talks",
                    "date": "2030-06-01",
                    "time": "19:00:00",
                }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "already_requested");
    }

    #[tokio::test]
    async fn storage_keeps_one_pending_proposal_per_slug() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.propose_meetup(id, "spring-talks", &admin.token).await;

        let duplicate = meetup_request::ActiveModel {
            title: Set("Spring talks again".into()),
            slug: Set("spring-talks".into()),
            date: Set(NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()),
            time: Set(NaiveTime::from_hms_opt(19, 0, 0).unwrap()),
            venue: Set(String::new()),
            description: Set(String::new()),
            location_id: Set(id),
            created_by: Set(admin.id),
            status: Set(RequestStatus::Pending),
            approved_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&app.db)
        .await;

        let err = duplicate.expect_err("second pending proposal should be refused");
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn non_organizer_cannot_list_requests() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;

        let res = app
            .get_with_token(&routes::meetup_requests(id), &alice.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .post_with_token(
                &routes::meetup_requests(42),
                &json!({
                    "title": "Lost",
                    "slug": "lost",
                    "date": "2030-06-01",
                    "time": "19:00:00",
                }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod approve {
    use super::*;

    #[tokio::test]
    async fn approval_creates_meetup_and_promotes_requester() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let request_id = app.propose_meetup(id, "spring-talks", &alice.token).await;

        let res = app
            .action_with_token(&routes::meetup_request_approve(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 201, "approve failed: {}", res.text);
        assert_eq!(res.body["message"], "Meetup successfully created!");
        let meetup = &res.body["data"];
        assert_eq!(meetup["slug"], "spring-talks");
        assert_eq!(meetup["title"], "Meetup spring-talks");
        assert_eq!(meetup["date"], "2030-05-17");
        assert_eq!(meetup["time"], "18:30:00");
        assert_eq!(meetup["venue"], "Main hall");
        assert_eq!(meetup["created_by"], alice.id);

        let roster = app.location_roster(id).await;
        assert_eq!(
            roster.iter().filter(|(uid, _)| *uid == alice.id as i64).count(),
            1
        );
        assert!(roster.contains(&(alice.id as i64, true)));

        let res = app
            .get_with_token(&routes::meetup_requests(id), &admin.token)
            .await;
        assert_eq!(res.body, json!([]));

        let res = app
            .get_without_token(&routes::meetup(id, meetup["id"].as_i64().unwrap() as i32))
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn second_approval_by_existing_organizer_adds_no_duplicate() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.create_meetup(id, "first", &alice.token, &admin.token).await;
        app.create_meetup(id, "second", &alice.token, &admin.token).await;

        let roster = app.location_roster(id).await;
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&(alice.id as i64, true)));

        let res = app.get_without_token(&routes::meetups(id)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn slug_collision_keeps_request_pending() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let berlin = app.create_location(&admin.token, "berlin").await;
        let paris = app.create_location(&admin.token, "paris").await;
        app.create_meetup(berlin, "launch", &admin.token, &admin.token).await;
        let request_id = app.propose_meetup(paris, "launch", &alice.token).await;

        let res = app
            .action_with_token(&routes::meetup_request_approve(paris, request_id), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "slug_already_exists");
        assert_eq!(
            res.body["message"],
            "Slug launch already exists, please choose a different slug."
        );
        let res = app
            .get_with_token(&routes::meetup_requests(paris), &admin.token)
            .await;
        assert_eq!(res.body[0]["id"], request_id);
        assert_eq!(res.body[0]["status"], "pending");
        assert!(!app
            .location_roster(paris)
            .await
            .iter()
            .any(|(uid, _)| *uid == alice.id as i64));
    }

    #[tokio::test]
    async fn plain_member_cannot_approve() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        app.add_location_member(id, alice.id, &admin.token).await;
        let request_id = app.propose_meetup(id, "spring-talks", &alice.token).await;

        let res = app
            .action_with_token(&routes::meetup_request_approve(id, request_id), &alice.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn approved_request_cannot_be_approved_again() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let request_id = app.propose_meetup(id, "spring-talks", &admin.token).await;
        app.action_with_token(&routes::meetup_request_approve(id, request_id), &admin.token)
            .await;

        let res = app
            .action_with_token(&routes::meetup_request_approve(id, request_id), &admin.token)
            .await;

        assert_eq!(res.status, 409);
    }
}

mod reject {
    use super::*;

    #[tokio::test]
    async fn rejection_deletes_the_request() {
        let app = TestApp::spawn().await;
        let admin = app.create_superuser("admin").await;
        let alice = app.create_user("alice").await;
        let id = app.create_location(&admin.token, "berlin").await;
        let request_id = app.propose_meetup(id, "spring-talks", &alice.token).await;

        let res = app
            .action_with_token(&routes::meetup_request_reject(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "Meetup request successfully rejected!");

        let res = app
            .action_with_token(&routes::meetup_request_approve(id, request_id), &admin.token)
            .await;
        assert_eq!(res.status, 404);
        let res = app.get_without_token(&routes::meetups(id)).await;
        assert_eq!(res.body, json!([]));
    }
}
