use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn guests_count_toward_coming() {
    let app = TestApp::spawn().await;
    let admin = app.create_superuser("admin").await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let id = app.create_location(&admin.token, "berlin").await;
    let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
    app.add_location_member(id, alice.id, &admin.token).await;
    app.add_location_member(id, bob.id, &admin.token).await;

    let res = app
        .post_with_token(
            &routes::rsvps(id, meetup_id),
            &json!({"coming": true, "plus_one": true}),
            &alice.token,
        )
        .await;
    assert_eq!(res.status, 200, "rsvp failed: {}", res.text);
    assert_eq!(res.body["coming"], true);
    assert_eq!(res.body["plus_one"], true);

    let res = app
        .post_with_token(&routes::rsvps(id, meetup_id), &json!({"coming": false}), &bob.token)
        .await;
    assert_eq!(res.status, 200);

    let res = app.get_without_token(&routes::rsvps(id, meetup_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["coming"], 2);
    assert_eq!(res.body["not_coming"], 1);
    let going = res.body["going"].as_array().unwrap();
    assert_eq!(going.len(), 1);
    assert_eq!(going[0]["username"], "alice");
    assert_eq!(going[0]["plus_one"], true);
}

#[tokio::test]
async fn answering_again_replaces_the_answer() {
    let app = TestApp::spawn().await;
    let admin = app.create_superuser("admin").await;
    let alice = app.create_user("alice").await;
    let id = app.create_location(&admin.token, "berlin").await;
    let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;
    app.add_location_member(id, alice.id, &admin.token).await;

    app.post_with_token(&routes::rsvps(id, meetup_id), &json!({"coming": true}), &alice.token)
        .await;
    let res = app
        .post_with_token(
            &routes::rsvps(id, meetup_id),
            &json!({"coming": false, "plus_one": true}),
            &alice.token,
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["coming"], false);
    assert_eq!(res.body["plus_one"], false, "a guest needs a host who is coming");

    let res = app.get_without_token(&routes::rsvps(id, meetup_id)).await;
    assert_eq!(res.body["coming"], 0);
    assert_eq!(res.body["not_coming"], 1);
    assert!(res.body["going"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn outsider_cannot_rsvp() {
    let app = TestApp::spawn().await;
    let admin = app.create_superuser("admin").await;
    let alice = app.create_user("alice").await;
    let id = app.create_location(&admin.token, "berlin").await;
    let meetup_id = app.create_meetup(id, "launch", &admin.token, &admin.token).await;

    let res = app
        .post_with_token(&routes::rsvps(id, meetup_id), &json!({"coming": true}), &alice.token)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    let res = app.get_without_token(&routes::rsvps(id, meetup_id)).await;
    assert_eq!(res.body["coming"], 0);
}

#[tokio::test]
async fn meetup_of_another_location_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.create_superuser("admin").await;
    let berlin = app.create_location(&admin.token, "berlin").await;
    let paris = app.create_location(&admin.token, "paris").await;
    let meetup_id = app.create_meetup(berlin, "launch", &admin.token, &admin.token).await;

    let res = app
        .post_with_token(&routes::rsvps(paris, meetup_id), &json!({"coming": true}), &admin.token)
        .await;
    assert_eq!(res.status, 404);

    let res = app.get_without_token(&routes::rsvps(paris, meetup_id)).await;
    assert_eq!(res.status, 404);
}
