mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn messages_reach_the_receiver() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;

    let sent = app
        .post_json(
            "/send_message",
            Some(&alice),
            json!({ "receiver_id": bob_id, "message": "hi bob" }),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.body["sender_id"], alice_id);

    let page = app.get("/chat", Some(&bob)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["chats"][0]["message"], "hi bob");
    let users = page.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], alice_id);
}

#[tokio::test]
async fn message_to_missing_user_is_rejected() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup("alice").await;

    let resp = app
        .post_json(
            "/send_message",
            Some(&alice),
            json!({ "receiver_id": 4242, "message": "anyone?" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let empty = app
        .post_json(
            "/send_message",
            Some(&alice),
            json!({ "receiver_id": 1, "message": "  " }),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let page = app.get("/chat", Some(&alice)).await;
    assert!(page.body["chats"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn friend_request_creates_notification() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;

    let resp = app
        .post_empty(&format!("/send_friend_request/{bob_id}"), &alice)
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let missing = app.post_empty("/send_friend_request/999", &alice).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let own = app
        .post_empty(&format!("/send_friend_request/{alice_id}"), &alice)
        .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        own.body["message"],
        "You cannot send a friend request to yourself."
    );

    let notes = app.get("/notifications", Some(&bob)).await;
    let entries = notes.body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["notification"]["content"],
        "alice sent you a friend request."
    );
    assert_eq!(entries[0]["notification"]["notification_type"], "friend_request");
    assert!(entries[0]["post"].is_null());
}

#[tokio::test]
async fn find_friend_searches_usernames() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup("alice").await;
    app.signup("malik").await;
    app.signup("bob").await;

    let resp = app.get("/find_friend?search=li", Some(&alice)).await;
    let names: Vec<&str> = resp.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "malik"]);

    let resp = app.get("/find_friend", Some(&alice)).await;
    assert!(resp.body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_edit_is_owner_only() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;
    app.create_post(&alice, "alice's post").await;

    let own = app.get(&format!("/profile/{alice_id}"), Some(&alice)).await;
    assert_eq!(own.body["can_edit"], true);
    assert_eq!(own.body["posts"].as_array().unwrap().len(), 1);

    let other = app.get(&format!("/profile/{alice_id}"), Some(&bob)).await;
    assert_eq!(other.body["can_edit"], false);

    let missing = app.get("/profile/999", Some(&bob)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let forbidden = app
        .post_json(
            &format!("/edit_profile/{alice_id}"),
            Some(&bob),
            json!({ "username": "mallory", "email": "mallory@x.com" }),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let taken = app
        .post_json(
            &format!("/edit_profile/{bob_id}"),
            Some(&bob),
            json!({ "username": "bobby", "email": "alice@x.com" }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let ok = app
        .post_json(
            &format!("/edit_profile/{bob_id}"),
            Some(&bob),
            json!({ "username": "bobby", "email": "bobby@x.com" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["username"], "bobby");

    let unchanged = app.get(&format!("/profile/{alice_id}"), Some(&alice)).await;
    assert_eq!(unchanged.body["user"]["username"], "alice");
}

#[tokio::test]
async fn settings_update_bio_and_picture() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup("alice").await;

    let resp = app
        .post_multipart(
            "/settings",
            &alice,
            &[("bio", "hello there")],
            Some(("profile_pic", "me.jpg", &b"jpeg-bytes"[..])),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["bio"], "hello there");
    let pic = resp.body["profile_pic"].as_str().unwrap().to_string();
    assert!(pic.starts_with("profile_pics/"));
    assert!(app.upload_dir.join(&pic).exists());

    // bio only: picture is kept
    let resp = app
        .post_multipart("/settings", &alice, &[("bio", "updated")], None)
        .await;
    assert_eq!(resp.body["profile_pic"], pic.as_str());

    let current = app.get("/settings", Some(&alice)).await;
    assert_eq!(current.body["bio"], "updated");

    let too_long = "x".repeat(201);
    let resp = app
        .post_multipart("/settings", &alice, &[("bio", too_long.as_str())], None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_settings_write_removes_the_picture() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup("alice").await;
    app.exec_sql(
        "CREATE TRIGGER reject_user_updates BEFORE UPDATE ON users
         BEGIN SELECT RAISE(ABORT, 'users are read-only'); END;",
    );

    let resp = app
        .post_multipart(
            "/settings",
            &alice,
            &[("bio", "new bio")],
            Some(("profile_pic", "me.png", &b"png-bytes"[..])),
        )
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.stored_files().is_empty(), "{:?}", app.stored_files());
}
