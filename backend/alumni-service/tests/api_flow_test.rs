//! HTTP flows against the in-memory store.

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use alumni_service::{config::Config, routes, state::AppState, websocket::Topic};

macro_rules! init_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(Config::in_memory())))
                .configure(routes::configure),
        )
        .await
    };
}

macro_rules! create_user {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({
                "username": $username,
                "name": $username,
                "email": format!("{}@campus.edu", $username),
                "password": "correct-horse-battery",
                "role": "ALUMNI"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["id"].as_i64().expect("created user id")
    }};
}

#[actix_web::test]
async fn read_receipts_track_unread_messages() {
    let app = init_app!();
    let alice = create_user!(app, "alice");
    let bob = create_user!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/chats")
        .set_json(json!({ "user1Id": alice, "user2Id": bob }))
        .to_request();
    let chat: Value = test::call_and_read_body_json(&app, req).await;
    let chat_id = chat["id"].as_i64().unwrap();

    let mut message_ids = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/chats/{}/messages", chat_id))
            .set_json(json!({ "senderId": alice, "content": format!("message {}", i) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let message: Value = test::read_body_json(resp).await;
        message_ids.push(message["id"].as_i64().unwrap());
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/chats/{}/last-read/{}", chat_id, bob))
        .to_request();
    let mark: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mark["lastReadMessageId"], Value::Null);

    let req = test::TestRequest::get()
        .uri(&format!("/api/chats/{}/unread-count/{}", chat_id, bob))
        .to_request();
    let unread: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unread["unreadCount"], 5);

    let req = test::TestRequest::post()
        .uri(&format!("/api/chats/{}/read", chat_id))
        .set_json(json!({ "userId": bob, "lastReadMessageId": message_ids[2] }))
        .to_request();
    let ack: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ack["lastReadMessageId"], message_ids[2]);

    // An older acknowledgment arriving late does not move the mark back.
    let req = test::TestRequest::post()
        .uri(&format!("/api/chats/{}/read", chat_id))
        .set_json(json!({ "userId": bob, "lastReadMessageId": message_ids[0] }))
        .to_request();
    let ack: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ack["lastReadMessageId"], message_ids[2]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/chats/unread-counts/{}", bob))
        .to_request();
    let counts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        counts,
        json!([{ "chatId": chat_id, "userId": bob, "unreadCount": 2 }])
    );

    // The sender's own messages never count as unread for them.
    let req = test::TestRequest::get()
        .uri(&format!("/api/chats/{}/unread-count/{}", chat_id, alice))
        .to_request();
    let unread: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unread["unreadCount"], 0);
}

#[actix_web::test]
async fn read_acknowledgment_requires_fields() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/chats/1/read")
        .set_json(json!({ "userId": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/chats/1/read")
        .set_json(json!({ "userId": 1, "lastReadMessageId": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn duplicate_username_is_conflict() {
    let app = init_app!();
    create_user!(app, "carol");

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "carol",
            "name": "Carol Again",
            "email": "other@campus.edu",
            "password": "correct-horse-battery"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");
    assert_eq!(body["message"], "Username already exists");
}

#[actix_web::test]
async fn created_user_hides_password() {
    let app = init_app!();
    let id = create_user!(app, "dana");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/profile", id))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["username"], "dana");
    assert_eq!(profile["profileCompleted"], false);
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("password").is_none());
}

#[actix_web::test]
async fn connection_request_lifecycle() {
    let app = init_app!();
    let erin = create_user!(app, "erin");
    let frank = create_user!(app, "frank");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/connect", frank))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/connect", frank))
        .insert_header(("X-User-Id", "not-a-number"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/connect", frank))
        .insert_header(("X-User-Id", erin.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/connect", frank))
        .insert_header(("X-User-Id", erin.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/connection-requests", frank))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    let connection_id = pending[0]["id"].as_i64().unwrap();

    // Only the receiver may answer.
    let req = test::TestRequest::post()
        .uri(&format!("/api/connections/{}/accept", connection_id))
        .insert_header(("X-User-Id", erin.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/connections/{}/accept", connection_id))
        .insert_header(("X-User-Id", frank.to_string()))
        .to_request();
    let accepted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted["status"], "ACCEPTED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/connections", erin))
        .to_request();
    let connections: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(connections.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn job_post_like_and_search() {
    let app = init_app!();
    let gina = create_user!(app, "gina");
    let hank = create_user!(app, "hank");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "username": "gina", "description": "Hiring a Rust intern" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["message"], "Post created successfully");
    let post_id = created["postId"].as_i64().unwrap();

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{}/like?userId={}", post_id, hank))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/api/posts/search?keyword=rust")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["posts"][0]["likeCount"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}?userId={}", post_id, hank))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}?userId={}", post_id, gina))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn group_messages_are_member_only() {
    let app = init_app!();
    let ivy = create_user!(app, "ivy");
    let jack = create_user!(app, "jack");
    let kim = create_user!(app, "kim");

    let req = test::TestRequest::post()
        .uri("/api/group-chats")
        .set_json(json!({
            "name": "Class of 2019",
            "ownerId": ivy,
            "participants": [
                { "userId": ivy, "username": "ivy" },
                { "userId": jack, "username": "jack" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group: Value = test::read_body_json(resp).await;
    let group_id = group["groupId"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/groups/{}/messages", group_id))
        .set_json(json!({ "userId": kim, "content": "let me in" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/groups/{}/messages", group_id))
        .set_json(json!({ "userId": jack, "content": "reunion on friday" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/groups/{}/messages?userId={}", group_id, ivy))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["content"][0]["senderUsername"], "jack");
}

#[actix_web::test]
async fn unknown_routes_and_health() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/api/users/999/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn websocket_subscription_is_checked_before_upgrade() {
    let app = init_app!();
    let lena = create_user!(app, "lena");

    let req = test::TestRequest::get()
        .uri(&format!("/ws?topic=room:1&userId={}", lena))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/ws?topic=chat:42&userId={}", lena))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn failed_websocket_handshake_leaves_no_subscriber() {
    let state = AppState::in_memory(Config::in_memory());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure),
    )
    .await;
    let alice = create_user!(app, "alice");
    let bob = create_user!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/chats")
        .set_json(json!({ "user1Id": alice, "user2Id": bob }))
        .to_request();
    let chat: Value = test::call_and_read_body_json(&app, req).await;
    let chat_id = chat["id"].as_i64().unwrap();

    // Authorised but missing the upgrade headers.
    let req = test::TestRequest::get()
        .uri(&format!("/ws?topic=chat:{}&userId={}", chat_id, alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(state.registry.subscriber_count(Topic::Chat(chat_id)).await, 0);
}
