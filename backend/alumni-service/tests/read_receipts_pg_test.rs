//! Read receipts and repositories on a real Postgres.
//!
//! Run with `cargo test -- --ignored` on a host with Docker.

mod common;

use alumni_service::{
    config::Config,
    error::AppError,
    models::{NewUser, UserRole},
    repository::Repositories,
    state::AppState,
    websocket::ConnectionRegistry,
};
use serial_test::serial;

async fn new_user(repos: &Repositories, username: &str) -> i64 {
    repos
        .users
        .create(NewUser {
            username: username.to_string(),
            name: username.to_string(),
            email: format!("{}@campus.edu", username),
            password_hash: "hash".to_string(),
            role: UserRole::Alumni,
        })
        .await
        .expect("create user")
        .id
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn unread_counts_follow_acknowledgments() {
    let (_pg, pool) = common::start_postgres().await;
    let repos = Repositories::postgres(pool.clone());
    let state = AppState::new(
        Config::in_memory(),
        repos.clone(),
        Some(pool),
        ConnectionRegistry::new(),
    );

    let alice = new_user(&repos, "alice").await;
    let bob = new_user(&repos, "bob").await;
    let chat = state.chats.open_chat(alice, bob).await.expect("open chat");

    let mut ids = Vec::new();
    for (i, sender) in [alice, alice, bob, alice, alice].into_iter().enumerate() {
        let message = repos
            .chats
            .create_message(chat.id, sender, &format!("message {}", i))
            .await
            .expect("create message");
        ids.push(message.id);
    }

    let tracker = &state.read_receipts;
    assert_eq!(tracker.get_unread_count(chat.id, bob).await.unwrap(), 4);
    assert_eq!(tracker.get_unread_count(chat.id, alice).await.unwrap(), 1);

    let mark = tracker.acknowledge(chat.id, bob, ids[2]).await.unwrap();
    assert_eq!(mark.last_acknowledged_message_id, Some(ids[2]));
    assert_eq!(tracker.get_unread_count(chat.id, bob).await.unwrap(), 2);

    // Stale acknowledgment keeps the stored mark.
    let mark = tracker.acknowledge(chat.id, bob, ids[0]).await.unwrap();
    assert_eq!(mark.last_acknowledged_message_id, Some(ids[2]));

    let counts = tracker.get_unread_counts(bob).await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].conversation_id, chat.id);
    assert_eq!(counts[0].unread_count, 2);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn concurrent_acknowledgments_keep_the_highest() {
    let (_pg, pool) = common::start_postgres().await;
    let repos = Repositories::postgres(pool.clone());
    let state = AppState::new(
        Config::in_memory(),
        repos.clone(),
        Some(pool),
        ConnectionRegistry::new(),
    );

    let carol = new_user(&repos, "carol").await;
    let dave = new_user(&repos, "dave").await;
    let chat = state.chats.open_chat(carol, dave).await.expect("open chat");

    let mut handles = Vec::new();
    for message_id in 1..=40_i64 {
        let tracker = state.read_receipts.clone();
        let chat_id = chat.id;
        handles.push(tokio::spawn(async move {
            tracker.acknowledge(chat_id, dave, message_id).await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("acknowledge");
    }

    let mark = state.read_receipts.get_mark(chat.id, dave).await.unwrap();
    assert_eq!(mark.last_acknowledged_message_id, Some(40));
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn duplicate_email_maps_to_conflict() {
    let (_pg, pool) = common::start_postgres().await;
    let repos = Repositories::postgres(pool);

    let first = NewUser {
        username: "erin".to_string(),
        name: "Erin".to_string(),
        email: "erin@campus.edu".to_string(),
        password_hash: "hash".to_string(),
        role: UserRole::Student,
    };
    repos.users.create(first.clone()).await.expect("create user");

    let err = repos
        .users
        .create(NewUser {
            username: "erin2".to_string(),
            ..first
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
    assert_eq!(err.to_string(), "Email already exists");
}
