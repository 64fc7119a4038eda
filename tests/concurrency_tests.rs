//! Concurrent borrowing stress tests.
//!
//! Require a running server and a migrated database.
//! Run with: cargo test -- --ignored

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Barrier;

use biblius_server::models::user::{Role, UserClaims};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

fn token_for(user_id: i32, role: Role) -> String {
    let now = Utc::now();
    UserClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(&jwt_secret())
    .expect("Failed to create token")
}

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn create_user(client: &Client, admin_token: &str) -> i32 {
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "name": "Concurrent Reader",
            "email": format!("concurrent-{}@example.com", unique_suffix()),
            "role": "user"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No user ID") as i32
}

async fn create_book(client: &Client, admin_token: &str, copies: i32) -> i32 {
    let isbn = format!("978{:010}", unique_suffix() % 10_000_000_000);
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "Contended Book",
            "author": "A. Author",
            "isbn": isbn,
            "category": "fiction",
            "published_year": 2020,
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID") as i32
}

async fn available_copies(client: &Client, token: &str, book_id: i32) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    body["available_copies"].as_i64().expect("No available_copies")
}

#[tokio::test]
#[ignore]
async fn concurrent_borrows_of_last_copy_allow_exactly_one_success() {
    const BORROWERS: usize = 8;

    let client = Client::new();
    let admin = token_for(0, Role::Admin);

    let mut users = Vec::with_capacity(BORROWERS);
    for _ in 0..BORROWERS {
        users.push(create_user(&client, &admin).await);
    }
    let book = create_book(&client, &admin, 1).await;

    let barrier = Arc::new(Barrier::new(BORROWERS));
    let due_date = (Utc::now() + Duration::days(7)).date_naive();

    let mut handles = Vec::with_capacity(BORROWERS);
    for user_id in users {
        let client = client.clone();
        let admin = admin.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let response = client
                .post(format!("{}/loans", BASE_URL))
                .header("Authorization", format!("Bearer {}", admin))
                .json(&json!({
                    "user_id": user_id,
                    "book_id": book,
                    "due_date": due_date
                }))
                .send()
                .await
                .expect("Failed to send request");
            response.status().as_u16()
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.expect("Task panicked") {
            201 => successes += 1,
            400 => rejections += 1,
            other => panic!("Unexpected status {}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rejections, BORROWERS - 1);
    assert_eq!(available_copies(&client, &admin, book).await, 0);
}

#[tokio::test]
#[ignore]
async fn concurrent_duplicate_borrows_create_one_loan() {
    const ATTEMPTS: usize = 6;

    let client = Client::new();
    let admin = token_for(0, Role::Admin);

    let user = create_user(&client, &admin).await;
    let book = create_book(&client, &admin, ATTEMPTS as i32).await;

    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let due_date = (Utc::now() + Duration::days(7)).date_naive();

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let client = client.clone();
        let admin = admin.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let response = client
                .post(format!("{}/loans", BASE_URL))
                .header("Authorization", format!("Bearer {}", admin))
                .json(&json!({
                    "user_id": user,
                    "book_id": book,
                    "due_date": due_date
                }))
                .send()
                .await
                .expect("Failed to send request");
            response.status().as_u16()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("Task panicked") == 201 {
            successes += 1;
        }
    }

    // One open loan per (user, book), no matter how the requests interleave
    assert_eq!(successes, 1);
    assert_eq!(
        available_copies(&client, &admin, book).await,
        ATTEMPTS as i64 - 1
    );
}

#[tokio::test]
#[ignore]
async fn concurrent_returns_increment_inventory_once() {
    const ATTEMPTS: usize = 6;

    let client = Client::new();
    let admin = token_for(0, Role::Admin);

    let user = create_user(&client, &admin).await;
    let book = create_book(&client, &admin, 1).await;

    let due_date = (Utc::now() + Duration::days(7)).date_naive();
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "user_id": user, "book_id": book, "due_date": due_date }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().unwrap();

    let barrier = Arc::new(Barrier::new(ATTEMPTS));

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let client = client.clone();
        let admin = admin.clone();
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let response = client
                .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
                .header("Authorization", format!("Bearer {}", admin))
                .send()
                .await
                .expect("Failed to send request");
            response.status().as_u16()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("Task panicked") == 200 {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(available_copies(&client, &admin, book).await, 1);
}
