//! API integration tests
//!
//! These run against a live stack: the server on localhost:8003 with its
//! database, plus the Identity Directory and Item Catalog services. Seed
//! data is expected to contain user 1 and item 1 with available copies.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8003/api/v1";

async fn create_loan(client: &Client, user_id: i32, item_id: i32) -> Value {
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "item_id": item_id
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse loan response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    // The live stack has its database up, so readiness must hold.
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();

    let loan = create_loan(&client, 1, 1).await;
    assert_eq!(loan["status"], "ACTIVE");
    assert_eq!(loan["extension_count"], 0);
    let loan_id = loan["id"].as_i64().expect("No loan id");

    // Extend
    let response = client
        .post(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send extend request");
    assert!(response.status().is_success());
    let extended: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(extended["extension_count"], 1);

    // Return
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["loan"]["status"], "RETURNED");

    // Second return is rejected
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_active_loan_conflict() {
    let client = Client::new();

    let loan = create_loan(&client, 1, 2).await;
    let loan_id = loan["id"].as_i64().expect("No loan id");

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "user_id": 1,
            "item_id": 2
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["kind"], "conflict");

    // Clean up
    client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to clean up loan");
}

#[tokio::test]
#[ignore]
async fn test_create_loan_unknown_user() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "user_id": 999999,
            "item_id": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_loan_invalid_body() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "user_id": 0,
            "item_id": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_get_missing_loan() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_list_loans_pagination() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans?page=1&per_page=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_overdue_listing() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let loans = body.as_array().expect("Expected an array");
    assert!(loans.iter().all(|l| l["status"] == "OVERDUE"));
}

#[tokio::test]
#[ignore]
async fn test_user_loans() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users/1/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let loans = body.as_array().expect("Expected an array");
    assert!(loans.iter().all(|l| l["user"]["id"] == 1));
}
