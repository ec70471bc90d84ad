//! Live server tests.
//!
//! Expects a server on localhost:8080 with an `admin`/`admin` bootstrap superuser
//! (`LOCALLIBRARY__AUTH__ADMIN_USERNAME` / `LOCALLIBRARY__AUTH__ADMIN_PASSWORD`).

use chrono::{Duration, Utc};
use reqwest::{header, redirect, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Helper to get a superuser token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn unique_isbn() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default().unsigned_abs();
    format!("{:013}", nanos % 10_000_000_000_000)
}

/// Create an author and return its id
async fn create_author(client: &Client, token: &str, last_name: &str) -> i64 {
    let response = client
        .post(format!("{}/catalog/author/create/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "first_name": "Test",
            "last_name": last_name,
            "date_of_birth": "1920-01-02"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let url = location(&response);
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("author id in redirect")
}

/// Create a book and return its id
async fn create_book(client: &Client, token: &str, author_id: i64) -> i64 {
    let response = client
        .post(format!("{}/catalog/book/create/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Integration Test Book",
            "summary": "Created by the live test suite",
            "isbn": unique_isbn(),
            "author_id": author_id,
            "genre_ids": []
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("book id in redirect")
}

/// Ids of every copy on every page of the caller's borrowed list
async fn borrowed_copy_ids(client: &Client, token: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut page = 1;

    loop {
        let body: Value = client
            .get(format!("{}/catalog/mybooks/?page={}", BASE_URL, page))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");

        for copy in body["bookinstance_list"].as_array().expect("copy list") {
            ids.push(copy["id"].as_str().expect("copy id").to_string());
        }

        if body["page_obj"]["has_next"] != true {
            return ids;
        }
        page += 1;
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = client();

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
async fn test_login() {
    let client = client();

    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = client();

    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_counts_previous_visits() {
    let client = client();

    let first = client
        .get(format!("{}/catalog/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::OK);

    let cookie = first
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string();
    let body: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(body["num_visits"], 0);
    assert!(body["num_books"].is_i64());

    let second: Value = client
        .get(format!("{}/catalog/", BASE_URL))
        .header(header::COOKIE, cookie)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_book_list_pagination_errors() {
    let client = client();

    for page in ["abc", "0", "100000"] {
        let response = client
            .get(format!("{}/catalog/books/?page={}", BASE_URL, page))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "page={}", page);
    }

    let response = client
        .get(format!("{}/catalog/books/?page=last", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_author_form_errors_are_redisplayed() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/catalog/author/create/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "",
            "last_name": "Nobody",
            "date_of_birth": "not-a-date"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["first_name"].is_array());
    assert_eq!(body["errors"]["date_of_birth"][0], "Enter a valid date.");
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = client();
    let token = get_auth_token(&client).await;

    let me: Value = client
        .get(format!("{}/accounts/me/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let user_id = me["id"].as_i64().expect("user id");

    let author_id = create_author(&client, &token, "Lifecycle").await;
    let book_id = create_book(&client, &token, author_id).await;

    // A due date on a copy that is not on loan is rejected
    let response = client
        .post(format!("{}/catalog/book/{}/instances/", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&json!({
            "imprint": "Test Press, 2024",
            "status": "available",
            "due_back": "2030-01-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let today = Utc::now().date_naive();
    let response = client
        .post(format!("{}/catalog/book/{}/instances/", BASE_URL, book_id))
        .bearer_auth(&token)
        .json(&json!({
            "imprint": "Test Press, 2024",
            "status": "on_loan",
            "due_back": (today + Duration::days(3)).to_string(),
            "borrower_id": user_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let instance: Value = response.json().await.expect("Failed to parse response");
    let instance_id = instance["id"].as_str().expect("instance id").to_string();

    // Renewal five weeks out is rejected and leaves the due date alone
    let response = client
        .post(format!("{}/catalog/book/{}/renew/", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": (today + Duration::weeks(5)).to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["errors"]["renewal_date"][0],
        "Invalid date - renewal more than 4 weeks ahead"
    );

    // Three weeks out is accepted
    let renewed = (today + Duration::weeks(3)).to_string();
    let response = client
        .post(format!("{}/catalog/book/{}/renew/", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": renewed }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/mybooks/");

    assert!(borrowed_copy_ids(&client, &token).await.contains(&instance_id));

    // Deleting a book that still has copies conflicts
    let response = client
        .post(format!("{}/catalog/book/{}/delete/", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Return sends us back to the book
    let response = client
        .post(format!("{}/catalog/books/{}/return/", BASE_URL, instance_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/catalog/book/{}", book_id));

    let detail: Value = client
        .get(format!("{}/catalog/book/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let copy = &detail["book_instances"][0];
    assert_eq!(copy["status"], "available");
    assert_eq!(copy["is_available"], true);
    assert_eq!(copy["due_back"], renewed);

    // Returned copies leave the borrower's list
    assert!(!borrowed_copy_ids(&client, &token).await.contains(&instance_id));

    // Renewing a copy that is back on the shelf is refused
    let response = client
        .post(format!("{}/catalog/book/{}/renew/", BASE_URL, instance_id))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": today.to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_author_delete_keeps_books() {
    let client = client();
    let token = get_auth_token(&client).await;

    let author_id = create_author(&client, &token, "Ephemeral").await;
    let book_id = create_book(&client, &token, author_id).await;

    let response = client
        .post(format!("{}/catalog/author/{}/delete/", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/authors/");

    let response = client
        .get(format!("{}/catalog/author/{}/", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let detail: Value = client
        .get(format!("{}/catalog/book/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(detail["book"]["author"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_return_of_unknown_copy_goes_to_book_list() {
    let client = client();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!(
            "{}/catalog/books/00000000-0000-4000-8000-000000000000/return/",
            BASE_URL
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/books/");
}

#[tokio::test]
#[ignore]
async fn test_author_list_last_page_holds_the_remainder() {
    let client = client();
    let token = get_auth_token(&client).await;

    for n in 0..13 {
        create_author(&client, &token, &format!("Paged{:02}", n)).await;
    }

    let response = client
        .get(format!("{}/catalog/authors/?page=last", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    let page = &body["page_obj"];
    let count = page["count"].as_i64().expect("count");
    let per_page = page["per_page"].as_i64().expect("per_page");
    let num_pages = page["num_pages"].as_i64().expect("num_pages");

    assert!(count >= 13);
    assert_eq!(per_page, 10);
    assert_eq!(num_pages, (count + per_page - 1) / per_page);
    assert_eq!(page["number"], num_pages);
    assert_eq!(body["is_paginated"], true);

    let remainder = count - (num_pages - 1) * per_page;
    let author_list = body["author_list"].as_array().expect("author list");
    assert_eq!(author_list.len() as i64, remainder);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_isbn_is_a_field_error() {
    let client = client();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token, "Racer").await;
    let isbn = unique_isbn();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..20 {
        let client = client.clone();
        let token = token.clone();
        let isbn = isbn.clone();
        tasks.spawn(async move {
            client
                .post(format!("{}/catalog/book/create/", BASE_URL))
                .bearer_auth(token)
                .json(&json!({
                    "title": "Raced Book",
                    "summary": "Submitted twenty times at once",
                    "isbn": isbn,
                    "author_id": author_id,
                    "genre_ids": []
                }))
                .send()
                .await
                .expect("Failed to send request")
        });
    }

    let mut created = 0;
    while let Some(result) = tasks.join_next().await {
        let response = result.expect("request task");
        match response.status() {
            StatusCode::SEE_OTHER => created += 1,
            StatusCode::OK => {
                let body: Value = response.json().await.expect("Failed to parse response");
                assert_eq!(body["errors"]["isbn"][0], "Book with this ISBN already exists.");
            }
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
}
