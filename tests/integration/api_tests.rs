//! API integration tests
//!
//! Each test builds the full router over a fresh in-memory database seeded
//! with the default accounts and sample books.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use libris_server::{api, config::AppConfig, AppState};

async fn app() -> Router {
    let state = AppState::build(AppConfig::in_memory())
        .await
        .expect("Failed to build application state");
    api::create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, bytes.to_vec())
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, value)
}

/// Helper to log in as one of the seeded accounts
async fn get_auth_token(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send_json(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role"], "Administrator");
    assert_eq!(body["full_name"], "System Administrator");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = app().await;

    for (username, password) in [("admin", "wrong"), ("nobody", "admin123")] {
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "InvalidCredentials");
    }
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = app().await;

    let (status, _) = send_json(&app, Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, Method::GET, "/api/v1/books", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_principal() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "staff");
    assert_eq!(body["role"], "LibraryStaff");
}

#[tokio::test]
async fn test_register_student_and_duplicate() {
    let app = app().await;
    let request = json!({
        "username": "alice",
        "password": "secret1",
        "password_confirmation": "secret1",
        "full_name": "Alice Martin",
        "email": "alice@example.org"
    });

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "Student");
    assert!(body.get("password_hash").is_none());

    let token = get_auth_token(&app, "alice", "secret1").await;
    assert!(!token.is_empty());

    let (status, body) = send_json(&app, Method::POST, "/api/v1/auth/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "DuplicateKey");
}

#[tokio::test]
async fn test_register_staff_requires_admin() {
    let app = app().await;
    let request = json!({
        "username": "bob",
        "password": "secret1",
        "password_confirmation": "secret1",
        "full_name": "Bob Keeper",
        "role": "LibraryStaff"
    });

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = get_auth_token(&app, "admin", "admin123").await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        Some(&admin),
        Some(request),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "LibraryStaff");
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "carol",
            "password": "secret1",
            "password_confirmation": "secret2",
            "full_name": "Carol"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationFailed");
}

#[tokio::test]
async fn test_list_users_is_admin_only() {
    let app = app().await;

    let staff = get_auth_token(&app, "staff", "staff123").await;
    let (status, _) = send_json(&app, Method::GET, "/api/v1/users", Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = get_auth_token(&app, "admin", "admin123").await;
    let (status, body) = send_json(&app, Method::GET, "/api/v1/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_list_and_search_books() {
    let app = app().await;
    let token = get_auth_token(&app, "student", "student123").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|b| b["book_id"].as_str())
        .collect();
    assert_eq!(ids, ["B001", "B002", "B003"]);

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/v1/books?field=author&q=jane",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["book_id"], "B002");

    let (status, body) = send_json(&app, Method::GET, "/api/v1/books/B003", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], 7);

    let (status, body) = send_json(&app, Method::GET, "/api/v1/books/B999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NotFound");
}

#[tokio::test]
async fn test_student_cannot_add_book() {
    let app = app().await;
    let token = get_auth_token(&app, "student", "student123").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(&token),
        Some(json!({
            "book_id": "B004",
            "title": "Rust in Action",
            "author": "Tim McNamara",
            "category": "Programming",
            "quantity": 2,
            "available": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "Forbidden");
}

#[tokio::test]
async fn test_staff_adds_book() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;
    let request = json!({
        "book_id": "B004",
        "title": "Rust in Action",
        "author": "Tim McNamara",
        "isbn": "",
        "category": "Programming",
        "quantity": 2,
        "available": 0
    });

    let (status, body) = send_json(&app, Method::POST, "/api/v1/books", Some(&token), Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "OutOfStock");
    assert!(body["isbn"].is_null());

    let (status, _) = send_json(&app, Method::POST, "/api/v1/books", Some(&token), Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(&token),
        Some(json!({
            "book_id": "B005",
            "title": "Too Many",
            "author": "Someone",
            "category": "Misc",
            "quantity": 1,
            "available": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;

    let (status, loan) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({
            "book_id": "B002",
            "borrower_name": "Alice",
            "borrower_id": "STU001",
            "borrow_date": "2024-01-01",
            "due_date": "2024-01-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "Borrowed");
    assert_eq!(loan["title"], "Data Science Handbook");

    let (_, book) = send_json(&app, Method::GET, "/api/v1/books/B002", Some(&token), None).await;
    assert_eq!(book["available"], 2);

    let (status, borrowers) = send_json(&app, Method::GET, "/api/v1/loans/borrowers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(borrowers, json!(["STU001"]));

    let (status, overdue) = send_json(
        &app,
        Method::GET,
        "/api/v1/loans/overdue?as_of=2024-01-20",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overdue.as_array().map(Vec::len), Some(1));

    let (status, overdue) = send_json(
        &app,
        Method::GET,
        "/api/v1/loans/overdue?as_of=2024-01-15",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overdue.as_array().map(Vec::len), Some(0));

    let (status, closed) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans/return",
        Some(&token),
        Some(json!({ "book_id": "B002", "borrower_id": "STU001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["id"], loan["id"]);
    assert_eq!(closed["status"], "Returned");

    let (_, book) = send_json(&app, Method::GET, "/api/v1/books/B002", Some(&token), None).await;
    assert_eq!(book["available"], 3);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans/return",
        Some(&token),
        Some(json!({ "book_id": "B002", "borrower_id": "STU001" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "PreconditionFailed");

    let (status, ledger) = send_json(
        &app,
        Method::GET,
        "/api/v1/loans?status=Returned",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_borrow_out_of_stock() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;

    for i in 0..3 {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/loans",
            Some(&token),
            Some(json!({
                "book_id": "B002",
                "borrower_name": format!("Reader {}", i),
                "borrower_id": format!("STU00{}", i),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, book) = send_json(&app, Method::GET, "/api/v1/books/B002", Some(&token), None).await;
    assert_eq!(book["available"], 0);
    assert_eq!(book["status"], "OutOfStock");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({
            "book_id": "B002",
            "borrower_name": "Late Reader",
            "borrower_id": "STU999",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "PreconditionFailed");

    let (_, ledger) = send_json(&app, Method::GET, "/api/v1/loans", Some(&token), None).await;
    assert_eq!(ledger.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_student_cannot_borrow() {
    let app = app().await;
    let token = get_auth_token(&app, "student", "student123").await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({
            "book_id": "B001",
            "borrower_name": "Student User",
            "borrower_id": "STU001",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_export_csv() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;

    let request = Request::builder()
        .uri("/api/v1/books/export")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("library_inventory.csv"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body");
    let csv = String::from_utf8(bytes.to_vec()).expect("utf-8");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("book_id,title,author,isbn,category,quantity,available,status")
    );
    assert_eq!(lines.count(), 3);

    let student = get_auth_token(&app, "student", "student123").await;
    let (status, _) = send(&app, Method::GET, "/api/v1/books/export", Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard() {
    let app = app().await;
    let token = get_auth_token(&app, "student", "student123").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_books"], 3);
    assert_eq!(body["total_copies"], 15);
    assert_eq!(body["available_copies"], 15);
    assert_eq!(body["borrowed_copies"], 0);
    assert_eq!(body["active_loans"], 0);
    assert_eq!(body["by_category"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_responses_are_gzip_encoded_on_request() {
    let app = app().await;
    let token = get_auth_token(&app, "student", "student123").await;

    let request = Request::builder()
        .uri("/api/v1/books")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok()),
        Some("gzip")
    );

    let (status, body) = send_json(&app, Method::GET, "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_borrow_with_out_of_range_date_is_rejected() {
    let app = app().await;
    let token = get_auth_token(&app, "staff", "staff123").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&token),
        Some(json!({
            "book_id": "B001",
            "borrower_name": "Alice",
            "borrower_id": "STU001",
            "borrow_date": "+262142-12-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationFailed");

    let (_, book) = send_json(&app, Method::GET, "/api/v1/books/B001", Some(&token), None).await;
    assert_eq!(book["available"], 5);
}
