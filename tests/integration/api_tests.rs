//! API integration tests
//!
//! Each test serves the full router on an ephemeral port, backed by the
//! in-process store, and talks to it over HTTP.

use library_server::{api, config::AppConfig, repository::Repository, AppState};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

struct TestApp {
    base_url: String,
    client: Client,
}

impl TestApp {
    async fn spawn() -> Self {
        let state = AppState::new(AppConfig::default(), Repository::in_memory());
        let app = api::create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        (status, response.json().await.expect("Failed to parse response"))
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        (status, response.json().await.expect("Failed to parse response"))
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn create_book(&self, title: &str, genre: &str, isbn: &str, copies: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/books",
                &json!({
                    "title": title,
                    "author": "Frank Herbert",
                    "genre": genre,
                    "isbn": isbn,
                    "description": "A novel",
                    "copies": copies
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    async fn borrow(&self, book_id: &str, quantity: Value, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/borrow-summary",
            &json!({
                "book": book_id,
                "quantity": quantity,
                "borrowDate": "2025-01-01",
                "dueDate": "2025-01-15",
                "borrowerName": "Ada",
                "borrowerEmail": email
            }),
        )
        .await
    }
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("Library Management API is running"));
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");

    let (status, _) = app.get("/api/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_get_book() {
    let app = TestApp::spawn().await;

    let created = app.create_book("Dune", "FICTION", "978-0441013593", 3).await;
    assert_eq!(created["available"], true);
    assert_eq!(created["copies"], 3);
    assert!(created["createdAt"].is_string());

    let id = created["id"].as_str().expect("No id");
    let (status, body) = app.get(&format!("/api/books/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book retrieved successfully");
    assert_eq!(body["data"], created);
}

#[tokio::test]
async fn test_create_book_validation() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/books",
            &json!({ "title": "Dune", "genre": "FICTION", "copies": -1 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["error"]["name"], "ValidationError");
    let errors = &body["error"]["errors"];
    assert!(errors["author"].is_object());
    assert!(errors["isbn"].is_object());
    assert!(errors["copies"].is_object());

    app.create_book("Dune", "FICTION", "42", 1).await;
    let (status, body) = app
        .post(
            "/api/books",
            &json!({
                "title": "Other",
                "author": "Someone",
                "genre": "SCIENCE",
                "isbn": "42",
                "copies": 1
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["errors"]["isbn"]["kind"], "unique");
}

#[tokio::test]
async fn test_list_books_filter_sort_limit() {
    let app = TestApp::spawn().await;

    app.create_book("A", "FICTION", "1", 5).await;
    app.create_book("B", "HISTORY", "2", 1).await;
    app.create_book("C", "FICTION", "3", 2).await;

    let (status, body) = app.get("/api/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Books retrieved successfully");
    let titles: Vec<&str> = body["data"]
        .as_array()
        .expect("data is not a list")
        .iter()
        .filter_map(|b| b["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["C", "B", "A"]);

    let (_, body) = app
        .get("/api/books?filter=FICTION&sortBy=copies&sort=asc")
        .await;
    let copies: Vec<i64> = body["data"]
        .as_array()
        .expect("data is not a list")
        .iter()
        .filter_map(|b| b["copies"].as_i64())
        .collect();
    assert_eq!(copies, vec![2, 5]);

    let (_, body) = app.get("/api/books?limit=1").await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = app.get("/api/books?filter=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

    let (status, body) = app.get("/api/books?limit=many").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_and_delete_book() {
    let app = TestApp::spawn().await;

    let book = app.create_book("Dune", "FICTION", "1", 2).await;
    let path = format!("/api/books/{}", book["id"].as_str().expect("No id"));

    let (status, body) = app
        .send(reqwest::Method::PUT, &path, &json!({ "copies": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book updated successfully");
    assert_eq!(body["data"]["copies"], 0);
    assert_eq!(body["data"]["available"], false);
    assert_eq!(body["data"]["title"], "Dune");

    let (status, body) = app
        .send(reqwest::Method::PUT, &path, &json!({ "copies": -3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["errors"]["copies"].is_object());

    let (status, body) = app.send(reqwest::Method::DELETE, &path, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");
    assert_eq!(body["data"], Value::Null);

    let (status, body) = app.get(&path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Book not found");

    let (status, _) = app.send(reqwest::Method::DELETE, &path, &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/books/not-a-valid-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_borrow_until_unavailable() {
    let app = TestApp::spawn().await;

    let book = app.create_book("Dune", "FICTION", "1", 2).await;
    let id = book["id"].as_str().expect("No id");

    let (status, body) = app.borrow(id, json!(2), "ada@example.com").await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Book borrowed successfully");
    assert_eq!(body["data"]["book"], id);
    assert_eq!(body["data"]["quantity"], 2);
    assert!(body["data"]["borrower"].is_string());

    let (_, body) = app.get(&format!("/api/books/{}", id)).await;
    assert_eq!(body["data"]["copies"], 0);
    assert_eq!(body["data"]["available"], false);

    let (status, body) = app.borrow(id, json!(1), "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot borrow more than available copies");
    assert_eq!(body["error"]["errors"]["copies"]["value"], 0);
}

#[tokio::test]
async fn test_borrow_validation() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/api/borrow-summary", &json!({ "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    let errors = body["error"]["errors"].as_object().expect("errors map");
    for field in ["book", "borrowDate", "dueDate", "borrowerName", "borrowerEmail"] {
        assert!(errors.contains_key(field), "missing {}", field);
    }
    assert!(!errors.contains_key("quantity"));

    let book = app.create_book("Dune", "FICTION", "1", 2).await;
    let id = book["id"].as_str().expect("No id");

    let (status, body) = app.borrow(id, json!(0), "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Negative or zero quantity cannot be borrowed");

    let (status, body) = app.borrow(id, json!("-2"), "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["errors"]["quantity"]["value"], -2);

    let (status, body) = app
        .borrow(&uuid::Uuid::new_v4().to_string(), json!(1), "ada@example.com")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");

    let (_, body) = app.get(&format!("/api/books/{}", id)).await;
    assert_eq!(body["data"]["copies"], 2);
}

#[tokio::test]
async fn test_borrow_blank_or_mistyped_fields_use_validation_envelope() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/api/borrow-summary", &json!({ "quantity": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["error"]["name"], "ValidationError");
    let errors = body["error"]["errors"].as_object().expect("errors map");
    for field in ["book", "quantity", "borrowDate", "dueDate", "borrowerName", "borrowerEmail"] {
        assert_eq!(errors[field]["kind"], "required", "{}", field);
    }

    let book = app.create_book("Dune", "FICTION", "1", 2).await;
    let id = book["id"].as_str().expect("No id");

    let (status, body) = app.borrow(id, json!("abc"), "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["name"], "ValidationError");
    assert_eq!(body["error"]["errors"]["quantity"]["kind"], "integer");

    let (status, body) = app.borrow(id, json!(1.5), "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["errors"]["quantity"]["value"], 1.5);

    let (_, body) = app.get(&format!("/api/books/{}", id)).await;
    assert_eq!(body["data"]["copies"], 2);
}

#[tokio::test]
async fn test_borrow_summary_totals() {
    let app = TestApp::spawn().await;

    let first = app.create_book("Dune", "FICTION", "1", 10).await;
    let second = app.create_book("SPQR", "HISTORY", "2", 10).await;
    let first_id = first["id"].as_str().expect("No id");

    let (status, body) = app.get("/api/borrow-summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = app.borrow(first_id, json!(3), "ada@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.borrow(first_id, json!("4"), "grace@example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/borrow-summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Borrowed books summary retrieved successfully");

    let rows = body["data"].as_array().expect("data is not a list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["totalQuantity"], 7);
    assert_eq!(rows[0]["book"]["title"], "Dune");
    assert_eq!(rows[0]["book"]["isbn"], "1");
    assert!(rows
        .iter()
        .all(|row| row["book"]["isbn"] != second["isbn"]));
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/books"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"]["name"], "BadRequest");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
