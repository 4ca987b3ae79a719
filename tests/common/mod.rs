//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use examdesk::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ADMIN_EMAIL: &str = "admin@examdesk.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";
pub const RAZORPAY_KEY_ID: &str = "rzp_test_key";
pub const RAZORPAY_KEY_SECRET: &str = "rzp_test_secret";
pub const DEFAULT_PASSWORD: &str = "correct-horse-battery";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
    /// Stands in for api.razorpay.com
    pub razorpay: MockServer,
    /// Stands in for the Supabase project
    pub storage: MockServer,
}

/// Answers `POST /v1/orders` with a fresh order id per call
struct RazorpayOrders {
    counter: AtomicUsize,
}

impl Respond for RazorpayOrders {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let body: Value = request.body_json().unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({
            "id": format!("order_TEST{n:06}"),
            "entity": "order",
            "amount": body["amount"],
            "currency": body["currency"],
            "receipt": body["receipt"],
            "status": "created"
        }))
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        examdesk::metrics::init_metrics();

        let razorpay = MockServer::start().await;
        let storage = MockServer::start().await;
        mount_razorpay(&razorpay).await;
        mount_storage(&storage).await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-that-is-32-bytes!!".to_string(),
                session_max_age: 604800,
                login_max_attempts: 5,
                login_window_seconds: 900,
            },
            admin: config::AdminConfig {
                email: Some(ADMIN_EMAIL.to_string()),
                password: Some(ADMIN_PASSWORD.to_string()),
                name: "Test Admin".to_string(),
            },
            payment: config::PaymentConfig {
                razorpay: config::RazorpayConfig {
                    key_id: RAZORPAY_KEY_ID.to_string(),
                    key_secret: RAZORPAY_KEY_SECRET.to_string(),
                    api_base: razorpay.uri(),
                    currency: "INR".to_string(),
                },
            },
            storage: config::StorageConfig {
                url: storage.uri(),
                service_key: "test-service-key".to_string(),
                bucket: "materials".to_string(),
                signed_url_ttl: 120,
            },
            cache: config::CacheConfig { catalog_ttl: 300 },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = examdesk::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            _temp_dir: temp_dir,
            client,
            razorpay,
            storage,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Register a student and return (token, user id)
    pub async fn register(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": DEFAULT_PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), 201, "registration of {email} failed");
        let body: Value = response.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Register a student with a unique e-mail
    pub async fn student(&self) -> (String, String) {
        let email = format!("student-{}@examdesk.test", ulid::Ulid::new()).to_lowercase();
        self.register("Test Student", &email).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), 200, "login of {email} failed");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Token of the bootstrap admin
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Create a material as admin and return its id
    pub async fn create_material(&self, admin: &str, title: &str, price: i64, is_free: bool) -> String {
        let response = self
            .post(
                "/api/materials",
                Some(admin),
                json!({
                    "title": title,
                    "exam": "NEET",
                    "price": price,
                    "is_free": is_free
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Create a two-question test as admin and return its id
    pub async fn create_test(&self, admin: &str, title: &str, price: i64, is_free: bool) -> String {
        let response = self
            .post(
                "/api/tests",
                Some(admin),
                json!({
                    "title": title,
                    "exam": "JEE",
                    "duration_minutes": 60,
                    "price": price,
                    "is_free": is_free,
                    "negative_marks": 1,
                    "questions": [
                        {
                            "prompt": "SI unit of force?",
                            "options": ["Joule", "Newton", "Pascal", "Watt"],
                            "correct_option": 1
                        },
                        {
                            "prompt": "Derivative of x^2?",
                            "options": ["x", "2x", "x^2", "2"],
                            "correct_option": 1,
                            "marks": 3
                        }
                    ]
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Upload a PDF for a material as admin
    pub async fn upload_pdf(&self, admin: &str, material_id: &str, data: &[u8]) -> reqwest::Response {
        let boundary = "examdesk-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        self.client
            .post(self.url(&format!("/api/materials/{material_id}/file")))
            .bearer_auth(admin)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .unwrap()
    }

    /// Create an order and return the response body
    pub async fn create_order(&self, token: &str, item_type: &str, item_id: &str) -> Value {
        let response = self
            .post(
                "/api/payment/create-order",
                Some(token),
                json!({ "item_type": item_type, "item_id": item_id }),
            )
            .await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// Post a checkout result signed with the test key secret
    pub async fn verify(&self, token: &str, razorpay_order_id: &str, payment_id: &str) -> reqwest::Response {
        let signature =
            examdesk::payment::checkout_signature(RAZORPAY_KEY_SECRET, razorpay_order_id, payment_id)
                .unwrap();
        self.post(
            "/api/payment/verify",
            Some(token),
            json!({
                "razorpay_order_id": razorpay_order_id,
                "razorpay_payment_id": payment_id,
                "razorpay_signature": signature
            }),
        )
        .await
    }

    /// Buy an item end to end
    pub async fn purchase(&self, token: &str, item_type: &str, item_id: &str) {
        let order = self.create_order(token, item_type, item_id).await;
        let razorpay_order_id = order["razorpay_order_id"].as_str().unwrap();
        let response = self.verify(token, razorpay_order_id, "pay_TEST000001").await;
        assert_eq!(response.status(), 200);
    }
}

async fn mount_razorpay(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(RazorpayOrders {
            counter: AtomicUsize::new(0),
        })
        .mount(server)
        .await;
}

async fn mount_storage(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/sign/materials/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedURL": "/object/sign/materials/file.pdf?token=signed-test-token"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/materials/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "materials/uploaded.pdf"
        })))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/materials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}
