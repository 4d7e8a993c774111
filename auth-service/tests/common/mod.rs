use std::sync::Arc;
use std::time::Duration;

use auth_core::TokenCodec;
use auth_service::auth::service::AuthService;
use auth_service::inbound::http::router::create_router;
use auth_service::inbound::http::router::AppState;
use auth_service::repositories::InMemoryAuthRepository;

const TEST_ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes!!";
const TEST_REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-byte!!";

/// Test application that spawns a real server
///
/// Backed by the in-memory store, so each test gets an isolated universe
/// with no external services.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryAuthRepository::new());

        let auth_service = Arc::new(AuthService::new(
            repository,
            TEST_ACCESS_SECRET,
            TEST_REFRESH_SECRET,
            Duration::from_secs(15 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        ));

        let state = AppState {
            auth_service,
            access_codec: Arc::new(TokenCodec::new(TEST_ACCESS_SECRET)),
            secure_cookies: false,
        };

        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register an account and return the parsed response body.
    pub async fn register(&self, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        response.json().await.expect("Failed to parse response")
    }
}
