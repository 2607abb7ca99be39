//! Integration test harness for Dompee.lk.
//!
//! [`TestContext`] starts two servers on ephemeral ports:
//!
//! - a fake script backend holding shops and users in memory, speaking the
//!   same `?action=` protocol as the real spreadsheet backend
//! - the site router from [`dompee_site::app`], pointed at the fake backend
//!
//! Tests then drive the site with a cookie-aware `reqwest` client that does
//! not follow redirects, so each redirect target can be asserted.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dompee-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use dompee_site::backend::WriteAck;
use dompee_site::config::{BackendConfig, SiteConfig};
use dompee_site::state::AppState;
use serde_json::{Value, json};

/// Password every seeded account uses.
pub const PASSWORD: &str = "secret123";

pub const ADMIN_EMAIL: &str = "admin@dompee.lk";
pub const OWNER_EMAIL: &str = "owner@dompee.lk";
pub const USER_EMAIL: &str = "visitor@dompee.lk";

// =============================================================================
// Fake backend
// =============================================================================

/// In-memory state of the fake backend.
#[derive(Debug, Default)]
pub struct BackendData {
    /// Shop records exactly as the backend would return them.
    pub shops: Vec<Value>,
    /// User records, without passwords.
    pub users: Vec<Value>,
    /// Password by email.
    pub passwords: HashMap<String, String>,
}

/// Fake backend handle shared by its handlers and the test.
#[derive(Clone, Default)]
pub struct FakeBackend {
    data: Arc<Mutex<BackendData>>,
    /// When set, `getUser` answers 500 so re-verification fails.
    fail_user_lookup: Arc<AtomicBool>,
    /// Number of `getUser` calls received.
    user_lookups: Arc<AtomicUsize>,
}

impl FakeBackend {
    /// Backend seeded with three accounts (one per role) and five shops.
    #[must_use]
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut data = backend.data();
            for (email, first, role) in [
                (ADMIN_EMAIL, "Asha", "admin"),
                (OWNER_EMAIL, "Ruwan", "shop_owner"),
                (USER_EMAIL, "Nimal", "user"),
            ] {
                data.users.push(json!({
                    "userid": format!("u-{first}"),
                    "firstName": first,
                    "lastName": "Perera",
                    "email": email,
                    "phone": "0771234567",
                    "address": "Dompe",
                    "role": role,
                }));
                data.passwords.insert(email.to_string(), PASSWORD.to_string());
            }

            data.shops = vec![
                json!({"registration_no": "DMP-2025-1001", "shop_name": "Perera Stores", "categories": "grocery, Bakery ", "services": "Delivery", "rating": 4.5, "review_count": 10}),
                json!({"registration_no": "DMP-2025-1002", "shop_name": "City Pharmacy", "categories": ["pharmacy"], "services": "Prescriptions", "rating": "4.8", "review_count": 4, "google_maps_url": "https://www.google.com/maps/place/City+Pharmacy/@7.0,80.0,17z"}),
                json!({"registration_no": "DMP-2025-1003", "shop_name": "Dompe Electronics", "categories": "electronics", "services": "Repairs, Phones", "rating": 3.9}),
                json!({"registration_no": "DMP-2025-1004", "shop_name": "Health First Pharmacy", "categories": "pharmacy", "services": "Delivery", "rating": 4.1}),
                json!({"registration_no": "DMP-2025-1005", "shop_name": "Lanka Textiles", "categories": "clothing", "services": "Tailoring"}),
            ];
        }
        backend
    }

    /// Lock the backend's data.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    #[allow(clippy::unwrap_used)]
    pub fn data(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().unwrap()
    }

    pub fn set_user_lookup_failing(&self, failing: bool) {
        self.fail_user_lookup.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    fn router(self) -> Router {
        Router::new()
            .route("/exec", get(handle_get).post(handle_post))
            .with_state(self)
    }
}

fn status(ok: bool, message: &str) -> Json<Value> {
    if ok {
        Json(json!({"status": "success", "message": message}))
    } else {
        Json(json!({"status": "error", "message": message}))
    }
}

fn user_by_email<'a>(data: &'a BackendData, email: &str) -> Option<&'a Value> {
    data.users
        .iter()
        .find(|u| u["email"].as_str().is_some_and(|e| e.eq_ignore_ascii_case(email)))
}

#[allow(clippy::too_many_lines)]
async fn handle_get(
    State(backend): State<FakeBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let param = |key: &str| params.get(key).cloned().unwrap_or_default();
    let action = param("action");

    if action == "getUser" {
        backend.user_lookups.fetch_add(1, Ordering::SeqCst);
        if backend.fail_user_lookup.load(Ordering::SeqCst) {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let mut data = backend.data();
    match action.as_str() {
        "getShops" => Json(Value::Array(data.shops.clone())).into_response(),
        "getShopById" => {
            let id = param("id");
            data.shops
                .iter()
                .find(|s| {
                    s["registration_no"] == id.as_str()
                        || s["reg_no"] == id.as_str()
                        || s["id"] == id.as_str()
                })
                .map_or_else(
                    || Json(json!({"error": "Shop not found"})).into_response(),
                    |shop| Json(shop.clone()).into_response(),
                )
        }
        "deleteShop" => {
            let id = param("id");
            let before = data.shops.len();
            data.shops
                .retain(|s| s["registration_no"] != id.as_str() && s["reg_no"] != id.as_str());
            status(data.shops.len() < before, "Shop not found").into_response()
        }
        "getUsers" => Json(Value::Array(data.users.clone())).into_response(),
        "getUser" => user_by_email(&data, &param("email")).map_or_else(
            || status(false, "User not found").into_response(),
            |user| Json(json!({"status": "success", "user": user})).into_response(),
        ),
        "login" => {
            let email = param("email");
            let valid = data.passwords.get(&email) == Some(&param("password"));
            match user_by_email(&data, &email) {
                Some(user) if valid => {
                    Json(json!({"status": "success", "user": user})).into_response()
                }
                _ => status(false, "Invalid credentials").into_response(),
            }
        }
        "updatePassword" => {
            let email = param("email");
            if data.passwords.get(&email) == Some(&param("currentPassword")) {
                data.passwords.insert(email, param("newPassword"));
                status(true, "Password updated").into_response()
            } else {
                status(false, "Current password is incorrect").into_response()
            }
        }
        "deleteUser" => {
            let email = param("email");
            let before = data.users.len();
            data.users
                .retain(|u| !u["email"].as_str().is_some_and(|e| e.eq_ignore_ascii_case(&email)));
            status(data.users.len() < before, "User not found").into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

async fn handle_post(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    let action = body["action"].as_str().map(str::to_string);
    let mut data = backend.data();
    match action.as_deref() {
        None if body.get("password").is_some() => {
            let email = body["email"].as_str().unwrap_or_default().to_lowercase();
            if user_by_email(&data, &email).is_some() {
                return status(false, "Email already registered");
            }
            let password = body["password"].as_str().unwrap_or_default().to_string();
            let mut user = body.clone();
            if let Some(fields) = user.as_object_mut() {
                fields.remove("password");
            }
            data.passwords.insert(email, password);
            data.users.push(user);
            status(true, "Registered")
        }
        None => {
            data.shops.push(body);
            status(true, "Shop created")
        }
        Some("updateShop") => {
            let record = body["data"].clone();
            let reg_no = record["reg_no"].clone();
            match data
                .shops
                .iter_mut()
                .find(|s| s["registration_no"] == reg_no || s["reg_no"] == reg_no)
            {
                Some(shop) => {
                    if let (Some(existing), Some(fields)) = (shop.as_object_mut(), record.as_object()) {
                        for (key, value) in fields {
                            existing.insert(key.clone(), value.clone());
                        }
                    }
                    status(true, "Shop updated")
                }
                None => status(false, "Shop not found"),
            }
        }
        Some("updateUser" | "updateProfile") => {
            let email = body["email"].as_str().unwrap_or_default().to_lowercase();
            let Some(user) = data.users.iter_mut().find(|u| {
                u["email"].as_str().is_some_and(|e| e.eq_ignore_ascii_case(&email))
            }) else {
                return status(false, "User not found");
            };
            if let (Some(existing), Some(fields)) = (user.as_object_mut(), body.as_object()) {
                for (key, value) in fields {
                    if key != "action" && key != "email" {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
            status(true, "User updated")
        }
        Some(_) => status(false, "Unknown action"),
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running fake backend plus the site in front of it.
pub struct TestContext {
    pub backend: FakeBackend,
    pub site_url: String,
    /// Cookie-aware client that does not follow redirects.
    pub client: reqwest::Client,
}

impl TestContext {
    /// Start both servers with a seeded backend.
    ///
    /// # Panics
    ///
    /// Panics if a listener cannot be bound or the site cannot be built.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        let backend = FakeBackend::seeded();
        let backend_addr = serve(backend.clone().router()).await;

        let config = SiteConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost".to_string(),
            auth_reverify: Duration::ZERO,
            backend: BackendConfig {
                write_ack: WriteAck::Required,
                write_settle: Duration::ZERO,
                timeout: Some(Duration::from_secs(5)),
                ..BackendConfig::with_url(format!("http://{backend_addr}/exec"))
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build site state");
        let site_addr = serve(dompee_site::app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build client");

        Self {
            backend,
            site_url: format!("http://{site_addr}"),
            client,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.site_url)
    }

    /// GET a site page.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST a form to the site.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    #[allow(clippy::expect_used)]
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Sign in and return the redirect target.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_form("/login", &[("email", email), ("password", password)])
            .await;
        location(&response)
    }
}

/// The `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[allow(clippy::expect_used)]
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
