//! Integration tests for the Capelli storefront client.
//!
//! [`FakeBackend`] is an in-process axum server that speaks the storefront
//! backend's wire format: JSON bodies, `{"response": ...}` text answers,
//! `~`-delimited cart and address records, and the `"No Cart"` /
//! `"No Addresses"` sentinels. Tests point a real [`ApiClient`] at it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p capelli-integration-tests
//! ```
//!
//! # Route Structure
//!
//! ```text
//! GET  /Products            - Catalog rows
//! POST /signup, /login      - Token or refusal text
//! POST /{endpoint}          - Every per-user endpoint, keyed by `token`
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use capelli_core::{Address, CartLine, Price, Quantity, UsState};
use capelli_storefront::api::{ApiClient, ApiError, CREDENTIAL_CHANGED, USER_NOT_FOUND};
use capelli_storefront::config::ApiConfig;

/// A registered shopper.
#[derive(Debug, Clone)]
pub struct User {
    pub email: String,
    pub username: String,
    pub password: String,
    pub token: String,
    pub cart: Vec<CartLine>,
    pub addresses: Vec<Address>,
}

/// Everything the fake backend knows.
#[derive(Debug, Default)]
pub struct BackendState {
    /// `[type, title, image, category, price]` rows.
    pub products: Vec<Value>,
    pub users: Vec<User>,
    /// Endpoint names in the order they were hit.
    pub requests: Vec<String>,
    /// Endpoints that answer 500 until recovered.
    pub failing: HashSet<String>,
    next_token: u64,
}

impl BackendState {
    fn user_mut(&mut self, body: &Value) -> Option<&mut User> {
        let token = body.get("token")?.as_str()?;
        self.users.iter_mut().find(|user| user.token == token)
    }

    fn issue_token(&mut self) -> String {
        self.next_token += 1;
        format!("{:032x}", self.next_token)
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storefront backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start on an ephemeral local port with the default catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            products: default_products(),
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/Products", get(products))
            .route("/{endpoint}", post(endpoint))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Client settings pointing at this backend, with caching disabled.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: Url::parse(&format!("http://{}/", self.addr)).unwrap(),
            timeout: Duration::from_secs(5),
            product_cache_ttl: Duration::ZERO,
        }
    }

    /// A client for this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.api_config())
    }

    /// Register a shopper directly and return their token.
    pub fn add_user(&self, email: &str, username: &str, password: &str) -> String {
        let mut state = lock(&self.state);
        let token = state.issue_token();
        state.users.push(User {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: token.clone(),
            cart: Vec::new(),
            addresses: Vec::new(),
        });
        token
    }

    /// Run `f` against the backend state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut BackendState) -> T) -> T {
        f(&mut lock(&self.state))
    }

    /// The shopper registered under `username`.
    #[must_use]
    pub fn user(&self, username: &str) -> Option<User> {
        lock(&self.state)
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned()
    }

    /// Make `endpoint` answer 500.
    pub fn fail(&self, endpoint: &str) {
        lock(&self.state).failing.insert(endpoint.to_string());
    }

    pub fn recover(&self, endpoint: &str) {
        lock(&self.state).failing.remove(endpoint);
    }

    /// Endpoint names hit so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// How many times `endpoint` was hit.
    #[must_use]
    pub fn count(&self, endpoint: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|name| *name == endpoint)
            .count()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A small clipper/trimmer catalog with one banner and one malformed row.
#[must_use]
pub fn default_products() -> Vec<Value> {
    vec![
        json!(["banner", "banner1", "https://img/banner.jpg", "", ""]),
        json!(["product", "Wahl Magic Clip", "https://img/clip.png", "Clippers", "124.99"]),
        json!(["product", "Andis T-Outliner", "https://img/outliner.png", "Trimmers", "89.50"]),
        json!(["product", "Babyliss FX Shaver", "https://img/shaver.png", "Shavers", "99"]),
        json!(["product", "Broken Row"]),
    ]
}

/// A shipping address for tests.
#[must_use]
pub fn address(line1: &str, state: UsState, zip_code: &str) -> Address {
    Address {
        line1: line1.to_string(),
        line2: String::new(),
        state,
        zip_code: zip_code.to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn text(response: impl Into<String>) -> Response {
    Json(json!({ "response": response.into() })).into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn products(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests.push("Products".to_string());
    if state.failing.contains("Products") {
        return internal_error();
    }
    Json(json!({ "products": state.products })).into_response()
}

async fn endpoint(
    State(state): State<Shared>,
    Path(endpoint): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    state.requests.push(endpoint.clone());
    if state.failing.contains(&endpoint) {
        return internal_error();
    }

    match endpoint.as_str() {
        "signup" => signup(&mut state, &body),
        "login" => login(&state, &body),
        _ => match state.user_mut(&body) {
            Some(user) => user_endpoint(user, &endpoint, &body),
            None if endpoint == "getCart" => Json(json!({ "cart": USER_NOT_FOUND })).into_response(),
            None => text(USER_NOT_FOUND),
        },
    }
}

fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn index(body: &Value) -> Option<usize> {
    body.get("index")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
}

fn signup(state: &mut BackendState, body: &Value) -> Response {
    let username = field(body, "username");
    if state.users.iter().any(|user| user.username == username) {
        return text("Username already exists!");
    }
    let token = state.issue_token();
    state.users.push(User {
        email: field(body, "email").to_string(),
        username: username.to_string(),
        password: field(body, "password").to_string(),
        token: token.clone(),
        cart: Vec::new(),
        addresses: Vec::new(),
    });
    text(token)
}

fn login(state: &BackendState, body: &Value) -> Response {
    let username = field(body, "username");
    let password = field(body, "password");
    state
        .users
        .iter()
        .find(|user| user.username == username && user.password == password)
        .map_or_else(|| text(USER_NOT_FOUND), |user| text(user.token.clone()))
}

fn user_endpoint(user: &mut User, endpoint: &str, body: &Value) -> Response {
    match endpoint {
        "logout" => text("Logged out"),
        "addToCart" => {
            let title = field(body, "productTitle");
            let price = body
                .get("productPrice")
                .cloned()
                .and_then(|value| serde_json::from_value::<Price>(value).ok());
            let quantity = body
                .get("quantity")
                .and_then(Value::as_u64)
                .and_then(|q| u32::try_from(q).ok())
                .and_then(|q| Quantity::new(q).ok());
            let (Some(price), Some(quantity)) = (price, quantity) else {
                return (StatusCode::BAD_REQUEST, "bad cart item").into_response();
            };
            if let Some(line) = user.cart.iter_mut().find(|line| line.title == title) {
                line.quantity = Quantity::new(line.quantity.get() + quantity.get())
                    .unwrap_or(line.quantity);
            } else {
                user.cart.push(CartLine {
                    title: title.to_string(),
                    image: field(body, "productImage").to_string(),
                    price,
                    quantity,
                });
            }
            text("Added to cart")
        }
        "getCart" => {
            let records: Vec<String> = if user.cart.is_empty() {
                vec!["No Cart".to_string()]
            } else {
                user.cart.iter().map(CartLine::to_record).collect()
            };
            Json(json!({ "cart": records })).into_response()
        }
        "updateCartQuantity" => {
            let title = field(body, "productTitle");
            let quantity = body
                .get("quantity")
                .and_then(Value::as_u64)
                .and_then(|q| u32::try_from(q).ok())
                .and_then(|q| Quantity::new(q).ok());
            match (user.cart.iter_mut().find(|line| line.title == title), quantity) {
                (Some(line), Some(quantity)) => {
                    line.quantity = quantity;
                    text("Quantity updated")
                }
                _ => text("Product not in cart"),
            }
        }
        "deleteProduct" => {
            let title = field(body, "productTitle");
            user.cart.retain(|line| line.title != title);
            text("Product deleted")
        }
        "getAddresses" => {
            if user.addresses.is_empty() {
                Json(json!({ "addresses": "No Addresses" })).into_response()
            } else {
                let records: Vec<String> = user.addresses.iter().map(Address::to_record).collect();
                Json(json!({ "addresses": records })).into_response()
            }
        }
        "addAddress" | "changeAddress" => {
            let Ok(state) = field(body, "state").parse::<UsState>() else {
                return (StatusCode::BAD_REQUEST, "bad state").into_response();
            };
            let address = Address {
                line1: field(body, "addressOne").to_string(),
                line2: field(body, "addressTwo").to_string(),
                state,
                zip_code: field(body, "zipCode").to_string(),
            };
            if endpoint == "addAddress" {
                user.addresses.push(address);
                return text("Address added");
            }
            match index(body).and_then(|i| user.addresses.get_mut(i)) {
                Some(slot) => {
                    *slot = address;
                    text("Address changed")
                }
                None => text("No address at index"),
            }
        }
        "deleteAddress" => match index(body) {
            Some(i) if i < user.addresses.len() => {
                user.addresses.remove(i);
                text("Address deleted")
            }
            _ => text("No address at index"),
        },
        "getUsername" => text(user.username.clone()),
        "getEmail" => text(user.email.clone()),
        "changeCredential" => {
            let value = field(body, "newCredential").to_string();
            match field(body, "selected") {
                "Email" => user.email = value,
                "Username" => user.username = value,
                "Password" => user.password = value,
                other => return text(format!("Unknown credential {other}")),
            }
            text(CREDENTIAL_CHANGED)
        }
        _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
