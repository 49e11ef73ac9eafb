//! Mock backend helpers for integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use moneymoni_core::{ApiClient, LocalStore, Navigator, Route, SessionManager};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const PIN: &str = "1234";
pub const TOKEN: &str = "test-access-token";

/// Far-future expiry (2100-01-01) so sessions never expire mid-test.
pub const EXPIRES_AT: i64 = 4102444800;

pub fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// A session manager pointed at `server`, persisting into `dir`, with a
/// navigator starting on the dashboard.
pub fn session_manager(server: &MockServer, dir: &TempDir) -> (SessionManager, Navigator) {
    let navigator = Navigator::new(Route::Dashboard);
    let api = ApiClient::new(&api_url(server))
        .unwrap()
        .with_navigator(navigator.clone());
    let store = LocalStore::open(dir.path()).unwrap();
    (SessionManager::restore(api, store), navigator)
}

pub fn login_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("access_token={}; Path=/; HttpOnly", TOKEN))
        .set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "expires_in": 1800
        }))
}

pub fn me_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "user_type": "household",
        "authenticated": true,
        "expires_at": EXPIRES_AT
    }))
}

pub fn detail(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "detail": message }))
}

/// Mount a login endpoint accepting only `PIN`, plus `/auth/me`.
pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "pin": PIN })))
        .respond_with(login_response())
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(me_response())
        .mount(server)
        .await;
}

// ============================================================================
// Stateful categories backend
// ============================================================================

#[derive(Clone, Default)]
pub struct CategoryStore {
    inner: Arc<Mutex<(i64, Vec<Value>)>>,
}

impl CategoryStore {
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().1.len()
    }
}

struct ListCategories(CategoryStore);
struct CreateCategory(CategoryStore);
struct DeleteCategory(CategoryStore);

impl Respond for ListCategories {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let guard = self.0.inner.lock().unwrap();
        ResponseTemplate::new(200).set_body_json(json!({ "categories": guard.1 }))
    }
}

impl Respond for CreateCategory {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return detail(422, "invalid body"),
        };
        let mut guard = self.0.inner.lock().unwrap();
        guard.0 += 1;
        let id = guard.0;
        guard.1.push(json!({
            "id": id,
            "name": body["name"],
            "parent_id": body["parent_id"],
            "is_active": true
        }));
        ResponseTemplate::new(200).set_body_json(json!({
            "message": "Category created successfully",
            "id": id
        }))
    }
}

impl Respond for DeleteCategory {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id: Option<i64> = request
            .url
            .path()
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok());
        let mut guard = self.0.inner.lock().unwrap();
        let before = guard.1.len();
        guard.1.retain(|c| c["id"].as_i64() != id);
        if guard.1.len() == before {
            return detail(404, "Category not found");
        }
        ResponseTemplate::new(200).set_body_json(json!({ "message": "Category deleted successfully" }))
    }
}

/// Mount list/create/delete for categories backed by shared state.
pub async fn mount_categories(server: &MockServer) -> CategoryStore {
    let store = CategoryStore::default();

    Mock::given(method("GET"))
        .and(path("/api/categories/"))
        .respond_with(ListCategories(store.clone()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/categories/"))
        .respond_with(CreateCategory(store.clone()))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/categories/\d+$"))
        .respond_with(DeleteCategory(store.clone()))
        .mount(server)
        .await;

    store
}

pub fn transaction_json(id: i64, date: &str, kind: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "date": date,
        "type": kind,
        "amount_total": amount,
        "account": { "id": 1, "name": "Wallet" },
        "category": { "id": 2, "name": "Food" },
        "memo": null,
        "split_ratio_payer": 0.5,
        "has_receipt": false,
        "items": []
    })
}
