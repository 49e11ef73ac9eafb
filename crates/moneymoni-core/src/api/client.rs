//! API client for the MoneyMoni household finance backend.
//!
//! This module provides the `ApiClient` struct: every outbound request goes
//! through it, and so does the global reaction to a 401 (redirect to the
//! login route via the shared `Navigator`).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{multipart, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Ack, Account, AccountInput, AccountList, BudgetInput, BudgetList, Category, CategoryInput,
    CategoryList, CsvImportResult, DateRange, HealthStatus, LoginResponse, MonthlyReport, Session,
    SplitReport, Transaction, TransactionInput, TransactionPage, TransactionQuery, TrendQuery,
    TrendReport, ValidationError,
};
use crate::router::Navigator;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default backend location (the FastAPI dev server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// API client for the MoneyMoni backend.
/// Clone is cheap - reqwest::Client uses Arc internally, so clones share the
/// connection pool and the cookie jar holding the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    navigator: Option<Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            navigator: None,
        })
    }

    /// Attach the navigator that receives the login redirect on a 401.
    pub fn with_navigator(mut self, navigator: Navigator) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Server root, for endpoints mounted outside the `/api` prefix.
    fn root_url(&self, path: &str) -> String {
        let root = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        format!("{}/{}", root, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// A 401 additionally sends the navigator to the login route.
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);

        if err.is_unauthorized() {
            warn!(url = %url, "Request rejected as unauthenticated");
            if let Some(ref navigator) = self.navigator {
                navigator.redirect_to_login();
            }
        } else {
            debug!(url = %url, status = status.as_u16(), "Request failed");
        }

        Err(err.into())
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send request: {}", what))?;
        self.check_response(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(builder, what).await?;
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body: {}", what))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", what, e)).into())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        self.send_json(self.client.get(&url), path).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let url = self.url(path);
        self.send_json(self.client.get(&url).query(query), path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        self.send_json(self.client.post(&url).json(body), path).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        self.send_json(self.client.put(&url).json(body), path).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        self.send_json(self.client.delete(&url), path).await
    }

    fn file_part(file_name: &str, bytes: Vec<u8>, mime: &str) -> Result<multipart::Part> {
        multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(ApiError::from)
            .context("Invalid upload content type")
    }

    /// Client-side validation, surfaced as an `ApiError` before any request.
    fn check(result: Result<(), ValidationError>) -> Result<()> {
        result.map_err(|e| ApiError::Validation(e).into())
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Exchange a PIN for an access token. The backend also sets the
    /// `access_token` cookie, which lands in this client's cookie jar.
    pub async fn login(&self, pin: &str) -> Result<LoginResponse> {
        let body = serde_json::json!({ "pin": pin });
        self.post("auth/login", &body).await
    }

    pub async fn logout(&self) -> Result<Ack> {
        self.post("auth/logout", &serde_json::json!({})).await
    }

    pub async fn me(&self) -> Result<Session> {
        self.get("auth/me").await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub async fn list_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let query = query.clone().normalized();
        debug!(page = query.page, size = query.size, filtered = query.has_filters(), "Fetching transactions");
        self.get_with("transactions/", &query).await
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Transaction> {
        self.get(&format!("transactions/{}", id)).await
    }

    pub async fn create_transaction(&self, input: &TransactionInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.post("transactions/", input).await
    }

    pub async fn update_transaction(&self, id: i64, input: &TransactionInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.put(&format!("transactions/{}", id), input).await
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<Ack> {
        self.delete(&format!("transactions/{}", id)).await
    }

    /// Attach a receipt image to a transaction.
    pub async fn upload_receipt(&self, id: i64, file_name: &str, bytes: Vec<u8>) -> Result<Ack> {
        let mime = if file_name.to_ascii_lowercase().ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        };
        let form = multipart::Form::new().part("file", Self::file_part(file_name, bytes, mime)?);
        let url = self.url(&format!("transactions/{}/receipts", id));
        self.send_json(self.client.post(&url).multipart(form), "transactions/receipts")
            .await
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let list: CategoryList = self.get("categories/").await?;
        Ok(list.categories)
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.post("categories/", input).await
    }

    pub async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.put(&format!("categories/{}", id), input).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<Ack> {
        self.delete(&format!("categories/{}", id)).await
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let list: AccountList = self.get("accounts/").await?;
        Ok(list.accounts)
    }

    pub async fn create_account(&self, input: &AccountInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.post("accounts/", input).await
    }

    pub async fn update_account(&self, id: i64, input: &AccountInput) -> Result<Ack> {
        Self::check(input.validate())?;
        self.put(&format!("accounts/{}", id), input).await
    }

    pub async fn delete_account(&self, id: i64) -> Result<Ack> {
        self.delete(&format!("accounts/{}", id)).await
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    /// Budgets for a `YYYYMM` month, with spent/remaining figures.
    pub async fn list_budgets(&self, month: &str) -> Result<BudgetList> {
        self.get_with("budgets/", &[("month", month)]).await
    }

    /// Replace the limits for a month in one bulk request.
    pub async fn update_budgets(&self, budgets: &[BudgetInput]) -> Result<Ack> {
        for budget in budgets {
            Self::check(budget.validate())?;
        }
        self.put("budgets/", budgets).await
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub async fn monthly_report(&self, month: &str) -> Result<MonthlyReport> {
        self.get_with("reports/monthly", &[("month", month)]).await
    }

    pub async fn trend_report(&self, query: &TrendQuery) -> Result<TrendReport> {
        self.get_with("reports/trend", query).await
    }

    pub async fn split_report(&self, range: &DateRange) -> Result<SplitReport> {
        self.get_with("reports/split", range).await
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Download the transactions CSV export as text.
    pub async fn export_transactions_csv(&self, range: &DateRange) -> Result<String> {
        let url = self.url("files/exports/transactions/csv");
        let response = self
            .send(self.client.get(&url).query(range), "files/exports/transactions/csv")
            .await?;
        response
            .text()
            .await
            .map_err(ApiError::from)
            .context("Failed to read CSV export")
    }

    /// Upload a transactions CSV. With `dry_run` the backend only validates.
    pub async fn import_transactions_csv(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        dry_run: bool,
    ) -> Result<CsvImportResult> {
        let form = multipart::Form::new().part("file", Self::file_part(file_name, bytes, "text/csv")?);
        let url = self.url("files/imports/transactions/csv");
        self.send_json(
            self.client
                .post(&url)
                .query(&[("dry_run", dry_run)])
                .multipart(form),
            "files/imports/transactions/csv",
        )
        .await
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Backend liveness. A 503 still carries a status body, so it is parsed
    /// rather than treated as an error.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.root_url("healthz");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to reach health endpoint")?;

        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return response
                .json()
                .await
                .map_err(ApiError::from)
                .context("Failed to parse health response");
        }

        let response = self.check_response(response).await?;
        response
            .json()
            .await
            .map_err(ApiError::from)
            .context("Failed to parse health response")
    }
}
