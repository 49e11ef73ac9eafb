//! Application state management for the MoneyMoni TUI.
//!
//! This module contains the `App` struct that owns the session manager, the
//! query cache, and all UI state. Fetches run as background tasks that report
//! back over a channel; mutations are awaited inline and followed by a
//! refetch of the page they changed.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use moneymoni_core::api::{error_message, ApiError};
use moneymoni_core::dashboard::{fetch_dashboard, DashboardData};
use moneymoni_core::models::{
    Account, Budget, BudgetInput, BudgetList, Category, Transaction, TransactionPage,
    TransactionQuery,
};
use moneymoni_core::router::{guard, GuardDecision};
use moneymoni_core::utils::{month_key, shift_month};
use moneymoni_core::{AuthState, Config, Navigator, QueryCache, Route, SessionManager};

use crate::form::{Form, FormKind};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Household PINs are short numeric codes.
const MAX_PIN_LENGTH: usize = 10;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    Searching,
    EditingForm,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Resource awaiting delete confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Transaction(i64, String),
    Category(i64, String),
    Account(i64, String),
}

impl DeleteTarget {
    pub fn description(&self) -> String {
        match self {
            DeleteTarget::Transaction(_, label) => format!("transaction \"{}\"", label),
            DeleteTarget::Category(_, name) => format!("category \"{}\"", name),
            DeleteTarget::Account(_, name) => format!("account \"{}\"", name),
        }
    }

    fn route(&self) -> Route {
        match self {
            DeleteTarget::Transaction(..) => Route::Transactions,
            DeleteTarget::Category(..) => Route::Categories,
            DeleteTarget::Account(..) => Route::Accounts,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background fetch tasks back to the event loop.
enum FetchResult {
    Dashboard(DashboardData),
    Transactions(TransactionQuery, TransactionPage),
    Categories(Vec<Category>),
    Accounts(Vec<Account>),
    Budgets(String, BudgetList),
    /// A fetch for the given page failed
    Failed(Route, anyhow::Error),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionManager,
    pub cache: QueryCache,
    pub navigator: Navigator,
    route_rx: watch::Receiver<Route>,
    /// Page to show after the next successful login
    return_to: Route,

    // UI State
    pub state: AppState,
    pub focus: Focus,
    pub status_message: Option<String>,
    pub loading: HashSet<Route>,
    pub busy: bool,

    // Login form state
    pub login_pin: String,
    pub login_error: Option<String>,

    // Transactions page
    pub tx_query: TransactionQuery,
    pub tx_selection: usize,
    pub search_input: String,

    // Categories / accounts pages
    pub category_selection: usize,
    pub account_selection: usize,

    // Budgets page
    pub budget_month: String,
    pub budget_selection: usize,
    /// Unsaved limits for `budget_month`, keyed by category
    pub budget_edits: Vec<BudgetInput>,

    // Modals
    pub form: Option<Form>,
    pub pending_delete: Option<DeleteTarget>,

    // Background task channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,
}

impl App {
    pub fn new(config: Config, session: SessionManager, navigator: Navigator) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let route_rx = navigator.subscribe();
        let tx_query = TransactionQuery {
            size: config.page_size,
            ..TransactionQuery::default()
        };
        let return_to = match navigator.current() {
            Route::Login => Route::Dashboard,
            route => route,
        };

        Self {
            config,
            session,
            cache: QueryCache::new(),
            navigator,
            route_rx,
            return_to,

            state: AppState::Normal,
            focus: Focus::List,
            status_message: None,
            loading: HashSet::new(),
            busy: false,

            login_pin: String::new(),
            login_error: None,

            tx_query,
            tx_selection: 0,
            search_input: String::new(),

            category_selection: 0,
            account_selection: 0,

            budget_month: month_key(Self::today()),
            budget_selection: 0,
            budget_edits: Vec::new(),

            form: None,
            pending_delete: None,

            fetch_rx: rx,
            fetch_tx: tx,
        }
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn route(&self) -> Route {
        self.navigator.current()
    }

    /// What the main area should show for the current route.
    pub fn guard_decision(&self) -> GuardDecision {
        guard(self.route(), &self.session.state())
    }

    pub fn is_loading(&self, route: Route) -> bool {
        self.loading.contains(&route)
    }

    // =========================================================================
    // Event loop hooks
    // =========================================================================

    /// Run once per event loop iteration.
    pub async fn tick(&mut self) {
        self.check_background_tasks();

        if self.session.state() == AuthState::Restored {
            info!("Confirming restored session");
            match self.session.reconcile().await {
                AuthState::Authenticated => self.on_route_changed(self.route()),
                _ => self.navigator.navigate(Route::Login),
            }
        }

        self.sync_route();
    }

    /// Apply guard redirects and react to route changes.
    pub fn sync_route(&mut self) {
        let route = self.route();

        // Only the HTTP client's 401 hook moves us to login while signed in
        if route == Route::Login && self.session.is_authenticated() {
            self.session.handle_unauthorized();
            self.status_message = Some("Session expired. Please log in again.".to_string());
        }

        if let GuardDecision::Redirect(target) = guard(route, &self.session.state()) {
            if target == Route::Login && route.is_protected() {
                self.return_to = route;
            }
            self.navigator.navigate(target);
        }

        if self.route_rx.has_changed().unwrap_or(false) {
            let route = *self.route_rx.borrow_and_update();
            self.on_route_changed(route);
        }
    }

    fn on_route_changed(&mut self, route: Route) {
        debug!(path = route.path(), "Route changed");
        self.focus = Focus::List;
        match route {
            Route::Login => self.start_login(),
            _ => {
                self.return_to = route;
                if self.state == AppState::LoggingIn {
                    self.state = AppState::Normal;
                }
                self.refresh_route(route);
            }
        }
    }

    pub fn navigate(&mut self, route: Route) {
        self.navigator.navigate(route);
        self.sync_route();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_pin.clear();
        self.login_error = None;
        self.form = None;
        self.pending_delete = None;
    }

    /// Attempt login with the PIN from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let pin = std::mem::take(&mut self.login_pin);
        self.busy = true;
        let result = self.session.login(&pin).await;
        self.busy = false;

        match result {
            Ok(_) => {
                self.login_error = None;
                self.status_message = None;
                self.state = AppState::Normal;
                let target = self.return_to;
                self.navigator.navigate(target);
                // Force a fetch even when the route did not change
                self.refresh_route(target);
                self.route_rx.mark_unchanged();
                Ok(())
            }
            Err(e) => {
                self.login_error = self
                    .session
                    .last_error()
                    .map(str::to_string)
                    .or_else(|| Some(error_message(&e, "Login failed")));
                Err(e)
            }
        }
    }

    pub async fn logout(&mut self) {
        self.return_to = Route::Dashboard;
        self.session.logout(&mut self.cache).await;
        self.budget_edits.clear();
        self.status_message = Some("Logged out".to_string());
        self.sync_route();
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Refetch everything the current page shows.
    pub fn refresh_current(&mut self) {
        let route = self.route();
        self.refresh_route(route);
    }

    fn refresh_route(&mut self, route: Route) {
        if !self.session.is_authenticated() {
            return;
        }
        match route {
            Route::Login => {}
            Route::Dashboard => self.spawn_dashboard_fetch(),
            Route::Transactions => {
                self.spawn_transactions_fetch();
                // Needed for the filter and create forms
                self.spawn_categories_fetch();
                self.spawn_accounts_fetch();
            }
            Route::Categories => self.spawn_categories_fetch(),
            Route::Accounts => self.spawn_accounts_fetch(),
            Route::Budgets => {
                self.spawn_budgets_fetch();
                self.spawn_categories_fetch();
            }
        }
    }

    fn spawn_dashboard_fetch(&mut self) {
        self.loading.insert(Route::Dashboard);
        let api = self.session.api().clone();
        let tx = self.fetch_tx.clone();
        let today = Self::today();
        tokio::spawn(async move {
            let result = fetch_dashboard(&api, today).await;
            Self::send_fetch_result(&tx, Route::Dashboard, result, FetchResult::Dashboard).await;
        });
    }

    fn spawn_transactions_fetch(&mut self) {
        self.loading.insert(Route::Transactions);
        let api = self.session.api().clone();
        let tx = self.fetch_tx.clone();
        let query = self.tx_query.clone();
        tokio::spawn(async move {
            let result = api.list_transactions(&query).await;
            Self::send_fetch_result(&tx, Route::Transactions, result, |page| {
                FetchResult::Transactions(query, page)
            })
            .await;
        });
    }

    fn spawn_categories_fetch(&mut self) {
        self.loading.insert(Route::Categories);
        let api = self.session.api().clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.list_categories().await;
            Self::send_fetch_result(&tx, Route::Categories, result, FetchResult::Categories).await;
        });
    }

    fn spawn_accounts_fetch(&mut self) {
        self.loading.insert(Route::Accounts);
        let api = self.session.api().clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.list_accounts().await;
            Self::send_fetch_result(&tx, Route::Accounts, result, FetchResult::Accounts).await;
        });
    }

    fn spawn_budgets_fetch(&mut self) {
        self.loading.insert(Route::Budgets);
        let api = self.session.api().clone();
        let tx = self.fetch_tx.clone();
        let month = self.budget_month.clone();
        tokio::spawn(async move {
            let result = api.list_budgets(&month).await;
            Self::send_fetch_result(&tx, Route::Budgets, result, |list| {
                FetchResult::Budgets(month, list)
            })
            .await;
        });
    }

    /// Helper to send a successful fetch result or the error
    async fn send_fetch_result<T, F>(
        tx: &mpsc::Sender<FetchResult>,
        route: Route,
        result: Result<T>,
        wrapper: F,
    ) where
        F: FnOnce(T) -> FetchResult,
    {
        let message = match result {
            Ok(data) => {
                debug!(page = route.title(), "Fetched");
                wrapper(data)
            }
            Err(e) => {
                error!(page = route.title(), error = %e, "Fetch failed");
                FetchResult::Failed(route, e)
            }
        };
        if tx.send(message).await.is_err() {
            warn!("Fetch result dropped, event loop has exited");
        }
    }

    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Dashboard(data) => {
                self.loading.remove(&Route::Dashboard);
                self.cache.put_dashboard(data);
            }
            FetchResult::Transactions(query, page) => {
                // Ignore answers to a query the user has since changed
                if query != self.tx_query {
                    debug!("Discarding stale transactions page");
                    return;
                }
                self.loading.remove(&Route::Transactions);
                self.cache.put_transactions(query, page);
                self.tx_selection = clamp_selection(self.tx_selection, self.transactions().len());
            }
            FetchResult::Categories(data) => {
                self.loading.remove(&Route::Categories);
                self.cache.put_categories(data);
                self.category_selection = clamp_selection(self.category_selection, self.categories().len());
            }
            FetchResult::Accounts(data) => {
                self.loading.remove(&Route::Accounts);
                self.cache.put_accounts(data);
                self.account_selection = clamp_selection(self.account_selection, self.accounts().len());
            }
            FetchResult::Budgets(month, list) => {
                if month == self.budget_month {
                    self.loading.remove(&Route::Budgets);
                }
                self.cache.put_budgets(&month, list);
                self.budget_selection = clamp_selection(self.budget_selection, self.budget_rows().len());
            }
            FetchResult::Failed(route, e) => {
                self.loading.remove(&route);
                let fallback = format!("Failed to load {}", route.title().to_lowercase());
                self.report_error(&e, &fallback);
            }
        }
    }

    /// Turn an error into the status banner, applying the 401 transition.
    fn report_error(&mut self, e: &anyhow::Error, fallback: &str) -> String {
        let message = if self.session.observe_error(e) {
            "Session expired. Please log in again.".to_string()
        } else {
            error_message(e, fallback)
        };
        self.status_message = Some(message.clone());
        message
    }

    pub fn dismiss_status(&mut self) {
        self.status_message = None;
    }

    // =========================================================================
    // Data access
    // =========================================================================

    pub fn dashboard(&self) -> Option<&DashboardData> {
        self.cache.dashboard().map(|c| &c.data)
    }

    pub fn transaction_page(&self) -> Option<&TransactionPage> {
        self.cache.transactions(&self.tx_query).map(|c| &c.data)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transaction_page()
            .map(|p| p.transactions.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions().get(self.tx_selection)
    }

    pub fn categories(&self) -> &[Category] {
        self.cache
            .categories()
            .map(|c| c.data.as_slice())
            .unwrap_or(&[])
    }

    pub fn accounts(&self) -> &[Account] {
        self.cache
            .accounts()
            .map(|c| c.data.as_slice())
            .unwrap_or(&[])
    }

    /// Budgets for the selected month with unsaved limits applied.
    pub fn budget_rows(&self) -> Vec<Budget> {
        let mut rows: Vec<Budget> = self
            .cache
            .budgets(&self.budget_month)
            .map(|c| c.data.budgets.clone())
            .unwrap_or_default();

        for edit in &self.budget_edits {
            match rows.iter_mut().find(|b| b.category_id == edit.category_id) {
                Some(row) => {
                    row.amount_limit = edit.amount_limit;
                    row.amount_remaining = None;
                    row.percentage = None;
                }
                None => rows.push(Budget {
                    id: None,
                    category_id: edit.category_id,
                    category_name: self
                        .categories()
                        .iter()
                        .find(|c| c.id == edit.category_id)
                        .map(|c| c.name.clone()),
                    month: edit.month.clone(),
                    amount_limit: edit.amount_limit,
                    amount_spent: 0.0,
                    amount_remaining: None,
                    percentage: None,
                }),
            }
        }
        rows
    }

    pub fn has_unsaved_budgets(&self) -> bool {
        !self.budget_edits.is_empty()
    }

    /// "Updated 3m ago" text for the status bar.
    pub fn last_updated_display(&self) -> String {
        match self.cache.last_updated() {
            Some(at) => {
                let cached = moneymoni_core::cache::CachedData { data: (), cached_at: at };
                if cached.is_stale() {
                    format!("Updated {}, press [u] to refresh", cached.age_display())
                } else {
                    format!("Updated {}", cached.age_display())
                }
            }
            None => "Not loaded".to_string(),
        }
    }

    // =========================================================================
    // List navigation
    // =========================================================================

    fn list_len(&self) -> usize {
        match self.route() {
            Route::Transactions => self.transactions().len(),
            Route::Categories => self.categories().len(),
            Route::Accounts => self.accounts().len(),
            Route::Budgets => self.budget_rows().len(),
            Route::Dashboard | Route::Login => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        match self.route() {
            Route::Transactions => Some(&mut self.tx_selection),
            Route::Categories => Some(&mut self.category_selection),
            Route::Accounts => Some(&mut self.account_selection),
            Route::Budgets => Some(&mut self.budget_selection),
            Route::Dashboard | Route::Login => None,
        }
    }

    /// Move the selection on the current page by `delta` rows, clamped.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.list_len();
        if let Some(selection) = self.selection_mut() {
            if len == 0 {
                *selection = 0;
            } else {
                let next = (*selection as isize + delta).clamp(0, len as isize - 1);
                *selection = next as usize;
            }
        }
    }

    pub fn select_first(&mut self) {
        if let Some(selection) = self.selection_mut() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        let len = self.list_len();
        if let Some(selection) = self.selection_mut() {
            *selection = len.saturating_sub(1);
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Detail,
            Focus::Detail => Focus::List,
        };
    }

    // =========================================================================
    // Transactions page
    // =========================================================================

    fn set_query(&mut self, query: TransactionQuery) {
        self.tx_query = query.normalized();
        self.tx_selection = 0;
        self.spawn_transactions_fetch();
    }

    pub fn next_page(&mut self) {
        if self.transaction_page().is_some_and(TransactionPage::has_next) {
            let query = TransactionQuery {
                page: self.tx_query.page + 1,
                ..self.tx_query.clone()
            };
            self.set_query(query);
        }
    }

    pub fn prev_page(&mut self) {
        if self.tx_query.page > 1 {
            let query = TransactionQuery {
                page: self.tx_query.page - 1,
                ..self.tx_query.clone()
            };
            self.set_query(query);
        }
    }

    pub fn start_search(&mut self) {
        self.search_input = self.tx_query.q.clone().unwrap_or_default();
        self.state = AppState::Searching;
    }

    pub fn apply_search(&mut self) {
        self.state = AppState::Normal;
        let q = self.search_input.trim().to_string();
        let query = TransactionQuery {
            page: 1,
            q: if q.is_empty() { None } else { Some(q) },
            ..self.tx_query.clone()
        };
        if query != self.tx_query {
            self.set_query(query);
        }
    }

    pub fn cancel_search(&mut self) {
        self.state = AppState::Normal;
        self.search_input.clear();
    }

    pub fn clear_filters(&mut self) {
        if self.tx_query.has_filters() {
            self.search_input.clear();
            self.set_query(TransactionQuery {
                size: self.config.page_size,
                ..TransactionQuery::default()
            });
        }
    }

    // =========================================================================
    // Budgets page
    // =========================================================================

    pub fn shift_budget_month(&mut self, delta: i32) {
        if self.has_unsaved_budgets() {
            self.status_message = Some("Save [s] or discard [x] budget changes first".to_string());
            return;
        }
        self.budget_month = shift_month(&self.budget_month, delta);
        self.budget_selection = 0;
        self.spawn_budgets_fetch();
    }

    pub fn discard_budget_edits(&mut self) {
        self.budget_edits.clear();
        self.budget_selection = clamp_selection(self.budget_selection, self.budget_rows().len());
    }

    fn stage_budget(&mut self, input: BudgetInput) {
        match self
            .budget_edits
            .iter_mut()
            .find(|e| e.category_id == input.category_id)
        {
            Some(existing) => *existing = input,
            None => self.budget_edits.push(input),
        }
    }

    /// Save the selected month with one bulk request.
    pub async fn save_budgets(&mut self) {
        if !self.has_unsaved_budgets() {
            return;
        }
        let rows: Vec<BudgetInput> = self.budget_rows().iter().map(BudgetInput::from).collect();
        self.busy = true;
        let result = self.session.api().update_budgets(&rows).await;
        self.busy = false;

        match result {
            Ok(_) => {
                info!(month = %self.budget_month, rows = rows.len(), "Budgets saved");
                self.budget_edits.clear();
                self.status_message = Some("Budgets saved".to_string());
                self.spawn_budgets_fetch();
            }
            Err(e) => {
                self.report_error(&e, "Failed to save budgets");
            }
        }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Open the create form for the current page.
    pub fn open_new_form(&mut self) {
        let form = match self.route() {
            Route::Transactions => Form::new_transaction(Self::today(), self.categories(), self.accounts()),
            Route::Categories => Form::new_category(),
            Route::Accounts => Form::new_account(),
            Route::Budgets => {
                if self.categories().is_empty() {
                    self.status_message = Some("Create a category first".to_string());
                    return;
                }
                Form::budget_limit(self.categories(), None)
            }
            Route::Dashboard | Route::Login => return,
        };
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    /// Open the edit form for the selected row.
    pub fn open_edit_form(&mut self) {
        let form = match self.route() {
            Route::Categories => self
                .categories()
                .get(self.category_selection)
                .map(Form::rename_category),
            Route::Accounts => self.accounts().get(self.account_selection).map(Form::edit_account),
            Route::Budgets => {
                let rows = self.budget_rows();
                let form = rows
                    .get(self.budget_selection)
                    .map(|b| Form::budget_limit(self.categories(), Some(b)));
                form
            }
            Route::Transactions => self
                .selected_transaction()
                .map(|t| Form::edit_transaction(t, self.categories(), self.accounts())),
            Route::Dashboard | Route::Login => None,
        };
        if let Some(form) = form {
            self.form = Some(form);
            self.state = AppState::EditingForm;
        }
    }

    pub fn open_filter_form(&mut self) {
        if self.route() == Route::Transactions {
            self.form = Some(Form::transaction_filter(&self.tx_query, self.categories(), self.accounts()));
            self.state = AppState::EditingForm;
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Validate and submit the open form.
    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        if form.submitting {
            return;
        }
        let kind = form.kind.clone();
        let api = self.session.api().clone();

        let outcome: std::result::Result<Option<String>, anyhow::Error> = match kind {
            FormKind::TransactionFilter => match form.to_transaction_query(&self.tx_query) {
                Ok(query) => {
                    self.cancel_form();
                    self.set_query(query);
                    return;
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::BudgetLimit => match form.to_budget_input(&self.budget_month) {
                Ok(input) => {
                    self.stage_budget(input);
                    self.cancel_form();
                    self.status_message = Some("Unsaved budget changes, press [s] to save".to_string());
                    return;
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::NewTransaction => match form.to_transaction_input() {
                Ok(input) => {
                    self.mark_submitting(true);
                    api.create_transaction(&input)
                        .await
                        .map(|_| Some("Transaction added".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::EditTransaction(id) => match form.to_transaction_input() {
                Ok(input) => {
                    self.mark_submitting(true);
                    api.update_transaction(id, &input)
                        .await
                        .map(|_| Some("Transaction updated".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::NewCategory => match form.to_category_input() {
                Ok(input) => {
                    self.mark_submitting(true);
                    api.create_category(&input)
                        .await
                        .map(|_| Some("Category created".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::RenameCategory(id) => match form.to_category_input() {
                Ok(mut input) => {
                    if let Some(existing) = self.categories().iter().find(|c| c.id == id) {
                        input.parent_id = existing.parent_id;
                        input.is_active = existing.is_active;
                    }
                    self.mark_submitting(true);
                    api.update_category(id, &input)
                        .await
                        .map(|_| Some("Category renamed".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::NewAccount => match form.to_account_input() {
                Ok(input) => {
                    self.mark_submitting(true);
                    api.create_account(&input)
                        .await
                        .map(|_| Some("Account created".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
            FormKind::EditAccount(id) => match form.to_account_input() {
                Ok(input) => {
                    self.mark_submitting(true);
                    api.update_account(id, &input)
                        .await
                        .map(|_| Some("Account updated".to_string()))
                }
                Err(e) => Err(ApiError::Validation(e).into()),
            },
        };
        self.mark_submitting(false);

        match outcome {
            Ok(message) => {
                self.cancel_form();
                self.status_message = message;
                self.refresh_current();
            }
            Err(e) => {
                let message = self.report_error(&e, "Save failed");
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(message);
                }
            }
        }
    }

    fn mark_submitting(&mut self, submitting: bool) {
        self.busy = submitting;
        if let Some(form) = self.form.as_mut() {
            form.submitting = submitting;
        }
    }

    // =========================================================================
    // Deletes
    // =========================================================================

    /// Ask for confirmation before deleting the selected row.
    pub fn request_delete(&mut self) {
        let target = match self.route() {
            Route::Transactions => self.selected_transaction().map(|t| {
                DeleteTarget::Transaction(
                    t.id,
                    format!("{} {}", moneymoni_core::utils::format_date(t.date), t.memo_display()),
                )
            }),
            Route::Categories => self
                .categories()
                .get(self.category_selection)
                .map(|c| DeleteTarget::Category(c.id, c.name.clone())),
            Route::Accounts => self
                .accounts()
                .get(self.account_selection)
                .map(|a| DeleteTarget::Account(a.id, a.name.clone())),
            Route::Budgets | Route::Dashboard | Route::Login => None,
        };
        if let Some(target) = target {
            self.pending_delete = Some(target);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub async fn confirm_delete(&mut self) {
        let Some(target) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        let api = self.session.api().clone();
        self.busy = true;
        let result = match target {
            DeleteTarget::Transaction(id, _) => api.delete_transaction(id).await,
            DeleteTarget::Category(id, _) => api.delete_category(id).await,
            DeleteTarget::Account(id, _) => api.delete_account(id).await,
        };
        self.busy = false;

        match result {
            Ok(_) => {
                info!(target = %target.description(), "Deleted");
                self.status_message = Some(format!("Deleted {}", target.description()));
                self.refresh_route(target.route());
            }
            Err(e) => {
                self.report_error(&e, "Delete failed");
            }
        }
    }
}

fn clamp_selection(selection: usize, len: usize) -> usize {
    selection.min(len.saturating_sub(1))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a PIN character should be accepted
pub fn can_add_pin_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PIN_LENGTH && c.is_ascii_digit()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use moneymoni_core::auth::AUTH_FLAG_KEY;
    use moneymoni_core::{ApiClient, LocalStore};
    use tempfile::TempDir;

    fn app(dir: &TempDir, route: Route) -> App {
        let navigator = Navigator::new(route);
        // Nothing listens here; these tests stay off the network
        let api = ApiClient::new("http://127.0.0.1:9/api")
            .unwrap()
            .with_navigator(navigator.clone());
        let session = SessionManager::restore(api, LocalStore::open(dir.path()).unwrap());
        App::new(Config::default(), session, navigator)
    }

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            parent_id: None,
            is_active: true,
        }
    }

    fn budget(category_id: i64, limit: f64, spent: f64) -> Budget {
        Budget {
            id: Some(category_id),
            category_id,
            category_name: None,
            month: "202403".into(),
            amount_limit: limit,
            amount_spent: spent,
            amount_remaining: None,
            percentage: None,
        }
    }

    #[test]
    fn test_can_add_pin_char() {
        assert!(can_add_pin_char(0, '1'));
        assert!(!can_add_pin_char(0, 'a'));
        assert!(!can_add_pin_char(0, ' '));
        assert!(can_add_pin_char(MAX_PIN_LENGTH - 1, '9'));
        assert!(!can_add_pin_char(MAX_PIN_LENGTH, '9'));
    }

    #[tokio::test]
    async fn test_unauthenticated_start_redirects_to_login() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Budgets);

        app.sync_route();
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.return_to, Route::Budgets);
    }

    #[tokio::test]
    async fn test_restored_hint_renders_loading() {
        let dir = TempDir::new().unwrap();
        LocalStore::open(dir.path())
            .unwrap()
            .set(AUTH_FLAG_KEY, "true")
            .unwrap();
        let app = app(&dir, Route::Transactions);
        assert_eq!(app.guard_decision(), GuardDecision::Loading);
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_result_forces_login() {
        let dir = TempDir::new().unwrap();
        LocalStore::open(dir.path())
            .unwrap()
            .set(AUTH_FLAG_KEY, "true")
            .unwrap();
        let mut app = app(&dir, Route::Accounts);

        let err: anyhow::Error = ApiError::Unauthorized("Not authenticated".into()).into();
        app.process_fetch_result(FetchResult::Failed(Route::Accounts, err));
        assert_eq!(app.session.state(), AuthState::Unauthenticated);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Session expired. Please log in again.")
        );

        app.sync_route();
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_failed_fetch_shows_backend_detail() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Categories);
        app.loading.insert(Route::Categories);

        let err: anyhow::Error = ApiError::ServerError("Failed to get categories".into()).into();
        app.process_fetch_result(FetchResult::Failed(Route::Categories, err));
        assert!(!app.is_loading(Route::Categories));
        assert_eq!(app.status_message.as_deref(), Some("Failed to get categories"));
    }

    #[test]
    fn test_stale_transactions_page_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Transactions);
        let old_query = app.tx_query.clone();
        app.tx_query.page = 2;

        app.process_fetch_result(FetchResult::Transactions(old_query, TransactionPage::default()));
        assert!(app.transaction_page().is_none());
    }

    #[test]
    fn test_edit_opens_for_selected_transaction() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Transactions);
        app.open_edit_form();
        assert!(app.form.is_none());

        let page: TransactionPage = serde_json::from_value(serde_json::json!({
            "transactions": [
                {"id": 11, "date": "2024-03-02", "type": "expense", "amount_total": 500.0},
                {"id": 12, "date": "2024-03-01", "type": "income", "amount_total": 900.0}
            ],
            "total": 2, "page": 1, "size": 50, "pages": 1
        }))
        .unwrap();
        let query = app.tx_query.clone();
        app.process_fetch_result(FetchResult::Transactions(query, page));
        app.move_selection(1);

        app.open_edit_form();
        assert_eq!(app.state, AppState::EditingForm);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.kind, FormKind::EditTransaction(12));
        assert_eq!(form.fields[1].display(), "Income");
    }

    #[test]
    fn test_last_updated_display() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Categories);
        assert_eq!(app.last_updated_display(), "Not loaded");

        app.process_fetch_result(FetchResult::Categories(vec![category(1, "Food")]));
        assert_eq!(app.last_updated_display(), "Updated just now");
    }

    #[test]
    fn test_selection_clamped_after_refetch() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Categories);
        app.process_fetch_result(FetchResult::Categories(vec![
            category(1, "Food"),
            category(2, "Rent"),
            category(3, "Travel"),
        ]));

        app.move_selection(10);
        assert_eq!(app.category_selection, 2);
        app.move_selection(-1);
        assert_eq!(app.category_selection, 1);

        app.process_fetch_result(FetchResult::Categories(vec![category(1, "Food")]));
        assert_eq!(app.category_selection, 0);
    }

    #[test]
    fn test_budget_edits_overlay_fetched_rows() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Budgets);
        app.budget_month = "202403".into();
        app.process_fetch_result(FetchResult::Categories(vec![category(1, "Food"), category(2, "Fun")]));
        app.process_fetch_result(FetchResult::Budgets(
            "202403".into(),
            BudgetList {
                budgets: vec![budget(1, 40000.0, 25000.0)],
                month: Some("202403".into()),
            },
        ));

        app.stage_budget(BudgetInput {
            month: "202403".into(),
            category_id: 1,
            amount_limit: 50000.0,
        });
        app.stage_budget(BudgetInput {
            month: "202403".into(),
            category_id: 2,
            amount_limit: 10000.0,
        });

        let rows = app.budget_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount_limit, 50000.0);
        assert_eq!(rows[0].percentage(), 50.0);
        assert_eq!(rows[1].category_display(), "Fun");

        // Month can't change with unsaved edits
        app.shift_budget_month(1);
        assert_eq!(app.budget_month, "202403");

        app.discard_budget_edits();
        assert_eq!(app.budget_rows().len(), 1);
    }

    #[test]
    fn test_request_delete_needs_a_row() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Accounts);
        app.request_delete();
        assert_eq!(app.state, AppState::Normal);

        app.process_fetch_result(FetchResult::Accounts(vec![Account {
            id: 4,
            name: "Wallet".into(),
            kind: Default::default(),
            is_active: true,
        }]));
        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        assert_eq!(
            app.pending_delete.as_ref().map(DeleteTarget::description).as_deref(),
            Some("account \"Wallet\"")
        );

        app.cancel_delete();
        assert!(app.pending_delete.is_none());
    }

    #[test]
    fn test_new_budget_form_requires_categories() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, Route::Budgets);
        app.open_new_form();
        assert!(app.form.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Create a category first"));
    }
}
