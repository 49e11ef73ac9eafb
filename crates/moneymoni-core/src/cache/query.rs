use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dashboard::DashboardData;
use crate::models::{Account, BudgetList, Category, TransactionPage, TransactionQuery};

/// Data considered stale after this many minutes.
const STALE_AFTER_MINUTES: i64 = 5;

/// Data wrapper with fetch timestamp.
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() >= STALE_AFTER_MINUTES
    }
}

/// Last fetched result of each query the pages issue.
#[derive(Debug, Default)]
pub struct QueryCache {
    transactions: Option<(TransactionQuery, CachedData<TransactionPage>)>,
    categories: Option<CachedData<Vec<Category>>>,
    accounts: Option<CachedData<Vec<Account>>>,
    budgets: HashMap<String, CachedData<BudgetList>>,
    dashboard: Option<CachedData<DashboardData>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Transactions =====

    /// The cached page, only if it was fetched for the same query.
    pub fn transactions(&self, query: &TransactionQuery) -> Option<&CachedData<TransactionPage>> {
        self.transactions
            .as_ref()
            .filter(|(q, _)| q == query)
            .map(|(_, page)| page)
    }

    pub fn put_transactions(&mut self, query: TransactionQuery, page: TransactionPage) {
        self.transactions = Some((query, CachedData::new(page)));
    }

    // ===== Categories =====

    pub fn categories(&self) -> Option<&CachedData<Vec<Category>>> {
        self.categories.as_ref()
    }

    pub fn put_categories(&mut self, categories: Vec<Category>) {
        self.categories = Some(CachedData::new(categories));
    }

    // ===== Accounts =====

    pub fn accounts(&self) -> Option<&CachedData<Vec<Account>>> {
        self.accounts.as_ref()
    }

    pub fn put_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = Some(CachedData::new(accounts));
    }

    // ===== Budgets =====

    pub fn budgets(&self, month: &str) -> Option<&CachedData<BudgetList>> {
        self.budgets.get(month)
    }

    pub fn put_budgets(&mut self, month: &str, budgets: BudgetList) {
        self.budgets.insert(month.to_string(), CachedData::new(budgets));
    }

    // ===== Dashboard =====

    pub fn dashboard(&self) -> Option<&CachedData<DashboardData>> {
        self.dashboard.as_ref()
    }

    pub fn put_dashboard(&mut self, data: DashboardData) {
        self.dashboard = Some(CachedData::new(data));
    }

    /// Most recent fetch time across all slots.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let times = [
            self.transactions.as_ref().map(|(_, c)| c.cached_at),
            self.categories.as_ref().map(|c| c.cached_at),
            self.accounts.as_ref().map(|c| c.cached_at),
            self.dashboard.as_ref().map(|c| c.cached_at),
        ];
        times
            .into_iter()
            .flatten()
            .chain(self.budgets.values().map(|c| c.cached_at))
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.last_updated().is_none()
    }

    pub fn clear(&mut self) {
        debug!("Clearing query cache");
        *self = Self::default();
    }
}
