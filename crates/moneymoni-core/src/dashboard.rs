//! Dashboard aggregation: the current month's totals and budget progress.

use anyhow::Result;
use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::debug;

use crate::api::ApiClient;
use crate::models::{Budget, Transaction, TransactionQuery, TransactionType};
use crate::utils::{month_bounds, month_key};

/// Number of recent transactions shown on the dashboard.
const RECENT_COUNT: usize = 5;

/// Income/expense summary for one calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyStats {
    pub income: f64,
    pub expense: f64,
    pub transaction_count: usize,
    pub recent: Vec<Transaction>,
}

impl MonthlyStats {
    /// Summarize the transactions dated in the month containing `today`.
    /// Transfers count towards the total but not towards income or expense.
    pub fn compute(transactions: &[Transaction], today: NaiveDate) -> Self {
        let (first, last) = month_bounds(today);
        let mut in_month: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.date >= first && t.date <= last)
            .collect();

        let mut stats = Self {
            transaction_count: in_month.len(),
            ..Self::default()
        };
        for t in &in_month {
            match t.kind {
                TransactionType::Income => stats.income += t.amount_total,
                TransactionType::Expense => stats.expense += t.amount_total,
                TransactionType::Transfer => {}
            }
        }

        in_month.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        stats.recent = in_month.into_iter().take(RECENT_COUNT).cloned().collect();
        stats
    }

    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub month: String,
    pub stats: MonthlyStats,
    pub budgets: Vec<Budget>,
}

/// Fetch the current month's transactions and budgets concurrently.
pub async fn fetch_dashboard(api: &ApiClient, today: NaiveDate) -> Result<DashboardData> {
    let month = month_key(today);
    let query = TransactionQuery::for_month(today);

    let (first_page, budgets) = futures::try_join!(
        api.list_transactions(&query),
        api.list_budgets(&month),
    )?;

    let mut transactions = first_page.transactions;
    if first_page.pages > 1 {
        debug!(pages = first_page.pages, "Fetching remaining pages for dashboard");
        let rest = (2..=first_page.pages).map(|page| {
            let query = TransactionQuery {
                page,
                ..query.clone()
            };
            async move { api.list_transactions(&query).await }
        });
        for page in try_join_all(rest).await? {
            transactions.extend(page.transactions);
        }
    }

    Ok(DashboardData {
        stats: MonthlyStats::compute(&transactions, today),
        budgets: budgets.budgets,
        month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i64, date: &str, kind: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kind,
            amount_total: amount,
            account: None,
            category: None,
            payer_user: None,
            memo: None,
            split_ratio_payer: None,
            has_receipt: false,
            created_at: None,
            items: Vec::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_totals_only_count_current_month() {
        let transactions = vec![
            tx(1, "2024-03-01", TransactionType::Income, 300000.0),
            tx(2, "2024-03-02", TransactionType::Expense, 1200.0),
            tx(3, "2024-03-31", TransactionType::Expense, 800.0),
            tx(4, "2024-02-29", TransactionType::Expense, 5000.0),
            tx(5, "2024-04-01", TransactionType::Income, 1000.0),
            tx(6, "2024-03-10", TransactionType::Transfer, 20000.0),
        ];
        let stats = MonthlyStats::compute(&transactions, today());

        assert_eq!(stats.income, 300000.0);
        assert_eq!(stats.expense, 2000.0);
        assert_eq!(stats.balance(), 298000.0);
        assert_eq!(stats.transaction_count, 4);
    }

    #[test]
    fn test_partition_matches_sum_by_type() {
        let transactions: Vec<Transaction> = (1..=40)
            .map(|i| {
                let day = (i % 28) + 1;
                let month = if i % 3 == 0 { 2 } else { 3 };
                let kind = TransactionType::ALL[(i % 3) as usize];
                tx(i, &format!("2024-{:02}-{:02}", month, day), kind, i as f64 * 10.0)
            })
            .collect();
        let stats = MonthlyStats::compute(&transactions, today());

        let (first, last) = month_bounds(today());
        let sum = |kind| -> f64 {
            transactions
                .iter()
                .filter(|t| t.kind == kind && t.date >= first && t.date <= last)
                .map(|t| t.amount_total)
                .sum()
        };
        assert_eq!(stats.income, sum(TransactionType::Income));
        assert_eq!(stats.expense, sum(TransactionType::Expense));
    }

    #[test]
    fn test_recent_is_newest_five() {
        let transactions: Vec<Transaction> = (1..=8)
            .map(|i| tx(i, &format!("2024-03-{:02}", i), TransactionType::Expense, 100.0))
            .collect();
        let stats = MonthlyStats::compute(&transactions, today());

        let ids: Vec<i64> = stats.recent.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_empty_month() {
        let stats = MonthlyStats::compute(&[], today());
        assert_eq!(stats, MonthlyStats::default());
        assert_eq!(stats.balance(), 0.0);
    }
}
