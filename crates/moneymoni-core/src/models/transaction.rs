use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Items must sum to the transaction total within this tolerance.
const ITEM_TOTAL_TOLERANCE: f64 = 0.01;

/// Backend page size limits for `GET /transactions`.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
    Transfer,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Expense,
        TransactionType::Income,
        TransactionType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
            TransactionType::Transfer => "Transfer",
        }
    }

    /// Sign shown in front of the amount in lists.
    pub fn sign(&self) -> &'static str {
        match self {
            TransactionType::Income => "+",
            TransactionType::Expense => "-",
            TransactionType::Transfer => "",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TransactionType::Expense => TransactionType::Income,
            TransactionType::Income => TransactionType::Transfer,
            TransactionType::Transfer => TransactionType::Expense,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// `{id, name}` reference embedded in a transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount_total: f64,
    #[serde(default)]
    pub account: Option<NamedRef>,
    #[serde(default)]
    pub category: Option<NamedRef>,
    #[serde(default)]
    pub payer_user: Option<NamedRef>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub split_ratio_payer: Option<f64>,
    #[serde(default)]
    pub has_receipt: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    pub fn memo_display(&self) -> &str {
        match self.memo.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => "(no memo)",
        }
    }

    pub fn account_name(&self) -> &str {
        self.account.as_ref().map(|a| a.name.as_str()).unwrap_or("unknown")
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// Signed amount as shown in lists: `+¥1,000` / `-¥980`.
    pub fn signed_amount_display(&self) -> String {
        format!(
            "{}{}",
            self.kind.sign(),
            crate::utils::format_currency(self.amount_total)
        )
    }
}

/// One page of `GET /transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    #[serde(default)]
    pub pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl TransactionPage {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Query parameters for `GET /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionQuery {
    pub page: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            from_date: None,
            to_date: None,
            category_id: None,
            account_id: None,
            user_id: None,
            q: None,
        }
    }
}

impl TransactionQuery {
    /// Restrict the query to a single calendar month.
    pub fn for_month(date: NaiveDate) -> Self {
        let (first, last) = crate::utils::month_bounds(date);
        Self {
            size: MAX_PAGE_SIZE,
            from_date: Some(first),
            to_date: Some(last),
            ..Self::default()
        }
    }

    /// Clamp page and size to what the backend accepts.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.size = self.size.clamp(1, MAX_PAGE_SIZE);
        self.q = self.q.filter(|q| !q.trim().is_empty());
        self
    }

    pub fn has_filters(&self) -> bool {
        self.from_date.is_some()
            || self.to_date.is_some()
            || self.category_id.is_some()
            || self.account_id.is_some()
            || self.user_id.is_some()
            || self.q.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItemInput {
    pub name: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Body for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionInput {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_user_id: Option<i64>,
    /// Payer's share in percent (0-100). Rows report it as a fraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_ratio_payer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TransactionItemInput>,
}

impl TransactionInput {
    pub fn new(date: NaiveDate, kind: TransactionType, amount_total: f64) -> Self {
        Self {
            date,
            kind,
            amount_total,
            account_id: None,
            category_id: None,
            payer_user_id: None,
            split_ratio_payer: None,
            memo: None,
            items: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount_total.is_finite() || self.amount_total <= 0.0 {
            return Err(ValidationError::new("amount_total", "must be greater than 0"));
        }
        if let Some(ratio) = self.split_ratio_payer {
            if !(0.0..=100.0).contains(&ratio) {
                return Err(ValidationError::new("split_ratio_payer", "must be between 0 and 100"));
            }
        }
        if !self.items.is_empty() {
            if let Some(item) = self.items.iter().find(|i| i.name.trim().is_empty()) {
                return Err(ValidationError::new(
                    "items",
                    format!("item with amount {} has no name", item.amount),
                ));
            }
            let items_total: f64 = self.items.iter().map(|i| i.amount).sum();
            if (items_total - self.amount_total).abs() > ITEM_TOTAL_TOLERANCE {
                return Err(ValidationError::new(
                    "items",
                    "sum of item amounts must equal total amount",
                ));
            }
        }
        Ok(())
    }
}

impl From<&Transaction> for TransactionInput {
    fn from(t: &Transaction) -> Self {
        Self {
            date: t.date,
            kind: t.kind,
            amount_total: t.amount_total,
            account_id: t.account.as_ref().map(|a| a.id),
            category_id: t.category.as_ref().map(|c| c.id),
            payer_user_id: t.payer_user.as_ref().map(|u| u.id),
            split_ratio_payer: t.split_ratio_payer.map(|r| r * 100.0),
            memo: t.memo.clone(),
            items: t
                .items
                .iter()
                .map(|i| TransactionItemInput {
                    name: i.name.clone(),
                    amount: i.amount,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    category_id: None,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_transaction_row() {
        let json = r#"{
            "id": 7, "date": "2024-03-14", "type": "expense", "amount_total": 1280.0,
            "account": {"id": 1, "name": "Cash"},
            "category": null, "payer_user": {"id": 1, "name": "Taro"},
            "memo": "", "split_ratio_payer": 0.5, "has_receipt": false,
            "created_at": "2024-03-14T09:12:00", "items": [
                {"id": 1, "name": "Milk", "amount": 280.0, "quantity": null, "unit_price": null}
            ]
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.kind, TransactionType::Expense);
        assert_eq!(t.date, date(2024, 3, 14));
        assert_eq!(t.account_name(), "Cash");
        assert_eq!(t.category_name(), None);
        assert_eq!(t.memo_display(), "(no memo)");
        assert_eq!(t.items.len(), 1);
        assert_eq!(t.signed_amount_display(), "-¥1,280");
    }

    #[test]
    fn test_parse_minimal_row_defaults() {
        let json = r#"{"id": 1, "date": "2024-01-02", "type": "income", "amount_total": 300000}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert!(t.items.is_empty());
        assert_eq!(t.account_name(), "unknown");
        assert!(!t.has_receipt);
    }

    #[test]
    fn test_page_navigation() {
        let page = TransactionPage {
            transactions: vec![],
            total: 120,
            page: 2,
            size: 50,
            pages: 3,
        };
        assert!(page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_query_serialization_skips_none() {
        let query = TransactionQuery {
            q: Some("milk".into()),
            ..TransactionQuery::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"page": 1, "size": 50, "q": "milk"}));
    }

    #[test]
    fn test_query_normalized() {
        let query = TransactionQuery {
            page: 0,
            size: 500,
            q: Some("  ".into()),
            ..TransactionQuery::default()
        }
        .normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.size, MAX_PAGE_SIZE);
        assert_eq!(query.q, None);
        assert!(!query.has_filters());
    }

    #[test]
    fn test_query_for_month() {
        let query = TransactionQuery::for_month(date(2024, 2, 10));
        assert_eq!(query.from_date, Some(date(2024, 2, 1)));
        assert_eq!(query.to_date, Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_input_validation() {
        let mut input = TransactionInput::new(date(2024, 3, 1), TransactionType::Expense, 0.0);
        assert_eq!(input.validate().unwrap_err().field, "amount_total");

        input.amount_total = 500.0;
        assert!(input.validate().is_ok());

        input.items = vec![TransactionItemInput {
            name: "Bread".into(),
            amount: 300.0,
            quantity: None,
            unit_price: None,
            category_id: None,
        }];
        assert_eq!(input.validate().unwrap_err().field, "items");

        input.items[0].amount = 500.0;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_input_serializes_type_field() {
        let input = TransactionInput::new(date(2024, 3, 1), TransactionType::Income, 1000.0);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["date"], "2024-03-01");
        assert!(json.get("items").is_none());
    }

    #[test]
    fn test_type_cycle() {
        assert_eq!(TransactionType::Expense.next(), TransactionType::Income);
        assert_eq!(TransactionType::Transfer.next(), TransactionType::Expense);
    }
}
