//! Data models for MoneyMoni resources.
//!
//! - `Transaction`, `TransactionInput`, `TransactionPage`: ledger entries
//! - `Category`, `Account`: reference data used by transactions
//! - `Budget`, `BudgetList`: monthly per-category limits
//! - Report types: `MonthlyReport`, `TrendReport`, `SplitReport`
//! - `Session`, `LoginResponse`: authentication state from `/auth`
//! - File types: `CsvImportResult`, `HealthStatus`

pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod report;
pub mod session;
pub mod transaction;

pub use account::{Account, AccountInput, AccountList, AccountType};
pub use budget::{is_month_key, Budget, BudgetInput, BudgetLevel, BudgetList};
pub use category::{Category, CategoryInput, CategoryList};
pub use common::{Ack, CsvImportResult, DateRange, HealthStatus, ValidationError};
pub use report::{MonthlyReport, SplitReport, TrendGrouping, TrendQuery, TrendReport};
pub use session::{LoginResponse, Session};
pub use transaction::{
    NamedRef, Transaction, TransactionInput, TransactionItem, TransactionItemInput,
    TransactionPage, TransactionQuery, TransactionType,
};
