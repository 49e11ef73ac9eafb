//! Core library for the MoneyMoni household budget client.
//!
//! - `api`: HTTP client adapter for the MoneyMoni REST backend
//! - `auth`: PIN login, session state, persisted session hint
//! - `router`: routes, the route guard, and the shared `Navigator`
//! - `models`: transactions, categories, accounts, budgets, reports
//! - `dashboard`: monthly income/expense/budget aggregation
//! - `cache`: in-memory query cache cleared on logout
//! - `config`: on-disk configuration
//! - `utils`: number and date formatting

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod router;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, LocalStore, SessionManager};
pub use cache::QueryCache;
pub use config::Config;
pub use router::{Navigator, Route};
