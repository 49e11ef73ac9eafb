//! REST API client module for the MoneyMoni backend.
//!
//! This module provides the `ApiClient` for calling the household budget
//! endpoints (auth, transactions, categories, accounts, budgets, reports,
//! files) and the `ApiError` taxonomy used across the crate.
//!
//! Authentication is a PIN exchanged for an access token, which the backend
//! also sets as an HTTP-only cookie. The client carries both.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{error_message, ApiError};
