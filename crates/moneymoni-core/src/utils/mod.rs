//! Utility functions for number, currency, and date formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_currency, format_date, format_number, month_bounds, month_key, parse_month_key,
    shift_month, truncate_string,
};
