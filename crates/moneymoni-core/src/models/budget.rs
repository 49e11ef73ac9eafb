use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Progress above this percentage is shown as a warning.
const WARNING_PERCENTAGE: f64 = 75.0;

/// Progress above this percentage is shown as an error.
const OVER_PERCENTAGE: f64 = 90.0;

/// How close a budget is to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLevel {
    Normal,
    Warning,
    Over,
}

impl BudgetLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > OVER_PERCENTAGE {
            BudgetLevel::Over
        } else if percentage > WARNING_PERCENTAGE {
            BudgetLevel::Warning
        } else {
            BudgetLevel::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: Option<i64>,
    pub category_id: i64,
    #[serde(default)]
    pub category_name: Option<String>,
    /// YYYYMM
    pub month: String,
    pub amount_limit: f64,
    #[serde(default)]
    pub amount_spent: f64,
    #[serde(default)]
    pub amount_remaining: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl Budget {
    pub fn category_display(&self) -> String {
        self.category_name
            .clone()
            .unwrap_or_else(|| format!("Category #{}", self.category_id))
    }

    pub fn remaining(&self) -> f64 {
        self.amount_remaining
            .unwrap_or(self.amount_limit - self.amount_spent)
    }

    /// Percentage of the limit spent, computed locally when the backend
    /// omits it.
    pub fn percentage(&self) -> f64 {
        match self.percentage {
            Some(p) => p,
            None if self.amount_limit > 0.0 => self.amount_spent / self.amount_limit * 100.0,
            None => 0.0,
        }
    }

    pub fn level(&self) -> BudgetLevel {
        BudgetLevel::from_percentage(self.percentage())
    }
}

/// Envelope for `GET /budgets?month=YYYYMM`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetList {
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub month: Option<String>,
}

/// One row of the bulk `PUT /budgets` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetInput {
    pub month: String,
    pub category_id: i64,
    pub amount_limit: f64,
}

impl BudgetInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_month_key(&self.month) {
            return Err(ValidationError::new("month", "must be YYYYMM"));
        }
        if !self.amount_limit.is_finite() || self.amount_limit <= 0.0 {
            return Err(ValidationError::new("amount_limit", "must be greater than 0"));
        }
        Ok(())
    }
}

impl From<&Budget> for BudgetInput {
    fn from(b: &Budget) -> Self {
        Self {
            month: b.month.clone(),
            category_id: b.category_id,
            amount_limit: b.amount_limit,
        }
    }
}

/// Check a `YYYYMM` month key: six digits with a month of 01-12.
pub fn is_month_key(s: &str) -> bool {
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(s[4..].parse::<u32>(), Ok(1..=12))
}
