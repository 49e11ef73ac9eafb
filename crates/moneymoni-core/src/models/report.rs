use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `GET /reports/monthly?month=YYYYMM`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyReport {
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub net_amount: Option<f64>,
    #[serde(default)]
    pub categories: Vec<serde_json::Value>,
    #[serde(default)]
    pub budget_status: Vec<serde_json::Value>,
}

impl MonthlyReport {
    pub fn net(&self) -> f64 {
        self.net_amount
            .unwrap_or(self.total_income - self.total_expenses)
    }
}

/// Grouping for the trend report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGrouping {
    #[default]
    Month,
    Week,
}

/// Query parameters for `GET /reports/trend`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    pub group_by: TrendGrouping,
}

/// `GET /reports/trend`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendReport {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// `GET /reports/split`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitReport {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    #[serde(default)]
    pub users: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_expenses: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_report_net_fallback() {
        let json = r#"{"month":"202403","total_income":0,"total_expenses":0,"categories":[]}"#;
        let report: MonthlyReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.month.as_deref(), Some("202403"));
        assert_eq!(report.net(), 0.0);

        let report = MonthlyReport {
            total_income: 300000.0,
            total_expenses: 120000.0,
            ..MonthlyReport::default()
        };
        assert_eq!(report.net(), 180000.0);
    }

    #[test]
    fn test_trend_query_serialization() {
        let query = TrendQuery {
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: None,
            group_by: TrendGrouping::Week,
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"from_date": "2024-01-01", "group_by": "week"}));
    }
}
