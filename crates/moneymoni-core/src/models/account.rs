use serde::{Deserialize, Serialize};

use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Cash,
    Bank,
    Card,
    /// Prepaid IC card (Suica, PASMO, ...)
    Ic,
    Other,
}

impl AccountType {
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Cash => "Cash",
            AccountType::Bank => "Bank",
            AccountType::Card => "Card",
            AccountType::Ic => "IC card",
            AccountType::Other => "Other",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AccountType::Cash => AccountType::Bank,
            AccountType::Bank => AccountType::Card,
            AccountType::Card => AccountType::Ic,
            AccountType::Ic => AccountType::Other,
            AccountType::Other => AccountType::Cash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AccountType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Envelope for `GET /accounts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Body for creating or updating an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub is_active: bool,
}

impl AccountInput {
    pub fn new(name: impl Into<String>, kind: AccountType) -> Self {
        Self {
            name: name.into(),
            kind,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        Ok(())
    }
}

impl From<&Account> for AccountInput {
    fn from(a: &Account) -> Self {
        Self {
            name: a.name.clone(),
            kind: a.kind,
            is_active: a.is_active,
        }
    }
}
