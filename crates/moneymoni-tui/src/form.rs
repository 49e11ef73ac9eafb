//! Modal form state for creating and editing resources.
//!
//! A form is a list of fields; each field is either free text or a fixed set
//! of choices cycled with Space/←/→. Converting a form into a request body
//! runs the same validation the API client does, so errors show inline.

use chrono::NaiveDate;

use moneymoni_core::models::{
    Account, AccountInput, AccountType, Budget, BudgetInput, Category, CategoryInput, NamedRef,
    Transaction, TransactionInput, TransactionQuery, TransactionType, ValidationError,
};

/// Maximum length of any text field.
const MAX_FIELD_LENGTH: usize = 64;

/// Date format accepted in date fields.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What submitting the form does.
#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    NewTransaction,
    EditTransaction(i64),
    TransactionFilter,
    NewCategory,
    RenameCategory(i64),
    NewAccount,
    EditAccount(i64),
    /// Set the limit for a category in the selected budget month.
    BudgetLimit,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::NewTransaction => "New Transaction",
            FormKind::EditTransaction(_) => "Edit Transaction",
            FormKind::TransactionFilter => "Filter Transactions",
            FormKind::NewCategory => "New Category",
            FormKind::RenameCategory(_) => "Rename Category",
            FormKind::NewAccount => "New Account",
            FormKind::EditAccount(_) => "Edit Account",
            FormKind::BudgetLimit => "Budget Limit",
        }
    }
}

/// One option of a choice field.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub id: Option<i64>,
    pub value: String,
    pub label: String,
}

impl Choice {
    fn none() -> Self {
        Self {
            id: None,
            value: String::new(),
            label: "(none)".to_string(),
        }
    }

    fn of_id(id: i64, label: &str) -> Self {
        Self {
            id: Some(id),
            value: id.to_string(),
            label: label.to_string(),
        }
    }

    fn of_value(value: &str, label: &str) -> Self {
        Self {
            id: None,
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub input: String,
    pub choices: Vec<Choice>,
    pub selected: usize,
}

impl FormField {
    fn text(label: &'static str, input: impl Into<String>) -> Self {
        Self {
            label,
            input: input.into(),
            choices: Vec::new(),
            selected: 0,
        }
    }

    fn choice(label: &'static str, choices: Vec<Choice>, selected: usize) -> Self {
        Self {
            label,
            input: String::new(),
            selected: selected.min(choices.len().saturating_sub(1)),
            choices,
        }
    }

    pub fn is_choice(&self) -> bool {
        !self.choices.is_empty()
    }

    /// Text shown in the field.
    pub fn display(&self) -> &str {
        match self.choices.get(self.selected) {
            Some(choice) => &choice.label,
            None => &self.input,
        }
    }

    fn current(&self) -> Option<&Choice> {
        self.choices.get(self.selected)
    }

    fn trimmed(&self) -> &str {
        self.input.trim()
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
    /// Body the edited row was loaded from. Fields the form does not show
    /// (payer, split, items) are sent back unchanged.
    base: Option<TransactionInput>,
}

impl Form {
    fn new(kind: FormKind, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            fields,
            focus: 0,
            error: None,
            submitting: false,
            base: None,
        }
    }

    // ===== Builders =====

    pub fn new_transaction(today: NaiveDate, categories: &[Category], accounts: &[Account]) -> Self {
        Self::new(
            FormKind::NewTransaction,
            vec![
                FormField::text("Date", today.format(DATE_FORMAT).to_string()),
                FormField::choice("Type", type_choices(), 0),
                FormField::text("Amount", ""),
                FormField::text("Memo", ""),
                FormField::choice("Category", category_choices(categories), 0),
                FormField::choice("Account", account_choices(accounts), 0),
            ],
        )
    }

    pub fn edit_transaction(transaction: &Transaction, categories: &[Category], accounts: &[Account]) -> Self {
        let input = TransactionInput::from(transaction);
        let types = type_choices();
        let type_index = types
            .iter()
            .position(|c| c.value == input.kind.as_str())
            .unwrap_or(0);
        let mut category_choices = category_choices(categories);
        keep_current(&mut category_choices, transaction.category.as_ref());
        let mut account_choices = account_choices(accounts);
        keep_current(&mut account_choices, transaction.account.as_ref());
        let category_index = index_of(&category_choices, input.category_id);
        let account_index = index_of(&account_choices, input.account_id);
        let mut form = Self::new(
            FormKind::EditTransaction(transaction.id),
            vec![
                FormField::text("Date", input.date.format(DATE_FORMAT).to_string()),
                FormField::choice("Type", types, type_index),
                FormField::text("Amount", format!("{}", input.amount_total)),
                FormField::text("Memo", input.memo.clone().unwrap_or_default()),
                FormField::choice("Category", category_choices, category_index),
                FormField::choice("Account", account_choices, account_index),
            ],
        );
        form.base = Some(input);
        form
    }

    pub fn transaction_filter(
        query: &TransactionQuery,
        categories: &[Category],
        accounts: &[Account],
    ) -> Self {
        let format = |d: Option<NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default();
        let category_choices = category_choices(categories);
        let account_choices = account_choices(accounts);
        let category_index = index_of(&category_choices, query.category_id);
        let account_index = index_of(&account_choices, query.account_id);
        Self::new(
            FormKind::TransactionFilter,
            vec![
                FormField::text("From", format(query.from_date)),
                FormField::text("To", format(query.to_date)),
                FormField::choice("Category", category_choices, category_index),
                FormField::choice("Account", account_choices, account_index),
            ],
        )
    }

    pub fn new_category() -> Self {
        Self::new(FormKind::NewCategory, vec![FormField::text("Name", "")])
    }

    pub fn rename_category(category: &Category) -> Self {
        Self::new(
            FormKind::RenameCategory(category.id),
            vec![FormField::text("Name", category.name.clone())],
        )
    }

    pub fn new_account() -> Self {
        Self::new(
            FormKind::NewAccount,
            vec![
                FormField::text("Name", ""),
                FormField::choice("Type", account_type_choices(), 0),
            ],
        )
    }

    pub fn edit_account(account: &Account) -> Self {
        let types = account_type_choices();
        let selected = types
            .iter()
            .position(|c| c.value == account_type_value(account.kind))
            .unwrap_or(0);
        Self::new(
            FormKind::EditAccount(account.id),
            vec![
                FormField::text("Name", account.name.clone()),
                FormField::choice("Type", types, selected),
            ],
        )
    }

    /// Limit form for a month. With `existing`, the category is fixed to
    /// that row's category.
    pub fn budget_limit(categories: &[Category], existing: Option<&Budget>) -> Self {
        let (choices, selected, limit) = match existing {
            Some(budget) => (
                vec![Choice::of_id(budget.category_id, &budget.category_display())],
                0,
                format!("{}", budget.amount_limit),
            ),
            None => {
                let choices: Vec<Choice> = categories
                    .iter()
                    .filter(|c| c.is_active)
                    .map(|c| Choice::of_id(c.id, &c.name))
                    .collect();
                (choices, 0, String::new())
            }
        };
        Self::new(
            FormKind::BudgetLimit,
            vec![
                FormField::choice("Category", choices, selected),
                FormField::text("Limit", limit),
            ],
        )
    }

    // ===== Editing =====

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if !field.is_choice() && can_add_field_char(field.input.chars().count(), c) {
                field.input.push(c);
                self.error = None;
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if !field.is_choice() {
                field.input.pop();
            }
        }
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            let n = field.choices.len();
            if n > 0 {
                field.selected = if forward {
                    (field.selected + 1) % n
                } else {
                    (field.selected + n - 1) % n
                };
            }
        }
    }

    fn field(&self, label: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.label == label)
    }

    fn text_of(&self, label: &str) -> &str {
        self.field(label).map(FormField::trimmed).unwrap_or("")
    }

    fn choice_of(&self, label: &str) -> Option<&Choice> {
        self.field(label).and_then(FormField::current)
    }

    // ===== Conversion =====

    pub fn to_transaction_input(&self) -> Result<TransactionInput, ValidationError> {
        let date = parse_date("date", self.text_of("Date"))?
            .ok_or_else(|| ValidationError::required("date"))?;
        let kind = match self.choice_of("Type").map(|c| c.value.as_str()) {
            Some("income") => TransactionType::Income,
            Some("transfer") => TransactionType::Transfer,
            _ => TransactionType::Expense,
        };
        let amount = parse_amount("amount_total", self.text_of("Amount"))?;

        let mut input = match &self.base {
            Some(base) => TransactionInput {
                date,
                kind,
                amount_total: amount,
                ..base.clone()
            },
            None => TransactionInput::new(date, kind, amount),
        };
        let memo = self.text_of("Memo");
        input.memo = (!memo.is_empty()).then(|| memo.to_string());
        input.category_id = self.choice_of("Category").and_then(|c| c.id);
        input.account_id = self.choice_of("Account").and_then(|c| c.id);
        input.validate()?;
        Ok(input)
    }

    /// Apply the filter fields to `base`, resetting to the first page.
    pub fn to_transaction_query(&self, base: &TransactionQuery) -> Result<TransactionQuery, ValidationError> {
        let from_date = parse_date("from_date", self.text_of("From"))?;
        let to_date = parse_date("to_date", self.text_of("To"))?;
        if let (Some(from), Some(to)) = (from_date, to_date) {
            if from > to {
                return Err(ValidationError::new("from_date", "must not be after to_date"));
            }
        }
        Ok(TransactionQuery {
            page: 1,
            from_date,
            to_date,
            category_id: self.choice_of("Category").and_then(|c| c.id),
            account_id: self.choice_of("Account").and_then(|c| c.id),
            ..base.clone()
        })
    }

    pub fn to_category_input(&self) -> Result<CategoryInput, ValidationError> {
        let input = CategoryInput::new(self.text_of("Name"));
        input.validate()?;
        Ok(input)
    }

    pub fn to_account_input(&self) -> Result<AccountInput, ValidationError> {
        let kind = match self.choice_of("Type").map(|c| c.value.as_str()) {
            Some("bank") => AccountType::Bank,
            Some("card") => AccountType::Card,
            Some("ic") => AccountType::Ic,
            Some("other") => AccountType::Other,
            Some("cash") => AccountType::Cash,
            _ => return Err(ValidationError::required("type")),
        };
        let input = AccountInput::new(self.text_of("Name"), kind);
        input.validate()?;
        Ok(input)
    }

    pub fn to_budget_input(&self, month: &str) -> Result<BudgetInput, ValidationError> {
        let category_id = self
            .choice_of("Category")
            .and_then(|c| c.id)
            .ok_or_else(|| ValidationError::required("category_id"))?;
        let input = BudgetInput {
            month: month.to_string(),
            category_id,
            amount_limit: parse_amount("amount_limit", self.text_of("Limit"))?,
        };
        input.validate()?;
        Ok(input)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn type_choices() -> Vec<Choice> {
    TransactionType::ALL
        .iter()
        .map(|t| Choice::of_value(t.as_str(), t.label()))
        .collect()
}

fn account_type_value(kind: AccountType) -> &'static str {
    match kind {
        AccountType::Cash => "cash",
        AccountType::Bank => "bank",
        AccountType::Card => "card",
        AccountType::Ic => "ic",
        AccountType::Other => "other",
    }
}

fn account_type_choices() -> Vec<Choice> {
    let mut kind = AccountType::default();
    let mut choices = Vec::new();
    loop {
        choices.push(Choice::of_value(account_type_value(kind), kind.label()));
        kind = kind.next();
        if kind == AccountType::default() {
            break;
        }
    }
    choices
}

fn category_choices(categories: &[Category]) -> Vec<Choice> {
    std::iter::once(Choice::none())
        .chain(
            categories
                .iter()
                .filter(|c| c.is_active)
                .map(|c| Choice::of_id(c.id, &c.name)),
        )
        .collect()
}

fn account_choices(accounts: &[Account]) -> Vec<Choice> {
    std::iter::once(Choice::none())
        .chain(
            accounts
                .iter()
                .filter(|a| a.is_active)
                .map(|a| Choice::of_id(a.id, &a.name)),
        )
        .collect()
}

/// Offer a row's current reference even when it is no longer active.
fn keep_current(choices: &mut Vec<Choice>, current: Option<&NamedRef>) {
    if let Some(named) = current {
        if !choices.iter().any(|c| c.id == Some(named.id)) {
            choices.push(Choice::of_id(named.id, &named.name));
        }
    }
}

fn index_of(choices: &[Choice], id: Option<i64>) -> usize {
    choices.iter().position(|c| c.id == id).unwrap_or(0)
}

fn parse_date(field: &'static str, s: &str) -> Result<Option<NaiveDate>, ValidationError> {
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::new(field, "must be YYYY-MM-DD"))
}

/// Parse an amount, accepting `,` thousands separators and a leading `¥`.
fn parse_amount(field: &'static str, s: &str) -> Result<f64, ValidationError> {
    let cleaned: String = s
        .trim_start_matches('¥')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err(ValidationError::required(field));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| ValidationError::new(field, "must be a number"))
}

/// Check if a character should be accepted into a text field
pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && !c.is_control()
}
