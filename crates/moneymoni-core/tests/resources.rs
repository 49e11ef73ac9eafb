//! Integration tests for resource endpoints against a mock backend.

mod common;

use chrono::NaiveDate;
use common::{api_url, detail, mount_categories, transaction_json};
use moneymoni_core::dashboard::fetch_dashboard;
use moneymoni_core::models::{
    AccountInput, AccountType, BudgetInput, CategoryInput, DateRange, TransactionInput,
    TransactionQuery, TransactionType, TrendGrouping, TrendQuery,
};
use moneymoni_core::{ApiClient, ApiError, Navigator, Route};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&api_url(server)).unwrap()
}

#[tokio::test]
async fn test_deleted_category_disappears_from_list() {
    let server = MockServer::start().await;
    let store = mount_categories(&server).await;
    let api = client(&server);

    for name in ["Food", "Rent", "Travel"] {
        api.create_category(&CategoryInput::new(name)).await.unwrap();
    }
    assert_eq!(api.list_categories().await.unwrap().len(), 3);

    let rent = api
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Rent")
        .unwrap();
    api.delete_category(rent.id).await.unwrap();

    let remaining = api.list_categories().await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|c| c.name != "Rent"));
    assert_eq!(store.len(), 2);

    // Deleting again is a 404 carrying the backend's message
    let err = api.delete_category(rent.id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NotFound(d)) if d == "Category not found"
    ));
}

#[tokio::test]
async fn test_unauthorized_redirects_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/accounts/"))
        .respond_with(detail(401, "Not authenticated"))
        .mount(&server)
        .await;

    let navigator = Navigator::new(Route::Accounts);
    let api = client(&server).with_navigator(navigator.clone());

    let err = api.list_accounts().await.unwrap_err();
    assert!(err.downcast_ref::<ApiError>().is_some_and(ApiError::is_unauthorized));
    assert_eq!(navigator.current(), Route::Login);
}

#[tokio::test]
async fn test_other_errors_do_not_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/accounts/"))
        .respond_with(detail(500, "Failed to get accounts"))
        .mount(&server)
        .await;

    let navigator = Navigator::new(Route::Accounts);
    let api = client(&server).with_navigator(navigator.clone());

    let err = api.list_accounts().await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::ServerError(_))));
    assert_eq!(navigator.current(), Route::Accounts);
}

#[tokio::test]
async fn test_list_transactions_sends_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(query_param("page", "2"))
        .and(query_param("size", "50"))
        .and(query_param("q", "coffee"))
        .and(query_param("from_date", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [transaction_json(7, "2024-03-04", "expense", 480.0)],
            "total": 51,
            "page": 2,
            "size": 50,
            "pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = TransactionQuery {
        page: 2,
        q: Some("coffee".into()),
        from_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        ..TransactionQuery::default()
    };
    let page = client(&server).list_transactions(&query).await.unwrap();

    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].account_name(), "Wallet");
    assert_eq!(page.transactions[0].split_ratio_payer, Some(0.5));
    assert!(page.has_prev());
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_create_transaction_body() {
    let server = MockServer::start().await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/transactions/"))
        .and(body_json(json!({
            "date": "2024-03-05",
            "type": "expense",
            "amount_total": 1500.0,
            "memo": "Lunch"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Transaction created successfully",
            "id": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut input = TransactionInput::new(date, TransactionType::Expense, 1500.0);
    input.memo = Some("Lunch".into());
    let ack = client(&server).create_transaction(&input).await.unwrap();
    assert_eq!(ack.id, Some(42));
}

#[tokio::test]
async fn test_invalid_transaction_never_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/transactions/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let input = TransactionInput::new(date, TransactionType::Expense, 0.0);
    let err = client(&server).create_transaction(&input).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Validation(_))));
}

#[tokio::test]
async fn test_create_account() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/accounts/"))
        .and(body_json(json!({ "name": "Suica", "type": "ic", "is_active": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Account created successfully",
            "id": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client(&server)
        .create_account(&AccountInput::new("Suica", AccountType::Ic))
        .await
        .unwrap();
    assert_eq!(ack.id, Some(3));
}

#[tokio::test]
async fn test_budgets_month_and_bulk_update() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/budgets/"))
        .and(query_param("month", "202403"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "budgets": [{
                "id": 1,
                "category_id": 2,
                "category_name": "Food",
                "month": "202403",
                "amount_limit": 40000,
                "amount_spent": 38000,
                "amount_remaining": 2000,
                "percentage": 95.0
            }],
            "month": "202403"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/budgets/"))
        .and(body_json(json!([{ "month": "202403", "category_id": 2, "amount_limit": 50000.0 }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Budgets updated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let list = api.list_budgets("202403").await.unwrap();
    assert_eq!(list.budgets.len(), 1);

    let mut input = BudgetInput::from(&list.budgets[0]);
    input.amount_limit = 50000.0;
    api.update_budgets(&[input]).await.unwrap();
}

#[tokio::test]
async fn test_dashboard_combines_transactions_and_budgets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(query_param("from_date", "2024-03-01"))
        .and(query_param("to_date", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                transaction_json(1, "2024-03-01", "income", 250000.0),
                transaction_json(2, "2024-03-03", "expense", 1200.0),
                transaction_json(3, "2024-03-09", "expense", 3300.0)
            ],
            "total": 3,
            "page": 1,
            "size": 100,
            "pages": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/budgets/"))
        .and(query_param("month", "202403"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "budgets": [], "month": "202403" })))
        .mount(&server)
        .await;

    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let data = fetch_dashboard(&client(&server), today).await.unwrap();

    assert_eq!(data.month, "202403");
    assert_eq!(data.stats.income, 250000.0);
    assert_eq!(data.stats.expense, 4500.0);
    assert_eq!(data.stats.transaction_count, 3);
    assert_eq!(data.stats.recent[0].id, 3);
    assert!(data.budgets.is_empty());
}

#[tokio::test]
async fn test_dashboard_sums_every_page_of_the_month() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                transaction_json(1, "2024-03-01", "income", 300000.0),
                transaction_json(2, "2024-03-02", "expense", 100.0)
            ],
            "total": 3,
            "page": 1,
            "size": 2,
            "pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [transaction_json(3, "2024-03-20", "expense", 50.0)],
            "total": 3,
            "page": 2,
            "size": 2,
            "pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/budgets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "budgets": [], "month": "202403" })))
        .mount(&server)
        .await;

    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let data = fetch_dashboard(&client(&server), today).await.unwrap();

    assert_eq!(data.stats.income, 300000.0);
    assert_eq!(data.stats.expense, 150.0);
    assert_eq!(data.stats.transaction_count, 3);
    assert_eq!(data.stats.recent[0].id, 3);
}

#[tokio::test]
async fn test_update_transaction_sends_split_as_percent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(transaction_json(5, "2024-03-14", "expense", 1280.0)),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/transactions/5"))
        .and(body_json(json!({
            "date": "2024-03-14",
            "type": "expense",
            "amount_total": 1280.0,
            "account_id": 1,
            "category_id": 2,
            "split_ratio_payer": 50.0,
            "memo": "dinner"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Transaction updated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let existing = api.get_transaction(5).await.unwrap();
    assert_eq!(existing.split_ratio_payer, Some(0.5));

    let mut input = TransactionInput::from(&existing);
    input.memo = Some("dinner".into());
    api.update_transaction(5, &input).await.unwrap();
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/transactions/99"))
        .respond_with(detail(404, "Transaction not found"))
        .mount(&server)
        .await;

    let err = client(&server).get_transaction(99).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NotFound(msg)) if msg == "Transaction not found"
    ));
}

#[tokio::test]
async fn test_csv_import_dry_run_and_export() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/files/imports/transactions/csv"))
        .and(query_param("dry_run", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "march.csv",
            "dry_run": true,
            "imported": 0,
            "errors": [],
            "total_rows": 12,
            "valid_rows": 12,
            "error_rows": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/files/exports/transactions/csv"))
        .and(query_param("from_date", "2024-03-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string("date,type,amount\n2024-03-01,expense,100\n"),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    let result = api
        .import_transactions_csv("march.csv", b"date,type,amount\n".to_vec(), true)
        .await
        .unwrap();
    assert!(result.dry_run);
    assert_eq!(result.total_rows, Some(12));

    let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 3, 1), None);
    let csv = api.export_transactions_csv(&range).await.unwrap();
    assert!(csv.starts_with("date,type,amount"));
}

#[tokio::test]
async fn test_health_is_served_outside_api_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "status": "unhealthy",
            "timestamp": 1710000000.0,
            "error": "database is locked"
        })))
        .mount(&server)
        .await;

    let health = client(&server).health().await.unwrap();
    assert!(!health.is_healthy());
    assert_eq!(health.error.as_deref(), Some("database is locked"));
}

#[tokio::test]
async fn test_reports_pass_month_and_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/monthly"))
        .and(query_param("month", "202403"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "month": "202403",
            "total_income": 300000,
            "total_expenses": 120000,
            "categories": [{"name": "Food", "amount": 80000}],
            "budget_status": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/reports/trend"))
        .and(query_param("from_date", "2024-03-01"))
        .and(query_param("to_date", "2024-03-31"))
        .and(query_param("group_by", "week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "from_date": "2024-03-01",
            "to_date": "2024-03-31",
            "group_by": "week",
            "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/reports/split"))
        .and(query_param("from_date", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"name": "A", "paid": 70000}, {"name": "B", "paid": 50000}],
            "total_expenses": 120000
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let monthly = api.monthly_report("202403").await.unwrap();
    assert_eq!(monthly.net(), 180000.0);
    assert_eq!(monthly.categories.len(), 1);

    let from = NaiveDate::from_ymd_opt(2024, 3, 1);
    let to = NaiveDate::from_ymd_opt(2024, 3, 31);
    let trend = api
        .trend_report(&TrendQuery {
            from_date: from,
            to_date: to,
            group_by: TrendGrouping::Week,
        })
        .await
        .unwrap();
    assert_eq!(trend.group_by.as_deref(), Some("week"));

    let split = api.split_report(&DateRange::new(from, to)).await.unwrap();
    assert_eq!(split.users.len(), 2);
    assert_eq!(split.total_expenses, Some(120000.0));
}

#[tokio::test]
async fn test_upload_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/transactions/7/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Receipt uploaded",
            "id": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client(&server)
        .upload_receipt(7, "receipt.png", vec![0x89, 0x50, 0x4e, 0x47])
        .await
        .unwrap();
    assert_eq!(ack.message, "Receipt uploaded");
    assert_eq!(ack.id, Some(7));
}
