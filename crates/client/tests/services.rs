use brokerdesk_client::{ClientConfig, CrmClient, CustomerQuery, UserQuery};
use brokerdesk_core::{
    ApiError, BalanceOperationCreate, BalanceOperationType, CustomerCreate, DateRange,
    PositionSide, UserCreate, UserRole, UserUpdate,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> CrmClient {
    CrmClient::new(ClientConfig::new(server.uri())).unwrap()
}

fn customer_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "email": null,
        "phone": null,
        "address": null,
        "agent_id": 3,
        "tags": ["vip"],
        "meta_data": null,
        "external_ids": null,
        "created_at": "2025-10-01T09:00:00",
        "updated_at": "2025-10-02T10:30:00Z"
    })
}

fn operation_json(id: i64, kind: &str, amount: f64) -> serde_json::Value {
    json!({
        "id": id,
        "account_id": 12,
        "login": 350001,
        "type": kind,
        "amount": amount,
        "comment": "DT-100",
        "status": "completed",
        "requested_by": 1,
        "approved_by": null,
        "error_message": null,
        "created_at": "2025-10-31T08:00:00",
        "updated_at": "2025-10-31T08:00:01"
    })
}

#[tokio::test]
async fn test_login_token_is_sent_on_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ops@broker.test", "password": "s3cret-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers/7"))
        .and(bearer_token("access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_json(7, "Acme Ltd")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(!client.auth().is_authenticated().await);

    let tokens = client
        .auth()
        .login("ops@broker.test", "s3cret-pass")
        .await
        .unwrap();
    assert_eq!(tokens.refresh_token, "refresh-1");
    assert!(client.auth().is_authenticated().await);

    let customer = client.customers().get(7).await.unwrap();
    assert_eq!(customer.name, "Acme Ltd");
    assert!(customer.mt5_accounts.is_empty());
}

#[tokio::test]
async fn test_customer_list_query_and_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(query_param("search", "acme"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [customer_json(1, "Acme Ltd"), customer_json(2, "Acme Two")],
            "total": 22,
            "skip": 20,
            "limit": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let page = client
        .customers()
        .list(&CustomerQuery {
            search: Some("acme".to_string()),
            skip: Some(20),
            limit: Some(10),
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 22);
    assert_eq!(page.pages(), 3);
}

#[tokio::test]
async fn test_invalid_payload_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .customers()
        .create(&CustomerCreate {
            name: "   ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = client
        .balance()
        .credit(350001, dec!(0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Account not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents/1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let err = client.accounts().get(999).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound("Account not found".to_string()));

    let err = client.agents().get(1).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, ApiError::Http { status: 503, .. }));

    let err = client.health().check().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_balance_operation_carries_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/balance"))
        .and(header("Idempotency-Key", "op-42"))
        .and(body_json(json!({
            "login": 350001,
            "type": "deposit",
            "amount": 250.5,
            "comment": "DT-100"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(operation_json(42, "deposit", 250.5)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let op = client
        .balance()
        .create(
            &BalanceOperationCreate {
                login: 350001,
                operation_type: BalanceOperationType::Deposit,
                amount: dec!(250.5),
                comment: Some("DT-100".to_string()),
            },
            Some("op-42"),
        )
        .await
        .unwrap();
    assert_eq!(op.id, 42);
    assert_eq!(op.amount, dec!(250.5));
}

#[tokio::test]
async fn test_credit_uses_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/balance/credit"))
        .and(query_param("login", "350001"))
        .and(query_param("amount", "-75"))
        .and(query_param("comment", "credit out"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(operation_json(43, "credit_out", 75.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let op = client
        .balance()
        .credit(350001, dec!(-75), Some("credit out"))
        .await
        .unwrap();
    assert_eq!(op.operation_type, BalanceOperationType::CreditOut);
}

#[tokio::test]
async fn test_open_positions_envelope_and_reports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/positions/open"))
        .and(query_param("login", "350001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "positions": [
                {"ticket": 1, "login": 350001, "symbol": "EURUSD", "volume": 0.5,
                 "action": 1, "type": "sell", "profit": -12.5}
            ],
            "total": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/daily-pnl"))
        .and(query_param("from_date", "2025-10-01"))
        .and(query_param("to_date", "2025-10-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "from_date": "2025-10-01",
            "to_date": "2025-10-31",
            "login": null,
            "count": 1,
            "records": [{"day": "2025-10-31", "login": 350001, "net_deposit": 100,
                         "equity_pnl": 42.5, "net_pnl": 40}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let positions = client.positions().open(Some(350001), None).await.unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].profit, dec!(-12.5));
    assert_eq!(positions[0].side, PositionSide::Sell);

    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
    );
    let report = client.reports().daily_pnl(range, None).await.unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.records[0].date, "2025-10-31");
    assert_eq!(report.records[0].equity_pnl, dec!(42.5));

    let backwards = DateRange::new(range.to.unwrap(), range.from.unwrap());
    assert!(client.reports().daily_pnl(backwards, None).await.is_err());
}

fn user_json(id: i64, email: &str, role: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": email,
        "full_name": null,
        "role": role,
        "is_active": true,
        "created_at": "2025-09-01T12:00:00"
    })
}

#[tokio::test]
async fn test_user_administration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("search", "desk"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "users": [user_json(4, "dealer@desk.io", "dealer")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(body_json(json!({
            "email": "support@desk.io",
            "password": "s3cure-pass",
            "role": "support",
            "is_active": true
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(user_json(5, "support@desk.io", "support")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/5"))
        .and(body_json(json!({"is_active": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "email": "support@desk.io",
            "full_name": null,
            "role": "support",
            "is_active": false,
            "updated_at": "2025-10-31T09:15:00"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Cannot delete your own account"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let list = client
        .users()
        .list(&UserQuery {
            search: Some("desk".to_string()),
            limit: Some(20),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.users[0].role, UserRole::Dealer);

    let created = client
        .users()
        .create(&UserCreate {
            email: "support@desk.io".to_string(),
            password: "s3cure-pass".to_string(),
            role: UserRole::Support,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 5);

    let updated = client
        .users()
        .update(
            5,
            &UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert!(updated.updated_at.is_some());

    // Empty updates are refused locally.
    let err = client
        .users()
        .update(5, &UserUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    client.users().delete(5).await.unwrap();
    let err = client.users().delete(1).await.unwrap_err();
    assert!(err.to_string().contains("Cannot delete your own account"));
}

#[tokio::test]
async fn test_groups_and_trade_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "demo\\standard", "server": null, "currency": null, "company": null},
            {"name": "real\\pro"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/350001/trade-history"))
        .and(query_param("from_date", "2025-10-01"))
        .and(query_param("to_date", "2025-10-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"deal_id": 901, "position_id": 77, "login": 350001, "symbol": "XAUUSD",
             "action": "BUY", "volume": 0.2, "price": 2650.4, "profit": 88.0,
             "commission": -2.0, "swap": 0, "timestamp": 1761900000,
             "datetime": "2025-10-31 08:40:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let groups = client.accounts().groups().await.unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["demo\\standard", "real\\pro"]);
    assert!(groups[1].currency.is_none());

    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
    );
    let trades = client
        .accounts()
        .trade_history(350001, range)
        .await
        .unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Some(PositionSide::Buy));
    assert_eq!(trades[0].net_profit(), dec!(86));

    let backwards = DateRange::new(range.to.unwrap(), range.from.unwrap());
    assert!(client
        .accounts()
        .trade_history(350001, backwards)
        .await
        .is_err());
}

#[tokio::test]
async fn test_audit_statistics_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/audit/statistics"))
        .and(query_param("days", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "period_days": 30,
            "start_date": "2025-10-01T00:00:00",
            "end_date": "2025-10-31T00:00:00",
            "action_counts": {"balance_operation": 12, "login": 40},
            "user_activity": {"1": 50, "3": 2},
            "entity_types": {"mt5_account": 14},
            "total_logs": 52
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let stats = client.audit().statistics(30).await.unwrap();
    assert_eq!(stats.total_logs, 52);
    assert_eq!(stats.action_counts["login"], 40);
    assert_eq!(stats.busiest_actors()[0], ("1", 50));

    for days in [0, 91] {
        let err = client.audit().statistics(days).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
