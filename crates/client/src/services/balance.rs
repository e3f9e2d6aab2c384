use brokerdesk_core::{
    ApiError, BalanceOperation, BalanceOperationCreate, BalanceOperationStatus,
    BalanceOperationType, DateRange, NetDepositReport, Page,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::http::HttpClient;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BalanceOperationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Serialize)]
struct CreditParams<'a> {
    login: u64,
    amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Serialize)]
struct NetDepositFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct BalanceService {
    http: HttpClient,
}

impl BalanceService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &BalanceQuery) -> Result<Page<BalanceOperation>, ApiError> {
        self.http.get_with("/api/balance", query).await
    }

    /// Submit a balance operation.
    ///
    /// The same `idempotency_key` must be reused when retrying a submit; a
    /// fresh one is generated when none is given.
    pub async fn create(
        &self,
        operation: &BalanceOperationCreate,
        idempotency_key: Option<&str>,
    ) -> Result<BalanceOperation, ApiError> {
        operation.validate()?;
        let key = idempotency_key
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let created: BalanceOperation = self
            .http
            .post_idempotent("/api/balance", operation, &key)
            .await?;
        info!(
            login = created.login,
            operation_id = created.id,
            amount = %created.amount,
            status = created.status.as_str(),
            "Balance operation submitted"
        );
        Ok(created)
    }

    pub async fn deposit(
        &self,
        login: u64,
        amount: Decimal,
        comment: Option<String>,
    ) -> Result<BalanceOperation, ApiError> {
        let operation = BalanceOperationCreate {
            login,
            operation_type: BalanceOperationType::Deposit,
            amount,
            comment,
        };
        self.create(&operation, None).await
    }

    pub async fn withdraw(
        &self,
        login: u64,
        amount: Decimal,
        comment: Option<String>,
    ) -> Result<BalanceOperation, ApiError> {
        let operation = BalanceOperationCreate {
            login,
            operation_type: BalanceOperationType::Withdrawal,
            amount,
            comment,
        };
        self.create(&operation, None).await
    }

    /// Credit in (positive `amount`) or credit out (negative `amount`).
    pub async fn credit(
        &self,
        login: u64,
        amount: Decimal,
        comment: Option<&str>,
    ) -> Result<BalanceOperation, ApiError> {
        if amount.is_zero() {
            return Err(ApiError::Validation("credit amount must not be zero".to_string()));
        }
        let created: BalanceOperation = self
            .http
            .post_query(
                "/api/balance/credit",
                &CreditParams {
                    login,
                    amount,
                    comment,
                },
            )
            .await?;
        info!(login, %amount, "Credit operation submitted");
        Ok(created)
    }

    pub async fn net_deposit(
        &self,
        login: Option<u64>,
        range: DateRange,
    ) -> Result<NetDepositReport, ApiError> {
        range.validate()?;
        let filter = NetDepositFilter {
            login,
            from_date: range.from,
            to_date: range.to,
        };
        self.http
            .get_with("/api/balance/net-deposit", &filter)
            .await
    }
}
