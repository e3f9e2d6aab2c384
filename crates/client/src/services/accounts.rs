use brokerdesk_core::{
    AccountCreate, AccountStatus, ApiError, DailyPnlRecord, DailyReport, DateRange, DealRecord,
    GroupMove, Mt5Account, Mt5Group, Page, PasswordChange, Position, RealtimeAccountSnapshot,
    TradeRecord,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::Ack;
use crate::http::HttpClient;

/// Filters for the account list. Paging is 1-based (`page`, `size`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Serialize)]
struct RealtimeFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
}

#[derive(Serialize)]
struct HistoryFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
}

#[derive(Serialize)]
struct PnlFilter {
    login: u64,
    target_date: NaiveDate,
}

#[derive(Serialize)]
struct PositionFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol_filter: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct AccountsService {
    http: HttpClient,
}

impl AccountsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, query: &AccountQuery) -> Result<Page<Mt5Account>, ApiError> {
        self.http.get_with("/api/accounts", query).await
    }

    /// Open an MT5 account, creating the customer too when only
    /// `customer_name` is given.
    pub async fn create(&self, account: &AccountCreate) -> Result<Mt5Account, ApiError> {
        account.validate()?;
        let created: Mt5Account = self.http.post("/api/accounts", account).await?;
        info!(
            login = created.login,
            customer_id = created.customer_id,
            group = %created.group,
            "MT5 account created"
        );
        Ok(created)
    }

    /// Groups available on the trading server, for account creation and
    /// group moves.
    pub async fn groups(&self) -> Result<Vec<Mt5Group>, ApiError> {
        self.http.get("/api/accounts/groups").await
    }

    pub async fn get(&self, login: u64) -> Result<Mt5Account, ApiError> {
        self.http.get(&format!("/api/accounts/{login}")).await
    }

    /// Live equity snapshots, for one login or for every account
    /// (optionally narrowed by a group pattern such as `real\*`).
    pub async fn realtime(
        &self,
        login: Option<u64>,
        group: Option<&str>,
    ) -> Result<Vec<RealtimeAccountSnapshot>, ApiError> {
        self.http
            .get_with("/api/accounts/realtime", &RealtimeFilter { login, group })
            .await
    }

    pub async fn realtime_for(
        &self,
        login: u64,
    ) -> Result<Option<RealtimeAccountSnapshot>, ApiError> {
        let snapshots = self.realtime(Some(login), None).await?;
        Ok(snapshots.into_iter().find(|s| s.login == login))
    }

    pub async fn daily_reports(
        &self,
        login: Option<u64>,
        range: DateRange,
        group: Option<&str>,
    ) -> Result<Vec<DailyReport>, ApiError> {
        range.validate()?;
        let filter = HistoryFilter {
            login,
            from_date: range.from,
            to_date: range.to,
            group,
        };
        self.http
            .get_with("/api/accounts/daily-reports", &filter)
            .await
    }

    /// Server-side P&L calculation for one account and day.
    pub async fn daily_pnl(
        &self,
        login: u64,
        target_date: NaiveDate,
    ) -> Result<DailyPnlRecord, ApiError> {
        self.http
            .get_with(
                "/api/accounts/daily-pnl",
                &PnlFilter { login, target_date },
            )
            .await
    }

    /// Balance-type deals (deposits, withdrawals, credits, ...).
    pub async fn deals(
        &self,
        login: Option<u64>,
        range: DateRange,
    ) -> Result<Vec<DealRecord>, ApiError> {
        range.validate()?;
        let filter = HistoryFilter {
            login,
            from_date: range.from,
            to_date: range.to,
            group: None,
        };
        self.http
            .get_with("/api/accounts/history/deals", &filter)
            .await
    }

    /// Closed trades. The server defaults to the last 30 days when the
    /// range is open.
    pub async fn trade_history(
        &self,
        login: u64,
        range: DateRange,
    ) -> Result<Vec<TradeRecord>, ApiError> {
        range.validate()?;
        let filter = HistoryFilter {
            login: None,
            from_date: range.from,
            to_date: range.to,
            group: None,
        };
        self.http
            .get_with(&format!("/api/accounts/{login}/trade-history"), &filter)
            .await
    }

    pub async fn positions(
        &self,
        login: u64,
        symbol: Option<&str>,
    ) -> Result<Vec<Position>, ApiError> {
        self.http
            .get_with(
                &format!("/api/accounts/positions/account/{login}"),
                &PositionFilter {
                    symbol_filter: symbol,
                },
            )
            .await
    }

    pub async fn move_group(&self, login: u64, request: &GroupMove) -> Result<String, ApiError> {
        request.validate()?;
        let ack: Ack = self
            .http
            .put(&format!("/api/accounts/{login}/group"), request)
            .await?;
        info!(login, new_group = %request.new_group, "Account moved");
        Ok(ack.message)
    }

    pub async fn change_password(
        &self,
        login: u64,
        request: &PasswordChange,
    ) -> Result<String, ApiError> {
        request.validate()?;
        let ack: Ack = self
            .http
            .put(&format!("/api/accounts/{login}/password"), request)
            .await?;
        info!(login, "Trading password changed");
        Ok(ack.message)
    }

    pub async fn change_investor_password(
        &self,
        login: u64,
        request: &PasswordChange,
    ) -> Result<String, ApiError> {
        request.validate()?;
        let ack: Ack = self
            .http
            .put(&format!("/api/accounts/{login}/investor-password"), request)
            .await?;
        info!(login, "Investor password changed");
        Ok(ack.message)
    }
}
