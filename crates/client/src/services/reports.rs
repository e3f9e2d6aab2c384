use brokerdesk_core::{ApiError, DailyPnlReport, DateRange};
use chrono::NaiveDate;
use serde::Serialize;

use crate::http::HttpClient;

#[derive(Serialize)]
struct RangeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
}

#[derive(Serialize)]
struct LatestFilter {
    days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
}

/// Stored daily P&L rows.
#[derive(Debug, Clone)]
pub struct ReportsService {
    http: HttpClient,
}

impl ReportsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn daily_pnl(
        &self,
        range: DateRange,
        login: Option<u64>,
    ) -> Result<DailyPnlReport, ApiError> {
        range.validate()?;
        let filter = RangeFilter {
            from_date: range.from,
            to_date: range.to,
            login,
        };
        self.http.get_with("/api/reports/daily-pnl", &filter).await
    }

    /// The last `days` days (1..=365).
    pub async fn latest_daily_pnl(
        &self,
        days: u32,
        login: Option<u64>,
    ) -> Result<DailyPnlReport, ApiError> {
        if !(1..=365).contains(&days) {
            return Err(ApiError::Validation(format!(
                "days must be between 1 and 365, got {days}"
            )));
        }
        self.http
            .get_with("/api/reports/daily-pnl/latest", &LatestFilter { days, login })
            .await
    }
}
