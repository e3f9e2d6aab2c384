use brokerdesk_core::{ApiError, Position};
use serde::{Deserialize, Serialize};

use crate::http::HttpClient;

#[derive(Serialize)]
struct OpenFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
}

#[derive(Deserialize)]
struct OpenPositions {
    #[serde(default)]
    positions: Vec<Position>,
}

#[derive(Debug, Clone)]
pub struct PositionsService {
    http: HttpClient,
}

impl PositionsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Open positions across the book, optionally for one login or symbol.
    pub async fn open(
        &self,
        login: Option<u64>,
        symbol: Option<&str>,
    ) -> Result<Vec<Position>, ApiError> {
        let response: OpenPositions = self
            .http
            .get_with("/api/positions/open", &OpenFilter { login, symbol })
            .await?;
        Ok(response.positions)
    }
}
