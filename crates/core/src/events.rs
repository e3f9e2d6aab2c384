use crate::models::*;
use serde::{Deserialize, Serialize};

/// A push message received on one of the live WebSocket endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiveMessage {
    Dashboard(DashboardUpdate),
    Account(AccountUpdate),
    /// The server could not produce an update this tick.
    Error { message: String },
}

/// `dashboard_update` envelope from `/ws/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardUpdate {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub margin_calls: Vec<MarginCall>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

/// `account_update` envelope from `/ws/account/{login}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub login: u64,
    #[serde(default)]
    pub realtime: Option<RealtimeAccountSnapshot>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    DashboardUpdate(DashboardUpdate),
    AccountUpdate(AccountUpdate),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

impl LiveMessage {
    /// Parse one text frame.
    ///
    /// Returns `Ok(None)` for well-formed frames of a type this client does
    /// not handle. Error frames carry no `type` field, only `error`.
    pub fn parse(text: &str) -> Result<Option<LiveMessage>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if value.get("type").is_none() {
            if value.get("error").is_some() {
                let err: ErrorEnvelope = serde_json::from_value(value)?;
                return Ok(Some(LiveMessage::Error { message: err.error }));
            }
            return Ok(None);
        }

        match value.get("type").and_then(|t| t.as_str()) {
            Some("dashboard_update") | Some("account_update") => {
                let envelope: Envelope = serde_json::from_value(value)?;
                Ok(Some(match envelope {
                    Envelope::DashboardUpdate(update) => LiveMessage::Dashboard(update),
                    Envelope::AccountUpdate(update) => LiveMessage::Account(update),
                }))
            }
            _ => Ok(None),
        }
    }
}
