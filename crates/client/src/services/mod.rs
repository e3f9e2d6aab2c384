//! One service per backend resource. Each wraps the shared [`HttpClient`]
//! and validates request payloads before anything goes on the wire.
//!
//! [`HttpClient`]: crate::http::HttpClient

pub mod accounts;
pub mod agents;
pub mod audit;
pub mod auth;
pub mod balance;
pub mod customers;
pub mod health;
pub mod positions;
pub mod reports;
pub mod users;

pub use accounts::{AccountQuery, AccountsService};
pub use agents::{AgentQuery, AgentsService};
pub use audit::{AuditQuery, AuditService};
pub use auth::AuthService;
pub use balance::{BalanceQuery, BalanceService};
pub use customers::{CustomerQuery, CustomersService};
pub use health::HealthService;
pub use positions::PositionsService;
pub use reports::ReportsService;
pub use users::{UserQuery, UsersService};

use serde::Deserialize;

/// `{"message": "..."}` acknowledgement returned by command endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: String,
}

