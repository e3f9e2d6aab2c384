//! REST client for the brokerdesk CRM backend.
//!
//! [`CrmClient`] bundles one service per resource over a shared
//! [`HttpClient`], so logging in through `auth()` authenticates every other
//! service.

pub mod config;
pub mod http;
pub mod services;

pub use config::ClientConfig;
pub use http::HttpClient;
pub use services::*;

use brokerdesk_core::ApiError;

#[derive(Debug, Clone)]
pub struct CrmClient {
    config: ClientConfig,
    http: HttpClient,
    auth: AuthService,
    customers: CustomersService,
    accounts: AccountsService,
    agents: AgentsService,
    balance: BalanceService,
    audit: AuditService,
    reports: ReportsService,
    positions: PositionsService,
    health: HealthService,
    users: UsersService,
}

impl CrmClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let http = HttpClient::new(&config)?;
        Ok(Self {
            auth: AuthService::new(http.clone()),
            customers: CustomersService::new(http.clone()),
            accounts: AccountsService::new(http.clone()),
            agents: AgentsService::new(http.clone()),
            balance: BalanceService::new(http.clone()),
            audit: AuditService::new(http.clone()),
            reports: ReportsService::new(http.clone()),
            positions: PositionsService::new(http.clone()),
            health: HealthService::new(http.clone()),
            users: UsersService::new(http.clone()),
            http,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn customers(&self) -> &CustomersService {
        &self.customers
    }

    pub fn accounts(&self) -> &AccountsService {
        &self.accounts
    }

    pub fn agents(&self) -> &AgentsService {
        &self.agents
    }

    pub fn balance(&self) -> &BalanceService {
        &self.balance
    }

    pub fn audit(&self) -> &AuditService {
        &self.audit
    }

    pub fn reports(&self) -> &ReportsService {
        &self.reports
    }

    pub fn positions(&self) -> &PositionsService {
        &self.positions
    }

    pub fn health(&self) -> &HealthService {
        &self.health
    }

    pub fn users(&self) -> &UsersService {
        &self.users
    }
}
