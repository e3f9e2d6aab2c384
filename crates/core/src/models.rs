use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::traits::ApiError;
use crate::wire::{decimal_or_zero, flexible_datetime, optional_datetime, string_or_empty};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A page of records as returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    /// Total number of pages at the current page size.
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Agents & Customers
// ---------------------------------------------------------------------------

/// A sales agent (introducing broker) that customers can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(deserialize_with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub agent_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub meta_data: Option<HashMap<String, serde_json::Value>>,
    pub external_ids: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub mt5_accounts: Vec<Mt5Account>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MT5 Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Disabled,
    Archived,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Disabled => "disabled",
            AccountStatus::Archived => "archived",
        }
    }
}

/// A MetaTrader 5 trading account owned by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mt5Account {
    pub id: i64,
    pub customer_id: i64,
    pub login: u64,
    pub group: String,
    #[serde(default)]
    pub leverage: u32,
    #[serde(default)]
    pub currency: String,
    pub status: AccountStatus,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub balance: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub credit: Decimal,
    pub external_ids: Option<HashMap<String, serde_json::Value>>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Live equity/margin figures for one account, as streamed by the MT5 bridge.
///
/// Every field is optional on the wire: the account WebSocket omits the
/// identifying fields and the bridge reports `null` for figures it could not
/// read. Missing values are zero / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeAccountSnapshot {
    #[serde(default)]
    pub login: u64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub balance: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub credit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub equity: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub net_equity: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_free: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_level: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub floating_profit: Decimal,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub group: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub currency: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// End-of-day snapshot produced by the MT5 server for one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub login: u64,
    pub date: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub balance: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub credit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub equity_prev_day: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_free: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_level: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub floating_profit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub present_equity: Decimal,
    /// IB commissions booked on this day.
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub daily_agent: Decimal,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub group: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub currency: String,
}

/// A trading group on the MT5 server. Only `name` is always known; the
/// bridge derives the catalogue from the groups accounts are in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mt5Group {
    pub name: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Direction of an open position.
///
/// The bridge reports it either as the MT5 action code (`0` buy, `1` sell) or
/// as a `"buy"` / `"sell"` string depending on the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    #[default]
    Buy,
    Sell,
}

impl<'de> Deserialize<'de> for PositionSide {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(0) => Ok(PositionSide::Buy),
            Raw::Code(1) => Ok(PositionSide::Sell),
            Raw::Code(other) => Err(serde::de::Error::custom(format!(
                "unknown position action code: {other}"
            ))),
            Raw::Name(name) => match name.to_ascii_lowercase().as_str() {
                "buy" | "long" => Ok(PositionSide::Buy),
                "sell" | "short" => Ok(PositionSide::Sell),
                _ => Err(serde::de::Error::custom(format!(
                    "unknown position side: {name}"
                ))),
            },
        }
    }
}

/// An open position.
///
/// The side arrives as `type`, as `action`, or as both (REST sends the code
/// and the name side by side). `type` wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PositionWire")]
pub struct Position {
    pub ticket: u64,
    pub login: u64,
    pub symbol: String,
    pub volume: Decimal,
    #[serde(rename = "type")]
    pub side: PositionSide,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub profit: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
}

#[derive(Deserialize)]
struct PositionWire {
    ticket: u64,
    #[serde(default)]
    login: u64,
    #[serde(default, deserialize_with = "string_or_empty")]
    symbol: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    volume: Decimal,
    #[serde(rename = "type", default)]
    side_name: Option<PositionSide>,
    #[serde(rename = "action", default)]
    side_code: Option<PositionSide>,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    price_open: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    price_current: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    profit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    swap: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    commission: Decimal,
}

impl From<PositionWire> for Position {
    fn from(wire: PositionWire) -> Self {
        Self {
            ticket: wire.ticket,
            login: wire.login,
            symbol: wire.symbol,
            volume: wire.volume,
            side: wire.side_name.or(wire.side_code).unwrap_or_default(),
            price_open: wire.price_open,
            price_current: wire.price_current,
            profit: wire.profit,
            swap: wire.swap,
            commission: wire.commission,
        }
    }
}

/// Positions netted per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetPosition {
    pub symbol: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub buy_volume: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub sell_volume: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub net_volume: Decimal,
    #[serde(default, alias = "total_profit", deserialize_with = "decimal_or_zero")]
    pub net_profit: Decimal,
    #[serde(default)]
    pub positions_count: usize,
}

/// Positions of one account inside a customer positions report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPositions {
    pub login: u64,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub positions_count: usize,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_volume: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_profit: Decimal,
    #[serde(default)]
    pub positions: Vec<Position>,
}

/// All positions of a customer across their accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPositions {
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub accounts: Vec<AccountPositions>,
    #[serde(default)]
    pub net_positions: Vec<NetPosition>,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_volume: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_profit: Decimal,
    #[serde(default)]
    pub positions_count: usize,
}

/// A closed trade: the exit deal of a position from the MT5 history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub deal_id: u64,
    #[serde(default)]
    pub position_id: u64,
    #[serde(default)]
    pub login: u64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub symbol: String,
    /// `None` when the bridge reports a non-market action (`"UNKNOWN"`).
    #[serde(rename = "action", default, deserialize_with = "trade_side")]
    pub side: Option<PositionSide>,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub volume: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub profit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub commission: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub swap: Decimal,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub datetime: String,
}

impl TradeRecord {
    /// Profit after commission and swap.
    pub fn net_profit(&self) -> Decimal {
        self.profit + self.commission + self.swap
    }
}

fn trade_side<'de, D>(deserializer: D) -> Result<Option<PositionSide>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| PositionSide::deserialize(value).ok()))
}

// ---------------------------------------------------------------------------
// Balance operations & deals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceOperationType {
    Deposit,
    Withdrawal,
    CreditIn,
    CreditOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceOperationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Failed,
}

impl BalanceOperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceOperationStatus::Pending => "pending",
            BalanceOperationStatus::Approved => "approved",
            BalanceOperationStatus::Rejected => "rejected",
            BalanceOperationStatus::Completed => "completed",
            BalanceOperationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOperation {
    pub id: i64,
    pub account_id: i64,
    pub login: u64,
    #[serde(rename = "type")]
    pub operation_type: BalanceOperationType,
    pub amount: Decimal,
    pub comment: Option<String>,
    pub status: BalanceOperationStatus,
    pub requested_by: i64,
    pub approved_by: Option<i64>,
    pub error_message: Option<String>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MT5 deal action for balance-type deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealAction {
    Deposit,
    Withdrawal,
    Credit,
    CreditOut,
    Charge,
    Correction,
    #[serde(other)]
    Unknown,
}

/// Classification of a balance deal derived from its comment prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealTag {
    Deposit,
    Withdrawal,
    Rebate,
    Promotion,
}

impl DealTag {
    /// Classify a deal: `DT`, `WT`, `REB` and `PRO` comment prefixes win
    /// (case-insensitive); otherwise balance, charge and correction deals
    /// count as promotions and credit deals stay untagged.
    pub fn classify(action: DealAction, comment: &str) -> Option<DealTag> {
        let comment = comment.trim_start().to_ascii_uppercase();
        if comment.starts_with("DT") {
            Some(DealTag::Deposit)
        } else if comment.starts_with("WT") {
            Some(DealTag::Withdrawal)
        } else if comment.starts_with("REB") {
            Some(DealTag::Rebate)
        } else if comment.starts_with("PRO") {
            Some(DealTag::Promotion)
        } else {
            match action {
                DealAction::Deposit
                | DealAction::Withdrawal
                | DealAction::Charge
                | DealAction::Correction => Some(DealTag::Promotion),
                DealAction::Credit | DealAction::CreditOut | DealAction::Unknown => None,
            }
        }
    }
}

fn deal_tag<'de, D>(deserializer: D) -> Result<Option<DealTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(match raw.as_str() {
        "Deposit" => Some(DealTag::Deposit),
        "Withdrawal" => Some(DealTag::Withdrawal),
        "Rebate" => Some(DealTag::Rebate),
        "Promotion" => Some(DealTag::Promotion),
        _ => None,
    })
}

/// A balance-type deal (deposit, withdrawal, credit, ...) from the MT5 history.
///
/// Withdrawals and credit-outs carry negative amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    pub deal_id: u64,
    pub login: u64,
    pub action: DealAction,
    #[serde(deserialize_with = "decimal_or_zero")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub balance_after: Decimal,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub comment: String,
    pub timestamp: i64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub datetime_str: String,
    #[serde(default, deserialize_with = "deal_tag")]
    pub tag: Option<DealTag>,
}

impl DealRecord {
    /// The tag reported by the server, or one derived from the comment.
    pub fn effective_tag(&self) -> Option<DealTag> {
        self.tag.or_else(|| DealTag::classify(self.action, &self.comment))
    }
}

/// One deposit or withdrawal line of a net deposit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositTransaction {
    pub deal_id: u64,
    pub login: u64,
    pub action: DealAction,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub balance_after: Decimal,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub comment: String,
    /// `deposit` for DT/WT tagged lines, `promotion` otherwise.
    pub tag: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub datetime: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetDepositSummary {
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub net_deposit: Decimal,
    pub deposits_tagged: Decimal,
    pub deposits_promotion: Decimal,
    pub withdrawals_tagged: Decimal,
    pub withdrawals_promotion: Decimal,
    pub net_deposit_tagged: Decimal,
    pub net_promotion: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionGroup {
    pub count: usize,
    pub total: Decimal,
    pub transactions: Vec<DepositTransaction>,
}

/// Net deposit report for a login (or all logins) over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetDepositReport {
    pub login: Option<u64>,
    pub from_date: String,
    pub to_date: String,
    pub summary: NetDepositSummary,
    pub deposits: TransactionGroup,
    pub withdrawals: TransactionGroup,
}

// ---------------------------------------------------------------------------
// P&L
// ---------------------------------------------------------------------------

/// Daily profit and loss of one account (login 0 for institution totals).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPnlRecord {
    pub login: u64,
    #[serde(alias = "day")]
    pub date: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub present_equity: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub equity_prev_day: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub deposit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub withdrawal: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub net_deposit: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub promotion: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub net_credit_promotion: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_ib: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub rebate: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub equity_pnl: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub net_pnl: Decimal,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub group: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub currency: String,
}

/// Stored daily P&L rows for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnlReport {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    pub login: Option<u64>,
    pub count: usize,
    pub records: Vec<DailyPnlRecord>,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    BalanceOperation,
    PasswordReset,
    GroupMove,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::BalanceOperation => "balance_operation",
            AuditAction::PasswordReset => "password_reset",
            AuditAction::GroupMove => "group_move",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_id: i64,
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Audit activity over the last `period_days` days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub period_days: u32,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "count_map")]
    pub action_counts: BTreeMap<String, u64>,
    /// Keyed by actor id.
    #[serde(default, deserialize_with = "count_map")]
    pub user_activity: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "count_map")]
    pub entity_types: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_logs: u64,
}

impl AuditStatistics {
    /// Actors ordered by number of logged actions, busiest first.
    pub fn busiest_actors(&self) -> Vec<(&str, u64)> {
        let mut actors: Vec<(&str, u64)> = self
            .user_activity
            .iter()
            .map(|(actor, count)| (actor.as_str(), *count))
            .collect();
        actors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        actors
    }
}

/// A `{"key": count}` object. Anything else (or non-integer counts) reads
/// as empty.
fn count_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(key, count)| count.as_u64().map(|n| (key, n)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

// ---------------------------------------------------------------------------
// Staff users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Dealer,
    Support,
    #[default]
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Dealer => "dealer",
            UserRole::Support => "support",
            UserRole::Viewer => "viewer",
        }
    }
}

/// A back-office login. Unrelated to customers and MT5 accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `GET /api/users` answers `{"total": n, "users": [...]}` rather than a
/// [`Page`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub users: Vec<User>,
}

// ---------------------------------------------------------------------------
// Dashboard aggregates
// ---------------------------------------------------------------------------

/// Book-wide totals shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_equity: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_balance: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_margin: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_floating_profit: Decimal,
    #[serde(default)]
    pub active_positions: usize,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_volume: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginSeverity {
    /// Margin level below 100%.
    Warning,
    /// Margin level below 50%, stop-out territory.
    Critical,
}

/// An account whose margin level has dropped below 100%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginCall {
    pub login: u64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub equity: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_level: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub margin_free: Decimal,
}

impl MarginCall {
    pub fn severity(&self) -> MarginSeverity {
        if self.margin_level < Decimal::from(50) {
            MarginSeverity::Critical
        } else {
            MarginSeverity::Warning
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Health report of the backend and its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<String>,
    pub database: Option<String>,
    pub mt5: Option<String>,
    pub pipedrive: Option<String>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn check_email(value: &str) -> Result<(), ApiError> {
    if value.contains('@') {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("invalid email address: {value}")))
    }
}

pub const MIN_PASSWORD_LEN: usize = 8;

fn check_password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CustomerCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentCreate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl AgentCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        check_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl AgentUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

impl Default for UserCreate {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            full_name: None,
            role: UserRole::Viewer,
            is_active: true,
        }
    }
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("email", &self.email)?;
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

/// Partial update; a `password` here replaces the login password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(password) = &self.password {
            check_password(password)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Opens a new MT5 account, either for an existing customer or creating the
/// customer on the fly from the `customer_*` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreate {
    pub group: String,
    pub leverage: u32,
    pub currency: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    /// Display name shown on the MT5 account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for AccountCreate {
    fn default() -> Self {
        Self {
            group: String::new(),
            leverage: 100,
            currency: "USD".to_string(),
            password: String::new(),
            customer_id: None,
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            agent_id: None,
            name: None,
        }
    }
}

impl AccountCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("group", &self.group)?;
        check_password(&self.password)?;
        if self.leverage == 0 {
            return Err(ApiError::Validation("leverage must be positive".to_string()));
        }
        let has_customer_name = self
            .customer_name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty());
        if self.customer_id.is_none() && !has_customer_name {
            return Err(ApiError::Validation(
                "either customer_id or customer_name is required".to_string(),
            ));
        }
        if let Some(email) = &self.customer_email {
            check_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOperationCreate {
    pub login: u64,
    #[serde(rename = "type")]
    pub operation_type: BalanceOperationType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BalanceOperationCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.amount <= Decimal::ZERO {
            return Err(ApiError::Validation("amount must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub new_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_password(&self.new_password)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMove {
    pub new_group: String,
}

impl GroupMove {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("new_group", &self.new_group)
    }
}

/// Inclusive date range filter, formatted `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::Validation(format!(
                    "from date {from} is after to date {to}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_page_count() {
        let page: Page<u8> = Page {
            items: vec![],
            total: 41,
            skip: 0,
            limit: 20,
        };
        assert_eq!(page.pages(), 3);

        let empty: Page<u8> = Page {
            items: vec![],
            total: 10,
            skip: 0,
            limit: 0,
        };
        assert_eq!(empty.pages(), 0);
    }

    #[test]
    fn test_position_side_accepts_codes_and_names() {
        let ws: Position = serde_json::from_str(
            r#"{"ticket": 1, "symbol": "EURUSD", "type": 1, "volume": 0.5, "profit": null}"#,
        )
        .unwrap();
        assert_eq!(ws.side, PositionSide::Sell);
        assert_eq!(ws.volume, dec!(0.5));
        assert_eq!(ws.profit, Decimal::ZERO);

        let rest: Position = serde_json::from_str(
            r#"{"ticket": 2, "login": 350001, "symbol": "XAUUSD", "action": 0, "type": "buy"}"#,
        )
        .unwrap();
        assert_eq!(rest.side, PositionSide::Buy);
        assert_eq!(rest.login, 350001);

        assert!(serde_json::from_str::<Position>(r#"{"ticket": 3, "type": 7}"#).is_err());

        // Bridge shape pushed on the dashboard socket: action code only.
        let pushed: Position = serde_json::from_str(
            r#"{"ticket": 5, "login": 7, "symbol": "XAUUSD", "volume": 2.0, "action": 1}"#,
        )
        .unwrap();
        assert_eq!(pushed.side, PositionSide::Sell);
        assert_eq!(pushed.volume, dec!(2.0));

        let flat: Position = serde_json::from_str(r#"{"ticket": 6}"#).unwrap();
        assert_eq!(flat.side, PositionSide::Buy);
    }

    #[test]
    fn test_realtime_snapshot_tolerates_nulls() {
        let snap: RealtimeAccountSnapshot = serde_json::from_str(
            r#"{"balance": 1000.5, "equity": null, "margin": 20, "margin_free": "980.5"}"#,
        )
        .unwrap();
        assert_eq!(snap.balance, dec!(1000.5));
        assert_eq!(snap.equity, Decimal::ZERO);
        assert_eq!(snap.margin, dec!(20));
        assert_eq!(snap.margin_free, dec!(980.5));
        assert_eq!(snap.login, 0);
    }

    #[test]
    fn test_deal_tag_classification() {
        assert_eq!(
            DealTag::classify(DealAction::Deposit, "dt-1234"),
            Some(DealTag::Deposit)
        );
        assert_eq!(
            DealTag::classify(DealAction::Withdrawal, "Wt payout"),
            Some(DealTag::Withdrawal)
        );
        assert_eq!(
            DealTag::classify(DealAction::Credit, "REB october"),
            Some(DealTag::Rebate)
        );
        assert_eq!(
            DealTag::classify(DealAction::Credit, "PRO welcome"),
            Some(DealTag::Promotion)
        );
        assert_eq!(
            DealTag::classify(DealAction::Deposit, "manual"),
            Some(DealTag::Promotion)
        );
        assert_eq!(DealTag::classify(DealAction::Credit, "manual"), None);
    }

    #[test]
    fn test_deal_record_uses_server_tag_when_present() {
        let deal: DealRecord = serde_json::from_str(
            r#"{"deal_id": 9, "login": 1, "action": "DEPOSIT", "amount": 50,
                "comment": "bonus", "timestamp": 1, "tag": "Rebate"}"#,
        )
        .unwrap();
        assert_eq!(deal.effective_tag(), Some(DealTag::Rebate));

        let untagged: DealRecord = serde_json::from_str(
            r#"{"deal_id": 10, "login": 1, "action": "WITHDRAWAL", "amount": -20,
                "comment": "WT-55", "timestamp": 2, "tag": ""}"#,
        )
        .unwrap();
        assert_eq!(untagged.tag, None);
        assert_eq!(untagged.effective_tag(), Some(DealTag::Withdrawal));
    }

    #[test]
    fn test_report_rows_accept_day_field() {
        let row: DailyPnlRecord = serde_json::from_str(
            r#"{"day": "2025-10-31", "login": 7, "net_deposit": 100, "equity_pnl": -3.5}"#,
        )
        .unwrap();
        assert_eq!(row.date, "2025-10-31");
        assert_eq!(row.equity_pnl, dec!(-3.5));
        assert_eq!(row.present_equity, Decimal::ZERO);
    }

    #[test]
    fn test_account_create_validation() {
        let mut req = AccountCreate {
            group: "real\\std".to_string(),
            password: "short".to_string(),
            customer_id: Some(4),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));

        req.password = "longenough".to_string();
        assert!(req.validate().is_ok());

        req.customer_id = None;
        assert!(req.validate().is_err());

        req.customer_name = Some("Jane Roe".to_string());
        assert!(req.validate().is_ok());

        req.group = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_balance_operation_validation_and_wire_format() {
        let op = BalanceOperationCreate {
            login: 350001,
            operation_type: BalanceOperationType::Deposit,
            amount: dec!(250.75),
            comment: Some("DT-1".to_string()),
        };
        assert!(op.validate().is_ok());

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["amount"], serde_json::json!(250.75));

        let zero = BalanceOperationCreate {
            amount: Decimal::ZERO,
            ..op
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_customer_and_agent_validation() {
        assert!(CustomerCreate::default().validate().is_err());
        let customer = CustomerCreate {
            name: "Acme".to_string(),
            email: Some("ops@acme.test".to_string()),
            ..Default::default()
        };
        assert!(customer.validate().is_ok());

        let agent = AgentCreate {
            name: "Bob".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
        };
        assert!(agent.validate().is_err());
    }

    #[test]
    fn test_date_range_order() {
        let from = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert!(DateRange::new(from, to).validate().is_err());
        assert!(DateRange::day(from).validate().is_ok());
    }

    #[test]
    fn test_margin_call_severity() {
        let call = MarginCall {
            margin_level: dec!(42),
            ..Default::default()
        };
        assert_eq!(call.severity(), MarginSeverity::Critical);
        let call = MarginCall {
            margin_level: dec!(80),
            ..Default::default()
        };
        assert_eq!(call.severity(), MarginSeverity::Warning);
    }

    #[test]
    fn test_user_list_shape() {
        let list: UserList = serde_json::from_str(
            r#"{"total": 2, "users": [
                {"id": 2, "email": "dealer@desk.io", "full_name": null, "role": "dealer",
                 "is_active": true, "created_at": "2025-10-01T09:00:00"},
                {"id": 1, "email": "admin@desk.io", "full_name": "Ops", "role": "admin",
                 "is_active": false, "created_at": null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.users[0].role, UserRole::Dealer);
        assert!(list.users[0].created_at.is_some());
        assert!(list.users[0].updated_at.is_none());
        assert!(list.users[1].created_at.is_none());
        assert!(!list.users[1].is_active);
    }

    #[test]
    fn test_user_payload_validation() {
        let user = UserCreate {
            email: "new@desk.io".to_string(),
            password: "s3cure-pass".to_string(),
            ..Default::default()
        };
        assert!(user.validate().is_ok());
        assert_eq!(user.role, UserRole::Viewer);
        assert!(user.is_active);

        let short = UserCreate {
            password: "short".to_string(),
            ..user.clone()
        };
        assert!(short.validate().is_err());

        let update = UserUpdate {
            role: Some(UserRole::Support),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"role": "support"})
        );

        let bad = UserUpdate {
            email: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_trade_record_side_and_net_profit() {
        let trades: Vec<TradeRecord> = serde_json::from_str(
            r#"[
                {"deal_id": 11, "login": 350001, "symbol": "EURUSD", "action": "SELL",
                 "volume": 0.5, "price": 1.0812, "profit": 120.5, "commission": -3.5,
                 "swap": -1, "timestamp": 1761900000, "datetime": "2025-10-31 08:40:00"},
                {"deal_id": 12, "login": 350001, "symbol": "XAUUSD", "action": "UNKNOWN",
                 "volume": 1, "price": 2650, "profit": null}
            ]"#,
        )
        .unwrap();
        assert_eq!(trades[0].side, Some(PositionSide::Sell));
        assert_eq!(trades[0].net_profit(), dec!(116));
        assert_eq!(trades[1].side, None);
        assert_eq!(trades[1].profit, Decimal::ZERO);
    }

    #[test]
    fn test_audit_statistics_counts() {
        let stats: AuditStatistics = serde_json::from_str(
            r#"{"period_days": 7, "start_date": "2025-10-24T00:00:00",
                "end_date": "2025-10-31T00:00:00",
                "action_counts": {"create": 4, "update": 9},
                "user_activity": {"1": 3, "7": 10, "4": 3},
                "entity_types": 12, "total_logs": 16}"#,
        )
        .unwrap();
        assert_eq!(stats.action_counts["update"], 9);
        assert!(stats.entity_types.is_empty());
        assert_eq!(stats.busiest_actors(), vec![("7", 10), ("1", 3), ("4", 3)]);
    }
}
