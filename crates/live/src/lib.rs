//! Live views over the CRM backend.
//!
//! A [`LiveView`] loads a feed's state over REST, keeps one WebSocket open
//! for push updates and re-polls on a fixed interval. Lost sockets are
//! reconnected after a fixed delay through [`ManagedRetry`].

pub mod account;
pub mod channel;
pub mod dashboard;
pub mod retry;
pub mod view;

pub use account::{AccountFeed, AccountState};
pub use channel::WsChannel;
pub use dashboard::{apply_dashboard_update, DashboardFeed};
pub use retry::ManagedRetry;
pub use view::{ConnectionState, LiveView, LiveViewConfig};
