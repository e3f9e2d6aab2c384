use async_trait::async_trait;
use brokerdesk_client::CrmClient;
use brokerdesk_core::{
    replace_if_changed, AccountUpdate, ApiError, LiveFeed, LiveMessage, Mt5Account, Position,
    RealtimeAccountSnapshot,
};
use serde::Serialize;
use tracing::{debug, warn};

/// What the account detail screen shows for one login.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountState {
    pub account: Option<Mt5Account>,
    pub realtime: Option<RealtimeAccountSnapshot>,
    pub positions: Vec<Position>,
}

/// Single-account feed. It keeps reconnecting regardless of visibility.
pub struct AccountFeed {
    client: CrmClient,
    login: u64,
}

impl AccountFeed {
    pub fn new(client: CrmClient, login: u64) -> Self {
        Self { client, login }
    }

    pub fn login(&self) -> u64 {
        self.login
    }

    fn apply(&self, state: &mut AccountState, update: AccountUpdate) -> bool {
        if update.login != 0 && update.login != self.login {
            debug!(
                feed = "account",
                expected = self.login,
                got = update.login,
                "Ignoring update for another login"
            );
            return false;
        }

        // The push snapshot omits the identifying fields, keep the ones we have.
        let realtime = update.realtime.map(|mut pushed| {
            pushed.login = self.login;
            if let Some(known) = &state.realtime {
                if pushed.name.is_empty() {
                    pushed.name = known.name.clone();
                }
                if pushed.group.is_empty() {
                    pushed.group = known.group.clone();
                }
                if pushed.currency.is_empty() {
                    pushed.currency = known.currency.clone();
                }
                if pushed.timestamp == 0 {
                    pushed.timestamp = known.timestamp;
                }
            }
            pushed
        });

        let positions: Vec<Position> = update
            .positions
            .into_iter()
            .map(|mut p| {
                if p.login == 0 {
                    p.login = self.login;
                }
                p
            })
            .collect();

        let mut changed = replace_if_changed(&mut state.realtime, realtime);
        changed |= replace_if_changed(&mut state.positions, positions);
        changed
    }
}

#[async_trait]
impl LiveFeed for AccountFeed {
    type State = AccountState;

    fn name(&self) -> &str {
        "account"
    }

    fn ws_path(&self) -> String {
        format!("/ws/account/{}", self.login)
    }

    async fn fetch(&self) -> Result<AccountState, ApiError> {
        let accounts = self.client.accounts();
        let (account, realtime, positions) = tokio::try_join!(
            accounts.get(self.login),
            accounts.realtime_for(self.login),
            accounts.positions(self.login, None),
        )?;
        Ok(AccountState {
            account: Some(account),
            realtime,
            positions,
        })
    }

    fn reconcile(&self, state: &mut AccountState, message: LiveMessage) -> bool {
        match message {
            LiveMessage::Account(update) => self.apply(state, update),
            LiveMessage::Error { message } => {
                warn!(feed = "account", login = self.login, %message, "Server reported an error");
                false
            }
            LiveMessage::Dashboard(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_client::ClientConfig;
    use rust_decimal_macros::dec;

    fn feed() -> AccountFeed {
        AccountFeed::new(
            CrmClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap(),
            350001,
        )
    }

    fn known_state() -> AccountState {
        AccountState {
            account: None,
            realtime: Some(RealtimeAccountSnapshot {
                login: 350001,
                name: "Jane Trader".to_string(),
                group: "real\\std".to_string(),
                currency: "USD".to_string(),
                equity: dec!(1000),
                timestamp: 1_700_000_000,
                ..Default::default()
            }),
            positions: Vec::new(),
        }
    }

    fn push(equity: rust_decimal::Decimal) -> LiveMessage {
        LiveMessage::Account(AccountUpdate {
            login: 350001,
            realtime: Some(RealtimeAccountSnapshot {
                equity,
                ..Default::default()
            }),
            positions: vec![Position {
                ticket: 9,
                symbol: "XAUUSD".to_string(),
                volume: dec!(0.1),
                ..Default::default()
            }],
        })
    }

    #[test]
    fn test_push_keeps_identity_fields() {
        let feed = feed();
        let mut state = known_state();

        assert!(feed.reconcile(&mut state, push(dec!(1015.5))));

        let realtime = state.realtime.as_ref().unwrap();
        assert_eq!(realtime.equity, dec!(1015.5));
        assert_eq!(realtime.login, 350001);
        assert_eq!(realtime.name, "Jane Trader");
        assert_eq!(realtime.group, "real\\std");
        assert_eq!(realtime.timestamp, 1_700_000_000);
        assert_eq!(state.positions[0].login, 350001);

        // Same push again changes nothing.
        assert!(!feed.reconcile(&mut state, push(dec!(1015.5))));
    }

    #[test]
    fn test_update_for_other_login_is_ignored() {
        let feed = feed();
        let mut state = known_state();
        let before = state.clone();

        let other = LiveMessage::Account(AccountUpdate {
            login: 42,
            realtime: None,
            positions: Vec::new(),
        });
        assert!(!feed.reconcile(&mut state, other));
        assert_eq!(state, before);
    }

    #[test]
    fn test_null_realtime_clears_snapshot() {
        let feed = feed();
        let mut state = known_state();

        let update = LiveMessage::Account(AccountUpdate {
            login: 350001,
            realtime: None,
            positions: Vec::new(),
        });
        assert!(feed.reconcile(&mut state, update));
        assert!(state.realtime.is_none());
    }

    #[test]
    fn test_ws_path_includes_login() {
        assert_eq!(feed().ws_path(), "/ws/account/350001");
        assert!(!feed().requires_visibility());
    }
}
