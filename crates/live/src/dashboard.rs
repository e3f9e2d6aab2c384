use async_trait::async_trait;
use brokerdesk_analytics::{summarize_dashboard, DashboardSummary};
use brokerdesk_client::CrmClient;
use brokerdesk_core::{replace_if_changed, ApiError, DashboardUpdate, LiveFeed, LiveMessage};
use tracing::warn;

/// Book-wide dashboard: totals, the most critical margin calls and the
/// latest open positions. Reconnection pauses while the view is hidden.
pub struct DashboardFeed {
    client: CrmClient,
}

impl DashboardFeed {
    pub fn new(client: CrmClient) -> Self {
        Self { client }
    }
}

/// Fold a push update into the summary. The server timestamp is not part of
/// the state, so an identical tick reports no change.
pub fn apply_dashboard_update(state: &mut DashboardSummary, update: DashboardUpdate) -> bool {
    let mut changed = replace_if_changed(&mut state.stats, update.stats);
    changed |= replace_if_changed(&mut state.margin_calls, update.margin_calls);
    changed |= replace_if_changed(&mut state.positions, update.positions);
    changed
}

#[async_trait]
impl LiveFeed for DashboardFeed {
    type State = DashboardSummary;

    fn name(&self) -> &str {
        "dashboard"
    }

    fn ws_path(&self) -> String {
        "/ws/dashboard".to_string()
    }

    fn requires_visibility(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<DashboardSummary, ApiError> {
        let (snapshots, positions) = tokio::try_join!(
            self.client.accounts().realtime(None, None),
            self.client.positions().open(None, None),
        )?;
        Ok(summarize_dashboard(&snapshots, &positions))
    }

    fn reconcile(&self, state: &mut DashboardSummary, message: LiveMessage) -> bool {
        match message {
            LiveMessage::Dashboard(update) => apply_dashboard_update(state, update),
            LiveMessage::Error { message } => {
                warn!(feed = "dashboard", %message, "Server reported an error");
                false
            }
            LiveMessage::Account(_) => false,
        }
    }
}
