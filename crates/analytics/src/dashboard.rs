use brokerdesk_core::{DashboardStats, MarginCall, Position, RealtimeAccountSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::margin::margin_calls;

/// How many margin calls the dashboard lists.
pub const DASHBOARD_MARGIN_CALLS: usize = 10;
/// How many positions the dashboard lists.
pub const DASHBOARD_POSITIONS: usize = 50;

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub margin_calls: Vec<MarginCall>,
    pub positions: Vec<Position>,
}

/// Book-wide totals over all realtime snapshots and open positions.
pub fn dashboard_stats(
    snapshots: &[RealtimeAccountSnapshot],
    positions: &[Position],
) -> DashboardStats {
    DashboardStats {
        total_equity: snapshots.iter().map(|s| s.equity).sum(),
        total_balance: snapshots.iter().map(|s| s.balance).sum(),
        total_margin: snapshots.iter().map(|s| s.margin).sum(),
        total_floating_profit: snapshots.iter().map(|s| s.floating_profit).sum(),
        active_positions: positions.len(),
        total_volume: positions.iter().map(|p| p.volume).sum::<Decimal>(),
    }
}

/// Build the dashboard from REST data the same way the server builds its push
/// updates, so both sources reconcile into the same shape.
pub fn summarize_dashboard(
    snapshots: &[RealtimeAccountSnapshot],
    positions: &[Position],
) -> DashboardSummary {
    let mut calls = margin_calls(snapshots);
    calls.truncate(DASHBOARD_MARGIN_CALLS);

    DashboardSummary {
        stats: dashboard_stats(snapshots, positions),
        margin_calls: calls,
        positions: positions.iter().take(DASHBOARD_POSITIONS).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dashboard_totals() {
        let snapshots = vec![
            RealtimeAccountSnapshot {
                login: 1,
                balance: dec!(1000),
                equity: dec!(1100),
                margin: dec!(200),
                floating_profit: dec!(100),
                ..Default::default()
            },
            RealtimeAccountSnapshot {
                login: 2,
                balance: dec!(500),
                equity: dec!(300),
                margin: dec!(400),
                floating_profit: dec!(-200),
                ..Default::default()
            },
        ];
        let positions = vec![
            Position {
                ticket: 1,
                volume: dec!(0.5),
                ..Default::default()
            },
            Position {
                ticket: 2,
                volume: dec!(1.25),
                ..Default::default()
            },
        ];

        let summary = summarize_dashboard(&snapshots, &positions);
        assert_eq!(summary.stats.total_equity, dec!(1400));
        assert_eq!(summary.stats.total_balance, dec!(1500));
        assert_eq!(summary.stats.total_margin, dec!(600));
        assert_eq!(summary.stats.total_floating_profit, dec!(-100));
        assert_eq!(summary.stats.active_positions, 2);
        assert_eq!(summary.stats.total_volume, dec!(1.75));
        assert_eq!(summary.margin_calls.len(), 1);
        assert_eq!(summary.margin_calls[0].login, 2);
    }

    #[test]
    fn test_dashboard_caps_lists() {
        let snapshots: Vec<_> = (0..15)
            .map(|i| RealtimeAccountSnapshot {
                login: i,
                equity: Decimal::from(i),
                margin: dec!(100),
                ..Default::default()
            })
            .collect();
        let positions: Vec<_> = (0..60)
            .map(|i| Position {
                ticket: i,
                ..Default::default()
            })
            .collect();

        let summary = summarize_dashboard(&snapshots, &positions);
        assert_eq!(summary.margin_calls.len(), DASHBOARD_MARGIN_CALLS);
        assert_eq!(summary.margin_calls[0].login, 0);
        assert_eq!(summary.positions.len(), DASHBOARD_POSITIONS);
        assert_eq!(summary.stats.active_positions, 60);
    }
}
