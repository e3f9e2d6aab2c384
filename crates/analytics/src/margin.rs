use brokerdesk_core::{MarginCall, RealtimeAccountSnapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Accounts below this margin level (percent) are in margin call.
pub const MARGIN_CALL_LEVEL: Decimal = dec!(100);

/// Margin level in percent: `equity / margin * 100`.
///
/// Zero when there is no margin in use (`margin <= 0`).
pub fn margin_level(equity: Decimal, margin: Decimal) -> Decimal {
    if margin <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        equity / margin * dec!(100)
    }
}

/// Accounts with margin in use whose margin level is under
/// [`MARGIN_CALL_LEVEL`], most critical (lowest level) first.
///
/// Calls are named `Account <login>` whatever the snapshot's display name,
/// matching the dashboard push.
pub fn margin_calls(snapshots: &[RealtimeAccountSnapshot]) -> Vec<MarginCall> {
    let mut calls: Vec<MarginCall> = snapshots
        .iter()
        .filter(|s| s.margin > Decimal::ZERO)
        .filter_map(|s| {
            let level = margin_level(s.equity, s.margin);
            (level < MARGIN_CALL_LEVEL).then(|| MarginCall {
                login: s.login,
                name: format!("Account {}", s.login),
                equity: s.equity,
                margin: s.margin,
                margin_level: level,
                margin_free: s.margin_free,
            })
        })
        .collect();

    calls.sort_by(|a, b| a.margin_level.cmp(&b.margin_level));
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_core::MarginSeverity;

    fn snapshot(login: u64, equity: Decimal, margin: Decimal) -> RealtimeAccountSnapshot {
        RealtimeAccountSnapshot {
            login,
            equity,
            margin,
            margin_free: equity - margin,
            ..Default::default()
        }
    }

    #[test]
    fn test_margin_level_zero_without_margin() {
        assert_eq!(margin_level(dec!(1000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(margin_level(dec!(1000), dec!(-5)), Decimal::ZERO);
        assert_eq!(margin_level(dec!(1500), dec!(1000)), dec!(150));
        assert_eq!(margin_level(dec!(-20), dec!(100)), dec!(-20));
    }

    #[test]
    fn test_margin_calls_sorted_ascending() {
        let snapshots = vec![
            snapshot(1, dec!(90), dec!(100)),  // 90%
            snapshot(2, dec!(5000), dec!(0)),  // no margin, ignored
            snapshot(3, dec!(30), dec!(100)),  // 30%
            snapshot(4, dec!(250), dec!(100)), // healthy
            snapshot(5, dec!(60), dec!(100)),  // 60%
        ];

        let calls = margin_calls(&snapshots);
        let logins: Vec<u64> = calls.iter().map(|c| c.login).collect();
        assert_eq!(logins, vec![3, 5, 1]);
        assert!(calls
            .windows(2)
            .all(|w| w[0].margin_level <= w[1].margin_level));
        assert_eq!(calls[0].name, "Account 3");
        assert_eq!(calls[0].severity(), MarginSeverity::Critical);
        assert_eq!(calls[2].severity(), MarginSeverity::Warning);
    }

    #[test]
    fn test_call_name_ignores_snapshot_name() {
        let named = RealtimeAccountSnapshot {
            name: "Jane Trader".to_string(),
            ..snapshot(42, dec!(20), dec!(100))
        };
        let calls = margin_calls(&[named]);
        assert_eq!(calls[0].name, "Account 42");
    }

    #[test]
    fn test_exactly_at_threshold_is_not_a_call() {
        let calls = margin_calls(&[snapshot(9, dec!(100), dec!(100))]);
        assert!(calls.is_empty());
    }
}
