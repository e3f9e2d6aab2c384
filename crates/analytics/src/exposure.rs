use std::collections::HashMap;

use brokerdesk_core::{NetPosition, Position, PositionSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How many symbols the exposure summary lists.
pub const TOP_SYMBOLS: usize = 10;

/// Net open positions per symbol, largest absolute net volume first.
///
/// Ties break on symbol name so the order is stable between refreshes.
pub fn net_positions(positions: &[Position]) -> Vec<NetPosition> {
    let mut by_symbol: HashMap<&str, NetPosition> = HashMap::new();

    for p in positions {
        let entry = by_symbol
            .entry(p.symbol.as_str())
            .or_insert_with(|| NetPosition {
                symbol: p.symbol.clone(),
                ..Default::default()
            });
        match p.side {
            PositionSide::Buy => entry.buy_volume += p.volume,
            PositionSide::Sell => entry.sell_volume += p.volume,
        }
        entry.net_profit += p.profit;
        entry.positions_count += 1;
    }

    let mut net: Vec<NetPosition> = by_symbol
        .into_values()
        .map(|mut n| {
            n.net_volume = n.buy_volume - n.sell_volume;
            n
        })
        .collect();

    net.sort_by(|a, b| {
        b.net_volume
            .abs()
            .cmp(&a.net_volume.abs())
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    net
}

/// Book-wide directional exposure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSummary {
    pub total_long: Decimal,
    pub total_short: Decimal,
    pub net_exposure: Decimal,
    pub total_profit: Decimal,
    pub positions_count: usize,
    pub symbols: Vec<NetPosition>,
}

pub fn exposure(positions: &[Position]) -> ExposureSummary {
    let mut symbols = net_positions(positions);
    let total_long: Decimal = symbols.iter().map(|n| n.buy_volume).sum();
    let total_short: Decimal = symbols.iter().map(|n| n.sell_volume).sum();
    let total_profit: Decimal = symbols.iter().map(|n| n.net_profit).sum();
    symbols.truncate(TOP_SYMBOLS);

    ExposureSummary {
        total_long,
        total_short,
        net_exposure: total_long - total_short,
        total_profit,
        positions_count: positions.len(),
        symbols,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(symbol: &str, side: PositionSide, volume: Decimal, profit: Decimal) -> Position {
        Position {
            ticket: 1,
            symbol: symbol.to_string(),
            side,
            volume,
            profit,
            ..Default::default()
        }
    }

    #[test]
    fn test_net_positions_per_symbol() {
        let positions = vec![
            position("EURUSD", PositionSide::Buy, dec!(1.0), dec!(10)),
            position("EURUSD", PositionSide::Sell, dec!(0.4), dec!(-2)),
            position("XAUUSD", PositionSide::Sell, dec!(2.0), dec!(-50)),
            position("GBPUSD", PositionSide::Buy, dec!(0.1), dec!(1)),
        ];

        let net = net_positions(&positions);
        let symbols: Vec<&str> = net.iter().map(|n| n.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["XAUUSD", "EURUSD", "GBPUSD"]);

        assert_eq!(net[0].net_volume, dec!(-2.0));
        assert_eq!(net[1].buy_volume, dec!(1.0));
        assert_eq!(net[1].sell_volume, dec!(0.4));
        assert_eq!(net[1].net_volume, dec!(0.6));
        assert_eq!(net[1].net_profit, dec!(8));
        assert_eq!(net[1].positions_count, 2);
    }

    #[test]
    fn test_exposure_totals_and_cap() {
        let mut positions: Vec<Position> = (0..12)
            .map(|i| position(&format!("SYM{i:02}"), PositionSide::Buy, dec!(1), dec!(1)))
            .collect();
        positions.push(position("SYM00", PositionSide::Sell, dec!(3), dec!(-4)));

        let summary = exposure(&positions);
        assert_eq!(summary.total_long, dec!(12));
        assert_eq!(summary.total_short, dec!(3));
        assert_eq!(summary.net_exposure, dec!(9));
        assert_eq!(summary.total_profit, dec!(8));
        assert_eq!(summary.positions_count, 13);
        assert_eq!(summary.symbols.len(), TOP_SYMBOLS);
        // SYM00 nets to -2 and leads
        assert_eq!(summary.symbols[0].symbol, "SYM00");
    }

    #[test]
    fn test_flat_book() {
        assert_eq!(exposure(&[]), ExposureSummary::default());
    }
}
