use brokerdesk_core::{
    DealAction, DealRecord, DepositTransaction, NetDepositReport, NetDepositSummary,
    TransactionGroup,
};
use rust_decimal::Decimal;

/// Whether a deposit/withdrawal comment carries a payment reference
/// (`DT...` / `WT...`). Untagged lines are promotions.
///
/// Case-sensitive and unpadded, unlike [`DealTag::classify`](brokerdesk_core::DealTag::classify):
/// the net-deposit report upstream only matches the exact uppercase prefix.
pub fn is_payment_tagged(comment: &str) -> bool {
    comment.starts_with("DT") || comment.starts_with("WT")
}

/// Net deposit: the sum of signed deposit/withdrawal amounts.
///
/// Deposits are positive and withdrawals negative on the wire, so this equals
/// total deposits minus total withdrawals.
pub fn net_deposit(deals: &[DealRecord]) -> Decimal {
    deals
        .iter()
        .filter(|d| matches!(d.action, DealAction::Deposit | DealAction::Withdrawal))
        .map(|d| d.amount)
        .sum()
}

/// Totals only, without the transaction lists.
pub fn net_deposit_summary(deals: &[DealRecord]) -> NetDepositSummary {
    net_deposit_report(deals, None, "", "").summary
}

fn transaction(deal: &DealRecord, tagged: bool) -> DepositTransaction {
    DepositTransaction {
        deal_id: deal.deal_id,
        login: deal.login,
        action: deal.action,
        amount: deal.amount,
        balance_after: deal.balance_after,
        comment: deal.comment.clone(),
        tag: if tagged { "deposit" } else { "promotion" }.to_string(),
        datetime: deal.datetime_str.clone(),
        timestamp: deal.timestamp,
    }
}

/// Categorize deposit and withdrawal deals into a net deposit report.
///
/// Other deal actions are ignored. Transactions are listed newest first.
pub fn net_deposit_report(
    deals: &[DealRecord],
    login: Option<u64>,
    from_date: &str,
    to_date: &str,
) -> NetDepositReport {
    let mut summary = NetDepositSummary::default();
    let mut deposits = Vec::new();
    let mut withdrawals = Vec::new();

    for deal in deals {
        let tagged = is_payment_tagged(&deal.comment);
        match deal.action {
            DealAction::Deposit => {
                summary.total_deposits += deal.amount;
                if tagged {
                    summary.deposits_tagged += deal.amount;
                } else {
                    summary.deposits_promotion += deal.amount;
                }
                deposits.push(transaction(deal, tagged));
            }
            DealAction::Withdrawal => {
                let amount = deal.amount.abs();
                summary.total_withdrawals += amount;
                if tagged {
                    summary.withdrawals_tagged += amount;
                } else {
                    summary.withdrawals_promotion += amount;
                }
                withdrawals.push(transaction(deal, tagged));
            }
            _ => {}
        }
    }

    summary.net_deposit = summary.total_deposits - summary.total_withdrawals;
    summary.net_deposit_tagged = summary.deposits_tagged - summary.withdrawals_tagged;
    summary.net_promotion = summary.deposits_promotion - summary.withdrawals_promotion;

    deposits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    withdrawals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    NetDepositReport {
        login,
        from_date: from_date.to_string(),
        to_date: to_date.to_string(),
        deposits: TransactionGroup {
            count: deposits.len(),
            total: summary.total_deposits,
            transactions: deposits,
        },
        withdrawals: TransactionGroup {
            count: withdrawals.len(),
            total: summary.total_withdrawals,
            transactions: withdrawals,
        },
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn deal(id: u64, action: DealAction, amount: Decimal, comment: &str, ts: i64) -> DealRecord {
        DealRecord {
            deal_id: id,
            login: 350001,
            action,
            amount,
            balance_after: Decimal::ZERO,
            comment: comment.to_string(),
            timestamp: ts,
            datetime_str: String::new(),
            tag: None,
        }
    }

    fn sample() -> Vec<DealRecord> {
        vec![
            deal(1, DealAction::Deposit, dec!(1000), "DT-88121", 100),
            deal(2, DealAction::Deposit, dec!(50), "welcome bonus", 300),
            deal(3, DealAction::Withdrawal, dec!(-200), "WT-5512", 200),
            deal(4, DealAction::Withdrawal, dec!(-10), "fee", 400),
            deal(5, DealAction::Credit, dec!(500), "credit line", 500),
        ]
    }

    #[test]
    fn test_net_deposit_is_signed_sum() {
        let deals = sample();
        assert_eq!(net_deposit(&deals), dec!(840));

        let report = net_deposit_report(&deals, Some(350001), "2025-10-01", "2025-10-31");
        assert_eq!(report.summary.net_deposit, net_deposit(&deals));
        assert_eq!(report.summary.total_deposits, dec!(1050));
        assert_eq!(report.summary.total_withdrawals, dec!(210));
        assert_eq!(net_deposit_summary(&deals), report.summary);
    }

    #[test]
    fn test_tagged_and_promotion_split() {
        let report = net_deposit_report(&sample(), None, "2025-10-01", "2025-10-31");
        let s = &report.summary;
        assert_eq!(s.deposits_tagged, dec!(1000));
        assert_eq!(s.deposits_promotion, dec!(50));
        assert_eq!(s.withdrawals_tagged, dec!(200));
        assert_eq!(s.withdrawals_promotion, dec!(10));
        assert_eq!(s.net_deposit_tagged, dec!(800));
        assert_eq!(s.net_promotion, dec!(40));
        assert_eq!(report.deposits.transactions[0].tag, "promotion");
        assert_eq!(report.withdrawals.transactions[1].tag, "deposit");
    }

    #[test]
    fn test_payment_tag_is_case_sensitive() {
        assert!(is_payment_tagged("DT-88121"));
        assert!(is_payment_tagged("WT"));
        assert!(!is_payment_tagged("dt-88121"));
        assert!(!is_payment_tagged("Wt payout"));
        assert!(!is_payment_tagged(" DT-1"));
        assert!(!is_payment_tagged(""));

        let deals = vec![
            deal(1, DealAction::Deposit, dec!(300), "dt-1", 100),
            deal(2, DealAction::Deposit, dec!(700), "DT-2", 200),
        ];
        let s = net_deposit_summary(&deals);
        assert_eq!(s.deposits_tagged, dec!(700));
        assert_eq!(s.deposits_promotion, dec!(300));
    }

    #[test]
    fn test_transactions_newest_first_and_credits_ignored() {
        let report = net_deposit_report(&sample(), None, "2025-10-01", "2025-10-31");
        assert_eq!(report.deposits.count, 2);
        assert_eq!(report.withdrawals.count, 2);
        let ids: Vec<u64> = report.deposits.transactions.iter().map(|t| t.deal_id).collect();
        assert_eq!(ids, vec![2, 1]);
        let ids: Vec<u64> = report
            .withdrawals
            .transactions
            .iter()
            .map(|t| t.deal_id)
            .collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_empty_history() {
        let report = net_deposit_report(&[], None, "2025-10-01", "2025-10-31");
        assert_eq!(report.summary, NetDepositSummary::default());
        assert_eq!(net_deposit(&[]), Decimal::ZERO);
    }
}
