use brokerdesk_core::{DailyPnlRecord, DailyReport, DealAction, DealRecord, DealTag};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Compute one account's daily P&L from its end-of-day report and the
/// balance deals booked that day.
///
/// ```text
/// equity_pnl = present_equity - equity_prev_day - net_deposit
///              - net_credit_promotion - total_ib
/// net_pnl    = equity_pnl - promotion
/// ```
///
/// IB commissions come from the report's `daily_agent` field.
pub fn daily_pnl(report: &DailyReport, deals: &[DealRecord]) -> DailyPnlRecord {
    let mut deposit = Decimal::ZERO;
    let mut withdrawal = Decimal::ZERO;
    let mut net_deposit = Decimal::ZERO;
    let mut promotion = Decimal::ZERO;
    let mut net_credit_promotion = Decimal::ZERO;
    let mut rebate = Decimal::ZERO;

    for deal in deals {
        match deal.effective_tag() {
            Some(DealTag::Deposit) => {
                deposit += deal.amount.abs();
                net_deposit += deal.amount;
            }
            Some(DealTag::Withdrawal) => {
                withdrawal += deal.amount.abs();
                net_deposit += deal.amount;
            }
            Some(DealTag::Rebate) => {
                rebate += deal.amount;
                net_credit_promotion += deal.amount;
            }
            Some(DealTag::Promotion) => {
                if deal.amount > Decimal::ZERO {
                    promotion += deal.amount;
                }
                net_credit_promotion += deal.amount;
            }
            None => match deal.action {
                DealAction::Deposit | DealAction::Withdrawal => net_deposit += deal.amount,
                DealAction::Credit
                | DealAction::CreditOut
                | DealAction::Charge
                | DealAction::Correction => net_credit_promotion += deal.amount,
                DealAction::Unknown => {}
            },
        }
    }

    let total_ib = report.daily_agent;
    let equity_pnl = report.present_equity
        - report.equity_prev_day
        - net_deposit
        - net_credit_promotion
        - total_ib;
    let net_pnl = equity_pnl - promotion;

    debug!(
        login = report.login,
        date = %report.date,
        %equity_pnl,
        %net_pnl,
        "Daily P&L computed"
    );

    DailyPnlRecord {
        login: report.login,
        date: report.date.clone(),
        present_equity: report.present_equity,
        equity_prev_day: report.equity_prev_day,
        deposit,
        withdrawal,
        net_deposit,
        promotion,
        net_credit_promotion,
        total_ib,
        rebate,
        equity_pnl,
        net_pnl,
        group: report.group.clone(),
        currency: report.currency.clone(),
    }
}

/// Sum per-account records into one institution-wide record (login 0).
pub fn institution_pnl(records: &[DailyPnlRecord], date: &str) -> DailyPnlRecord {
    let sum = |f: fn(&DailyPnlRecord) -> Decimal| records.iter().map(f).sum::<Decimal>();

    DailyPnlRecord {
        login: 0,
        date: date.to_string(),
        present_equity: sum(|r| r.present_equity),
        equity_prev_day: sum(|r| r.equity_prev_day),
        deposit: sum(|r| r.deposit),
        withdrawal: sum(|r| r.withdrawal),
        net_deposit: sum(|r| r.net_deposit),
        promotion: sum(|r| r.promotion),
        net_credit_promotion: sum(|r| r.net_credit_promotion),
        total_ib: sum(|r| r.total_ib),
        rebate: sum(|r| r.rebate),
        equity_pnl: sum(|r| r.equity_pnl),
        net_pnl: sum(|r| r.net_pnl),
        group: "ALL".to_string(),
        currency: "USD".to_string(),
    }
}

/// Roll-up of a fetched P&L collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlTotals {
    pub records: usize,
    pub net_deposit: Decimal,
    pub equity_pnl: Decimal,
    pub net_pnl: Decimal,
    pub total_ib: Decimal,
}

pub fn pnl_totals(records: &[DailyPnlRecord]) -> PnlTotals {
    records.iter().fold(
        PnlTotals {
            records: records.len(),
            ..Default::default()
        },
        |mut acc, r| {
            acc.net_deposit += r.net_deposit;
            acc.equity_pnl += r.equity_pnl;
            acc.net_pnl += r.net_pnl;
            acc.total_ib += r.total_ib;
            acc
        },
    )
}
