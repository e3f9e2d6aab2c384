use brokerdesk_analytics::{DashboardSummary, ExposureSummary, PnlTotals};
use brokerdesk_core::*;
use brokerdesk_live::AccountState;
use rust_decimal::Decimal;
use serde::Serialize;

/// Print `value` as pretty JSON, or through the human renderer.
pub fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn header(title: &str) {
    let sep = "=".repeat(60);
    println!("\n{sep}");
    println!("  {title}");
    println!("{sep}");
}

fn footer() {
    println!("{}\n", "=".repeat(60));
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

// ---------------------------------------------------------------------------
// CRM entities
// ---------------------------------------------------------------------------

pub fn customer_page(page: &Page<Customer>) {
    header(&format!("CUSTOMERS ({} of {})", page.items.len(), page.total));
    for c in &page.items {
        println!(
            "  {:>6}  {:<28} {:<28} agent {}",
            c.id,
            c.name,
            or_dash(c.email.as_deref()),
            c.agent_id.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
        );
    }
    footer();
}

pub fn customer(c: &Customer) {
    header(&format!("CUSTOMER #{}", c.id));
    println!("  Name:      {}", c.name);
    println!("  Email:     {}", or_dash(c.email.as_deref()));
    println!("  Phone:     {}", or_dash(c.phone.as_deref()));
    println!("  Address:   {}", or_dash(c.address.as_deref()));
    if let Some(tags) = &c.tags {
        println!("  Tags:      {}", tags.join(", "));
    }
    println!("  Created:   {}", c.created_at.format("%Y-%m-%d %H:%M"));
    for account in &c.mt5_accounts {
        println!(
            "  MT5 {:>8}  {:<20} {:>12.2} {} ({})",
            account.login,
            account.group,
            account.balance,
            account.currency,
            account.status.as_str()
        );
    }
    footer();
}

pub fn customer_positions(p: &CustomerPositions) {
    header(&format!("POSITIONS: {} (#{})", p.customer_name, p.customer_id));
    for account in &p.accounts {
        println!(
            "  {:>8}  {:<20} {:>3} positions  volume {:>8}  profit {:>12.2}",
            account.login,
            account.group,
            account.positions_count,
            account.total_volume,
            account.total_profit
        );
    }
    if !p.net_positions.is_empty() {
        println!("  Net by symbol:");
        net_position_rows(&p.net_positions);
    }
    println!(
        "  Total: {} positions, volume {}, profit {:.2}",
        p.positions_count, p.total_volume, p.total_profit
    );
    footer();
}

pub fn agent_page(page: &Page<Agent>) {
    header(&format!("AGENTS ({} of {})", page.items.len(), page.total));
    for a in &page.items {
        println!(
            "  {:>6}  {:<28} {:<28} {}",
            a.id,
            a.name,
            a.email,
            if a.is_active { "active" } else { "inactive" }
        );
    }
    footer();
}

pub fn agent(a: &Agent) {
    header(&format!("AGENT #{}", a.id));
    println!("  Name:    {}", a.name);
    println!("  Email:   {}", a.email);
    println!("  Phone:   {}", or_dash(a.phone.as_deref()));
    println!("  Active:  {}", a.is_active);
    footer();
}

pub fn user_list(list: &UserList) {
    header(&format!("USERS ({} of {})", list.users.len(), list.total));
    for u in &list.users {
        println!(
            "  {:>6}  {:<28} {:<24} {:<8} {}",
            u.id,
            u.email,
            or_dash(u.full_name.as_deref()),
            u.role.as_str(),
            if u.is_active { "active" } else { "inactive" }
        );
    }
    footer();
}

pub fn user(u: &User) {
    header(&format!("USER #{}", u.id));
    println!("  Email:     {}", u.email);
    println!("  Name:      {}", or_dash(u.full_name.as_deref()));
    println!("  Role:      {}", u.role.as_str());
    println!("  Active:    {}", u.is_active);
    if let Some(created) = u.created_at {
        println!("  Created:   {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(updated) = u.updated_at {
        println!("  Updated:   {}", updated.format("%Y-%m-%d %H:%M"));
    }
    footer();
}

pub fn account_page(page: &Page<Mt5Account>) {
    header(&format!("MT5 ACCOUNTS ({} of {})", page.items.len(), page.total));
    for a in &page.items {
        println!(
            "  {:>8}  customer {:>6}  {:<20} 1:{:<4} {:>12.2} {} ({})",
            a.login,
            a.customer_id,
            a.group,
            a.leverage,
            a.balance,
            a.currency,
            a.status.as_str()
        );
    }
    footer();
}

pub fn account(a: &Mt5Account) {
    header(&format!("MT5 ACCOUNT {}", a.login));
    println!("  Customer:  #{}", a.customer_id);
    println!("  Group:     {}", a.group);
    println!("  Leverage:  1:{}", a.leverage);
    println!("  Balance:   {:.2} {}", a.balance, a.currency);
    println!("  Credit:    {:.2}", a.credit);
    println!("  Status:    {}", a.status.as_str());
    footer();
}

pub fn groups(groups: &[Mt5Group]) {
    header(&format!("MT5 GROUPS ({})", groups.len()));
    for g in groups {
        println!(
            "  {:<32} {:<6} {}",
            g.name,
            or_dash(g.currency.as_deref()),
            or_dash(g.company.as_deref())
        );
    }
    footer();
}

pub fn trades(login: u64, trades: &[TradeRecord]) {
    header(&format!("CLOSED TRADES: {login} ({})", trades.len()));
    for t in trades {
        let side = match t.side {
            Some(PositionSide::Buy) => "buy",
            Some(PositionSide::Sell) => "sell",
            None => "?",
        };
        println!(
            "  {:<19}  {:>10}  {:<10} {:<4} {:>8} @ {:<10} {:>10.2}",
            t.datetime, t.deal_id, t.symbol, side, t.volume, t.price, t.net_profit()
        );
    }
    let total: Decimal = trades.iter().map(TradeRecord::net_profit).sum();
    println!("  Net result: {total:.2}");
    footer();
}

pub fn realtime(snapshots: &[RealtimeAccountSnapshot]) {
    header(&format!("REALTIME ({} accounts)", snapshots.len()));
    println!(
        "  {:>8}  {:>12} {:>12} {:>12} {:>10} {:>12}",
        "login", "balance", "equity", "margin", "level %", "floating"
    );
    for s in snapshots {
        println!(
            "  {:>8}  {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>12.2}",
            s.login, s.balance, s.equity, s.margin, s.margin_level, s.floating_profit
        );
    }
    footer();
}

fn position_rows(positions: &[Position]) {
    for p in positions {
        println!(
            "  {:>10}  {:>8}  {:<10} {:<4} {:>8} @ {:<10} {:>10.2}",
            p.ticket,
            p.login,
            p.symbol,
            match p.side {
                PositionSide::Buy => "buy",
                PositionSide::Sell => "sell",
            },
            p.volume,
            p.price_open,
            p.profit
        );
    }
}

pub fn positions(positions: &[Position]) {
    header(&format!("OPEN POSITIONS ({})", positions.len()));
    position_rows(positions);
    footer();
}

fn net_position_rows(rows: &[NetPosition]) {
    for n in rows {
        println!(
            "  {:<10} buy {:>8}  sell {:>8}  net {:>8}  profit {:>10.2}  ({} pos)",
            n.symbol, n.buy_volume, n.sell_volume, n.net_volume, n.net_profit, n.positions_count
        );
    }
}

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

pub fn balance_operation(op: &BalanceOperation) {
    println!(
        "  #{:<6} {:>8}  {:?}  {:.2}  {}  {}",
        op.id,
        op.login,
        op.operation_type,
        op.amount,
        op.status.as_str(),
        op.comment.as_deref().unwrap_or("")
    );
    if let Some(error) = &op.error_message {
        println!("          error: {error}");
    }
}

pub fn balance_page(page: &Page<BalanceOperation>) {
    header(&format!("BALANCE OPERATIONS ({} of {})", page.items.len(), page.total));
    for op in &page.items {
        balance_operation(op);
    }
    footer();
}

pub fn net_deposit(report: &NetDepositReport) {
    let s = &report.summary;
    let login = report
        .login
        .map(|l| l.to_string())
        .unwrap_or_else(|| "all accounts".to_string());
    header(&format!("NET DEPOSIT: {login}"));
    if !report.from_date.is_empty() || !report.to_date.is_empty() {
        println!("  Period:            {} → {}", report.from_date, report.to_date);
    }
    println!("  Deposits:          {:.2}", s.total_deposits);
    println!("  Withdrawals:       {:.2}", s.total_withdrawals);
    println!("  Net Deposit:       {:.2}", s.net_deposit);
    println!("  Net (DT/WT):       {:.2}", s.net_deposit_tagged);
    println!("  Net Promotion:     {:.2}", s.net_promotion);
    println!(
        "  Transactions:      {} deposits, {} withdrawals",
        report.deposits.count, report.withdrawals.count
    );
    footer();
}

pub fn pnl_record(r: &DailyPnlRecord) {
    header(&format!("DAILY P&L: {} on {}", r.login, r.date));
    println!("  Equity (prev day): {:.2}", r.equity_prev_day);
    println!("  Equity (present):  {:.2}", r.present_equity);
    println!("  Deposits:          {:.2}", r.deposit);
    println!("  Withdrawals:       {:.2}", r.withdrawal);
    println!("  Net Deposit:       {:.2}", r.net_deposit);
    println!("  Promotion:         {:.2}", r.promotion);
    println!("  Net Credit/Promo:  {:.2}", r.net_credit_promotion);
    println!("  IB:                {:.2}", r.total_ib);
    println!("  Rebate:            {:.2}", r.rebate);
    println!("  Equity P&L:        {:.2}", r.equity_pnl);
    println!("  Net P&L:           {:.2}", r.net_pnl);
    footer();
}

pub fn pnl_report(report: &DailyPnlReport, totals: &PnlTotals) {
    header(&format!(
        "DAILY P&L {} → {} ({} records)",
        report.from_date.as_deref().unwrap_or("?"),
        report.to_date.as_deref().unwrap_or("?"),
        report.count
    ));
    println!(
        "  {:<10} {:>8} {:>12} {:>12} {:>12} {:>10}",
        "date", "login", "net dep", "equity pnl", "net pnl", "ib"
    );
    for r in &report.records {
        println!(
            "  {:<10} {:>8} {:>12.2} {:>12.2} {:>12.2} {:>10.2}",
            r.date, r.login, r.net_deposit, r.equity_pnl, r.net_pnl, r.total_ib
        );
    }
    println!(
        "  {:<19} {:>12.2} {:>12.2} {:>12.2} {:>10.2}",
        "TOTAL", totals.net_deposit, totals.equity_pnl, totals.net_pnl, totals.total_ib
    );
    footer();
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

pub fn margin_calls(calls: &[MarginCall]) {
    header(&format!("MARGIN CALLS ({})", calls.len()));
    for c in calls {
        let severity = match c.severity() {
            MarginSeverity::Critical => "CRITICAL",
            MarginSeverity::Warning => "warning",
        };
        println!(
            "  {:>8}  {:<24} level {:>8.2}%  equity {:>12.2}  margin {:>12.2}  {}",
            c.login, c.name, c.margin_level, c.equity, c.margin, severity
        );
    }
    footer();
}

pub fn exposure(e: &ExposureSummary) {
    header(&format!("EXPOSURE ({} positions)", e.positions_count));
    println!("  Long:     {}", e.total_long);
    println!("  Short:    {}", e.total_short);
    println!("  Net:      {}", e.net_exposure);
    println!("  Profit:   {:.2}", e.total_profit);
    net_position_rows(&e.symbols);
    footer();
}

pub fn audit(entries: &[AuditLogEntry]) {
    header(&format!("AUDIT LOG ({})", entries.len()));
    for e in entries {
        println!(
            "  {}  actor {:>4}  {:<8} {}/{}",
            e.created_at.format("%Y-%m-%d %H:%M:%S"),
            e.actor_id,
            e.action.as_str(),
            e.entity,
            e.entity_id
        );
    }
    footer();
}

pub fn audit_statistics(stats: &AuditStatistics) {
    header(&format!("AUDIT STATISTICS (last {} days)", stats.period_days));
    println!("  Entries:   {}", stats.total_logs);
    println!("  By action:");
    for (action, count) in &stats.action_counts {
        println!("    {action:<20} {count:>6}");
    }
    println!("  By entity:");
    for (entity, count) in &stats.entity_types {
        println!("    {entity:<20} {count:>6}");
    }
    println!("  Most active:");
    for (actor, count) in stats.busiest_actors().into_iter().take(10) {
        println!("    actor {actor:<14} {count:>6}");
    }
    footer();
}

// ---------------------------------------------------------------------------
// Live
// ---------------------------------------------------------------------------

pub fn dashboard(d: &DashboardSummary) {
    let s = &d.stats;
    header("DASHBOARD");
    println!("  Equity:     {:.2}", s.total_equity);
    println!("  Balance:    {:.2}", s.total_balance);
    println!("  Margin:     {:.2}", s.total_margin);
    println!("  Floating:   {:.2}", s.total_floating_profit);
    println!("  Positions:  {} (volume {})", s.active_positions, s.total_volume);
    if !d.margin_calls.is_empty() {
        println!("  Margin calls:");
        for c in &d.margin_calls {
            println!("    {:>8}  {:>8.2}%  {:?}", c.login, c.margin_level, c.severity());
        }
    }
    footer();
}

pub fn account_state(state: &AccountState) {
    let login = state
        .account
        .as_ref()
        .map(|a| a.login)
        .or_else(|| state.realtime.as_ref().map(|r| r.login))
        .unwrap_or_default();
    header(&format!("ACCOUNT {login}"));
    match &state.realtime {
        Some(r) => {
            println!("  Equity:     {:.2} {}", r.equity, r.currency);
            println!("  Balance:    {:.2}", r.balance);
            println!("  Margin:     {:.2} (level {:.2}%)", r.margin, r.margin_level);
            println!("  Floating:   {:.2}", r.floating_profit);
        }
        None => println!("  No realtime data"),
    }
    position_rows(&state.positions);
    footer();
}
