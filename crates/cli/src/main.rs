mod render;

use anyhow::{Context, Result};
use brokerdesk_analytics::{daily_pnl, exposure, margin_calls, pnl_totals};
use brokerdesk_client::{
    AccountQuery, AgentQuery, BalanceQuery, ClientConfig, CrmClient, CustomerQuery, UserQuery,
};
use brokerdesk_core::{
    AccountStatus, AgentCreate, CustomerCreate, DailyReport, DateRange, GroupMove, LiveFeed,
    PasswordChange, UserCreate, UserRole, UserUpdate,
};
use brokerdesk_live::{AccountFeed, DashboardFeed, LiveView, LiveViewConfig};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "brokerdesk")]
#[command(about = "Brokerage CRM client: customers, MT5 accounts, balances, P&L and live risk")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// TOML file with connection settings
    #[arg(long, env = "BROKERDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, env = "BROKERDESK_URL")]
    url: Option<String>,

    /// Bearer token from a previous `login`
    #[arg(long, env = "BROKERDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the access token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BROKERDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Manage customers
    Customers {
        #[command(subcommand)]
        command: CustomerCommands,
    },

    /// Manage agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Back-office users (admin only)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// MT5 accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Deposits, withdrawals and credit
    Balance {
        #[command(subcommand)]
        command: BalanceCommands,
    },

    /// Daily profit and loss
    Pnl {
        #[command(subcommand)]
        command: PnlCommands,
    },

    /// Audit trail
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },

    /// Accounts with margin level below 100%
    MarginCalls {
        /// Group pattern, e.g. 'real\*'
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Open exposure netted per symbol
    Exposure {
        #[arg(long)]
        login: Option<u64>,

        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Follow a live view until Ctrl-C
    Watch {
        #[command(subcommand)]
        command: WatchCommands,
    },
}

#[derive(Subcommand)]
enum CustomerCommands {
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long, default_value = "50")]
        limit: u64,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        agent_id: Option<i64>,

        /// Repeat for several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Delete {
        id: i64,
    },
    /// Open positions across the customer's accounts
    Positions {
        id: i64,

        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        active_only: bool,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,
    },
    Deactivate {
        id: i64,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List {
        /// Matches email or full name
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long, default_value = "100")]
        limit: u64,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BROKERDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,

        /// admin, dealer, support or viewer
        #[arg(long, value_parser = parse_user_role, default_value = "viewer")]
        role: UserRole,

        /// Create the user disabled
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: i64,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long, env = "BROKERDESK_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long, value_parser = parse_user_role)]
        role: Option<UserRole>,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    List {
        #[arg(long)]
        customer_id: Option<i64>,

        /// active, inactive, disabled or archived
        #[arg(long, value_parser = parse_account_status)]
        status: Option<AccountStatus>,

        #[arg(long, default_value = "1")]
        page: u64,

        #[arg(long, default_value = "50")]
        size: u64,
    },
    Get {
        login: u64,
    },
    /// Trading groups on the MT5 server
    Groups,
    /// Closed trades (last 30 days unless a range is given)
    Trades {
        login: u64,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Live equity and margin figures
    Realtime {
        #[arg(long)]
        login: Option<u64>,

        #[arg(short, long)]
        group: Option<String>,
    },
    Positions {
        login: u64,

        #[arg(short, long)]
        symbol: Option<String>,
    },
    MoveGroup {
        login: u64,

        #[arg(short, long)]
        group: String,
    },
    ResetPassword {
        login: u64,

        #[arg(short, long, env = "BROKERDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        /// Change the investor (read-only) password instead
        #[arg(long)]
        investor: bool,
    },
}

#[derive(Subcommand)]
enum BalanceCommands {
    List {
        #[arg(long)]
        login: Option<u64>,

        #[arg(long, default_value = "1")]
        page: u64,

        #[arg(long, default_value = "50")]
        size: u64,
    },
    Deposit {
        login: u64,
        amount: Decimal,

        #[arg(short, long)]
        comment: Option<String>,

        /// Reuse to make a retried submission safe
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    Withdraw {
        login: u64,
        amount: Decimal,

        #[arg(short, long)]
        comment: Option<String>,

        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Credit in (positive) or out (negative)
    Credit {
        login: u64,

        #[arg(allow_hyphen_values = true)]
        amount: Decimal,

        #[arg(short, long)]
        comment: Option<String>,
    },
    NetDeposit {
        #[arg(long)]
        login: Option<u64>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum PnlCommands {
    /// One account and day
    Daily {
        login: u64,

        #[arg(short, long)]
        date: NaiveDate,

        /// Use the server's calculation instead of computing it from deals
        #[arg(long)]
        server: bool,
    },
    /// Stored daily records over a range
    Range {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// Last N days instead of --from/--to
        #[arg(long, conflicts_with_all = ["from", "to"])]
        days: Option<u32>,

        #[arg(long)]
        login: Option<u64>,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    Recent {
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    Search {
        query: String,

        #[arg(short, long, default_value = "50")]
        limit: u32,
    },
    /// Full history of one entity
    Entity {
        entity_type: String,
        entity_id: String,
    },
    /// Activity counts (admin only)
    Stats {
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
}

#[derive(Subcommand)]
enum WatchCommands {
    Dashboard,
    Account { login: u64 },
}

fn parse_account_status(value: &str) -> Result<AccountStatus, String> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase()))
        .map_err(|_| format!("unknown account status: {value}"))
}

fn parse_user_role(value: &str) -> Result<UserRole, String> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase()))
        .map_err(|_| format!("unknown role: {value}"))
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.log_json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    let config = client_config(&cli)?;
    let client = CrmClient::new(config).context("Invalid client configuration")?;
    let json = cli.json;

    match cli.command {
        Commands::Login { email, password } => {
            let tokens = client.auth().login(&email, &password).await?;
            if json {
                render::emit(true, &tokens, |_| {})?;
            } else {
                println!("export BROKERDESK_TOKEN={}", tokens.access_token);
            }
        }
        Commands::Customers { command } => customers(&client, command, json).await?,
        Commands::Agents { command } => agents(&client, command, json).await?,
        Commands::Users { command } => users(&client, command, json).await?,
        Commands::Accounts { command } => accounts(&client, command, json).await?,
        Commands::Balance { command } => balance(&client, command, json).await?,
        Commands::Pnl { command } => pnl(&client, command, json).await?,
        Commands::Audit { command } => audit(&client, command, json).await?,
        Commands::MarginCalls { group } => {
            let snapshots = client.accounts().realtime(None, group.as_deref()).await?;
            let calls = margin_calls(&snapshots);
            tracing::info!(accounts = snapshots.len(), calls = calls.len(), "Margin scan done");
            render::emit(json, &calls, |c| render::margin_calls(c))?;
        }
        Commands::Exposure { login, symbol } => {
            let positions = client.positions().open(login, symbol.as_deref()).await?;
            render::emit(json, &exposure(&positions), render::exposure)?;
        }
        Commands::Watch { command } => {
            let live_config = LiveViewConfig::from_client_config(client.config())?;
            match command {
                WatchCommands::Dashboard => {
                    let feed = DashboardFeed::new(client.clone());
                    watch(feed, live_config, render::dashboard).await?;
                }
                WatchCommands::Account { login } => {
                    let feed = AccountFeed::new(client.clone(), login);
                    watch(feed, live_config, render::account_state).await?;
                }
            }
        }
    }

    Ok(())
}

async fn customers(client: &CrmClient, command: CustomerCommands, json: bool) -> Result<()> {
    let service = client.customers();
    match command {
        CustomerCommands::List {
            search,
            skip,
            limit,
        } => {
            let query = CustomerQuery {
                search,
                skip: Some(skip),
                limit: Some(limit),
            };
            render::emit(json, &service.list(&query).await?, render::customer_page)?;
        }
        CustomerCommands::Get { id } => {
            render::emit(json, &service.get(id).await?, render::customer)?;
        }
        CustomerCommands::Create {
            name,
            email,
            phone,
            address,
            agent_id,
            tags,
        } => {
            let customer = CustomerCreate {
                name,
                email,
                phone,
                address,
                agent_id,
                tags: (!tags.is_empty()).then_some(tags),
            };
            render::emit(json, &service.create(&customer).await?, render::customer)?;
        }
        CustomerCommands::Delete { id } => {
            service.delete(id).await?;
            println!("Customer {id} deleted");
        }
        CustomerCommands::Positions { id, symbol } => {
            let positions = service.positions(id, symbol.as_deref()).await?;
            render::emit(json, &positions, render::customer_positions)?;
        }
    }
    Ok(())
}

async fn agents(client: &CrmClient, command: AgentCommands, json: bool) -> Result<()> {
    let service = client.agents();
    match command {
        AgentCommands::List {
            search,
            active_only,
        } => {
            let query = AgentQuery {
                search,
                active_only,
                ..Default::default()
            };
            render::emit(json, &service.list(&query).await?, render::agent_page)?;
        }
        AgentCommands::Get { id } => {
            render::emit(json, &service.get(id).await?, render::agent)?;
        }
        AgentCommands::Create { name, email, phone } => {
            let agent = AgentCreate { name, email, phone };
            render::emit(json, &service.create(&agent).await?, render::agent)?;
        }
        AgentCommands::Deactivate { id } => {
            render::emit(json, &service.deactivate(id).await?, render::agent)?;
        }
    }
    Ok(())
}

async fn users(client: &CrmClient, command: UserCommands, json: bool) -> Result<()> {
    let service = client.users();
    match command {
        UserCommands::List {
            search,
            skip,
            limit,
        } => {
            let query = UserQuery {
                search,
                skip: Some(skip),
                limit: Some(limit),
            };
            render::emit(json, &service.list(&query).await?, render::user_list)?;
        }
        UserCommands::Get { id } => {
            render::emit(json, &service.get(id).await?, render::user)?;
        }
        UserCommands::Create {
            email,
            password,
            full_name,
            role,
            inactive,
        } => {
            let user = UserCreate {
                email,
                password,
                full_name,
                role,
                is_active: !inactive,
            };
            render::emit(json, &service.create(&user).await?, render::user)?;
        }
        UserCommands::Update {
            id,
            email,
            password,
            full_name,
            role,
            enable,
            disable,
        } => {
            let update = UserUpdate {
                email,
                password,
                full_name,
                role,
                is_active: active_flag(enable, disable),
            };
            render::emit(json, &service.update(id, &update).await?, render::user)?;
        }
        UserCommands::Delete { id } => {
            service.delete(id).await?;
            println!("User {id} deleted");
        }
    }
    Ok(())
}

/// `--enable` / `--disable` to an optional active flag.
fn active_flag(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

async fn accounts(client: &CrmClient, command: AccountCommands, json: bool) -> Result<()> {
    let service = client.accounts();
    match command {
        AccountCommands::List {
            customer_id,
            status,
            page,
            size,
        } => {
            let query = AccountQuery {
                customer_id,
                status,
                page: Some(page),
                size: Some(size),
            };
            render::emit(json, &service.list(&query).await?, render::account_page)?;
        }
        AccountCommands::Get { login } => {
            render::emit(json, &service.get(login).await?, render::account)?;
        }
        AccountCommands::Groups => {
            render::emit(json, &service.groups().await?, |g| render::groups(g))?;
        }
        AccountCommands::Trades { login, from, to } => {
            let trades = service.trade_history(login, DateRange { from, to }).await?;
            render::emit(json, &trades, |t| render::trades(login, t))?;
        }
        AccountCommands::Realtime { login, group } => {
            let snapshots = service.realtime(login, group.as_deref()).await?;
            render::emit(json, &snapshots, |s| render::realtime(s))?;
        }
        AccountCommands::Positions { login, symbol } => {
            let positions = service.positions(login, symbol.as_deref()).await?;
            render::emit(json, &positions, |p| render::positions(p))?;
        }
        AccountCommands::MoveGroup { login, group } => {
            let message = service
                .move_group(login, &GroupMove { new_group: group })
                .await?;
            println!("{message}");
        }
        AccountCommands::ResetPassword {
            login,
            password,
            investor,
        } => {
            let request = PasswordChange {
                new_password: password,
            };
            let message = if investor {
                service.change_investor_password(login, &request).await?
            } else {
                service.change_password(login, &request).await?
            };
            println!("{message}");
        }
    }
    Ok(())
}

async fn balance(client: &CrmClient, command: BalanceCommands, json: bool) -> Result<()> {
    let service = client.balance();
    let op = match command {
        BalanceCommands::List { login, page, size } => {
            let query = BalanceQuery {
                login,
                status: None,
                page: Some(page),
                size: Some(size),
            };
            return render::emit(json, &service.list(&query).await?, render::balance_page);
        }
        BalanceCommands::NetDeposit { login, from, to } => {
            let report = service.net_deposit(login, DateRange { from, to }).await?;
            return render::emit(json, &report, render::net_deposit);
        }
        BalanceCommands::Deposit {
            login,
            amount,
            comment,
            idempotency_key,
        } => {
            let request = brokerdesk_core::BalanceOperationCreate {
                login,
                operation_type: brokerdesk_core::BalanceOperationType::Deposit,
                amount,
                comment,
            };
            service.create(&request, idempotency_key.as_deref()).await?
        }
        BalanceCommands::Withdraw {
            login,
            amount,
            comment,
            idempotency_key,
        } => {
            let request = brokerdesk_core::BalanceOperationCreate {
                login,
                operation_type: brokerdesk_core::BalanceOperationType::Withdrawal,
                amount,
                comment,
            };
            service.create(&request, idempotency_key.as_deref()).await?
        }
        BalanceCommands::Credit {
            login,
            amount,
            comment,
        } => service.credit(login, amount, comment.as_deref()).await?,
    };
    render::emit(json, &op, render::balance_operation)
}

async fn pnl(client: &CrmClient, command: PnlCommands, json: bool) -> Result<()> {
    match command {
        PnlCommands::Daily {
            login,
            date,
            server,
        } => {
            let record = if server {
                client.accounts().daily_pnl(login, date).await?
            } else {
                let prev = date.pred_opt().unwrap_or(date);
                let (reports, deals) = tokio::try_join!(
                    client
                        .accounts()
                        .daily_reports(Some(login), DateRange::new(prev, date), None),
                    client.accounts().deals(Some(login), DateRange::day(date)),
                )?;
                let report = report_for(&reports, login, date)
                    .with_context(|| format!("No daily report for {login} on {date}"))?;
                daily_pnl(report, &deals)
            };
            render::emit(json, &record, render::pnl_record)?;
        }
        PnlCommands::Range {
            from,
            to,
            days,
            login,
        } => {
            let report = match days {
                Some(days) => client.reports().latest_daily_pnl(days, login).await?,
                None => client.reports().daily_pnl(DateRange { from, to }, login).await?,
            };
            let totals = pnl_totals(&report.records);
            if json {
                let body = serde_json::json!({ "report": report, "totals": totals });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                render::pnl_report(&report, &totals);
            }
        }
    }
    Ok(())
}

async fn audit(client: &CrmClient, command: AuditCommands, json: bool) -> Result<()> {
    let service = client.audit();
    let entries = match command {
        AuditCommands::Recent { limit } => service.recent(limit).await?,
        AuditCommands::Search { query, limit } => service.search(&query, limit).await?,
        AuditCommands::Entity {
            entity_type,
            entity_id,
        } => service.entity_trail(&entity_type, &entity_id).await?,
        AuditCommands::Stats { days } => {
            let stats = service.statistics(days).await?;
            return render::emit(json, &stats, render::audit_statistics);
        }
    };
    render::emit(json, &entries, |e| render::audit(e))
}

/// The report for `login` dated exactly `date`.
fn report_for(reports: &[DailyReport], login: u64, date: NaiveDate) -> Option<&DailyReport> {
    let day = date.format("%Y-%m-%d").to_string();
    reports.iter().find(|r| r.login == login && r.date == day)
}

/// Run a live view and print every published state until Ctrl-C.
async fn watch<F: LiveFeed>(
    feed: F,
    config: LiveViewConfig,
    render: fn(&F::State),
) -> Result<()> {
    let mut view = LiveView::new(feed, config);
    view.start()
        .await
        .with_context(|| format!("Could not load {} view", view.feed().name()))?;

    let mut updates = view.subscribe();
    render(&updates.borrow_and_update());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing live view");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                render(&state);
            }
        }
    }

    view.dispose().await;
    Ok(())
}
