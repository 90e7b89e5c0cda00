use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infra_console::client::AdminClient;
use infra_console::config::{self, Config};
use infra_console::dashboard::{Chart, ChartConfig, ChartRegistry, Dashboard, Overview};
use infra_console::models::service::{Service, ServiceInput};
use infra_console::models::token::{Expiry, NewToken, Token, TokenQuery, TokenUpdate};
use infra_console::models::user::{User, UserInput};

mod cli;

use cli::{ChartArgs, Commands, ExpiryArgs, ServiceCommands, StatsCommands, TokenCommands, UserCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();
    let client = AdminClient::new(&cfg).context("failed to build admin client")?;
    let out = Output { json: args.json };

    let result = match args.command {
        Commands::Login { username, password } => {
            match client.login(&username, &password).await? {
                Some(session) => {
                    println!("Signed in as {}.", username);
                    println!("export INFRA_CONSOLE_SESSION={}", session);
                }
                None => println!("Signed in as {}, but no session cookie was issued.", username),
            }
            Ok(())
        }
        Commands::Logout => {
            let login = client.logout().await?;
            println!("Signed out. Sign in again at {}", login);
            Ok(())
        }
        Commands::ChangePassword { old, new, confirm } => {
            let confirm = confirm.unwrap_or_else(|| new.clone());
            let ack = client.change_password(&old, &new, &confirm).await?;
            println!("{}", ack.message.unwrap_or_else(|| "Password changed.".into()));
            Ok(())
        }
        Commands::User { command } => handle_user_command(&client, out, command).await,
        Commands::Service { command } => handle_service_command(&client, out, command).await,
        Commands::Token { command } => handle_token_command(&client, out, command).await,
        Commands::Stats { command } => handle_stats_command(&client, &cfg, out, command).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "infra-console"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    // Logs go to stderr so tables and --json output stay clean on stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "infra_console=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(telemetry_layer)
        .init();
    Ok(())
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON when requested, otherwise run the table printer.
    fn emit<T: Serialize + ?Sized>(&self, value: &T, table: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table(value);
        }
        Ok(())
    }
}

// ── Users ─────────────────────────────────────────────────────

async fn handle_user_command(client: &AdminClient, out: Output, cmd: UserCommands) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users = client.list_users().await?;
            out.emit(&users, |users| print_users(users))
        }
        UserCommands::Get { id } => {
            let user = client.get_user(id).await?;
            out.emit(&user, |u| print_users(std::slice::from_ref(u)))
        }
        UserCommands::Create { username } => {
            let user = client.create_user(&UserInput::new(username)).await?;
            println!("Created user {} ({})", user.username, user.id);
            Ok(())
        }
        UserCommands::Update { id, username, active } => {
            let input = UserInput { username, is_active: active };
            let user = client.update_user(id, &input).await?;
            println!("Updated user {} ({})", user.username, user.id);
            Ok(())
        }
        UserCommands::Delete { id } => {
            client.delete_user(id).await?;
            println!("Deleted user {}", id);
            Ok(())
        }
        UserCommands::Status { id, active } => {
            let change = client.set_user_status(id, active).await?;
            println!("User {} is now {}", id, active_label(change.is_active));
            Ok(())
        }
    }
}

fn print_users(users: &[User]) {
    println!("{:<8} {:<32} {:<10}", "ID", "USERNAME", "STATUS");
    println!("{}", "-".repeat(52));
    for u in users {
        println!("{:<8} {:<32} {:<10}", u.id, u.username, active_label(u.is_active));
    }
}

// ── Services ──────────────────────────────────────────────────

async fn handle_service_command(
    client: &AdminClient,
    out: Output,
    cmd: ServiceCommands,
) -> anyhow::Result<()> {
    match cmd {
        ServiceCommands::List => {
            let services = client.list_services().await?;
            out.emit(&services, |s| print_services(s))
        }
        ServiceCommands::Get { id } => {
            let service = client.get_service(id).await?;
            out.emit(&service, |s| print_services(std::slice::from_ref(s)))
        }
        ServiceCommands::Create { fields } => {
            let input = ServiceInput {
                name: fields.name,
                description: fields.description,
                base_url: fields.base_url,
                is_active: true,
            };
            let service = client.create_service(&input).await?;
            println!("Created service {} ({})", service.name, service.id);
            Ok(())
        }
        ServiceCommands::Update { id, fields, active } => {
            let input = ServiceInput {
                name: fields.name,
                description: fields.description,
                base_url: fields.base_url,
                is_active: active,
            };
            let service = client.update_service(id, &input).await?;
            println!("Updated service {} ({})", service.name, service.id);
            Ok(())
        }
        ServiceCommands::Delete { id } => {
            client.delete_service(id).await?;
            println!("Deleted service {}", id);
            Ok(())
        }
        ServiceCommands::Status { id, active } => {
            let change = client.set_service_status(id, active).await?;
            println!("Service {} is now {}", id, active_label(change.is_active));
            Ok(())
        }
    }
}

fn print_services(services: &[Service]) {
    println!("{:<8} {:<24} {:<40} {:<10}", "ID", "NAME", "BASE URL", "STATUS");
    println!("{}", "-".repeat(84));
    for s in services {
        println!(
            "{:<8} {:<24} {:<40} {:<10}",
            s.id,
            s.name,
            s.base_url,
            active_label(s.is_active)
        );
    }
}

// ── Tokens ────────────────────────────────────────────────────

fn parse_expiry(args: &ExpiryArgs) -> anyhow::Result<Option<Expiry>> {
    if args.permanent {
        return Ok(Some(Expiry::Never));
    }
    let Some(raw) = args.expires.as_deref() else {
        return Ok(None);
    };
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(Expiry::At(t.with_timezone(&Utc))));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid --expires '{}': expected RFC 3339 or YYYY-MM-DD", raw))?;
    match day.and_hms_opt(0, 0, 0) {
        Some(midnight) => Ok(Some(Expiry::At(midnight.and_utc()))),
        None => bail!("invalid --expires '{}'", raw),
    }
}

async fn handle_token_command(client: &AdminClient, out: Output, cmd: TokenCommands) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::List { user, service } => {
            let query = TokenQuery {
                user_id: user,
                service_id: service,
            };
            let tokens = client.list_tokens(query).await?;
            out.emit(&tokens, |t| print_tokens(t))
        }
        TokenCommands::ForUser { user_id } => {
            let tokens = client.list_user_tokens(user_id).await?;
            out.emit(&tokens, |t| print_tokens(t))
        }
        TokenCommands::ForService { service_id } => {
            let tokens = client.list_service_tokens(service_id).await?;
            out.emit(&tokens, |t| print_tokens(t))
        }
        TokenCommands::Get { id } => {
            let token = client.get_token(id).await?;
            if out.json {
                println!("{}", serde_json::to_string_pretty(&token)?);
            } else {
                print_tokens(std::slice::from_ref(&token));
                println!("\nValue: {}", token.token_value);
            }
            Ok(())
        }
        TokenCommands::Create { user, service, expiry } => {
            let input = NewToken::new(user, service, parse_expiry(&expiry)?);
            let token = client.create_token(&input).await?;
            println!("Created token {} ({})", token.id, token.status());
            println!("Value: {}", token.token_value);
            println!("Store it now; list views only show a masked prefix.");
            Ok(())
        }
        TokenCommands::Update { id, active, expiry } => {
            let input = TokenUpdate::new(active, parse_expiry(&expiry)?);
            let token = client.update_token(id, &input).await?;
            println!("Updated token {} ({})", token.id, token.status());
            Ok(())
        }
        TokenCommands::Delete { id } => {
            client.delete_token(id).await?;
            println!("Deleted token {}", id);
            Ok(())
        }
        TokenCommands::Status { id, active } => {
            let change = client.set_token_status(id, active).await?;
            println!("Token {} is now {}", id, active_label(change.is_active));
            Ok(())
        }
    }
}

fn print_tokens(tokens: &[Token]) {
    println!(
        "{:<8} {:<20} {:<16} {:<20} {:<22} {:<10}",
        "ID", "TOKEN", "USER", "SERVICE", "EXPIRES", "STATUS"
    );
    println!("{}", "-".repeat(100));
    for t in tokens {
        let expires = match t.expiry {
            Some(Expiry::Never) => "never".to_string(),
            Some(Expiry::At(at)) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        };
        println!(
            "{:<8} {:<20} {:<16} {:<20} {:<22} {:<10}",
            t.id,
            t.label(),
            t.owner_name(),
            t.service_name(),
            expires,
            t.status()
        );
    }
}

// ── Statistics ────────────────────────────────────────────────

async fn handle_stats_command(
    client: &AdminClient,
    cfg: &Config,
    out: Output,
    cmd: StatsCommands,
) -> anyhow::Result<()> {
    let charts = ChartRegistry::new();
    let dashboard = Dashboard::new(client, &charts);
    let chart_config = |args: ChartArgs| {
        let mut c = ChartConfig::new(args.entity, args.days.unwrap_or(cfg.window_days));
        c.kind = args.kind;
        c
    };

    let chart = match cmd {
        StatsCommands::Overview { days } => {
            let overview = dashboard.overview(days.unwrap_or(cfg.window_days)).await?;
            return out.emit(&overview, print_overview);
        }
        StatsCommands::Daily { days } => dashboard.daily_requests(days.unwrap_or(cfg.window_days)).await?,
        StatsCommands::Services => dashboard.service_usage().await?,
        StatsCommands::ServiceTime(args) => dashboard.service_time(chart_config(args)).await?,
        StatsCommands::TokenTime(args) => dashboard.token_time(chart_config(args)).await?,
        StatsCommands::UserServices { chart, totals: false } => dashboard.user_services(chart_config(chart)).await?,
        StatsCommands::UserServices { chart, totals: true } => {
            dashboard.user_service_totals(chart_config(chart)).await?
        }
        StatsCommands::UserTokens { chart, totals: false } => dashboard.user_tokens(chart_config(chart)).await?,
        StatsCommands::UserTokens { chart, totals: true } => dashboard.user_token_totals(chart_config(chart)).await?,
    };
    charts.teardown();

    match chart {
        Some(chart) => out.emit(&chart, print_chart),
        None => Ok(()),
    }
}

fn print_overview(o: &Overview) {
    println!("Last {} days", o.window_days);
    println!("{:<24} {}", "Total requests", o.cards.total_count);
    println!("{:<24} {}", "Peak active users", o.cards.max_user_count);
    println!("{:<24} {}", "Peak active services", o.cards.max_service_count);
    println!("{:<24} {}", "Peak active tokens", o.cards.max_token_count);
    match o.request_trend {
        Some(t) => println!(
            "{:<24} {:+.1}% ({} vs {})",
            "Request trend", t.percent_change, t.recent_sum, t.prior_sum
        ),
        None => println!("{:<24} n/a", "Request trend"),
    }
}

fn print_chart(chart: &Chart) {
    println!("{}", chart.title);
    if chart.is_empty() {
        println!("(no data)");
        return;
    }
    print!("{:<12}", "");
    for d in &chart.datasets {
        print!(" {:>14}", truncate(&d.label, 14));
    }
    println!();
    for (i, label) in chart.labels.iter().enumerate() {
        print!("{:<12}", truncate(label, 12));
        for d in &chart.datasets {
            print!(" {:>14}", d.values.get(i).copied().unwrap_or(0));
        }
        println!();
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

fn active_label(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "disabled"
    }
}
