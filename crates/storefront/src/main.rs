//! Capelli storefront - terminal front-end.
//!
//! Reads one command per line from stdin and prints the current screen
//! after each command settles. Type `help` for the command list.
//!
//! # Architecture
//!
//! - `ApiClient` (reqwest) for the storefront backend
//! - `FileSessionStore` for the persisted login token
//! - `App` for navigation and screen state
//!
//! Logs go to stderr so they never interleave with screen output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use sentry::integrations::tracing as sentry_tracing;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capelli_storefront::api::ApiClient;
use capelli_storefront::app::App;
use capelli_storefront::config::ClientConfig;
use capelli_storefront::error::{AppError, Result};
use capelli_storefront::render::render;
use capelli_storefront::screens::ScreenContext;
use capelli_storefront::session::{FileSessionStore, MemorySessionStore, SessionStore};
use capelli_storefront::shell::{self, Command};

#[derive(Parser)]
#[command(name = "capelli")]
#[command(author, version, about = "Capelli storefront in the terminal")]
struct Cli {
    /// Keep the login token in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Override `CAPELLI_SESSION_FILE`
    #[arg(long, value_name = "PATH", conflicts_with = "ephemeral")]
    session_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "capelli_storefront=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    let api = ApiClient::new(&config.api)?;
    let ctx = ScreenContext::from(&config.storefront);
    tracing::info!(base_url = %api.base_url(), "Storefront client ready");

    if cli.ephemeral {
        run(App::new(api, MemorySessionStore::new(), ctx)).await
    } else {
        let session = FileSessionStore::new(config.session_file.clone());
        run(App::new(api, session, ctx)).await
    }
}

async fn run<S: SessionStore>(mut app: App<ApiClient, S>) -> Result<()> {
    app.start().await;
    app.settle().await;
    show(&app)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match shell::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => println!("{}", shell::help()),
            Ok(Some(Command::Action(action))) => {
                app.dispatch(action).await;
                app.settle().await;
                show(&app)?;
                continue;
            }
            Err(e) => println!("{}", AppError::from(e)),
        }
        prompt()?;
    }

    tracing::info!("Goodbye");
    Ok(())
}

fn show<S: SessionStore>(app: &App<ApiClient, S>) -> Result<()> {
    if let Some(view) = app.view() {
        println!("\n{}", render(&view, app.depth()));
    }
    prompt()
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}
