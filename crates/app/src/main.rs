use std::io::Write;

use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod commands;
mod config;

use args::{Args, Command, print_usage};
use config::Config;

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let args = Args::parse_from(std::env::args().skip(1), &config).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    init_tracing(&config.log_filter);

    let clock = Clock::default_clock();
    let app = match args.db_url.as_deref() {
        Some(url) => AppServices::new_sqlite(url, clock).await?,
        None => AppServices::new_in_memory(clock).await?,
    };
    let session = commands::open_session(&app, args.role).await?;
    info!(user = %session.current().id, command = ?args.command, "running command");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&app, &session, &args.command, args.json, &mut out).await?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
