use std::io;
use std::sync::Arc;

use admin::{AdminEditSession, AdminGate};
use anyhow::{bail, Result};
use boardctl::{login, run, Console, RuntimeReader};
use clap::Parser;
use sync::{HttpPriceSource, SnapshotCache};
use tracing::Level;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "PRICE_BOARD_URL", default_value = "http://127.0.0.1:8080")]
    endpoint: String,

    #[arg(
        long,
        env = "ADMIN_PASSWORD",
        default_value = "password",
        hide_env_values = true,
        hide_default_value = true
    )]
    secret: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let source = Arc::new(HttpPriceSource::new(&cli.endpoint)?);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(RuntimeReader::new(stdin.lock()), stdout.lock());
    if !login(&mut console, AdminGate::new(cli.secret))? {
        bail!("admin login refused");
    }

    let mut session = AdminEditSession::new(source, SnapshotCache::new());
    run(&mut console, &mut session).await?;
    Ok(())
}
