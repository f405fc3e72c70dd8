use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use boardview::BoardView;
use clap::Parser;
use scroller::{ScrollConfig, ScrollDriver};
use sync::{HttpPriceSource, SnapshotCache, SyncClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "PRICE_BOARD_URL", default_value = "http://127.0.0.1:8080")]
    endpoint: String,

    /// Start in TV mode with auto-scrolling.
    #[arg(long, env = "BOARD_TV")]
    tv: bool,

    /// Rows visible at once in TV mode.
    #[arg(long, env = "BOARD_ROWS", default_value_t = 8)]
    rows: usize,

    #[arg(long, env = "BOARD_POLL_SECS", default_value_t = 3)]
    interval_secs: u64,
}

const CLEAR: &str = "\x1b[2J\x1b[H";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let source = Arc::new(HttpPriceSource::new(&cli.endpoint)?);

    let shop = match source.fetch_shop().await {
        Ok(shop) => Some(shop),
        Err(err) => {
            warn!(error = %err, "shop info unavailable");
            None
        }
    };

    let sync = SyncClient::new(Arc::clone(&source), SnapshotCache::new())
        .with_period(Duration::from_secs(cli.interval_secs.max(1)))
        .spawn();
    let scroll = ScrollDriver::spawn(ScrollConfig::default());
    scroll.set_kiosk(cli.tv);

    let mut states = sync.subscribe();
    let mut frames = scroll.subscribe();
    let mut view = BoardView::new(shop, cli.rows, cli.tv);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(endpoint = %cli.endpoint, tv = cli.tv, "board display started");

    loop {
        let deadline = view.highlight_deadline();
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if view.apply(&state, Instant::now()) {
                    scroll.resize(view.content_height(), view.viewport_height());
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "t" => scroll.set_kiosk(view.toggle_tv()),
                    "r" => sync.revalidate(),
                    "q" => break,
                    _ => {}
                },
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = async {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => {
                view.expire(Instant::now());
            }
            _ = &mut ctrl_c => break,
        }

        let position = frames.borrow_and_update().position;
        let mut out = io::stdout().lock();
        write!(out, "{CLEAR}{}", view.render(position))?;
        out.flush()?;
    }

    sync.shutdown().await;
    scroll.shutdown().await;
    Ok(())
}
