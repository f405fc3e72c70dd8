use std::{net::SocketAddr, sync::Arc};

use api::ApiContext;
use board::wire::ShopInfo;
use clap::Parser;
use metrics::MetricsHandle;
use storage::{ensure_parent_dir, validate_sqlite_url, Store};
use tracing::{info, warn, Level};
use uuid::Uuid;

const DEFAULT_SHOP_NAME: &str = "Hiệu vàng Kiều Anh";
const DEFAULT_SHOP_ADDRESS: &str = "442 Quang Trung, Vân Canh";
const DEFAULT_SHOP_HOTLINE: &str = "0914012392";

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "SQLITE_PATH", default_value = "sqlite://data/prices.db")]
    sqlite_path: String,

    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    listen_addr: SocketAddr,

    #[arg(long, env = "SHOP_NAME", default_value = DEFAULT_SHOP_NAME)]
    shop_name: String,

    #[arg(long, env = "SHOP_ADDRESS", default_value = DEFAULT_SHOP_ADDRESS)]
    shop_address: String,

    #[arg(long, env = "SHOP_HOTLINE", default_value = DEFAULT_SHOP_HOTLINE)]
    shop_hotline: String,
}

impl Args {
    fn shop(&self) -> ShopInfo {
        ShopInfo {
            name: self.shop_name.clone(),
            address: self.shop_address.clone(),
            hotline: self.shop_hotline.clone(),
        }
    }
}

fn log_startup(args: &Args, run_id: &str) {
    info!(path = %args.sqlite_path, "sqlite path configured");
    info!(addr = %args.listen_addr, "price api bind planned");
    info!(shop = %args.shop_name, "shop configured");
    info!(%run_id, "run initialized");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = ?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    validate_sqlite_url(&args.sqlite_path)?;
    info!(
        sqlite = %args.sqlite_path,
        addr = %args.listen_addr,
        "booting boardd"
    );

    ensure_parent_dir(&args.sqlite_path)?;

    let run_id = Uuid::new_v4().to_string();
    log_startup(&args, &run_id);

    let store = Arc::new(Store::new(args.sqlite_path.clone()));
    let missing_tables = store.validate_required_tables().await?;
    if !missing_tables.is_empty() {
        warn!(tables = ?missing_tables, "sqlite missing required tables");
    }

    let metrics = MetricsHandle::new()?;
    let ctx = Arc::new(ApiContext::new(store, metrics, args.shop()));

    info!(
        run_id = %run_id,
        sqlite = %args.sqlite_path,
        addr = %args.listen_addr,
        "ready"
    );
    api::serve(ctx, args.listen_addr, shutdown_signal()).await?;
    info!(run_id = %run_id, "stopped");
    Ok(())
}
