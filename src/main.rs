use std::time::Duration;

use clap::Parser;
use keva::{Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Set and read back a key against a key-value store")]
struct Args {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    db: Option<u16>,
    #[arg(long, default_value = "mykey")]
    key: String,
    #[arg(long, default_value = "Hello, Redis from Go!")]
    value: String,
    /// Time-to-live in seconds
    #[arg(long, default_value_t = 10)]
    ttl: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    // The credential comes from KEVA_PASSWORD only; secrets never appear on
    // the command line.
    let mut config = match SessionConfig::from_env() {
        Ok(config) => config,
        Err(e) => fatal("load configuration", e),
    };
    if let Some(host) = args.host {
        config = config.set_host(host);
    }
    if let Some(port) = args.port {
        config = config.set_port(port);
    }
    if let Some(db) = args.db {
        config = config.set_db_index(db);
    }

    let mut session = match Session::open(config).await {
        Ok(session) => session,
        Err(e) => fatal("open session", e),
    };

    if let Err(e) = session.set(&args.key, &args.value, Some(Duration::from_secs(args.ttl))).await
    {
        fatal("set key", e);
    }

    let value = match session.get(&args.key).await {
        Ok(value) => value,
        Err(e) => fatal("get key", e),
    };

    println!("Key: {}, Value: {}", args.key, value);

    if let Err(e) = session.close().await {
        fatal("close session", e);
    }
}

fn fatal(operation: &str, cause: impl std::fmt::Display) -> ! {
    tracing::error!(%cause, "could not {operation}");
    std::process::exit(1);
}
