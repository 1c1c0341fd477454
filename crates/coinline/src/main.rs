//! Coinline coordinator binary.
//!
//! Configuration comes from the environment, with working defaults:
//!
//! - `COINLINE_BIND` — listen address (default `0.0.0.0:8080`)
//! - `COINLINE_DB` — SQLite path (default `data/coinline.db`)
//! - `COINLINE_MACHINES` — comma-separated machine names
//! - `COINLINE_TURN_TIMEOUT_SECS` — accept deadline (default 60)
//! - `COINLINE_COOLDOWN_SECS` — courtesy cooldown (default 10)
//! - `COINLINE_SWEEP_MS` — background sweep interval; 0 disables the
//!   background sweep entirely (default 1000)
//! - `RUST_LOG` — tracing filter (default `info`)

use std::path::Path;
use std::time::Duration;

use coinline::{CoinlineError, CoinlineServer};
use coinline_engine::{EngineConfig, QueueEngine, SystemClock};
use coinline_store::SqliteStore;
use coinline_tick::SweepConfig;

const DEFAULT_MACHINES: &str = "Maimai,Chunithm,Wacca,Sound Voltex,Groove Coaster";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), CoinlineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = env_or("COINLINE_BIND", "0.0.0.0:8080");
    let db_path = env_or("COINLINE_DB", "data/coinline.db");
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let machines: Vec<String> = env_or("COINLINE_MACHINES", DEFAULT_MACHINES)
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let config = EngineConfig {
        turn_timeout: Duration::from_secs(env_u64_or(
            "COINLINE_TURN_TIMEOUT_SECS",
            60,
        )),
        courtesy_cooldown: Duration::from_secs(env_u64_or(
            "COINLINE_COOLDOWN_SECS",
            10,
        )),
        ..EngineConfig::with_machines(machines)
    };

    let sweep_ms = env_u64_or("COINLINE_SWEEP_MS", 1_000);
    let sweep_config = if sweep_ms == 0 {
        SweepConfig::opportunistic_only()
    } else {
        SweepConfig::with_interval(Duration::from_millis(sweep_ms))
    };

    let store = SqliteStore::open(&db_path).await?;
    let engine = QueueEngine::open(config, store, SystemClock).await?;

    let server = CoinlineServer::<SqliteStore, SystemClock>::builder()
        .bind(&bind)
        .sweep_config(sweep_config)
        .build(engine)
        .await?;
    tracing::info!(addr = %bind, db = %db_path, "starting Coinline");
    server.run().await
}
