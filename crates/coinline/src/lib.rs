//! # Coinline
//!
//! Turn-queue coordinator for a floor of shared arcade machines.
//!
//! Coinline arbitrates who plays next on each machine: per-machine FIFO
//! queues with timed turn offers, skip repositioning, cross-machine
//! exclusivity, and courtesy cooldowns — durably persisted after every
//! mutation and broadcast to connected observers as "something changed"
//! notices over WebSocket.
//!
//! The request gateway in front of this process owns authentication; this
//! crate trusts the handle and admin flag each connection asserts in its
//! `Hello`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use coinline::{CoinlineServer, CoinlineError};
//! use coinline_engine::{EngineConfig, QueueEngine, SystemClock};
//! use coinline_store::SqliteStore;
//!
//! # async fn run() -> Result<(), CoinlineError> {
//! let store = SqliteStore::open("data/coinline.db").await?;
//! let engine = QueueEngine::open(
//!     EngineConfig::with_machines(["Maimai", "Chunithm"]),
//!     store,
//!     SystemClock,
//! )
//! .await?;
//!
//! let server = CoinlineServer::<SqliteStore, SystemClock>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(engine)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::CoinlineError;
pub use server::{CoinlineServer, CoinlineServerBuilder};
