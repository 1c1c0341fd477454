//! SQLite [`StateStore`] implementation using `sqlx`.

use std::path::Path;
use std::str::FromStr;

use coinline_protocol::{
    CooldownSnapshot, FullState, MachineId, MachineSnapshot, PlayerHandle,
    PlayerSnapshot, Timestamp, TurnPhase,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{StateStore, StoreError};

/// Table definitions. One row per machine, per player, per live cooldown,
/// plus key/value rows for the global flags.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS machines (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    queue TEXT NOT NULL DEFAULT '[]',
    holder TEXT,
    phase TEXT NOT NULL DEFAULT 'Idle',
    turn_started INTEGER,
    turn_deadline INTEGER,
    active_since INTEGER
);

CREATE TABLE IF NOT EXISTS players (
    handle TEXT PRIMARY KEY,
    play_time_ms INTEGER NOT NULL DEFAULT 0,
    play_time_offset_ms INTEGER NOT NULL DEFAULT 0,
    skip_count INTEGER NOT NULL DEFAULT 0,
    session_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cooldowns (
    player TEXT NOT NULL,
    machine TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (player, machine)
);

CREATE TABLE IF NOT EXISTS floor (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

/// A [`StateStore`] backed by a local SQLite file.
///
/// Saves replace the entire snapshot inside one transaction, so a crash
/// mid-save leaves the previous snapshot intact. The coordinator is the
/// only writer, so the pool holds a single connection.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `path` and ensures the
    /// schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let store = Self::connect(options).await?;
        tracing::info!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(store)
    }

    /// Opens a throwaway in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        // One connection: an in-memory database lives and dies with its
        // connection, and the file store has a single serialized writer.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

impl StateStore for SqliteStore {
    async fn load(&self) -> Result<Option<FullState>, StoreError> {
        // The floor table always carries a 'paused' row once anything has
        // been saved; its absence means a fresh database.
        let floor_rows = sqlx::query("SELECT key, value FROM floor")
            .fetch_all(&self.pool)
            .await?;
        if floor_rows.is_empty() {
            return Ok(None);
        }

        let mut paused = false;
        let mut pause_started = None;
        for row in &floor_rows {
            let key: String = row.try_get("key")?;
            let value: Option<String> = row.try_get("value")?;
            match key.as_str() {
                "paused" => paused = value.as_deref() == Some("1"),
                "pause_started" => {
                    pause_started = value
                        .map(|v| {
                            v.parse::<i64>().map(Timestamp::from_millis).map_err(
                                |_| {
                                    StoreError::Corrupt(format!(
                                        "bad pause_started value: {v}"
                                    ))
                                },
                            )
                        })
                        .transpose()?;
                }
                _ => {}
            }
        }

        let machine_rows = sqlx::query(
            "SELECT id, queue, holder, phase, turn_started, turn_deadline, \
             active_since FROM machines ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut machines = Vec::with_capacity(machine_rows.len());
        for row in machine_rows {
            let id: String = row.try_get("id")?;
            let queue_json: String = row.try_get("queue")?;
            let queue: Vec<PlayerHandle> = serde_json::from_str(&queue_json)
                .map_err(|e| {
                    StoreError::Corrupt(format!("bad queue for {id}: {e}"))
                })?;
            let phase_str: String = row.try_get("phase")?;
            let phase = TurnPhase::parse(&phase_str).ok_or_else(|| {
                StoreError::Corrupt(format!("bad phase for {id}: {phase_str}"))
            })?;
            machines.push(MachineSnapshot {
                id: MachineId::new(id),
                queue,
                holder: row
                    .try_get::<Option<String>, _>("holder")?
                    .map(PlayerHandle::new),
                phase,
                turn_started: row
                    .try_get::<Option<i64>, _>("turn_started")?
                    .map(Timestamp::from_millis),
                turn_deadline: row
                    .try_get::<Option<i64>, _>("turn_deadline")?
                    .map(Timestamp::from_millis),
                active_since: row
                    .try_get::<Option<i64>, _>("active_since")?
                    .map(Timestamp::from_millis),
            });
        }

        let player_rows = sqlx::query(
            "SELECT handle, play_time_ms, play_time_offset_ms, skip_count, \
             session_count FROM players ORDER BY handle ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut players = Vec::with_capacity(player_rows.len());
        for row in player_rows {
            players.push(PlayerSnapshot {
                handle: PlayerHandle::new(row.try_get::<String, _>("handle")?),
                play_time_ms: row.try_get("play_time_ms")?,
                play_time_offset_ms: row.try_get("play_time_offset_ms")?,
                skip_count: row.try_get("skip_count")?,
                session_count: row.try_get("session_count")?,
            });
        }

        let cooldown_rows = sqlx::query(
            "SELECT player, machine, expires_at FROM cooldowns \
             ORDER BY player ASC, machine ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut cooldowns = Vec::with_capacity(cooldown_rows.len());
        for row in cooldown_rows {
            cooldowns.push(CooldownSnapshot {
                player: PlayerHandle::new(row.try_get::<String, _>("player")?),
                machine: MachineId::new(row.try_get::<String, _>("machine")?),
                expires_at: Timestamp::from_millis(row.try_get("expires_at")?),
            });
        }

        Ok(Some(FullState {
            machines,
            players,
            cooldowns,
            paused,
            pause_started,
        }))
    }

    async fn save(&self, state: &FullState) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM machines").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM players").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM cooldowns").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM floor").execute(&mut *tx).await?;

        for (position, m) in state.machines.iter().enumerate() {
            let queue_json = serde_json::to_string(&m.queue).map_err(|e| {
                StoreError::Corrupt(format!("queue encode for {}: {e}", m.id))
            })?;
            sqlx::query(
                "INSERT INTO machines \
                 (id, position, queue, holder, phase, turn_started, \
                  turn_deadline, active_since) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(m.id.as_str())
            .bind(position as i64)
            .bind(&queue_json)
            .bind(m.holder.as_ref().map(|h| h.as_str()))
            .bind(m.phase.as_str())
            .bind(m.turn_started.map(Timestamp::as_millis))
            .bind(m.turn_deadline.map(Timestamp::as_millis))
            .bind(m.active_since.map(Timestamp::as_millis))
            .execute(&mut *tx)
            .await?;
        }

        for p in &state.players {
            sqlx::query(
                "INSERT INTO players \
                 (handle, play_time_ms, play_time_offset_ms, skip_count, \
                  session_count) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(p.handle.as_str())
            .bind(p.play_time_ms)
            .bind(p.play_time_offset_ms)
            .bind(p.skip_count)
            .bind(p.session_count)
            .execute(&mut *tx)
            .await?;
        }

        for c in &state.cooldowns {
            sqlx::query(
                "INSERT INTO cooldowns (player, machine, expires_at) \
                 VALUES (?1, ?2, ?3)",
            )
            .bind(c.player.as_str())
            .bind(c.machine.as_str())
            .bind(c.expires_at.as_millis())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO floor (key, value) VALUES ('paused', ?1)")
            .bind(if state.paused { "1" } else { "0" })
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO floor (key, value) VALUES ('pause_started', ?1)")
            .bind(state.pause_started.map(|t| t.as_millis().to_string()))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
