use anyhow::Result;
use rusqlite::Connection;

use crate::error::StoreError;

pub struct Database {
    pub conn: Connection,
}

/// Async database wrapper around `tokio_rusqlite::Connection`.
///
/// Runs all SQLite operations on a dedicated background thread via
/// `tokio_rusqlite`, keeping the Tokio runtime cooperative. Clone is
/// cheap (shared mpsc sender to the background thread).
#[derive(Clone)]
pub struct AsyncDb {
    conn: tokio_rusqlite::Connection,
}

impl AsyncDb {
    /// Open a database at `path`, set PRAGMAs and run migrations on the background thread.
    ///
    /// The store is usually shared with the ingestion side that writes box scores and
    /// predictions, so a locked database is retried with backoff instead of failing the search.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open(path).await?;

        let mut backoff = std::time::Duration::from_millis(250);
        let max_backoff = std::time::Duration::from_secs(5);
        let max_total_wait = std::time::Duration::from_secs(60);
        let start = std::time::Instant::now();

        loop {
            let res = conn
                .call(|conn| -> std::result::Result<(), rusqlite::Error> {
                    conn.busy_timeout(std::time::Duration::from_secs(1))?;
                    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
                    conn.execute_batch(SCHEMA)?;
                    migrate_games_game_type(conn)?;
                    conn.busy_timeout(std::time::Duration::from_secs(30))?;
                    Ok(())
                })
                .await;

            match res {
                Ok(()) => break,
                Err(tokio_rusqlite::Error::Error(err)) => {
                    let is_locked = matches!(
                        err,
                        rusqlite::Error::SqliteFailure(
                            rusqlite::ffi::Error {
                                code: rusqlite::ffi::ErrorCode::DatabaseBusy
                                    | rusqlite::ffi::ErrorCode::DatabaseLocked,
                                ..
                            },
                            _,
                        )
                    );
                    if !is_locked {
                        return Err(
                            anyhow::Error::from(err).context("AsyncDb::open: migration failed")
                        );
                    }
                    if start.elapsed() >= max_total_wait {
                        return Err(anyhow::Error::from(err).context(
                            "AsyncDb::open: migration failed (database stayed locked too long)",
                        ));
                    }
                    tracing::warn!(
                        wait_for = ?backoff,
                        "AsyncDb::open: database is locked; retrying migrations"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(other) => return Err(anyhow::anyhow!("AsyncDb::open: {other}")),
            }
        }

        Ok(Self { conn })
    }

    /// Run a closure on the background SQLite thread and return the result.
    pub async fn call<F, R>(&self, op: &'static str, function: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> std::result::Result<R, rusqlite::Error>
            + Send
            + 'static,
        R: Send + 'static,
    {
        self.conn.call(move |conn| function(conn)).await.map_err(
            |e: tokio_rusqlite::Error<rusqlite::Error>| match e {
                tokio_rusqlite::Error::ConnectionClosed => {
                    StoreError::Connection("database connection closed".to_string())
                }
                tokio_rusqlite::Error::Close((_, err)) => {
                    StoreError::Connection(format!("database close error: {err}"))
                }
                tokio_rusqlite::Error::Error(source) => StoreError::Query { op, source },
                other => StoreError::Connection(format!("database error: {other}")),
            },
        )
    }

    /// Like [`Self::call`], but records metrics for query latency and errors.
    ///
    /// This measures the full wall-clock time of the operation, including queueing
    /// on the dedicated SQLite thread.
    pub async fn call_named<F, R>(&self, op: &'static str, function: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> std::result::Result<R, rusqlite::Error>
            + Send
            + 'static,
        R: Send + 'static,
    {
        let start = std::time::Instant::now();
        let res = self.call(op, function).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        match &res {
            Ok(_) => {
                metrics::histogram!(
                    "pickfinder_store_query_latency_ms",
                    "op" => op,
                    "status" => "ok"
                )
                .record(ms);
            }
            Err(e) => {
                metrics::histogram!(
                    "pickfinder_store_query_latency_ms",
                    "op" => op,
                    "status" => "err"
                )
                .record(ms);
                metrics::counter!(
                    "pickfinder_store_query_errors_total",
                    "op" => op,
                    "kind" => e.kind()
                )
                .increment(1);
            }
        }

        res
    }
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn run_migrations(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        migrate_games_game_type(&self.conn).map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// Add game_type to games if missing (stores created before playoff tracking).
fn migrate_games_game_type(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    let has: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('games') WHERE name='game_type'",
        [],
        |row| row.get(0),
    )?;
    if has == 0 {
        conn.execute(
            "ALTER TABLE games ADD COLUMN game_type TEXT NOT NULL DEFAULT 'regular_season'",
            [],
        )?;
    }
    Ok(())
}

/// `?1, ?2, ...` placeholder list for an `IN (...)` clause starting at `first`.
pub fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS teams (
    id            INTEGER PRIMARY KEY,
    full_name     TEXT NOT NULL,
    abbreviation  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_ratings (
    team_id           INTEGER NOT NULL REFERENCES teams(id),
    season            TEXT NOT NULL,
    defensive_rating  REAL,
    pace              REAL,
    PRIMARY KEY (team_id, season)
);

CREATE TABLE IF NOT EXISTS players (
    id         INTEGER PRIMARY KEY,
    full_name  TEXT NOT NULL,
    position   TEXT,
    team_id    INTEGER REFERENCES teams(id),
    is_active  INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id, is_active);

CREATE TABLE IF NOT EXISTS games (
    id            INTEGER PRIMARY KEY,
    game_date     TEXT NOT NULL,
    home_team_id  INTEGER NOT NULL REFERENCES teams(id),
    away_team_id  INTEGER NOT NULL REFERENCES teams(id),
    status        TEXT NOT NULL,
    season        TEXT NOT NULL,
    game_type     TEXT NOT NULL DEFAULT 'regular_season'
);
CREATE INDEX IF NOT EXISTS idx_games_status_date ON games(status, game_date);

CREATE TABLE IF NOT EXISTS player_game_stats (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id            INTEGER NOT NULL REFERENCES players(id),
    game_id              INTEGER NOT NULL REFERENCES games(id),
    team_id              INTEGER NOT NULL REFERENCES teams(id),
    points               REAL,
    rebounds             REAL,
    assists              REAL,
    steals               REAL,
    blocks               REAL,
    turnovers            REAL,
    three_pointers_made  REAL,
    minutes              REAL,
    UNIQUE (player_id, game_id)
);
CREATE INDEX IF NOT EXISTS idx_pgs_player ON player_game_stats(player_id);

CREATE TABLE IF NOT EXISTS predictions (
    id                             INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id                      INTEGER NOT NULL REFERENCES players(id),
    game_id                        INTEGER NOT NULL REFERENCES games(id),
    model_version                  TEXT NOT NULL,
    predicted_points               REAL,
    predicted_rebounds             REAL,
    predicted_assists              REAL,
    predicted_steals               REAL,
    predicted_blocks               REAL,
    predicted_turnovers            REAL,
    predicted_three_pointers_made  REAL,
    confidence_score               REAL,
    UNIQUE (player_id, game_id, model_version)
);
CREATE INDEX IF NOT EXISTS idx_predictions_game ON predictions(game_id, model_version);
";
