//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `prey_snapshots`, `predator_snapshots`, `tick_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{OutputResult, PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn: Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS prey_snapshots (
                 agent_id INTEGER NOT NULL,
                 tick     INTEGER NOT NULL,
                 pos_x    REAL NOT NULL,
                 pos_y    REAL NOT NULL,
                 pos_z    REAL NOT NULL,
                 dir_x    REAL NOT NULL,
                 dir_y    REAL NOT NULL,
                 dir_z    REAL NOT NULL,
                 speed    REAL NOT NULL,
                 state    INTEGER NOT NULL,
                 stress   REAL NOT NULL
             );
             CREATE TABLE IF NOT EXISTS predator_snapshots (
                 agent_id INTEGER NOT NULL,
                 tick     INTEGER NOT NULL,
                 pos_x    REAL NOT NULL,
                 pos_y    REAL NOT NULL,
                 pos_z    REAL NOT NULL,
                 dir_x    REAL NOT NULL,
                 dir_y    REAL NOT NULL,
                 dir_z    REAL NOT NULL,
                 speed    REAL NOT NULL,
                 state    INTEGER NOT NULL,
                 stress   REAL NOT NULL,
                 target   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick          INTEGER PRIMARY KEY,
                 sim_time_secs REAL NOT NULL,
                 prey_count    INTEGER NOT NULL,
                 pred_count    INTEGER NOT NULL,
                 prey_groups   INTEGER NOT NULL,
                 pred_groups   INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_prey_snapshots(&mut self, rows: &[PreySnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO prey_snapshots \
                 (agent_id, tick, pos_x, pos_y, pos_z, dir_x, dir_y, dir_z, speed, state, stress) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.agent_id, row.tick, row.pos_x, row.pos_y, row.pos_z, row.dir_x, row.dir_y, row.dir_z, row.speed, row.state,
                    row.stress,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_predator_snapshots(&mut self, rows: &[PredatorSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO predator_snapshots \
                 (agent_id, tick, pos_x, pos_y, pos_z, dir_x, dir_y, dir_z, speed, state, stress, target) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.agent_id, row.tick, row.pos_x, row.pos_y, row.pos_z, row.dir_x, row.dir_y, row.dir_z, row.speed, row.state,
                    row.stress, row.target,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries (tick, sim_time_secs, prey_count, pred_count, prey_groups, pred_groups) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![row.tick, row.sim_time_secs, row.prey_count, row.pred_count, row.prey_groups, row.pred_groups],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
