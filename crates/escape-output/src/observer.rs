//! `SimOutputObserver<W>` — bridges [`SimObserver`] to an [`OutputWriter`].
//!
//! Grounded on `model/observer.hpp`'s `obs_info{sample_freq, sample_tick,
//! cached_rows}` pattern: rows are accumulated in memory and only handed to
//! the writer once every `sample_freq` ticks, and flushed early if the
//! in-memory buffer crosses `flush_threshold` rows. This keeps row-oriented
//! backends (SQLite, Parquet) from round-tripping on every single tick.

use escape_sim::{SimObserver, Simulation};

use crate::row::{PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::OutputError;

const DEFAULT_SAMPLE_FREQ: u64 = 1;
const DEFAULT_FLUSH_THRESHOLD: usize = 10_000;

/// A [`SimObserver`] that writes prey/predator snapshots and tick summaries
/// to any [`OutputWriter`] backend (CSV, SQLite, Parquet, …).
///
/// Errors from the writer are stored internally because `SimObserver` hooks
/// have no return value. After the run completes, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer: W,
    sample_freq: u64,
    flush_threshold: usize,
    prey_buf: Vec<PreySnapshotRow>,
    pred_buf: Vec<PredatorSnapshotRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, sampling a snapshot row every
    /// tick and flushing after the default row threshold.
    pub fn new(writer: W) -> Self {
        Self::with_sampling(writer, DEFAULT_SAMPLE_FREQ, DEFAULT_FLUSH_THRESHOLD)
    }

    /// Create an observer that only samples every `sample_freq` ticks
    /// (`sample_freq = 1` samples every tick), flushing buffered rows to
    /// the writer once either buffer reaches `flush_threshold` entries.
    pub fn with_sampling(writer: W, sample_freq: u64, flush_threshold: usize) -> Self {
        Self {
            writer,
            sample_freq: sample_freq.max(1),
            flush_threshold,
            prey_buf: Vec::new(),
            pred_buf: Vec::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after the run completes.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }

    fn flush_buffers(&mut self) {
        if !self.prey_buf.is_empty() {
            let result = self.writer.write_prey_snapshots(&self.prey_buf);
            self.store_err(result);
            self.prey_buf.clear();
        }
        if !self.pred_buf.is_empty() {
            let result = self.writer.write_predator_snapshots(&self.pred_buf);
            self.store_err(result);
            self.pred_buf.clear();
        }
    }

    fn sample(&mut self, sim: &Simulation) {
        let tick = sim.tick().0;
        if tick % self.sample_freq != 0 {
            return;
        }

        let prey = sim.prey();
        for i in 0..prey.count {
            self.prey_buf.push(PreySnapshotRow {
                agent_id: i as u32,
                tick,
                pos_x: prey.pos[i].x,
                pos_y: prey.pos[i].y,
                pos_z: prey.pos[i].z,
                dir_x: prey.dir[i].x,
                dir_y: prey.dir[i].y,
                dir_z: prey.dir[i].z,
                speed: prey.speed[i],
                state: prey.current_state[i].state() as u32,
                stress: prey.stress[i],
            });
        }

        let predators = sim.predators();
        for i in 0..predators.count {
            self.pred_buf.push(PredatorSnapshotRow {
                agent_id: i as u32,
                tick,
                pos_x: predators.pos[i].x,
                pos_y: predators.pos[i].y,
                pos_z: predators.pos[i].z,
                dir_x: predators.dir[i].x,
                dir_y: predators.dir[i].y,
                dir_z: predators.dir[i].z,
                speed: predators.speed[i],
                state: predators.current_state[i].state() as u32,
                stress: predators.stress[i],
                target: predators.target[i].map_or(u32::MAX, |id| id.0),
            });
        }

        let summary = TickSummaryRow {
            tick,
            sim_time_secs: tick as f32 * sim.clock().dt,
            prey_count: prey.count as u32,
            pred_count: predators.count as u32,
            prey_groups: sim.prey_groups().groups().len() as u32,
            pred_groups: sim.pred_groups().groups().len() as u32,
        };
        let result = self.writer.write_tick_summary(&summary);
        self.store_err(result);

        if self.prey_buf.len() >= self.flush_threshold || self.pred_buf.len() >= self.flush_threshold {
            self.flush_buffers();
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_initialized(&mut self, sim: &Simulation) {
        self.sample(sim);
    }

    fn on_tick(&mut self, sim: &Simulation) {
        self.sample(sim);
    }

    fn on_finished(&mut self, _sim: &Simulation) {
        self.flush_buffers();
        let result = self.writer.finish();
        self.store_err(result);
    }
}
