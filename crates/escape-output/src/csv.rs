//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `prey_snapshots.csv`
//! - `predator_snapshots.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    prey: Writer<File>,
    predators: Writer<File>,
    summaries: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut prey = Writer::from_path(dir.join("prey_snapshots.csv"))?;
        prey.write_record(["agent_id", "tick", "pos_x", "pos_y", "pos_z", "dir_x", "dir_y", "dir_z", "speed", "state", "stress"])?;

        let mut predators = Writer::from_path(dir.join("predator_snapshots.csv"))?;
        predators.write_record([
            "agent_id", "tick", "pos_x", "pos_y", "pos_z", "dir_x", "dir_y", "dir_z", "speed", "state", "stress", "target",
        ])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(["tick", "sim_time_secs", "prey_count", "pred_count", "prey_groups", "pred_groups"])?;

        Ok(Self {
            prey,
            predators,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_prey_snapshots(&mut self, rows: &[PreySnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.prey.write_record(&[
                row.agent_id.to_string(),
                row.tick.to_string(),
                row.pos_x.to_string(),
                row.pos_y.to_string(),
                row.pos_z.to_string(),
                row.dir_x.to_string(),
                row.dir_y.to_string(),
                row.dir_z.to_string(),
                row.speed.to_string(),
                row.state.to_string(),
                row.stress.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_predator_snapshots(&mut self, rows: &[PredatorSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.predators.write_record(&[
                row.agent_id.to_string(),
                row.tick.to_string(),
                row.pos_x.to_string(),
                row.pos_y.to_string(),
                row.pos_z.to_string(),
                row.dir_x.to_string(),
                row.dir_y.to_string(),
                row.dir_z.to_string(),
                row.speed.to_string(),
                row.state.to_string(),
                row.stress.to_string(),
                row.target.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.sim_time_secs.to_string(),
            row.prey_count.to_string(),
            row.pred_count.to_string(),
            row.prey_groups.to_string(),
            row.pred_groups.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.prey.flush()?;
        self.predators.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
