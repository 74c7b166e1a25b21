//! Parquet output backend (feature `parquet`).
//!
//! Creates three files in the configured output directory:
//! - `prey_snapshots.parquet`
//! - `predator_snapshots.parquet`
//! - `tick_summaries.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float32Builder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{OutputResult, PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};

fn prey_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("agent_id", DataType::UInt32, false),
        Field::new("tick", DataType::UInt64, false),
        Field::new("pos_x", DataType::Float32, false),
        Field::new("pos_y", DataType::Float32, false),
        Field::new("pos_z", DataType::Float32, false),
        Field::new("dir_x", DataType::Float32, false),
        Field::new("dir_y", DataType::Float32, false),
        Field::new("dir_z", DataType::Float32, false),
        Field::new("speed", DataType::Float32, false),
        Field::new("state", DataType::UInt32, false),
        Field::new("stress", DataType::Float32, false),
    ]))
}

fn predator_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("agent_id", DataType::UInt32, false),
        Field::new("tick", DataType::UInt64, false),
        Field::new("pos_x", DataType::Float32, false),
        Field::new("pos_y", DataType::Float32, false),
        Field::new("pos_z", DataType::Float32, false),
        Field::new("dir_x", DataType::Float32, false),
        Field::new("dir_y", DataType::Float32, false),
        Field::new("dir_z", DataType::Float32, false),
        Field::new("speed", DataType::Float32, false),
        Field::new("state", DataType::UInt32, false),
        Field::new("stress", DataType::Float32, false),
        Field::new("target", DataType::UInt32, false),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick", DataType::UInt64, false),
        Field::new("sim_time_secs", DataType::Float32, false),
        Field::new("prey_count", DataType::UInt32, false),
        Field::new("pred_count", DataType::UInt32, false),
        Field::new("prey_groups", DataType::UInt32, false),
        Field::new("pred_groups", DataType::UInt32, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder().set_compression(Compression::SNAPPY).build()
}

/// Writes simulation output to three Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footer; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    prey: Option<ArrowWriter<File>>,
    predators: Option<ArrowWriter<File>>,
    summaries: Option<ArrowWriter<File>>,
    prey_schema: Arc<Schema>,
    pred_schema: Arc<Schema>,
    summ_schema: Arc<Schema>,
}

impl ParquetWriter {
    /// Create all three Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let prey_schema = prey_schema();
        let pred_schema = predator_schema();
        let summ_schema = summary_schema();

        let prey_file = File::create(dir.join("prey_snapshots.parquet"))?;
        let prey = ArrowWriter::try_new(prey_file, Arc::clone(&prey_schema), Some(snappy_props()))?;

        let pred_file = File::create(dir.join("predator_snapshots.parquet"))?;
        let predators = ArrowWriter::try_new(pred_file, Arc::clone(&pred_schema), Some(snappy_props()))?;

        let summ_file = File::create(dir.join("tick_summaries.parquet"))?;
        let summaries = ArrowWriter::try_new(summ_file, Arc::clone(&summ_schema), Some(snappy_props()))?;

        Ok(Self {
            prey: Some(prey),
            predators: Some(predators),
            summaries: Some(summaries),
            prey_schema,
            pred_schema,
            summ_schema,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_prey_snapshots(&mut self, rows: &[PreySnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.prey.as_mut() else {
            return Ok(());
        };

        let mut agent_ids = UInt32Builder::new();
        let mut ticks = UInt64Builder::new();
        let mut pos_x = Float32Builder::new();
        let mut pos_y = Float32Builder::new();
        let mut pos_z = Float32Builder::new();
        let mut dir_x = Float32Builder::new();
        let mut dir_y = Float32Builder::new();
        let mut dir_z = Float32Builder::new();
        let mut speed = Float32Builder::new();
        let mut state = UInt32Builder::new();
        let mut stress = Float32Builder::new();

        for row in rows {
            agent_ids.append_value(row.agent_id);
            ticks.append_value(row.tick);
            pos_x.append_value(row.pos_x);
            pos_y.append_value(row.pos_y);
            pos_z.append_value(row.pos_z);
            dir_x.append_value(row.dir_x);
            dir_y.append_value(row.dir_y);
            dir_z.append_value(row.dir_z);
            speed.append_value(row.speed);
            state.append_value(row.state);
            stress.append_value(row.stress);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.prey_schema),
            vec![
                Arc::new(agent_ids.finish()),
                Arc::new(ticks.finish()),
                Arc::new(pos_x.finish()),
                Arc::new(pos_y.finish()),
                Arc::new(pos_z.finish()),
                Arc::new(dir_x.finish()),
                Arc::new(dir_y.finish()),
                Arc::new(dir_z.finish()),
                Arc::new(speed.finish()),
                Arc::new(state.finish()),
                Arc::new(stress.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_predator_snapshots(&mut self, rows: &[PredatorSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.predators.as_mut() else {
            return Ok(());
        };

        let mut agent_ids = UInt32Builder::new();
        let mut ticks = UInt64Builder::new();
        let mut pos_x = Float32Builder::new();
        let mut pos_y = Float32Builder::new();
        let mut pos_z = Float32Builder::new();
        let mut dir_x = Float32Builder::new();
        let mut dir_y = Float32Builder::new();
        let mut dir_z = Float32Builder::new();
        let mut speed = Float32Builder::new();
        let mut state = UInt32Builder::new();
        let mut stress = Float32Builder::new();
        let mut target = UInt32Builder::new();

        for row in rows {
            agent_ids.append_value(row.agent_id);
            ticks.append_value(row.tick);
            pos_x.append_value(row.pos_x);
            pos_y.append_value(row.pos_y);
            pos_z.append_value(row.pos_z);
            dir_x.append_value(row.dir_x);
            dir_y.append_value(row.dir_y);
            dir_z.append_value(row.dir_z);
            speed.append_value(row.speed);
            state.append_value(row.state);
            stress.append_value(row.stress);
            target.append_value(row.target);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.pred_schema),
            vec![
                Arc::new(agent_ids.finish()),
                Arc::new(ticks.finish()),
                Arc::new(pos_x.finish()),
                Arc::new(pos_y.finish()),
                Arc::new(pos_z.finish()),
                Arc::new(dir_x.finish()),
                Arc::new(dir_y.finish()),
                Arc::new(dir_z.finish()),
                Arc::new(speed.finish()),
                Arc::new(state.finish()),
                Arc::new(stress.finish()),
                Arc::new(target.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        let Some(writer) = self.summaries.as_mut() else {
            return Ok(());
        };

        let mut ticks = UInt64Builder::new();
        let mut sim_times = Float32Builder::new();
        let mut prey_counts = UInt32Builder::new();
        let mut pred_counts = UInt32Builder::new();
        let mut prey_groups = UInt32Builder::new();
        let mut pred_groups = UInt32Builder::new();

        ticks.append_value(row.tick);
        sim_times.append_value(row.sim_time_secs);
        prey_counts.append_value(row.prey_count);
        pred_counts.append_value(row.pred_count);
        prey_groups.append_value(row.prey_groups);
        pred_groups.append_value(row.pred_groups);

        let batch = RecordBatch::try_new(
            Arc::clone(&self.summ_schema),
            vec![
                Arc::new(ticks.finish()),
                Arc::new(sim_times.finish()),
                Arc::new(prey_counts.finish()),
                Arc::new(pred_counts.finish()),
                Arc::new(prey_groups.finish()),
                Arc::new(pred_groups.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if let Some(w) = self.prey.take() {
            w.close()?;
        }
        if let Some(w) = self.predators.take() {
            w.close()?;
        }
        if let Some(w) = self.summaries.take() {
            w.close()?;
        }
        Ok(())
    }
}
