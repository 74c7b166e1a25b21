//! `escape-output` — simulation output writers for the flight-simulator engine.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                                                |
//! |-----------|-------------|-------------------------------------------------------------------------------|
//! | *(none)*  | CSV         | `prey_snapshots.csv`, `predator_snapshots.csv`, `tick_summaries.csv`         |
//! | `sqlite`  | SQLite      | `output.db`                                                                   |
//! | `parquet` | Parquet     | `prey_snapshots.parquet`, `predator_snapshots.parquet`, `tick_summaries.parquet` |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `escape_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use escape_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
