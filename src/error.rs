//! Error types for parsing, timeline queries and layout queries.
//!
//! The layout and timeline query methods return `Err` for out-of-range
//! coordinates instead of logging and handing back a placeholder, so a
//! caller can never silently keep going with an invalid position.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// The chart text contained nothing to parse.
    #[error("chart text is empty")]
    EmptyChart,

    /// A bar index outside the document was queried.
    #[error("bar {bar} is out of range (chart has {bar_count} bars)")]
    BarOutOfRange { bar: usize, bar_count: usize },

    /// A tick outside the queried bar was requested.
    #[error("tick {tick} is out of range for bar {bar} ({tick_count} ticks)")]
    TickOutOfRange {
        bar: usize,
        tick: f64,
        tick_count: u32,
    },

    /// An absolute position outside `[0, chart_length]` was queried.
    #[error("absolute position {position} is outside the chart (length {length})")]
    PositionOutOfRange { position: f64, length: f64 },

    /// A chip image asset could not be loaded.
    #[error("image asset '{key}' failed to load: {reason}")]
    ImageLoad { key: String, reason: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
