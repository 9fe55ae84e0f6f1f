//! chartlib — DTX/GDA chart parser and paginated sheet rendering library.
//!
//! Parses the line-oriented chart text written by the DTX/GDA editors,
//! maps musical (bar, tick) coordinates onto a tempo-normalized timeline,
//! and computes a paginated pixel layout across one or more sheets, emitted
//! as an ordered list of drawing commands.
//!
//! # Example
//! ```no_run
//! use chartlib::charter::{ChartConfig, Charter, ImageSet};
//! use chartlib::lanes::Dialect;
//! use chartlib::timeline::PositionMapper;
//!
//! let doc = chartlib::parse_file("path/to/song.dtx", Dialect::Dtx).unwrap();
//! println!("Title: {}", doc.title);
//! println!("Bars: {}", doc.bar_count());
//!
//! let mapper = PositionMapper::new(&doc);
//! let charter = Charter::with_images(&doc, &mapper, ChartConfig::default(), ImageSet::empty());
//! let mut sheets = charter.create_sheets();
//! charter.draw_chart(&mut sheets).unwrap();
//! ```

pub mod charter;
pub mod error;
pub mod lanes;
pub mod model;
pub mod parser;
pub mod timeline;

use std::path::Path;

pub use error::ChartError;
pub use lanes::Dialect;
pub use model::*;
pub use parser::{Parser, ParserConfig};
pub use timeline::PositionMapper;

/// Parse a chart file from a path.
///
/// The bytes are decoded as UTF-8, Shift_JIS or EUC-JP before parsing.
/// The lane-code dialect is a configuration input; pick it from the file
/// extension (`.dtx` → [`Dialect::Dtx`], `.gda` → [`Dialect::Gda`]) or
/// from caller knowledge — it is never sniffed from the content.
pub fn parse_file<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<ChartDocument, ChartError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes(&data, dialect)
}

/// Parse a chart from raw bytes, decoding the text encoding first.
pub fn parse_bytes(data: &[u8], dialect: Dialect) -> Result<ChartDocument, ChartError> {
    let text = parser::decode_bytes(data);
    parse_str(&text, dialect)
}

/// Parse a chart from already-decoded text.
pub fn parse_str(text: &str, dialect: Dialect) -> Result<ChartDocument, ChartError> {
    Parser::new(ParserConfig { dialect }).parse(text)
}

/// Convert a parsed chart to a JSON string.
/// Useful for passing data across process boundaries.
pub fn chart_to_json(doc: &ChartDocument) -> Result<String, ChartError> {
    Ok(serde_json::to_string_pretty(doc)?)
}
