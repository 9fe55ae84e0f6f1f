//! Layout constants (all in pixels unless noted).

pub(super) const DEFAULT_SCALE: f64 = 1.0;
pub(super) const MIN_SCALE: f64 = 0.5;
pub(super) const MAX_SCALE: f64 = 3.0;

pub(super) const DEFAULT_PAGE_HEIGHT: f64 = 720.0;
pub(super) const MIN_PAGE_HEIGHT: f64 = 480.0;
pub(super) const MAX_PAGE_HEIGHT: f64 = 3840.0;

pub(super) const DEFAULT_PAGES_PER_SHEET: usize = 20;
pub(super) const MIN_PAGES_PER_SHEET: usize = 6;
pub(super) const MAX_PAGES_PER_SHEET: usize = 110;

/// Grid line spacing: one line per quarter beat (192/4 ticks).
pub(super) const BEAT_LINE_GAP: u32 = 48;

// ─── Sheet chrome ────────────────────────────────────────────────────

pub(super) const INFO_SECTION_HEIGHT: f64 = 58.0;
pub(super) const PAGE_TOP_MARGIN: f64 = 2.0;
pub(super) const SHEET_LEFT_MARGIN: f64 = 3.0;
pub(super) const SHEET_RIGHT_MARGIN: f64 = 3.0;
pub(super) const PAGE_BOTTOM_MARGIN: f64 = 40.0;
/// Right margin of each page (except the last page of a sheet).
pub(super) const PAGE_RIGHT_MARGIN: f64 = 0.0;
/// Gap between the page border and the first/last line inside it.
pub(super) const PAGE_INNER_MARGIN: f64 = 12.0;
/// Bottom margin of the sheet-number label.
pub(super) const SHEET_NUMBER_MARGIN: f64 = 2.0;
/// Title/artist x-offset from the left edge (decal sits before it).
pub(super) const INFO_TEXT_X_OFFSET: f64 = 150.0;
/// Right inset of the "Part N of M" label.
pub(super) const PART_LABEL_INSET: f64 = 85.0;

pub(super) const DECAL_WIDTH: f64 = 140.0;
pub(super) const DECAL_HEIGHT: f64 = 50.0;

// ─── Fills ───────────────────────────────────────────────────────────

pub(super) const BACKGROUND_FILL: &str = "#000000";
pub(super) const INFO_FILL: &str = "#221e1a";
pub(super) const PAGE_FILL: &str = "#221e1a";

// ─── Line colors ─────────────────────────────────────────────────────

pub(super) const BAR_LINE_COLOR: &str = "#707070";
pub(super) const QUARTER_LINE_COLOR: &str = "#4b4c4a";
pub(super) const END_LINE_COLOR: &str = "#ff0000";
pub(super) const START_LINE_COLOR: &str = "#00ff00";
pub(super) const TITLE_LINE_COLOR: &str = "#707070";
pub(super) const BORDER_LINE_COLOR: &str = "#707070";
pub(super) const BPM_MARKER_LINE_COLOR: &str = "#eeffab";

// ─── Text ────────────────────────────────────────────────────────────

pub(super) const TEXT_COLOR: &str = "#ffffff";

pub(super) const BAR_NUMBER_FONT_SIZE: f64 = 24.0;
pub(super) const BPM_MARKER_FONT_SIZE: f64 = 14.0;
pub(super) const TITLE_FONT_SIZE: f64 = 30.0;
pub(super) const ARTIST_FONT_SIZE: f64 = 16.0;
pub(super) const CHART_INFO_FONT_SIZE: f64 = 24.0;
pub(super) const PART_LABEL_FONT_SIZE: f64 = 18.0;

pub(super) const INFO_FONT_FAMILY: &str = "Meiryo UI";
pub(super) const LABEL_FONT_FAMILY: &str = "Arial";
