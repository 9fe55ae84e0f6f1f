//! Data model for a parsed chart document.
//!
//! These structures capture the chart information needed for building the
//! position timeline and rendering the paginated sheet view. A
//! `ChartDocument` is produced once per parse and never mutated afterwards;
//! the timeline and charter build their own derived tables from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete chart parsed from DTX/GDA text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartDocument {
    /// Song title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Reference tempo in BPM (the tempo in effect at bar 0, tick 0)
    pub bpm: f64,
    /// Drum chart difficulty level (0.0 when the chart has no drum part)
    pub drum_level: f64,
    /// Guitar chart difficulty level
    pub guitar_level: f64,
    /// Bass chart difficulty level
    pub bass_level: f64,
    /// Ordered bar data, contiguous and index-ordered from bar 0
    pub bar_groups: Vec<BarGroup>,
    /// Reconciled guitar hold notes, in document order
    pub guitar_holds: Vec<HoldNote>,
    /// Reconciled bass hold notes, in document order
    pub bass_holds: Vec<HoldNote>,
    /// Drum note tallies (present only when the drum chart exists)
    pub drum_counts: Option<DrumCounts>,
    /// Guitar note tallies
    pub guitar_counts: Option<GfCounts>,
    /// Bass note tallies
    pub bass_counts: Option<GfCounts>,
}

/// One bar of chart data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarGroup {
    /// Number of ticks in this bar: floor(192 × bar length multiplier).
    /// Always at least 1.
    pub tick_count: u32,
    /// Raw hit strings keyed by lane label, undecoded. Only lanes present
    /// in the source and belonging to an active instrument appear here.
    pub notes: BTreeMap<String, String>,
    /// Tempo change markers, sorted ascending by tick
    pub bpm_markers: Vec<BpmMarker>,
    /// Bar-line show/hide markers
    pub line_markers: Vec<LineMarker>,
    /// Tick of the first background-audio chip in this bar, if any
    pub bgm_marker: Option<f64>,
}

impl BarGroup {
    /// An empty bar with the given tick count.
    pub fn empty(tick_count: u32) -> Self {
        Self {
            tick_count,
            notes: BTreeMap::new(),
            bpm_markers: Vec::new(),
            line_markers: Vec::new(),
            bgm_marker: None,
        }
    }
}

/// A tempo change inside a bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BpmMarker {
    /// Tick within the bar
    pub tick: f64,
    /// New tempo from this tick onward. NaN when the chart referenced a
    /// BPM label that was never defined.
    pub bpm: f64,
}

/// A bar-line visibility marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineMarker {
    /// Tick within the bar
    pub tick: f64,
    /// true = show bar lines from here, false = hide
    pub visible: bool,
}

/// A musical coordinate: bar index plus tick within that bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarPosition {
    pub bar: usize,
    pub tick: f64,
}

/// A sustained guitar/bass note with explicit start and stop.
/// The end always strictly follows the start in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldNote {
    pub start: BarPosition,
    pub end: BarPosition,
    /// Button combination label held for the duration (e.g. "G00100")
    pub buttons: String,
}

/// Per-lane drum note tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumCounts {
    pub total: u32,
    pub lc: u32,
    pub hh: u32,
    pub hho: u32,
    pub lp: u32,
    pub lb: u32,
    pub sd: u32,
    pub ht: u32,
    pub bd: u32,
    pub lt: u32,
    pub ft: u32,
    pub rc: u32,
    pub rd: u32,
}

impl DrumCounts {
    /// Tally `count` hits on the lane with the given label.
    pub fn bump(&mut self, lane: &str, count: u32) {
        let slot = match lane {
            "LC" => &mut self.lc,
            "HH" => &mut self.hh,
            "HHO" => &mut self.hho,
            "LP" => &mut self.lp,
            "LB" => &mut self.lb,
            "SD" => &mut self.sd,
            "HT" => &mut self.ht,
            "BD" => &mut self.bd,
            "LT" => &mut self.lt,
            "FT" => &mut self.ft,
            "RC" => &mut self.rc,
            "RD" => &mut self.rd,
            _ => return,
        };
        *slot += count;
        self.total += count;
    }
}

/// Guitar/bass note tallies. The per-button counters add up to more than
/// `total` for multi-button chords; wails never count toward `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfCounts {
    pub total: u32,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub y: u32,
    pub m: u32,
    pub open: u32,
    pub wail: u32,
}

impl GfCounts {
    /// Tally `count` hits of a button-combination label ("G01100",
    /// "B001", "GWail", ...).
    pub fn bump(&mut self, buttons: &str, count: u32) {
        if buttons.ends_with("Wail") {
            self.wail += count;
            return;
        }
        self.total += count;

        let mut any = false;
        for (flag, slot) in buttons.chars().skip(1).zip([
            &mut self.r,
            &mut self.g,
            &mut self.b,
            &mut self.y,
            &mut self.m,
        ]) {
            if flag == '1' {
                *slot += count;
                any = true;
            }
        }
        // An all-zero combination is an open note
        if !any {
            self.open += count;
        }
    }
}

/// The instrument a chart view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    Drums,
    Guitar,
    Bass,
}

impl Instrument {
    /// Prefix used for difficulty decal image keys ("drumExtreme", ...).
    pub fn decal_prefix(self) -> &'static str {
        match self {
            Instrument::Drums => "drum",
            Instrument::Guitar => "guitar",
            Instrument::Bass => "bass",
        }
    }
}

/// Which instruments a parsed document actually charts. All charts with
/// notes carry a non-zero level, so presence is keyed off the levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCharts {
    pub drums: bool,
    pub guitar: bool,
    pub bass: bool,
}

impl ChartDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of bars.
    pub fn bar_count(&self) -> usize {
        self.bar_groups.len()
    }

    /// Which instruments have a chart (level above zero).
    pub fn available_charts(&self) -> AvailableCharts {
        AvailableCharts {
            drums: self.drum_level > 0.0,
            guitar: self.guitar_level > 0.0,
            bass: self.bass_level > 0.0,
        }
    }

    /// The difficulty level for one instrument.
    pub fn level(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Drums => self.drum_level,
            Instrument::Guitar => self.guitar_level,
            Instrument::Bass => self.bass_level,
        }
    }

    /// Total note count for one instrument, 0 when that chart is absent.
    pub fn total_notes(&self, instrument: Instrument) -> u32 {
        match instrument {
            Instrument::Drums => self.drum_counts.map_or(0, |c| c.total),
            Instrument::Guitar => self.guitar_counts.map_or(0, |c| c.total),
            Instrument::Bass => self.bass_counts.map_or(0, |c| c.total),
        }
    }

    /// Hold notes for one instrument (drums never have any).
    pub fn holds(&self, instrument: Instrument) -> &[HoldNote] {
        match instrument {
            Instrument::Drums => &[],
            Instrument::Guitar => &self.guitar_holds,
            Instrument::Bass => &self.bass_holds,
        }
    }
}
