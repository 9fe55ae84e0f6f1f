//! Compute absolute positions for every bar and tempo marker in a chart.
//! This is the bridge between the musical coordinates (bar, tick) and the
//! vertical axis of the rendered sheet — it answers "how far along the
//! chart is this tick?" under a variable tempo.
//!
//! Absolute position is measured in 1/192-beat units at the reference
//! tempo of 180 BPM, so one unit equals 60/(180×48) seconds of song time.

use crate::error::ChartError;
use crate::model::ChartDocument;

/// Reference tempo the absolute-position unit is normalized to.
pub const BASE_BPM: f64 = 180.0;
/// Ticks per quarter beat (192 per standard 4/4 bar).
pub const QUARTER_BEAT_TICKS: f64 = 48.0;

/// Timing information for one bar.
#[derive(Debug, Clone)]
pub struct BarTiming {
    /// Ticks in this bar
    pub tick_count: u32,
    /// Absolute position of tick 0
    pub abs_start: f64,
    /// Tempo in effect at tick 0, carried in from the previous bar
    pub start_bpm: f64,
    /// Tempo markers with their absolute positions fixed
    pub bpm_markers: Vec<PlacedBpmMarker>,
}

/// A tempo marker whose absolute position has been computed.
#[derive(Debug, Clone)]
pub struct PlacedBpmMarker {
    /// Tick within the bar
    pub tick: f64,
    /// Tempo from this tick onward
    pub bpm: f64,
    /// Absolute position of the marker
    pub abs_pos: f64,
}

/// Maps (bar, tick) coordinates to absolute positions for one chart
/// document. Built once; rebuild after re-parsing.
#[derive(Debug, Clone)]
pub struct PositionMapper {
    bars: Vec<BarTiming>,
    /// One tick past the last bar's last tick
    end_position: f64,
    /// Absolute position of the first background-audio chip (0.0 if none)
    bgm_start: f64,
}

impl PositionMapper {
    /// Walk every bar in index order, carrying the running absolute
    /// position and tempo across bar boundaries. Between consecutive
    /// anchors (bar start, each marker, bar end) the elapsed distance is
    /// tick_delta × BASE_BPM / current_tempo.
    pub fn new(doc: &ChartDocument) -> Self {
        let mut bars = Vec::with_capacity(doc.bar_groups.len());
        let mut current_bpm = doc.bpm;
        let mut bar_start = 0.0;
        let mut bgm_chip: Option<(usize, f64)> = None;

        for (index, group) in doc.bar_groups.iter().enumerate() {
            // Only the earliest background-audio chip matters
            if bgm_chip.is_none() {
                if let Some(tick) = group.bgm_marker {
                    bgm_chip = Some((index, tick));
                }
            }

            let mut timing = BarTiming {
                tick_count: group.tick_count,
                abs_start: bar_start,
                start_bpm: current_bpm,
                bpm_markers: Vec::with_capacity(group.bpm_markers.len()),
            };

            // Most charts hold one tempo throughout, so this loop is
            // usually empty.
            let mut anchor_pos = bar_start;
            let mut anchor_tick = 0.0;
            for marker in &group.bpm_markers {
                let distance = (marker.tick - anchor_tick) * BASE_BPM / current_bpm;
                let abs_pos = anchor_pos + distance;
                timing.bpm_markers.push(PlacedBpmMarker {
                    tick: marker.tick,
                    bpm: marker.bpm,
                    abs_pos,
                });
                anchor_pos = abs_pos;
                anchor_tick = marker.tick;
                current_bpm = marker.bpm;
            }

            let tail = (f64::from(group.tick_count) - anchor_tick) * BASE_BPM / current_bpm;
            bar_start = anchor_pos + tail;

            bars.push(timing);
        }

        let mut mapper = Self {
            bars,
            end_position: bar_start,
            bgm_start: 0.0,
        };

        if let Some((bar, tick)) = bgm_chip {
            if let Ok(pos) = mapper.absolute_position(bar, tick) {
                mapper.bgm_start = pos;
            }
        }

        mapper
    }

    /// The absolute position of a (bar, tick) coordinate.
    ///
    /// Re-runs the bar's segment walk restricted to anchors at or before
    /// `tick`. Strictly increasing in lexicographic (bar, tick) order.
    pub fn absolute_position(&self, bar: usize, tick: f64) -> Result<f64, ChartError> {
        let timing = self.bars.get(bar).ok_or(ChartError::BarOutOfRange {
            bar,
            bar_count: self.bars.len(),
        })?;

        if !tick.is_finite() || tick < 0.0 || tick >= f64::from(timing.tick_count) {
            return Err(ChartError::TickOutOfRange {
                bar,
                tick,
                tick_count: timing.tick_count,
            });
        }

        let mut anchor_tick = 0.0;
        let mut anchor_pos = timing.abs_start;
        let mut bpm = timing.start_bpm;

        for marker in &timing.bpm_markers {
            if tick >= anchor_tick && tick < marker.tick {
                return Ok(anchor_pos + (tick - anchor_tick) * BASE_BPM / bpm);
            }
            anchor_tick = marker.tick;
            anchor_pos = marker.abs_pos;
            bpm = marker.bpm;
        }

        Ok(anchor_pos + (tick - anchor_tick) * BASE_BPM / bpm)
    }

    /// Length of the whole chart: the position one tick past the last
    /// bar's last tick.
    pub fn chart_length(&self) -> f64 {
        self.end_position
    }

    /// Absolute position where the background audio starts (0.0 when the
    /// chart has no background-audio chip). Useful for drawing the song
    /// start line.
    pub fn bgm_start_position(&self) -> f64 {
        self.bgm_start
    }

    /// Estimated song duration in seconds, from the background-audio start
    /// to the end of the chart.
    pub fn estimated_duration_secs(&self) -> f64 {
        (self.end_position - self.bgm_start) * 60.0 / (BASE_BPM * QUARTER_BEAT_TICKS)
    }

    /// Elapsed song time of a (bar, tick) coordinate in milliseconds,
    /// measured from absolute position 0.
    pub fn offset_time_ms(&self, bar: usize, tick: f64) -> Result<f64, ChartError> {
        let pos = self.absolute_position(bar, tick)?;
        Ok(pos * 1000.0 * 60.0 / (BASE_BPM * QUARTER_BEAT_TICKS))
    }

    /// Total number of bars.
    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Ticks in the given bar.
    pub fn ticks_in_bar(&self, bar: usize) -> Result<u32, ChartError> {
        self.bars
            .get(bar)
            .map(|t| t.tick_count)
            .ok_or(ChartError::BarOutOfRange {
                bar,
                bar_count: self.bars.len(),
            })
    }

    /// Per-bar timing table, in bar order.
    pub fn bars(&self) -> &[BarTiming] {
        &self.bars
    }
}
