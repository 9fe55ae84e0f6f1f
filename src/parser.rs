//! Chart text parser — converts DTX/GDA chart text into the ChartDocument
//! model.
//!
//! Parsing is two-phase because directives reference each other out of
//! order: a tempo label may be defined after its first use, and a
//! bar-length change can appear interleaved with the same bar's note lanes
//! but must be resolved before those lanes are decoded. Phase 1 scans every
//! directive line, writing scalar metadata directly and buffering bar/lane
//! payloads verbatim; phase 2 finalizes bars 0..=max in order once the
//! whole document has been read.
//!
//! Hold-note reconciliation for guitar and bass runs during finalization
//! with a Released/Held state machine owned by the parser instance, because
//! a hold can start in one bar and end several bars later.

use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::error::ChartError;
use crate::lanes::{self, Dialect};
use crate::model::{BarGroup, BarPosition, BpmMarker, ChartDocument, DrumCounts, GfCounts, HoldNote, LineMarker};

/// First lines written by the chart editors this parser understands.
const SUPPORTED_HEADERS: &[&str] = &[
    "; Created by DTXCreator 024",
    "; Created by DTXCreator 025(verK)",
    "; Created by DTXCreator 020",
    "; Created by DTXCreatorAL 008",
    ";Created by GDA Creator Professional Ver.0.10",
    ";Created by GDA Creator Professional Ver.0.22",
];

/// Parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserConfig {
    /// Lane-code dialect of the source tool. Not auto-detected.
    pub dialect: Dialect,
}

/// One decoded hit from a lane payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneHit {
    /// Tick within the bar
    pub tick: f64,
    /// The raw 2-character token ("01".."ZZ")
    pub label: String,
}

/// Hold-lane state carried across bar boundaries.
#[derive(Debug, Clone, Default)]
enum HoldState {
    #[default]
    Released,
    Held {
        start: BarPosition,
        buttons: &'static str,
    },
}

/// Reusable chart parser. Each call to [`Parser::parse`] resets all session
/// state, so one instance can parse any number of documents in sequence.
#[derive(Debug, Default)]
pub struct Parser {
    config: ParserConfig,
    largest_bar: Option<usize>,
    raw_bars: HashMap<usize, BTreeMap<String, String>>,
    bpm_labels: HashMap<String, f64>,
    /// Active bar-length multiplier; persists across bars until changed
    bar_length: f64,
    guitar_hold: HoldState,
    bass_hold: HoldState,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Parse chart text into a document.
    ///
    /// Only empty input fails. An unrecognized first line produces a
    /// warning and parsing continues; malformed numeric values degrade to
    /// 0/NaN the way the chart editors' own tools treat them.
    pub fn parse(&mut self, text: &str) -> Result<ChartDocument, ChartError> {
        self.reset();

        if text.trim().is_empty() {
            return Err(ChartError::EmptyChart);
        }

        let first = text.lines().next().unwrap_or("");
        if !SUPPORTED_HEADERS.contains(&first.trim()) {
            warn!("unrecognized chart header {first:?}; parsing may be incomplete");
        }

        let mut doc = ChartDocument::new();

        // Phase 1: scan directives, buffer bar/lane payloads
        for line in text.lines() {
            if line.starts_with('#') {
                self.read_directive(&mut doc, line);
            }
        }

        let active = doc.available_charts();
        if active.drums {
            doc.drum_counts = Some(DrumCounts::default());
        }
        if active.guitar {
            doc.guitar_counts = Some(GfCounts::default());
        }
        if active.bass {
            doc.bass_counts = Some(GfCounts::default());
        }

        // Phase 2: finalize every bar in index order, gap bars included
        if let Some(largest) = self.largest_bar {
            for index in 0..=largest {
                self.finalize_bar(&mut doc, index);
            }
        }

        Ok(doc)
    }

    fn reset(&mut self) {
        self.largest_bar = None;
        self.raw_bars.clear();
        self.bpm_labels.clear();
        self.bar_length = 1.0;
        self.guitar_hold = HoldState::Released;
        self.bass_hold = HoldState::Released;
    }

    fn read_directive(&mut self, doc: &mut ChartDocument, line: &str) {
        let (key, value) = split_key_value(line.trim());

        match key {
            "TITLE" => doc.title = value.to_string(),
            "ARTIST" => doc.artist = value.to_string(),
            "BPM" => doc.bpm = js_parse_float(value),
            "DLEVEL" => doc.drum_level = read_level(value),
            "GLEVEL" => doc.guitar_level = read_level(value),
            "BLEVEL" => doc.bass_level = read_level(value),
            // Recognized editor directives with no bearing on the chart view
            "PREVIEW" | "PREIMAGE" | "DTXC_LANEBINDEDCHIP" | "DTXC_CHIPPALETTE" => {}
            _ if is_resource_key(key) => {}
            _ if key.len() == 5 && key.starts_with("BPM") => {
                self.bpm_labels
                    .insert(key[3..].to_string(), js_parse_float(value));
            }
            _ => self.buffer_bar_lane(key, value),
        }
    }

    /// Buffer a `<3-digit bar><2-char lane>` payload for phase 2. Keys of
    /// any other shape are silently ignored.
    fn buffer_bar_lane(&mut self, key: &str, value: &str) {
        if key.len() != 5 || !key.is_char_boundary(3) {
            return;
        }
        let (bar_part, lane) = key.split_at(3);
        if !bar_part.bytes().all(|b| b.is_ascii_digit()) {
            return;
        }
        let bar: usize = match bar_part.parse() {
            Ok(n) => n,
            Err(_) => return,
        };

        self.largest_bar = Some(self.largest_bar.map_or(bar, |m| m.max(bar)));
        self.raw_bars
            .entry(bar)
            .or_default()
            .insert(lane.to_string(), value.to_string());
    }

    fn finalize_bar(&mut self, doc: &mut ChartDocument, index: usize) {
        let Some(raw) = self.raw_bars.remove(&index) else {
            // Nothing was charted in this bar; it still occupies time at
            // the currently active length multiplier.
            doc.bar_groups
                .push(BarGroup::empty(ticks_from_length(self.bar_length)));
            return;
        };

        // Bar length change applies to this bar and every following one
        if let Some(value) = raw.get(lanes::BAR_LENGTH_LANE) {
            self.bar_length = read_bar_length(value);
        }
        let tick_count = ticks_from_length(self.bar_length);
        let mut group = BarGroup::empty(tick_count);

        if let Some(payload) = raw.get(lanes::BPM_CHANGE_LANE) {
            for hit in decode_lane(payload, tick_count) {
                let bpm = match self.bpm_labels.get(&hit.label) {
                    Some(&bpm) => bpm,
                    None => {
                        warn!("bar {index}: tempo label '{}' is not defined", hit.label);
                        f64::NAN
                    }
                };
                group.bpm_markers.push(BpmMarker {
                    tick: hit.tick,
                    bpm,
                });
            }
        }

        if let Some(payload) = raw.get(lanes::LINE_MARKER_LANE) {
            for hit in decode_lane(payload, tick_count) {
                group.line_markers.push(LineMarker {
                    tick: hit.tick,
                    visible: hit.label == "01",
                });
            }
        }

        if let Some(payload) = raw.get(lanes::BGM_LANE) {
            group.bgm_marker = decode_lane(payload, tick_count).first().map(|h| h.tick);
        }

        let active = doc.available_charts();
        let dialect = self.config.dialect;

        for (code, payload) in &raw {
            if active.drums {
                if let Some(label) = lanes::drum_lane_label(dialect, code) {
                    group.notes.insert(label.to_string(), payload.clone());
                    if let Some(counts) = doc.drum_counts.as_mut() {
                        counts.bump(label, count_hits(payload));
                    }
                }
            }

            if active.guitar {
                if let Some(buttons) = lanes::guitar_buttons(dialect, code) {
                    if buttons == lanes::GUITAR_HOLD {
                        reconcile_holds(
                            &mut self.guitar_hold,
                            guitar_hold_lookup,
                            payload,
                            &raw,
                            tick_count,
                            index,
                            &mut doc.guitar_holds,
                        );
                    } else {
                        group.notes.insert(buttons.to_string(), payload.clone());
                        if let Some(counts) = doc.guitar_counts.as_mut() {
                            counts.bump(buttons, count_hits(payload));
                        }
                    }
                }
            }

            if active.bass {
                if let Some(buttons) = lanes::bass_buttons(dialect, code) {
                    if buttons == lanes::BASS_HOLD {
                        reconcile_holds(
                            &mut self.bass_hold,
                            bass_hold_lookup,
                            payload,
                            &raw,
                            tick_count,
                            index,
                            &mut doc.bass_holds,
                        );
                    } else {
                        group.notes.insert(buttons.to_string(), payload.clone());
                        if let Some(counts) = doc.bass_counts.as_mut() {
                            counts.bump(buttons, count_hits(payload));
                        }
                    }
                }
            }
        }

        doc.bar_groups.push(group);
    }
}

// Hold reconciliation always resolves button lanes through the DTX tables;
// the GDA generation of the format has no hold lanes at all.
fn guitar_hold_lookup(code: &str) -> Option<&'static str> {
    lanes::guitar_buttons(Dialect::Dtx, code)
}

fn bass_hold_lookup(code: &str) -> Option<&'static str> {
    lanes::bass_buttons(Dialect::Dtx, code)
}

/// Walk one bar's hold-lane markers against the button hits in the same
/// bar, advancing the cross-bar Released/Held state machine.
///
/// A marker coinciding exactly with a button hit opens a hold; the next
/// marker closes it, unless some button hit landed inside the pending hold,
/// in which case the hold is malformed and gets dropped without a note.
fn reconcile_holds(
    state: &mut HoldState,
    lookup: fn(&str) -> Option<&'static str>,
    hold_payload: &str,
    raw: &BTreeMap<String, String>,
    tick_count: u32,
    bar: usize,
    out: &mut Vec<HoldNote>,
) {
    let hold_marks = decode_lane(hold_payload, tick_count);

    // Button hits in this bar, per lane. Wail, hold and open-note lanes
    // never anchor or break a hold.
    let mut button_hits: Vec<(&'static str, Vec<f64>)> = Vec::new();
    for (code, payload) in raw {
        if lanes::hold_check_ignores(code) {
            continue;
        }
        if let Some(buttons) = lookup(code) {
            let ticks = decode_lane(payload, tick_count)
                .into_iter()
                .map(|hit| hit.tick)
                .collect();
            button_hits.push((buttons, ticks));
        }
    }

    // Hits at or before the current marker but strictly after this bound
    // invalidate a pending hold. -1 means "any hit in this bar counts",
    // which is exactly right for a hold carried in from an earlier bar.
    let mut lower_bound = -1.0;

    for mark in &hold_marks {
        let mut just_started = false;

        for &(buttons, ref ticks) in &button_hits {
            for &hit in ticks {
                match *state {
                    HoldState::Released => {
                        if mark.tick == hit {
                            *state = HoldState::Held {
                                start: BarPosition { bar, tick: hit },
                                buttons,
                            };
                            just_started = true;
                            lower_bound = mark.tick;
                        }
                    }
                    HoldState::Held { .. } => {
                        if mark.tick >= hit && lower_bound < hit {
                            warn!(
                                "bar {bar}: dropping hold note interrupted by a chip at tick {hit}"
                            );
                            *state = HoldState::Released;
                            lower_bound = -1.0;
                        }
                    }
                }
            }
        }

        if !just_started {
            if let HoldState::Held { start, buttons } = std::mem::take(state) {
                out.push(HoldNote {
                    start,
                    end: BarPosition {
                        bar,
                        tick: mark.tick,
                    },
                    buttons: buttons.to_string(),
                });
                lower_bound = -1.0;
            }
        }
    }
}

// ─── Payload decoding ────────────────────────────────────────────────

/// Decode a lane payload into tick/token pairs.
///
/// The payload is read as 2-character tokens; every token other than "00"
/// is a hit at tick = index × tick_count / token_count.
pub fn decode_lane(payload: &str, tick_count: u32) -> Vec<LaneHit> {
    let chars: Vec<char> = payload.chars().collect();
    let token_count = chars.chunks(2).count();
    let mut hits = Vec::new();

    for (i, chunk) in chars.chunks(2).enumerate() {
        let token: String = chunk.iter().collect();
        if token != "00" {
            hits.push(LaneHit {
                tick: i as f64 * f64::from(tick_count) / token_count as f64,
                label: token,
            });
        }
    }

    hits
}

/// Count the hits in a lane payload without decoding positions.
pub fn count_hits(payload: &str) -> u32 {
    let chars: Vec<char> = payload.chars().collect();
    chars
        .chunks(2)
        .filter(|chunk| chunk.iter().collect::<String>() != "00")
        .count() as u32
}

/// Ticks in a bar for a given length multiplier.
fn ticks_from_length(bar_length: f64) -> u32 {
    (192.0 * bar_length).floor() as u32
}

/// The editor nominally allows multipliers up to 100, but anything outside
/// this range is junk and falls back to a standard bar.
fn read_bar_length(value: &str) -> f64 {
    let length = js_parse_float(value);
    if length >= 1.0 / 192.0 && length < 10.0 {
        length
    } else {
        1.0
    }
}

/// Difficulty levels are written as 2-digit (tenths) or 3-digit
/// (hundredths) integers.
fn read_level(value: &str) -> f64 {
    match value.len() {
        0..=2 => js_parse_int(value) / 10.0,
        3 => js_parse_int(value) / 100.0,
        _ => 0.0,
    }
}

// ─── Byte decoding ───────────────────────────────────────────────────

/// Chart files come as UTF-8, Shift_JIS or (rarely) EUC-JP bytes.
/// Try strict decodes in that order, then fall back to lossy Shift_JIS.
pub(crate) fn decode_bytes(raw: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(raw) {
        return text.to_string();
    }

    let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    let (decoded, _, had_errors) = encoding_rs::EUC_JP.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(raw);
    decoded.into_owned()
}

// ─── Line-level helpers ──────────────────────────────────────────────

/// Split a directive into key and value. A colon separator is preferred;
/// the first whitespace run is the fallback. The key is never trimmed.
fn split_key_value(line: &str) -> (&str, &str) {
    let body = line.strip_prefix('#').unwrap_or(line);
    if let Some((key, value)) = body.split_once(':') {
        (key, value.trim())
    } else if let Some((key, value)) = body.split_once(char::is_whitespace) {
        (key, value.trim())
    } else {
        (body, "")
    }
}

/// Indexed resource directives (audio, volume, pan, image). Recognized so
/// they don't get misread as bar/lane keys, but their payloads are out of
/// scope here.
fn is_resource_key(key: &str) -> bool {
    ["WAV", "VOLUME", "PAN", "BMP"].iter().any(|prefix| {
        key.len() > prefix.len()
            && key.starts_with(prefix)
            && key[prefix.len()..].chars().all(|c| c.is_ascii_alphanumeric())
    })
}

/// Prefix-parse an integer the way `parseInt` does: NaN when no digits.
fn js_parse_int(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return f64::NAN;
    }
    t[..i].parse().unwrap_or(f64::NAN)
}

/// Prefix-parse a float the way `parseFloat` does: NaN when no digits.
fn js_parse_float(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut has_digits = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        has_digits = true;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            has_digits = true;
        }
    }
    if !has_digits {
        return f64::NAN;
    }
    t[..i].parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_lane_maps_token_index_to_tick() {
        let hits = decode_lane("01000200", 192);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].tick, 0.0);
        assert_eq!(hits[0].label, "01");
        assert_eq!(hits[1].tick, 96.0);
        assert_eq!(hits[1].label, "02");
    }

    #[test]
    fn decode_lane_scales_by_bar_tick_count() {
        // 144-tick bar, 3 tokens
        let hits = decode_lane("000101", 144);
        assert_eq!(hits[0].tick, 48.0);
        assert_eq!(hits[1].tick, 96.0);
    }

    #[test]
    fn count_hits_ignores_rests() {
        assert_eq!(count_hits("00010002"), 2);
        assert_eq!(count_hits("0000"), 0);
    }

    #[test]
    fn bar_length_outside_range_resets_to_one() {
        assert_eq!(read_bar_length("2.0"), 2.0);
        assert_eq!(read_bar_length("0.75"), 0.75);
        assert_eq!(read_bar_length("0"), 1.0);
        assert_eq!(read_bar_length("10.0"), 1.0);
        assert_eq!(read_bar_length("junk"), 1.0);
    }

    #[test]
    fn level_digit_count_selects_divisor() {
        assert_eq!(read_level("85"), 8.5);
        assert_eq!(read_level("850"), 8.5);
        assert_eq!(read_level("5"), 0.5);
        assert!(read_level("").is_nan());
    }

    #[test]
    fn js_numeric_parsing_degrades_to_nan() {
        assert!(js_parse_float("abc").is_nan());
        assert_eq!(js_parse_float("120.5x"), 120.5);
        assert!(js_parse_int("-").is_nan());
        assert_eq!(js_parse_int("42abc"), 42.0);
    }

    #[test]
    fn shift_jis_bytes_decode() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("テスト曲");
        assert_eq!(decode_bytes(&encoded), "テスト曲");
        assert_eq!(decode_bytes("plain".as_bytes()), "plain");
    }
}
