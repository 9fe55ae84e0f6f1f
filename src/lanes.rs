//! Lane-code tables for the two chart dialects.
//!
//! Composite bar/lane keys address their payload through a 2-character lane
//! code. A handful of codes are reserved control lanes (background audio,
//! bar length, tempo change, line visibility); the rest map to instrument
//! lanes. The mapping differs between the DTX dialect (current editor
//! generation) and the older GDA dialect, so every lookup takes the
//! configured dialect.

use serde::{Deserialize, Serialize};

/// Which source-tool generation produced the chart. Never auto-detected;
/// callers select it (typically from the file extension).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    Dtx,
    Gda,
}

/// Background audio chip lane.
pub const BGM_LANE: &str = "01";
/// Bar length multiplier lane.
pub const BAR_LENGTH_LANE: &str = "02";
/// Tempo change lane (payload tokens are BPM label references).
pub const BPM_CHANGE_LANE: &str = "08";
/// Bar-line show/hide lane.
pub const LINE_MARKER_LANE: &str = "C2";

/// Lane label emitted for a guitar hold-lane payload.
pub const GUITAR_HOLD: &str = "GHold";
/// Lane label emitted for a bass hold-lane payload.
pub const BASS_HOLD: &str = "BHold";

/// Map a drum lane code to its lane label.
pub fn drum_lane_label(dialect: Dialect, code: &str) -> Option<&'static str> {
    match dialect {
        Dialect::Dtx => match code {
            "1A" => Some("LC"),
            "11" => Some("HH"),
            "18" => Some("HHO"),
            "1C" => Some("LB"),
            "1B" => Some("LP"),
            "12" => Some("SD"),
            "14" => Some("HT"),
            "13" => Some("BD"),
            "15" => Some("LT"),
            "17" => Some("FT"),
            "16" => Some("RC"),
            "19" => Some("RD"),
            _ => None,
        },
        // The old GDA format uses the lane label mostly as-is
        Dialect::Gda => match code {
            "SD" => Some("SD"),
            "BD" => Some("BD"),
            "CY" => Some("RC"),
            "HT" => Some("HT"),
            "LT" => Some("LT"),
            "FT" => Some("FT"),
            "HH" => Some("HH"),
            _ => None,
        },
    }
}

/// Map a guitar lane code to its button-combination label.
pub fn guitar_buttons(dialect: Dialect, code: &str) -> Option<&'static str> {
    match dialect {
        Dialect::Dtx => dtx_guitar_buttons(code),
        Dialect::Gda => match code {
            "G0" => Some("G000"),
            "G1" => Some("G001"),
            "G2" => Some("G010"),
            "G3" => Some("G011"),
            "G4" => Some("G100"),
            "G5" => Some("G101"),
            "G6" => Some("G110"),
            "G7" => Some("G111"),
            "GW" => Some("GWail"),
            _ => None,
        },
    }
}

/// Map a bass lane code to its button-combination label.
pub fn bass_buttons(dialect: Dialect, code: &str) -> Option<&'static str> {
    match dialect {
        Dialect::Dtx => dtx_bass_buttons(code),
        Dialect::Gda => match code {
            "B0" => Some("B000"),
            "B1" => Some("B001"),
            "B2" => Some("B010"),
            "B3" => Some("B011"),
            "B4" => Some("B100"),
            "B5" => Some("B101"),
            "B6" => Some("B110"),
            "B7" => Some("B111"),
            "BW" => Some("BWail"),
            _ => None,
        },
    }
}

/// Lane codes excluded when searching for a button hit coinciding with a
/// hold marker: the wail, hold and open-note lanes.
pub fn hold_check_ignores(code: &str) -> bool {
    matches!(code, "28" | "A8" | "2C" | "2D" | "20" | "A0")
}

/// Button combination labels encode button flags after the instrument
/// prefix character; wail labels carry no flags.
pub fn is_gf_label(label: &str) -> bool {
    let mut chars = label.chars();
    if !matches!(chars.next(), Some('G') | Some('B')) {
        return false;
    }
    label.ends_with("Wail") || chars.all(|c| c == '0' || c == '1')
}

fn dtx_guitar_buttons(code: &str) -> Option<&'static str> {
    match code {
        "20" => Some("G00000"),
        "21" => Some("G00100"),
        "22" => Some("G01000"),
        "24" => Some("G10000"),
        "93" => Some("G00010"),
        "9B" => Some("G00001"),
        "23" => Some("G01100"),
        "25" => Some("G10100"),
        "26" => Some("G11000"),
        "94" => Some("G00110"),
        "95" => Some("G01010"),
        "97" => Some("G10010"),
        "9C" => Some("G00101"),
        "9D" => Some("G01001"),
        "9F" => Some("G10001"),
        "AC" => Some("G00011"),
        "27" => Some("G11100"),
        "96" => Some("G01110"),
        "98" => Some("G10110"),
        "99" => Some("G11010"),
        "9E" => Some("G01101"),
        "A9" => Some("G10101"),
        "AA" => Some("G11001"),
        "AD" => Some("G00111"),
        "AE" => Some("G01011"),
        "D0" => Some("G10011"),
        "9A" => Some("G11110"),
        "AB" => Some("G11101"),
        "AF" => Some("G01111"),
        "D1" => Some("G10111"),
        "D2" => Some("G11011"),
        "D3" => Some("G11111"),
        "28" => Some("GWail"),
        "2C" => Some(GUITAR_HOLD),
        _ => None,
    }
}

fn dtx_bass_buttons(code: &str) -> Option<&'static str> {
    match code {
        "A0" => Some("B00000"),
        "A1" => Some("B00100"),
        "A2" => Some("B01000"),
        "A4" => Some("B10000"),
        "C5" => Some("B00010"),
        "CE" => Some("B00001"),
        "A3" => Some("B01100"),
        "A5" => Some("B10100"),
        "A6" => Some("B11000"),
        "C6" => Some("B00110"),
        "C8" => Some("B01010"),
        "CA" => Some("B10010"),
        "CF" => Some("B00101"),
        "DA" => Some("B01001"),
        "DC" => Some("B10001"),
        "E1" => Some("B00011"),
        "A7" => Some("B11100"),
        "C9" => Some("B01110"),
        "CB" => Some("B10110"),
        "CC" => Some("B11010"),
        "DB" => Some("B01101"),
        "DD" => Some("B10101"),
        "DE" => Some("B11001"),
        "E2" => Some("B00111"),
        "E3" => Some("B01011"),
        "E5" => Some("B10011"),
        "CD" => Some("B11110"),
        "DF" => Some("B11101"),
        "E4" => Some("B01111"),
        "E6" => Some("B10111"),
        "E7" => Some("B11011"),
        "E8" => Some("B11111"),
        "A8" => Some("BWail"),
        "2D" => Some(BASS_HOLD),
        _ => None,
    }
}
