//! Integration tests — parse inline chart fixtures end to end.

use pretty_assertions::assert_eq;

use chartlib::parser::decode_lane;
use chartlib::{parse_str, ChartDocument, ChartError, Dialect, Parser, ParserConfig};

fn parse_dtx(text: &str) -> ChartDocument {
    parse_str(text, Dialect::Dtx).expect("fixture should parse")
}

// ─── Metadata ────────────────────────────────────────────────────────

const BASIC_DRUMS: &str = "\
; Created by DTXCreator 024
#TITLE: Neon Cascade
#ARTIST The Voltage
#BPM: 150
#DLEVEL: 85
#GLEVEL: 620
#BLEVEL: 4
#00011: 0102
";

#[test]
fn metadata_and_levels() {
    let doc = parse_dtx(BASIC_DRUMS);

    assert_eq!(doc.title, "Neon Cascade");
    // Whitespace works as a key/value separator when the colon is missing
    assert_eq!(doc.artist, "The Voltage");
    assert_eq!(doc.bpm, 150.0);

    // 2-digit levels are tenths, 3-digit levels are hundredths
    assert_eq!(doc.drum_level, 8.5);
    assert_eq!(doc.guitar_level, 6.2);
    assert_eq!(doc.bass_level, 0.4);

    let available = doc.available_charts();
    assert!(available.drums);
    assert!(available.guitar);
    assert!(available.bass);
}

#[test]
fn empty_input_is_the_only_fatal_case() {
    let mut parser = Parser::new(ParserConfig::default());
    assert!(matches!(parser.parse(""), Err(ChartError::EmptyChart)));
    assert!(matches!(parser.parse("  \n\n  "), Err(ChartError::EmptyChart)));
}

#[test]
fn unrecognized_header_still_parses() {
    let doc = parse_dtx("#TITLE: No Header\n#00011: 01\n");
    assert_eq!(doc.title, "No Header");
    assert_eq!(doc.bar_count(), 1);
}

#[test]
fn unknown_and_resource_directives_are_ignored() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #TITLE: Quiet\n\
         #PREVIEW: preview.ogg\n\
         #PREIMAGE: jacket.png\n\
         #WAV01: kick.wav\n\
         #VOLUME01: 80\n\
         #PAN01: -20\n\
         #BMP02: bg.png\n\
         #MYSTERY: 42\n\
         #ABCDE: 0101\n\
         #0001: 01\n\
         #00011: 01\n",
    );
    // Only the one real bar/lane line produced a bar
    assert_eq!(doc.bar_count(), 1);
    assert_eq!(doc.title, "Quiet");
}

#[test]
fn malformed_numbers_degrade_silently() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #BPM: fast\n\
         #DLEVEL: ??\n\
         #00011: 01\n",
    );
    assert!(doc.bpm.is_nan());
    assert!(doc.drum_level.is_nan());
    // NaN level means the drum chart is treated as absent
    assert!(!doc.available_charts().drums);
    assert!(doc.drum_counts.is_none());
}

// ─── Bars and tick counts ────────────────────────────────────────────

#[test]
fn bar_length_persists_until_changed() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #00002: 2.0\n\
         #00402: 0.75\n\
         #00411: 01\n",
    );

    assert_eq!(doc.bar_count(), 5);
    assert_eq!(doc.bar_groups[0].tick_count, 384);
    // Bars 1-3 have no chart lines but keep the 2.0 multiplier
    assert_eq!(doc.bar_groups[1].tick_count, 384);
    assert_eq!(doc.bar_groups[3].tick_count, 384);
    assert_eq!(doc.bar_groups[4].tick_count, 144);
}

#[test]
fn bar_length_out_of_range_resets_to_standard() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #00002: 64.0\n\
         #00011: 01\n",
    );
    assert_eq!(doc.bar_groups[0].tick_count, 192);
}

#[test]
fn bar_sequence_is_contiguous_from_zero() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #00711: 01\n",
    );
    assert_eq!(doc.bar_count(), 8);
    for group in &doc.bar_groups {
        assert_eq!(group.tick_count, 192);
    }
}

// ─── Lane payloads ───────────────────────────────────────────────────

#[test]
fn single_hit_at_token_zero_of_48_tokens() {
    let payload = format!("01{}", "00".repeat(47));
    let doc = parse_dtx(&format!(
        "; Created by DTXCreator 024\n\
         #DLEVEL: 50\n\
         #00011: {payload}\n"
    ));

    let raw = doc.bar_groups[0].notes.get("HH").expect("HH lane stored");
    let hits = decode_lane(raw, doc.bar_groups[0].tick_count);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tick, 0.0);
    assert_eq!(doc.drum_counts.unwrap().hh, 1);
}

#[test]
fn lanes_without_matching_level_are_dropped() {
    // No GLEVEL, so guitar lanes must not be stored or counted
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #DLEVEL: 50\n\
         #00021: 01\n\
         #00011: 01\n",
    );
    assert!(doc.bar_groups[0].notes.get("G00100").is_none());
    assert!(doc.guitar_counts.is_none());
    assert_eq!(doc.bar_groups[0].notes.get("HH").unwrap(), "01");
}

#[test]
fn note_counts_follow_tally_rules() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #DLEVEL: 50\n\
         #GLEVEL: 50\n\
         #00011: 010100\n\
         #00012: 0001\n\
         #00023: 0101\n\
         #00020: 01\n\
         #00028: 01\n",
    );

    let drums = doc.drum_counts.unwrap();
    assert_eq!(drums.hh, 2);
    assert_eq!(drums.sd, 1);
    assert_eq!(drums.total, 3);

    // "23" = G01100: two chords hitting G and B buttons each
    let guitar = doc.guitar_counts.unwrap();
    assert_eq!(guitar.g, 2);
    assert_eq!(guitar.b, 2);
    assert_eq!(guitar.r, 0);
    // "20" = open note, counted once and in the total
    assert_eq!(guitar.open, 1);
    // Wails never count toward the total
    assert_eq!(guitar.wail, 1);
    assert_eq!(guitar.total, 3);
}

// ─── Control lanes ───────────────────────────────────────────────────

#[test]
fn bpm_label_defined_after_use_resolves() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #00008: 0001\n\
         #BPM01: 210.5\n",
    );

    let markers = &doc.bar_groups[0].bpm_markers;
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].tick, 96.0);
    assert_eq!(markers[0].bpm, 210.5);
}

#[test]
fn undefined_bpm_label_becomes_nan() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #00008: 0A\n",
    );
    let markers = &doc.bar_groups[0].bpm_markers;
    assert_eq!(markers.len(), 1);
    assert!(markers[0].bpm.is_nan());
}

#[test]
fn line_markers_and_bgm_chip() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #000C2: 0102\n\
         #00201: 000001\n",
    );

    let markers = &doc.bar_groups[0].line_markers;
    assert_eq!(markers.len(), 2);
    assert!(markers[0].visible);
    assert_eq!(markers[1].tick, 96.0);
    assert!(!markers[1].visible);

    assert_eq!(doc.bar_groups[0].bgm_marker, None);
    assert_eq!(doc.bar_groups[2].bgm_marker, Some(128.0));
}

// ─── Hold notes ──────────────────────────────────────────────────────

#[test]
fn hold_note_within_one_bar() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #GLEVEL: 50\n\
         #00021: 0100\n\
         #0002C: 0101\n",
    );

    assert_eq!(doc.guitar_holds.len(), 1);
    let hold = &doc.guitar_holds[0];
    assert_eq!((hold.start.bar, hold.start.tick), (0, 0.0));
    assert_eq!((hold.end.bar, hold.end.tick), (0, 96.0));
    assert_eq!(hold.buttons, "G00100");

    // The hold lane itself is never stored as a note lane
    assert!(doc.bar_groups[0].notes.get("GHold").is_none());
}

#[test]
fn hold_note_crosses_bars() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #GLEVEL: 50\n\
         #00122: 01\n\
         #0012C: 01\n\
         #0032C: 000001\n",
    );

    assert_eq!(doc.guitar_holds.len(), 1);
    let hold = &doc.guitar_holds[0];
    assert_eq!((hold.start.bar, hold.start.tick), (1, 0.0));
    assert_eq!((hold.end.bar, hold.end.tick), (3, 128.0));
    assert_eq!(hold.buttons, "G01000");
}

#[test]
fn interleaved_hit_discards_the_hold() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #GLEVEL: 50\n\
         #00021: 010100\n\
         #0002C: 010001\n",
    );
    assert!(doc.guitar_holds.is_empty());
}

#[test]
fn hold_without_coinciding_hit_never_opens() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #GLEVEL: 50\n\
         #00021: 0001\n\
         #0002C: 0100\n",
    );
    assert!(doc.guitar_holds.is_empty());
}

#[test]
fn bass_holds_are_tracked_separately() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #GLEVEL: 50\n\
         #BLEVEL: 50\n\
         #000A1: 0100\n\
         #0002D: 0101\n",
    );
    assert!(doc.guitar_holds.is_empty());
    assert_eq!(doc.bass_holds.len(), 1);
    assert_eq!(doc.bass_holds[0].buttons, "B00100");
}

// ─── Dialects ────────────────────────────────────────────────────────

#[test]
fn gda_dialect_uses_its_own_lane_codes() {
    let text = ";Created by GDA Creator Professional Ver.0.22\n\
                #TITLE: Old School\n\
                #BPM: 140\n\
                #DLEVEL: 70\n\
                #GLEVEL: 60\n\
                #000SD: 0101\n\
                #000G1: 01\n";
    let doc = parse_str(text, Dialect::Gda).expect("gda fixture should parse");

    assert_eq!(doc.bar_groups[0].notes.get("SD").unwrap(), "0101");
    assert_eq!(doc.drum_counts.unwrap().sd, 2);
    assert_eq!(doc.bar_groups[0].notes.get("G001").unwrap(), "01");

    // The same lines under the DTX dialect match nothing
    let doc = parse_str(text, Dialect::Dtx).expect("still parses");
    assert!(doc.bar_groups[0].notes.is_empty());
}

// ─── Parser reuse and encodings ──────────────────────────────────────

#[test]
fn parser_state_resets_between_documents() {
    let mut parser = Parser::new(ParserConfig::default());

    // First chart leaves a hold pending (opened, never closed)
    let first = parser
        .parse(
            "; Created by DTXCreator 024\n\
             #GLEVEL: 50\n\
             #00021: 0100\n\
             #0002C: 0100\n",
        )
        .unwrap();
    assert!(first.guitar_holds.is_empty());

    // A close marker in the next chart must not resolve against it
    let second = parser
        .parse(
            "; Created by DTXCreator 024\n\
             #GLEVEL: 50\n\
             #0002C: 0001\n",
        )
        .unwrap();
    assert!(second.guitar_holds.is_empty());
}

#[test]
fn shift_jis_bytes_parse() {
    let text = "; Created by DTXCreator 024\n#TITLE: 夜明けの歌\n#00011: 01\n";
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    let doc = chartlib::parse_bytes(&encoded, Dialect::Dtx).unwrap();
    assert_eq!(doc.title, "夜明けの歌");
}

#[test]
fn chart_json_round_trip() {
    let doc = parse_dtx(BASIC_DRUMS);
    let json = chartlib::chart_to_json(&doc).expect("serializes");

    let back: ChartDocument = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back.title, doc.title);
    assert_eq!(back.bar_count(), doc.bar_count());
    assert_eq!(back.drum_counts, doc.drum_counts);
}
