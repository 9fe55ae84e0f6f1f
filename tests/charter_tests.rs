//! Charter tests — pagination, coordinate mapping, hold segmentation and
//! the draw pass.

use pretty_assertions::assert_eq;

use chartlib::charter::{
    ChartConfig, ChartSheet, Charter, ChipImage, Direction, DrawCommand, ImageLoader, ImageSet,
};
use chartlib::{parse_str, ChartDocument, ChartError, Dialect, Instrument, PositionMapper};

fn parse_dtx(text: &str) -> ChartDocument {
    parse_str(text, Dialect::Dtx).expect("fixture should parse")
}

/// A chart of `n` standard bars at the reference tempo: each bar spans
/// exactly 192 absolute units.
fn bars_doc(n: usize) -> ChartDocument {
    parse_dtx(&format!(
        "; Created by DTXCreator 024\n#BPM: 180\n#{:03}11: 01\n",
        n - 1
    ))
}

fn has_text(sheet: &ChartSheet, needle: &str) -> bool {
    sheet
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::Text { content, .. } if content.contains(needle)))
}

// Full drums layout without images: lane columns end at x=261, so one
// page column is 261 + 8 + 48 = 317 pixels wide.
const PAGE_WIDTH: f64 = 317.0;
// Sheet chrome above and below the page body.
const CHROME: f64 = 58.0 + 2.0 + 40.0 + 24.0;

// ─── Configuration ───────────────────────────────────────────────────

#[test]
fn config_values_are_clamped() {
    let doc = bars_doc(1);
    let mapper = PositionMapper::new(&doc);

    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 9.0,
            page_height: 100.0,
            pages_per_sheet: 3,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    assert_eq!(charter.config().scale, 3.0);
    assert_eq!(charter.config().page_height, 480.0);
    assert_eq!(charter.config().pages_per_sheet, 6);

    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 0.1,
            page_height: 9999.0,
            pages_per_sheet: 500,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    assert_eq!(charter.config().scale, 0.5);
    assert_eq!(charter.config().page_height, 3840.0);
    assert_eq!(charter.config().pages_per_sheet, 110);
}

// ─── Fixed-height pagination ─────────────────────────────────────────

#[test]
fn fixed_mode_page_count() {
    // 5 bars × 192 units × 1.5625 = 1500 scaled pixels over 720px pages
    let doc = bars_doc(5);
    let mapper = PositionMapper::new(&doc);
    assert_eq!(mapper.chart_length(), 960.0);

    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 1.5625,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    assert_eq!(charter.page_count(), 3);
    assert_eq!(charter.sheet_count(), 1);

    let specs = charter.sheet_specs();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].pages, 3);
    // A short sheet is still sized at the 6-page minimum width
    assert_eq!(specs[0].width, 3.0 + PAGE_WIDTH * 6.0 + 3.0);
    assert_eq!(specs[0].height, 720.0 + CHROME);
    assert_eq!(specs[0].id, "drums_0");
}

#[test]
fn up_direction_y_decreases_with_position() {
    let doc = bars_doc(5);
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 1.5625,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );

    // Sheet is 844px tall; position 0 sits just above the bottom margin
    let origin = charter.pixel_position(0.0).unwrap();
    assert_eq!(origin.y, 844.0 - (40.0 + 12.0));
    let later = charter.pixel_position(256.0).unwrap();
    assert_eq!(later.page_in_sheet, 0);
    assert_eq!(later.y, 844.0 - (40.0 + 12.0 + 400.0));
    assert!(later.y < origin.y);
}

#[test]
fn down_direction_y_increases_with_position() {
    let doc = bars_doc(5);
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 1.5625,
            direction: Direction::Down,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );

    let origin = charter.pixel_position(0.0).unwrap();
    assert_eq!(origin.y, 58.0 + 2.0 + 12.0);
    let later = charter.pixel_position(256.0).unwrap();
    assert_eq!(later.y, 58.0 + 2.0 + 12.0 + 400.0);
    assert!(later.y > origin.y);
}

#[test]
fn positions_outside_the_chart_are_rejected() {
    let doc = bars_doc(5);
    let mapper = PositionMapper::new(&doc);
    let charter =
        Charter::with_images(&doc, &mapper, ChartConfig::default(), ImageSet::empty());

    assert!(matches!(
        charter.pixel_position(-0.1),
        Err(ChartError::PositionOutOfRange { .. })
    ));
    assert!(matches!(
        charter.pixel_position(960.1),
        Err(ChartError::PositionOutOfRange { .. })
    ));
}

#[test]
fn chart_end_on_a_page_boundary_maps_to_the_last_page_edge() {
    // 960 units × 1.5 = 1440 = exactly two 720px pages
    let doc = bars_doc(5);
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 1.5,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    assert_eq!(charter.page_count(), 2);

    let end = charter.pixel_position(960.0).unwrap();
    assert_eq!(end.page_in_sheet, 1);
    assert_eq!(end.y, 844.0 - (40.0 + 12.0 + 720.0));
}

// ─── Bar-aligned pagination ──────────────────────────────────────────

#[test]
fn bar_aligned_pages_never_split_bars() {
    // Four bars of 300 scaled pixels against a 700px limit
    let doc = bars_doc(4);
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            scale: 1.5625,
            page_height: 700.0,
            bar_aligned: true,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );

    let pages = charter.pages().expect("bar-aligned page list");
    assert_eq!(pages.len(), 2);
    assert_eq!((pages[0].start_bar, pages[0].end_bar), (0, 1));
    assert_eq!((pages[1].start_bar, pages[1].end_bar), (2, 3));
    assert_eq!(pages[0].height, 600.0);
    assert_eq!(pages[1].height, 600.0);
    assert!(pages.iter().all(|p| p.height <= 700.0));

    // Bar 2 starts at the top of page 1
    let pos = charter.pixel_position(384.0).unwrap();
    assert_eq!(pos.sheet_index, 0);
    assert_eq!(pos.page_in_sheet, 1);

    // Sheet height follows the tallest realized page
    let specs = charter.sheet_specs();
    assert_eq!(specs[0].height, 600.0 + CHROME);
}

// ─── Hold segmentation ───────────────────────────────────────────────

#[test]
fn hold_spanning_three_slots_decomposes_into_a_chain() {
    // 8 bars = 1536 units over 480px pages: four pages on one sheet
    let doc = bars_doc(8);
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            page_height: 480.0,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    assert_eq!(charter.page_count(), 4);

    let start = charter.pixel_position(100.0).unwrap();
    let end = charter.pixel_position(1100.0).unwrap();
    assert_eq!(start.page_in_sheet, 0);
    assert_eq!(end.page_in_sheet, 2);

    let segments = charter.hold_segments(start, end);
    assert_eq!(segments.len(), 3);

    // The chain starts and ends exactly at the requested endpoints
    assert_eq!(segments[0].start, start);
    assert_eq!(segments[2].end, end);

    // Sheet is 604px tall; intermediate segments run to the far content
    // edge of their page, the next one resumes at the near edge
    assert_eq!(segments[0].end.y, 604.0 - (40.0 + 12.0 + 480.0));
    assert_eq!(segments[1].start.y, 604.0 - (40.0 + 12.0));
    assert_eq!(segments[1].start.page_in_sheet, 1);
    assert_eq!(segments[2].start.page_in_sheet, 2);

    // One page column over per slot
    assert_eq!(segments[0].start.x, 3.0);
    assert_eq!(segments[1].start.x, 3.0 + PAGE_WIDTH);
    assert_eq!(segments[2].start.x, 3.0 + PAGE_WIDTH * 2.0);
}

// ─── Draw pass ───────────────────────────────────────────────────────

#[test]
fn draw_pass_emits_commands_for_every_element() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #TITLE: Short One\n\
         #BPM: 150\n\
         #DLEVEL: 50\n\
         #00011: 01\n",
    );
    let mapper = PositionMapper::new(&doc);
    let charter =
        Charter::with_images(&doc, &mapper, ChartConfig::default(), ImageSet::empty());

    let mut sheets = charter.create_sheets();
    assert_eq!(sheets.len(), 1);
    charter.draw_chart(&mut sheets).expect("draw pass succeeds");

    let commands = sheets[0].commands();
    assert!(!commands.is_empty());

    // Exactly one note chip: hi-hat at tick 0 on its lane column
    let chips: Vec<_> = commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Chip { .. }))
        .collect();
    assert_eq!(chips.len(), 1);
    assert_eq!(
        chips[0],
        &DrawCommand::Chip {
            x: 3.0 + 75.0,
            y: 844.0 - 52.0,
            width: 18.0,
            height: 5.0,
            fill: "#00ffff".to_string(),
            image: None,
        }
    );

    // Header block and bar number
    assert!(has_text(&sheets[0], "Short One"));
    assert!(has_text(&sheets[0], "000"));
    assert!(has_text(&sheets[0], "Total Notes: 1"));

    // Chart boundary lines
    let strokes: Vec<&str> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Line { stroke, .. } => Some(stroke.as_str()),
            _ => None,
        })
        .collect();
    assert!(strokes.contains(&"#00ff00"));
    assert!(strokes.contains(&"#ff0000"));

    // Single sheet, so no part label
    assert!(!has_text(&sheets[0], "Part 1 of"));
}

#[test]
fn multiple_sheets_get_part_labels() {
    let doc = bars_doc(16); // 3072 units
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            page_height: 480.0,
            pages_per_sheet: 6,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );

    assert_eq!(charter.page_count(), 7);
    assert_eq!(charter.sheet_count(), 2);

    let specs = charter.sheet_specs();
    assert_eq!(specs[0].pages, 6);
    assert_eq!(specs[1].pages, 1);
    // Short final sheet keeps the minimum page width
    assert_eq!(specs[1].width, specs[0].width);

    let mut sheets = charter.create_sheets();
    charter.draw_chart(&mut sheets).expect("draw pass succeeds");
    assert!(has_text(&sheets[0], "Part 1 of 2"));
    assert!(has_text(&sheets[1], "Part 2 of 2"));
}

#[test]
fn hold_overlays_are_translucent_rectangles() {
    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #TITLE: Holds\n\
         #BPM: 150\n\
         #GLEVEL: 50\n\
         #00022: 0100\n\
         #0002C: 0101\n",
    );
    let mapper = PositionMapper::new(&doc);
    assert_eq!(doc.guitar_holds.len(), 1);

    let charter = Charter::with_images(
        &doc,
        &mapper,
        ChartConfig {
            instrument: Instrument::Guitar,
            ..ChartConfig::default()
        },
        ImageSet::empty(),
    );
    let mut sheets = charter.create_sheets();
    charter.draw_chart(&mut sheets).expect("draw pass succeeds");

    // Buttons "G01000" hold down the green lane
    let overlay = sheets[0].commands().iter().find(|c| {
        matches!(c, DrawCommand::Rectangle { opacity, fill, .. }
            if *opacity == 0.5 && fill == "#00ff00")
    });
    assert!(overlay.is_some(), "expected a translucent hold overlay");
}

// ─── Image preloading ────────────────────────────────────────────────

struct StubLoader;

impl ImageLoader for StubLoader {
    fn load(&mut self, key: &str, _source: &str) -> Result<ChipImage, ChartError> {
        if key == "SD" {
            return Err(ChartError::ImageLoad {
                key: key.to_string(),
                reason: "missing asset".to_string(),
            });
        }
        Ok(ChipImage {
            key: key.to_string(),
            width: 30.0,
            height: 6.0,
        })
    }
}

#[test]
fn one_failed_image_never_blocks_the_rest() {
    let images = ImageSet::preload(
        &mut StubLoader,
        &[("HH", "hihat_chip.png"), ("SD", "snare_chip.png")],
    );
    assert!(images.get("HH").is_some());
    assert!(images.get("SD").is_none());

    let doc = parse_dtx(
        "; Created by DTXCreator 024\n\
         #BPM: 150\n\
         #DLEVEL: 50\n\
         #00011: 01\n\
         #00012: 01\n",
    );
    let mapper = PositionMapper::new(&doc);
    let charter = Charter::with_images(&doc, &mapper, ChartConfig::default(), images);

    let mut sheets = charter.create_sheets();
    charter.draw_chart(&mut sheets).expect("draw pass succeeds");

    // The loaded image backs the hi-hat chip and dictates its size; the
    // snare chip falls back to the plain colored rectangle
    let mut saw_image_chip = false;
    let mut saw_plain_chip = false;
    for command in sheets[0].commands() {
        if let DrawCommand::Chip { width, height, image, .. } = command {
            match image.as_deref() {
                Some("HH") => {
                    assert_eq!((*width, *height), (30.0, 6.0));
                    saw_image_chip = true;
                }
                None => saw_plain_chip = true,
                _ => {}
            }
        }
    }
    assert!(saw_image_chip);
    assert!(saw_plain_chip);
}
