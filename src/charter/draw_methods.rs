//! Per-instrument note drawing.
//!
//! Each instrument has its own lane layout, chip geometry and chip art, so
//! note drawing is a capability the charter delegates to: a
//! `NoteDrawMethod` knows the horizontal geometry for a chart style and how
//! to put one note's chips onto a sheet. One concrete implementation exists
//! per instrument, selected by configuration.

use std::collections::BTreeMap;

use log::warn;

use crate::error::ChartError;
use crate::lanes;
use crate::model::Instrument;

use super::pagination::PixelPosition;
use super::sheet::ChartSheet;
use super::ChartStyle;

// ─── Chip images ─────────────────────────────────────────────────────

/// A loaded chip/decal image. Only the dimensions and a key for the
/// backend matter here; pixel data stays with the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipImage {
    pub key: String,
    pub width: f64,
    pub height: f64,
}

/// Asset-loading collaborator. Retry and timeout policy belong to the
/// implementation, not to the chart core.
pub trait ImageLoader {
    fn load(&mut self, key: &str, source: &str) -> Result<ChipImage, ChartError>;
}

/// The set of chip images available to a draw method.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: BTreeMap<String, ChipImage>,
}

impl ImageSet {
    /// No images at all; chips fall back to plain filled rectangles.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Run every load request through the loader and keep whatever
    /// succeeds. The loads are independent: a failed asset is logged and
    /// skipped, it never blocks the rest. Returns once all requests have
    /// settled.
    pub fn preload(loader: &mut dyn ImageLoader, requests: &[(&str, &str)]) -> Self {
        let mut images = BTreeMap::new();
        for &(key, source) in requests {
            match loader.load(key, source) {
                Ok(image) => {
                    images.insert(key.to_string(), image);
                }
                Err(err) => warn!("chip image '{key}' unavailable: {err}"),
            }
        }
        Self { images }
    }

    pub fn get(&self, key: &str) -> Option<&ChipImage> {
        self.images.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

// ─── Lane geometry ───────────────────────────────────────────────────

/// Horizontal layout of one page column: where each lane sits, how wide
/// its chips are, and the derived page width.
#[derive(Debug, Clone)]
pub struct LaneGeometry {
    /// X offset of the bar-number label
    pub bar_number_x: f64,
    /// X offset of the left page border
    pub left_border: f64,
    /// X offset of the right lane border
    pub right_border: f64,
    /// X offset of the tempo-marker label
    pub bpm_label_x: f64,
    /// Full width of one page column
    pub page_width: f64,
    lane_x: BTreeMap<String, f64>,
    chip_sizes: BTreeMap<String, (f64, f64)>,
    chip_colors: BTreeMap<String, &'static str>,
}

impl LaneGeometry {
    pub fn lane_x(&self, lane: &str) -> Option<f64> {
        self.lane_x.get(lane).copied()
    }

    pub fn chip_size(&self, lane: &str) -> Option<(f64, f64)> {
        self.chip_sizes.get(lane).copied()
    }

    pub fn chip_color(&self, lane: &str) -> &'static str {
        self.chip_colors.get(lane).copied().unwrap_or("#ffffff")
    }

    fn alias_lane(&mut self, from: &str, to: &str) {
        if let Some(x) = self.lane_x.get(to).copied() {
            self.lane_x.insert(from.to_string(), x);
        }
        if let Some(size) = self.chip_sizes.get(to).copied() {
            self.chip_sizes.insert(from.to_string(), size);
        }
    }

    fn finish(&mut self, right_edge: f64) {
        self.right_border = right_edge;
        self.bpm_label_x = right_edge + 8.0;
        self.page_width = right_edge + 8.0 + 48.0;
    }
}

fn empty_geometry() -> LaneGeometry {
    LaneGeometry {
        bar_number_x: 5.0,
        left_border: 47.0,
        right_border: 0.0,
        bpm_label_x: 0.0,
        page_width: 0.0,
        lane_x: BTreeMap::new(),
        chip_sizes: BTreeMap::new(),
        chip_colors: BTreeMap::new(),
    }
}

// ─── Capability trait ────────────────────────────────────────────────

/// The per-instrument drawing capability the charter delegates to.
pub trait NoteDrawMethod {
    fn geometry(&self) -> &LaneGeometry;

    fn image_set(&self) -> &ImageSet;

    /// Whether this method can place notes from the given lane.
    fn handles_lane(&self, lane: &str) -> bool;

    /// Draw one note's chips. `pos` is the pixel position of the note's
    /// tick line at the page's left edge; lane offsets are this method's
    /// concern.
    fn draw_note(&self, lane: &str, sheet: &mut ChartSheet, pos: PixelPosition);

    /// Button flag lanes used by hold-note overlays. Empty for drums.
    fn hold_flag_lanes(&self) -> &[&'static str] {
        &[]
    }

    /// Prefix for sheet identifiers ("drums" → "drums_0", "drums_1", ...).
    fn sheet_id_prefix(&self) -> &'static str;
}

/// The concrete draw method for an instrument.
pub fn draw_method_for(
    instrument: Instrument,
    style: ChartStyle,
    images: ImageSet,
) -> Box<dyn NoteDrawMethod> {
    match instrument {
        Instrument::Drums => Box::new(DrumsDrawMethod::new(style, images)),
        Instrument::Guitar => Box::new(GfDrawMethod::new(GfSide::Guitar, style, images)),
        Instrument::Bass => Box::new(GfDrawMethod::new(GfSide::Bass, style, images)),
    }
}

// ─── Drums ───────────────────────────────────────────────────────────

const DRUM_CHIP_WIDTH: f64 = 18.0;
const DRUM_CHIP_HEIGHT: f64 = 5.0;
const DRUM_LANE_BORDER: f64 = 1.0;

const DRUM_LANES: &[&str] = &[
    "LC", "HH", "HHO", "LB", "LP", "SD", "HT", "BD", "LT", "FT", "RC", "RD",
];

fn drum_lane_order(style: ChartStyle) -> &'static [&'static str] {
    // LP/LB share a position, HH/HHO too
    match style {
        ChartStyle::Full => &["LC", "HH", "LP", "SD", "HT", "BD", "LT", "FT", "RC", "RD"],
        ChartStyle::Gitadora => &["LC", "HH", "LP", "SD", "HT", "BD", "LT", "FT", "RC"],
        ChartStyle::Vmix => &["HH", "SD", "BD", "HT", "LT", "RC"],
    }
}

fn drum_chip_size(lane: &str) -> (f64, f64) {
    let width = match lane {
        "LC" | "RC" => DRUM_CHIP_WIDTH + 6.0,
        "SD" => DRUM_CHIP_WIDTH + 3.0,
        "BD" => DRUM_CHIP_WIDTH + 5.0,
        "RD" => DRUM_CHIP_WIDTH + 1.0,
        _ => DRUM_CHIP_WIDTH,
    };
    (width, DRUM_CHIP_HEIGHT)
}

fn drum_chip_color(lane: &str) -> Option<&'static str> {
    match lane {
        "LC" => Some("#ff4ca1"),
        "HH" | "HHO" => Some("#00ffff"),
        "LB" => Some("#e7baff"),
        "LP" => Some("#ffd3f0"),
        "SD" => Some("#fff040"),
        "HT" => Some("#00ff00"),
        "BD" => Some("#e7baff"),
        "LT" => Some("#ff0000"),
        "FT" => Some("#fea101"),
        "RC" => Some("#00ccff"),
        "RD" => Some("#5a9cf9"),
        _ => None,
    }
}

/// Draws drum chips: one image-backed rectangle per hit on the lane's
/// column.
pub struct DrumsDrawMethod {
    geometry: LaneGeometry,
    images: ImageSet,
}

impl DrumsDrawMethod {
    /// Chip and decal assets this method references, as (key, file) pairs
    /// for the image loader.
    pub const IMAGE_REQUESTS: &'static [(&'static str, &'static str)] = &[
        ("LC", "leftcymbal_chip.png"),
        ("HH", "hihat_chip.png"),
        ("HHO", "hihat_chip.png"),
        ("SD", "snare_chip.png"),
        ("LB", "leftbass_chip.png"),
        ("LP", "lefthihatpedal_chip.png"),
        ("HT", "hitom_chip.png"),
        ("BD", "rightbass_chip.png"),
        ("LT", "lowtom_chip.png"),
        ("FT", "floortom_chip.png"),
        ("RC", "rightcymbal_chip.png"),
        ("RD", "ridecymbal_chip.png"),
        ("drumBasic", "DrumBasicBannerSmall.png"),
        ("drumAdvanced", "DrumAdvancedBannerSmall.png"),
        ("drumExtreme", "DrumExtremeBannerSmall.png"),
        ("drumMaster", "DrumMasterBannerSmall.png"),
    ];

    pub fn new(style: ChartStyle, images: ImageSet) -> Self {
        let mut geometry = empty_geometry();

        let mut x = 50.0;
        for &lane in drum_lane_order(style) {
            let width = images
                .get(lane)
                .map_or(drum_chip_size(lane).0, |img| img.width);
            geometry.lane_x.insert(lane.to_string(), x);
            x += width + DRUM_LANE_BORDER;
        }
        geometry.finish(x);

        for &lane in DRUM_LANES {
            let size = images
                .get(lane)
                .map_or(drum_chip_size(lane), |img| (img.width, img.height));
            geometry.chip_sizes.insert(lane.to_string(), size);
            if let Some(color) = drum_chip_color(lane) {
                geometry.chip_colors.insert(lane.to_string(), color);
            }
        }

        match style {
            ChartStyle::Full => {
                geometry.alias_lane("LB", "LP");
                geometry.alias_lane("HHO", "HH");
            }
            ChartStyle::Gitadora => {
                // Ride notes land on the right-cymbal lane
                geometry.alias_lane("RD", "RC");
                geometry.alias_lane("LB", "LP");
                geometry.alias_lane("HHO", "HH");
            }
            ChartStyle::Vmix => {
                geometry.alias_lane("LC", "HH");
                geometry.alias_lane("LP", "HH");
                geometry.alias_lane("FT", "LT");
                geometry.alias_lane("RD", "RC");
                geometry.alias_lane("LB", "BD");
                geometry.alias_lane("HHO", "HH");
            }
        }

        Self { geometry, images }
    }
}

impl NoteDrawMethod for DrumsDrawMethod {
    fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    fn image_set(&self) -> &ImageSet {
        &self.images
    }

    fn handles_lane(&self, lane: &str) -> bool {
        self.geometry.lane_x.contains_key(lane)
    }

    fn draw_note(&self, lane: &str, sheet: &mut ChartSheet, pos: PixelPosition) {
        let Some(offset) = self.geometry.lane_x(lane) else {
            return;
        };
        let (width, height) = self
            .geometry
            .chip_size(lane)
            .unwrap_or((DRUM_CHIP_WIDTH, DRUM_CHIP_HEIGHT));
        sheet.add_chip(
            pos.x + offset,
            pos.y,
            width,
            height,
            self.geometry.chip_color(lane),
            self.images.get(lane),
        );
    }

    fn sheet_id_prefix(&self) -> &'static str {
        "drums"
    }
}

// ─── Guitar / bass ───────────────────────────────────────────────────

const GF_CHIP_WIDTH: f64 = 19.0;
const GF_CHIP_HEIGHT: f64 = 5.0;
const GF_LANE_BORDER: f64 = 0.0;

const GF_LANES: &[&str] = &["GFR", "GFG", "GFB", "GFY", "GFM", "GFO", "GFOV", "GFW"];

/// Which neck the method draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfSide {
    Guitar,
    Bass,
}

fn gf_lane_order(style: ChartStyle) -> &'static [&'static str] {
    match style {
        ChartStyle::Full | ChartStyle::Gitadora => &["GFR", "GFG", "GFB", "GFY", "GFM", "GFW"],
        ChartStyle::Vmix => &["GFR", "GFG", "GFB", "GFW"],
    }
}

fn gf_flag_lanes(style: ChartStyle) -> &'static [&'static str] {
    match style {
        ChartStyle::Full | ChartStyle::Gitadora => &["GFR", "GFG", "GFB", "GFY", "GFM"],
        ChartStyle::Vmix => &["GFR", "GFG", "GFB"],
    }
}

fn gf_chip_size(lane: &str) -> (f64, f64) {
    match lane {
        "GFO" => (GF_CHIP_WIDTH * 5.0, GF_CHIP_HEIGHT),
        "GFOV" => (GF_CHIP_WIDTH * 3.0, GF_CHIP_HEIGHT),
        "GFW" => (GF_CHIP_WIDTH, 19.0),
        _ => (GF_CHIP_WIDTH, GF_CHIP_HEIGHT),
    }
}

fn gf_chip_color(lane: &str) -> Option<&'static str> {
    match lane {
        "GFR" => Some("#ff0000"),
        "GFG" => Some("#00ff00"),
        "GFB" => Some("#0000ff"),
        "GFY" => Some("#ffff00"),
        "GFM" => Some("#ff00ff"),
        "GFO" | "GFOV" => Some("#ffffff"),
        "GFW" => Some("#654321"),
        _ => None,
    }
}

/// Draws guitar or bass chips: button-combination labels decompose into
/// one chip per pressed button, open notes get the wide open chip, wails
/// get the wail chip.
pub struct GfDrawMethod {
    side: GfSide,
    geometry: LaneGeometry,
    images: ImageSet,
    flag_lanes: &'static [&'static str],
}

impl GfDrawMethod {
    /// Chip and decal assets this method references.
    pub const IMAGE_REQUESTS: &'static [(&'static str, &'static str)] = &[
        ("GFR", "red_gfchip.png"),
        ("GFG", "green_gfchip.png"),
        ("GFB", "blue_gfchip.png"),
        ("GFY", "yellow_gfchip.png"),
        ("GFM", "mag_gfchip.png"),
        ("GFO", "open_gfchip.png"),
        ("GFOV", "open_gfvchip.png"),
        ("GFW", "wail_gfchip.png"),
        ("guitarBasic", "GuitarBasicBannerSmall.png"),
        ("guitarAdvanced", "GuitarAdvancedBannerSmall.png"),
        ("guitarExtreme", "GuitarExtremeBannerSmall.png"),
        ("guitarMaster", "GuitarMasterBannerSmall.png"),
        ("bassBasic", "BassBasicBannerSmall.png"),
        ("bassAdvanced", "BassAdvancedBannerSmall.png"),
        ("bassExtreme", "BassExtremeBannerSmall.png"),
        ("bassMaster", "BassMasterBannerSmall.png"),
    ];

    pub fn new(side: GfSide, style: ChartStyle, images: ImageSet) -> Self {
        let mut geometry = empty_geometry();

        let mut x = 50.0;
        for &lane in gf_lane_order(style) {
            let width = images.get(lane).map_or(gf_chip_size(lane).0, |img| img.width);
            geometry.lane_x.insert(lane.to_string(), x);
            x += width + GF_LANE_BORDER;
        }
        geometry.finish(x);

        for &lane in GF_LANES {
            let size = images
                .get(lane)
                .map_or(gf_chip_size(lane), |img| (img.width, img.height));
            geometry.chip_sizes.insert(lane.to_string(), size);
            if let Some(color) = gf_chip_color(lane) {
                geometry.chip_colors.insert(lane.to_string(), color);
            }
        }

        // The open chip spans the whole neck just inside the left border
        match style {
            ChartStyle::Vmix => {
                geometry.alias_lane("GFY", "GFG");
                geometry.alias_lane("GFM", "GFB");
                geometry
                    .lane_x
                    .insert("GFOV".to_string(), geometry.left_border + 3.0);
            }
            _ => {
                geometry
                    .lane_x
                    .insert("GFO".to_string(), geometry.left_border + 3.0);
            }
        }

        Self {
            side,
            geometry,
            images,
            flag_lanes: gf_flag_lanes(style),
        }
    }

    fn draw_chip(&self, lane: &str, sheet: &mut ChartSheet, pos: PixelPosition) {
        let Some(offset) = self.geometry.lane_x(lane) else {
            return;
        };
        let (width, height) = self
            .geometry
            .chip_size(lane)
            .unwrap_or((GF_CHIP_WIDTH, GF_CHIP_HEIGHT));
        sheet.add_chip(
            pos.x + offset,
            pos.y,
            width,
            height,
            self.geometry.chip_color(lane),
            self.images.get(lane),
        );
    }
}

impl NoteDrawMethod for GfDrawMethod {
    fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    fn image_set(&self) -> &ImageSet {
        &self.images
    }

    fn handles_lane(&self, lane: &str) -> bool {
        lanes::is_gf_label(lane)
    }

    fn draw_note(&self, lane: &str, sheet: &mut ChartSheet, pos: PixelPosition) {
        let prefix = match self.side {
            GfSide::Guitar => 'G',
            GfSide::Bass => 'B',
        };
        if !lane.starts_with(prefix) {
            return;
        }

        if lane.ends_with("Wail") {
            self.draw_chip("GFW", sheet, pos);
            return;
        }

        let flags: Vec<bool> = (0..self.flag_lanes.len())
            .map(|i| lane.chars().nth(i + 1) == Some('1'))
            .collect();

        if flags.iter().any(|&f| f) {
            for (&flag_lane, &set) in self.flag_lanes.iter().zip(&flags) {
                if set {
                    self.draw_chip(flag_lane, sheet, pos);
                }
            }
        } else {
            let open = if self.flag_lanes.len() == 5 { "GFO" } else { "GFOV" };
            self.draw_chip(open, sheet, pos);
        }
    }

    fn hold_flag_lanes(&self) -> &[&'static str] {
        self.flag_lanes
    }

    fn sheet_id_prefix(&self) -> &'static str {
        match self.side {
            GfSide::Guitar => "guitar",
            GfSide::Bass => "bass",
        }
    }
}
