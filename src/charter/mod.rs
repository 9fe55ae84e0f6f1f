//! Chart view renderer — turns a parsed document plus its position
//! timeline into paginated sheets of drawing commands.
//!
//! The charter owns pagination (fixed-height or bar-aligned), the mapping
//! from absolute positions to sheet/page pixel coordinates, and the draw
//! pass over bars, notes and hold overlays. Actual mark-making goes
//! through the `RenderBackend` collaborator; per-instrument note glyphs go
//! through a `NoteDrawMethod`.

mod constants;
pub mod draw_methods;
pub mod pagination;
pub mod sheet;

use log::warn;

use crate::error::ChartError;
use crate::model::{ChartDocument, Instrument};
use crate::parser::decode_lane;
use crate::timeline::PositionMapper;

use constants::*;

pub use draw_methods::{
    draw_method_for, ChipImage, DrumsDrawMethod, GfDrawMethod, GfSide, ImageLoader, ImageSet,
    LaneGeometry, NoteDrawMethod,
};
pub use pagination::{HoldSegment, Page, PixelPosition};
pub use sheet::{
    ChartSheet, DrawCommand, RenderBackend, SheetSpec, TextAlign, TextStyle, VerticalOrigin,
};

/// Lane-layout variant of the rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    /// Every lane on its own column
    #[default]
    Full,
    /// Arcade layout (ride notes fold onto the right cymbal)
    Gitadora,
    /// Compact layout with heavily folded lanes
    Vmix,
}

/// Which way absolute position grows on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Position 0 near the bottom edge, later positions above it
    #[default]
    Up,
    /// Position 0 near the top edge, later positions below it
    Down,
}

/// Difficulty tier, used to pick the decal artwork in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyTier {
    #[default]
    Basic,
    Advanced,
    Extreme,
    Master,
}

impl DifficultyTier {
    fn suffix(self) -> &'static str {
        match self {
            DifficultyTier::Basic => "Basic",
            DifficultyTier::Advanced => "Advanced",
            DifficultyTier::Extreme => "Extreme",
            DifficultyTier::Master => "Master",
        }
    }
}

/// Charter configuration. Out-of-range numeric values are clamped to the
/// documented bounds rather than rejected.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Vertical scale factor, clamped to [0.5, 3.0]
    pub scale: f64,
    /// Page height in pixels, clamped to [480, 3840]
    pub page_height: f64,
    /// Page columns per sheet, clamped to [6, 110]
    pub pages_per_sheet: usize,
    /// Bar-aligned pagination: pages start exactly at bar boundaries
    pub bar_aligned: bool,
    pub direction: Direction,
    pub style: ChartStyle,
    pub instrument: Instrument,
    pub difficulty_tier: DifficultyTier,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            page_height: DEFAULT_PAGE_HEIGHT,
            pages_per_sheet: DEFAULT_PAGES_PER_SHEET,
            bar_aligned: false,
            direction: Direction::default(),
            style: ChartStyle::default(),
            instrument: Instrument::Drums,
            difficulty_tier: DifficultyTier::default(),
        }
    }
}

impl ChartConfig {
    fn clamped(mut self) -> Self {
        self.scale = limit(self.scale, MIN_SCALE, MAX_SCALE);
        self.page_height = limit(self.page_height, MIN_PAGE_HEIGHT, MAX_PAGE_HEIGHT);
        self.pages_per_sheet = limit(self.pages_per_sheet, MIN_PAGES_PER_SHEET, MAX_PAGES_PER_SHEET);
        self
    }
}

fn limit<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Computes the paginated layout for one document and drives the draw
/// pass. Derived tables are built once at construction; reconfiguring
/// means building a new charter.
pub struct Charter<'a> {
    doc: &'a ChartDocument,
    mapper: &'a PositionMapper,
    config: ChartConfig,
    draw_method: Box<dyn NoteDrawMethod>,
    /// Bar-aligned page list; None in fixed-height mode
    pages: Option<Vec<Page>>,
    page_count: usize,
}

impl<'a> Charter<'a> {
    pub fn new(
        doc: &'a ChartDocument,
        mapper: &'a PositionMapper,
        config: ChartConfig,
        draw_method: Box<dyn NoteDrawMethod>,
    ) -> Self {
        let config = config.clamped();

        let pages = config.bar_aligned.then(|| {
            pagination::bar_aligned_pages(
                mapper,
                config.scale,
                config.page_height,
                config.pages_per_sheet,
            )
        });
        let page_count = match &pages {
            Some(pages) => pages.len(),
            None => (mapper.chart_length() * config.scale / config.page_height).ceil() as usize,
        };

        Self {
            doc,
            mapper,
            config,
            draw_method,
            pages,
            page_count,
        }
    }

    /// Construct with the standard draw method for the configured
    /// instrument and style.
    pub fn with_images(
        doc: &'a ChartDocument,
        mapper: &'a PositionMapper,
        config: ChartConfig,
        images: ImageSet,
    ) -> Self {
        let draw_method = draw_method_for(config.instrument, config.style, images);
        Self::new(doc, mapper, config, draw_method)
    }

    /// The clamped configuration in effect.
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Recording sheets matching `sheet_specs`, ready for `draw_chart`.
    pub fn create_sheets(&self) -> Vec<ChartSheet> {
        self.sheet_specs().into_iter().map(ChartSheet::new).collect()
    }

    /// Run the full draw pass. When fewer sheets than required are
    /// supplied, whatever falls on the missing sheets is skipped.
    pub fn draw_chart(&self, sheets: &mut [ChartSheet]) -> Result<(), ChartError> {
        if self.page_count == 0 {
            return Ok(());
        }

        self.draw_chart_info(sheets);
        self.draw_page_frames(sheets);

        for (index, group) in self.doc.bar_groups.iter().enumerate() {
            self.draw_bar_lines(sheets, index, group.tick_count)?;
            self.draw_bar_number(sheets, index)?;

            for marker in &self.mapper.bars()[index].bpm_markers {
                self.draw_bpm_marker(sheets, marker.abs_pos, marker.bpm)?;
            }

            for (lane, payload) in &group.notes {
                if !self.draw_method.handles_lane(lane) {
                    continue;
                }
                for hit in decode_lane(payload, group.tick_count) {
                    let abs = self.mapper.absolute_position(index, hit.tick)?;
                    let pos = self.pixel_position(abs)?;
                    if let Some(sheet) = sheets.get_mut(pos.sheet_index) {
                        self.draw_method.draw_note(lane, sheet, pos);
                    }
                }
            }
        }

        self.draw_hold_notes(sheets)?;

        // Song start and chart end boundary lines
        self.draw_chart_line(sheets, self.mapper.bgm_start_position(), START_LINE_COLOR, 3.0)?;
        self.draw_chart_line(sheets, self.mapper.chart_length(), END_LINE_COLOR, 3.0)?;

        let sheet_count = self.sheet_count();
        if sheet_count > 1 {
            for (index, sheet) in sheets.iter_mut().enumerate().take(sheet_count) {
                self.draw_part_label(sheet, index, sheet_count);
            }
        }

        Ok(())
    }

    // ─── Header block ────────────────────────────────────────────────

    fn draw_chart_info(&self, sheets: &mut [ChartSheet]) {
        let duration = self.mapper.estimated_duration_secs();
        let minutes = (duration / 60.0).floor() as i64;
        let seconds = (duration % 60.0).round() as i64;

        let level = self.doc.level(self.config.instrument);
        let level_text = match self.config.style {
            ChartStyle::Vmix => format!("{}", (level * 10.0).floor() as i64),
            _ => format!("{level:.2}"),
        };

        let upper_line = format!(" Level: {level_text}  BPM: {}", self.doc.bpm);
        let lower_line = format!(
            "Length: {minutes}:{seconds:02}  Total Notes: {}",
            self.doc.total_notes(self.config.instrument)
        );

        let geometry = self.draw_method.geometry();
        let page_stride = geometry.page_width + PAGE_RIGHT_MARGIN;
        let info_x = SHEET_LEFT_MARGIN + page_stride * MIN_PAGES_PER_SHEET as f64;
        let title_max_width = page_stride * 3.8 + SHEET_LEFT_MARGIN;
        let info_max_width = page_stride * 2.0 + SHEET_RIGHT_MARGIN;

        let decal_key = format!(
            "{}{}",
            self.config.instrument.decal_prefix(),
            self.config.difficulty_tier.suffix()
        );

        for sheet in sheets.iter_mut() {
            let sheet_width = sheet.spec().width;

            sheet.add_rectangle(
                -1.0,
                -1.0,
                sheet_width + 2.0,
                INFO_SECTION_HEIGHT + 3.0,
                INFO_FILL,
                1.0,
                VerticalOrigin::Top,
            );

            sheet.add_text(
                SHEET_LEFT_MARGIN + INFO_TEXT_X_OFFSET,
                INFO_SECTION_HEIGHT - 19.0,
                Some(title_max_width),
                &self.doc.title,
                &TextStyle {
                    fill: TEXT_COLOR.to_string(),
                    font_size: TITLE_FONT_SIZE,
                    font_family: INFO_FONT_FAMILY.to_string(),
                    origin_y: VerticalOrigin::Bottom,
                    align: TextAlign::Left,
                },
            );

            if !self.doc.artist.is_empty() {
                sheet.add_text(
                    SHEET_LEFT_MARGIN + INFO_TEXT_X_OFFSET,
                    INFO_SECTION_HEIGHT,
                    Some(title_max_width),
                    &self.doc.artist,
                    &TextStyle {
                        fill: TEXT_COLOR.to_string(),
                        font_size: ARTIST_FONT_SIZE,
                        font_family: INFO_FONT_FAMILY.to_string(),
                        origin_y: VerticalOrigin::Bottom,
                        align: TextAlign::Left,
                    },
                );
            }

            sheet.add_text(
                info_x,
                INFO_SECTION_HEIGHT - 19.0,
                Some(info_max_width),
                &upper_line,
                &TextStyle {
                    fill: TEXT_COLOR.to_string(),
                    font_size: CHART_INFO_FONT_SIZE,
                    font_family: LABEL_FONT_FAMILY.to_string(),
                    origin_y: VerticalOrigin::Bottom,
                    align: TextAlign::Right,
                },
            );

            sheet.add_text(
                info_x,
                INFO_SECTION_HEIGHT,
                Some(info_max_width),
                &lower_line,
                &TextStyle {
                    fill: TEXT_COLOR.to_string(),
                    font_size: ARTIST_FONT_SIZE,
                    font_family: LABEL_FONT_FAMILY.to_string(),
                    origin_y: VerticalOrigin::Bottom,
                    align: TextAlign::Right,
                },
            );

            sheet.add_line(
                SHEET_LEFT_MARGIN,
                INFO_SECTION_HEIGHT,
                sheet_width - SHEET_LEFT_MARGIN - SHEET_RIGHT_MARGIN,
                0.0,
                TITLE_LINE_COLOR,
                2.0,
            );

            if let Some(decal) = self.draw_method.image_set().get(&decal_key) {
                sheet.add_chip(
                    SHEET_LEFT_MARGIN,
                    INFO_SECTION_HEIGHT / 2.0,
                    DECAL_WIDTH,
                    DECAL_HEIGHT,
                    INFO_FILL,
                    Some(decal),
                );
            }
        }
    }

    // ─── Page frames ─────────────────────────────────────────────────

    fn draw_page_frames(&self, sheets: &mut [ChartSheet]) {
        let geometry = self.draw_method.geometry();
        let body_width = geometry.page_width - geometry.left_border;
        let origin_y = self.rect_origin();

        for (sheet_index, sheet) in sheets.iter_mut().enumerate() {
            let page_count = sheet.spec().pages;
            let (start_point, edge_offset, dir) = self.vertical_frame(sheet_index);

            for j in 0..page_count {
                let page_x = self.page_x(j);
                let page_index = sheet_index * self.config.pages_per_sheet + j;
                let page_height = self.page_height_at(page_index);
                let framed_height = page_height + PAGE_INNER_MARGIN * 2.0;

                sheet.add_rectangle(
                    page_x + geometry.left_border,
                    start_point + dir * edge_offset,
                    body_width,
                    framed_height,
                    PAGE_FILL,
                    1.0,
                    origin_y,
                );

                // Bar-aligned pages end mid-frame; mark the final bar line
                if self.config.bar_aligned {
                    sheet.add_line(
                        page_x + geometry.left_border,
                        start_point + dir * (edge_offset + PAGE_INNER_MARGIN + page_height),
                        body_width,
                        0.0,
                        BAR_LINE_COLOR,
                        2.0,
                    );
                }

                sheet.add_line(
                    page_x + geometry.left_border,
                    start_point + dir * (edge_offset + framed_height),
                    body_width,
                    0.0,
                    BORDER_LINE_COLOR,
                    3.0,
                );
                sheet.add_line(
                    page_x + geometry.left_border,
                    start_point + dir * edge_offset,
                    body_width,
                    0.0,
                    BORDER_LINE_COLOR,
                    3.0,
                );
                for border_x in [
                    geometry.left_border,
                    geometry.right_border,
                    geometry.page_width,
                ] {
                    sheet.add_line(
                        page_x + border_x,
                        start_point + dir * edge_offset,
                        0.0,
                        dir * framed_height,
                        BORDER_LINE_COLOR,
                        3.0,
                    );
                }
            }
        }
    }

    // ─── Per-bar elements ────────────────────────────────────────────

    /// Grid line every quarter beat; the bar line itself gets a
    /// distinguished color and runs under the bar-number gutter.
    fn draw_bar_lines(
        &self,
        sheets: &mut [ChartSheet],
        bar: usize,
        tick_count: u32,
    ) -> Result<(), ChartError> {
        let geometry = self.draw_method.geometry();
        let lane_width = geometry.right_border - geometry.left_border;

        for tick in (0..tick_count).step_by(BEAT_LINE_GAP as usize) {
            let abs = self.mapper.absolute_position(bar, f64::from(tick))?;
            let pos = self.pixel_position(abs)?;
            let Some(sheet) = sheets.get_mut(pos.sheet_index) else {
                continue;
            };

            if tick == 0 {
                sheet.add_line(
                    pos.x,
                    pos.y,
                    lane_width + geometry.left_border,
                    0.0,
                    BAR_LINE_COLOR,
                    1.0,
                );
            } else {
                sheet.add_line(
                    pos.x + geometry.left_border,
                    pos.y,
                    lane_width,
                    0.0,
                    QUARTER_LINE_COLOR,
                    1.0,
                );
            }
        }
        Ok(())
    }

    fn draw_bar_number(&self, sheets: &mut [ChartSheet], bar: usize) -> Result<(), ChartError> {
        let abs = self.mapper.absolute_position(bar, 0.0)?;
        let pos = self.pixel_position(abs)?;
        let Some(sheet) = sheets.get_mut(pos.sheet_index) else {
            return Ok(());
        };

        let (text_offset, origin_y) = match self.config.direction {
            Direction::Up => (5.0, VerticalOrigin::Bottom),
            Direction::Down => (0.0, VerticalOrigin::Top),
        };

        sheet.add_text(
            pos.x + self.draw_method.geometry().bar_number_x,
            pos.y + text_offset,
            None,
            &format!("{bar:03}"),
            &TextStyle {
                fill: TEXT_COLOR.to_string(),
                font_size: BAR_NUMBER_FONT_SIZE,
                font_family: LABEL_FONT_FAMILY.to_string(),
                origin_y,
                align: TextAlign::Left,
            },
        );
        Ok(())
    }

    fn draw_bpm_marker(
        &self,
        sheets: &mut [ChartSheet],
        abs_pos: f64,
        bpm: f64,
    ) -> Result<(), ChartError> {
        let pos = self.pixel_position(abs_pos)?;
        let Some(sheet) = sheets.get_mut(pos.sheet_index) else {
            return Ok(());
        };
        let geometry = self.draw_method.geometry();

        sheet.add_line(
            pos.x + geometry.right_border,
            pos.y,
            geometry.bpm_label_x - geometry.right_border,
            0.0,
            BPM_MARKER_LINE_COLOR,
            1.0,
        );
        sheet.add_text(
            pos.x + geometry.bpm_label_x,
            pos.y,
            None,
            &format!("{bpm:.2}"),
            &TextStyle {
                fill: TEXT_COLOR.to_string(),
                font_size: BPM_MARKER_FONT_SIZE,
                font_family: LABEL_FONT_FAMILY.to_string(),
                ..TextStyle::default()
            },
        );
        Ok(())
    }

    /// A full-width line across the lanes at an absolute position; used
    /// for the song start and chart end markers.
    fn draw_chart_line(
        &self,
        sheets: &mut [ChartSheet],
        abs_pos: f64,
        stroke: &str,
        stroke_width: f64,
    ) -> Result<(), ChartError> {
        let pos = self.pixel_position(abs_pos)?;
        let Some(sheet) = sheets.get_mut(pos.sheet_index) else {
            return Ok(());
        };
        let geometry = self.draw_method.geometry();

        sheet.add_line(
            pos.x + geometry.left_border,
            pos.y,
            geometry.right_border - geometry.left_border,
            0.0,
            stroke,
            stroke_width,
        );
        Ok(())
    }

    // ─── Hold overlays ───────────────────────────────────────────────

    fn draw_hold_notes(&self, sheets: &mut [ChartSheet]) -> Result<(), ChartError> {
        let flag_lanes = self.draw_method.hold_flag_lanes();
        if flag_lanes.is_empty() {
            return Ok(());
        }
        let geometry = self.draw_method.geometry();
        let origin_y = self.rect_origin();

        for hold in self.doc.holds(self.config.instrument) {
            let start_abs = self.mapper.absolute_position(hold.start.bar, hold.start.tick)?;
            let end_abs = self.mapper.absolute_position(hold.end.bar, hold.end.tick)?;
            let start = self.pixel_position(start_abs)?;
            let end = self.pixel_position(end_abs)?;

            let flags: Vec<bool> = (0..flag_lanes.len())
                .map(|i| hold.buttons.chars().nth(i + 1) == Some('1'))
                .collect();
            if !flags.iter().any(|&f| f) {
                warn!("open notes cannot hold");
                continue;
            }

            for segment in self.hold_segments(start, end) {
                let Some(sheet) = sheets.get_mut(segment.start.sheet_index) else {
                    continue;
                };
                for (&lane, &set) in flag_lanes.iter().zip(&flags) {
                    if !set {
                        continue;
                    }
                    let Some(offset) = geometry.lane_x(lane) else {
                        continue;
                    };
                    let (chip_width, _) = geometry.chip_size(lane).unwrap_or_default();
                    sheet.add_rectangle(
                        segment.start.x + offset,
                        segment.start.y,
                        chip_width,
                        (segment.end.y - segment.start.y).abs(),
                        geometry.chip_color(lane),
                        0.5,
                        origin_y,
                    );
                }
            }
        }
        Ok(())
    }

    fn draw_part_label(&self, sheet: &mut ChartSheet, index: usize, total: usize) {
        let width = sheet.spec().width;
        let height = sheet.spec().height;
        sheet.add_text(
            width - SHEET_RIGHT_MARGIN - PART_LABEL_INSET,
            height - SHEET_NUMBER_MARGIN,
            None,
            &format!("Part {} of {}", index + 1, total),
            &TextStyle {
                fill: TEXT_COLOR.to_string(),
                font_size: PART_LABEL_FONT_SIZE,
                font_family: LABEL_FONT_FAMILY.to_string(),
                origin_y: VerticalOrigin::Bottom,
                align: TextAlign::Right,
            },
        );
    }

    fn rect_origin(&self) -> VerticalOrigin {
        match self.config.direction {
            Direction::Up => VerticalOrigin::Bottom,
            Direction::Down => VerticalOrigin::Top,
        }
    }
}
