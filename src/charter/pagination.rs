//! Page partitioning and position → pixel mapping.
//!
//! Fixed-height pagination is pure arithmetic. Bar-aligned pagination
//! greedily packs whole bars into pages with a fit check before every
//! placement, so a page never splits a bar and the loop never has to back
//! up and retry.

use log::warn;
use serde::Serialize;

use crate::error::ChartError;
use crate::timeline::PositionMapper;

use super::constants::*;
use super::sheet::SheetSpec;
use super::{Charter, Direction};

/// A pixel coordinate on one page slot of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPosition {
    pub sheet_index: usize,
    pub page_in_sheet: usize,
    pub x: f64,
    pub y: f64,
}

/// One bar-aligned page: a run of whole bars and its realized height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub start_bar: usize,
    pub end_bar: usize,
    /// Realized content height. At most the page-height limit, except for
    /// a single oversized bar, and except for the last page of a sheet,
    /// which is widened to the sheet's maximum.
    pub height: f64,
}

/// One vertical piece of a hold-note overlay. Chains are continuous:
/// a segment ends at a page edge and the next starts at the following
/// page's opposite edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldSegment {
    pub start: PixelPosition,
    pub end: PixelPosition,
}

/// Pack bars into pages, never splitting a bar. A bar taller than the
/// limit by itself gets its own oversized page. The last page of every
/// sheet is then widened to the tallest page of that sheet so all pages
/// sharing a sheet render at a uniform height.
pub(super) fn bar_aligned_pages(
    mapper: &PositionMapper,
    scale: f64,
    page_height: f64,
    pages_per_sheet: usize,
) -> Vec<Page> {
    let bars = mapper.bars();
    if bars.is_empty() {
        return Vec::new();
    }

    let mut pages = Vec::new();
    let mut start_bar = 0;
    let mut height = 0.0;

    for i in 0..bars.len() {
        let bar_start = bars[i].abs_start;
        let bar_end = if i + 1 < bars.len() {
            bars[i + 1].abs_start
        } else {
            mapper.chart_length()
        };
        let bar_height = (bar_end - bar_start) * scale;

        if height > 0.0 && height + bar_height > page_height {
            pages.push(Page {
                start_bar,
                end_bar: i - 1,
                height,
            });
            start_bar = i;
            height = 0.0;
        }
        if bar_height > page_height {
            warn!(
                "bar {i} is taller ({bar_height:.0}px) than the page limit \
                 ({page_height:.0}px); placing it on an oversized page"
            );
        }
        height += bar_height;
    }
    pages.push(Page {
        start_bar,
        end_bar: bars.len() - 1,
        height,
    });

    for sheet in pages.chunks_mut(pages_per_sheet) {
        let tallest = sheet.iter().map(|p| p.height).fold(0.0, f64::max);
        if let Some(last) = sheet.last_mut() {
            last.height = tallest;
        }
    }

    pages
}

impl Charter<'_> {
    /// Total number of pages across all sheets.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of sheets the chart spans.
    pub fn sheet_count(&self) -> usize {
        let pps = self.config.pages_per_sheet;
        (self.page_count + pps - 1) / pps
    }

    /// The bar-aligned page list (None in fixed-height mode).
    pub fn pages(&self) -> Option<&[Page]> {
        self.pages.as_deref()
    }

    pub(super) fn pages_in_sheet(&self, sheet_index: usize) -> usize {
        let pps = self.config.pages_per_sheet;
        let remainder = self.page_count % pps;
        if sheet_index + 1 == self.sheet_count() && remainder != 0 {
            remainder
        } else {
            pps
        }
    }

    /// Content height of one page slot, by absolute page index.
    pub(super) fn page_height_at(&self, page_index: usize) -> f64 {
        match &self.pages {
            Some(pages) => pages.get(page_index).map_or(self.config.page_height, |p| p.height),
            None => self.config.page_height,
        }
    }

    /// Full pixel height of one sheet including chrome.
    pub(super) fn sheet_height(&self, sheet_index: usize) -> f64 {
        let chrome = INFO_SECTION_HEIGHT + PAGE_TOP_MARGIN + PAGE_BOTTOM_MARGIN + PAGE_INNER_MARGIN * 2.0;
        match &self.pages {
            Some(pages) => {
                let pps = self.config.pages_per_sheet;
                let slice = &pages[sheet_index * pps..(sheet_index * pps + self.pages_in_sheet(sheet_index)).min(pages.len())];
                let tallest = slice.iter().map(|p| p.height).fold(0.0, f64::max);
                tallest + chrome
            }
            None => self.config.page_height + chrome,
        }
    }

    /// X of a page column's left edge within its sheet.
    pub(super) fn page_x(&self, page_in_sheet: usize) -> f64 {
        let page_width = self.draw_method.geometry().page_width;
        SHEET_LEFT_MARGIN + (page_width + PAGE_RIGHT_MARGIN) * page_in_sheet as f64
    }

    /// (start point, edge offset, direction multiplier) for vertical
    /// placement on one sheet. "Up" anchors position 0 near the bottom
    /// edge, "down" near the top.
    pub(super) fn vertical_frame(&self, sheet_index: usize) -> (f64, f64, f64) {
        match self.config.direction {
            Direction::Up => (self.sheet_height(sheet_index), PAGE_BOTTOM_MARGIN, -1.0),
            Direction::Down => (0.0, INFO_SECTION_HEIGHT + PAGE_TOP_MARGIN, 1.0),
        }
    }

    /// Dimensions for every sheet this chart needs. The caller creates
    /// matching surfaces (or `ChartSheet`s) from these before the draw
    /// pass.
    pub fn sheet_specs(&self) -> Vec<SheetSpec> {
        let prefix = self.draw_method.sheet_id_prefix();
        (0..self.sheet_count())
            .map(|i| {
                let pages = self.pages_in_sheet(i);
                // A short final sheet still gets the minimum page width
                let width_pages = pages.max(MIN_PAGES_PER_SHEET);
                let page_width = self.draw_method.geometry().page_width;
                SheetSpec {
                    pages,
                    width: SHEET_LEFT_MARGIN
                        + (page_width + PAGE_RIGHT_MARGIN) * width_pages as f64
                        + SHEET_RIGHT_MARGIN,
                    height: self.sheet_height(i),
                    background: BACKGROUND_FILL.to_string(),
                    id: format!("{prefix}_{i}"),
                }
            })
            .collect()
    }

    /// Map an absolute position to a sheet, page slot and pixel
    /// coordinate. Positions outside `[0, chart_length]` are rejected.
    pub fn pixel_position(&self, position: f64) -> Result<PixelPosition, ChartError> {
        let length = self.mapper.chart_length();
        if !position.is_finite() || position < 0.0 || position > length || self.page_count == 0 {
            return Err(ChartError::PositionOutOfRange { position, length });
        }

        let (page_index, y_in_page) = match &self.pages {
            Some(pages) => {
                // Reverse linear scan; runs once per layout pass, not per
                // frame.
                let bars = self.mapper.bars();
                let mut found = (0, position * self.config.scale);
                for (i, page) in pages.iter().enumerate().rev() {
                    let lower = bars[page.start_bar].abs_start;
                    if position >= lower {
                        found = (i, (position - lower) * self.config.scale);
                        break;
                    }
                }
                found
            }
            None => {
                let scaled = position * self.config.scale;
                let mut page = (scaled / self.config.page_height).floor() as usize;
                let mut y = scaled % self.config.page_height;
                // The chart-end position can land exactly on a page
                // boundary; clamp it to the far edge of the last page.
                if page >= self.page_count {
                    page = self.page_count - 1;
                    y = self.config.page_height;
                }
                (page, y)
            }
        };

        let pps = self.config.pages_per_sheet;
        let sheet_index = page_index / pps;
        let page_in_sheet = page_index % pps;
        let (start_point, edge_offset, dir) = self.vertical_frame(sheet_index);

        Ok(PixelPosition {
            sheet_index,
            page_in_sheet,
            x: self.page_x(page_in_sheet),
            y: start_point + dir * (edge_offset + PAGE_INNER_MARGIN + y_in_page),
        })
    }

    /// Decompose a hold note's span into one vertical segment per page
    /// slot it crosses. Intermediate segments run to their page's far
    /// content edge; the next segment starts at the following page's near
    /// edge. The first start and last end are exactly the requested
    /// endpoints.
    pub fn hold_segments(&self, start: PixelPosition, end: PixelPosition) -> Vec<HoldSegment> {
        let pps = self.config.pages_per_sheet;
        let start_page = start.sheet_index * pps + start.page_in_sheet;
        let end_page = end.sheet_index * pps + end.page_in_sheet;

        if end_page <= start_page {
            return vec![HoldSegment { start, end }];
        }

        let mut segments = Vec::with_capacity(end_page - start_page + 1);
        let mut current_start = start;

        for page_index in start_page..end_page {
            let sheet_index = page_index / pps;
            let page_in_sheet = page_index % pps;
            let (start_point, edge_offset, dir) = self.vertical_frame(sheet_index);

            segments.push(HoldSegment {
                start: current_start,
                end: PixelPosition {
                    sheet_index,
                    page_in_sheet,
                    x: current_start.x,
                    y: start_point
                        + dir * (edge_offset + PAGE_INNER_MARGIN + self.page_height_at(page_index)),
                },
            });

            let next_index = page_index + 1;
            let next_sheet = next_index / pps;
            let next_slot = next_index % pps;
            let (next_start_point, next_edge, next_dir) = self.vertical_frame(next_sheet);
            current_start = PixelPosition {
                sheet_index: next_sheet,
                page_in_sheet: next_slot,
                x: self.page_x(next_slot),
                y: next_start_point + next_dir * (next_edge + PAGE_INNER_MARGIN),
            };
        }

        segments.push(HoldSegment {
            start: current_start,
            end,
        });
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BarGroup, ChartDocument};

    fn four_bar_doc() -> ChartDocument {
        let mut doc = ChartDocument::new();
        doc.bpm = 180.0;
        for _ in 0..4 {
            doc.bar_groups.push(BarGroup::empty(192));
        }
        doc
    }

    #[test]
    fn bars_pack_greedily_without_splitting() {
        let doc = four_bar_doc();
        let mapper = PositionMapper::new(&doc);
        // 192 abs units per bar × 1.5625 = 300px per bar
        let pages = bar_aligned_pages(&mapper, 1.5625, 700.0, 20);
        assert_eq!(pages.len(), 2);
        assert_eq!((pages[0].start_bar, pages[0].end_bar), (0, 1));
        assert_eq!((pages[1].start_bar, pages[1].end_bar), (2, 3));
        assert!((pages[0].height - 600.0).abs() < 1e-9);
        assert!(pages.iter().all(|p| p.height <= 700.0));
    }

    #[test]
    fn oversized_bar_gets_its_own_page() {
        let mut doc = ChartDocument::new();
        doc.bpm = 180.0;
        doc.bar_groups.push(BarGroup::empty(192));
        doc.bar_groups.push(BarGroup::empty(1536)); // 8 bars long
        doc.bar_groups.push(BarGroup::empty(192));
        let mapper = PositionMapper::new(&doc);
        let pages = bar_aligned_pages(&mapper, 1.0, 480.0, 20);
        assert_eq!(pages.len(), 3);
        assert_eq!((pages[1].start_bar, pages[1].end_bar), (1, 1));
        assert!(pages[1].height > 480.0);
    }
}
