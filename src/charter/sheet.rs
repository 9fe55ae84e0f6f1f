//! Sheet surfaces and the drawing-command vocabulary.
//!
//! A `ChartSheet` accumulates an ordered list of `DrawCommand`s in
//! sheet-relative pixel coordinates. Materializing those commands onto a
//! real surface (a window, an image buffer, a canvas element) is the
//! `RenderBackend` collaborator's job and out of scope here; the commands
//! serialize, so they can also cross a process or FFI boundary as JSON.

use serde::Serialize;

use super::draw_methods::ChipImage;

/// Vertical anchor of a rectangle or text baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalOrigin {
    Top,
    Center,
    Bottom,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Right,
}

/// One drawing operation in sheet-relative pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        opacity: f64,
        origin_y: VerticalOrigin,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: String,
        stroke_width: f64,
    },
    /// An image-backed note rectangle; falls back to a filled rectangle
    /// when the image asset is unavailable. Anchored at its vertical
    /// center so the chip straddles its tick line.
    Chip {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        image: Option<String>,
    },
    Text {
        x: f64,
        y: f64,
        /// Scale-to-fit bound; None leaves the text unconstrained
        max_width: Option<f64>,
        content: String,
        fill: String,
        font_size: f64,
        font_family: String,
        origin_y: VerticalOrigin,
        align: TextAlign,
    },
}

/// Style parameters for a text label.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub fill: String,
    pub font_size: f64,
    pub font_family: String,
    pub origin_y: VerticalOrigin,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: "#ffffff".to_string(),
            font_size: 20.0,
            font_family: "Times New Roman".to_string(),
            origin_y: VerticalOrigin::Center,
            align: TextAlign::Left,
        }
    }
}

/// Dimensions and identity of one rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSpec {
    /// Number of page columns on this sheet
    pub pages: usize,
    pub width: f64,
    pub height: f64,
    pub background: String,
    /// Stable identifier, e.g. "drums_0", "drums_1"
    pub id: String,
}

/// One rendering surface plus its accumulated draw commands.
#[derive(Debug, Clone)]
pub struct ChartSheet {
    spec: SheetSpec,
    commands: Vec<DrawCommand>,
}

impl ChartSheet {
    pub fn new(spec: SheetSpec) -> Self {
        Self {
            spec,
            commands: Vec::new(),
        }
    }

    pub fn spec(&self) -> &SheetSpec {
        &self.spec
    }

    /// The ordered draw commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop all recorded commands, keeping the sheet dimensions.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// A line from (x, y) to (x + width, y + height).
    pub fn add_line(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: &str, stroke_width: f64) {
        self.commands.push(DrawCommand::Line {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
            stroke: stroke.to_string(),
            stroke_width,
        });
    }

    pub fn add_rectangle(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: &str,
        opacity: f64,
        origin_y: VerticalOrigin,
    ) {
        self.commands.push(DrawCommand::Rectangle {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            opacity,
            origin_y,
        });
    }

    /// A note chip. When an image is supplied its dimensions win over the
    /// given width/height.
    pub fn add_chip(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str, image: Option<&ChipImage>) {
        let (width, height) = match image {
            Some(img) => (img.width, img.height),
            None => (width, height),
        };
        self.commands.push(DrawCommand::Chip {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            image: image.map(|img| img.key.clone()),
        });
    }

    pub fn add_text(&mut self, x: f64, y: f64, max_width: Option<f64>, content: &str, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            max_width,
            content: content.to_string(),
            fill: style.fill.clone(),
            font_size: style.font_size,
            font_family: style.font_family.clone(),
            origin_y: style.origin_y,
            align: style.align,
        });
    }
}

/// Materializes recorded draw commands onto an actual display surface.
/// Implementations live outside the core.
pub trait RenderBackend {
    fn apply(&mut self, command: &DrawCommand);

    /// Replay a whole sheet in recorded order.
    fn render_sheet(&mut self, sheet: &ChartSheet) {
        for command in sheet.commands() {
            self.apply(command);
        }
    }
}
