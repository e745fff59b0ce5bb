//! Canvas capability interface for page rendering.
//!
//! The layout engine never draws glyphs or encodes document bytes itself; it
//! issues measure and draw calls against an injected [`Canvas`] implementation.
//! The canvas owns the physical cursor (`x`/`y`), the page geometry and the
//! output sink. The engine owns every layout decision: what text, what color,
//! what position, when to break.
//!
//! A built-in [`LayoutCanvas`] records every draw call with synthetic font
//! metrics. It backs the test suite and the CLI trace output, and doubles as a
//! reference for implementing a real backend.

use log::debug;
use std::collections::HashMap;
use std::fmt;

/// An RGB color as used by the highlighting tables and style sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const GREY: Color = Color::rgb(0x80, 0x80, 0x80);
    pub const LIGHT_GREY: Color = Color::rgb(0xCC, 0xCC, 0xCC);
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0x80, 0x00);
    pub const MAGENTA: Color = Color::rgb(0xFF, 0x00, 0xFF);

    pub fn as_rgb_u8(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Font face selector. Face resolution (file loading, glyph metrics) is the
/// backend's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn name(&self) -> &'static str {
        match self {
            FontStyle::Regular => "regular",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "bold-italic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn name(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn trbl(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// An explicit draw origin. When absent, the canvas appends at its current
/// cursor position (continuing the current line when the previous call was
/// marked `continued`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Options for a single text draw call.
///
/// `continued` is the heart of the flow renderer's contract: a `true` value
/// keeps the line open so the next call appends to it instead of starting a
/// new line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub font: FontStyle,
    pub size: f32,
    pub color: Color,
    pub width: Option<f32>,
    pub align: Align,
    pub line_gap: f32,
    pub continued: bool,
    pub link: Option<String>,
    pub underline: bool,
}

impl TextOptions {
    pub fn new(font: FontStyle, size: f32, color: Color) -> Self {
        Self {
            font,
            size,
            color,
            width: None,
            align: Align::Left,
            line_gap: 0.0,
            continued: false,
            link: None,
            underline: false,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_line_gap(mut self, gap: f32) -> Self {
        self.line_gap = gap;
        self
    }

    pub fn continued(mut self, continued: bool) -> Self {
        self.continued = continued;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self.underline = true;
        self
    }
}

/// Errors raised by a canvas backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// A referenced image asset could not be resolved. Non-fatal for the
    /// engine: the image step is skipped with a warning.
    MissingAsset(String),
    /// The output sink rejected a write or flush. Fatal for the document.
    Sink(String),
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CanvasError::MissingAsset(name) => write!(f, "image asset not found: {}", name),
            CanvasError::Sink(msg) => write!(f, "output sink error: {}", msg),
        }
    }
}

impl std::error::Error for CanvasError {}

/// The page-rendering capability consumed by the engine.
///
/// Implementations keep a cursor that draw calls advance; `move_down` advances
/// it by a multiple of the current line height, the way the original backend
/// does. `new_page` resets the cursor to the top content margin.
pub trait Canvas {
    fn page_width(&self) -> f32;
    fn page_height(&self) -> f32;
    fn margins(&self) -> Margins;

    /// Current vertical cursor position.
    fn y(&self) -> f32;
    fn set_y(&mut self, y: f32);

    /// Line height for the most recently used font size.
    fn current_line_height(&self) -> f32;

    /// Predicts the rendered height of `text` wrapped to `width`. Measurement
    /// is approximate for mixed-style runs; the engine uses it only to place
    /// page breaks, never as the literal draw height.
    fn measure_text(
        &mut self,
        text: &str,
        font: FontStyle,
        size: f32,
        width: f32,
        line_gap: f32,
    ) -> f32;

    /// Draws one styled text fragment. `origin == None` appends at the
    /// current cursor (continuation draw).
    fn draw_text(&mut self, text: &str, origin: Option<Position>, opts: &TextOptions);

    /// Advances the cursor by `factor` times the current line height.
    fn move_down(&mut self, factor: f32);

    /// Starts a new page and resets the cursor to the top margin.
    fn new_page(&mut self);

    /// Intrinsic pixel size of an image asset, or `MissingAsset`.
    fn image_size(&self, file: &str) -> Result<(f32, f32), CanvasError>;

    /// Draws an image at an absolute position with an explicit size.
    fn draw_image(
        &mut self,
        file: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), CanvasError>;

    fn draw_line(&mut self, from: Position, to: Position, color: Color, thickness: f32);

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, thickness: f32);

    /// Flushes and closes the output sink. Called exactly once, after the
    /// last record.
    fn finish(&mut self) -> Result<(), CanvasError>;
}

/// One recorded canvas operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        font: FontStyle,
        size: f32,
        color: Color,
        width: Option<f32>,
        align: Align,
        continued: bool,
        link: Option<String>,
        underline: bool,
    },
    Image {
        file: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Line {
        from: Position,
        to: Position,
        color: Color,
        thickness: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
        thickness: f32,
    },
    NewPage,
}

/// A recording canvas with synthetic font metrics.
///
/// Character advance is approximated as `0.5 * size` and line height as
/// `1.2 * size`, which is close enough to rank layout decisions (wrap counts,
/// page-break placement) without loading any font. Image assets must be
/// registered up front; unregistered assets behave as missing so the
/// engine's skip path can be exercised.
pub struct LayoutCanvas {
    page_width: f32,
    page_height: f32,
    margins: Margins,
    x: f32,
    y: f32,
    current_size: f32,
    line_open: bool,
    line_start_x: f32,
    line_len: usize,
    pages: usize,
    ops: Vec<DrawOp>,
    assets: HashMap<String, (f32, f32)>,
    finished: bool,
    fail_on_finish: Option<String>,
}

impl LayoutCanvas {
    /// A4 geometry with the given margins.
    pub fn a4(margins: Margins) -> Self {
        Self::new(595.0, 842.0, margins)
    }

    pub fn new(page_width: f32, page_height: f32, margins: Margins) -> Self {
        Self {
            page_width,
            page_height,
            margins,
            x: margins.left,
            y: margins.top,
            current_size: 12.0,
            line_open: false,
            line_start_x: margins.left,
            line_len: 0,
            pages: 1,
            ops: Vec::new(),
            assets: HashMap::new(),
            finished: false,
            fail_on_finish: None,
        }
    }

    /// Registers an image asset and its intrinsic size.
    pub fn register_asset(&mut self, name: impl Into<String>, width: f32, height: f32) {
        self.assets.insert(name.into(), (width, height));
    }

    /// Makes `finish` fail, for exercising the fatal sink path in tests.
    pub fn fail_on_finish(&mut self, message: impl Into<String>) {
        self.fail_on_finish = Some(message.into());
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// All recorded text draws, in order.
    pub fn text_ops(&self) -> Vec<&DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .collect()
    }

    /// Serializes the recorded operations as a JSON document, one entry per
    /// operation, for offline inspection of layout decisions.
    pub fn trace_json(&self) -> serde_json::Value {
        let ops: Vec<serde_json::Value> = self
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::Text {
                    text,
                    x,
                    y,
                    font,
                    size,
                    color,
                    width,
                    align,
                    continued,
                    link,
                    underline,
                } => serde_json::json!({
                    "op": "text",
                    "text": text,
                    "x": x,
                    "y": y,
                    "font": font.name(),
                    "size": size,
                    "color": color.to_string(),
                    "width": width,
                    "align": align.name(),
                    "continued": continued,
                    "link": link,
                    "underline": underline,
                }),
                DrawOp::Image {
                    file,
                    x,
                    y,
                    width,
                    height,
                } => serde_json::json!({
                    "op": "image",
                    "file": file,
                    "x": x,
                    "y": y,
                    "width": width,
                    "height": height,
                }),
                DrawOp::Line {
                    from,
                    to,
                    color,
                    thickness,
                } => serde_json::json!({
                    "op": "line",
                    "from": [from.x, from.y],
                    "to": [to.x, to.y],
                    "color": color.to_string(),
                    "thickness": thickness,
                }),
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    thickness,
                } => serde_json::json!({
                    "op": "rect",
                    "x": x,
                    "y": y,
                    "width": width,
                    "height": height,
                    "color": color.to_string(),
                    "thickness": thickness,
                }),
                DrawOp::NewPage => serde_json::json!({ "op": "new_page" }),
            })
            .collect();

        serde_json::json!({
            "pages": self.pages,
            "ops": ops,
        })
    }

    fn line_height_for(size: f32, line_gap: f32) -> f32 {
        size * 1.2 + line_gap
    }

    fn wrapped_height(&self, text: &str, size: f32, width: f32, line_gap: f32) -> f32 {
        let char_advance = (size * 0.5).max(1.0);
        let per_line = (width / char_advance).floor().max(1.0) as usize;
        let mut lines = 0usize;
        for raw_line in text.split('\n') {
            let chars = raw_line.chars().count();
            lines += if chars == 0 {
                1
            } else {
                (chars + per_line - 1) / per_line
            };
        }
        lines.max(1) as f32 * Self::line_height_for(size, line_gap)
    }
}

impl Canvas for LayoutCanvas {
    fn page_width(&self) -> f32 {
        self.page_width
    }

    fn page_height(&self) -> f32 {
        self.page_height
    }

    fn margins(&self) -> Margins {
        self.margins
    }

    fn y(&self) -> f32 {
        self.y
    }

    fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    fn current_line_height(&self) -> f32 {
        Self::line_height_for(self.current_size, 0.0)
    }

    fn measure_text(
        &mut self,
        text: &str,
        _font: FontStyle,
        size: f32,
        width: f32,
        line_gap: f32,
    ) -> f32 {
        self.current_size = size;
        self.wrapped_height(text, size, width, line_gap)
    }

    fn draw_text(&mut self, text: &str, origin: Option<Position>, opts: &TextOptions) {
        self.current_size = opts.size;

        let (x, y) = match origin {
            Some(pos) => {
                self.line_start_x = pos.x;
                self.line_len = 0;
                (pos.x, pos.y)
            }
            None if self.line_open => (self.x, self.y),
            None => {
                self.line_start_x = self.x;
                self.line_len = 0;
                (self.x, self.y)
            }
        };

        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font: opts.font,
            size: opts.size,
            color: opts.color,
            width: opts.width,
            align: opts.align,
            continued: opts.continued,
            link: opts.link.clone(),
            underline: opts.underline,
        });

        self.line_len += text.chars().count();

        if opts.continued {
            // Keep the line open: advance x, hold y.
            let char_advance = (opts.size * 0.5).max(1.0);
            self.x = x + text.chars().count() as f32 * char_advance;
            self.line_open = true;
        } else {
            let wrap_width = opts
                .width
                .unwrap_or(self.page_width - self.line_start_x - self.margins.right);
            let line_text: String = "x".repeat(self.line_len.max(1));
            let height = self.wrapped_height(&line_text, opts.size, wrap_width, opts.line_gap);
            self.y = y + height;
            self.x = self.line_start_x;
            self.line_open = false;
            self.line_len = 0;
        }
    }

    fn move_down(&mut self, factor: f32) {
        self.y += factor * self.current_line_height();
        self.line_open = false;
    }

    fn new_page(&mut self) {
        self.ops.push(DrawOp::NewPage);
        self.pages += 1;
        self.x = self.margins.left;
        self.y = self.margins.top;
        self.line_open = false;
        debug!("layout canvas: page break -> page {}", self.pages);
    }

    fn image_size(&self, file: &str) -> Result<(f32, f32), CanvasError> {
        self.assets
            .get(file)
            .copied()
            .ok_or_else(|| CanvasError::MissingAsset(file.to_string()))
    }

    fn draw_image(
        &mut self,
        file: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), CanvasError> {
        if !self.assets.contains_key(file) {
            return Err(CanvasError::MissingAsset(file.to_string()));
        }
        self.ops.push(DrawOp::Image {
            file: file.to_string(),
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn draw_line(&mut self, from: Position, to: Position, color: Color, thickness: f32) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color,
            thickness,
        });
    }

    fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
        thickness: f32,
    ) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            color,
            thickness,
        });
    }

    fn finish(&mut self) -> Result<(), CanvasError> {
        if let Some(msg) = &self.fail_on_finish {
            return Err(CanvasError::Sink(msg.clone()));
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> LayoutCanvas {
        LayoutCanvas::new(600.0, 800.0, Margins::trbl(40.0, 30.0, 40.0, 30.0))
    }

    #[test]
    fn test_color_display_is_hex() {
        assert_eq!(Color::rgb(0x21, 0x96, 0xf3).to_string(), "#2196f3");
        assert_eq!(Color::BLACK.to_string(), "#000000");
    }

    #[test]
    fn test_measure_text_wraps_by_width() {
        let mut c = canvas();
        // 10pt -> 5pt per char, 100pt width -> 20 chars per line.
        let one_line = c.measure_text("short", FontStyle::Regular, 10.0, 100.0, 0.0);
        let two_lines = c.measure_text(
            &"a".repeat(30),
            FontStyle::Regular,
            10.0,
            100.0,
            0.0,
        );
        assert!(two_lines > one_line);
        assert_eq!(two_lines, 2.0 * one_line);
    }

    #[test]
    fn test_continued_draw_holds_vertical_position() {
        let mut c = canvas();
        let opts = TextOptions::new(FontStyle::Regular, 10.0, Color::BLACK)
            .with_width(400.0)
            .continued(true);
        c.draw_text("first ", Some(Position { x: 50.0, y: 40.0 }), &opts);
        let y_after_continued = c.y();
        c.draw_text("second", None, &opts.clone().continued(false));
        assert_eq!(y_after_continued, 40.0);
        assert!(c.y() > 40.0);
    }

    #[test]
    fn test_new_page_resets_cursor() {
        let mut c = canvas();
        c.set_y(700.0);
        c.new_page();
        assert_eq!(c.y(), 40.0);
        assert_eq!(c.page_count(), 2);
        assert!(matches!(c.ops().last(), Some(DrawOp::NewPage)));
    }

    #[test]
    fn test_unregistered_asset_is_missing() {
        let mut c = canvas();
        assert!(matches!(
            c.image_size("nope.png"),
            Err(CanvasError::MissingAsset(_))
        ));
        assert!(c.draw_image("nope.png", 0.0, 0.0, 10.0, 10.0).is_err());

        c.register_asset("logo.png", 120.0, 60.0);
        assert_eq!(c.image_size("logo.png").unwrap(), (120.0, 60.0));
        assert!(c.draw_image("logo.png", 0.0, 0.0, 120.0, 60.0).is_ok());
    }

    #[test]
    fn test_finish_reports_sink_failure() {
        let mut c = canvas();
        c.fail_on_finish("disk full");
        match c.finish() {
            Err(CanvasError::Sink(msg)) => assert!(msg.contains("disk full")),
            other => panic!("expected sink error, got {:?}", other),
        }
    }

    #[test]
    fn test_trace_json_shape() {
        let mut c = canvas();
        c.draw_text(
            "hello",
            Some(Position { x: 50.0, y: 40.0 }),
            &TextOptions::new(FontStyle::Bold, 12.0, Color::BLACK),
        );
        let trace = c.trace_json();
        assert_eq!(trace["pages"], 1);
        assert_eq!(trace["ops"][0]["op"], "text");
        assert_eq!(trace["ops"][0]["font"], "bold");
    }
}
