//! Document assembly: record dispatch, section chrome and code blocks.
//!
//! The assembler walks the ordered record list once and drives the canvas
//! through the flow renderer and the pagination controller. A small
//! [`RenderState`] carries the cross-record facts: whether the next linkable
//! title is the first of its chapter (no divider before it), whether the
//! previous record was a code block (divider suppressed, cached line height
//! frozen), and the running chapter step number.

use crate::canvas::{Canvas, Color, FontStyle, Position, TextOptions};
use crate::highlighting::{
    classify_structured_line, diff_line_color, pretty_structured, spec_for, tokenize_line,
    tokenize_stylesheet_line, SourceLanguage, StructuredLine, CODE_GREEN, TAG_RED,
};
use crate::layout::{self, FlowStyle};
use crate::markup::{ensure_paragraph, sanitize};
use crate::styling::StyleSheet;
use crate::GdpError;
use log::warn;

/// What a record renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Text,
    Intro,
    Chapter,
    Image,
    Code,
}

/// An image record's asset and caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub file: String,
    pub caption: String,
}

/// A code record's header and highlighting parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeMeta {
    pub filename: String,
    pub font_size: f32,
    pub language: String,
}

/// One content record. Records are immutable inputs; the assembler never
/// mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub kind: RecordKind,
    pub title: String,
    pub content: String,
    pub linkable: bool,
    /// Image asset for image records; cover asset for chapter records.
    pub image: Option<ImageMeta>,
    pub code: Option<CodeMeta>,
}

impl ContentRecord {
    pub fn text(title: impl Into<String>, content: impl Into<String>, linkable: bool) -> Self {
        Self {
            kind: RecordKind::Text,
            title: title.into(),
            content: content.into(),
            linkable,
            image: None,
            code: None,
        }
    }

    pub fn intro(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Intro,
            title: title.into(),
            content: content.into(),
            linkable: false,
            image: None,
            code: None,
        }
    }

    pub fn chapter(
        title: impl Into<String>,
        content: impl Into<String>,
        cover: impl Into<String>,
    ) -> Self {
        Self {
            kind: RecordKind::Chapter,
            title: title.into(),
            content: content.into(),
            linkable: false,
            image: Some(ImageMeta {
                file: cover.into(),
                caption: String::new(),
            }),
            code: None,
        }
    }

    pub fn image(file: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Image,
            title: String::new(),
            content: String::new(),
            linkable: false,
            image: Some(ImageMeta {
                file: file.into(),
                caption: caption.into(),
            }),
            code: None,
        }
    }

    pub fn code(
        filename: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
        font_size: f32,
    ) -> Self {
        Self {
            kind: RecordKind::Code,
            title: String::new(),
            content: content.into(),
            linkable: false,
            image: None,
            code: Some(CodeMeta {
                filename: filename.into(),
                font_size,
                language: language.into(),
            }),
        }
    }
}

/// A whole document: the name used to resolve the cover asset, the release
/// date shown on the intro page, and the ordered records.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideDocument {
    pub name: String,
    pub release_date: String,
    pub records: Vec<ContentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English,
    French,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Locale::English),
            "fr" => Some(Locale::French),
            _ => None,
        }
    }

    fn subtitle(&self) -> &'static str {
        match self {
            Locale::English => "Complete Guide",
            Locale::French => "Guide Complet",
        }
    }

    fn step_label(&self) -> &'static str {
        match self {
            Locale::English => "Step",
            Locale::French => "Etape",
        }
    }
}

static MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Formats a `DD/MM/YYYY` release date for the intro page.
pub fn format_date(date: &str, locale: Locale) -> Result<String, GdpError> {
    let invalid = || GdpError::DateError {
        value: date.to_string(),
        suggestion: "use a DD/MM/YYYY release date".to_string(),
    };

    let mut parts = date.split('/');
    let (day_str, month_str, year) = match (parts.next(), parts.next(), parts.next()) {
        (Some(d), Some(m), Some(y)) => (d, m, y),
        _ => return Err(invalid()),
    };
    let day: u32 = day_str.trim().parse().map_err(|_| invalid())?;
    let month: usize = month_str.trim().parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }

    Ok(match locale {
        Locale::English => format!("Update on {} {}, {}", MONTHS_EN[month - 1], day, year),
        Locale::French => format!("Mise à jour du {} {} {}", day, MONTHS_FR[month - 1], year),
    })
}

/// Cross-record rendering state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// No divider before the first linkable title of a chapter.
    pub first_title: bool,
    /// Set by code records; suppresses the divider before the next linkable
    /// title and freezes the cached line height.
    pub last_was_code: bool,
    /// Next chapter step number.
    pub step_counter: u32,
    /// Line height cached from the last non-code text measurement; used for
    /// spacing predictions.
    pub line_height: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            first_title: true,
            last_was_code: false,
            step_counter: 1,
            line_height: 0.0,
        }
    }
}

/// Walks a document's records over a canvas.
pub struct DocumentAssembler<'a> {
    canvas: &'a mut dyn Canvas,
    style: &'a StyleSheet,
    locale: Locale,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(canvas: &'a mut dyn Canvas, style: &'a StyleSheet, locale: Locale) -> Self {
        Self {
            canvas,
            style,
            locale,
        }
    }

    /// Renders every record in order, then finishes the canvas. Rendering is
    /// single-pass; there is no partial-document recovery after a failure.
    pub fn generate(&mut self, doc: &GuideDocument) -> Result<(), GdpError> {
        let mut state = RenderState::default();
        for record in &doc.records {
            match record.kind {
                RecordKind::Intro => self.render_intro(doc, record, &mut state)?,
                RecordKind::Chapter => self.render_chapter(record, &mut state),
                RecordKind::Text => self.render_item(record, &mut state),
                RecordKind::Image => self.render_image(record, &mut state),
                RecordKind::Code => self.render_code(record, &mut state),
            }
        }
        self.canvas.finish().map_err(|err| GdpError::CanvasError {
            message: err.to_string(),
            suggestion: "check that the output sink is writable".to_string(),
        })
    }

    /// Draws an image if the canvas can resolve it; a missing asset is a
    /// warning, never an error.
    fn draw_asset(&mut self, file: &str, x: f32, y: f32, width: f32, height: f32) {
        if let Err(err) = self.canvas.draw_image(file, x, y, width, height) {
            warn!("skipping image: {}", err);
        }
    }

    fn render_intro(
        &mut self,
        doc: &GuideDocument,
        record: &ContentRecord,
        state: &mut RenderState,
    ) -> Result<(), GdpError> {
        let style = self.style;
        let page_w = self.canvas.page_width();
        let page_h = self.canvas.page_height();

        match self.canvas.image_size(&style.assets.banner) {
            Ok((w, h)) => {
                let (bw, bh) = (w * 0.75, h * 0.75);
                let banner = style.assets.banner.clone();
                self.draw_asset(&banner, (page_w - bw) / 2.0, 18.0, bw, bh);
            }
            Err(err) => warn!("skipping image: {}", err),
        }

        let background = style.assets.background.clone();
        self.draw_asset(&background, 0.0, 60.0, page_w, page_h);

        let cover = format!("{}{}", doc.name, style.assets.cover_suffix);
        match self.canvas.image_size(&cover) {
            Ok((w, h)) => {
                let (cw, ch) = (w * 0.58, h * 0.58);
                self.draw_asset(&cover, 350.0, 384.0, cw, ch);
                self.canvas
                    .stroke_rect(350.0, 384.0, cw, ch, Color::WHITE, 2.0);
            }
            Err(err) => warn!("skipping image: {}", err),
        }

        self.canvas.set_y(self.canvas.y() + 65.0);
        let title_opts =
            TextOptions::new(FontStyle::Bold, style.banner_title_size, style.intro.title_color)
                .with_width(style.banner_width)
                .with_align(crate::canvas::Align::Center);
        let origin = Position {
            x: style.margins.left,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&record.title, Some(origin), &title_opts);

        self.canvas.set_y(self.canvas.y() + 40.0);
        let subtitle_opts =
            TextOptions::new(FontStyle::Bold, style.subtitle_size, style.subtitle_color)
                .with_width(style.banner_width)
                .with_align(crate::canvas::Align::Center);
        let origin = Position {
            x: style.margins.left,
            y: self.canvas.y(),
        };
        self.canvas
            .draw_text(self.locale.subtitle(), Some(origin), &subtitle_opts);

        let divider_y = self.canvas.y() + 45.0;
        layout::draw_divider(self.canvas, Color::WHITE, divider_y, 1.0, style);

        self.canvas.set_y(self.canvas.y() + 60.0);
        let date_line = format_date(&doc.release_date, self.locale)?;
        let date_opts = TextOptions::new(FontStyle::Bold, style.date_size, Color::WHITE)
            .with_width(style.banner_width)
            .with_align(crate::canvas::Align::Right);
        let origin = Position {
            x: style.margins.left,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&date_line, Some(origin), &date_opts);

        let content = ensure_paragraph(&sanitize(&record.content));
        self.canvas.set_y(self.canvas.y() + 30.0);
        state.last_was_code = false;
        layout::render_text(self.canvas, &content, &FlowStyle::body(&style.intro), style);

        if let Some(footer) = &style.footer_text {
            let footer_opts =
                TextOptions::new(FontStyle::Bold, style.caption_size, Color::WHITE)
                    .with_width(200.0)
                    .with_align(crate::canvas::Align::Right);
            let origin = Position { x: 350.0, y: 760.0 };
            self.canvas.draw_text(footer, Some(origin), &footer_opts);
        }

        self.canvas.new_page();
        Ok(())
    }

    fn render_chapter(&mut self, record: &ContentRecord, state: &mut RenderState) {
        let style = self.style;
        state.first_title = true;

        self.canvas.new_page();

        let page_w = self.canvas.page_width();
        let page_h = self.canvas.page_height();
        let background = style.assets.background.clone();
        self.draw_asset(&background, 0.0, 0.0, page_w, page_h);

        if let Some(cover) = &record.image {
            match self.canvas.image_size(&cover.file) {
                Ok((w, h)) => {
                    let file = cover.file.clone();
                    self.draw_asset(&file, 350.0, 280.0, w * 0.6, h * 0.6);
                }
                Err(err) => warn!("skipping image: {}", err),
            }
        }

        self.canvas.set_y(self.canvas.y() + 10.0);
        let step_line = format!("{} {}", self.locale.step_label(), state.step_counter);
        let step_opts = TextOptions::new(
            FontStyle::Bold,
            style.chapter.title_size,
            style.chapter.title_color,
        )
        .with_width(style.banner_width)
        .with_align(crate::canvas::Align::Center);
        let origin = Position {
            x: style.margins.left,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&step_line, Some(origin), &step_opts);
        state.step_counter += 1;

        self.canvas.set_y(self.canvas.y() + 20.0);
        let title_opts = TextOptions::new(
            FontStyle::Bold,
            style.banner_title_size,
            style.chapter.title_color,
        )
        .with_width(style.banner_width)
        .with_align(crate::canvas::Align::Center);
        let origin = Position {
            x: style.margins.left,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&record.title, Some(origin), &title_opts);

        let content = ensure_paragraph(&sanitize(&record.content));
        self.canvas.set_y(self.canvas.y() + 80.0);
        state.last_was_code = false;
        layout::render_text(self.canvas, &content, &FlowStyle::body(&style.chapter), style);

        self.canvas.new_page();
    }

    fn render_item(&mut self, record: &ContentRecord, state: &mut RenderState) {
        let style = self.style;
        let mut text_height = 0.0;

        if record.linkable {
            text_height = self.canvas.measure_text(
                &record.title,
                style.item.title_font,
                style.item.title_size,
                style.item.title_width,
                style.line_gap,
            );
        }

        let content = sanitize(&ensure_paragraph(&record.content));
        text_height += self.canvas.measure_text(
            &content,
            style.item.text_font,
            style.item.text_size,
            style.item.text_width,
            style.line_gap,
        );

        if !state.last_was_code {
            state.line_height = self.canvas.current_line_height();
        }
        if record.linkable {
            text_height += style.spacing.br_second * state.line_height;
        }

        layout::ensure_fits(self.canvas, text_height);

        if record.linkable {
            if !state.first_title {
                self.canvas.move_down(style.spacing.br_second);
                if !state.last_was_code {
                    let y = self.canvas.y();
                    layout::draw_divider(self.canvas, style.divider_color, y, 1.0, style);
                }
            }
            state.first_title = false;

            let margins = self.canvas.margins();
            let content_width = self.canvas.page_width() - margins.left - margins.right;
            let x_centered = (margins.left + (content_width - style.item.title_width)) / 2.0;
            let title_opts = TextOptions::new(
                style.item.title_font,
                style.item.title_size,
                style.item.title_color,
            )
            .with_width(style.item.title_width)
            .with_align(crate::canvas::Align::Center)
            .with_line_gap(style.line_gap);
            let origin = Position {
                x: x_centered,
                y: self.canvas.y(),
            };
            self.canvas.draw_text(&record.title, Some(origin), &title_opts);
            self.canvas.move_down(style.spacing.br_second);
        } else {
            self.canvas.move_down(style.spacing.br_second);
        }

        state.last_was_code = false;
        layout::render_text(self.canvas, &content, &FlowStyle::body(&style.item), style);
    }

    fn render_image(&mut self, record: &ContentRecord, state: &mut RenderState) {
        let style = self.style;
        let meta = match &record.image {
            Some(meta) => meta,
            None => {
                warn!("image record without image metadata, skipping");
                return;
            }
        };

        let (iw, ih) = match self.canvas.image_size(&meta.file) {
            Ok(size) => size,
            Err(err) => {
                warn!("skipping image record: {}", err);
                return;
            }
        };

        let caption = if meta.caption.is_empty() {
            " ".to_string()
        } else {
            meta.caption.clone()
        };

        let margins = self.canvas.margins();
        let content_width = self.canvas.page_width() - margins.left - margins.right;
        let content_height = self.canvas.page_height() - margins.top - margins.bottom;
        let x_centered = margins.left + (content_width - style.banner_width) / 2.0;

        let mut text_height = self.canvas.measure_text(
            &caption,
            FontStyle::Bold,
            style.caption_size,
            style.banner_width,
            style.line_gap,
        );
        text_height += self.canvas.current_line_height() * 0.7;
        self.canvas.move_down(style.spacing.br_second);

        let (mut w, mut h) = (iw * 0.75, ih * 0.75);
        let scale = (content_width / w).min(content_height / h).min(1.0);
        w *= scale;
        h *= scale;

        layout::ensure_fits(self.canvas, text_height + h);

        let caption_opts = TextOptions::new(FontStyle::Bold, style.caption_size, Color::BLACK)
            .with_width(style.banner_width)
            .with_align(crate::canvas::Align::Center)
            .with_line_gap(style.line_gap);
        let origin = Position {
            x: x_centered,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&caption, Some(origin), &caption_opts);

        let img_x = margins.left + (content_width - w) / 2.0;
        let img_y = self.canvas.y();
        let file = meta.file.clone();
        self.draw_asset(&file, img_x, img_y, w, h);
        self.canvas.set_y(img_y + h + 10.0);

        state.last_was_code = false;
    }

    fn render_code(&mut self, record: &ContentRecord, state: &mut RenderState) {
        let style = self.style;
        let meta = match &record.code {
            Some(meta) => meta,
            None => {
                warn!("code record without code metadata, skipping");
                return;
            }
        };

        let font_size = if meta.font_size <= 0.0 {
            style.code.default_size
        } else {
            meta.font_size
        };
        let filename = if meta.filename.is_empty() {
            " ".to_string()
        } else {
            meta.filename.clone()
        };

        let margins = self.canvas.margins();
        let content_width = self.canvas.page_width() - margins.left - margins.right;
        let x_centered = margins.left + (content_width - style.banner_width) / 2.0;

        let mut text_height = self.canvas.measure_text(
            &filename,
            FontStyle::Bold,
            style.code_header_size,
            style.banner_width,
            style.line_gap,
        );
        text_height += 10.0;

        let content = sanitize(&record.content);
        text_height += self.canvas.measure_text(
            &content,
            FontStyle::Regular,
            font_size,
            style.code.block_width,
            style.line_gap,
        );

        layout::ensure_fits(self.canvas, text_height);

        let header_opts =
            TextOptions::new(FontStyle::Bold, style.code_header_size, style.link_color)
                .with_width(style.banner_width)
                .with_align(crate::canvas::Align::Center)
                .with_line_gap(style.line_gap);
        let origin = Position {
            x: x_centered,
            y: self.canvas.y(),
        };
        self.canvas.draw_text(&filename, Some(origin), &header_opts);

        self.canvas.set_y(self.canvas.y() + 10.0);
        state.last_was_code = true;
        self.write_code(&meta.language, &content, font_size);
        self.canvas.move_down(style.spacing.br_second);
    }

    /// Draws one highlighted code block with its grey bounding frame.
    fn write_code(&mut self, language: &str, content: &str, size: f32) {
        let style = self.style;
        let block_x = style.code.block_left;
        let block_w = style.code.block_width;
        let y_begin = self.canvas.y();

        let line_opts = |color: Color| {
            TextOptions::new(FontStyle::Regular, size, color)
                .with_width(block_w)
                .with_align(crate::canvas::Align::Left)
                .with_line_gap(style.line_gap)
        };

        match SourceLanguage::from_tag(language) {
            Some(SourceLanguage::Git) => {
                for line in content.split('\n') {
                    if line.trim().is_empty() {
                        self.canvas.move_down(1.0);
                    } else {
                        let origin = Position {
                            x: block_x,
                            y: self.canvas.y(),
                        };
                        self.canvas
                            .draw_text(line, Some(origin), &line_opts(diff_line_color(line)));
                    }
                }
                self.frame_block(y_begin);
            }
            Some(SourceLanguage::Json) => {
                let formatted = pretty_structured(content);
                for line in formatted.split('\n') {
                    if line.trim().is_empty() {
                        self.canvas.move_down(1.0);
                        continue;
                    }
                    match classify_structured_line(line) {
                        StructuredLine::KeyValue { indent, key, value } => {
                            let key_opts = TextOptions::new(FontStyle::Regular, size, TAG_RED)
                                .continued(true);
                            let origin = Position {
                                x: block_x,
                                y: self.canvas.y(),
                            };
                            self.canvas
                                .draw_text(&format!("{}{}", indent, key), Some(origin), &key_opts);
                            let value_opts =
                                TextOptions::new(FontStyle::Regular, size, CODE_GREEN)
                                    .with_width(block_w)
                                    .with_align(crate::canvas::Align::Left);
                            self.canvas
                                .draw_text(&format!(" {}", value), None, &value_opts);
                        }
                        StructuredLine::Delimiter(text) => {
                            let origin = Position {
                                x: block_x,
                                y: self.canvas.y(),
                            };
                            self.canvas
                                .draw_text(&text, Some(origin), &line_opts(Color::GREY));
                        }
                        StructuredLine::Text(text) => {
                            let origin = Position {
                                x: block_x,
                                y: self.canvas.y(),
                            };
                            self.canvas
                                .draw_text(&text, Some(origin), &line_opts(CODE_GREEN));
                        }
                    }
                }
                self.frame_block(y_begin);
            }
            Some(SourceLanguage::Css) => {
                for line in content.split('\n') {
                    if line.trim().is_empty() {
                        self.canvas.move_down(1.0);
                        continue;
                    }
                    let tokens = tokenize_stylesheet_line(line);
                    let count = tokens.len();
                    for (idx, token) in tokens.iter().enumerate() {
                        let opts = TextOptions::new(FontStyle::Regular, size, token.color)
                            .with_width(block_w)
                            .with_align(crate::canvas::Align::Left)
                            .continued(idx + 1 < count);
                        let origin = if idx == 0 {
                            Some(Position {
                                x: block_x,
                                y: self.canvas.y(),
                            })
                        } else {
                            None
                        };
                        self.canvas.draw_text(&token.text, origin, &opts);
                    }
                }
                self.frame_block(y_begin);
            }
            Some(lang) => {
                // Table languages flow in the wide item column.
                for line in content.split('\n') {
                    if line.trim().is_empty() {
                        self.canvas.move_down(1.0);
                    } else if lang == SourceLanguage::Javascript && line.starts_with('#') {
                        let opts = TextOptions::new(FontStyle::Regular, size, Color::BLACK);
                        self.canvas.draw_text(line, None, &opts);
                    } else {
                        self.write_highlighted_line(lang, line, size);
                    }
                }
                self.canvas.move_down(1.0);
                let frame_height = self.canvas.y() - y_begin + 4.0;
                self.canvas.stroke_rect(
                    style.code.line_left - 4.0,
                    y_begin - 4.0,
                    style.code.line_width,
                    frame_height,
                    Color::GREY,
                    1.0,
                );
            }
            None => {
                let origin = Position {
                    x: block_x,
                    y: self.canvas.y(),
                };
                self.canvas
                    .draw_text(content, Some(origin), &line_opts(Color::GREY));
                self.frame_block(y_begin);
            }
        }
    }

    fn write_highlighted_line(&mut self, lang: SourceLanguage, line: &str, size: f32) {
        let style = self.style;
        let hold_line = spec_for(lang).map(|s| s.hold_line).unwrap_or(false);
        let tokens = tokenize_line(lang, line, Color::BLACK);
        let count = tokens.len();

        for (idx, token) in tokens.iter().enumerate() {
            let last = idx + 1 == count;
            if token.category == crate::highlighting::CodeCategory::PlainText {
                let opts = TextOptions::new(FontStyle::Regular, size, token.color)
                    .with_width(style.code.line_width)
                    .with_align(crate::canvas::Align::Left)
                    .with_line_gap(style.line_gap)
                    .continued(!last);
                if last {
                    self.canvas.draw_text(&token.text, None, &opts);
                } else {
                    let origin = Position {
                        x: style.code.line_left,
                        y: self.canvas.y(),
                    };
                    self.canvas.draw_text(&token.text, Some(origin), &opts);
                }
            } else {
                let opts = TextOptions::new(FontStyle::Regular, size, token.color)
                    .continued(hold_line || !last);
                self.canvas.draw_text(&token.text, None, &opts);
            }
        }
    }

    /// Grey frame around a line-rendered code block.
    fn frame_block(&mut self, y_begin: f32) {
        let style = self.style;
        let height = self.canvas.y() - y_begin + 5.0;
        self.canvas.stroke_rect(
            style.code.block_left - 5.0,
            y_begin - 2.0,
            style.code.block_width + 10.0,
            height,
            Color::GREY,
            1.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, LayoutCanvas, Margins};

    fn canvas() -> LayoutCanvas {
        LayoutCanvas::a4(Margins::trbl(40.0, 30.0, 40.0, 30.0))
    }

    fn generate(records: Vec<ContentRecord>) -> LayoutCanvas {
        let mut c = canvas();
        c.register_asset("introduction-banner.png", 400.0, 80.0);
        c.register_asset("introduction-background.png", 595.0, 842.0);
        c.register_asset("demo-intro.png", 200.0, 120.0);
        let style = StyleSheet::default();
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "05/03/2024".to_string(),
            records,
        };
        DocumentAssembler::new(&mut c, &style, Locale::English)
            .generate(&doc)
            .unwrap();
        c
    }

    fn texts(c: &LayoutCanvas) -> Vec<String> {
        c.ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_format_date_english() {
        assert_eq!(
            format_date("05/03/2024", Locale::English).unwrap(),
            "Update on March 5, 2024"
        );
    }

    #[test]
    fn test_format_date_french() {
        assert_eq!(
            format_date("05/03/2024", Locale::French).unwrap(),
            "Mise à jour du 5 mars 2024"
        );
    }

    #[test]
    fn test_format_date_rejects_malformed_input() {
        assert!(format_date("2024-03-05", Locale::English).is_err());
        assert!(format_date("05/13/2024", Locale::English).is_err());
        assert!(format_date("", Locale::French).is_err());
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("en"), Some(Locale::English));
        assert_eq!(Locale::from_tag("fr"), Some(Locale::French));
        assert_eq!(Locale::from_tag("de"), None);
    }

    #[test]
    fn test_intro_breaks_page_after() {
        let c = generate(vec![ContentRecord::intro("My Guide", "welcome")]);
        assert_eq!(c.page_count(), 2);
        assert!(matches!(c.ops().last(), Some(DrawOp::NewPage)));
        assert!(texts(&c).iter().any(|t| t == "My Guide"));
        assert!(texts(&c).iter().any(|t| t == "Complete Guide"));
        assert!(texts(&c).iter().any(|t| t == "Update on March 5, 2024"));
    }

    #[test]
    fn test_chapter_breaks_page_before_and_after() {
        let c = generate(vec![ContentRecord::chapter(
            "Setup",
            "get ready",
            "setup.png",
        )]);
        // One break before, one after.
        assert_eq!(c.page_count(), 3);
        assert!(texts(&c).iter().any(|t| t == "Step 1"));
    }

    #[test]
    fn test_step_counter_advances_per_chapter() {
        let c = generate(vec![
            ContentRecord::chapter("One", "a", "one.png"),
            ContentRecord::chapter("Two", "b", "two.png"),
        ]);
        let all = texts(&c);
        assert!(all.iter().any(|t| t == "Step 1"));
        assert!(all.iter().any(|t| t == "Step 2"));
    }

    #[test]
    fn test_first_linkable_title_has_no_divider() {
        let c = generate(vec![ContentRecord::text("Title", "body", true)]);
        assert!(!c.ops().iter().any(|op| matches!(op, DrawOp::Line { .. })));
    }

    #[test]
    fn test_second_linkable_title_gets_divider() {
        let c = generate(vec![
            ContentRecord::text("First", "body", true),
            ContentRecord::text("Second", "body", true),
        ]);
        let lines = c
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count();
        assert_eq!(lines, 1);
    }

    #[test]
    fn test_divider_suppressed_after_code_record() {
        let c = generate(vec![
            ContentRecord::text("First", "body", true),
            ContentRecord::code("main.js", "javascript", "const a = 1;", 10.0),
            ContentRecord::text("Second", "body", true),
        ]);
        assert!(!c.ops().iter().any(|op| matches!(op, DrawOp::Line { .. })));
    }

    #[test]
    fn test_code_record_framed_and_header_in_link_color() {
        let c = generate(vec![ContentRecord::code(
            "main.ts",
            "typescript",
            "const a = 1;",
            10.0,
        )]);
        assert!(c.ops().iter().any(|op| matches!(op, DrawOp::Rect { .. })));
        let header = c
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text == "main.ts" => Some(*color),
                _ => None,
            })
            .unwrap();
        assert_eq!(header, StyleSheet::default().link_color);
    }

    #[test]
    fn test_code_font_size_fallback() {
        let c = generate(vec![ContentRecord::code(
            "x.ts",
            "typescript",
            "const a = 1;",
            0.0,
        )]);
        let sizes: Vec<f32> = c
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, size, .. } if text == "const" => Some(*size),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![10.0]);
    }

    #[test]
    fn test_empty_code_filename_renders_as_space() {
        let c = generate(vec![ContentRecord::code("", "git", "git status", 10.0)]);
        assert!(texts(&c).iter().any(|t| t == " "));
    }

    #[test]
    fn test_unknown_language_renders_grey_framed_block() {
        let c = generate(vec![ContentRecord::code(
            "notes.txt",
            "cobol",
            "DISPLAY 'HELLO'.",
            10.0,
        )]);
        let block = c
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text.contains("DISPLAY") => Some(*color),
                _ => None,
            })
            .unwrap();
        assert_eq!(block, Color::GREY);
        assert!(c.ops().iter().any(|op| matches!(op, DrawOp::Rect { .. })));
    }

    #[test]
    fn test_structured_code_key_and_value_colors() {
        let c = generate(vec![ContentRecord::code(
            "package.json",
            "json",
            r#"{"name":"demo"}"#,
            10.0,
        )]);
        let key = c
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text.contains("\"name\":") => Some(*color),
                _ => None,
            })
            .unwrap();
        assert_eq!(key, TAG_RED);
        let value = c
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text.contains("\"demo\"") => Some(*color),
                _ => None,
            })
            .unwrap();
        assert_eq!(value, CODE_GREEN);
    }

    #[test]
    fn test_missing_image_asset_skips_record() {
        let c = generate(vec![
            ContentRecord::image("missing.png", "A caption"),
            ContentRecord::text("After", "still here", false),
        ]);
        assert!(!c.ops().iter().any(|op| matches!(op, DrawOp::Image { .. })));
        assert!(texts(&c).iter().any(|t| t.contains("still here")));
    }

    #[test]
    fn test_image_record_draws_caption_and_image() {
        let mut c = canvas();
        c.register_asset("shot.png", 400.0, 200.0);
        let style = StyleSheet::default();
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "01/01/2024".to_string(),
            records: vec![ContentRecord::image("shot.png", "A screenshot")],
        };
        DocumentAssembler::new(&mut c, &style, Locale::English)
            .generate(&doc)
            .unwrap();
        assert!(texts(&c).iter().any(|t| t == "A screenshot"));
        let image = c.ops().iter().find_map(|op| match op {
            DrawOp::Image { width, height, .. } => Some((*width, *height)),
            _ => None,
        });
        assert_eq!(image, Some((300.0, 150.0)));
    }

    #[test]
    fn test_french_chapter_step_label() {
        let mut c = canvas();
        let style = StyleSheet::default();
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "01/01/2024".to_string(),
            records: vec![ContentRecord::chapter("Un", "contenu", "un.png")],
        };
        DocumentAssembler::new(&mut c, &style, Locale::French)
            .generate(&doc)
            .unwrap();
        assert!(texts(&c).iter().any(|t| t == "Etape 1"));
    }

    #[test]
    fn test_generate_finishes_canvas() {
        let c = generate(vec![ContentRecord::text("T", "b", false)]);
        assert!(c.is_finished());
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let mut c = canvas();
        c.fail_on_finish("broken pipe");
        let style = StyleSheet::default();
        let doc = GuideDocument {
            name: "demo".to_string(),
            release_date: "01/01/2024".to_string(),
            records: vec![],
        };
        let result = DocumentAssembler::new(&mut c, &style, Locale::English).generate(&doc);
        assert!(result.is_err());
    }
}
