//! Style sheet for the generated document.
//!
//! All layout constants live here: page margins, per-section fonts and
//! widths, code block geometry, bullet and indent values, and the decorative
//! asset names. [`StyleSheet::default`] is the house style; `config` can
//! override individual values from a TOML file.

use crate::canvas::{Align, Color, FontStyle, Margins};

pub const LINK_BLUE: Color = Color::rgb(0x21, 0x96, 0xf3);
pub const SUBTITLE_GREY: Color = Color::rgb(0xD9, 0xD9, 0xD9);

/// Title and body styling for one record family (intro, chapter, item).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStyle {
    pub title_font: FontStyle,
    pub title_size: f32,
    pub title_width: f32,
    pub title_color: Color,
    pub title_align: Align,
    pub text_font: FontStyle,
    pub text_size: f32,
    pub text_width: f32,
    pub text_left: f32,
    pub text_color: Color,
    pub text_align: Align,
}

/// Code block geometry. Table-highlighted lines flow in the wide item
/// column; line-classified blocks (diff, structured data, stylesheet) and
/// the bounding frame use the narrower block column.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeStyle {
    pub line_width: f32,
    pub line_left: f32,
    pub block_width: f32,
    pub block_left: f32,
    pub default_size: f32,
}

/// Cursor advance factors for line breaks, in multiples of the current line
/// height. A single `<br>` uses `br_first`; the second break of a `<br><br>`
/// and inter-block spacing use `br_second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub br_first: f32,
    pub br_second: f32,
}

/// Decorative image assets referenced by intro and chapter pages. Names are
/// resolved by the canvas; a missing asset skips that draw with a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetStyle {
    pub banner: String,
    pub background: String,
    /// Suffix appended to the document name for the cover image.
    pub cover_suffix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub margins: Margins,
    pub line_gap: f32,
    pub bullet: String,
    pub list_indent: f32,
    pub link_color: Color,
    pub divider_color: Color,
    pub intro: SectionStyle,
    pub chapter: SectionStyle,
    pub item: SectionStyle,
    pub code: CodeStyle,
    pub spacing: Spacing,
    /// Width of the centered column used by banner titles, captions and code
    /// headers.
    pub banner_width: f32,
    pub banner_title_size: f32,
    pub subtitle_size: f32,
    pub subtitle_color: Color,
    pub date_size: f32,
    pub caption_size: f32,
    pub code_header_size: f32,
    /// Optional footer line on the intro page (site address or similar).
    pub footer_text: Option<String>,
    pub assets: AssetStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            margins: Margins::trbl(40.0, 30.0, 40.0, 30.0),
            line_gap: 3.0,
            bullet: "• ".to_string(),
            list_indent: 12.0,
            link_color: LINK_BLUE,
            divider_color: Color::GREY,
            intro: SectionStyle {
                title_font: FontStyle::Bold,
                title_size: 24.0,
                title_width: 535.0,
                title_color: Color::WHITE,
                title_align: Align::Left,
                text_font: FontStyle::Regular,
                text_size: 15.0,
                text_width: 280.0,
                text_left: 50.0,
                text_color: Color::WHITE,
                text_align: Align::Left,
            },
            chapter: SectionStyle {
                title_font: FontStyle::Bold,
                title_size: 24.0,
                title_width: 535.0,
                title_color: Color::WHITE,
                title_align: Align::Left,
                text_font: FontStyle::Regular,
                text_size: 16.0,
                text_width: 280.0,
                text_left: 50.0,
                text_color: Color::WHITE,
                text_align: Align::Left,
            },
            item: SectionStyle {
                title_font: FontStyle::Bold,
                title_size: 24.0,
                title_width: 480.0,
                title_color: LINK_BLUE,
                title_align: Align::Left,
                text_font: FontStyle::Regular,
                text_size: 14.0,
                text_width: 495.0,
                text_left: 50.0,
                text_color: Color::BLACK,
                text_align: Align::Left,
            },
            code: CodeStyle {
                line_width: 495.0,
                line_left: 50.0,
                block_width: 470.0,
                block_left: 70.0,
                default_size: 10.0,
            },
            spacing: Spacing {
                br_first: 0.2,
                br_second: 0.7,
            },
            banner_width: 500.0,
            banner_title_size: 34.0,
            subtitle_size: 26.0,
            subtitle_color: SUBTITLE_GREY,
            date_size: 12.0,
            caption_size: 14.0,
            code_header_size: 12.0,
            footer_text: None,
            assets: AssetStyle {
                banner: "introduction-banner.png".to_string(),
                background: "introduction-background.png".to_string(),
                cover_suffix: "-intro.png".to_string(),
            },
        }
    }
}
