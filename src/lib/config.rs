//! Style sheet configuration from TOML.
//!
//! Loads optional overrides for the default [`StyleSheet`]: margins, section
//! fonts and colors, code geometry, list bullet, spacing factors, asset
//! names. Missing keys keep their defaults; an unreadable file falls back to
//! the default sheet entirely.
//!
//! Colors are tables of `r`/`g`/`b` components:
//!
//! ```toml
//! [item]
//! title_color = { r = 33, g = 150, b = 243 }
//! text_size = 13
//! ```

use crate::canvas::{Align, Color};
use crate::styling::{SectionStyle, StyleSheet};
use log::warn;
use std::fs;
use std::path::Path;
use toml::Value;

/// Where the style configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Built-in default style sheet.
    Default,
    /// TOML file path.
    File(&'a str),
    /// TOML content embedded at compile time.
    Embedded(&'a str),
}

fn parse_color(value: Option<&Value>, field: &str) -> Option<Color> {
    value.and_then(|c| {
        let color = c.get(field)?;
        let r = color.get("r")?.as_integer()? as u8;
        let g = color.get("g")?.as_integer()? as u8;
        let b = color.get("b")?.as_integer()? as u8;
        Some(Color::rgb(r, g, b))
    })
}

fn parse_number(value: Option<&Value>, field: &str) -> Option<f32> {
    value.and_then(|t| {
        let v = t.get(field)?;
        if let Some(f) = v.as_float() {
            Some(f as f32)
        } else {
            v.as_integer().map(|i| i as f32)
        }
    })
}

fn parse_alignment(value: Option<&Value>, field: &str) -> Option<Align> {
    value
        .and_then(|t| t.get(field))
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "center" => Align::Center,
            "right" => Align::Right,
            _ => Align::Left,
        })
}

fn parse_string(value: Option<&Value>, field: &str) -> Option<String> {
    value
        .and_then(|t| t.get(field))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Applies one `[intro]`/`[chapter]`/`[item]` table onto a section default.
fn parse_section(value: Option<&Value>, default: SectionStyle) -> SectionStyle {
    let mut section = default;
    if let Some(size) = parse_number(value, "title_size") {
        section.title_size = size;
    }
    if let Some(width) = parse_number(value, "title_width") {
        section.title_width = width;
    }
    if let Some(color) = parse_color(value, "title_color") {
        section.title_color = color;
    }
    if let Some(align) = parse_alignment(value, "title_align") {
        section.title_align = align;
    }
    if let Some(size) = parse_number(value, "text_size") {
        section.text_size = size;
    }
    if let Some(width) = parse_number(value, "text_width") {
        section.text_width = width;
    }
    if let Some(left) = parse_number(value, "text_left") {
        section.text_left = left;
    }
    if let Some(color) = parse_color(value, "text_color") {
        section.text_color = color;
    }
    if let Some(align) = parse_alignment(value, "text_align") {
        section.text_align = align;
    }
    section
}

/// Parses a TOML string into a style sheet, starting from the defaults.
/// Unparseable content yields the default sheet with a warning.
pub fn parse_style_string(content: &str) -> StyleSheet {
    let mut style = StyleSheet::default();

    let parsed: Value = match content.parse() {
        Ok(v) => v,
        Err(err) => {
            warn!("style configuration is not valid TOML, using defaults: {}", err);
            return style;
        }
    };

    let margins = parsed.get("margins");
    if let Some(top) = parse_number(margins, "top") {
        style.margins.top = top;
    }
    if let Some(right) = parse_number(margins, "right") {
        style.margins.right = right;
    }
    if let Some(bottom) = parse_number(margins, "bottom") {
        style.margins.bottom = bottom;
    }
    if let Some(left) = parse_number(margins, "left") {
        style.margins.left = left;
    }

    style.intro = parse_section(parsed.get("intro"), style.intro);
    style.chapter = parse_section(parsed.get("chapter"), style.chapter);
    style.item = parse_section(parsed.get("item"), style.item);

    let code = parsed.get("code");
    if let Some(width) = parse_number(code, "line_width") {
        style.code.line_width = width;
    }
    if let Some(left) = parse_number(code, "line_left") {
        style.code.line_left = left;
    }
    if let Some(width) = parse_number(code, "block_width") {
        style.code.block_width = width;
    }
    if let Some(left) = parse_number(code, "block_left") {
        style.code.block_left = left;
    }
    if let Some(size) = parse_number(code, "default_size") {
        style.code.default_size = size;
    }

    let spacing = parsed.get("spacing");
    if let Some(first) = parse_number(spacing, "br_first") {
        style.spacing.br_first = first;
    }
    if let Some(second) = parse_number(spacing, "br_second") {
        style.spacing.br_second = second;
    }

    let list = parsed.get("list");
    if let Some(bullet) = parse_string(list, "bullet") {
        style.bullet = bullet;
    }
    if let Some(indent) = parse_number(list, "indent") {
        style.list_indent = indent;
    }

    let link = parsed.get("link");
    if let Some(color) = parse_color(link, "color") {
        style.link_color = color;
    }

    let assets = parsed.get("assets");
    if let Some(banner) = parse_string(assets, "banner") {
        style.assets.banner = banner;
    }
    if let Some(background) = parse_string(assets, "background") {
        style.assets.background = background;
    }
    if let Some(suffix) = parse_string(assets, "cover_suffix") {
        style.assets.cover_suffix = suffix;
    }

    let footer = parsed.get("footer");
    if let Some(text) = parse_string(footer, "text") {
        style.footer_text = Some(text);
    }

    style
}

/// Loads a style sheet from the given source. A missing or unreadable file
/// falls back to the default sheet.
pub fn load_style_from_source(source: ConfigSource) -> StyleSheet {
    match source {
        ConfigSource::Default => StyleSheet::default(),
        ConfigSource::File(path) => {
            let config_path = Path::new(path).to_path_buf();
            let content = match fs::read_to_string(config_path) {
                Ok(s) => s,
                Err(err) => {
                    warn!("cannot read style file {}, using defaults: {}", path, err);
                    return StyleSheet::default();
                }
            };
            parse_style_string(&content)
        }
        ConfigSource::Embedded(content) => parse_style_string(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source() {
        let style = load_style_from_source(ConfigSource::Default);
        assert_eq!(style, StyleSheet::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let style = load_style_from_source(ConfigSource::File("nonexistent.toml"));
        assert_eq!(style, StyleSheet::default());
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let style = parse_style_string("not [valid toml");
        assert_eq!(style, StyleSheet::default());
    }

    #[test]
    fn test_embedded_overrides() {
        let style = load_style_from_source(ConfigSource::Embedded(
            r#"
            [margins]
            top = 50
            [item]
            title_color = { r = 200, g = 0, b = 0 }
            text_size = 13
            [list]
            bullet = "- "
            [footer]
            text = "www.example.com"
            "#,
        ));
        assert_eq!(style.margins.top, 50.0);
        assert_eq!(style.item.title_color, Color::rgb(200, 0, 0));
        assert_eq!(style.item.text_size, 13.0);
        assert_eq!(style.bullet, "- ");
        assert_eq!(style.footer_text.as_deref(), Some("www.example.com"));
        // Untouched values keep their defaults.
        assert_eq!(style.margins.left, 30.0);
        assert_eq!(style.chapter, StyleSheet::default().chapter);
    }

    #[test]
    fn test_partial_color_is_ignored() {
        let style = parse_style_string(
            r#"
            [link]
            color = { r = 10, g = 20 }
            "#,
        );
        assert_eq!(style.link_color, StyleSheet::default().link_color);
    }

    #[test]
    fn test_alignment_parsing() {
        let style = parse_style_string(
            r#"
            [item]
            text_align = "center"
            title_align = "bogus"
            "#,
        );
        assert_eq!(style.item.text_align, Align::Center);
        assert_eq!(style.item.title_align, Align::Left);
    }
}
