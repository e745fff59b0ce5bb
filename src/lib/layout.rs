//! Text-flow rendering and pagination.
//!
//! The flow renderer turns a record's block list into canvas draw calls, one
//! per inline token. The continuation contract: a token's draw is marked
//! `continued` exactly when more tokens share its logical line, i.e. it is
//! neither followed by a `<br>` nor the last token of the block. Bold and
//! italic runs always render in the absolute bold/italic faces; links render
//! in the link color, underlined, and always close their line.
//!
//! Paragraph mode repositions every draw at the left edge. List mode only
//! repositions when the previous draw closed its line, and tracks a
//! per-item write counter: the first textual fragment of a `<li>` gets the
//! bullet prefix at zero indent, every later fragment gets the fixed list
//! indent and no bullet.
//!
//! Pagination is two-phase: a block's height is predicted up front with
//! `measure_text`, page breaks are inserted while the prediction overflows,
//! then the block is drawn. The prediction is never used as the literal draw
//! height.

use crate::canvas::{Align, Canvas, Color, FontStyle, Position, TextOptions};
use crate::markup::{split_blocks, tokenize_inline, Block, MarkupToken};
use crate::styling::StyleSheet;

/// Flow parameters for one record family's body text.
#[derive(Debug, Clone, Copy)]
pub struct FlowStyle {
    pub font: FontStyle,
    pub color: Color,
    pub width: f32,
    pub size: f32,
    pub left: f32,
    pub align: Align,
}

impl FlowStyle {
    pub fn body(section: &crate::styling::SectionStyle) -> Self {
        Self {
            font: section.text_font,
            color: section.text_color,
            width: section.text_width,
            size: section.text_size,
            left: section.text_left,
            align: section.text_align,
        }
    }
}

fn base_opts(flow: &FlowStyle, sheet: &StyleSheet) -> TextOptions {
    TextOptions::new(flow.font, flow.size, flow.color)
        .with_width(flow.width)
        .with_align(flow.align)
        .with_line_gap(sheet.line_gap)
}

/// Renders a record's full content: paragraphs, bare breaks and lists in
/// document order. A bare top-level `<br>` moves nothing; list blocks are
/// followed by one large spacing step.
pub fn render_text(canvas: &mut dyn Canvas, content: &str, flow: &FlowStyle, sheet: &StyleSheet) {
    for block in split_blocks(content) {
        match block {
            Block::Paragraph(text) => render_paragraph(canvas, &text, flow, sheet),
            Block::Break => {}
            Block::List(items) => {
                for item in &items {
                    render_list_item(canvas, item, flow, sheet);
                }
                canvas.move_down(sheet.spacing.br_second);
            }
        }
    }
}

/// Paragraph mode: every textual draw is positioned at `flow.left`.
pub fn render_paragraph(
    canvas: &mut dyn Canvas,
    text: &str,
    flow: &FlowStyle,
    sheet: &StyleSheet,
) {
    for event in tokenize_inline(text) {
        let continued = !event.followed_by_break && !event.is_last;
        match &event.token {
            MarkupToken::PlainRun { text } => {
                let opts = base_opts(flow, sheet).continued(continued);
                let origin = Position {
                    x: flow.left,
                    y: canvas.y(),
                };
                canvas.draw_text(text, Some(origin), &opts);
            }
            MarkupToken::LineBreak { double } => {
                canvas.move_down(sheet.spacing.br_first);
                if *double {
                    canvas.move_down(sheet.spacing.br_second);
                }
            }
            MarkupToken::Bold { text } => {
                let opts = TextOptions::new(FontStyle::Bold, flow.size, flow.color)
                    .with_width(flow.width)
                    .with_align(flow.align)
                    .with_line_gap(sheet.line_gap)
                    .continued(continued);
                let origin = Position {
                    x: flow.left,
                    y: canvas.y(),
                };
                canvas.draw_text(text, Some(origin), &opts);
            }
            MarkupToken::Italic { text } => {
                let opts = TextOptions::new(FontStyle::Italic, flow.size, flow.color)
                    .with_width(flow.width)
                    .with_align(flow.align)
                    .with_line_gap(sheet.line_gap)
                    .continued(continued);
                let origin = Position {
                    x: flow.left,
                    y: canvas.y(),
                };
                canvas.draw_text(text, Some(origin), &opts);
            }
            MarkupToken::Link { url, text } => {
                let opts = TextOptions::new(flow.font, flow.size, sheet.link_color)
                    .with_link(url.clone())
                    .with_line_gap(sheet.line_gap);
                canvas.draw_text(text, None, &opts);
            }
        }
    }
}

/// List mode: one `<li>` body. The write counter restarts here, so the
/// bullet goes to the first textual fragment of each item.
pub fn render_list_item(
    canvas: &mut dyn Canvas,
    text: &str,
    flow: &FlowStyle,
    sheet: &StyleSheet,
) {
    let mut before_continued = false;
    let mut count_write = 0u32;

    // First write: bullet, no indent. Later writes: indent, no bullet.
    let prefix_for = |count: u32| -> (String, f32) {
        if count == 1 {
            (format!("{} ", sheet.bullet), 0.0)
        } else {
            (String::new(), sheet.list_indent)
        }
    };

    for event in tokenize_inline(text) {
        let continued = !event.followed_by_break && !event.is_last;
        match &event.token {
            MarkupToken::PlainRun { text } => {
                count_write += 1;
                let (bullet, indent) = prefix_for(count_write);
                let formatted = format!("{}{}", bullet, text);
                let opts = base_opts(flow, sheet).continued(continued);
                if before_continued {
                    canvas.draw_text(&formatted, None, &opts);
                } else {
                    let origin = Position {
                        x: flow.left + indent,
                        y: canvas.y(),
                    };
                    canvas.draw_text(&formatted, Some(origin), &opts);
                }
                before_continued = continued;
            }
            MarkupToken::LineBreak { double } => {
                before_continued = false;
                count_write += 1;
                canvas.move_down(sheet.spacing.br_first);
                if *double {
                    canvas.move_down(sheet.spacing.br_second);
                }
            }
            MarkupToken::Bold { text } | MarkupToken::Italic { text } => {
                count_write += 1;
                let (bullet, indent) = prefix_for(count_write);
                let formatted = format!("{}{}", bullet, text);
                let font = if matches!(event.token, MarkupToken::Bold { .. }) {
                    FontStyle::Bold
                } else {
                    FontStyle::Italic
                };
                let opts = TextOptions::new(font, flow.size, flow.color)
                    .with_width(flow.width)
                    .with_align(flow.align)
                    .with_line_gap(sheet.line_gap)
                    .continued(continued);
                if before_continued {
                    canvas.draw_text(&formatted, None, &opts);
                } else {
                    let origin = Position {
                        x: flow.left + indent,
                        y: canvas.y(),
                    };
                    canvas.draw_text(&formatted, Some(origin), &opts);
                }
                before_continued = continued;
            }
            MarkupToken::Link { url, text } => {
                count_write += 1;
                let (bullet, _) = prefix_for(count_write);
                let prefix_opts = TextOptions::new(flow.font, flow.size, flow.color)
                    .with_line_gap(sheet.line_gap)
                    .continued(true);
                canvas.draw_text(&bullet, None, &prefix_opts);
                let link_opts = TextOptions::new(flow.font, flow.size, sheet.link_color)
                    .with_link(url.clone())
                    .with_line_gap(sheet.line_gap);
                canvas.draw_text(text, None, &link_opts);
                before_continued = false;
            }
        }
    }
}

/// Inserts page breaks until the predicted height fits below the cursor,
/// subtracting one page of content height per break. Returns the leftover
/// prediction for the caller's own spacing math.
pub fn ensure_fits(canvas: &mut dyn Canvas, mut predicted: f32) -> f32 {
    let margins = canvas.margins();
    let content_height = canvas.page_height() - margins.top - margins.bottom;
    while canvas.y() + predicted > content_height {
        canvas.new_page();
        predicted -= content_height;
    }
    predicted
}

/// Draws a horizontal rule across the content width at `y`. Non-white rules
/// are followed by two large spacing steps.
pub fn draw_divider(canvas: &mut dyn Canvas, color: Color, y: f32, thickness: f32, sheet: &StyleSheet) {
    let margins = canvas.margins();
    let line_width = canvas.page_width() - margins.left - margins.right;
    let start_x = (canvas.page_width() - line_width) / 2.0;
    canvas.draw_line(
        Position { x: start_x, y },
        Position {
            x: start_x + line_width,
            y,
        },
        color,
        thickness,
    );
    if color != Color::WHITE {
        canvas.move_down(sheet.spacing.br_second);
        canvas.move_down(sheet.spacing.br_second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, LayoutCanvas, Margins};

    fn canvas() -> LayoutCanvas {
        LayoutCanvas::new(595.0, 842.0, Margins::trbl(40.0, 30.0, 40.0, 30.0))
    }

    fn flow() -> FlowStyle {
        FlowStyle {
            font: FontStyle::Regular,
            color: Color::BLACK,
            width: 495.0,
            size: 14.0,
            left: 50.0,
            align: Align::Left,
        }
    }

    fn text_draws(c: &LayoutCanvas) -> Vec<(String, bool, f32)> {
        c.ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text {
                    text, continued, y, ..
                } => Some((text.clone(), *continued, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bold_before_break_closes_its_line() {
        let mut c = canvas();
        render_paragraph(&mut c, "<strong>A</strong><br>B", &flow(), &StyleSheet::default());
        let draws = text_draws(&c);
        assert_eq!(draws.len(), 2);
        // "A" is followed by a break: not continued.
        assert_eq!(draws[0].0, "A");
        assert!(!draws[0].1);
        // "B" is last: not continued, and on a lower line.
        assert_eq!(draws[1].0, "B");
        assert!(!draws[1].1);
        assert!(draws[1].2 > draws[0].2);
    }

    #[test]
    fn test_mixed_runs_share_one_line() {
        let mut c = canvas();
        render_paragraph(&mut c, "a <strong>b</strong> c", &flow(), &StyleSheet::default());
        let draws = text_draws(&c);
        assert_eq!(draws.len(), 3);
        assert!(draws[0].1);
        assert!(draws[1].1);
        assert!(!draws[2].1);
        assert_eq!(draws[0].2, draws[1].2);
        assert_eq!(draws[1].2, draws[2].2);
    }

    #[test]
    fn test_double_break_moves_further_than_single() {
        let sheet = StyleSheet::default();
        let mut single = canvas();
        render_paragraph(&mut single, "a<br>b", &flow(), &sheet);
        let mut double = canvas();
        render_paragraph(&mut double, "a<br><br>b", &flow(), &sheet);
        let y_single = text_draws(&single)[1].2;
        let y_double = text_draws(&double)[1].2;
        assert!(y_double > y_single);
    }

    #[test]
    fn test_paragraph_link_renders_underlined_in_link_color() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        render_paragraph(
            &mut c,
            r#"see <a href="https://example.com">docs</a>"#,
            &flow(),
            &sheet,
        );
        let link_op = c
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text {
                    text,
                    color,
                    link,
                    underline,
                    continued,
                    ..
                } if text == "docs" => Some((*color, link.clone(), *underline, *continued)),
                _ => None,
            })
            .unwrap();
        assert_eq!(link_op.0, sheet.link_color);
        assert_eq!(link_op.1.as_deref(), Some("https://example.com"));
        assert!(link_op.2);
        assert!(!link_op.3);
    }

    #[test]
    fn test_each_list_item_gets_its_own_bullet() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        render_text(
            &mut c,
            "<ul><li>first</li><li>second</li></ul>",
            &flow(),
            &sheet,
        );
        let draws = text_draws(&c);
        assert_eq!(draws.len(), 2);
        assert!(draws[0].0.starts_with("• "));
        assert!(draws[0].0.ends_with("first"));
        assert!(draws[1].0.starts_with("• "));
        assert!(draws[1].0.ends_with("second"));
    }

    #[test]
    fn test_later_fragments_in_item_are_indented_without_bullet() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        render_list_item(&mut c, "lead<br>tail", &flow(), &sheet);
        let positioned: Vec<(String, f32)> = c
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, x, .. } => Some((text.clone(), *x)),
                _ => None,
            })
            .collect();
        assert!(positioned[0].0.starts_with("• "));
        assert_eq!(positioned[0].1, 50.0);
        assert!(!positioned[1].0.contains('•'));
        assert_eq!(positioned[1].1, 50.0 + sheet.list_indent);
    }

    #[test]
    fn test_list_link_draws_prefix_then_link() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        render_list_item(&mut c, r#"<a href="https://x.io">ref</a>"#, &flow(), &sheet);
        let draws = text_draws(&c);
        assert_eq!(draws.len(), 2);
        // Bullet prefix keeps the line open for the link text.
        assert!(draws[0].1);
        assert_eq!(draws[1].0, "ref");
        assert!(!draws[1].1);
    }

    #[test]
    fn test_bare_break_block_is_a_no_op() {
        // Documented quirk: a top-level <br> between blocks moves nothing.
        let sheet = StyleSheet::default();
        let mut c = canvas();
        let y_before = c.y();
        render_text(&mut c, "<br>", &flow(), &sheet);
        assert_eq!(c.y(), y_before);
        assert!(c.ops().is_empty());
    }

    #[test]
    fn test_ensure_fits_breaks_once_at_one_and_a_half_pages() {
        let mut c = LayoutCanvas::new(100.0, 100.0, Margins::trbl(0.0, 0.0, 0.0, 0.0));
        let leftover = ensure_fits(&mut c, 150.0);
        assert_eq!(c.page_count(), 2);
        assert_eq!(leftover, 50.0);
    }

    #[test]
    fn test_ensure_fits_breaks_twice_at_two_and_a_half_pages() {
        let mut c = LayoutCanvas::new(100.0, 100.0, Margins::trbl(0.0, 0.0, 0.0, 0.0));
        ensure_fits(&mut c, 250.0);
        assert_eq!(c.page_count(), 3);
    }

    #[test]
    fn test_ensure_fits_no_break_when_content_fits() {
        let mut c = LayoutCanvas::new(100.0, 100.0, Margins::trbl(0.0, 0.0, 0.0, 0.0));
        let leftover = ensure_fits(&mut c, 60.0);
        assert_eq!(c.page_count(), 1);
        assert_eq!(leftover, 60.0);
    }

    #[test]
    fn test_divider_spans_content_width() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        draw_divider(&mut c, Color::GREY, 100.0, 1.0, &sheet);
        match &c.ops()[0] {
            DrawOp::Line { from, to, color, .. } => {
                assert_eq!(from.x, 30.0);
                assert_eq!(to.x, 565.0);
                assert_eq!(*color, Color::GREY);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_white_divider_adds_no_spacing() {
        let sheet = StyleSheet::default();
        let mut c = canvas();
        let y_before = c.y();
        draw_divider(&mut c, Color::WHITE, 100.0, 1.0, &sheet);
        assert_eq!(c.y(), y_before);
    }
}
