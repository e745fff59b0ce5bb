//! Inline-markup tokenizer and block splitter.
//!
//! Content records carry a five-tag dialect: `<br>` (single or doubled),
//! `<strong>`, `<em>`, `<a href="...">` and `<ul>`/`<li>`. Everything else is
//! literal text. The tokenizer never fails: malformed or unknown tags simply
//! stay in the plain runs.
//!
//! Each inline token is wrapped in an [`InlineEvent`] carrying two lookahead
//! booleans computed at scan time, `followed_by_break` and `is_last`. The flow
//! renderer derives its line-continuation decisions from these, so the
//! tokenizer is the single place that looks ahead in the source text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_RE: Regex = Regex::new(
        r#"(<br>)(<br>)?|<strong>(.*?)</strong>|<em>(.*?)</em>|<a\s+href=["']([^"']+)["']>(.*?)</a>"#
    )
    .unwrap();
    static ref BLOCK_RE: Regex = Regex::new(r"<p>(.*?)</p>|(<br>)|<ul>(.*?)</ul>").unwrap();
    static ref LIST_ITEM_RE: Regex = Regex::new(r"<li>(.*?)</li>").unwrap();
}

/// One inline token of a block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupToken {
    /// Literal text between tags.
    PlainRun { text: String },
    /// `<br>` or `<br><br>`.
    LineBreak { double: bool },
    Bold { text: String },
    Italic { text: String },
    Link { url: String, text: String },
}

/// A token plus the lookahead facts the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEvent {
    pub token: MarkupToken,
    /// True when the next tag after this token (skipping whitespace) is a
    /// `<br>`.
    pub followed_by_break: bool,
    /// True when this token ends the block.
    pub is_last: bool,
}

impl InlineEvent {
    fn new(token: MarkupToken, followed_by_break: bool, is_last: bool) -> Self {
        Self {
            token,
            followed_by_break,
            is_last,
        }
    }
}

/// A top-level block of a content record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `<p>…</p>` body text.
    Paragraph(String),
    /// A bare `<br>` between blocks.
    Break,
    /// `<ul>…</ul>`, one entry per `<li>`.
    List(Vec<String>),
}

/// Normalizes the HTML entities that appear in record content. Idempotent:
/// running it twice yields the same string.
pub fn sanitize(content: &str) -> String {
    content.replace("&nbsp;", " ").replace("&gt;", ">")
}

/// Wraps bare content in a paragraph unless it already starts with a block
/// tag.
pub fn ensure_paragraph(content: &str) -> String {
    let trimmed = content.trim_start();
    if trimmed.starts_with("<p>") || trimmed.starts_with("<ul>") {
        content.to_string()
    } else {
        format!("<p>{}</p>", content)
    }
}

/// Scans one block's text into inline events.
///
/// Plain runs between tags are preserved verbatim. A plain run's
/// `followed_by_break` refers to the tag immediately after it; the trailing
/// run after the last tag always has `is_last` set.
pub fn tokenize_inline(text: &str) -> Vec<InlineEvent> {
    let mut events = Vec::new();
    let mut cursor = 0usize;

    for caps in INLINE_RE.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };

        let token = if caps.get(1).is_some() {
            MarkupToken::LineBreak {
                double: caps.get(2).is_some(),
            }
        } else if let Some(m) = caps.get(3) {
            MarkupToken::Bold {
                text: m.as_str().to_string(),
            }
        } else if let Some(m) = caps.get(4) {
            MarkupToken::Italic {
                text: m.as_str().to_string(),
            }
        } else if let (Some(url), Some(label)) = (caps.get(5), caps.get(6)) {
            MarkupToken::Link {
                url: url.as_str().to_string(),
                text: label.as_str().to_string(),
            }
        } else {
            continue;
        };

        let rest = &text[whole.end()..];
        let followed_by_break = rest.trim_start().starts_with("<br>");
        let is_last = whole.end() == text.len();
        let is_break = matches!(token, MarkupToken::LineBreak { .. });

        if whole.start() > cursor {
            events.push(InlineEvent::new(
                MarkupToken::PlainRun {
                    text: text[cursor..whole.start()].to_string(),
                },
                // A plain run's lookahead is the tag that terminated it.
                is_break,
                false,
            ));
        }

        events.push(InlineEvent::new(token, followed_by_break, is_last));
        cursor = whole.end();
    }

    if cursor < text.len() {
        events.push(InlineEvent::new(
            MarkupToken::PlainRun {
                text: text[cursor..].to_string(),
            },
            false,
            true,
        ));
    }

    events
}

/// Splits record content into top-level blocks in document order.
///
/// Only `<p>…</p>`, bare `<br>` and `<ul>…</ul>` are recognized; top-level
/// text outside those forms is dropped. That drop mirrors longstanding
/// behavior that downstream content relies on, so it is covered by tests
/// rather than fixed.
pub fn split_blocks(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();

    for caps in BLOCK_RE.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            blocks.push(Block::Paragraph(m.as_str().to_string()));
        } else if caps.get(2).is_some() {
            blocks.push(Block::Break);
        } else if let Some(m) = caps.get(3) {
            blocks.push(Block::List(split_list_items(m.as_str())));
        }
    }

    blocks
}

/// Extracts the `<li>` bodies of a list block.
pub fn split_list_items(list_body: &str) -> Vec<String> {
    LIST_ITEM_RE
        .captures_iter(list_body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_entities() {
        assert_eq!(sanitize("a&nbsp;b&gt;c"), "a b>c");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize("x&nbsp;&gt;&nbsp;y");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_ensure_paragraph_wraps_bare_text() {
        assert_eq!(ensure_paragraph("hello"), "<p>hello</p>");
        assert_eq!(ensure_paragraph("<p>hello</p>"), "<p>hello</p>");
        assert_eq!(
            ensure_paragraph("<ul><li>a</li></ul>"),
            "<ul><li>a</li></ul>"
        );
    }

    #[test]
    fn test_plain_text_round_trips_as_single_run() {
        let events = tokenize_inline("just plain text");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].token,
            MarkupToken::PlainRun {
                text: "just plain text".to_string()
            }
        );
        assert!(events[0].is_last);
        assert!(!events[0].followed_by_break);
    }

    #[test]
    fn test_bold_followed_by_break() {
        let events = tokenize_inline("<strong>A</strong><br>B");
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].token,
            MarkupToken::Bold {
                text: "A".to_string()
            }
        );
        assert!(events[0].followed_by_break);
        assert!(!events[0].is_last);
        assert_eq!(events[1].token, MarkupToken::LineBreak { double: false });
        assert_eq!(
            events[2].token,
            MarkupToken::PlainRun {
                text: "B".to_string()
            }
        );
        assert!(events[2].is_last);
    }

    #[test]
    fn test_double_break_is_one_token() {
        let events = tokenize_inline("a<br><br>b");
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].token, MarkupToken::LineBreak { double: true });
    }

    #[test]
    fn test_plain_run_before_break_is_marked() {
        let events = tokenize_inline("text<br>more");
        assert_eq!(
            events[0].token,
            MarkupToken::PlainRun {
                text: "text".to_string()
            }
        );
        assert!(events[0].followed_by_break);
    }

    #[test]
    fn test_link_captures_url_and_label() {
        let events = tokenize_inline(r#"see <a href="https://example.com">the site</a> now"#);
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1].token,
            MarkupToken::Link {
                url: "https://example.com".to_string(),
                text: "the site".to_string()
            }
        );
        assert!(!events[1].is_last);
    }

    #[test]
    fn test_single_quoted_href_accepted() {
        let events = tokenize_inline("<a href='x'>y</a>");
        assert_eq!(
            events[0].token,
            MarkupToken::Link {
                url: "x".to_string(),
                text: "y".to_string()
            }
        );
        assert!(events[0].is_last);
    }

    #[test]
    fn test_malformed_tag_stays_literal() {
        let events = tokenize_inline("a <bold>b</bold> c");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].token,
            MarkupToken::PlainRun {
                text: "a <bold>b</bold> c".to_string()
            }
        );
    }

    #[test]
    fn test_trailing_tag_is_last() {
        let events = tokenize_inline("intro <em>fin</em>");
        assert_eq!(events.len(), 2);
        assert!(events[1].is_last);
        assert_eq!(
            events[1].token,
            MarkupToken::Italic {
                text: "fin".to_string()
            }
        );
    }

    #[test]
    fn test_split_blocks_in_document_order() {
        let blocks = split_blocks("<p>one</p><br><ul><li>a</li><li>b</li></ul><p>two</p>");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("one".to_string()),
                Block::Break,
                Block::List(vec!["a".to_string(), "b".to_string()]),
                Block::Paragraph("two".to_string()),
            ]
        );
    }

    #[test]
    fn test_drops_unrecognized_top_level_content() {
        // Documented quirk: loose top-level text never reaches the renderer.
        let blocks = split_blocks("loose text <p>kept</p> trailing");
        assert_eq!(blocks, vec![Block::Paragraph("kept".to_string())]);
    }

    #[test]
    fn test_empty_list_body_yields_no_items() {
        assert_eq!(split_list_items("no items here"), Vec::<String>::new());
    }
}
