//! Per-language code tokenization for highlighted code blocks.
//!
//! Highlighting is deliberately shallow: each language is a data table of
//! keyword/constant/command vocabularies plus a palette, compiled once into a
//! single alternation matcher. There is no grammar and no AST; a token is
//! whatever the word lists and the handful of shape patterns (numbers, brace
//! groups, quoted strings) recognize. Precedence is first-match-wins in table
//! order: keyword > constant > command > number > brace block > string.
//!
//! Two languages bypass the table matcher. Structured data (`json`) is
//! classified line by line on shape (`"key": value`, bracket-only delimiter
//! lines, anything else), after an optional pretty-print normalization pass.
//! Diff transcripts (`git`) only distinguish `#`-prefixed comment lines from
//! everything else.

use crate::canvas::Color;
use lazy_static::lazy_static;
use regex::Regex;

/// Palette entries shared by the language tables.
pub const KEYWORD_BLUE: Color = Color::rgb(0x19, 0x90, 0xC8);
pub const CONSTANT_RED: Color = Color::rgb(0xD3, 0x2F, 0x2F);
pub const CODE_GREEN: Color = Color::rgb(0x2F, 0x9C, 0x0A);
pub const SCRIPT_CONSTANT_BLUE: Color = Color::rgb(0x3D, 0x90, 0xB8);
pub const TAG_RED: Color = Color::rgb(0xC9, 0x2C, 0x2C);

/// Languages with a highlighting table or classifier. Unknown tags fall back
/// to an undecorated block at the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Typescript,
    Javascript,
    Python,
    Nginx,
    Html,
    Css,
    Git,
    Json,
}

impl SourceLanguage {
    /// Maps a code record's language tag to a table, if one exists.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "typescript" => Some(SourceLanguage::Typescript),
            "javascript" => Some(SourceLanguage::Javascript),
            "python" => Some(SourceLanguage::Python),
            "nginx" => Some(SourceLanguage::Nginx),
            "html" => Some(SourceLanguage::Html),
            "css" => Some(SourceLanguage::Css),
            "git" => Some(SourceLanguage::Git),
            "json" => Some(SourceLanguage::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCategory {
    Keyword,
    Constant,
    Command,
    Number,
    BraceBlock,
    StringLiteral,
    PlainText,
}

/// One colored span of a code line. Concatenating the `text` fields of a
/// line's tokens reproduces the line verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeToken {
    pub category: CodeCategory,
    pub text: String,
    pub color: Color,
}

impl CodeToken {
    fn plain(text: &str, color: Color) -> Self {
        Self {
            category: CodeCategory::PlainText,
            text: text.to_string(),
            color,
        }
    }
}

/// A language's vocabulary and palette. Empty vocabularies and disabled
/// shape patterns simply contribute no alternation branch.
pub struct LanguageSpec {
    pub keywords: &'static [&'static str],
    pub keyword_color: Color,
    pub constants: &'static [&'static str],
    pub constant_color: Color,
    pub commands: &'static [&'static str],
    pub command_color: Color,
    pub match_numbers: bool,
    pub number_color: Color,
    pub brace_color: Color,
    pub string_pattern: &'static str,
    pub string_color: Color,
    /// When set, every categorized token keeps the line open regardless of
    /// its position, and only a trailing plain span closes it.
    pub hold_line: bool,
}

pub static TYPESCRIPT: LanguageSpec = LanguageSpec {
    keywords: &[
        "await", "async", "import", "const", "from", "export", "class", "var", "return",
    ],
    keyword_color: KEYWORD_BLUE,
    constants: &["true", "false"],
    constant_color: CONSTANT_RED,
    commands: &[
        "createComponent",
        "toBeTruthy",
        "configureTestingModule",
        "beforeEach",
        "describe",
        "compileComponents",
        "expect",
        "toEqual",
        "bootstrapModule",
        "platformBrowserDynamic",
        "error",
        "catch",
    ],
    command_color: CODE_GREEN,
    match_numbers: true,
    number_color: CONSTANT_RED,
    brace_color: Color::BLACK,
    string_pattern: "['\"`][^'\"`]+['\"`]",
    string_color: CODE_GREEN,
    hold_line: false,
};

// In this table `const` and `function` are declaration constants, not
// keywords; the keyword vocabulary covers the runtime call surface instead.
pub static JAVASCRIPT: LanguageSpec = LanguageSpec {
    keywords: &[
        "require",
        "use",
        "static",
        "join",
        "get",
        "sendFile",
        "listen",
        "log",
        "createServer",
        "writeHead",
        "end",
        "export",
        "class",
        "from",
    ],
    keyword_color: CODE_GREEN,
    constants: &["const", "function"],
    constant_color: SCRIPT_CONSTANT_BLUE,
    commands: &[],
    command_color: CODE_GREEN,
    match_numbers: true,
    number_color: CONSTANT_RED,
    brace_color: Color::BLACK,
    string_pattern: "['\"][^'\"]+['\"]",
    string_color: CODE_GREEN,
    hold_line: false,
};

pub static PYTHON: LanguageSpec = LanguageSpec {
    keywords: &[
        "print", "def", "if", "else", "class", "Server", "from", "try", "except",
    ],
    keyword_color: KEYWORD_BLUE,
    constants: &["true", "false"],
    constant_color: CONSTANT_RED,
    commands: &["import", "as", "do_GET"],
    command_color: KEYWORD_BLUE,
    match_numbers: true,
    number_color: CONSTANT_RED,
    brace_color: Color::GREY,
    string_pattern: "['\"`][^'\"`]+['\"`]",
    string_color: CODE_GREEN,
    hold_line: false,
};

pub static NGINX: LanguageSpec = LanguageSpec {
    keywords: &[
        "user",
        "worker_processes",
        "pid",
        "error_log",
        "include",
        "events",
        "worker_connections",
        "http",
        "sendfile",
        "tcp_nopush",
        "types_hash_max_size",
        "default_type",
        "ssl_protocols",
        "ssl_prefer_server_ciphers",
        "access_log",
        "gzip",
        "server",
        "listen",
        "root",
        "index",
        "server_name",
        "location",
        "try_files",
        "proxy_set_header",
        "proxy_pass",
        "ssl_ciphers",
        "ssl_certificate",
        "ssl_certificate_key",
    ],
    keyword_color: KEYWORD_BLUE,
    constants: &["on", "768", "2048", "80", "443"],
    constant_color: Color::RED,
    commands: &[],
    command_color: KEYWORD_BLUE,
    match_numbers: false,
    number_color: CONSTANT_RED,
    brace_color: Color::BLACK,
    string_pattern: "['\"][^'\"]+['\"]",
    string_color: CODE_GREEN,
    hold_line: true,
};

pub static HTML: LanguageSpec = LanguageSpec {
    keywords: &[
        "base",
        "body",
        "html",
        "head",
        "script",
        "meta",
        "title",
        "link",
        "div",
        "header",
        "section",
        "h1",
        "h2",
        "h3",
        "h4",
        "p",
        "ul",
        "li",
        "router-outlet",
        "main",
        "footer",
    ],
    keyword_color: TAG_RED,
    constants: &[],
    constant_color: TAG_RED,
    // Attribute names color as commands.
    commands: &[
        "routerLink", "href", "name", "rel", "lang", "type", "function", "gtag", "defer", "src",
    ],
    command_color: KEYWORD_BLUE,
    match_numbers: false,
    number_color: CONSTANT_RED,
    brace_color: Color::BLACK,
    string_pattern: "'[^']+'|\"[^\"]+\"",
    string_color: CODE_GREEN,
    hold_line: true,
};

struct Matcher {
    re: Regex,
    groups: Vec<(CodeCategory, Color)>,
}

impl Matcher {
    fn build(spec: &LanguageSpec) -> Self {
        let mut parts: Vec<String> = Vec::new();
        let mut groups: Vec<(CodeCategory, Color)> = Vec::new();

        if !spec.keywords.is_empty() {
            parts.push(format!(r"\b({})\b", spec.keywords.join("|")));
            groups.push((CodeCategory::Keyword, spec.keyword_color));
        }
        if !spec.constants.is_empty() {
            parts.push(format!(r"\b({})\b", spec.constants.join("|")));
            groups.push((CodeCategory::Constant, spec.constant_color));
        }
        if !spec.commands.is_empty() {
            parts.push(format!(r"\b({})\b", spec.commands.join("|")));
            groups.push((CodeCategory::Command, spec.command_color));
        }
        if spec.match_numbers {
            parts.push(r"(\d+(?:\.\d+)?)".to_string());
            groups.push((CodeCategory::Number, spec.number_color));
        }
        parts.push(r"(\{[^}]+\})".to_string());
        groups.push((CodeCategory::BraceBlock, spec.brace_color));
        parts.push(format!("({})", spec.string_pattern));
        groups.push((CodeCategory::StringLiteral, spec.string_color));

        Self {
            re: Regex::new(&parts.join("|")).unwrap(),
            groups,
        }
    }
}

lazy_static! {
    static ref TYPESCRIPT_MATCHER: Matcher = Matcher::build(&TYPESCRIPT);
    static ref JAVASCRIPT_MATCHER: Matcher = Matcher::build(&JAVASCRIPT);
    static ref PYTHON_MATCHER: Matcher = Matcher::build(&PYTHON);
    static ref NGINX_MATCHER: Matcher = Matcher::build(&NGINX);
    static ref HTML_MATCHER: Matcher = Matcher::build(&HTML);
    static ref KEY_VALUE_LINE_RE: Regex = Regex::new(r#"^(\s*)"([^"]+)":\s*(.*)$"#).unwrap();
    static ref DELIMITER_LINE_RE: Regex = Regex::new(r"^\s*[{}\[\],]\s*$").unwrap();
    static ref CSS_TOKEN_RE: Regex = Regex::new(concat!(
        r"\b(?:body|html|div|span|p|h1|h2|h3|h4|h5|h6|a|ul|ol|li|table|tr|td|th|input|",
        r"button|form|label|header|footer|section|article|aside|nav)\b",
        r"|\b(?:color|background|background-color|width|height|margin|padding|border|",
        r"display|position|top|left|right|bottom|flex|grid|align-items|justify-content|",
        r"z-index|opacity|overflow|visibility|cursor|font-size|font-weight|text-align|",
        r"line-height|letter-spacing)\b",
        r#"|'[^']*'|"[^"]*""#,
        r"|\b\d+(?:\.\d+)?\b",
        r"|/\*.*?\*/",
    ))
    .unwrap();
    static ref CSS_NUMBER_RE: Regex = Regex::new(r"^\d+(?:\.\d+)?$").unwrap();
}

fn matcher_for(lang: SourceLanguage) -> Option<&'static Matcher> {
    match lang {
        SourceLanguage::Typescript => Some(&TYPESCRIPT_MATCHER),
        SourceLanguage::Javascript => Some(&JAVASCRIPT_MATCHER),
        SourceLanguage::Python => Some(&PYTHON_MATCHER),
        SourceLanguage::Nginx => Some(&NGINX_MATCHER),
        SourceLanguage::Html => Some(&HTML_MATCHER),
        _ => None,
    }
}

/// The table behind a language's matcher, when it has one.
pub fn spec_for(lang: SourceLanguage) -> Option<&'static LanguageSpec> {
    match lang {
        SourceLanguage::Typescript => Some(&TYPESCRIPT),
        SourceLanguage::Javascript => Some(&JAVASCRIPT),
        SourceLanguage::Python => Some(&PYTHON),
        SourceLanguage::Nginx => Some(&NGINX),
        SourceLanguage::Html => Some(&HTML),
        _ => None,
    }
}

/// Tokenizes one line of code against a language's table. Spans not claimed
/// by any vocabulary or shape pattern become plain tokens in `base_color`.
/// Languages without a table matcher yield the whole line as one plain token.
pub fn tokenize_line(lang: SourceLanguage, line: &str, base_color: Color) -> Vec<CodeToken> {
    let matcher = match matcher_for(lang) {
        Some(m) => m,
        None => return vec![CodeToken::plain(line, base_color)],
    };

    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    for caps in matcher.re.captures_iter(line) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > cursor {
            tokens.push(CodeToken::plain(&line[cursor..whole.start()], base_color));
        }

        let (category, color) = matcher
            .groups
            .iter()
            .enumerate()
            .find(|(idx, _)| caps.get(idx + 1).is_some())
            .map(|(_, g)| *g)
            .unwrap_or((CodeCategory::PlainText, base_color));

        tokens.push(CodeToken {
            category,
            text: whole.as_str().to_string(),
            color,
        });
        cursor = whole.end();
    }

    if cursor < line.len() {
        tokens.push(CodeToken::plain(&line[cursor..], base_color));
    }

    tokens
}

/// Diff transcripts: comment lines grey, everything else in the base color.
pub fn diff_line_color(line: &str) -> Color {
    if line.starts_with('#') {
        Color::GREY
    } else {
        Color::BLACK
    }
}

/// Shape of one structured-data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredLine {
    KeyValue {
        indent: String,
        key: String,
        value: String,
    },
    /// A line holding only brackets/commas.
    Delimiter(String),
    Text(String),
}

/// Classifies a structured-data line by shape.
pub fn classify_structured_line(line: &str) -> StructuredLine {
    if let Some(caps) = KEY_VALUE_LINE_RE.captures(line) {
        let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
        let key = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
        let value = caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string();
        return StructuredLine::KeyValue {
            indent,
            key: format!("\"{}\":", key),
            value,
        };
    }
    if DELIMITER_LINE_RE.is_match(line) {
        return StructuredLine::Delimiter(line.to_string());
    }
    StructuredLine::Text(line.to_string())
}

/// Pretty-prints structured-data content with two-space indentation. Content
/// that does not parse is returned untouched so it still renders as raw text.
pub fn pretty_structured(content: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| content.to_string()),
        Err(_) => content.to_string(),
    }
}

/// Tokenizes a stylesheet line into space-joined colored fragments: known
/// selectors green, known properties red, quoted values magenta, numbers
/// black, comments grey, everything else in the default color. The first
/// fragment carries the line's leading indent and the last is trimmed.
pub fn tokenize_stylesheet_line(line: &str) -> Vec<CodeToken> {
    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len];

    let mut raw: Vec<&str> = Vec::new();
    let mut cursor = 0usize;
    for m in CSS_TOKEN_RE.find_iter(line) {
        if m.start() > cursor {
            raw.push(&line[cursor..m.start()]);
        }
        raw.push(m.as_str());
        cursor = m.end();
    }
    if cursor < line.len() {
        raw.push(&line[cursor..]);
    }

    // Drop blank fragments and immediate repeats.
    let mut words: Vec<&str> = Vec::new();
    for fragment in raw {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        if words.last() == Some(&fragment) {
            continue;
        }
        words.push(fragment);
    }

    let count = words.len();
    words
        .into_iter()
        .enumerate()
        .map(|(idx, word)| {
            let color = if CSS_SELECTORS.contains(&word) {
                Color::GREEN
            } else if CSS_PROPERTIES.contains(&word) {
                TAG_RED
            } else if (word.starts_with('\'') && word.ends_with('\'') && word.len() > 1)
                || (word.starts_with('"') && word.ends_with('"') && word.len() > 1)
            {
                Color::MAGENTA
            } else if CSS_NUMBER_RE.is_match(word) {
                Color::BLACK
            } else if word.starts_with("/*") && word.contains("*/") {
                Color::GREY
            } else {
                Color::BLACK
            };

            let text = if count == 1 {
                format!("{}{}", indent, word)
            } else if idx == 0 {
                format!("{}{} ", indent, word)
            } else if idx + 1 == count {
                word.to_string()
            } else {
                format!("{} ", word)
            };

            CodeToken {
                category: CodeCategory::PlainText,
                text,
                color,
            }
        })
        .collect()
}

static CSS_SELECTORS: [&str; 29] = [
    "body", "html", "div", "span", "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "ul", "ol", "li",
    "table", "tr", "td", "th", "input", "button", "form", "label", "header", "footer", "section",
    "article", "aside", "nav",
];

static CSS_PROPERTIES: [&str; 28] = [
    "color",
    "background",
    "background-color",
    "width",
    "height",
    "margin",
    "padding",
    "border",
    "display",
    "position",
    "top",
    "left",
    "right",
    "bottom",
    "flex",
    "grid",
    "align-items",
    "justify-content",
    "z-index",
    "opacity",
    "overflow",
    "visibility",
    "cursor",
    "font-size",
    "font-weight",
    "text-align",
    "line-height",
    "letter-spacing",
];
