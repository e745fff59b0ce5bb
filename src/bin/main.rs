use clap::{Arg, ArgAction, Command};
use guide2pdf::canvas::LayoutCanvas;
use guide2pdf::config::{load_style_from_source, ConfigSource};
use guide2pdf::{generate_document, ContentRecord, GuideDocument, Locale};
use log::{error, info, warn};
use std::fmt;
use std::fs;
use std::process;
use toml::Value;

#[derive(Debug)]
enum AppError {
    FileReadError(String, std::io::Error),
    ParseError(String),
    ConversionError(String),
    WriteError(String, std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::FileReadError(path, err) => write!(f, "cannot read {}: {}", path, err),
            AppError::ParseError(msg) => write!(f, "invalid records file: {}", msg),
            AppError::ConversionError(msg) => write!(f, "{}", msg),
            AppError::WriteError(path, err) => write!(f, "cannot write {}: {}", path, err),
        }
    }
}

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// Registered asset sizes for the trace canvas, since it never opens image
/// files itself.
struct AssetSize {
    file: String,
    width: f32,
    height: f32,
}

fn value_str(table: &Value, key: &str) -> Option<String> {
    table.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn value_f32(table: &Value, key: &str) -> Option<f32> {
    table.get(key).and_then(|v| {
        v.as_float()
            .map(|f| f as f32)
            .or_else(|| v.as_integer().map(|i| i as f32))
    })
}

fn parse_record(table: &Value) -> Result<ContentRecord, AppError> {
    let kind = value_str(table, "type")
        .ok_or_else(|| AppError::ParseError("record without a type".to_string()))?;
    let title = value_str(table, "title").unwrap_or_default();
    let content = value_str(table, "content").unwrap_or_default();

    match kind.as_str() {
        "intro" => Ok(ContentRecord::intro(title, content)),
        "chapter" => {
            let cover = value_str(table, "cover").unwrap_or_default();
            Ok(ContentRecord::chapter(title, content, cover))
        }
        "text" => {
            let linkable = table
                .get("linkable")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            Ok(ContentRecord::text(title, content, linkable))
        }
        "image" => {
            let file = value_str(table, "file")
                .ok_or_else(|| AppError::ParseError("image record without a file".to_string()))?;
            let caption = value_str(table, "caption").unwrap_or_default();
            Ok(ContentRecord::image(file, caption))
        }
        "code" => {
            let filename = value_str(table, "filename").unwrap_or_default();
            let language = value_str(table, "language").unwrap_or_default();
            let font_size = value_f32(table, "font_size").unwrap_or(0.0);
            Ok(ContentRecord::code(filename, language, content, font_size))
        }
        other => Err(AppError::ParseError(format!(
            "unknown record type {:?}",
            other
        ))),
    }
}

fn load_document(path: &str) -> Result<(GuideDocument, Vec<AssetSize>), AppError> {
    let content =
        fs::read_to_string(path).map_err(|e| AppError::FileReadError(path.to_string(), e))?;
    let parsed: Value = content
        .parse()
        .map_err(|e| AppError::ParseError(format!("{}", e)))?;

    let name = value_str(&parsed, "name").unwrap_or_default();
    let release_date = value_str(&parsed, "release_date").unwrap_or_default();

    let mut records = Vec::new();
    if let Some(list) = parsed.get("records").and_then(|v| v.as_array()) {
        for entry in list {
            records.push(parse_record(entry)?);
        }
    }

    let mut assets = Vec::new();
    if let Some(list) = parsed.get("assets").and_then(|v| v.as_array()) {
        for entry in list {
            let (file, width, height) = match (
                value_str(entry, "file"),
                value_f32(entry, "width"),
                value_f32(entry, "height"),
            ) {
                (Some(f), Some(w), Some(h)) => (f, w, h),
                _ => {
                    warn!("ignoring asset entry without file/width/height");
                    continue;
                }
            };
            assets.push(AssetSize {
                file,
                width,
                height,
            });
        }
    }

    Ok((
        GuideDocument {
            name,
            release_date,
            records,
        },
        assets,
    ))
}

fn get_config_source(matches: &clap::ArgMatches) -> ConfigSource<'_> {
    if let Some(config_file) = matches.get_one::<String>("config") {
        return ConfigSource::File(config_file);
    }
    if std::path::Path::new("guide2pdfrc.toml").exists() {
        return ConfigSource::File("guide2pdfrc.toml");
    }
    ConfigSource::Default
}

fn run(matches: clap::ArgMatches) -> Result<(), AppError> {
    let verbosity = if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let records_path = matches
        .get_one::<String>("records")
        .ok_or_else(|| AppError::ParseError("no records file provided".to_string()))?;

    let locale = matches
        .get_one::<String>("locale")
        .and_then(|tag| Locale::from_tag(tag))
        .unwrap_or(Locale::English);

    let (document, assets) = load_document(records_path)?;
    let style = load_style_from_source(get_config_source(&matches));

    let mut canvas = LayoutCanvas::a4(style.margins);
    for asset in &assets {
        canvas.register_asset(asset.file.clone(), asset.width, asset.height);
    }

    if verbosity == Verbosity::Verbose {
        info!(
            "rendering {} records from {}",
            document.records.len(),
            records_path
        );
    }

    generate_document(&document, locale, &style, &mut canvas)
        .map_err(|e| AppError::ConversionError(e.to_string()))?;

    let trace = serde_json::to_string_pretty(&canvas.trace_json())
        .map_err(|e| AppError::ConversionError(e.to_string()))?;

    match matches.get_one::<String>("trace") {
        Some(path) => {
            fs::write(path, trace).map_err(|e| AppError::WriteError(path.to_string(), e))?;
            if verbosity != Verbosity::Quiet {
                println!("✓ Layout trace written to {}", path);
            }
        }
        None => println!("{}", trace),
    }

    if verbosity == Verbosity::Verbose {
        info!("document spans {} pages", canvas.page_count());
    }

    Ok(())
}

fn main() {
    // Logger controlled via RUST_LOG.
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let cmd = Command::new("guide2pdf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render structured guide records into a paginated layout trace")
        .after_help(
            "EXAMPLES:\n  \
            guide2pdf -r records.toml -t trace.json\n  \
            guide2pdf -r records.toml -c style.toml -l fr\n",
        )
        .arg(
            Arg::new("records")
                .short('r')
                .long("records")
                .value_name("RECORDS_FILE")
                .required(true)
                .help("Path to the records file (TOML format)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Path to style configuration (TOML). Auto-detects guide2pdfrc.toml if not specified"),
        )
        .arg(
            Arg::new("locale")
                .short('l')
                .long("locale")
                .value_name("LOCALE")
                .help("Document locale: en or fr (defaults to en)"),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .value_name("TRACE_PATH")
                .help("Path for the layout trace JSON (defaults to stdout)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress all output except errors"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable detailed output"),
        );

    let matches = cmd.get_matches();
    if let Err(err) = run(matches) {
        error!("{}", err);
        process::exit(1);
    }
}
