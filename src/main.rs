//! htmlterm - render captured terminal output as HTML
//!
//! Replays a byte stream recorded from a shell (a `script` typescript, the
//! output of a build, ...) through the terminal emulator and prints the
//! resulting screen as HTML.
//!
//! # Quick Start
//!
//! ```text
//! htmlterm session.log                 # HTML fragment, one line per row
//! htmlterm --page -t nord session.log  # standalone page with stylesheet
//! ls --color=always | htmlterm -C 120  # read from stdin
//! ```

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use htmlterm::config::{Config, LogConfig};
use htmlterm::{Session, Theme};

/// Command line options
#[derive(Debug, Default)]
struct Args {
    /// Explicit config file
    config_path: Option<PathBuf>,
    rows: Option<usize>,
    columns: Option<usize>,
    theme: Option<String>,
    /// Wrap the fragment in a full HTML document
    page: bool,
    list_themes: bool,
    /// Input file; stdin when absent
    input: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("htmlterm {}", VERSION);
}

fn print_help() {
    eprintln!("htmlterm {} - Render terminal output as HTML", VERSION);
    eprintln!();
    eprintln!("Usage: htmlterm [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads FILE (or stdin) and prints the rendered screen.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.htmlterm/config.toml)");
    eprintln!("  -r, --rows <N>        Viewport height");
    eprintln!("  -C, --columns <N>     Viewport width");
    eprintln!("  -t, --theme <NAME>    Color theme for --page");
    eprintln!("      --page            Print a standalone HTML page");
    eprintln!("      --list-themes     List built-in themes");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Logging goes to stderr; set RUST_LOG=debug to trace unknown sequences.");
}

fn parse_size(flag: &str, value: Option<&String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("Missing value for {}", flag))?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid value for {}: {}", flag, value)),
    }
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "-r" | "--rows" => {
                i += 1;
                parsed.rows = Some(parse_size("--rows", args.get(i))?);
            }
            "-C" | "--columns" => {
                i += 1;
                parsed.columns = Some(parse_size("--columns", args.get(i))?);
            }
            "-t" | "--theme" => {
                i += 1;
                let name = args.get(i).ok_or("Missing theme name")?;
                parsed.theme = Some(name.clone());
            }
            "--page" => parsed.page = true,
            "--list-themes" => parsed.list_themes = true,
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            arg => {
                if parsed.input.is_some() {
                    return Err(format!("Unexpected extra input: {}", arg));
                }
                if arg != "-" {
                    parsed.input = Some(PathBuf::from(arg));
                }
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Install the global subscriber: `RUST_LOG` wins over the configured level.
fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = log.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        fs::OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match log_file {
        Some(file) => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_page(theme: &Theme, title: &str, fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<pre class=\"terminal\">{}</pre>\n</body>\n</html>\n",
        escape_html(title),
        theme.stylesheet(),
        fragment
    )
}

fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    if args.list_themes {
        for name in Theme::list() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Logging depends on the config, so a load failure is reported once
    // the subscriber is installed
    let (mut config, load_error) = match &args.config_path {
        Some(path) => (
            Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None,
        ),
        None => Config::load_or_default(),
    };
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
        config.theme_file = None;
    }

    init_logging(&config.log);
    if let Some(e) = load_error {
        warn!("Ignoring config: {}", e);
    }
    info!("htmlterm {} rendering {}x{}", VERSION, config.rows, config.columns);

    // Resolve the theme before reading input so a typo fails fast
    let theme = if args.page {
        Some(config.theme().context("Failed to load theme")?)
    } else {
        None
    };

    let mut input = Vec::new();
    match &args.input {
        Some(path) => {
            input = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            io::stdin()
                .read_to_end(&mut input)
                .context("Failed to read stdin")?;
        }
    }
    info!("Read {} bytes", input.len());

    // There is no remote end to answer cursor position reports
    let mut session = Session::from_config(1, &config, io::sink());
    session.feed_bytes(&input);
    session.finish();

    let fragment = session.render();
    let output = match &theme {
        Some(theme) => render_page(theme, session.title(), &fragment),
        None => format!("{}\n", fragment),
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write output")?;

    Ok(())
}
