//! prodcal - production calendar to iCalendar converter
//!
//! Downloads (or reads) a production calendar page for one year, merges its
//! non-working and shortened days into ranges and writes an `.ics` file with
//! one all-day event per range.
//!
//! ```bash
//! # Current year into ./prodcal-<year>.ics
//! prodcal
//!
//! # A given year, printed to stdout
//! prodcal 2026 --stdout
//!
//! # From a saved page
//! prodcal --year 2026 --input calendar-2026.html -o holidays.ics
//!
//! # Inspect a generated file
//! prodcal check holidays.ics
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Runtime error (fetch, parse, write)
//! - `2` - Invalid arguments

mod check;
mod config;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use colored::Colorize;
use prodcal_calendar::{aggregate_ranges, IcsWriter, RandomUid, SequentialUid};
use prodcal_source::{load_annotations, Fetcher, PageSource, SavedPage};

use crate::config::{Config, CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};

/// Earliest supported year
const MIN_YEAR: i32 = 2020;

/// Latest supported year
const MAX_YEAR: i32 = 2100;

/// Parse a four-digit year within the supported range
fn parse_year(s: &str) -> Result<i32, String> {
    let s = s.trim();
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{s}' is not a four-digit year"));
    }
    let year: i32 = s.parse().map_err(|_| format!("invalid year: '{s}'"))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format!("year must be between {MIN_YEAR} and {MAX_YEAR}"));
    }
    Ok(year)
}

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Default log filter, `RUST_LOG` still wins
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
enum OutputFormat {
    /// iCalendar document (default)
    #[default]
    Ics,
    /// Merged ranges as JSON
    Json,
}

impl OutputFormat {
    /// Default output file for this format, derived from the configured path
    fn default_path(self, configured: PathBuf) -> PathBuf {
        match self {
            Self::Ics => configured,
            Self::Json => configured.with_extension("json"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "prodcal",
    about = "Convert a production calendar into an iCalendar file",
    long_about = "Convert a production calendar page into an iCalendar file.\n\
                  \n\
                  Non-working and shortened days are merged into ranges, one\n\
                  all-day event per range.",
    version,
    args_conflicts_with_subcommands = true
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Configuration file (replaces ~/.prodcal.toml and ./.prodcal.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    generate: GenerateArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Debug, Default)]
struct GenerateArgs {
    /// Calendar year (2020-2100), defaults to the current year
    #[arg(value_name = "YEAR", value_parser = parse_year)]
    year_arg: Option<i32>,

    /// Calendar year (2020-2100), same as the positional YEAR
    #[arg(long, value_name = "YEAR", value_parser = parse_year, conflicts_with = "year_arg")]
    year: Option<i32>,

    /// Output file (default from config: ./prodcal-<year>.ics, .json with --format json)
    #[arg(short, long, value_name = "OUTPUT", conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the result instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,

    /// Read a saved calendar page instead of downloading it
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Page address, {year} is substituted
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "ics")]
    format: OutputFormat,

    /// Use counter UIDs for reproducible output
    #[arg(long)]
    deterministic_uids: bool,

    /// Fold lines longer than 75 octets
    #[arg(long)]
    fold_lines: bool,
}

impl GenerateArgs {
    /// Year from the arguments, or the current local year
    fn resolve_year(&self) -> Result<i32> {
        match self.year_arg.or(self.year) {
            Some(year) => Ok(year),
            None => {
                let year = chrono::Local::now().year();
                parse_year(&year.to_string()).map_err(anyhow::Error::msg)
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize an iCalendar file and verify its UIDs
    Check {
        /// File to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a commented ./.prodcal.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Some(Commands::Check { file }) => check::run(&file, verbosity),
        Some(Commands::Config { action }) => run_config(action, &config, verbosity),
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Args::command(), "prodcal", &mut io::stdout());
            Ok(())
        }
        None => run_generate(&args.generate, &config, verbosity),
    }
}

fn run_generate(args: &GenerateArgs, config: &Config, verbosity: Verbosity) -> Result<()> {
    let year = args.resolve_year()?;

    let source: Box<dyn PageSource> = match &args.input {
        Some(path) => Box::new(SavedPage::new(path)),
        None => {
            let mut options = config.fetch_options();
            if let Some(url) = &args.url {
                options.url_template.clone_from(url);
            }
            Box::new(Fetcher::new(options).context("Failed to set up HTTP client")?)
        }
    };

    let days = load_annotations(source.as_ref(), year, &config.extract_options())
        .with_context(|| format!("Failed to load calendar from {}", source.describe(year)))?;
    let ranges = aggregate_ranges(&days);

    if verbosity.is_verbose() {
        eprintln!(
            "{} {} annotated days merged into {} ranges",
            "Info:".blue().bold(),
            days.len(),
            ranges.len()
        );
    }

    let output = match args.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&ranges).context("Failed to encode ranges")?;
            json.push('\n');
            json
        }
        OutputFormat::Ics => {
            let mut options = config.ics_options();
            options.fold_lines |= args.fold_lines;
            let writer = IcsWriter::new(config.calendar_header(year)).with_options(options);
            let rendered = if args.deterministic_uids {
                writer.render(&ranges, &mut SequentialUid::new())
            } else {
                writer.render(&ranges, &mut RandomUid::new())
            };
            rendered.context("Failed to render calendar")?
        }
    };

    if args.stdout {
        print!("{output}");
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| args.format.default_path(config.output_path(year)));
    write_output(&path, &output, args.force || config.overwrite())?;

    if verbosity.should_show_output() {
        eprintln!(
            "{} Calendar for {} written to: {} ({} events)",
            "✓".green().bold(),
            year,
            path.display().to_string().bright_white(),
            ranges.len()
        );
    }
    Ok(())
}

fn write_output(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!(
            "Output file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

fn run_config(action: ConfigAction, config: &Config, verbosity: Verbosity) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = PathBuf::from(CONFIG_FILE_NAME);
            if path.exists() && !force {
                bail!(
                    "Configuration file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            if verbosity.should_show_output() {
                eprintln!(
                    "{} Created configuration file: {}",
                    "Success:".green().bold(),
                    path.display()
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let text = toml::to_string_pretty(config).context("Failed to encode configuration")?;
            print!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_bounds() {
        assert_eq!(parse_year("2020"), Ok(2020));
        assert_eq!(parse_year("2100"), Ok(2100));
        assert_eq!(parse_year(" 2026 "), Ok(2026));
        assert!(parse_year("2019").is_err());
        assert!(parse_year("2101").is_err());
    }

    #[test]
    fn test_parse_year_shape() {
        for bad in ["26", "02026", "20x6", "", "-2026", "+202"] {
            assert!(parse_year(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::Verbose.log_filter(), "info");
    }

    #[test]
    fn test_resolve_year_prefers_arguments() {
        let args = GenerateArgs {
            year: Some(2031),
            ..GenerateArgs::default()
        };
        assert_eq!(args.resolve_year().unwrap(), 2031);

        let args = GenerateArgs {
            year_arg: Some(2032),
            ..GenerateArgs::default()
        };
        assert_eq!(args.resolve_year().unwrap(), 2032);
    }

    #[test]
    fn test_json_default_path_swaps_extension() {
        let configured = PathBuf::from("out/prodcal-2026.ics");
        assert_eq!(
            OutputFormat::Ics.default_path(configured.clone()),
            PathBuf::from("out/prodcal-2026.ics")
        );
        assert_eq!(
            OutputFormat::Json.default_path(configured),
            PathBuf::from("out/prodcal-2026.json")
        );
        assert_eq!(
            OutputFormat::Json.default_path(PathBuf::from("holidays")),
            PathBuf::from("holidays.json")
        );
    }

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_write_output_refuses_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.ics");
        write_output(&path, "first", false).unwrap();
        assert!(write_output(&path, "second", false).is_err());
        write_output(&path, "third", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }
}
