use clap::Parser;
use linescout::{
    search, ColorMode, MatcherEngine, OutputFormatter, SearchConfig, SearchError,
};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

/// Search for PATTERN in files under each PATH (default: current directory)
#[derive(Parser)]
#[command(name = "linescout", version, about, long_about = None)]
struct Cli {
    /// Pattern to search for; treated literally unless it contains regex
    /// metacharacters
    pattern: String,

    /// Paths to search
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Case insensitive search
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Show line numbers
    #[arg(short = 'n', long)]
    line_number: bool,

    /// Only show the total count of matching lines
    #[arg(short = 'c', long)]
    count: bool,

    /// Select non-matching lines
    #[arg(short = 'v', long)]
    invert_match: bool,

    /// Match whole words only
    #[arg(short = 'w', long)]
    word_regexp: bool,

    /// Match whole lines only
    #[arg(short = 'x', long)]
    line_regexp: bool,

    /// Search directories recursively (default)
    #[arg(short = 'r', long, overrides_with = "no_recursive")]
    recursive: bool,

    /// Don't search directories recursively
    #[arg(long)]
    no_recursive: bool,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Number of worker threads (default: auto)
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Only search files whose name matches this glob (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Skip files whose name matches this glob (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Suppress normal output; the exit status still reflects matches
    #[arg(short = 'q', long)]
    quiet: bool,

    /// When to use colors (never, auto, always)
    #[arg(long, value_name = "WHEN")]
    color: Option<String>,

    /// Disable colors
    #[arg(long)]
    no_color: bool,

    /// Pattern-matching backend (regex, pcre2)
    #[arg(long, default_value = "regex")]
    engine: String,

    /// Don't prefix results with the file path
    #[arg(long)]
    no_filename: bool,

    /// Configuration file to load
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<SearchConfig> {
        let color = if self.no_color {
            ColorMode::Never
        } else {
            match self.color.as_deref() {
                Some(when) => ColorMode::parse(when)?,
                None => ColorMode::Never,
            }
        };

        Ok(SearchConfig {
            pattern: self.pattern,
            paths: self.paths,
            recursive: self.recursive || !self.no_recursive,
            max_depth: self.max_depth,
            thread_count: self.threads,
            ignore_case: self.ignore_case,
            invert_match: self.invert_match,
            word_match: self.word_regexp,
            line_match: self.line_regexp,
            include_patterns: self.include,
            exclude_patterns: self.exclude,
            engine: MatcherEngine::parse(&self.engine)?,
            count_only: self.count,
            quiet: self.quiet,
            color,
            show_filename: !self.no_filename,
            show_line_number: self.line_number,
            ..Default::default()
        })
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config_file = cli.config.clone();

    let cli_config = cli.into_config()?;
    let config = match SearchConfig::load_from(config_file.as_deref()) {
        Ok(file_config) => file_config.merge_with_cli(cli_config),
        Err(_) if config_file.is_none() => cli_config,
        Err(e) => return Err(e),
    };

    init_logging(&config.log_level);
    config.validate()?;

    let report = search(&config)?;
    tracing::debug!("Search produced {} result lines", report.results.len());

    if config.quiet {
        return Ok(report.exit_code());
    }

    if config.count_only {
        println!("{}", report.match_count);
        return Ok(report.exit_code());
    }

    let formatter = OutputFormatter::new(&config);
    if formatter.color_enabled() {
        colored::control::set_override(true);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &report.results {
        if writeln!(out, "{}", formatter.format(result)).is_err() {
            // Broken pipe: stop printing, keep the exit status
            break;
        }
    }

    Ok(report.exit_code())
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    process::exit(code);
}
