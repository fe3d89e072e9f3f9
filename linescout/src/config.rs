use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SearchError};

/// Configuration for one search run, consumed read-only by the pipeline.
///
/// # Configuration Locations
///
/// Values can be layered from multiple locations, later ones winning:
/// 1. Global `$CONFIG_DIR/linescout/config.yaml`
/// 2. Local `.linescout.yaml` in the current directory
/// 3. A custom file passed via `--config`
///
/// CLI arguments take precedence over all file values; the merging rules
/// live in [`SearchConfig::merge_with_cli`].
///
/// # Example
///
/// ```yaml
/// # Patterns to exclude (glob syntax, matched against file names)
/// exclude_patterns:
///   - "*.min.js"
///
/// # Thread count (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search pattern; literal or regex depending on its content
    #[serde(default)]
    pub pattern: String,

    /// Root paths to search; defaults to the current directory
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,

    /// Whether directories are descended into
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Maximum directory depth below each root; `None` means unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Number of worker threads; `None` resolves to available parallelism
    #[serde(default)]
    pub thread_count: Option<NonZeroUsize>,

    /// Case-insensitive matching
    #[serde(default)]
    pub ignore_case: bool,

    /// Report lines that do NOT match
    #[serde(default)]
    pub invert_match: bool,

    /// Keep only matches bounded by non-word characters on both ends
    #[serde(default)]
    pub word_match: bool,

    /// Require the pattern to match the entire line
    #[serde(default)]
    pub line_match: bool,

    /// Only search files whose name matches at least one of these globs
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Skip files whose name matches any of these globs
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Which pattern-matching backend handles non-literal patterns
    #[serde(default)]
    pub engine: MatcherEngine,

    /// Print only the total match count
    #[serde(default)]
    pub count_only: bool,

    /// Suppress all output; the exit status still reflects the count
    #[serde(default)]
    pub quiet: bool,

    /// When to emit ANSI colors
    #[serde(default)]
    pub color: ColorMode,

    /// Prefix each result with the file path
    #[serde(default = "default_true")]
    pub show_filename: bool,

    /// Prefix each result with the line number
    #[serde(default)]
    pub show_line_number: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            paths: default_paths(),
            recursive: true,
            max_depth: None,
            thread_count: None,
            ignore_case: false,
            invert_match: false,
            word_match: false,
            line_match: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            engine: MatcherEngine::default(),
            count_only: false,
            quiet: false,
            color: ColorMode::default(),
            show_filename: true,
            show_line_number: false,
            log_level: default_log_level(),
        }
    }
}

/// The interchangeable pattern-matching backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherEngine {
    /// The `regex` crate: finite-automaton engine, linear-time matching
    #[default]
    Regex,
    /// The `pcre2` crate: backtracking engine with PCRE semantics
    Pcre2,
}

impl MatcherEngine {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "regex" => Ok(Self::Regex),
            "pcre2" => Ok(Self::Pcre2),
            other => Err(SearchError::config_error(format!(
                "unknown matcher engine '{other}' (expected 'regex' or 'pcre2')"
            ))),
        }
    }
}

/// Color policy for emitted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Never,
    Always,
    /// Color only when stdout is an interactive terminal
    Auto,
}

impl ColorMode {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            other => Err(SearchError::config_error(format!(
                "unknown color mode '{other}' (expected 'never', 'always' or 'auto')"
            ))),
        }
    }
}

/// How a line is tested against the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Substring search without pattern-language interpretation
    Literal,
    /// Full pattern search through the configured backend
    Pattern,
    /// Full pattern search, backend built caseless
    CaseInsensitive,
}

const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '(', ')', '[', ']', '{', '}', '|', '\\',
];

impl SearchMode {
    /// A pattern without regex metacharacters is searched literally; anything
    /// else goes through the backend, caseless when requested.
    pub fn detect(pattern: &str, ignore_case: bool) -> Self {
        if !pattern.contains(REGEX_METACHARACTERS) {
            Self::Literal
        } else if ignore_case {
            Self::CaseInsensitive
        } else {
            Self::Pattern
        }
    }
}

impl SearchConfig {
    /// The mode this configuration's pattern is evaluated in.
    pub fn mode(&self) -> SearchMode {
        SearchMode::detect(&self.pattern, self.ignore_case)
    }

    /// Worker thread count, resolved to available parallelism when unset.
    pub fn resolved_thread_count(&self) -> NonZeroUsize {
        self.thread_count.unwrap_or_else(|| {
            NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
        })
    }

    /// Fatal-at-startup validation; everything else about a run recovers
    /// locally. Thread count and depth minimums are enforced by their types.
    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_empty() {
            return Err(SearchError::config_error("no search pattern provided"));
        }
        Ok(())
    }

    /// Loads configuration from the default locations.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, layering the default locations under an optional
    /// explicit file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("linescout/config.yaml")),
            Some(PathBuf::from(".linescout.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SearchError::config_error(e.to_string()))
    }

    /// Merges CLI arguments over file-loaded values. CLI values win wherever
    /// they differ from the CLI defaults.
    pub fn merge_with_cli(mut self, cli: SearchConfig) -> Self {
        // The pattern is a required CLI positional, so it always wins.
        self.pattern = cli.pattern;
        if cli.paths != default_paths() {
            self.paths = cli.paths;
        }
        if !cli.recursive {
            self.recursive = false;
        }
        if cli.max_depth.is_some() {
            self.max_depth = cli.max_depth;
        }
        if cli.thread_count.is_some() {
            self.thread_count = cli.thread_count;
        }
        self.ignore_case |= cli.ignore_case;
        self.invert_match |= cli.invert_match;
        self.word_match |= cli.word_match;
        self.line_match |= cli.line_match;
        if !cli.include_patterns.is_empty() {
            self.include_patterns = cli.include_patterns;
        }
        if !cli.exclude_patterns.is_empty() {
            self.exclude_patterns = cli.exclude_patterns;
        }
        if cli.engine != MatcherEngine::default() {
            self.engine = cli.engine;
        }
        self.count_only |= cli.count_only;
        self.quiet |= cli.quiet;
        if cli.color != ColorMode::default() {
            self.color = cli.color;
        }
        if !cli.show_filename {
            self.show_filename = false;
        }
        self.show_line_number |= cli.show_line_number;
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }
}
