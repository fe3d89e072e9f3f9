//! Concurrent file searching.
//!
//! The pipeline couples one producing scanner thread with a pool of
//! matching workers over a closed-on-completion channel:
//!
//! ```rust,ignore
//! let report = search(&config)?;
//! for result in &report.results {
//!     println!("{}", formatter.format(result));
//! }
//! std::process::exit(report.exit_code());
//! ```
//!
//! Results are aggregated per worker and merged once at the end, then
//! sorted by `(file_path, line_number)`; the emitted sequence is identical
//! for any thread count.

pub mod engine;
pub mod matcher;

pub use engine::search;
pub use matcher::{build_matcher, Matcher, Pcre2Matcher, RegexMatcher};
