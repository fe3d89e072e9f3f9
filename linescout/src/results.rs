use std::path::PathBuf;

/// A single pattern occurrence within one line.
///
/// `start` and `end` are byte offsets into the owning line's content, with
/// `start <= end <= content.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte offset of the first matched byte
    pub start: usize,
    /// Byte offset one past the last matched byte
    pub end: usize,
    /// The matched text
    pub text: String,
}

/// One matching line of one file.
///
/// Produced at most once per line; `matches` holds every occurrence found
/// on the line in ascending offset order. Inverted matches carry an empty
/// list; the line is reported for *not* matching, so there is nothing to
/// highlight.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The file the line belongs to
    pub file_path: PathBuf,
    /// 1-based line number
    pub line_number: usize,
    /// Line content without the terminator or a trailing carriage return
    pub line_content: String,
    /// All occurrences on this line, offsets ascending
    pub matches: Vec<Match>,
    /// Whether the line satisfied the full match policy
    pub matched: bool,
}

/// The aggregated outcome of a search run.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// All matching lines, sorted by `(file_path, line_number)`
    pub results: Vec<SearchResult>,
    /// Total number of matching lines across all files
    pub match_count: usize,
}

impl SearchReport {
    /// Creates a new empty report
    pub fn new() -> Self {
        Default::default()
    }

    /// Sorts results by `(file_path, line_number)` so that emitted order is
    /// independent of thread count and scheduling.
    pub fn sort(&mut self) {
        self.results.sort_unstable_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then(a.line_number.cmp(&b.line_number))
        });
    }

    /// Conventional search-tool exit status: 0 when anything matched,
    /// 1 otherwise. Warnings never affect it.
    pub fn exit_code(&self) -> i32 {
        if self.match_count > 0 {
            0
        } else {
            1
        }
    }
}
