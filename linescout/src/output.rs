use colored::Colorize;
use std::io::IsTerminal;

use crate::config::{ColorMode, SearchConfig};
use crate::results::SearchResult;

/// Renders one search result as a single output line:
/// `[<path>:][<line_number>:]<line_content>`.
///
/// With color enabled the path, line number and match substrings each get
/// their own SGR pair. Match highlighting rewrites the line from the
/// rightmost match to the leftmost so that earlier offsets are not
/// invalidated by the length-changing substitutions.
///
/// Whether the `colored` crate actually emits codes is also subject to its
/// process-global override; callers that resolve the policy to "on" should
/// force it (see [`OutputFormatter::color_enabled`]).
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    show_filename: bool,
    show_line_number: bool,
    color: bool,
}

impl OutputFormatter {
    /// Captures the display toggles and resolves the color policy once:
    /// `Always` is on, `Never` off, `Auto` on only when stdout is an
    /// interactive terminal.
    pub fn new(config: &SearchConfig) -> Self {
        let color = match config.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        };
        Self {
            show_filename: config.show_filename,
            show_line_number: config.show_line_number,
            color,
        }
    }

    /// The resolved color decision, for callers that need to force the
    /// global `colored` override before printing.
    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn format(&self, result: &SearchResult) -> String {
        let mut out = String::new();

        if self.show_filename {
            let path = result.file_path.display().to_string();
            if self.color {
                out.push_str(&path.blue().to_string());
            } else {
                out.push_str(&path);
            }
            out.push(':');
        }

        if self.show_line_number {
            let number = result.line_number.to_string();
            if self.color {
                out.push_str(&number.green().to_string());
            } else {
                out.push_str(&number);
            }
            out.push(':');
        }

        out.push_str(&self.highlighted_content(result));
        out
    }

    fn highlighted_content(&self, result: &SearchResult) -> String {
        if !self.color || result.matches.is_empty() {
            return result.line_content.clone();
        }

        let mut line = result.line_content.clone();
        let mut matches: Vec<_> = result.matches.iter().collect();
        matches.sort_by(|a, b| b.start.cmp(&a.start));

        for m in matches {
            if m.end > line.len() || m.start > m.end {
                continue;
            }
            let highlighted = line[m.start..m.end].red().to_string();
            line.replace_range(m.start..m.end, &highlighted);
        }
        line
    }
}
