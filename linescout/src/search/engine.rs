//! The concurrent producer/worker pipeline.
//!
//! One producer (the calling thread, running the scanner) feeds file
//! descriptors into a channel; a fixed pool of worker threads drains it,
//! reads and matches each file, and accumulates results locally. The
//! channel closes when the producer drops its sender, so workers terminate
//! exactly when scanning is complete and the backlog is drained, with no
//! completion flag or condition variable. After the workers join, the
//! local accumulators are merged and sorted, making the emitted order
//! independent of thread count and scheduling.

use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::matcher::{self, Matcher};
use crate::config::{SearchConfig, SearchMode};
use crate::errors::Result;
use crate::results::{SearchReport, SearchResult};
use crate::scanner::{self, FileDescriptor, FileScanner, LineRecord};

/// Runs a full search: validates, builds the matcher, scans, matches,
/// aggregates. Returns the sorted report.
///
/// Configuration validation and matcher construction happen before any
/// file is touched; an invalid pattern therefore produces no partial
/// output. Everything after that point recovers locally.
pub fn search(config: &SearchConfig) -> Result<SearchReport> {
    config.validate()?;

    let mode = config.mode();
    let matcher: Option<Arc<dyn Matcher>> = match mode {
        SearchMode::Literal => None,
        SearchMode::Pattern => Some(matcher::build_matcher(config.engine, &config.pattern, false)?),
        SearchMode::CaseInsensitive => {
            Some(matcher::build_matcher(config.engine, &config.pattern, true)?)
        }
    };

    let thread_count = config.resolved_thread_count().get();
    info!(
        "Starting search for '{}' with {} worker threads",
        config.pattern, thread_count
    );

    let (tx, rx): (Sender<FileDescriptor>, Receiver<FileDescriptor>) =
        crossbeam_channel::unbounded();
    let match_count = AtomicUsize::new(0);
    let mut results: Vec<SearchResult> = Vec::new();

    thread::scope(|scope| {
        let mut workers = Vec::with_capacity(thread_count);
        for _ in 0..thread_count {
            let rx = rx.clone();
            let matcher = matcher.clone();
            let counter = &match_count;
            workers.push(scope.spawn(move || {
                let mut local: Vec<SearchResult> = Vec::new();
                for descriptor in rx {
                    process_file(config, matcher.as_deref(), &descriptor, counter, &mut local);
                }
                local
            }));
        }
        drop(rx);

        // The producer runs on this thread; dropping the sender afterwards
        // closes the channel and lets the workers drain out.
        let scanner = FileScanner::new(config);
        scanner.scan(&mut |descriptor| {
            let _ = tx.send(descriptor);
        });
        drop(tx);

        for worker in workers {
            match worker.join() {
                Ok(local) => results.extend(local),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    results.par_sort_unstable_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.line_number.cmp(&b.line_number))
    });

    let match_count = match_count.load(Ordering::Relaxed);
    info!(
        "Search complete: {} matching lines in {} files",
        match_count,
        results
            .iter()
            .map(|r| &r.file_path)
            .collect::<std::collections::HashSet<_>>()
            .len()
    );

    Ok(SearchReport {
        results,
        match_count,
    })
}

/// Reads one file and evaluates the match policy per line, appending to the
/// worker's local accumulator. Read failures are warnings; the file simply
/// contributes nothing.
fn process_file(
    config: &SearchConfig,
    matcher: Option<&dyn Matcher>,
    descriptor: &FileDescriptor,
    counter: &AtomicUsize,
    out: &mut Vec<SearchResult>,
) {
    let content = match scanner::read_file(&descriptor.path) {
        Ok(content) => content,
        Err(e) => {
            warn!("{}", e);
            return;
        }
    };

    debug!("Searching {} ({} bytes)", descriptor.path.display(), content.len());

    for line in scanner::split_lines(&content) {
        if let Some(result) = match_line(config, matcher, &descriptor.path, &line) {
            counter.fetch_add(1, Ordering::Relaxed);
            out.push(result);
        }
    }
}

/// The per-line match policy, applied in order: mode selection, word
/// filter, whole-line override, inversion.
fn match_line(
    config: &SearchConfig,
    matcher: Option<&dyn Matcher>,
    path: &Path,
    line: &LineRecord,
) -> Option<SearchResult> {
    let mode = config.mode();

    let mut matches = match (mode, matcher) {
        (SearchMode::Literal, _) => {
            matcher::literal_find_all(&line.content, &config.pattern, config.ignore_case)
        }
        (_, Some(matcher)) => matcher.find_all(&line.content),
        // Pattern modes always carry a matcher; `search` builds it up front.
        (_, None) => Vec::new(),
    };
    let mut matched = !matches.is_empty();

    if matched && config.word_match {
        matches.retain(|m| matcher::is_word_bounded(&line.content, m.start, m.end));
        matched = !matches.is_empty();
    }

    if matched && config.line_match {
        matched = match (mode, matcher) {
            (SearchMode::Literal, _) => {
                matcher::literal_line_match(&line.content, &config.pattern, config.ignore_case)
            }
            (_, Some(matcher)) => matcher.matches(&line.content),
            (_, None) => false,
        };
    }

    if config.invert_match {
        matched = !matched;
        // A line reported for not matching has nothing to highlight.
        matches.clear();
    }

    if !matched {
        return None;
    }

    Some(SearchResult {
        file_path: path.to_path_buf(),
        line_number: line.line_number,
        line_content: line.content.clone(),
        matches,
        matched: true,
    })
}
