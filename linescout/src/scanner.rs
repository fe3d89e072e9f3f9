//! Filesystem traversal and file-content acquisition.
//!
//! The scanner walks each configured root depth-first, deciding visibility
//! per entry (ignore rules, then exclude/include globs, then the binary
//! heuristic) and invoking a visit callback for every surviving file. The
//! active ignore scopes travel down the recursion as an explicit chain of
//! shared handles, so a scope's lifetime is exactly the stack frame of the
//! directory that loaded it.
//!
//! Content acquisition lives here too ([`read_file`], [`split_lines`]) but
//! touches no traversal state, so pipeline workers call it freely.

use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::{self, File, Metadata};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::SearchConfig;
use crate::errors::{Result, SearchError};
use crate::filters;
use crate::gitignore::{self, IgnoreScope};

// Files above this size are read through the buffered fallback instead of
// a mapped view. A strategy choice only; observable content is identical.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB
const BUFFER_CAPACITY: usize = 65536;

/// Classification of a visited filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Other,
}

impl From<std::fs::FileType> for EntryType {
    fn from(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::File
        } else if ft.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

/// Metadata record identifying a visited entry, independent of content.
/// Created at visit time and handed to the pipeline; never persisted.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub entry_type: EntryType,
}

impl FileDescriptor {
    fn new(path: &Path, metadata: &Metadata) -> Self {
        Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            is_directory: metadata.is_dir(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            entry_type: EntryType::from(metadata.file_type()),
        }
    }
}

/// One line of decoded file content.
///
/// `content` excludes the line feed and any trailing carriage return;
/// `start_offset..end_offset` spans the raw segment (before CR stripping)
/// within the decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 1-based, strictly increasing per file
    pub line_number: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub content: String,
}

/// Walks the configured roots and reports every visible file.
pub struct FileScanner<'a> {
    config: &'a SearchConfig,
    seed_scopes: Vec<Arc<IgnoreScope>>,
}

impl<'a> FileScanner<'a> {
    /// Creates a scanner, seeding the ignore chain with the ignore file of
    /// the nearest ancestor directory that contains a `.git` entry, when
    /// the current directory sits inside such a tree.
    pub fn new(config: &'a SearchConfig) -> Self {
        Self {
            config,
            seed_scopes: find_repository_scope().into_iter().collect(),
        }
    }

    /// Walks every configured root path, invoking `visit` for each file
    /// that survives filtering. All traversal failures are warnings; the
    /// walk always continues with whatever remains.
    pub fn scan(&self, visit: &mut dyn FnMut(FileDescriptor)) {
        for path in &self.config.paths {
            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(_) => {
                    warn!("{}", SearchError::path_not_found(path));
                    continue;
                }
            };

            if metadata.is_dir() {
                if self.config.recursive {
                    self.scan_directory(path, 0, &self.seed_scopes, visit);
                } else {
                    warn!("{}", SearchError::directory_skipped(path));
                }
            } else if metadata.is_file()
                && !gitignore::is_ignored(path, &self.seed_scopes)
                && self.passes_filters(path)
            {
                visit(FileDescriptor::new(path, &metadata));
            }
        }
    }

    /// Recursive descent. `scopes` is the caller's active ignore chain; a
    /// directory carrying its own ignore file extends the chain for its
    /// children only.
    fn scan_directory(
        &self,
        dir: &Path,
        depth: usize,
        scopes: &[Arc<IgnoreScope>],
        visit: &mut dyn FnMut(FileDescriptor),
    ) {
        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return;
            }
        }

        let extended;
        let active: &[Arc<IgnoreScope>] = match IgnoreScope::load(dir) {
            Some(scope) => {
                trace!("Loaded ignore scope for {}", dir.display());
                extended = scopes
                    .iter()
                    .cloned()
                    .chain(std::iter::once(scope))
                    .collect::<Vec<_>>();
                &extended
            }
            None => scopes,
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}", SearchError::traversal_error(dir, e));
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("{}", SearchError::traversal_error(dir, e));
                    continue;
                }
            };
            let path = entry.path();

            // Ignored entries are skipped entirely; ignored directories are
            // never descended into.
            if gitignore::is_ignored(&path, active) {
                continue;
            }

            if path.is_dir() {
                self.scan_directory(&path, depth + 1, active, visit);
            } else if path.is_file() && self.passes_filters(&path) {
                match fs::metadata(&path) {
                    Ok(metadata) => visit(FileDescriptor::new(&path, &metadata)),
                    Err(e) => warn!("{}", SearchError::traversal_error(&path, e)),
                }
            }
        }
    }

    fn passes_filters(&self, path: &Path) -> bool {
        filters::passes_filters(
            path,
            &self.config.include_patterns,
            &self.config.exclude_patterns,
        )
    }
}

/// Walks up from the current directory looking for a `.git` entry and
/// loads that directory's ignore file as the root scope, if both exist.
fn find_repository_scope() -> Option<Arc<IgnoreScope>> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        if dir.join(".git").exists() {
            return IgnoreScope::load(&dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Reads a file's full content as text.
///
/// Files at or below [`LARGE_FILE_THRESHOLD`] are copied out of a memory-
/// mapped view; the mapping is dropped before this function returns, on
/// every exit path. Larger files, and files whose mapping fails, fall back
/// to buffered sequential reads. An empty file yields an empty string.
pub fn read_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| SearchError::unreadable_file(path, e))?;
    let metadata = file
        .metadata()
        .map_err(|e| SearchError::unreadable_file(path, e))?;

    if metadata.len() == 0 {
        return Ok(String::new());
    }

    if metadata.len() <= LARGE_FILE_THRESHOLD {
        match unsafe { Mmap::map(&file) } {
            Ok(mmap) => return Ok(decode_lossy(&mmap, path)),
            Err(e) => {
                debug!(
                    "Mapping failed for {}, using buffered read: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| SearchError::unreadable_file(path, e))?;
    Ok(decode_lossy(&bytes, path))
}

fn decode_lossy(bytes: &[u8], path: &Path) -> String {
    let cow = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = cow {
        warn!("Invalid UTF-8 replaced in file: {}", path.display());
    }
    cow.into_owned()
}

/// Splits decoded content into [`LineRecord`]s: line-feed separated,
/// 1-based numbering, one trailing carriage return stripped per line, the
/// final unterminated line included.
pub fn split_lines(content: &str) -> Vec<LineRecord> {
    let mut lines = Vec::new();
    let mut pos = 0;
    let mut line_number = 1;

    while pos < content.len() {
        let end = match content[pos..].find('\n') {
            Some(offset) => pos + offset,
            None => content.len(),
        };

        let mut text = &content[pos..end];
        if let Some(stripped) = text.strip_suffix('\r') {
            text = stripped;
        }

        lines.push(LineRecord {
            line_number,
            start_offset: pos,
            end_offset: end,
            content: text.to_string(),
        });

        pos = end + 1;
        line_number += 1;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    fn config_for(dir: &Path) -> SearchConfig {
        SearchConfig {
            pattern: "x".to_string(),
            paths: vec![dir.to_path_buf()],
            ..Default::default()
        }
    }

    fn visited_names(config: &SearchConfig) -> BTreeSet<String> {
        let scanner = FileScanner::new(config);
        let mut names = BTreeSet::new();
        scanner.scan(&mut |fd| {
            names.insert(fd.name.clone());
        });
        names
    }

    #[test]
    fn test_scan_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.txt");
        fs::write(&file, "hello\n").unwrap();

        let config = SearchConfig {
            paths: vec![file.clone()],
            ..config_for(dir.path())
        };
        let names = visited_names(&config);
        assert_eq!(names, BTreeSet::from(["only.txt".to_string()]));
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let dir = tempdir().unwrap();
        let config = SearchConfig {
            paths: vec![dir.path().join("absent")],
            ..config_for(dir.path())
        };
        assert!(visited_names(&config).is_empty());
    }

    #[test]
    fn test_directory_skipped_without_recursion() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("inside.txt"), "x\n").unwrap();

        let config = SearchConfig {
            recursive: false,
            ..config_for(dir.path())
        };
        assert!(visited_names(&config).is_empty());
    }

    #[test]
    fn test_max_depth_prunes_subdirectories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), "x\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/deep.txt"), "x\n").unwrap();

        let config = SearchConfig {
            max_depth: Some(0),
            ..config_for(dir.path())
        };
        assert_eq!(visited_names(&config), BTreeSet::from(["top.txt".to_string()]));

        let config = config_for(dir.path());
        assert_eq!(
            visited_names(&config),
            BTreeSet::from(["top.txt".to_string(), "deep.txt".to_string()])
        );
    }

    #[test]
    fn test_ignore_scope_lifetime_matches_directory() {
        let dir = tempdir().unwrap();
        // sub/ ignores *.txt; the sibling directory must not be affected.
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/.gitignore"), "*.txt\n").unwrap();
        fs::write(dir.path().join("sub/hidden.txt"), "x\n").unwrap();
        fs::create_dir(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("other/visible.txt"), "x\n").unwrap();

        let names = visited_names(&config_for(dir.path()));
        assert!(names.contains("visible.txt"));
        assert!(!names.contains("hidden.txt"));
    }

    #[test]
    fn test_ignored_directory_is_not_descended() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();
        fs::create_dir(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/artifact.txt"), "x\n").unwrap();

        let names = visited_names(&config_for(dir.path()));
        assert!(!names.contains("artifact.txt"));
    }

    #[test]
    fn test_include_exclude_filtering() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "x\n").unwrap();
        fs::write(dir.path().join("b.py"), "x\n").unwrap();
        fs::write(dir.path().join("c.tmp"), "x\n").unwrap();

        let config = SearchConfig {
            include_patterns: vec!["*.rs".to_string(), "*.tmp".to_string()],
            exclude_patterns: vec!["*.tmp".to_string()],
            ..config_for(dir.path())
        };
        assert_eq!(visited_names(&config), BTreeSet::from(["a.rs".to_string()]));
    }

    #[test]
    fn test_read_file_empty_and_content() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty");
        fs::write(&empty, b"").unwrap();
        assert_eq!(read_file(&empty).unwrap(), "");

        let small = dir.path().join("small.txt");
        fs::write(&small, "line one\nline two\n").unwrap();
        assert_eq!(read_file(&small).unwrap(), "line one\nline two\n");

        assert!(read_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_split_lines_numbers_and_cr() {
        let lines = split_lines("alpha\r\nbeta\ngamma");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].content, "alpha");
        assert_eq!(lines[1].content, "beta");
        assert_eq!(lines[2].line_number, 3);
        assert_eq!(lines[2].content, "gamma");

        // Offsets span the raw segment, before CR stripping
        assert_eq!(lines[0].start_offset, 0);
        assert_eq!(lines[0].end_offset, 6);
        assert_eq!(lines[2].end_offset, 18);

        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_split_lines_round_trip() {
        // Joining the contents with line feeds reproduces the original
        // minus carriage returns and a final terminator.
        let original = "one\r\ntwo\nthree\r\nfour";
        let lines = split_lines(original);
        let joined = lines
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(joined, "one\ntwo\nthree\nfour");

        let terminated = "one\ntwo\n";
        let joined = split_lines(terminated)
            .iter()
            .map(|l| l.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(format!("{joined}\n"), terminated);
    }
}
