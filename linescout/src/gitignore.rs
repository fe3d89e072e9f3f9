use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Name of the ignore file loaded per directory.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// One parsed ignore rule.
///
/// The pattern grammar is a practical subset of the gitignore syntax:
/// `*` matches within a path component, `**` across components, `?` one
/// non-separator character, `.` only itself. A trailing `/` restricts the
/// rule to directories; an embedded `/` switches matching from the filename
/// component to the path relative to the owning scope's base.
#[derive(Debug)]
pub struct IgnoreRule {
    /// The pattern as written, minus negation marker and trailing slash
    pub pattern: String,
    /// Whether a match flips the verdict to "not ignored"
    pub negated: bool,
    dir_only: bool,
    has_separator: bool,
    regex: Regex,
}

impl IgnoreRule {
    /// Parses one ignore-file line. Returns `None` for comments, blanks and
    /// patterns that do not compile; a malformed pattern is skipped, never
    /// an error.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, line) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let (dir_only, pattern) = match line.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        if pattern.is_empty() {
            return None;
        }

        let regex = match Regex::new(&pattern_to_regex(pattern)) {
            Ok(re) => re,
            Err(e) => {
                debug!("Skipping malformed ignore pattern '{}': {}", pattern, e);
                return None;
            }
        };

        Some(Self {
            pattern: pattern.to_string(),
            negated,
            dir_only,
            has_separator: pattern.contains('/'),
            regex,
        })
    }
}

/// Translates an ignore pattern into a regex evaluated with an unanchored
/// search. Only the wildcard forms and the literal dot are rewritten; all
/// other characters pass through untouched, and patterns that end up
/// invalid are dropped by the caller.
fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '.' => out.push_str("\\."),
            _ => out.push(c),
        }
    }
    out
}

/// The ignore rules of one directory, active for that directory's subtree.
///
/// Scopes are created while descending and handed down each recursive call
/// as part of an explicit chain (`&[Arc<IgnoreScope>]`), so a scope's
/// lifetime is exactly the traversal of the directory that loaded it.
#[derive(Debug)]
pub struct IgnoreScope {
    base: PathBuf,
    rules: Vec<IgnoreRule>,
}

impl IgnoreScope {
    /// Loads `dir/.gitignore` into a scope. Returns `None` when the
    /// directory has no ignore file or it cannot be read.
    pub fn load(dir: &Path) -> Option<Arc<Self>> {
        let contents = std::fs::read_to_string(dir.join(IGNORE_FILE_NAME)).ok()?;
        Some(Arc::new(Self::from_contents(dir, &contents)))
    }

    /// Builds a scope from already-read ignore-file contents.
    pub fn from_contents(dir: &Path, contents: &str) -> Self {
        let rules = contents.lines().filter_map(IgnoreRule::parse).collect();
        Self {
            base: dir.to_path_buf(),
            rules,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Tests one rule against a candidate. A candidate outside this scope's
    /// base never matches; directory-only rules consult the real entry type.
    fn rule_matches(&self, rule: &IgnoreRule, candidate: &Path) -> bool {
        let Ok(relative) = candidate.strip_prefix(&self.base) else {
            return false;
        };

        if rule.dir_only && !candidate.is_dir() {
            return false;
        }

        if rule.has_separator {
            let rel = relative.to_string_lossy().replace('\\', "/");
            rule.regex.is_match(&rel)
        } else {
            match candidate.file_name() {
                Some(name) => rule.regex.is_match(&name.to_string_lossy()),
                None => false,
            }
        }
    }
}

/// Evaluates a candidate against every rule of every active scope, oldest
/// scope first. The last matching rule decides; negation flips a prior
/// "ignored" verdict. No match means not ignored.
pub fn is_ignored(candidate: &Path, scopes: &[Arc<IgnoreScope>]) -> bool {
    let mut ignored = false;
    for scope in scopes {
        for rule in &scope.rules {
            if scope.rule_matches(rule, candidate) {
                ignored = !rule.negated;
            }
        }
    }
    ignored
}
