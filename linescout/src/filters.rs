//! Include/exclude glob filtering and the binary-content heuristic.
//!
//! These run after the ignore-rule check and before a file is handed to the
//! pipeline, in the fixed order: exclude globs, include globs, binary sniff.

use glob::Pattern;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many leading bytes are sniffed for the binary heuristic.
const BINARY_CHECK_LEN: u64 = 1024;

/// Checks the file's name component against a list of glob patterns.
/// Invalid patterns never match.
pub fn matches_any_pattern(path: &Path, patterns: &[String]) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };

    patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|glob| glob.matches(name))
            .unwrap_or(false)
    })
}

/// A file is considered binary when its first 1024 bytes contain a NUL
/// byte. Unreadable files are treated as binary, matching the scanner's
/// skip-on-error posture.
pub fn is_binary_file(path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return true,
    };

    let mut buffer = Vec::with_capacity(BINARY_CHECK_LEN as usize);
    if file.take(BINARY_CHECK_LEN).read_to_end(&mut buffer).is_err() {
        return true;
    }
    buffer.contains(&0)
}

/// Applies the exclude, include and binary checks in order.
pub fn passes_filters(path: &Path, include: &[String], exclude: &[String]) -> bool {
    if matches_any_pattern(path, exclude) {
        return false;
    }
    if !include.is_empty() && !matches_any_pattern(path, include) {
        return false;
    }
    !is_binary_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_matches_any_pattern() {
        let patterns = vec!["*.rs".to_string(), "Makefile".to_string()];
        assert!(matches_any_pattern(Path::new("src/main.rs"), &patterns));
        assert!(matches_any_pattern(Path::new("Makefile"), &patterns));
        assert!(!matches_any_pattern(Path::new("src/main.py"), &patterns));
        assert!(!matches_any_pattern(Path::new("main.rs.bak"), &patterns));
    }

    #[test]
    fn test_invalid_glob_never_matches() {
        let patterns = vec!["[".to_string()];
        assert!(!matches_any_pattern(Path::new("anything"), &patterns));
    }

    #[test]
    fn test_binary_detection() {
        let dir = tempdir().unwrap();

        let text_path = dir.path().join("text.txt");
        std::fs::write(&text_path, "plain text\nlines\n").unwrap();
        assert!(!is_binary_file(&text_path));

        let bin_path = dir.path().join("blob.bin");
        let mut file = File::create(&bin_path).unwrap();
        file.write_all(b"header\x00payload").unwrap();
        assert!(is_binary_file(&bin_path));

        // A NUL past the sniff window is not seen
        let late_path = dir.path().join("late.dat");
        let mut file = File::create(&late_path).unwrap();
        file.write_all(&vec![b'a'; 2048]).unwrap();
        file.write_all(b"\x00").unwrap();
        assert!(!is_binary_file(&late_path));

        assert!(is_binary_file(&dir.path().join("missing")));
    }

    #[test]
    fn test_passes_filters_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let none: Vec<String> = vec![];
        assert!(passes_filters(&path, &none, &none));

        // Exclude wins even when an include also matches
        let include = vec!["*.rs".to_string()];
        let exclude = vec!["lib.*".to_string()];
        assert!(!passes_filters(&path, &include, &exclude));

        // With includes configured, a non-matching file is skipped
        let include = vec!["*.py".to_string()];
        assert!(!passes_filters(&path, &include, &none));
    }
}
