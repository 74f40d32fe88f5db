//! Path normalization for cross-source filename matching
//!
//! The pricing CLI and the editor may report the same file with different
//! drive-letter casing and separators on Windows. Every filename used as a
//! lookup key must pass through [`clean_filename`] first, or cross-matching
//! silently fails.

use once_cell::sync::Lazy;
use regex::Regex;

static UPPER_DRIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/([A-Z]):").unwrap());
static BARE_DRIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]:").unwrap());
static BACKSLASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+").unwrap());

/// Canonicalize a filename into the single comparable form used for all
/// map keys.
///
/// A leading `/X:` drive segment is lower-cased; a path starting with a bare
/// lower-case drive letter (`c:\foo`) has backslash runs collapsed to `/`
/// and gains a leading `/`. Applying the function twice is a no-op.
pub fn clean_filename(filename: &str) -> String {
    let mut cleaned = match UPPER_DRIVE.captures(filename) {
        Some(caps) => format!(
            "/{}{}",
            caps[1].to_ascii_lowercase(),
            &filename[2..]
        ),
        None => filename.to_string(),
    };

    if BARE_DRIVE.is_match(&cleaned) {
        cleaned = format!("/{}", BACKSLASH_RUN.replace_all(&cleaned, "/"));
    }

    cleaned
}

/// Whether a filename has the recognized source extension.
pub fn is_source_file(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| ext == "tf")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_drive_letter_is_lowered() {
        assert_eq!(clean_filename("/C:/work/main.tf"), "/c:/work/main.tf");
        assert_eq!(clean_filename("/D:/infra/vpc.tf"), "/d:/infra/vpc.tf");
    }

    #[test]
    fn test_bare_drive_backslashes_collapse() {
        assert_eq!(clean_filename(r"c:\work\main.tf"), "/c:/work/main.tf");
        assert_eq!(clean_filename(r"c:\\work\\\main.tf"), "/c:/work/main.tf");
    }

    #[test]
    fn test_unix_paths_untouched() {
        assert_eq!(clean_filename("/home/dev/main.tf"), "/home/dev/main.tf");
        // No colon after the letter: not a drive segment.
        assert_eq!(clean_filename("/Cats/main.tf"), "/Cats/main.tf");
    }

    #[test]
    fn test_clean_filename_is_idempotent() {
        for input in [
            "/C:/work/main.tf",
            r"c:\work\main.tf",
            "/home/dev/main.tf",
            "relative/path.tf",
            "",
        ] {
            let once = clean_filename(input);
            assert_eq!(clean_filename(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("/work/main.tf"));
        assert!(!is_source_file("/work/main.tf.bak"));
        assert!(!is_source_file("/work/readme.md"));
        assert!(!is_source_file("/work/tf"));
    }
}
