//! Path helpers: canonicalization of not-yet-existing paths, name sanitizing,
//! and shortening paths for display.

use crate::error::{LockdownError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters that may not appear in a local path.
pub const INVALID_PATH_CHARS: &[char] = &[
    ':', '*', '?', '"', '<', '>', '|', '[', ']', '\'', ';', '=', ',',
];

/// Default replacement for characters removed by the sanitizers.
pub const SANITIZED_CHAR: char = '_';

const OMITTED: &str = "...";
const MIN_PREFIX_LENGTH: usize = 4;
const MIN_SUFFIX_LENGTH: usize = 4;

static DRIVE_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]:").unwrap_or_else(|e| panic!("invalid drive-letter pattern: {e}"))
});

/// Canonicalize `path`, tolerating a final component that does not exist yet.
///
/// An existing path is canonicalized directly. Otherwise the parent directory is
/// canonicalized (it must exist) and the file name is joined back on, which is
/// what restricted creation needs for a target that is about to be created.
pub fn canonicalize_lenient<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let file_name = path.file_name().ok_or_else(|| LockdownError::CanonicalizationFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent =
        parent
            .canonicalize()
            .map_err(|e| LockdownError::CanonicalizationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

    Ok(canonical_parent.join(file_name))
}

/// Replace characters that cannot appear in a local file path with `substitute`.
///
/// Backslashes are normalized to `/` first. On Windows a leading drive letter
/// colon (`C:`) is preserved.
pub fn sanitize_path(path: &str, substitute: char) -> String {
    sanitize_path_for(path, substitute, cfg!(windows))
}

fn sanitize_path_for(path: &str, substitute: char, windows: bool) -> String {
    let normalized = path.replace('\\', "/");
    let keep_drive = windows && DRIVE_LETTER.is_match(&normalized);

    normalized
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if keep_drive && i == 1 {
                c
            } else if INVALID_PATH_CHARS.contains(&c) {
                substitute
            } else {
                c
            }
        })
        .collect()
}

/// Replace characters that cannot appear in a single file or directory name
/// (the path set plus both separators) with `substitute`.
pub fn sanitize_file_name(name: &str, substitute: char) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || c == '\\' || INVALID_PATH_CHARS.contains(&c) {
                substitute
            } else {
                c
            }
        })
        .collect()
}

/// Shorten a path for display so it fits in `visible_chars` characters.
///
/// Paths that already fit are returned unchanged. Otherwise the result is
/// `prefix + "..." + suffix`, with as much of each end as fits. When the budget
/// is too small to show both ends meaningfully, the tail of the path is
/// returned instead.
pub fn displayable_path(path: &str, visible_chars: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= visible_chars {
        return path.to_string();
    }

    let omitted_len = OMITTED.chars().count();
    if visible_chars < omitted_len + MIN_PREFIX_LENGTH + MIN_SUFFIX_LENGTH {
        return chars[chars.len() - visible_chars..].iter().collect();
    }

    let affix_len = (visible_chars - omitted_len) / 2;
    let prefix: String = chars[..affix_len].iter().collect();
    let suffix: String = chars[chars.len() - affix_len..].iter().collect();

    format!("{prefix}{OMITTED}{suffix}")
}
