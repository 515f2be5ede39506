//! Path handling and frontmatter parsing utilities for Obsidian vaults
//!
//! Vault paths are plain `/`-separated strings relative to the vault root,
//! the same shape Obsidian's own `normalizePath` produces. The vault root
//! itself is the empty string. These are pure functions with no I/O.

mod frontmatter;

pub use frontmatter::{
    frontmatter_field, parse_frontmatter, split_frontmatter, Frontmatter, ParsedNote,
};

/// Markdown file extension (with the dot)
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Normalize a vault path.
///
/// - Backslashes become forward slashes
/// - Runs of slashes collapse into one
/// - Leading and trailing slashes are removed
/// - Non-breaking spaces become regular spaces
///
/// The vault root (`""`, `"/"`, `"//"`) normalizes to the empty string.
pub fn normalize_path(path: &str) -> String {
    let replaced: String = path
        .chars()
        .map(|c| match c {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();

    replaced
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join vault path parts, skipping empty parts, and normalize the result.
///
/// `join_path(&["/", "Projects"])` is `"Projects"`: a root of `/` means the
/// vault root.
pub fn join_path(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|part| normalize_path(part))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    normalize_path(&joined)
}

/// Returns true if `path` is `prefix` itself or lies below it.
///
/// Both arguments must already be normalized. An empty prefix (the vault
/// root) contains everything.
pub fn is_within(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parent folder of a normalized path ("" for top-level entries).
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// File name of a note without folder and without `.md`.
///
/// `"Projects/Work/Website.md"` becomes `"Website"`.
pub fn note_basename(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    strip_markdown_extension(name)
}

/// Ensure .md extension on note paths
pub fn ensure_markdown_extension(note_path: &str) -> String {
    if is_markdown(note_path) {
        note_path.to_string()
    } else {
        format!("{}{}", note_path, MARKDOWN_EXTENSION)
    }
}

/// Strip the .md extension if present
pub fn strip_markdown_extension(note_path: &str) -> &str {
    note_path
        .strip_suffix(MARKDOWN_EXTENSION)
        .unwrap_or(note_path)
}

/// Whether the path names a markdown note
pub fn is_markdown(path: &str) -> bool {
    path.ends_with(MARKDOWN_EXTENSION)
}

/// Whether any component of the path is hidden (`.obsidian`, `.trash`, ...)
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Validate that a relative path is safe (no directory traversal)
pub fn validate_relative_path(path: &str) -> Result<String, PathValidationError> {
    let clean_path = normalize_path(path);

    if clean_path.split('/').any(|segment| segment == "..") {
        return Err(PathValidationError::DirectoryTraversal);
    }

    Ok(clean_path)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathValidationError {
    DirectoryTraversal,
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathValidationError::DirectoryTraversal => {
                write!(f, "Path contains directory traversal")
            }
        }
    }
}

impl std::error::Error for PathValidationError {}
