//! Content of newly created project notes.

use obsidian_fs::{ensure_markdown_extension, split_frontmatter};

use crate::fs::{FileSystem, FsError};
use crate::index::PROJECT_ID_KEY;

/// Extra header fields and body merged into every new project note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    /// Frontmatter lines (without delimiters), each ending in a newline
    pub header: String,
    /// Everything after the template's frontmatter
    pub body: String,
}

impl Template {
    /// Split a template note into header fields and body.
    ///
    /// A `todoist-project-id` line in the template is dropped; every note
    /// gets its own.
    pub fn parse(raw: &str) -> Self {
        let (yaml, body) = split_frontmatter(raw);

        let mut header = String::new();
        for line in yaml.unwrap_or_default().lines() {
            if line.trim_start().starts_with(&format!("{}:", PROJECT_ID_KEY)) {
                continue;
            }
            header.push_str(line);
            header.push('\n');
        }

        Self {
            header,
            body: body.to_string(),
        }
    }

    /// Load the template note at `path` (`.md` optional).
    pub async fn load<F: FileSystem>(fs: &F, path: &str) -> Result<Self, FsError> {
        let raw = fs.read_to_string(&ensure_markdown_extension(path)).await?;
        Ok(Self::parse(&raw))
    }
}

/// Build the content of a new note for `project_id`.
pub fn note_content(project_id: &str, template: Option<&Template>) -> String {
    let id_line = format!("{}: '{}'", PROJECT_ID_KEY, project_id.replace('\'', "''"));
    match template {
        None => format!("---\n{}\n---", id_line),
        Some(t) => format!("---\n{}\n{}---\n{}", id_line, t.header, t.body),
    }
}
