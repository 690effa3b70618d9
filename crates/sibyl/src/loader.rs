//! Document loading.
//!
//! Thin I/O wrapper ahead of the core: reads UTF-8 text files from the
//! configured documents directory into [`Document`]s with their path
//! as the source identity. A missing directory is not an error; it
//! logs a warning and yields an empty document set.

use std::path::Path;

use sibyl_core::{Document, Result};
use walkdir::WalkDir;

/// File extensions treated as ingestible text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Loads every text document under `dir`.
///
/// # Errors
///
/// Returns an I/O error if a matching file cannot be read; unreadable
/// directory entries are skipped with a warning.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        tracing::warn!(dir = %dir.display(), "Documents directory does not exist");
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_text_file(entry.path()) {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())?;
        let source = entry.path().to_string_lossy().into_owned();
        documents.push(Document::new(text, source));
    }

    tracing::info!(dir = %dir.display(), count = documents.len(), "Loaded documents");
    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
