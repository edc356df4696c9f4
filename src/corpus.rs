//! Document discovery for the active test suite.

use std::io;
use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["svg", "svgz"];

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Collect every document under `dir`, recursively, sorted by path.
///
/// Symbolic links are skipped, both for files and directories.
pub fn discover(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    collect(dir, &mut documents)?;
    documents.sort();
    log::debug!("Discovered {} documents under {:?}", documents.len(), dir);
    Ok(documents)
}

fn collect(dir: &Path, documents: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)?.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            collect(&path, documents)?;
        } else if file_type.is_file() && is_document(&path) {
            documents.push(path);
        }
    }
    Ok(())
}

/// Short name of a document: its two enclosing directory names and the file
/// name, joined with `/` (for example `structure/svg/rect-01.svg`).
pub fn base_name(path: &Path) -> String {
    let mut parts: Vec<String> = path
        .ancestors()
        .take(3)
        .filter_map(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    parts.reverse();
    parts.join("/")
}
