use crate::cli::OutputFormat;
use std::io::BufRead;
use std::path::Path;
use walkdir::WalkDir;

/// Extensions of files picked up when walking a directory.
pub(crate) const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdc", "yaml", "yml"];

/// Read file paths from stdin, one per line.
pub(crate) fn read_paths_from_stdin() -> Vec<String> {
    let stdin = std::io::stdin();
    let reader = stdin.lock();
    reader
        .lines()
        .map_while(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Expand paths, replacing "-" with paths read from stdin.
pub(crate) fn expand_paths(paths: Vec<String>, format: OutputFormat) -> Vec<String> {
    let mut expanded = Vec::new();
    let mut stdin_read = false;

    for path in paths {
        if path == "-" {
            // Only read stdin once
            if !stdin_read {
                let stdin_paths = read_paths_from_stdin();
                if format == OutputFormat::Terminal {
                    eprintln!("Read {} paths from stdin", stdin_paths.len());
                }
                expanded.extend(stdin_paths);
                stdin_read = true;
            }
        } else {
            expanded.push(path);
        }
    }

    expanded
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Replace directories with the rule documents found under them, sorted.
///
/// Explicit file arguments are kept as given, whatever their extension, so a
/// missing file is still reported by the engine.
pub(crate) fn collect_documents(paths: Vec<String>) -> Vec<String> {
    let mut files = Vec::new();
    for path in paths {
        if !Path::new(&path).is_dir() {
            files.push(path);
            continue;
        }
        let mut found: Vec<String> = WalkDir::new(&path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with(".git"))
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file() && is_document(e.path()))
            .map(|e| e.path().display().to_string())
            .collect();
        tracing::debug!("Found {} document(s) under {}", found.len(), path);
        found.sort();
        files.extend(found);
    }
    files
}
