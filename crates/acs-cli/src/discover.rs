//! Input discovery: expanding CLI paths into readable ACS exports.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expands files and directories into the list of files to parse.
///
/// Directories are walked recursively in file-name order. Files with an
/// unsupported extension are skipped silently; missing paths are logged.
pub fn discover_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            if acs_xlsx::is_supported(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            collect_dir(path, &mut files);
        } else {
            tracing::warn!(path = %path.display(), "path does not exist");
        }
    }
    files
}

fn collect_dir(dir: &Path, files: &mut Vec<PathBuf>) {
    let before = files.len();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && acs_xlsx::is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    if files.len() == before {
        tracing::debug!(dir = %dir.display(), "no ACS exports found in directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_walks_directories_recursively_in_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("b.xlsx"));
        touch(&root.join("a.XLSX"));
        touch(&root.join("notes.txt"));
        touch(&root.join("nested/deeper/c.xls"));
        touch(&root.join("nested/readme.md"));

        let files = discover_inputs(&[root.to_path_buf()]);

        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.XLSX"),
                PathBuf::from("b.xlsx"),
                PathBuf::from("nested/deeper/c.xls"),
            ]
        );
    }

    #[test]
    fn test_explicit_files_keep_argument_order() {
        let temp = TempDir::new().unwrap();
        let second = temp.path().join("z.xlsx");
        let first = temp.path().join("y.ods");
        let skipped = temp.path().join("data.csv");
        for path in [&second, &first, &skipped] {
            touch(path);
        }

        let files = discover_inputs(&[second.clone(), skipped, first.clone()]);

        assert_eq!(files, vec![second, first]);
    }

    #[test]
    fn test_missing_and_empty_paths_yield_nothing() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();

        let files = discover_inputs(&[empty, temp.path().join("missing.xlsx")]);

        assert!(files.is_empty());
    }
}
