use anyhow::{bail, Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories the go command never builds from.
const SKIP_DIRS: &[&str] = &["testdata", "vendor"];

/// Expand `roots` into the Go source files to match, in a stable order.
///
/// Files named explicitly are always kept. Inside directories, names starting
/// with `.` or `_` are skipped, as are `testdata` and `vendor` trees.
pub fn collect_go_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("{} does not exist", root.display());
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if entry.file_type().is_file() && is_go_source(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || SKIP_DIRS.contains(&name.as_ref())
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.starts_with('.') && !name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package p\n").unwrap();
    }

    #[test]
    fn walks_packages_and_skips_ignored_trees() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for rel in [
            "a.go",
            "b_linux.go",
            "README.md",
            "_skip.go",
            ".hidden.go",
            "sub/c.go",
            "testdata/d.go",
            "vendor/e.go",
            "_old/f.go",
            ".git/g.go",
        ] {
            touch(root, rel);
        }

        let found: Vec<String> = collect_go_files(&[root.to_path_buf()])
            .unwrap()
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(found, vec!["a.go", "b_linux.go", "sub/c.go"]);
    }

    #[test]
    fn explicit_files_are_kept() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "_gen.go");
        let file = temp.path().join("_gen.go");
        assert_eq!(collect_go_files(&[file.clone()]).unwrap(), vec![file]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let err = collect_go_files(&[temp.path().join("nope")]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
