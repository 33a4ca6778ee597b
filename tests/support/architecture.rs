//! Source scanning for the layering rules in `architecture_contract_tests`.

use std::fs;
use std::path::{Path, PathBuf};

/// A source line that broke a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub file: String,
    pub line: usize,
    pub text: String,
}

fn crate_root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries =
        fs::read_dir(dir).unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

/// Every `.rs` file under `dir` with its crate-relative path, sorted.
fn sources(dir: &str) -> Vec<(String, String)> {
    let mut files = Vec::new();
    walk(&crate_root().join(dir), &mut files);
    files.sort();
    files
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
            let relative = path
                .strip_prefix(crate_root())
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            (relative, content)
        })
        .collect()
}

/// Lines under `dir` containing any of `needles`.
pub fn find_lines_containing(dir: &str, needles: &[&str]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (file, content) in sources(dir) {
        for (idx, text) in content.lines().enumerate() {
            if needles.iter().any(|needle| text.contains(needle)) {
                hits.push(Hit {
                    file: file.clone(),
                    line: idx + 1,
                    text: text.to_string(),
                });
            }
        }
    }
    hits
}

/// Lines of `mod.rs` files under `dir` that declare more than modules and
/// re-exports.
pub fn find_non_export_lines_in_mod_files(dir: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (file, content) in sources(dir) {
        if !file.ends_with("/mod.rs") {
            continue;
        }
        let mut open_use = false;
        for (idx, text) in content.lines().enumerate() {
            let line = text.trim();
            if open_use || line.starts_with("pub use ") {
                open_use = !line.ends_with(';');
                continue;
            }
            let allowed = line.is_empty()
                || line.starts_with("//")
                || line.starts_with("#[cfg")
                || line.starts_with("pub mod ")
                || line.starts_with("mod ");
            if !allowed {
                hits.push(Hit {
                    file: file.clone(),
                    line: idx + 1,
                    text: text.to_string(),
                });
            }
        }
    }
    hits
}

pub fn path_exists(relative: &str) -> bool {
    crate_root().join(relative).exists()
}

pub fn read_relative(relative: &str) -> String {
    fs::read_to_string(crate_root().join(relative))
        .unwrap_or_else(|e| panic!("cannot read {relative}: {e}"))
}
