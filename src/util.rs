#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// A glob utility function to find files with a certain extension at an exact
/// depth below `root_dir`, sorted by path.
///
/// * `extension`: the file extension to find paths for
/// * `depth`: how many directory levels sit between `root_dir` and the files
/// * `root_dir`: the root directory where search starts
pub fn find_files(extension: &str, depth: usize, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pattern = root_dir.to_path_buf();

    for _ in 0..depth {
        pattern.push("*");
    }

    pattern.push(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    let mut paths: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Name of the directory `levels` above `path`, e.g. `levels = 1` gives the
/// immediate parent's name.
pub fn ancestor_name(path: &Path, levels: usize) -> Option<String> {
    path.ancestors()
        .nth(levels)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

/// File name without its extension.
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}
