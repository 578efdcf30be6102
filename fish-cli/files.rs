use fish_core::{FishError, FishResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Regular files directly inside `dir`, as names relative to it, sorted.
///
/// Subdirectories are not descended into. A missing or non-directory `dir` is
/// a configuration error.
pub fn list_source_files(dir: &Path) -> FishResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FishError::Configuration(format!(
            "cannot find the source directory {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| FishError::io(dir, e))? {
        let entry = entry.map_err(|e| FishError::io(dir, e))?;
        // Follows symlinks, unlike DirEntry::file_type
        if entry.path().is_file() {
            files.push(PathBuf::from(entry.file_name()));
        }
    }
    files.sort();
    Ok(files)
}

/// Creates the destination directory (and parents) when absent
pub fn prepare_destination(dir: &Path) -> FishResult<()> {
    fs::create_dir_all(dir).map_err(|e| FishError::io(dir, e))
}

/// `(<dest>/<stem>_1.png, <dest>/<stem>_2.png)` where the stem drops the last extension
pub fn output_paths(dest_dir: &Path, file: &Path) -> (PathBuf, PathBuf) {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (
        dest_dir.join(format!("{stem}_1.png")),
        dest_dir.join(format!("{stem}_2.png")),
    )
}
