//! Source discovery.
//!
//! Resolves the `--source` argument into the list of images to convert.
//! The source is either a single image file or a directory:
//!
//! ```text
//! photos/                       # source directory
//! ├── config.toml               # ignored (not an image)
//! ├── dawn.jpg                  # → SourceImage { stem: "dawn", relative_dir: "" }
//! ├── c64_dawn_CIE2000.png      # skipped: one of our own outputs
//! ├── .thumbs/                  # skipped: hidden
//! └── trips/                    # only visited with `recursive = true`
//!     └── rome.png              # → SourceImage { stem: "rome", relative_dir: "trips" }
//! ```
//!
//! Results are sorted by path so runs are reproducible. Two sources whose
//! outputs would share a name (same folder and stem, different extension)
//! are rejected with [`ScanError::StemCollision`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::naming;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source not found: {0}")]
    NotFound(PathBuf),
    #[error("Not a supported image type: {0}")]
    Unsupported(PathBuf),
    #[error("{} and {} would write the same output files", .first.display(), .second.display())]
    StemCollision { first: PathBuf, second: PathBuf },
}

/// One image to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    /// Directory of the image relative to the scan root (empty at the root).
    pub relative_dir: PathBuf,
    /// File name without extension; the base of every output name.
    pub stem: String,
}

impl SourceImage {
    /// Path relative to the scan root, for display.
    pub fn relative_path(&self) -> PathBuf {
        match self.path.file_name() {
            Some(name) => self.relative_dir.join(name),
            None => self.path.clone(),
        }
    }
}

/// What to pick up while scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lower-case extensions without the dot.
    pub extensions: Vec<String>,
    pub recursive: bool,
    /// Output prefix; files named like our outputs are skipped.
    pub output_prefix: String,
}

/// Find every source image under `source`.
pub fn scan(source: &Path, options: &ScanOptions) -> Result<Vec<SourceImage>, ScanError> {
    if !source.exists() {
        return Err(ScanError::NotFound(source.to_path_buf()));
    }

    if source.is_file() {
        if !has_image_extension(source, &options.extensions) {
            return Err(ScanError::Unsupported(source.to_path_buf()));
        }
        return Ok(vec![source_image(source, Path::new(""))]);
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();
    for entry in WalkDir::new(source)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_image_extension(path, &options.extensions) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if naming::is_output_name(&options.output_prefix, &file_name) {
            continue;
        }
        let relative_dir = path
            .parent()
            .and_then(|dir| dir.strip_prefix(source).ok())
            .unwrap_or(Path::new(""));
        images.push(source_image(path, relative_dir));
    }

    images.sort_by(|a, b| a.path.cmp(&b.path));
    check_collisions(&images)?;
    Ok(images)
}

/// Reject two sources that differ only by extension (`dawn.jpg`, `dawn.png`).
fn check_collisions(images: &[SourceImage]) -> Result<(), ScanError> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    for image in images {
        if let Some(first) = claimed.insert(image.relative_dir.join(&image.stem), &image.path) {
            return Err(ScanError::StemCollision {
                first: first.to_path_buf(),
                second: image.path.clone(),
            });
        }
    }
    Ok(())
}

fn source_image(path: &Path, relative_dir: &Path) -> SourceImage {
    SourceImage {
        path: path.to_path_buf(),
        relative_dir: relative_dir.to_path_buf(),
        stem: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    !ext.is_empty() && extensions.iter().any(|allowed| *allowed == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(recursive: bool) -> ScanOptions {
        ScanOptions {
            extensions: ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect(),
            recursive,
            output_prefix: "c64_".to_string(),
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn stems(images: &[SourceImage]) -> Vec<&str> {
        images.iter().map(|i| i.stem.as_str()).collect()
    }

    // =========================================================================
    // Directory scans
    // =========================================================================

    #[test]
    fn finds_images_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("b.png"));
        touch(&tmp.path().join("a.jpg"));
        touch(&tmp.path().join("c.JPEG"));

        let images = scan(tmp.path(), &options(false)).unwrap();
        assert_eq!(stems(&images), vec!["a", "b", "c"]);
        assert!(images.iter().all(|i| i.relative_dir == Path::new("")));
    }

    #[test]
    fn skips_other_files() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("photo.jpg"));
        touch(&tmp.path().join("notes.txt"));
        touch(&tmp.path().join("config.toml"));
        touch(&tmp.path().join("README"));

        let images = scan(tmp.path(), &options(false)).unwrap();
        assert_eq!(stems(&images), vec!["photo"]);
    }

    #[test]
    fn skips_own_outputs() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("dawn.jpg"));
        touch(&tmp.path().join("c64_dawn_RGB.png"));
        touch(&tmp.path().join("c64_dawn_CIE2000.png"));

        let images = scan(tmp.path(), &options(false)).unwrap();
        assert_eq!(stems(&images), vec!["dawn"]);
    }

    #[test]
    fn skips_hidden_entries() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join(".hidden.png"));
        touch(&tmp.path().join(".cache/inner.png"));
        touch(&tmp.path().join("shown.png"));

        let images = scan(tmp.path(), &options(true)).unwrap();
        assert_eq!(stems(&images), vec!["shown"]);
    }

    #[test]
    fn non_recursive_ignores_subdirectories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("top.png"));
        touch(&tmp.path().join("trips/rome.png"));

        let images = scan(tmp.path(), &options(false)).unwrap();
        assert_eq!(stems(&images), vec!["top"]);
    }

    #[test]
    fn recursive_records_relative_dir() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("top.png"));
        touch(&tmp.path().join("trips/rome/forum.jpg"));

        let images = scan(tmp.path(), &options(true)).unwrap();
        assert_eq!(images.len(), 2);
        let forum = images.iter().find(|i| i.stem == "forum").unwrap();
        assert_eq!(forum.relative_dir, Path::new("trips/rome"));
        let top = images.iter().find(|i| i.stem == "top").unwrap();
        assert_eq!(top.relative_dir, Path::new(""));
    }

    #[test]
    fn same_stem_in_one_folder_is_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("dawn.jpg"));
        touch(&tmp.path().join("dawn.png"));

        let err = scan(tmp.path(), &options(false)).unwrap_err();
        match err {
            ScanError::StemCollision { first, second } => {
                assert_eq!(first, tmp.path().join("dawn.jpg"));
                assert_eq!(second, tmp.path().join("dawn.png"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn same_stem_in_different_folders_is_fine() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("dawn.jpg"));
        touch(&tmp.path().join("trips/dawn.png"));

        let images = scan(tmp.path(), &options(true)).unwrap();
        assert_eq!(stems(&images), vec!["dawn", "dawn"]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path(), &options(true)).unwrap().is_empty());
    }

    // =========================================================================
    // Single files and errors
    // =========================================================================

    #[test]
    fn single_file_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("solo.png");
        touch(&path);

        let images = scan(&path, &options(false)).unwrap();
        assert_eq!(
            images,
            vec![SourceImage {
                path: path.clone(),
                relative_dir: PathBuf::new(),
                stem: "solo".to_string(),
            }]
        );
    }

    #[test]
    fn single_file_with_unknown_extension_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        touch(&path);

        let err = scan(&path, &options(false)).unwrap_err();
        assert!(matches!(err, ScanError::Unsupported(p) if p == path));
    }

    #[test]
    fn missing_source_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope");
        let err = scan(&path, &options(false)).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(p) if p == path));
    }
}
