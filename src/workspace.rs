//! Filesystem plumbing: enumerate inputs, prepare output directories, and
//! build the deterministic output file names.

use crate::config::OutputPolicy;
use crate::error::BandCropError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// List regular files in `dir` whose names match `pattern`, in glob
/// (alphabetical) order. Subdirectories are not searched.
pub fn list_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BandCropError> {
    if !dir.is_dir() {
        return Err(BandCropError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let full = full.to_string_lossy();

    let paths = glob::glob(&full).map_err(|e| BandCropError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;

    let files: Vec<PathBuf> = paths
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    debug!("{} files match {} in {}", files.len(), pattern, dir.display());
    Ok(files)
}

/// Make `dir` ready to receive output according to `policy`.
pub fn prepare_output_dir(dir: &Path, policy: OutputPolicy) -> Result<(), BandCropError> {
    let write_err = |source| BandCropError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source,
    };

    if dir.exists() {
        match policy {
            OutputPolicy::Clean => {
                info!("Clearing output directory {}", dir.display());
                std::fs::remove_dir_all(dir).map_err(write_err)?;
            }
            OutputPolicy::Append => {
                debug!("Appending to existing {}", dir.display());
            }
            OutputPolicy::FailIfExists => {
                return Err(BandCropError::OutputExists {
                    path: dir.to_path_buf(),
                });
            }
        }
    }

    std::fs::create_dir_all(dir).map_err(write_err)
}

/// Check that `path` is readable and starts with the `%PDF` magic bytes.
pub fn check_pdf(path: &Path) -> Result<(), BandCropError> {
    let mut f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BandCropError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(BandCropError::CorruptPdf {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    };

    let mut magic = [0u8; 4];
    if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(BandCropError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// `{stem}_page_{page}.jpg`, with `page` 1-based.
pub fn page_image_name(document: &Path, page: usize) -> String {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}_page_{page}.jpg")
}

/// `{file_name}_{index}.jpg`; the input's own extension is kept.
pub fn crop_name(input: &Path, index: usize) -> String {
    let name = input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{name}_{index}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn names_follow_fixed_scheme() {
        assert_eq!(
            page_image_name(Path::new("data/annual report.pdf"), 3),
            "annual report_page_3.jpg"
        );
        assert_eq!(
            crop_name(Path::new("output/annual report_page_3.jpg"), 0),
            "annual report_page_3.jpg_0.jpg"
        );
    }

    #[test]
    fn list_inputs_matches_pattern_only() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt", "c.PDFX"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested.pdf")).unwrap();

        let found = list_inputs(tmp.path(), "*.pdf").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn list_inputs_handles_glob_metacharacters_in_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("scans [2024]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("p.jpg"), b"x").unwrap();

        assert_eq!(list_inputs(&dir, "*.jpg").unwrap().len(), 1);
    }

    #[test]
    fn list_inputs_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = list_inputs(&tmp.path().join("absent"), "*.jpg").unwrap_err();
        assert!(matches!(err, BandCropError::DirectoryNotFound { .. }));
    }

    #[test]
    fn clean_policy_removes_stale_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("stale.jpg"), b"old").unwrap();

        prepare_output_dir(&out, OutputPolicy::Clean).unwrap();
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn append_policy_keeps_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("keep.jpg"), b"old").unwrap();

        prepare_output_dir(&out, OutputPolicy::Append).unwrap();
        assert!(out.join("keep.jpg").exists());
    }

    #[test]
    fn fail_if_exists_policy() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");

        prepare_output_dir(&out, OutputPolicy::FailIfExists).unwrap();
        assert!(out.is_dir());

        let err = prepare_output_dir(&out, OutputPolicy::FailIfExists).unwrap_err();
        assert!(matches!(err, BandCropError::OutputExists { .. }));
    }

    #[test]
    fn check_pdf_rejects_other_formats() {
        let tmp = TempDir::new().unwrap();
        let fake = tmp.path().join("fake.pdf");
        std::fs::write(&fake, b"\x89PNG....").unwrap();
        let err = check_pdf(&fake).unwrap_err();
        assert!(matches!(err, BandCropError::NotAPdf { magic, .. } if &magic == b"\x89PNG"));

        let real = tmp.path().join("real.pdf");
        std::fs::write(&real, b"%PDF-1.7\n").unwrap();
        assert!(check_pdf(&real).is_ok());
    }
}
