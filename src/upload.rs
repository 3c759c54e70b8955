//! Attachment storage under `uploads/<entity>/<id>/`

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{UploadSettings, UPLOADS_DIR};
use crate::error::{InnoventoryError, Result};
use crate::store::EntityKind;

pub fn record_dir(data_dir: &Path, kind: EntityKind, id: u32) -> PathBuf {
    data_dir
        .join(UPLOADS_DIR)
        .join(kind.plural())
        .join(id.to_string())
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Check existence, size and type; returns the file size
pub fn validate_upload(path: &Path, settings: &UploadSettings) -> Result<u64> {
    let meta = fs::metadata(path).map_err(|_| InnoventoryError::UploadNotFound(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(InnoventoryError::UploadNotFound(path.to_path_buf()));
    }

    let size = meta.len();
    if size == 0 {
        return Err(InnoventoryError::UploadEmpty {
            path: path.to_path_buf(),
        });
    }
    let max = settings.max_bytes();
    if size > max {
        return Err(InnoventoryError::UploadTooLarge {
            path: path.to_path_buf(),
            size,
            max,
        });
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let extension = extension_of(name).unwrap_or_default();
    let allowed = settings
        .allowed_extensions
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&extension));
    if !allowed {
        return Err(InnoventoryError::UploadType {
            extension,
            allowed: settings.allowed_extensions.join(", "),
        });
    }
    Ok(size)
}

/// First free name in `dir`: "a.pdf", then "a (1).pdf", "a (2).pdf", ...
pub fn unique_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut n = 1;
    loop {
        let candidate = format!("{stem} ({n}){suffix}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Copy a validated file into the record's upload directory; returns the stored name
pub fn store_upload(
    data_dir: &Path,
    kind: EntityKind,
    id: u32,
    source: &Path,
    settings: &UploadSettings,
) -> Result<String> {
    let size = validate_upload(source, settings)?;
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| InnoventoryError::UploadNotFound(source.to_path_buf()))?;

    let dir = record_dir(data_dir, kind, id);
    fs::create_dir_all(&dir)?;
    let stored = unique_name(&dir, file_name);
    fs::copy(source, dir.join(&stored))?;

    tracing::info!(entity = %kind, id, file = %stored, size, "stored upload");
    Ok(stored)
}

pub fn remove_upload(data_dir: &Path, kind: EntityKind, id: u32, stored_name: &str) -> Result<()> {
    let path = record_dir(data_dir, kind, id).join(stored_name);
    if path.exists() {
        fs::remove_file(&path)?;
    } else {
        tracing::warn!(path = %path.display(), "attachment already missing on disk");
    }
    Ok(())
}

/// Drop every upload of a record (used by hard delete)
pub fn remove_all(data_dir: &Path, kind: EntityKind, id: u32) -> Result<()> {
    let dir = record_dir(data_dir, kind, id);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "removed uploads");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> UploadSettings {
        UploadSettings {
            max_size_mb: 1,
            allowed_extensions: vec!["pdf".to_string(), ".png".to_string()],
        }
    }

    fn write(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![b'x'; bytes]).unwrap();
        path
    }

    #[test]
    fn duplicate_names_get_numbered_suffixes() {
        let data = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let file = write(src.path(), "deed.pdf", 10);

        let names: Vec<String> = (0..3)
            .map(|_| store_upload(data.path(), EntityKind::Vendor, 1, &file, &settings()).unwrap())
            .collect();
        assert_eq!(names, vec!["deed.pdf", "deed (1).pdf", "deed (2).pdf"]);
        assert!(record_dir(data.path(), EntityKind::Vendor, 1)
            .join("deed (2).pdf")
            .exists());
    }

    #[test]
    fn unique_name_without_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README", 1);
        assert_eq!(unique_name(dir.path(), "README"), "README (1)");
    }

    #[test]
    fn extension_check_ignores_case_and_dots() {
        let src = TempDir::new().unwrap();
        assert!(validate_upload(&write(src.path(), "scan.PNG", 5), &settings()).is_ok());
        let err = validate_upload(&write(src.path(), "run.exe", 5), &settings()).unwrap_err();
        assert!(matches!(err, InnoventoryError::UploadType { .. }));
    }

    #[test]
    fn size_limits_are_enforced() {
        let src = TempDir::new().unwrap();
        let big = write(src.path(), "big.pdf", 1024 * 1024 + 1);
        assert!(matches!(
            validate_upload(&big, &settings()),
            Err(InnoventoryError::UploadTooLarge { .. })
        ));
        let empty = write(src.path(), "empty.pdf", 0);
        assert!(matches!(
            validate_upload(&empty, &settings()),
            Err(InnoventoryError::UploadEmpty { .. })
        ));
    }

    #[test]
    fn missing_or_directory_source_is_rejected() {
        let src = TempDir::new().unwrap();
        assert!(matches!(
            validate_upload(&src.path().join("nope.pdf"), &settings()),
            Err(InnoventoryError::UploadNotFound(_))
        ));
        assert!(matches!(
            validate_upload(src.path(), &settings()),
            Err(InnoventoryError::UploadNotFound(_))
        ));
    }

    #[test]
    fn remove_all_clears_record_dir() {
        let data = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let file = write(src.path(), "po.pdf", 3);
        store_upload(data.path(), EntityKind::Order, 4, &file, &settings()).unwrap();
        remove_all(data.path(), EntityKind::Order, 4).unwrap();
        assert!(!record_dir(data.path(), EntityKind::Order, 4).exists());
    }
}
