//! Safe rewrites of versioned store files.
//!
//! Collection files carry a `version` field; a file without one (a bare JSON
//! array) is version 0. When a collection is opened at an older version it
//! is rewritten in the current format through [`migrate_file`], which keeps a
//! copy of the original until the rewrite has succeeded.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Path of the backup kept while `path` is migrated away from `old_version`,
/// e.g. `services.json` → `services.json.backup-v0`.
pub fn backup_path(path: &Path, old_version: u32) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".backup-v{old_version}"));
    path.with_file_name(name)
}

/// Back up `path`, run `save_fn` to write the migrated content, then drop
/// the backup. If `save_fn` fails the backup stays next to the file for
/// manual recovery.
pub fn migrate_file<F>(path: &Path, old_version: u32, save_fn: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let backup = backup_path(path, old_version);
    fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to back up {} before migrating from v{}",
            path.display(),
            old_version
        )
    })?;

    save_fn().with_context(|| format!("Failed to write migrated {}", path.display()))?;

    if let Err(e) = fs::remove_file(&backup) {
        tracing::warn!("Could not remove migration backup {}: {}", backup.display(), e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_suffix() {
        let path = Path::new("/tmp/store/services.json");
        assert_eq!(
            backup_path(path, 0),
            PathBuf::from("/tmp/store/services.json.backup-v0")
        );
    }

    #[test]
    fn test_successful_migration_removes_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("services.json");
        fs::write(&file_path, "[]").unwrap();

        migrate_file(&file_path, 0, || {
            fs::write(&file_path, r#"{"version": 1, "documents": []}"#)?;
            Ok(())
        })
        .unwrap();

        assert!(!backup_path(&file_path, 0).exists());
        let content = fs::read_to_string(&file_path).unwrap();
        assert!(content.contains("\"version\": 1"));
    }

    #[test]
    fn test_failed_migration_keeps_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("services.json");
        fs::write(&file_path, r#"[{"id": "m1", "title": "Alt"}]"#).unwrap();

        let result = migrate_file(&file_path, 0, || anyhow::bail!("disk full"));
        assert!(result.is_err());

        let backup = backup_path(&file_path, 0);
        assert!(backup.exists());
        assert!(fs::read_to_string(backup).unwrap().contains("\"m1\""));
    }
}
