use std::path::{Path, PathBuf};

use {
    chrono::{DateTime, Local},
    tracing::info,
};

use crate::error::{Error, Result};

/// Sibling backup name: `<file>.backup.<YYYYMMDD_HHMMSS>` in local time.
///
/// Two backups within the same second share a name; the later one wins.
pub fn backup_path(target: &Path, now: DateTime<Local>) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(
        "{file_name}.backup.{}",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Copy `target` byte-for-byte to its backup name before it is overwritten.
///
/// Returns `None` when there is nothing to back up. Backups are never
/// pruned.
pub fn backup(target: &Path, now: DateTime<Local>) -> Result<Option<PathBuf>> {
    if !target.is_file() {
        return Ok(None);
    }
    let dest = backup_path(target, now);
    std::fs::copy(target, &dest).map_err(|e| Error::write_failure(&dest, e))?;
    info!(from = %target.display(), to = %dest.display(), "backed up descriptor");
    Ok(Some(dest))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, chrono::TimeZone};

    fn clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap()
    }

    #[test]
    fn name_embeds_second_granularity_stamp() {
        let path = backup_path(Path::new("/x/.claude-plugin/marketplace.json"), clock());
        assert_eq!(
            path,
            PathBuf::from("/x/.claude-plugin/marketplace.json.backup.20260301_090507")
        );
    }

    #[test]
    fn copies_bytes_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("marketplace.json");
        let original = b"{\n  \"name\": \"x\"\n}\n";
        std::fs::write(&target, original).unwrap();

        let dest = backup(&target, clock()).unwrap().unwrap();
        assert_eq!(std::fs::read(dest).unwrap(), original);
        assert_eq!(std::fs::read(&target).unwrap(), original);
    }

    #[test]
    fn missing_target_is_not_backed_up() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(backup(&tmp.path().join("absent.json"), clock()).unwrap().is_none());
    }

    #[test]
    fn same_second_backup_is_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("marketplace.json");
        std::fs::write(&target, "first").unwrap();
        backup(&target, clock()).unwrap();
        std::fs::write(&target, "second").unwrap();
        let dest = backup(&target, clock()).unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "second");
    }
}
