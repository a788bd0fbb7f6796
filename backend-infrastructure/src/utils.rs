use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tokio::fs;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn chrono_to_offset(at: DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(at.timestamp_millis())
}

pub fn offset_to_chrono(at: OffsetDateTime) -> DateTime<Utc> {
    let ms = i64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or_default();
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

/// Writes to a sibling temp file and renames it over `path`, so readers see
/// either the old content or the new one, never a truncated file.
pub async fn write_file_atomic(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn conversion_keeps_millisecond_precision() {
        let at = Utc.with_ymd_and_hms(2025, 11, 17, 21, 45, 0).unwrap() + chrono::Duration::milliseconds(123);
        assert_eq!(offset_to_chrono(chrono_to_offset(at)), at);
    }

    #[tokio::test]
    async fn atomic_write_replaces_content_and_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("voucher-write-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("data.json");
        write_file_atomic(&path, b"[1]").await.expect("first write");
        write_file_atomic(&path, b"[1,2]").await.expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "[1,2]");
        assert!(!dir.join("nested").join("data.json.tmp").exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
