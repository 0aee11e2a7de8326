use crate::config::FileTypeTable;
use anyhow::{Result, bail};
use std::path::Path;

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// 確認路徑是支援的影片檔
pub fn validate_video_file(path: &Path, file_type_table: &FileTypeTable) -> Result<()> {
    if !path.is_file() {
        bail!("影片檔不存在: {}", path.display());
    }
    if !file_type_table.is_video_file(path) {
        bail!("不支援的影片格式: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_validate_video_file() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mov");
        let text = dir.path().join("clip.txt");
        std::fs::write(&video, b"x").unwrap();
        std::fs::write(&text, b"x").unwrap();

        let table = Config::embedded_file_type_table().unwrap();
        assert!(validate_video_file(&video, &table).is_ok());
        assert!(validate_video_file(&text, &table).is_err());
        assert!(validate_video_file(&dir.path().join("missing.mp4"), &table).is_err());
    }

    #[test]
    fn test_directory_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        assert!(validate_directory_exists(&nested).is_err());
        ensure_directory_exists(&nested).unwrap();
        assert!(validate_directory_exists(&nested).is_ok());
    }
}
