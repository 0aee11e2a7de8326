use crate::config::FileTypeTable;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

impl VideoFileInfo {
    /// 不含副檔名的檔名，作為輸出檔名前綴
    #[must_use]
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string())
    }
}

/// 遞迴掃描資料夾中的影片，依路徑排序以確保每次處理順序相同
pub fn scan_video_files(
    directory: &Path,
    file_type_table: &FileTypeTable,
) -> Result<Vec<VideoFileInfo>> {
    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| file_type_table.is_video_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;

    #[test]
    fn test_scan_finds_only_videos_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.MP4"), b"1234").unwrap();
        fs::write(dir.path().join("nested/a.mkv"), b"12").unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("cover.png"), b"png").unwrap();

        let table = Config::embedded_file_type_table().unwrap();
        let files = scan_video_files(dir.path(), &table).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].stem(), "b");
        assert_eq!(files[0].size, 4);
        assert_eq!(files[1].stem(), "a");
    }
}
