use crate::component::thumbnail_selector::{analyze_video, export_thumbnail};
use crate::config::save::{add_recent_path, save_settings};
use crate::config::{Config, ExportSettings};
use crate::signal::reset_shutdown_signal;
use crate::tools::{
    ExportFormat, VideoFileInfo, ensure_directory_exists, format_timestamp, get_video_info,
    scan_video_files, validate_directory_exists,
};
use anyhow::Result;
use console::style;
use dialoguer::Input;
use log::{error, info, warn};
use rust_i18n::t;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 批次處理結果
#[derive(Debug, Default)]
pub struct BatchResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 輸出資料夾中是否已有這部影片的縮圖（`{stem}_thumbnail_*s.{ext}`）
#[must_use]
pub fn has_existing_thumbnail(output_dir: &Path, video_stem: &str, format: ExportFormat) -> bool {
    let prefix = format!("{video_stem}_thumbnail_");
    let suffix = format!("s.{}", format.extension());

    let Ok(entries) = fs::read_dir(output_dir) else {
        return false;
    };

    entries.filter_map(std::result::Result::ok).any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix))
            .is_some_and(|secs| !secs.is_empty() && secs.chars().all(|c| c.is_ascii_digit()))
    })
}

/// 批次縮圖選取器：逐一分析資料夾中的影片
pub struct BatchSelector {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl BatchSelector {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("batch.title")).cyan().bold());

        let input_path = self.prompt_path(&t!("batch.input_dir"), None)?;
        let input_dir = PathBuf::from(&input_path);
        validate_directory_exists(&input_dir)?;

        add_recent_path(&mut self.config.settings, &input_path);
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存路徑歷史: {e}");
        }

        let output_path = self.prompt_path(&t!("batch.output_dir"), Some(&input_path))?;
        let output_dir = PathBuf::from(&output_path);
        ensure_directory_exists(&output_dir)?;

        println!("{}", style(t!("batch.scanning")).dim());
        let video_files = scan_video_files(&input_dir, &self.config.file_type_table)?;

        if video_files.is_empty() {
            println!("{}", style(t!("batch.no_videos")).yellow());
            return Ok(());
        }

        println!(
            "{}",
            style(t!("batch.found", count = video_files.len())).green()
        );
        for (index, file) in video_files.iter().enumerate() {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            println!(
                "  {}. {} ({:.2} MB)",
                index + 1,
                file.path.file_name().unwrap_or_default().to_string_lossy(),
                size_mb
            );
        }
        println!();

        let result = self.process_videos(&video_files, &output_dir);
        self.print_summary(&result);

        Ok(())
    }

    fn prompt_path(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let input = Input::<String>::new().with_prompt(prompt);
        let input = match default {
            Some(default) => input.default(default.to_string()),
            None => input,
        };
        let path = input.interact_text()?;
        Ok(path.trim().to_string())
    }

    fn process_videos(&self, videos: &[VideoFileInfo], output_dir: &Path) -> BatchResult {
        let analyzer_config = self.config.settings.analysis.to_analyzer_config();
        let export_settings: &ExportSettings = &self.config.settings.export;
        let mut result = BatchResult {
            total_videos: videos.len(),
            ..BatchResult::default()
        };

        reset_shutdown_signal(&self.shutdown_signal);

        for (index, video) in videos.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止批次處理");
                break;
            }

            let video_stem = video.stem();
            println!(
                "\n{} [{}/{}] {}",
                style(t!("batch.processing")).cyan(),
                index + 1,
                videos.len(),
                style(&video_stem).bold()
            );

            if has_existing_thumbnail(output_dir, &video_stem, export_settings.format) {
                println!("  {} {}", style("⤳").dim(), t!("batch.skipped_existing"));
                result.skipped += 1;
                continue;
            }

            let video_info = match get_video_info(&video.path) {
                Ok(info) => info,
                Err(e) => {
                    error!("無法讀取影片資訊 {video_stem}: {e}");
                    println!("  {} {}: {e}", style("✗").red(), t!("batch.failed"));
                    result.failed += 1;
                    continue;
                }
            };

            let analysis = match analyze_video(
                &video.path,
                &video_info,
                &analyzer_config,
                &self.shutdown_signal,
            ) {
                Ok(Some(analysis)) => analysis,
                Ok(None) => {
                    println!("  {} {}", style("⤳").dim(), t!("batch.cancelled"));
                    break;
                }
                Err(e) => {
                    error!("處理影片失敗 {video_stem}: {e:#}");
                    println!("  {} {}: {e:#}", style("✗").red(), t!("batch.failed"));
                    result.failed += 1;
                    continue;
                }
            };

            match export_thumbnail(
                &video.path,
                &analysis.video_info,
                &analysis.result,
                output_dir,
                export_settings,
                analysis.processing_seconds,
            ) {
                Ok(exported) => {
                    println!(
                        "  {} {} @ {} ({:.1}/100)",
                        style("✓").green(),
                        exported
                            .image_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy(),
                        format_timestamp(analysis.result.best.timestamp),
                        analysis.result.best.combined * 100.0
                    );
                    result.successful += 1;
                }
                Err(e) => {
                    error!("輸出縮圖失敗 {video_stem}: {e:#}");
                    println!("  {} {}: {e:#}", style("✗").red(), t!("batch.failed"));
                    result.failed += 1;
                }
            }

            if analysis.result.cancelled {
                break;
            }
        }

        result
    }

    fn print_summary(&self, result: &BatchResult) {
        println!();
        println!("{}", style(t!("batch.summary_title")).cyan().bold());
        println!("  {}", t!("batch.summary_total", count = result.total_videos));
        println!(
            "  {} {}",
            t!("batch.summary_success"),
            style(result.successful).green()
        );

        if result.skipped > 0 {
            println!("  {} {}", t!("batch.summary_skipped"), style(result.skipped).yellow());
        }

        if result.failed > 0 {
            println!("  {} {}", t!("batch.summary_failed"), style(result.failed).red());
        }

        info!(
            "批次縮圖完成 - 成功: {}, 跳過: {}, 失敗: {}",
            result.successful, result.skipped, result.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_existing_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trip_thumbnail_42s.png"), b"").unwrap();
        fs::write(dir.path().join("trip_extra_thumbnail_7s.jpg"), b"").unwrap();

        assert!(has_existing_thumbnail(dir.path(), "trip", ExportFormat::Png));
        assert!(!has_existing_thumbnail(dir.path(), "trip", ExportFormat::Jpg));
        assert!(has_existing_thumbnail(dir.path(), "trip_extra", ExportFormat::Jpg));
        assert!(!has_existing_thumbnail(dir.path(), "other", ExportFormat::Png));
    }

    #[test]
    fn test_has_existing_thumbnail_ignores_non_numeric() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trip_thumbnail_draft_s.png"), b"").unwrap();
        assert!(!has_existing_thumbnail(dir.path(), "trip", ExportFormat::Png));
    }

    #[test]
    fn test_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_existing_thumbnail(
            &dir.path().join("missing"),
            "trip",
            ExportFormat::Png
        ));
    }
}
