use super::exporter::{ExportedFiles, export_thumbnail};
use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerConfig};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::error::AnalysisError;
use crate::signal::reset_shutdown_signal;
use crate::tools::{
    FfmpegDecoder, VideoInfo, format_timestamp, get_video_info, validate_video_file,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// 單一影片的分析結果
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub video_info: VideoInfo,
    pub result: AnalysisResult,
    pub processing_seconds: f64,
}

/// 以已探測的影片資訊開啟解碼器並分析，顯示進度條
///
/// 被中斷且尚未取樣任何幀時回傳 `Ok(None)`
pub fn analyze_video(
    video_path: &Path,
    video_info: &VideoInfo,
    analyzer_config: &AnalyzerConfig,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<Option<VideoAnalysis>> {
    let start = Instant::now();
    let analyzer = Analyzer::new(analyzer_config.clone())?
        .with_cancel_signal(Arc::clone(shutdown_signal));

    let decoder =
        FfmpegDecoder::with_info(video_path, video_info.clone(), analyzer_config.analysis_width)?;
    let estimated = analyzer_config
        .sampling
        .estimate_samples(video_info.duration_seconds, video_info.frame_rate);

    let progress_bar = ProgressBar::new(estimated as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar.set_message(t!("selector.scoring").to_string());

    let outcome = analyzer.analyze_with_progress(decoder, |scored| {
        if scored as u64 > progress_bar.length().unwrap_or(0) {
            progress_bar.set_length(scored as u64);
        }
        progress_bar.set_position(scored as u64);
    });
    progress_bar.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(AnalysisError::Cancelled) => {
            warn!("分析在取樣第一幀前就被中斷: {}", video_path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("分析失敗: {}", video_path.display()));
        }
    };

    Ok(Some(VideoAnalysis {
        video_info: video_info.clone(),
        result,
        processing_seconds: start.elapsed().as_secs_f64(),
    }))
}

/// 單一影片縮圖選取元件
pub struct ThumbnailSelector {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl ThumbnailSelector {
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
        println!("{}", style(t!("selector.title")).cyan().bold());

        let Some(input_path) = self.prompt_video_path()? else {
            return Ok(());
        };
        let video_path = PathBuf::from(&input_path);
        validate_video_file(&video_path, &self.config.file_type_table)?;

        add_recent_path(&mut self.config.settings, &input_path);
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存路徑歷史: {e}");
        }

        let default_output = video_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| ".".to_string(), |p| p.display().to_string());
        let output_dir = PathBuf::from(self.prompt_output_dir(&default_output)?);

        let analyzer_config = self.config.settings.analysis.to_analyzer_config();
        analyzer_config.validate()?;

        println!("{}", style(t!("selector.reading_info")).dim());
        let video_info = get_video_info(&video_path)?;
        self.print_video_info(&video_info, &analyzer_config);

        reset_shutdown_signal(&self.shutdown_signal);
        let Some(analysis) =
            analyze_video(&video_path, &video_info, &analyzer_config, &self.shutdown_signal)?
        else {
            println!("{}", style(t!("selector.cancelled_empty")).yellow());
            return Ok(());
        };

        print_score_breakdown(&analysis.result, analysis.processing_seconds);

        let exported = export_thumbnail(
            &video_path,
            &analysis.video_info,
            &analysis.result,
            &output_dir,
            &self.config.settings.export,
            analysis.processing_seconds,
        )?;
        print_exported(&exported);

        info!(
            "縮圖選取完成: {} @ {:.2}s",
            video_path.display(),
            analysis.result.best.timestamp
        );

        Ok(())
    }

    fn prompt_video_path(&self) -> Result<Option<String>> {
        let recent_paths = &self.config.settings.recent_paths;

        if recent_paths.is_empty() {
            let path: String = Input::new()
                .with_prompt(t!("selector.input_video"))
                .interact_text()?;
            return Ok(Some(path.trim().to_string()));
        }

        let mut options: Vec<String> = recent_paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
                format!("{} [{}] {}", i + 1, indicator, p)
            })
            .collect();
        options.push(t!("selector.new_path").to_string());

        println!("{}", style(t!("common.esc_hint")).dim());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("selector.select_path"))
            .items(&options)
            .default(0)
            .interact_opt()?;

        match selection {
            None => Ok(None),
            Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
            Some(_) => {
                let path: String = Input::new()
                    .with_prompt(t!("selector.input_video"))
                    .interact_text()?;
                Ok(Some(path.trim().to_string()))
            }
        }
    }

    fn prompt_output_dir(&self, default_output: &str) -> Result<String> {
        let path: String = Input::new()
            .with_prompt(t!("selector.input_output"))
            .default(default_output.to_string())
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn print_video_info(&self, video_info: &VideoInfo, analyzer_config: &AnalyzerConfig) {
        let estimated = analyzer_config
            .sampling
            .estimate_samples(video_info.duration_seconds, video_info.frame_rate);
        println!(
            "  {} {}  {} {:.1}s  {} {:.2}  {} {}",
            style(t!("selector.resolution")).dim(),
            video_info.resolution(),
            style(t!("selector.duration")).dim(),
            video_info.duration_seconds,
            style("FPS").dim(),
            video_info.frame_rate,
            style(t!("selector.estimated_frames")).dim(),
            estimated
        );
    }
}

/// 顯示最佳幀的評分明細（0-100 分）
pub fn print_score_breakdown(result: &AnalysisResult, processing_seconds: f64) {
    let best = &result.best;
    let percent = |v: f64| v * 100.0;

    println!();
    println!("{}", style(t!("selector.best_title")).cyan().bold());
    println!(
        "  {} {} ({:.2}s)",
        t!("selector.timestamp"),
        style(format_timestamp(best.timestamp)).bold(),
        best.timestamp
    );
    println!(
        "  {} {}",
        t!("selector.overall"),
        style(format!("{:.1}/100", percent(best.combined))).green().bold()
    );
    println!("  {} {:.1}/100", t!("selector.sharpness"), percent(best.scores.sharpness));
    println!(
        "  {} {:.1}/100 ({})",
        t!("selector.face"),
        percent(best.scores.face),
        t!("selector.face_count", count = best.face_count)
    );
    println!("  {} {:.1}/100", t!("selector.brightness"), percent(best.scores.brightness));
    println!("  {} {:.1}/100", t!("selector.composition"), percent(best.scores.composition));
    println!(
        "{}",
        style(t!(
            "selector.analyzed",
            count = result.frames_sampled,
            seconds = format!("{processing_seconds:.2}")
        ))
        .dim()
    );

    if result.detector_failures > 0 {
        println!(
            "{}",
            style(t!("selector.detector_failures", count = result.detector_failures)).yellow()
        );
    }

    if result.cancelled {
        println!("{}", style(t!("selector.cancelled_partial")).yellow());
    }
}

fn print_exported(exported: &ExportedFiles) {
    println!(
        "\n{} {}",
        style("✓").green(),
        t!("selector.saved_image", path = exported.image_path.display())
    );
    if let Some(metadata_path) = &exported.metadata_path {
        println!(
            "{} {}",
            style("✓").green(),
            t!("selector.saved_metadata", path = metadata_path.display())
        );
    }
}
