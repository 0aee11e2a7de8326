use crate::analyzer::WeightConfig;
use crate::config::save::save_settings;
use crate::config::{Config, DEFAULT_ANALYSIS_WIDTH, Language};
use crate::menu::handlers::{run_batch_selector, run_thumbnail_selector};
use crate::tools::ExportFormat;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 分析寬度選項，`None` 為原始解析度
const ANALYSIS_WIDTH_OPTIONS: [Option<u32>; 4] =
    [Some(320), Some(DEFAULT_ANALYSIS_WIDTH), Some(1280), None];

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_single"),
        t!("main_menu.opt_batch"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_thumbnail_selector(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            run_batch_selector(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(2) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(3) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());
        print_current_settings(config);

        let options = vec![
            t!("settings.opt_sampling"),
            t!("settings.opt_weights"),
            t!("settings.opt_analysis_width"),
            t!("settings.opt_export"),
            t!("settings.opt_metadata"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_sampling_menu(config)?,
            Some(1) => show_weights_menu(term, config)?,
            Some(2) => show_analysis_width_menu(term, config)?,
            Some(3) => show_export_menu(term, config)?,
            Some(4) => show_metadata_menu(config)?,
            Some(5) => show_language_menu(term, config)?,
            Some(6) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn print_current_settings(config: &Config) {
    let analysis = &config.settings.analysis;
    let export = &config.settings.export;
    let w = analysis.weights;

    println!();
    println!(
        "  {} {:.2} fps",
        style(t!("settings.current_sampling")).dim(),
        analysis.sampling_rate_fps
    );
    println!(
        "  {} {:.2} / {:.2} / {:.2} / {:.2}",
        style(t!("settings.current_weights")).dim(),
        w.sharpness,
        w.face,
        w.brightness,
        w.composition
    );
    println!(
        "  {} {}",
        style(t!("settings.current_width")).dim(),
        width_label(analysis.analysis_width)
    );
    println!(
        "  {} {} (JPG {})",
        style(t!("settings.current_export")).dim(),
        export.format,
        export.jpeg_quality
    );
    println!(
        "  {} {}",
        style(t!("settings.current_metadata")).dim(),
        if export.write_metadata { "✓" } else { "✗" }
    );
    println!();
}

fn width_label(width: Option<u32>) -> String {
    width.map_or_else(|| t!("settings.width_original").to_string(), |w| format!("{w}px"))
}

fn notify_saved(value: impl std::fmt::Display) {
    println!("\n{} {}", style(t!("settings.saved")).green(), value);
    std::thread::sleep(std::time::Duration::from_secs(1));
}

/// 取樣率設定
fn show_sampling_menu(config: &mut Config) -> Result<()> {
    let current = config.settings.analysis.sampling_rate_fps;

    let rate: f64 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.sampling.prompt"))
        .default(current)
        .validate_with(|input: &f64| -> Result<(), String> {
            if input.is_finite() && *input > 0.0 {
                Ok(())
            } else {
                Err(t!("settings.sampling.invalid").to_string())
            }
        })
        .interact_text()?;

    if (rate - current).abs() > f64::EPSILON {
        config.settings.analysis.sampling_rate_fps = rate;
        save_settings(&config.settings)?;
        notify_saved(format!("{rate:.2} fps"));
    }

    Ok(())
}

/// 權重設定：預設、平均或自訂
fn show_weights_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.weights.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());
    println!("{}", style(t!("settings.weights.hint")).dim());

    let items: Vec<String> = vec![
        t!("settings.weights.preset").to_string(),
        t!("settings.weights.equal").to_string(),
        t!("settings.weights.custom").to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.weights.prompt"))
        .items(&items)
        .default(0)
        .interact_on_opt(term)?;

    let weights = match selection {
        Some(0) => WeightConfig::default(),
        Some(1) => WeightConfig::equal(),
        Some(2) => {
            let current = config.settings.analysis.weights;
            WeightConfig {
                sharpness: prompt_weight(&t!("settings.weights.sharpness"), current.sharpness)?,
                face: prompt_weight(&t!("settings.weights.face"), current.face)?,
                brightness: prompt_weight(&t!("settings.weights.brightness"), current.brightness)?,
                composition: prompt_weight(
                    &t!("settings.weights.composition"),
                    current.composition,
                )?,
            }
        }
        None => return Ok(()),
        _ => unreachable!(),
    };

    weights.validate()?;

    if weights != config.settings.analysis.weights {
        config.settings.analysis.weights = weights;
        save_settings(&config.settings)?;
        notify_saved(format!(
            "{:.2} / {:.2} / {:.2} / {:.2}",
            weights.sharpness, weights.face, weights.brightness, weights.composition
        ));
    }

    Ok(())
}

fn prompt_weight(label: &str, current: f64) -> Result<f64> {
    let value = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .default(current)
        .validate_with(|input: &f64| -> Result<(), String> {
            if input.is_finite() && *input >= 0.0 {
                Ok(())
            } else {
                Err(t!("settings.weights.invalid").to_string())
            }
        })
        .interact_text()?;
    Ok(value)
}

/// 分析寬度設定
fn show_analysis_width_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.width.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());
    println!("{}", style(t!("settings.width.hint")).dim());

    let items: Vec<String> = ANALYSIS_WIDTH_OPTIONS.iter().map(|w| width_label(*w)).collect();

    let default_index = ANALYSIS_WIDTH_OPTIONS
        .iter()
        .position(|&w| w == config.settings.analysis.analysis_width)
        .unwrap_or(1);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.width.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected = ANALYSIS_WIDTH_OPTIONS[selection];

    if selected != config.settings.analysis.analysis_width {
        config.settings.analysis.analysis_width = selected;
        save_settings(&config.settings)?;
        notify_saved(width_label(selected));
    }

    Ok(())
}

/// 輸出格式設定
fn show_export_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.export.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let formats = [ExportFormat::Png, ExportFormat::Jpg];
    let items: Vec<String> = formats.iter().map(ToString::to_string).collect();

    let default_index = formats
        .iter()
        .position(|&f| f == config.settings.export.format)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.export.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let mut export = config.settings.export.clone();
    export.format = formats[selection];

    if export.format == ExportFormat::Jpg {
        export.jpeg_quality = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.export.quality"))
            .default(export.jpeg_quality)
            .validate_with(|input: &u8| -> Result<(), String> {
                if (1..=100).contains(input) {
                    Ok(())
                } else {
                    Err(t!("settings.export.quality_invalid").to_string())
                }
            })
            .interact_text()?;
    }

    if export != config.settings.export {
        let label = format!("{} (JPG {})", export.format, export.jpeg_quality);
        config.settings.export = export;
        save_settings(&config.settings)?;
        notify_saved(label);
    }

    Ok(())
}

/// 是否輸出中繼資料
fn show_metadata_menu(config: &mut Config) -> Result<()> {
    let current = config.settings.export.write_metadata;

    let enabled = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.metadata.prompt"))
        .default(current)
        .interact()?;

    if enabled != current {
        config.settings.export.write_metadata = enabled;
        save_settings(&config.settings)?;
        notify_saved(if enabled { "✓" } else { "✗" });
    }

    Ok(())
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let items: Vec<String> = Language::ALL.iter().map(ToString::to_string).collect();

    let default_index = Language::ALL
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected_lang = Language::ALL[selection];

    if selected_lang != config.settings.language {
        config.settings.language = selected_lang;
        rust_i18n::set_locale(selected_lang.as_str());
        save_settings(&config.settings)?;
        notify_saved(selected_lang);
    }

    Ok(())
}
