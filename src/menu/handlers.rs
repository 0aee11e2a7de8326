use crate::component::{BatchSelector, ThumbnailSelector};
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_thumbnail_selector(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let mut selector = ThumbnailSelector::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = selector.run() {
        eprintln!("{} {e:#}", style(t!("common.error")).red().bold());
    }
    config.settings.recent_paths = selector.config().settings.recent_paths.clone();

    pause(term)?;
    Ok(())
}

pub fn run_batch_selector(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let mut selector = BatchSelector::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = selector.run() {
        eprintln!("{} {e:#}", style(t!("common.error")).red().bold());
    }
    config.settings.recent_paths = selector.config().settings.recent_paths.clone();

    pause(term)?;
    Ok(())
}
