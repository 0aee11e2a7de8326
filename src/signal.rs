use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 設定 Ctrl-C 處理器，回傳分析流程共用的中斷旗標
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，將以目前已分析的幀選出縮圖...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

/// 每次開始新的分析前清除上一次的中斷狀態
pub fn reset_shutdown_signal(shutdown_signal: &AtomicBool) {
    shutdown_signal.store(false, Ordering::SeqCst);
}
