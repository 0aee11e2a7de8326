use env_logger::{Builder, Env};

/// 初始化日誌；預設只顯示 warn 以上，可用 `RUST_LOG` 覆寫
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();
}
