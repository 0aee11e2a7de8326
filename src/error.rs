//! 分析流程的錯誤類型

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// 人臉偵測器回報的錯誤，只影響單一幀，不會中止分析
#[derive(Debug, Clone, Error)]
#[error("人臉偵測失敗: {0}")]
pub struct DetectorError(pub String);

impl DetectorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 設定不合法，在開始解碼前就會回報
    #[error("設定無效: {0}")]
    InvalidConfig(String),

    /// 影片無法開啟或已損毀
    #[error("無法解碼影片 {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// 沒有取樣到任何幀
    #[error("影片沒有可分析的幀")]
    EmptyStream,

    /// 在取樣到第一幀之前就被中斷
    #[error("分析已取消")]
    Cancelled,

    /// 讀取解碼器輸出或等待子程序時的系統錯誤
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }
}
