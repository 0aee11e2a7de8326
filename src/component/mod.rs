//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要流程和專用工具

pub mod batch_selector;
pub mod thumbnail_selector;

pub use batch_selector::BatchSelector;
pub use thumbnail_selector::ThumbnailSelector;
