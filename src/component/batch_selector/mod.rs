//! 資料夾批次縮圖選取元件

mod main;

pub use main::{BatchResult, BatchSelector, has_existing_thumbnail};
