pub mod load;
pub mod save;
pub mod types;

pub use types::{
    AnalysisSettings, Config, DEFAULT_ANALYSIS_WIDTH, ExportSettings, FileTypeTable, Language,
    MAX_RECENT_PATHS, UserSettings,
};
