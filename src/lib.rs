// Kennel Analytics - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod db;
pub mod environmental;
pub mod error;
pub mod extract;
pub mod operations;
pub mod records;
pub mod stats;
pub mod transform;
pub mod wellness;

// Re-export commonly used types
pub use config::{AnalysisConfig, AnalysisWindow, AnalysisWindows};
pub use db::{save_transformed, setup_database};
pub use environmental::EnvironmentalAnalyzer;
pub use error::{AnalysisError, AnalysisResult};
pub use extract::DataExtractor;
pub use operations::OperationsAnalyzer;
pub use records::{
    ActivityRecord, ActivityType, DailySummary, EnvironmentReading, StaffShift,
};
pub use transform::{DataTransformer, RawData, TransformedData};
pub use wellness::WellnessAnalyzer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
