pub mod config;
pub mod detector;

pub use config::{DetectorConfig, ReportConfig, ScanFileConfig};
pub use detector::scan;
