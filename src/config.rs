//! Configuration types.

use std::path::PathBuf;

use crate::channels::EmailConfig;

/// Default report location.
pub const DEFAULT_SOURCE_PATH: &str = "saida.xlsx";

/// File name of the run log inside the log directory.
pub const LOG_FILE_NAME: &str = "relatorio_log.txt";

/// Application configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Report to process (`.xlsx`, `.xls`, `.ods` or `.csv`).
    pub source_path: PathBuf,
    /// Address that receives the sentinel party's reports.
    pub override_address: Option<String>,
    /// Directory for the run log.
    pub log_dir: PathBuf,
    /// Delivery settings.
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let source_path = std::env::var("ALERTS_SOURCE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCE_PATH));

        let override_address = non_blank(std::env::var("ALERTS_OVERRIDE_ADDRESS").ok());

        let log_dir = std::env::var("ALERTS_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            source_path,
            override_address,
            log_dir,
            email: EmailConfig::from_env(),
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
