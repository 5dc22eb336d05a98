// Version information for the deed OCR pipeline

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("deed-ocr-pipeline {}", VERSION_NUMBER)
}
