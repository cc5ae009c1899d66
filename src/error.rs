// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Thermoscan

use thiserror::Error;

/// Result type alias for Thermoscan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Thermoscan error types
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("Malformed GPS data: {0}")]
    Gps(String),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Vision backend error: {0}")]
    Backend(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
