// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Thermoscan: thermal solar-panel damage scanner
//!
//! Sends thermal images to a vision model (Gemini or a local Ollama model),
//! reports which panels look damaged together with their GPS position, and
//! keeps the raw model replies in a mirrored text tree.

pub mod batch;
pub mod config;
pub mod error;
pub mod gps;
pub mod metadata;
pub mod report;
pub mod verdict;
pub mod vision;

pub use config::AppConfig;
pub use error::{Result, ScanError};
