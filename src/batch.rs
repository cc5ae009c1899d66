// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch runner: walks the input tree and asks the vision backend about
//! every image, one at a time.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::config::BatchConfig;
use crate::metadata::coordinates_for_image;
use crate::report::render_result;
use crate::verdict::Verdict;
use crate::vision::VisionModel;
use crate::Result;

/// Counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub damaged: usize,
    pub undamaged: usize,
}

/// Location of the reply file for `image`, mirroring its position under
/// `input_dir` inside `output_dir`
pub fn output_path_for(input_dir: &Path, output_dir: &Path, image: &Path) -> PathBuf {
    let relative = image.strip_prefix(input_dir).unwrap_or(image);
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    let stem = image.file_stem().unwrap_or_default();

    let mut file_name = stem.to_os_string();
    file_name.push(".txt");
    output_dir.join(parent).join(file_name)
}

/// Process every image under `config.input_dir`.
///
/// Unreadable directories are skipped with a warning, so a missing input
/// directory processes nothing. Any failure on an image aborts the batch.
/// Replies already written stay on disk.
pub async fn run<W: Write>(
    config: &BatchConfig,
    prompt: &str,
    backend: &dyn VisionModel,
    out: &mut W,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(&config.output_dir)?;

    info!(
        "Scanning {:?} with {}, writing replies to {:?}",
        config.input_dir,
        backend.name(),
        config.output_dir
    );

    let mut summary = BatchSummary::default();

    for entry in WalkDir::new(&config.input_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        // Symlinked images count; symlinked directories are not descended.
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !config.accepts(path) {
            trace!("Skipping non-image file: {:?}", path);
            continue;
        }

        info!("Analyzing: {:?}", path);
        let response = backend.answer(prompt, path).await?;
        let verdict = Verdict::classify(&response);
        debug!("Reply for {:?}: {:?} ({})", path, response.trim(), verdict);

        let coordinates = if verdict.is_damaged() {
            coordinates_for_image(path)?
        } else {
            None
        };
        if let Some(c) = coordinates {
            debug!("GPS for {:?}: {}", path, c);
        }
        render_result(out, verdict, path, coordinates)?;

        let txt_path = output_path_for(&config.input_dir, &config.output_dir, path);
        if let Some(parent) = txt_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&txt_path, &response)?;
        debug!("Reply saved to {:?}", txt_path);

        summary.processed += 1;
        match verdict {
            Verdict::Damaged => summary.damaged += 1,
            Verdict::Undamaged => summary.undamaged += 1,
        }

        tokio::time::sleep(config.request_delay()).await;
    }

    info!(
        "Processed {} images: {} damaged, {} undamaged",
        summary.processed, summary.damaged, summary.undamaged
    );
    Ok(summary)
}
