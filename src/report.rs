// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Console rendering of panel results

use colored::Colorize;
use std::io::Write;
use std::path::Path;

use crate::gps::Coordinates;
use crate::verdict::Verdict;
use crate::Result;

/// Write the colored result block for one image.
///
/// Damaged panels are followed by their GPS position or a notice that none
/// was found.
pub fn render_result<W: Write>(
    out: &mut W,
    verdict: Verdict,
    path: &Path,
    coordinates: Option<Coordinates>,
) -> Result<()> {
    let shown = path.display().to_string();

    match verdict {
        Verdict::Damaged => {
            writeln!(
                out,
                "{}{}{}",
                "Panel at ".red().bold(),
                shown.as_str().blue().bold(),
                " is damaged.".red().bold()
            )?;
            match coordinates {
                Some(c) => {
                    writeln!(out, "  {}", "GPS coordinates found:".bold())?;
                    writeln!(out, "    Latitude : {}", c.latitude)?;
                    writeln!(out, "    Longitude: {}", c.longitude)?;
                }
                None => writeln!(out, "  No GPS coordinates found.")?,
            }
        }
        Verdict::Undamaged => {
            writeln!(
                out,
                "{}{}{}",
                "Panel at ".green().bold(),
                shown.as_str().blue().bold(),
                " is in good condition.".green().bold()
            )?;
        }
    }

    Ok(())
}
