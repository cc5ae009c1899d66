// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Damage verdict derived from a model reply

use serde::Serialize;
use std::fmt;

/// Damaged/undamaged classification of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Damaged,
    Undamaged,
}

impl Verdict {
    /// Classify a free-text reply.
    ///
    /// Any case-insensitive occurrence of `true` counts as damaged, so a
    /// negated reply such as "this is not true" is misclassified.
    pub fn classify(response: &str) -> Self {
        if response.to_lowercase().contains("true") {
            Verdict::Damaged
        } else {
            Verdict::Undamaged
        }
    }

    pub fn is_damaged(self) -> bool {
        self == Verdict::Damaged
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Damaged => write!(f, "damaged"),
            Verdict::Undamaged => write!(f, "undamaged"),
        }
    }
}
