//! Normalization: maps a provider's raw similarity onto the shared 0–100 scale.
//!
//! Two provider contracts exist and they are NOT interchangeable: the same raw
//! 0.4 is 70% under `Cosine` and 40% under `Unit`. Every provider declares
//! exactly one via `SimilarityProvider::scale()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared numeric range of a similarity provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScale {
    /// Cosine similarity in [-1, 1]. `percentage = round((s + 1) / 2 * 100)`.
    #[default]
    Cosine,
    /// Probability-like score in [0, 1]. `percentage = round(s * 100)`.
    Unit,
}

impl SimilarityScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityScale::Cosine => "cosine",
            SimilarityScale::Unit => "unit",
        }
    }
}

impl fmt::Display for SimilarityScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityScale::Cosine),
            "unit" => Ok(SimilarityScale::Unit),
            other => Err(format!("unknown similarity scale '{other}'")),
        }
    }
}

/// Badge shown next to a scored resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Excellent,
    Good,
    Fair,
}

impl MatchTier {
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= 85 {
            MatchTier::Excellent
        } else if percentage >= 70 {
            MatchTier::Good
        } else {
            MatchTier::Fair
        }
    }
}

/// Converts a finite raw similarity to an integer percentage clamped to [0, 100].
///
/// Callers must reject non-finite values first; NaN would otherwise clamp to 0
/// and be indistinguishable from a genuinely poor match.
pub fn normalize(similarity: f64, scale: SimilarityScale) -> u8 {
    let percentage = match scale {
        SimilarityScale::Cosine => ((similarity + 1.0) / 2.0 * 100.0).round(),
        SimilarityScale::Unit => (similarity * 100.0).round(),
    };
    percentage.clamp(0.0, 100.0) as u8
}
