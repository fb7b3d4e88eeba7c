// MOS-like quality index from a simplified E-model

use serde::{Deserialize, Serialize};

/// Fixed codec/buffering offset added to the effective latency, in ms.
const CODEC_OFFSET_MS: f64 = 10.0;

/// Maps average RTT (ms), average jitter (ms) and loss (0-100) to a score in [1.0, 5.0].
pub fn mos_score(avg_rtt_ms: f64, jitter_ms: f64, loss_pct: f64) -> f64 {
    let effective_latency = avg_rtt_ms + jitter_ms * 2.0 + CODEC_OFFSET_MS;
    let r = (93.2 - effective_latency / 40.0 - loss_pct * 2.5).clamp(0.0, 100.0);
    if r <= 0.0 {
        return 1.0;
    }
    let mos = 1.0 + 0.035 * r + r * (r - 60.0) * 7e-6;
    mos.clamp(1.0, 5.0)
}

/// Display band for a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityBand {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
    Critical,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 4.3 => QualityBand::Excellent,
            s if s >= 4.0 => QualityBand::Good,
            s if s >= 3.6 => QualityBand::Fair,
            s if s >= 3.1 => QualityBand::Poor,
            s if s >= 2.6 => QualityBand::Bad,
            _ => QualityBand::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityBand::Excellent => "Excellent",
            QualityBand::Good => "Good",
            QualityBand::Fair => "Fair",
            QualityBand::Poor => "Poor",
            QualityBand::Bad => "Bad",
            QualityBand::Critical => "Critical",
        }
    }
}
