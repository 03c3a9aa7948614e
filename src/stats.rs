//! Small numeric summaries shared by the benchmark reports.

/// Min/max/mean over the cycle counts reported by the accelerator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStats {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

impl CycleStats {
    /// `None` when no successful samples were collected.
    pub fn from_samples(samples: &[u32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut min = u32::MAX;
        let mut max = 0u32;
        let mut sum = 0u64;
        for &c in samples {
            min = min.min(c);
            max = max.max(c);
            sum += u64::from(c);
        }
        Some(Self {
            min,
            max,
            mean: sum as f64 / samples.len() as f64,
        })
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Upper-median pick from an ascending-sorted slice: index `len / 2`.
pub fn median(sorted: &[f64]) -> f64 {
    sorted[sorted.len() / 2]
}

/// Nearest-rank pick from an ascending-sorted slice: index `floor(len * q)`,
/// clamped to the last element. Not interpolated.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = (sorted.len() as f64 * q) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/* ---------- tests ---------- */
