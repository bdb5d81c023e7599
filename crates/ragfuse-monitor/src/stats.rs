use serde::{Deserialize, Serialize};

/// Summary statistics over recorded response times, in seconds.
///
/// All fields are 0.0 when nothing has been recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    /// Arithmetic mean.
    pub avg: f64,
    /// Fastest response.
    pub min: f64,
    /// Slowest response.
    pub max: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl ResponseTimeStats {
    /// Compute statistics over `samples`.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let avg = mean(samples);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            avg,
            min,
            max,
            std: population_std_dev(samples, avg),
        }
    }
}

/// Arithmetic mean, or 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn population_std_dev(samples: &[f64], mean: f64) -> f64 {
    let variance = samples
        .iter()
        .map(|s| {
            let d = s - mean;
            d * d
        })
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}
