//! Lap time statistics
//!
//! All reductions sort their input first so results do not depend on the
//! order in which sessions were folded.

/// Consistency score assigned when a spread cannot be measured.
pub const PERFECT_CONSISTENCY: u8 = 100;

/// Summary statistics over a non-empty set of lap times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapTimeStats {
    pub count: usize,
    pub best: f64,
    pub median: f64,
    pub slowest: f64,
    pub consistency: u8,
}

impl LapTimeStats {
    /// `None` for an empty slice.
    pub fn from_times(times: &[f64]) -> Option<Self> {
        let sorted = sorted(times);
        let (&best, &slowest) = (sorted.first()?, sorted.last()?);

        Some(Self {
            count: sorted.len(),
            best,
            median: median_of_sorted(&sorted)?,
            slowest,
            consistency: consistency_of_sorted(&sorted),
        })
    }

    /// Slowest minus best.
    pub fn range(&self) -> f64 {
        self.slowest - self.best
    }
}

fn sorted(times: &[f64]) -> Vec<f64> {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Middle value; the mean of the two middle values for an even count.
pub fn median(times: &[f64]) -> Option<f64> {
    median_of_sorted(&sorted(times))
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

pub fn mean(times: &[f64]) -> Option<f64> {
    mean_of_sorted(&sorted(times))
}

fn mean_of_sorted(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

/// Population standard deviation (divisor `n`).
pub fn population_std_dev(times: &[f64]) -> Option<f64> {
    population_std_dev_of_sorted(&sorted(times))
}

fn population_std_dev_of_sorted(sorted: &[f64]) -> Option<f64> {
    let mean = mean_of_sorted(sorted)?;
    let variance =
        sorted.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / sorted.len() as f64;
    Some(variance.sqrt())
}

/// `round(clamp(100 * (1 - 5 * cv), 0, 100))` where `cv` is the coefficient
/// of variation. Ties round to even.
///
/// Fewer than two laps, or a zero mean, score 100.
pub fn consistency_score(times: &[f64]) -> u8 {
    consistency_of_sorted(&sorted(times))
}

fn consistency_of_sorted(sorted: &[f64]) -> u8 {
    if sorted.len() < 2 {
        return PERFECT_CONSISTENCY;
    }

    let (Some(mean), Some(std_dev)) = (mean_of_sorted(sorted), population_std_dev_of_sorted(sorted))
    else {
        return PERFECT_CONSISTENCY;
    };
    if mean == 0.0 {
        return PERFECT_CONSISTENCY;
    }

    let raw = 100.0 * (1.0 - 5.0 * (std_dev / mean));
    let score = raw.clamp(0.0, 100.0).round_ties_even();
    if score.is_nan() { 0 } else { score as u8 }
}
