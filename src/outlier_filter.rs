//! Interquartile-range rejection of trajectory samples.

/// Percentile of sorted data with linear interpolation between ranks
///
/// `sorted` must be in ascending order and non-empty.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    #[allow(clippy::cast_precision_loss)]
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Acceptance interval of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// `[Q1 - k*IQR, Q3 + k*IQR]` of the values
    ///
    /// Returns `None` for empty input.
    #[must_use]
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Samples that survived the filter and how many were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub inliers: Vec<(f64, f64)>,
    pub rejected: usize,
}

/// IQR outlier filter over 2D samples
#[derive(Debug, Clone, Copy)]
pub struct OutlierFilter {
    multiplier: f64,
}

impl OutlierFilter {
    #[must_use]
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Keep samples whose x and y both lie inside their axis fences
    ///
    /// Input order is preserved.
    #[must_use]
    pub fn filter(&self, samples: &[(f64, f64)]) -> Filtered {
        let xs: Vec<f64> = samples.iter().map(|s| s.0).collect();
        let ys: Vec<f64> = samples.iter().map(|s| s.1).collect();
        let (Some(x_fences), Some(y_fences)) = (
            Fences::from_values(&xs, self.multiplier),
            Fences::from_values(&ys, self.multiplier),
        ) else {
            return Filtered::default();
        };

        let inliers: Vec<(f64, f64)> = samples
            .iter()
            .copied()
            .filter(|&(x, y)| x_fences.contains(x) && y_fences.contains(y))
            .collect();

        Filtered {
            rejected: samples.len() - inliers.len(),
            inliers,
        }
    }
}
