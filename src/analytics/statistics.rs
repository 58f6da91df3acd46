//! Descriptive statistics over plain series of numbers.

use serde::Serialize;

/// The smallest and largest value in a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    /// The smallest value.
    pub min: f64,
    /// The largest value.
    pub max: f64,
}

impl ValueRange {
    /// The distance between the smallest and largest value.
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }
}

/// The arithmetic mean, 0 for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

/// The sample standard deviation (n - 1 denominator), 0 when there are fewer
/// than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let mean = mean(values);
    let squared_deviations: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();

    (squared_deviations / (values.len() - 1) as f64).sqrt()
}

/// The smallest and largest value, `None` for an empty series.
pub fn value_range(values: &[f64]) -> Option<ValueRange> {
    let (first, rest) = values.split_first()?;

    Some(rest.iter().fold(
        ValueRange {
            min: *first,
            max: *first,
        },
        |range, &value| ValueRange {
            min: range.min.min(value),
            max: range.max.max(value),
        },
    ))
}

/// The Pearson correlation coefficient of two paired series.
///
/// Returns 0 when the series are empty, have different lengths, or either
/// series has zero variance.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.is_empty() || xs.len() != ys.len() {
        return 0.0;
    }

    let x_mean = mean(xs);
    let y_mean = mean(ys);

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;

    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        covariance += dx * dy;
        x_variance += dx * dx;
        y_variance += dy * dy;
    }

    if x_variance == 0.0 || y_variance == 0.0 {
        return 0.0;
    }

    covariance / (x_variance * y_variance).sqrt()
}
