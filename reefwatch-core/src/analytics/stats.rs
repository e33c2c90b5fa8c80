//! Small numeric helpers shared by the analytics and health modules.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n).
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Ordinary least squares of `values[i]` against `i`.
///
/// Returns `None` for fewer than two points. A series with no variance is a
/// perfect (flat) fit and reports `r_squared = 1`.
pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;

    // x = 0, 1, ..., n-1
    let sum_x = n_f * (n_f - 1.0) / 2.0;
    let sum_xx = (n_f - 1.0) * n_f * (2.0 * n_f - 1.0) / 6.0;
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();

    let denominator = n_f * sum_xx - sum_x * sum_x;
    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;

    let y_mean = sum_y / n_f;
    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn population_std_dev_divides_by_n() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(mean(&values), 5.0));
        assert!(approx(std_dev(&values), 2.0));
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(linear_fit(&[]), None);
        assert_eq!(linear_fit(&[1.0]), None);
    }

    #[test]
    fn perfect_line_has_unit_r_squared() {
        let fit = linear_fit(&[3.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(fit.slope, 2.0));
        assert!(approx(fit.intercept, 3.0));
        assert!(approx(fit.r_squared, 1.0));
    }

    #[test]
    fn noisy_series_has_partial_r_squared() {
        let fit = linear_fit(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert!(fit.slope > 0.0);
        assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);
    }
}
