//! Small numeric helpers shared by metric derivation and chart annotation.

/// Arithmetic mean. `None` for an empty slice, undefined values are the
/// caller's problem to filter out first.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` with fewer than
/// two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// The three vertical guide positions drawn on ranked charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLines {
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

/// Mean and one standard deviation either side, with the lower guide
/// clamped at zero: none of the tracked metrics can be negative.
pub fn reference_lines(values: &[f64]) -> Option<ReferenceLines> {
    let m = mean(values)?;
    let sd = sample_std_dev(values).unwrap_or(0.0);
    Some(ReferenceLines {
        lower: (m - sd).max(0.0),
        mean: m,
        upper: m + sd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [10.0, 20.0, 30.0];
        assert_eq!(mean(&v), Some(20.0));
        assert!((sample_std_dev(&v).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[5.0]), None);
    }

    #[test]
    fn test_reference_lines_ordering() {
        let cases: &[&[f64]] = &[
            &[1.0, 2.0, 3.0, 4.0],
            &[0.5, 0.5, 0.5],
            &[100.0],
            &[0.1, 90.0],
        ];
        for values in cases {
            let lines = reference_lines(values).unwrap();
            assert!(lines.lower <= lines.mean, "lower > mean for {values:?}");
            assert!(lines.mean <= lines.upper, "mean > upper for {values:?}");
            assert!(lines.lower >= 0.0, "lower < 0 for {values:?}");
        }
    }

    #[test]
    fn test_lower_guide_clamps_to_zero() {
        // mean 1.0, sd well above it
        let lines = reference_lines(&[0.0, 0.0, 0.0, 4.0]).unwrap();
        assert_eq!(lines.lower, 0.0);
        assert!(lines.upper > lines.mean);
    }
}
