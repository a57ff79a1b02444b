use argminmax::ArgMinMax;

pub fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

pub fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    (get_min(vec), get_max(vec))
}

/// Scales a vector of (non-negative) scores so the largest becomes 100.0.
/// A degenerate input (empty, or max <= 0) comes back zeroed rather than NaN.
pub fn normalize_to_100(vec: &[f64]) -> Vec<f64> {
    if vec.is_empty() {
        return Vec::new();
    }
    let max_value = get_max(vec);
    if max_value <= 0.0 {
        return vec![0.0; vec.len()];
    }
    vec.iter().map(|&x| x / max_value * 100.0).collect()
}

/// Relative distance between two prices, against the smaller of the two.
/// Guards the zero denominator; identical zeros are "no distance".
pub fn relative_diff(a: f64, b: f64) -> f64 {
    let denom = a.abs().min(b.abs());
    if denom == 0.0 {
        if a == b { 0.0 } else { f64::INFINITY }
    } else {
        (a - b).abs() / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to_100() {
        let scores = normalize_to_100(&[1.0, 2.0, 4.0]);
        assert_eq!(scores, vec![25.0, 50.0, 100.0]);
    }

    #[test]
    fn test_normalize_degenerate() {
        assert_eq!(normalize_to_100(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(normalize_to_100(&[]).is_empty());
    }

    #[test]
    fn test_relative_diff() {
        assert!((relative_diff(100.0, 103.0) - 0.03).abs() < 1e-12);
        assert_eq!(relative_diff(0.0, 0.0), 0.0);
        assert!(relative_diff(0.0, 1.0).is_infinite());
    }
}
