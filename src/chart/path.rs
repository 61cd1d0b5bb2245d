//! Synthetic price history between two known endpoints.

use crate::core::RandomSource;

/// Builds `step_count` prices running from `start_value` to `end_value`.
///
/// A free random walk starting at 0 (steps drawn from
/// `[-volatility / 2, +volatility / 2]`) is rescaled so that its first and
/// last samples land on the two endpoints. Output is floored at 0.
pub fn generate_path(
    start_value: f64,
    end_value: f64,
    step_count: usize,
    volatility: f64,
    rng: &mut dyn RandomSource,
) -> Vec<f64> {
    if step_count == 0 {
        return Vec::new();
    }

    let half = volatility / 2.0;
    let mut raw = Vec::with_capacity(step_count);
    let mut level = 0.0;
    raw.push(level);
    for _ in 1..step_count {
        level += rng.uniform(-half, half);
        raw.push(level);
    }

    let raw_first = raw[0];
    let raw_last = raw[step_count - 1];
    let mut span = raw_last - raw_first;
    // A walk that came back to where it started has no span to normalize by.
    if span == 0.0 {
        span = 1.0;
    }

    raw.into_iter()
        .map(|value| {
            let progress = (value - raw_first) / span;
            (start_value + progress * (end_value - start_value)).max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::{RngSource, SequenceSource};

    #[test]
    fn test_path_shape() {
        let mut rng = RngSource::seeded(11);
        let path = generate_path(100.0, 200.0, 5, 2.0, &mut rng);

        assert_eq!(path.len(), 5);
        assert!((path[0] - 100.0).abs() < 1e-9);
        assert!(path.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_endpoints_are_pinned() {
        for seed in 0..50 {
            let mut rng = RngSource::seeded(seed);
            let path = generate_path(80.0, 120.0, 30, 0.02, &mut rng);
            assert_eq!(path.len(), 30);
            assert!((path[0] - 80.0).abs() < 1e-6);
            assert!((path[29] - 120.0).abs() < 1e-6, "seed {seed}: {}", path[29]);
        }
    }

    #[test]
    fn test_degenerate_walk_stays_finite() {
        // +v/4 then -v/4: the raw walk ends where it started
        let mut rng = SequenceSource::new(vec![0.75, 0.25]);
        let path = generate_path(100.0, 200.0, 3, 2.0, &mut rng);

        assert_eq!(path.len(), 3);
        assert!(path.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert_eq!(path[0], 100.0);
        assert_eq!(path[1], 150.0);
        assert_eq!(path[2], 100.0);
    }

    #[test]
    fn test_values_are_floored_at_zero() {
        // Raw walk 0, -1, 0, 0.5 dips to twice the span below its start
        let mut rng = SequenceSource::new(vec![0.0, 1.0, 0.75]);
        let path = generate_path(10.0, 20.0, 4, 2.0, &mut rng);

        assert_eq!(path.len(), 4);
        assert_eq!(path[0], 10.0);
        assert_eq!(path[1], 0.0);
        assert_eq!(path[3], 20.0);
        assert!(path.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_tiny_step_counts() {
        let mut rng = RngSource::seeded(3);
        assert!(generate_path(1.0, 2.0, 0, 0.1, &mut rng).is_empty());
        assert_eq!(generate_path(5.0, 9.0, 1, 0.1, &mut rng), vec![5.0]);
    }
}
