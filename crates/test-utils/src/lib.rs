//! Test helpers for the jetstream workspace: sample reanalysis files,
//! synthetic wind grids and scratch paths.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that two numbers differ by at most `epsilon`; wind components
/// come back from packed files only approximately.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "assertion failed: {} and {} differ by more than {}",
            left,
            right,
            epsilon
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_packed_speed_within_tolerance() {
        assert_approx_eq!(42.51_f32, 42.5_f64, 0.02);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_speed_outside_tolerance() {
        assert_approx_eq!(45.0_f32, 42.5_f64, 0.02);
    }
}
