//! Face descriptor comparison.
//!
//! Descriptors are opaque fixed-length vectors produced by the kiosk's face
//! detector. Two descriptors of the same person sit close together in
//! euclidean space; the distance is mapped to a confidence in `[0, 1]`.

use crate::error::{EngineError, EngineResult};

/// Returns the euclidean distance between two descriptors.
///
/// # Errors
///
/// - [`EngineError::DimensionMismatch`] if the lengths differ.
/// - [`EngineError::Validation`] if either descriptor is empty or holds a
///   non-finite component.
///
/// # Example
///
/// ```
/// use attendance_engine::verification::euclidean_distance;
///
/// let d = euclidean_distance(&[0.0, 3.0], &[4.0, 0.0]).unwrap();
/// assert!((d - 5.0).abs() < 1e-6);
/// assert!(euclidean_distance(&[0.0, 1.0], &[0.0]).is_err());
/// ```
pub fn euclidean_distance(reference: &[f32], live: &[f32]) -> EngineResult<f32> {
    if reference.len() != live.len() {
        return Err(EngineError::DimensionMismatch {
            expected: reference.len(),
            actual: live.len(),
        });
    }
    if live.is_empty() {
        return Err(EngineError::validation("descriptor", "must not be empty"));
    }
    if reference.iter().chain(live).any(|v| !v.is_finite()) {
        return Err(EngineError::validation(
            "descriptor",
            "contains a non-finite component",
        ));
    }

    let sum: f32 = reference
        .iter()
        .zip(live)
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    Ok(sum.sqrt())
}

/// Maps a descriptor distance to a confidence in `[0, 1]`.
pub fn confidence_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_descriptors_have_zero_distance() {
        let descriptor = [0.12, -0.04, 0.33, 0.08];
        let distance = euclidean_distance(&descriptor, &descriptor).unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(confidence_from_distance(distance), 1.0);
    }

    #[test]
    fn test_dimension_mismatch_is_never_truncated() {
        let reference = vec![0.1; 128];
        let live = vec![0.1; 127];

        match euclidean_distance(&reference, &live) {
            Err(EngineError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 128);
                assert_eq!(actual, 127);
            }
            other => panic!("Expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_longer_live_descriptor_is_rejected() {
        let result = euclidean_distance(&[0.1, 0.2], &[0.1, 0.2, 0.0]);
        assert!(matches!(
            result,
            Err(EngineError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_empty_descriptors_are_rejected() {
        assert!(matches!(
            euclidean_distance(&[], &[]),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_nan_component_is_rejected() {
        assert!(matches!(
            euclidean_distance(&[0.1, 0.2], &[f32::NAN, 0.2]),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(confidence_from_distance(1.7), 0.0);
        assert!((confidence_from_distance(0.25) - 0.75).abs() < 1e-6);
    }
}
