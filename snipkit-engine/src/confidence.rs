//! Confidence calibration from raw similarity scores.
//!
//! The mapping is the backend's empirically calibrated heuristic: L2
//! distance `d` between unit vectors maps to `1 - d/2`, and for cosine
//! similarity `c` between unit vectors `d = sqrt(2 * (1 - c))`. The
//! composition keeps the 0.70/0.40 UI tier cuts aligned with the score
//! distribution the heuristic was tuned on. Pure functions throughout:
//! re-scoring the same ranked list yields the same numbers.

/// Map a cosine similarity (native range [-1,1]) to a [0,1] confidence.
///
/// Monotone in the similarity; 1.0 at identical direction, 0.0 at and
/// below the distance-2 horizon.
pub fn similarity_to_confidence(similarity: f32) -> f32 {
    let distance = (2.0 * (1.0 - similarity).max(0.0)).sqrt();
    round4((1.0 - distance / 2.0).clamp(0.0, 1.0))
}

/// Blend a calibrated semantic confidence with a lexical overlap score.
///
/// Both inputs are in [0,1]; the result is clamped there as well.
pub fn blend(semantic: f32, lexical: f32, semantic_weight: f32, lexical_weight: f32) -> f32 {
    round4((semantic_weight * semantic + lexical_weight * lexical).clamp(0.0, 1.0))
}

/// Aggregate answer confidence from ranked per-source confidences.
///
/// Uses the top three sources: `0.6 * max + 0.4 * mean`. The result never
/// exceeds the strongest contributing evidence, so close top-1/top-2 scores
/// cannot inflate it. Empty input yields 0.0.
pub fn answer_confidence(confidences: &[f32]) -> f32 {
    if confidences.is_empty() {
        return 0.0;
    }
    let top = &confidences[..confidences.len().min(3)];
    let max = top.iter().cloned().fold(f32::MIN, f32::max);
    let mean = top.iter().sum::<f32>() / top.len() as f32;
    round4(0.6 * max + 0.4 * mean)
}

/// Round to four decimal places, matching the precision the API reports.
pub fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_direction_is_full_confidence() {
        assert_eq!(similarity_to_confidence(1.0), 1.0);
    }

    #[test]
    fn orthogonal_vectors_land_mid_range() {
        // d = sqrt(2), confidence = 1 - sqrt(2)/2 ≈ 0.2929
        let confidence = similarity_to_confidence(0.0);
        assert!((confidence - 0.2929).abs() < 1e-3);
    }

    #[test]
    fn opposite_direction_is_zero() {
        assert_eq!(similarity_to_confidence(-1.0), 0.0);
    }

    #[test]
    fn mapping_is_monotone() {
        let samples = [-1.0, -0.5, 0.0, 0.3, 0.7, 0.9, 1.0];
        for pair in samples.windows(2) {
            assert!(similarity_to_confidence(pair[0]) <= similarity_to_confidence(pair[1]));
        }
    }

    #[test]
    fn mapping_is_idempotent_on_repeat() {
        for similarity in [-0.3, 0.1, 0.55, 0.92] {
            assert_eq!(similarity_to_confidence(similarity), similarity_to_confidence(similarity));
        }
    }

    #[test]
    fn answer_confidence_bounded_by_max() {
        let confidences = [0.9, 0.88, 0.85, 0.2];
        assert!(answer_confidence(&confidences) <= 0.9);
    }

    #[test]
    fn answer_confidence_uses_top_three() {
        // 0.6 * 0.9 + 0.4 * (0.9 + 0.6 + 0.3) / 3 = 0.78
        assert_eq!(answer_confidence(&[0.9, 0.6, 0.3, 0.0]), 0.78);
    }

    #[test]
    fn empty_confidences_score_zero() {
        assert_eq!(answer_confidence(&[]), 0.0);
    }

    #[test]
    fn blend_clamps() {
        assert_eq!(blend(1.0, 1.0, 0.7, 0.3), 1.0);
        assert_eq!(blend(0.5, 0.0, 0.7, 0.3), 0.35);
    }
}
