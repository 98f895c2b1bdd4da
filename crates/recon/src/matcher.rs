use std::collections::HashSet;

use crate::normalize::{normalize_subject, NormalizedSubject};

/// Default acceptance threshold for "same subject".
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Similarity of two raw subject names, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_normalized(&normalize_subject(a), &normalize_subject(b))
}

/// Token-set Jaccard index of two already-normalized subjects.
///
/// Identical forms score 1.0, which also covers two blank subjects.
pub fn similarity_normalized(a: &NormalizedSubject, b: &NormalizedSubject) -> f64 {
    if a == b {
        return 1.0;
    }

    let tokens_a: HashSet<&str> = a.tokens().collect();
    let tokens_b: HashSet<&str> = b.tokens().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Acceptance rule shared by the resolver and the extra-record scan: strictly above threshold.
pub fn is_same_subject(similarity: f64, threshold: f64) -> bool {
    similarity > threshold
}
