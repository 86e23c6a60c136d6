// Confidence heuristic derived from retrieval similarity
use crate::rag::retrieval::RetrievedContext;

/// `round(mean(scores) * 100)` clamped to `[0, 100]`; `None` when there are no scores.
///
/// Cosine similarity may leave `[0, 1]` for unnormalized embeddings, so the
/// percentage is clamped rather than reported out of range.
pub fn confidence_from_scores(scores: &[f32]) -> Option<u8> {
    if scores.is_empty() {
        return None;
    }

    let sum: f64 = scores.iter().map(|s| f64::from(*s)).sum();
    let mean = sum / scores.len() as f64;
    let percent = (mean * 100.0).round();

    if percent.is_nan() {
        return Some(0);
    }
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// Confidence for a retrieved context set
pub fn confidence(context: &[RetrievedContext]) -> Option<u8> {
    let scores: Vec<f32> = context.iter().map(|c| c.score).collect();
    confidence_from_scores(&scores)
}
