//! Cross-Entropy Loss
//!
//! The window loss is the summed negative log-likelihood of each target
//! character under the model's predicted distribution:
//!
//! ```text
//! loss = Σ_t -ln(p_t[targets[t]])
//! ```
//!
//! The loss is a *sum*, not a mean, so its gradient is exactly what the
//! backward pass accumulates over the window.
//!
//! ## Degenerate Values
//!
//! If a target's predicted probability underflows to exactly zero the loss
//! is `+∞`. This is returned as-is; callers decide how to report it (the
//! trainer logs a warning, see [`is_degenerate`]).
//!
//! ## Perplexity
//!
//! ```text
//! perplexity = exp(loss / L)
//! ```
//!
//! - **Perfect model**: perplexity = 1.0
//! - **Uniform guessing** over V characters: perplexity = V

use crate::error::{check_index, Result, RnnError};
use crate::tensor::Tensor;

/// Validate a target sequence against a window of `steps` steps
pub(crate) fn check_targets(steps: usize, targets: &[usize], vocab_size: usize) -> Result<()> {
    if targets.len() != steps {
        return Err(RnnError::LengthMismatch {
            expected: steps,
            actual: targets.len(),
        });
    }
    for &target in targets {
        check_index(target, vocab_size)?;
    }
    Ok(())
}

/// Total cross-entropy of `targets` under the per-step distributions `probs`
///
/// # Errors
///
/// - [`RnnError::LengthMismatch`] if `targets.len() != probs.len()`
/// - [`RnnError::InvalidVocabularyIndex`] for a target outside a distribution
pub fn cross_entropy(probs: &[Tensor], targets: &[usize]) -> Result<f64> {
    let vocab_size = probs.first().map_or(0, Tensor::len);
    check_targets(probs.len(), targets, vocab_size)?;

    Ok(probs
        .iter()
        .zip(targets)
        .map(|(p, &target)| -p.data[target].ln())
        .sum())
}

/// Per-character perplexity of a window loss
pub fn perplexity(loss: f64, seq_len: usize) -> f64 {
    (loss / seq_len as f64).exp()
}

/// True if the loss is infinite or NaN
pub fn is_degenerate(loss: f64) -> bool {
    !loss.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(values: &[f64]) -> Tensor {
        Tensor::new(values.to_vec(), vec![values.len()])
    }

    #[test]
    fn test_cross_entropy_sum() {
        let probs = vec![dist(&[0.5, 0.5]), dist(&[0.25, 0.75])];
        let loss = cross_entropy(&probs, &[0, 1]).unwrap();
        let expected = -(0.5f64.ln()) - 0.75f64.ln();
        assert!((loss - expected).abs() < 1e-12);
    }

    #[test]
    fn test_certain_predictions_have_zero_loss() {
        let probs = vec![dist(&[0.0, 1.0, 0.0]), dist(&[1.0, 0.0, 0.0])];
        let loss = cross_entropy(&probs, &[1, 0]).unwrap();
        assert_eq!(loss, 0.0);
        assert!(!is_degenerate(loss));
    }

    #[test]
    fn test_zero_probability_target_is_infinite() {
        let probs = vec![dist(&[0.0, 1.0])];
        let loss = cross_entropy(&probs, &[0]).unwrap();
        assert_eq!(loss, f64::INFINITY);
        assert!(is_degenerate(loss));
    }

    #[test]
    fn test_length_and_index_errors() {
        let probs = vec![dist(&[0.5, 0.5])];
        assert!(matches!(
            cross_entropy(&probs, &[0, 1]),
            Err(RnnError::LengthMismatch { .. })
        ));
        assert!(matches!(
            cross_entropy(&probs, &[2]),
            Err(RnnError::InvalidVocabularyIndex { index: 2, .. })
        ));
    }

    #[test]
    fn test_perplexity_of_uniform_model() {
        let v = 8.0f64;
        let loss = 25.0 * v.ln();
        assert!((perplexity(loss, 25) - v).abs() < 1e-9);
    }
}
