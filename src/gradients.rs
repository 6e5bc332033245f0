//! Gradient Utilities
//!
//! Operations on a [`GradientSet`] used during training for stability and
//! monitoring.
//!
//! ## Components
//!
//! - **Gradient Norm Computation**: Measure the magnitude of gradients
//! - **Element-wise Clipping**: Bound every weight-matrix gradient entry
//!
//! ## Why Clip in a Recurrent Network?
//!
//! BPTT multiplies by `Whhᵀ` once per step. When its largest singular value
//! exceeds one, the gradient grows geometrically with window length and a
//! single window can blow the weights up:
//!
//! ```text
//! Step 1000: Loss = 52.1
//! Step 1001: Loss = 3.1e4  (exploding gradient)
//! Step 1002: Loss = NaN
//! ```
//!
//! ## Algorithm
//!
//! Each entry of `dWxh`, `dWhh` and `dWyh` is clamped independently:
//!
//! ```text
//! g = min(max(g, -clip), clip)
//! ```
//!
//! Unlike norm-based clipping this changes the gradient's direction, but it
//! is cheap and bounds every individual update to `lr * clip`. The bias
//! gradients `dbh` and `dby` are left unclipped.
//!
//! ## Example
//!
//! ```rust
//! use char_rnn::gradients::{clip_weight_gradients, compute_grad_norm};
//! use char_rnn::{GradientSet, ParameterSet};
//! use rand::SeedableRng;
//!
//! let params = ParameterSet::new(4, 3, &mut rand::rngs::StdRng::seed_from_u64(0));
//! let mut grads = GradientSet::zeros_like(&params);
//! grads.whh.data[0] = 10.0;
//!
//! clip_weight_gradients(&mut grads, 5.0);
//! assert_eq!(grads.whh.data[0], 5.0);
//! assert_eq!(compute_grad_norm(&grads), 5.0);
//! ```

use crate::model::{GradientSet, Param};

/// Compute the L2 norm of all gradients
///
/// # Returns
///
/// The L2 norm: √(Σ g²) over every gradient value, biases included
pub fn compute_grad_norm(grads: &GradientSet) -> f64 {
    Param::ALL
        .iter()
        .map(|&p| grads.get(p).sum_squares())
        .sum::<f64>()
        .sqrt()
}

/// Clip weight-matrix gradients element-wise into `[-clip, clip]`
///
/// Only `dWxh`, `dWhh` and `dWyh` are clipped; bias gradients pass through.
///
/// # Returns
///
/// Number of entries that were changed by clipping
///
/// # Panics
///
/// Panics if `clip` is negative or NaN.
pub fn clip_weight_gradients(grads: &mut GradientSet, clip: f64) -> usize {
    assert!(clip >= 0.0, "clip bound must be non-negative, got {}", clip);

    let mut clipped = 0;
    for param in Param::ALL.into_iter().filter(|p| p.is_weight_matrix()) {
        let grad = grads.get_mut(param);
        clipped += grad.data.iter().filter(|g| g.abs() > clip).count();
        grad.clamp_in_place(-clip, clip);
    }
    clipped
}
