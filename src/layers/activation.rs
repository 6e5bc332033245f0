//! Activation Functions
//!
//! The vanilla RNN uses two nonlinearities: `tanh` on the hidden state and
//! `softmax` on the output logits.
//!
//! ## tanh
//!
//! ```text
//! tanh(x) = (e^x - e^-x) / (e^x + e^-x)
//! d/dx tanh(x) = 1 - tanh(x)²
//! ```
//!
//! The derivative is expressed in terms of the *output*, so the backward
//! pass only needs the cached hidden state, not the pre-activation.
//!
//! ## softmax
//!
//! ```text
//! softmax(x)[i] = exp(x[i] - max(x)) / Σ_j exp(x[j] - max(x))
//! ```
//!
//! Subtracting the maximum prevents overflow in `exp()` for large logits and
//! leaves the result unchanged, since the factor `exp(-max)` cancels.

use crate::tensor::Tensor;

/// tanh activation (forward pass)
pub fn tanh_forward(x: &Tensor) -> Tensor {
    x.map(f64::tanh)
}

/// tanh derivative (backward pass)
///
/// # Arguments
///
/// * `grad_out` - Gradient with respect to the tanh output
/// * `y` - The tanh output from the forward pass
///
/// # Returns
///
/// `grad_out * (1 - y²)`
pub fn tanh_backward(grad_out: &Tensor, y: &Tensor) -> Tensor {
    grad_out.mul(&y.map(|v| 1.0 - v * v))
}

/// Numerically stable softmax over a vector
///
/// # Panics
///
/// Panics if `logits` is not a non-empty vector.
pub fn softmax(logits: &Tensor) -> Tensor {
    assert!(
        logits.shape.len() == 1 && !logits.is_empty(),
        "softmax expects a non-empty vector, got shape {:?}",
        logits.shape
    );

    let max_logit = logits
        .data
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exp_vals = logits.map(|x| (x - max_logit).exp());
    let sum = exp_vals.sum();
    exp_vals.map(|x| x / sum)
}
