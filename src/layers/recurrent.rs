//! Recurrent Layer (Elman RNN)
//!
//! Forward pass and truncated backpropagation-through-time for a single
//! tanh recurrent layer with a softmax readout.
//!
//! ## Forward Pass
//!
//! For every step `t` of a window of length `L`:
//!
//! ```text
//! x_t      = onehot(inputs[t])
//! h_t      = tanh(Wxh · x_t + Whh · h_{t-1} + bh)    h_{-1} = hprev
//! logits_t = Wyh · h_t + by
//! p_t      = softmax(logits_t)
//! ```
//!
//! The cache keeps every `x_t`, `h_t` (plus the carried-in `h_{-1}`) and
//! `p_t`; the backward pass needs all of them.
//!
//! ## Backward Pass (BPTT)
//!
//! The same weights are used at every step, so each weight's gradient is the
//! sum of its per-step contributions. Walking the window in reverse carries
//! the gradient that flows into `h_{t-1}` through the recurrence:
//!
//! ```text
//! dh_next = 0
//! for t = L-1 down to 0:
//!     dy      = p_t - onehot(targets[t])      softmax + cross-entropy
//!     dWyh   += dy ⊗ h_t
//!     dby    += dy
//!     dh      = Wyhᵀ · dy + dh_next
//!     dh_raw  = dh ⊙ (1 - h_t²)               through tanh
//!     dbh    += dh_raw
//!     dWxh   += dh_raw ⊗ x_t
//!     dWhh   += dh_raw ⊗ h_{t-1}
//!     dh_next = Whhᵀ · dh_raw
//! ```
//!
//! Gradients are not clipped here; that is the optimizer's job.
//!
//! ## Truncation
//!
//! `dh_next` starts at zero, so no gradient flows into the window's
//! carried-in state. The state itself still carries context forward from the
//! previous window.

use super::activation::{softmax, tanh_backward, tanh_forward};
use crate::error::{check_index, Result, RnnError};
use crate::loss::check_targets;
use crate::model::{GradientSet, ParameterSet};
use crate::tensor::Tensor;

/// Values cached by the forward pass for loss and backward computation
#[derive(Clone, Debug)]
pub struct RecurrentCache {
    /// One-hot input vectors, one per step `[V]`
    one_hots: Vec<Tensor>,
    /// Hidden states; slot 0 is the carried-in state, slot `t + 1` is `h_t`
    hidden: Vec<Tensor>,
    /// Output distributions, one per step `[V]`
    probs: Vec<Tensor>,
}

impl RecurrentCache {
    /// Number of time steps in the window
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// True if the window has no steps (never produced by [`forward`])
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// One-hot input vectors
    pub fn one_hots(&self) -> &[Tensor] {
        &self.one_hots
    }

    /// Output probability distributions
    pub fn probs(&self) -> &[Tensor] {
        &self.probs
    }

    /// Hidden state `h_t` after step `t`
    pub fn hidden(&self, t: usize) -> &Tensor {
        &self.hidden[t + 1]
    }

    /// Hidden state entering step `t` (`h_{t-1}`; the carried-in state for `t = 0`)
    pub fn hidden_before(&self, t: usize) -> &Tensor {
        &self.hidden[t]
    }

    /// All hidden states including the carried-in one (`L + 1` entries)
    pub fn hidden_states(&self) -> &[Tensor] {
        &self.hidden
    }
}

/// Advance the recurrence by one step
///
/// Returns `(h_t, p_t)` for input `x` (a one-hot vector) and previous state
/// `h_prev`. Shared by [`forward`] and the sampler.
pub fn step_one_hot(params: &ParameterSet, x: &Tensor, h_prev: &Tensor) -> (Tensor, Tensor) {
    let pre_activation = params
        .wxh
        .matvec(x)
        .add(&params.whh.matvec(h_prev))
        .add(&params.bh);
    let h = tanh_forward(&pre_activation);
    let logits = params.wyh.matvec(&h).add(&params.by);
    let probs = softmax(&logits);
    (h, probs)
}

/// Advance the recurrence by one step from a vocabulary index
pub fn step(params: &ParameterSet, index: usize, h_prev: &Tensor) -> Result<(Tensor, Tensor)> {
    check_index(index, params.vocab_size())?;
    assert_hidden(params, h_prev);
    Ok(step_one_hot(
        params,
        &Tensor::one_hot(index, params.vocab_size()),
        h_prev,
    ))
}

fn assert_hidden(params: &ParameterSet, h: &Tensor) {
    assert_eq!(
        h.shape,
        vec![params.hidden_size()],
        "Hidden state has shape {:?}, expected [{}]",
        h.shape,
        params.hidden_size()
    );
}

/// Forward pass over a window
///
/// # Arguments
///
/// * `params` - Network parameters
/// * `inputs` - Input indices, length `L`, each in `[0, V)`
/// * `hprev` - Hidden state carried in from the previous window `[H]`
///
/// # Returns
///
/// `(cache, h_last)` where `h_last = h_{L-1}` seeds the next window.
///
/// # Errors
///
/// - [`RnnError::EmptyWindow`] if `inputs` is empty
/// - [`RnnError::InvalidVocabularyIndex`] for any index `>= V`
///
/// # Panics
///
/// Panics if `hprev` is not `[H]`.
pub fn forward(
    params: &ParameterSet,
    inputs: &[usize],
    hprev: &Tensor,
) -> Result<(RecurrentCache, Tensor)> {
    if inputs.is_empty() {
        return Err(RnnError::EmptyWindow);
    }
    let vocab_size = params.vocab_size();
    for &index in inputs {
        check_index(index, vocab_size)?;
    }
    assert_hidden(params, hprev);

    let seq_len = inputs.len();
    let mut one_hots = Vec::with_capacity(seq_len);
    let mut hidden = Vec::with_capacity(seq_len + 1);
    let mut probs = Vec::with_capacity(seq_len);
    hidden.push(hprev.clone());

    for (t, &index) in inputs.iter().enumerate() {
        let x = Tensor::one_hot(index, vocab_size);
        let (h, p) = step_one_hot(params, &x, &hidden[t]);
        one_hots.push(x);
        hidden.push(h);
        probs.push(p);
    }

    let h_last = hidden[seq_len].clone();
    let cache = RecurrentCache {
        one_hots,
        hidden,
        probs,
    };
    Ok((cache, h_last))
}

/// Backward pass (BPTT) over a window
///
/// Computes the gradient of the summed cross-entropy loss with respect to
/// every parameter, accumulated over all steps of the window.
///
/// # Errors
///
/// - [`RnnError::LengthMismatch`] if `targets.len()` differs from the window length
/// - [`RnnError::InvalidVocabularyIndex`] for any target `>= V`
pub fn backward(
    params: &ParameterSet,
    cache: &RecurrentCache,
    targets: &[usize],
) -> Result<GradientSet> {
    check_targets(cache.len(), targets, params.vocab_size())?;

    let mut grads = GradientSet::zeros_like(params);
    let mut dh_next = params.zero_hidden();

    for t in (0..cache.len()).rev() {
        let h = cache.hidden(t);

        // Softmax + cross-entropy: dL/dlogits = p - onehot(target)
        let mut dy = cache.probs[t].clone();
        dy.data[targets[t]] -= 1.0;

        // Output layer
        grads.wyh.add_outer(&dy, h);
        grads.by.add_assign(&dy);

        // Into the hidden state: from the output and from step t+1
        let dh = params.wyh.matvec_transposed(&dy).add(&dh_next);
        let dh_raw = tanh_backward(&dh, h);

        grads.bh.add_assign(&dh_raw);
        grads.wxh.add_outer(&dh_raw, &cache.one_hots[t]);
        grads.whh.add_outer(&dh_raw, cache.hidden_before(t));

        dh_next = params.whh.matvec_transposed(&dh_raw);
    }

    Ok(grads)
}
