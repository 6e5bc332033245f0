//! Clipped SGD Optimizer
//!
//! Plain stochastic gradient descent with element-wise gradient clipping,
//! applied once per training window.
//!
//! ## Algorithm
//!
//! ```text
//! clip dWxh, dWhh, dWyh into [-clip, clip]    (dbh, dby unclipped)
//! for each θ in {Wxh, Whh, Wyh, bh, by}:
//!     θ = θ - lr * dθ
//! ```
//!
//! There is no momentum and no per-parameter adaptive rate: the update is a
//! pure function of the current gradient.
//!
//! ## Example
//!
//! ```rust
//! use char_rnn::{ClippedSgd, GradientSet, ParameterSet};
//! use rand::SeedableRng;
//!
//! let mut params = ParameterSet::new(4, 3, &mut rand::rngs::StdRng::seed_from_u64(0));
//! let mut grads = GradientSet::zeros_like(&params);
//! let before = params.clone();
//!
//! ClippedSgd::new(0.01).apply(&mut params, &mut grads);
//! assert_eq!(params, before); // zero gradients leave parameters untouched
//! ```

use crate::gradients::clip_weight_gradients;
use crate::model::{GradientSet, Param, ParameterSet};
use serde::{Deserialize, Serialize};

/// Stochastic gradient descent with element-wise weight-gradient clipping
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClippedSgd {
    /// Step size
    pub learning_rate: f64,
    /// Bound for weight-matrix gradient entries
    pub clip: f64,
}

impl ClippedSgd {
    /// Default clip bound
    pub const DEFAULT_CLIP: f64 = 5.0;

    /// Create an optimizer with the default clip bound of 5
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            clip: Self::DEFAULT_CLIP,
        }
    }

    /// Override the clip bound
    #[must_use]
    pub fn with_clip(mut self, clip: f64) -> Self {
        self.clip = clip;
        self
    }

    /// Clip `grads` in place, then update `params` in place
    ///
    /// # Returns
    ///
    /// Number of gradient entries changed by clipping
    ///
    /// # Panics
    ///
    /// Panics if any gradient's shape differs from its parameter's.
    pub fn apply(&self, params: &mut ParameterSet, grads: &mut GradientSet) -> usize {
        grads.assert_matches(params);
        let clipped = clip_weight_gradients(grads, self.clip);
        sgd_update(params, grads, self.learning_rate);
        clipped
    }
}

/// Apply `θ -= lr * dθ` to all five parameters
///
/// # Panics
///
/// Panics if any gradient's shape differs from its parameter's.
pub fn sgd_update(params: &mut ParameterSet, grads: &GradientSet, lr: f64) {
    grads.assert_matches(params);
    for param in Param::ALL {
        let grad = grads.get(param);
        for (p, &g) in params.values_mut(param).iter_mut().zip(&grad.data) {
            *p -= lr * g;
        }
    }
}
