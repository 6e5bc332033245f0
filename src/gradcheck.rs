//! Numerical Gradient Checking
//!
//! Validates the analytic BPTT gradients against central finite differences.
//! This is a diagnostic run once before training, not part of the training
//! loop.
//!
//! ## Algorithm
//!
//! For each of the five parameter tensors, pick `num_checks` random elements
//! θ and compute:
//!
//! ```text
//! numerical = (loss(θ + δ) - loss(θ - δ)) / 2δ
//! relative  = |analytic - numerical| / |analytic + numerical|
//! ```
//!
//! Each evaluation is a full forward pass over the same window from the same
//! carried-in hidden state. Every perturbed value is restored before the
//! next element is checked, so parameters are bit-identical afterwards.
//!
//! ## Reading the Report
//!
//! - **~1e-7 or less**: the backward pass is correct
//! - **~1e-4**: suspicious unless the element's gradient is tiny
//! - **~1 or more**: the backward pass is wrong for this tensor
//!
//! When both gradients are exactly zero (for example a `Wxh` column whose
//! character never appears in the window) the relative error is defined as 0.

use crate::error::Result;
use crate::layers::recurrent::{backward, forward};
use crate::loss::cross_entropy;
use crate::model::{Param, ParameterSet};
use crate::tensor::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One checked parameter element
#[derive(Clone, Debug, PartialEq)]
pub struct GradCheckEntry {
    pub param: Param,
    /// Flat index into the parameter tensor
    pub index: usize,
    pub analytic: f64,
    pub numerical: f64,
    pub relative_error: f64,
}

/// Results of a gradient check
#[derive(Clone, Debug, Default)]
pub struct GradCheckReport {
    pub entries: Vec<GradCheckEntry>,
}

impl GradCheckReport {
    /// Entries for one parameter tensor
    pub fn entries_for(&self, param: Param) -> impl Iterator<Item = &GradCheckEntry> {
        self.entries.iter().filter(move |e| e.param == param)
    }

    /// Mean relative error over the sampled elements of `param`
    ///
    /// Returns 0 if no element of `param` was checked.
    pub fn mean_relative_error(&self, param: Param) -> f64 {
        let (sum, count) = self
            .entries_for(param)
            .fold((0.0, 0usize), |(s, c), e| (s + e.relative_error, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Largest relative error over all entries
    pub fn max_relative_error(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.relative_error)
            .fold(0.0, f64::max)
    }

    /// True if every tensor's mean relative error is below `tolerance`
    pub fn passes(&self, tolerance: f64) -> bool {
        Param::ALL
            .iter()
            .all(|&p| self.mean_relative_error(p) < tolerance)
    }
}

/// Relative error between an analytic and a numerical derivative
pub fn relative_error(analytic: f64, numerical: f64) -> f64 {
    let denominator = (numerical + analytic).abs();
    if denominator == 0.0 {
        if analytic == numerical {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (analytic - numerical).abs() / denominator
    }
}

/// Finite-difference checker configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientChecker {
    /// Perturbation applied to each checked element
    pub delta: f64,
    /// Elements sampled per parameter tensor
    pub num_checks: usize,
}

impl Default for GradientChecker {
    fn default() -> Self {
        Self {
            delta: 1e-5,
            num_checks: 10,
        }
    }
}

impl GradientChecker {
    pub fn new(delta: f64, num_checks: usize) -> Self {
        Self { delta, num_checks }
    }

    /// Compare analytic and numerical gradients on one window
    ///
    /// `params` is borrowed mutably to perturb elements in place; every
    /// element is restored to its exact original value.
    ///
    /// # Errors
    ///
    /// Propagates forward/backward precondition errors (bad indices, empty
    /// window, mismatched lengths).
    pub fn check<R: Rng + ?Sized>(
        &self,
        params: &mut ParameterSet,
        inputs: &[usize],
        targets: &[usize],
        hprev: &Tensor,
        rng: &mut R,
    ) -> Result<GradCheckReport> {
        let (cache, _) = forward(params, inputs, hprev)?;
        let grads = backward(params, &cache, targets)?;
        grads.assert_matches(params);

        let window_loss = |params: &ParameterSet| -> Result<f64> {
            let (cache, _) = forward(params, inputs, hprev)?;
            cross_entropy(cache.probs(), targets)
        };

        let mut report = GradCheckReport::default();
        for param in Param::ALL {
            let size = params.get(param).len();
            for _ in 0..self.num_checks {
                let index = rng.random_range(0..size);
                let original = params.get(param).data[index];

                params.values_mut(param)[index] = original + self.delta;
                let loss_plus = window_loss(params);
                params.values_mut(param)[index] = original - self.delta;
                let loss_minus = window_loss(params);
                params.values_mut(param)[index] = original;
                let (loss_plus, loss_minus) = (loss_plus?, loss_minus?);

                let analytic = grads.get(param).data[index];
                let numerical = (loss_plus - loss_minus) / (2.0 * self.delta);
                let rel = relative_error(analytic, numerical);

                tracing::debug!(
                    param = param.name(),
                    index,
                    numerical,
                    analytic,
                    relative_error = rel,
                    "gradient check"
                );
                report.entries.push(GradCheckEntry {
                    param,
                    index,
                    analytic,
                    numerical,
                    relative_error: rel,
                });
            }

            tracing::info!(
                param = param.name(),
                mean_relative_error = report.mean_relative_error(param),
                "gradient check complete"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn window(vocab: usize, len: usize) -> (Vec<usize>, Vec<usize>) {
        let stream: Vec<usize> = (0..=len).map(|i| (i * 5 + i / 3) % vocab).collect();
        (stream[..len].to_vec(), stream[1..].to_vec())
    }

    #[test]
    fn test_fresh_model_passes() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut params = ParameterSet::new(100, 12, &mut rng);
        let (inputs, targets) = window(12, 25);
        let hprev = params.zero_hidden();

        let report = GradientChecker::default()
            .check(&mut params, &inputs, &targets, &hprev, &mut rng)
            .unwrap();

        assert_eq!(report.entries.len(), 50);
        for p in Param::ALL {
            assert_eq!(report.entries_for(p).count(), 10);
            let err = report.mean_relative_error(p);
            assert!(err < 1e-4, "{} mean relative error {:e}", p, err);
        }
        assert!(report.passes(1e-4));
    }

    #[test]
    fn test_nonzero_carried_state() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut params = ParameterSet::new(20, 6, &mut rng);
        let (inputs, targets) = window(6, 10);
        let values = (0..20).map(|i| (i as f64 - 10.0) * 0.02).collect();
        let hprev = Tensor::new(values, vec![20]);

        let report = GradientChecker::new(1e-5, 5)
            .check(&mut params, &inputs, &targets, &hprev, &mut rng)
            .unwrap();
        assert!(
            report.passes(1e-4),
            "max error {:e}",
            report.max_relative_error()
        );
    }

    #[test]
    fn test_parameters_restored_exactly() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut params = ParameterSet::new(8, 5, &mut rng);
        let before = params.clone();
        let (inputs, targets) = window(5, 6);
        let hprev = params.zero_hidden();

        GradientChecker::default()
            .check(&mut params, &inputs, &targets, &hprev, &mut rng)
            .unwrap();
        assert_eq!(params, before);
    }

    #[test]
    fn test_detects_wrong_gradient() {
        // A gradient of the wrong sign has relative error ∞ (denominator 0)
        // or large; a gradient off by 2x has error 1/3.
        assert!((relative_error(2.0, 1.0) - 1.0 / 3.0).abs() < 1e-15);
        assert!(relative_error(-1.0, 1.0).is_infinite());
        assert_eq!(relative_error(0.0, 0.0), 0.0);
        assert_eq!(relative_error(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_propagates_index_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut params = ParameterSet::new(4, 3, &mut rng);
        let hprev = params.zero_hidden();
        assert!(GradientChecker::default()
            .check(&mut params, &[0, 1], &[1, 3], &hprev, &mut rng)
            .is_err());
    }
}
