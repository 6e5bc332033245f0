//! Vanilla RNN Parameters
//!
//! This module defines the five tunable tensors of a single-layer Elman
//! recurrent network and the gradient set that mirrors them.
//!
//! ## Architecture
//!
//! ```text
//! x_t  = onehot(input_t)                      [V]
//! h_t  = tanh(Wxh · x_t + Whh · h_{t-1} + bh) [H]
//! y_t  = Wyh · h_t + by                       [V]
//! p_t  = softmax(y_t)                         [V]
//! ```
//!
//! | Tensor | Shape  | Role                       |
//! |--------|--------|----------------------------|
//! | `Wxh`  | [H, V] | input → hidden             |
//! | `Whh`  | [H, H] | hidden → hidden (recurrence) |
//! | `Wyh`  | [V, H] | hidden → output logits     |
//! | `bh`   | [H]    | hidden bias                |
//! | `by`   | [V]    | output bias                |
//!
//! ## Initialization
//!
//! Weight matrices are drawn from `N(0, 1) * 0.01`; biases start at zero.
//! Small weights keep `tanh` in its linear region for the first updates, so
//! gradients neither vanish nor saturate at the start of training.
//!
//! ## Ownership
//!
//! A [`ParameterSet`] is a plain value. Forward and backward passes borrow it
//! immutably; only the optimizer takes it mutably. Shapes are fixed at
//! construction and every mutation goes through same-shape checks.

use crate::tensor::Tensor;
use rand::Rng;

/// Identifies one of the five tunable tensors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Wxh,
    Whh,
    Wyh,
    Bh,
    By,
}

impl Param {
    /// All parameters, in update order
    pub const ALL: [Param; 5] = [Param::Wxh, Param::Whh, Param::Wyh, Param::Bh, Param::By];

    /// Conventional name of the tensor
    pub fn name(self) -> &'static str {
        match self {
            Param::Wxh => "Wxh",
            Param::Whh => "Whh",
            Param::Wyh => "Wyh",
            Param::Bh => "bh",
            Param::By => "by",
        }
    }

    /// True for the three weight matrices, false for the bias vectors
    pub fn is_weight_matrix(self) -> bool {
        matches!(self, Param::Wxh | Param::Whh | Param::Wyh)
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weights and biases of the recurrent network
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSet {
    pub(crate) wxh: Tensor,
    pub(crate) whh: Tensor,
    pub(crate) wyh: Tensor,
    pub(crate) bh: Tensor,
    pub(crate) by: Tensor,
    hidden_size: usize,
    vocab_size: usize,
}

impl ParameterSet {
    /// Standard deviation of the initial weight distribution
    pub const INIT_SCALE: f64 = 0.01;

    /// Create randomly initialised parameters
    ///
    /// # Arguments
    ///
    /// * `hidden_size` - Hidden state width `H`
    /// * `vocab_size` - Vocabulary size `V`
    /// * `rng` - Random source for the weight matrices
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new<R: Rng + ?Sized>(hidden_size: usize, vocab_size: usize, rng: &mut R) -> Self {
        assert!(hidden_size > 0, "hidden_size must be positive");
        assert!(vocab_size > 0, "vocab_size must be positive");

        Self {
            wxh: Tensor::randn(vec![hidden_size, vocab_size], Self::INIT_SCALE, rng),
            whh: Tensor::randn(vec![hidden_size, hidden_size], Self::INIT_SCALE, rng),
            wyh: Tensor::randn(vec![vocab_size, hidden_size], Self::INIT_SCALE, rng),
            bh: Tensor::zeros(vec![hidden_size]),
            by: Tensor::zeros(vec![vocab_size]),
            hidden_size,
            vocab_size,
        }
    }

    /// Build parameters from explicit tensors
    ///
    /// Useful for constructing synthetic models with known behaviour.
    ///
    /// # Panics
    ///
    /// Panics if the shapes are not `[H,V]`, `[H,H]`, `[V,H]`, `[H]`, `[V]`
    /// for the `H` and `V` implied by `bh` and `by`.
    pub fn from_tensors(wxh: Tensor, whh: Tensor, wyh: Tensor, bh: Tensor, by: Tensor) -> Self {
        assert_eq!(bh.shape.len(), 1, "bh must be a vector, got {:?}", bh.shape);
        assert_eq!(by.shape.len(), 1, "by must be a vector, got {:?}", by.shape);
        let hidden_size = bh.shape[0];
        let vocab_size = by.shape[0];
        assert!(
            hidden_size > 0 && vocab_size > 0,
            "dimensions must be positive"
        );

        let expect = |t: &Tensor, shape: [usize; 2], name: &str| {
            assert_eq!(
                t.shape,
                shape.to_vec(),
                "{} has shape {:?}, expected {:?}",
                name,
                t.shape,
                shape
            );
        };
        expect(&wxh, [hidden_size, vocab_size], "Wxh");
        expect(&whh, [hidden_size, hidden_size], "Whh");
        expect(&wyh, [vocab_size, hidden_size], "Wyh");

        Self {
            wxh,
            whh,
            wyh,
            bh,
            by,
            hidden_size,
            vocab_size,
        }
    }

    /// Hidden state width `H`
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Vocabulary size `V`
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// All-zero hidden state of the right width
    pub fn zero_hidden(&self) -> Tensor {
        Tensor::zeros(vec![self.hidden_size])
    }

    /// Borrow one tensor
    pub fn get(&self, param: Param) -> &Tensor {
        match param {
            Param::Wxh => &self.wxh,
            Param::Whh => &self.whh,
            Param::Wyh => &self.wyh,
            Param::Bh => &self.bh,
            Param::By => &self.by,
        }
    }

    /// Mutably borrow one tensor's values
    ///
    /// Hands out the data slice rather than the tensor so callers cannot
    /// change its shape.
    pub(crate) fn values_mut(&mut self, param: Param) -> &mut [f64] {
        let tensor = match param {
            Param::Wxh => &mut self.wxh,
            Param::Whh => &mut self.whh,
            Param::Wyh => &mut self.wyh,
            Param::Bh => &mut self.bh,
            Param::By => &mut self.by,
        };
        &mut tensor.data
    }

    /// Total number of scalar parameters
    pub fn num_parameters(&self) -> usize {
        Param::ALL.iter().map(|&p| self.get(p).len()).sum()
    }

    /// True if no parameter is NaN or infinite
    pub fn is_finite(&self) -> bool {
        Param::ALL.iter().all(|&p| self.get(p).is_finite())
    }
}

/// Gradients of the window loss with respect to every parameter
///
/// Produced fresh by each backward pass, consumed by the optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientSet {
    pub wxh: Tensor,
    pub whh: Tensor,
    pub wyh: Tensor,
    pub bh: Tensor,
    pub by: Tensor,
}

impl GradientSet {
    /// Zero gradients shaped like `params`
    pub fn zeros_like(params: &ParameterSet) -> Self {
        Self {
            wxh: params.wxh.zeros_like(),
            whh: params.whh.zeros_like(),
            wyh: params.wyh.zeros_like(),
            bh: params.bh.zeros_like(),
            by: params.by.zeros_like(),
        }
    }

    /// Borrow one gradient tensor
    pub fn get(&self, param: Param) -> &Tensor {
        match param {
            Param::Wxh => &self.wxh,
            Param::Whh => &self.whh,
            Param::Wyh => &self.wyh,
            Param::Bh => &self.bh,
            Param::By => &self.by,
        }
    }

    /// Mutably borrow one gradient tensor
    pub fn get_mut(&mut self, param: Param) -> &mut Tensor {
        match param {
            Param::Wxh => &mut self.wxh,
            Param::Whh => &mut self.whh,
            Param::Wyh => &mut self.wyh,
            Param::Bh => &mut self.bh,
            Param::By => &mut self.by,
        }
    }

    /// Panic unless every gradient has its parameter's shape
    pub fn assert_matches(&self, params: &ParameterSet) {
        for param in Param::ALL {
            params
                .get(param)
                .assert_same_shape(self.get(param), param.name());
        }
    }
}
