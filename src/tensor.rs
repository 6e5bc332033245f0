//! Tensor Operations for the Recurrent Network
//!
//! This module provides the minimal dense linear algebra a vanilla RNN needs.
//! Tensors are vectors (`[n]`) or matrices (`[rows, cols]`) stored in a flat
//! `Vec<f64>` with shape and stride information.
//!
//! ## Core Concepts
//!
//! - **Data**: Flat `Vec<f64>` storing all elements in row-major order
//! - **Shape**: Dimensions of the tensor (`[n]` or `[rows, cols]`)
//! - **Strides**: Step sizes for each dimension to compute flat indices
//!
//! ## Why f64?
//!
//! Gradient checking compares the analytic gradient to a central finite
//! difference with a perturbation of `1e-5`. In single precision the rounding
//! error of the loss is larger than the perturbation's effect on it, so the
//! numerical gradient is noise. Double precision keeps relative errors around
//! `1e-7`.
//!
//! ## The Operations BPTT Needs
//!
//! ```text
//! matvec:            y = W · v            (forward: Wxh·x, Whh·h, Wyh·h)
//! matvec_transposed: y = Wᵀ · v           (backward: Wyhᵀ·dy, Whhᵀ·dh_raw)
//! add_outer:         W += a ⊗ b           (backward: dWyh += dy ⊗ h)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use char_rnn::Tensor;
//!
//! let w = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
//! let v = Tensor::new(vec![1.0, 0.0, -1.0], vec![3]);
//! let y = w.matvec(&v);
//! assert_eq!(y.data, vec![-2.0, -2.0]);
//! ```

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// A vector or matrix of `f64` values
///
/// # Memory Layout
///
/// For shape `[2, 3]`, data is stored as:
/// `[row0_col0, row0_col1, row0_col2, row1_col0, row1_col1, row1_col2]`
///
/// Strides would be `[3, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Flat storage of all tensor elements
    pub data: Vec<f64>,
    /// Shape of the tensor (dimensions)
    pub shape: Vec<usize>,
    /// Strides for each dimension (computed from shape)
    pub strides: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor with given data and shape
    ///
    /// # Panics
    ///
    /// Panics if the product of shape dimensions doesn't equal data length
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Self {
        let expected_size: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_size,
            "Data length ({}) doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_size
        );

        let strides = Self::compute_strides(&shape);
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Create a tensor filled with zeros
    ///
    /// ```rust
    /// # use char_rnn::Tensor;
    /// let tensor = Tensor::zeros(vec![3, 4]);
    /// assert_eq!(tensor.data.len(), 12);
    /// assert!(tensor.data.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self::new(vec![0.0; size], shape)
    }

    /// Zero tensor with the same shape as `self`
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape.clone())
    }

    /// Tensor with entries drawn i.i.d. from `N(0, 1) * scale`
    pub fn randn<R: Rng + ?Sized>(shape: Vec<usize>, scale: f64, rng: &mut R) -> Self {
        let size: usize = shape.iter().product();
        let data = (0..size)
            .map(|_| {
                let z: f64 = StandardNormal.sample(rng);
                z * scale
            })
            .collect();
        Self::new(data, shape)
    }

    /// One-hot vector of length `size` with a 1 at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= size`; callers validate indices first.
    pub fn one_hot(index: usize, size: usize) -> Self {
        assert!(
            index < size,
            "one-hot index {} out of range {}",
            index,
            size
        );
        let mut data = vec![0.0; size];
        data[index] = 1.0;
        Self::new(data, vec![size])
    }

    /// Compute strides from shape (row-major layout)
    fn compute_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element `[row, col]` of a matrix
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.strides[0] + col * self.strides[1]]
    }

    fn assert_matrix(&self, op: &str) -> (usize, usize) {
        assert_eq!(
            self.shape.len(),
            2,
            "{} requires a matrix, got shape {:?}",
            op,
            self.shape
        );
        (self.shape[0], self.shape[1])
    }

    fn assert_vector(&self, op: &str) -> usize {
        assert_eq!(
            self.shape.len(),
            1,
            "{} requires a vector, got shape {:?}",
            op,
            self.shape
        );
        self.shape[0]
    }

    /// Panic unless `self` and `other` have identical shapes
    pub fn assert_same_shape(&self, other: &Tensor, what: &str) {
        assert_eq!(
            self.shape, other.shape,
            "Shape mismatch for {}: {:?} vs {:?}",
            what, self.shape, other.shape
        );
    }

    /// Matrix-vector product `self · v`
    ///
    /// For `self` of shape `[m, n]` and `v` of shape `[n]`, returns `[m]` with
    /// `y[i] = Σ_j self[i, j] * v[j]`.
    pub fn matvec(&self, v: &Tensor) -> Tensor {
        let (m, n) = self.assert_matrix("matvec");
        let len = v.assert_vector("matvec");
        assert_eq!(
            n, len,
            "Matrix-vector dimensions incompatible: [{}, {}] · [{}]",
            m, n, len
        );

        let result = self
            .data
            .chunks_exact(n)
            .map(|row| row.iter().zip(&v.data).map(|(&a, &b)| a * b).sum())
            .collect();
        Tensor::new(result, vec![m])
    }

    /// Transposed matrix-vector product `selfᵀ · v`
    ///
    /// For `self` of shape `[m, n]` and `v` of shape `[m]`, returns `[n]` with
    /// `y[j] = Σ_i self[i, j] * v[i]`. Walks rows so memory access stays
    /// sequential; no transposed copy is materialised.
    pub fn matvec_transposed(&self, v: &Tensor) -> Tensor {
        let (m, n) = self.assert_matrix("matvec_transposed");
        let len = v.assert_vector("matvec_transposed");
        assert_eq!(
            m, len,
            "Transposed matrix-vector dimensions incompatible: [{}, {}]ᵀ · [{}]",
            m, n, len
        );

        let mut result = vec![0.0; n];
        for (row, &scale) in self.data.chunks_exact(n).zip(&v.data) {
            for (r, &w) in result.iter_mut().zip(row) {
                *r += scale * w;
            }
        }
        Tensor::new(result, vec![n])
    }

    /// Accumulate the outer product `a ⊗ b` into `self`
    ///
    /// `self[i, j] += a[i] * b[j]`; `self` must be `[a.len(), b.len()]`.
    pub fn add_outer(&mut self, a: &Tensor, b: &Tensor) {
        let (m, n) = self.assert_matrix("add_outer");
        assert_eq!(
            (m, n),
            (a.assert_vector("add_outer"), b.assert_vector("add_outer")),
            "Outer product [{}] ⊗ [{}] does not fit [{}, {}]",
            a.len(),
            b.len(),
            m,
            n
        );

        for (row, &a_val) in self.data.chunks_exact_mut(n).zip(&a.data) {
            for (w, &b_val) in row.iter_mut().zip(&b.data) {
                *w += a_val * b_val;
            }
        }
    }

    /// Element-wise addition of same-shaped tensors
    pub fn add(&self, other: &Tensor) -> Tensor {
        self.assert_same_shape(other, "add");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a + b)
            .collect();
        Tensor::new(data, self.shape.clone())
    }

    /// In-place element-wise addition
    pub fn add_assign(&mut self, other: &Tensor) {
        self.assert_same_shape(other, "add_assign");
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// Element-wise multiplication of same-shaped tensors
    pub fn mul(&self, other: &Tensor) -> Tensor {
        self.assert_same_shape(other, "mul");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a * b)
            .collect();
        Tensor::new(data, self.shape.clone())
    }

    /// Apply `f` to every element
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        Tensor::new(
            self.data.iter().map(|&x| f(x)).collect(),
            self.shape.clone(),
        )
    }

    /// Clamp every element into `[min, max]` in place
    pub fn clamp_in_place(&mut self, min: f64, max: f64) {
        for val in &mut self.data {
            *val = val.clamp(min, max);
        }
    }

    /// `self -= scale * other`, element-wise
    pub fn scaled_sub_assign(&mut self, scale: f64, other: &Tensor) {
        self.assert_same_shape(other, "scaled_sub_assign");
        for (p, &g) in self.data.iter_mut().zip(&other.data) {
            *p -= scale * g;
        }
    }

    /// Sum of all elements
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of squared elements
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().map(|&x| x * x).sum()
    }

    /// True if every element is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
