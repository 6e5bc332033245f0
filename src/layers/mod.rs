//! Neural Network Layers
//!
//! ## Layers
//!
//! - **activation**: tanh (forward and backward) and softmax
//! - **recurrent**: the Elman recurrence, its forward pass and BPTT
//!
//! ## Design Pattern
//!
//! Layers are free functions over borrowed parameters, following the
//! forward/cache/backward shape:
//!
//! ```rust,ignore
//! fn forward(params: &Params, input: ...) -> Result<(Cache, Output)>;
//! fn backward(params: &Params, cache: &Cache, targets: ...) -> Result<Gradients>;
//! ```
//!
//! Nothing is stored on the parameters between the two calls; the cache is
//! the only state, and it is dropped once the gradients exist.

pub mod activation;
pub mod recurrent;

pub use activation::{softmax, tanh_backward, tanh_forward};
pub use recurrent::{backward, forward, step, step_one_hot, RecurrentCache};
