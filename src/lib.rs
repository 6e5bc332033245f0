//! char-rnn: Character-Level Recurrent Language Model
//!
//! A vanilla (Elman) recurrent network trained on raw text one character at a
//! time, implemented from scratch with hand-written backpropagation through
//! time.
//!
//! # Modules
//!
//! - [`vocab`] - Character vocabulary and encoding
//! - [`tensor`] - Dense f64 vectors and matrices
//! - [`model`] - Parameter and gradient containers
//! - [`layers`] - Activations and the recurrent forward/backward pass
//! - [`loss`] - Cross-entropy and perplexity
//! - [`gradients`] - Gradient norm and element-wise clipping
//! - [`optimizer`] - Clipped SGD
//! - [`sampler`] - Autoregressive text generation
//! - [`gradcheck`] - Finite-difference gradient verification
//! - [`train`] - Corpus windows, configuration and the training loop
//! - [`training_logger`] - CSV metrics log
//!
//! # Example
//!
//! ```rust
//! use char_rnn::{Corpus, Trainer, TrainingConfig};
//!
//! let corpus = Corpus::new(&"hello world ".repeat(20))?;
//! let config = TrainingConfig { num_epochs: 1, ..TrainingConfig::tiny() };
//! let mut trainer = Trainer::new(config, corpus.vocab().vocab_size())?;
//!
//! let summary = trainer.train(&corpus, None)?;
//! assert!(summary.final_loss.is_finite());
//!
//! let text = trainer.sample(corpus.vocab(), 0, 20)?;
//! assert_eq!(text.chars().count(), 21);
//! # Ok::<(), char_rnn::RnnError>(())
//! ```

pub mod error;
pub mod gradcheck;
pub mod gradients;
pub mod layers;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod sampler;
pub mod tensor;
pub mod train;
pub mod training_logger;
pub mod vocab;

// Re-export main types for convenience
pub use error::{Result, RnnError};
pub use gradcheck::{GradCheckEntry, GradCheckReport, GradientChecker};
pub use model::{GradientSet, Param, ParameterSet};
pub use optimizer::ClippedSgd;
pub use tensor::Tensor;
pub use train::{
    Corpus, EpochStats, StepStats, Trainer, TrainingConfig, TrainingSummary, WindowLoader,
};
pub use training_logger::TrainingLogger;
pub use vocab::Vocabulary;
