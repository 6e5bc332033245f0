//! Training Loop
//!
//! This module turns a text corpus into fixed-length training windows and
//! runs the online training loop over them.
//!
//! ## How Windows Are Generated
//!
//! The corpus is cut into non-overlapping windows of `seq_len` characters.
//! The target of each window is the input shifted by one position:
//!
//! ```text
//! Corpus: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
//! Seq length: 4
//!
//! Window 0:  Input: [1, 2, 3, 4]  Target: [2, 3, 4, 5]
//! Window 1:  Input: [5, 6, 7, 8]  Target: [6, 7, 8, 9]
//! (10 has no successor, so no third window)
//! ```
//!
//! One epoch has `(corpus_len - 1) / seq_len` windows; a trailing partial
//! window is dropped.
//!
//! ## Hidden State Carry
//!
//! The final hidden state of each window seeds the next one, so the model
//! sees context beyond `seq_len` characters while gradients are truncated at
//! window boundaries. The state is reset to zero at the start of every epoch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use char_rnn::{Corpus, Trainer, TrainingConfig};
//!
//! let corpus = Corpus::from_file("input.txt")?;
//! let mut trainer = Trainer::new(TrainingConfig::default(), corpus.vocab().vocab_size())?;
//! let summary = trainer.train(&corpus, None)?;
//! println!("final loss {:.3}", summary.final_loss);
//! # Ok::<(), char_rnn::RnnError>(())
//! ```

use crate::error::{Result, RnnError};
use crate::gradcheck::{GradCheckReport, GradientChecker};
use crate::gradients::compute_grad_norm;
use crate::layers::recurrent::{backward, forward};
use crate::loss::{cross_entropy, is_degenerate, perplexity};
use crate::model::ParameterSet;
use crate::optimizer::ClippedSgd;
use crate::sampler::sample_text;
use crate::tensor::Tensor;
use crate::training_logger::TrainingLogger;
use crate::vocab::Vocabulary;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// An encoded training corpus and its vocabulary
#[derive(Clone, Debug)]
pub struct Corpus {
    ids: Vec<usize>,
    vocab: Vocabulary,
}

impl Corpus {
    /// Encode `text` with a vocabulary built from its own characters
    pub fn new(text: &str) -> Result<Self> {
        Self::with_vocab(text, Vocabulary::from_text(text))
    }

    /// Encode `text` with an existing vocabulary
    ///
    /// # Errors
    ///
    /// [`RnnError::UnknownCharacter`] if `text` uses a character outside `vocab`.
    pub fn with_vocab(text: &str, vocab: Vocabulary) -> Result<Self> {
        let ids = vocab.encode(text)?;
        Ok(Self { ids, vocab })
    }

    /// Read and encode a UTF-8 text file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            chars = text.chars().count(),
            "loaded corpus"
        );
        Self::new(&text)
    }

    /// Encoded character stream
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Vocabulary the corpus was encoded with
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Number of characters
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of complete windows of length `seq_len`
    pub fn windows_per_epoch(&self, seq_len: usize) -> usize {
        if seq_len == 0 {
            return 0;
        }
        self.ids.len().saturating_sub(1) / seq_len
    }

    /// Iterate over the windows of one epoch
    pub fn windows(&self, seq_len: usize) -> WindowLoader<'_> {
        WindowLoader {
            ids: &self.ids,
            seq_len,
            index: 0,
            count: self.windows_per_epoch(seq_len),
        }
    }
}

/// One training example: inputs and the inputs shifted by one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window<'a> {
    pub inputs: &'a [usize],
    pub targets: &'a [usize],
}

/// Iterator over the non-overlapping windows of a corpus
pub struct WindowLoader<'a> {
    ids: &'a [usize],
    seq_len: usize,
    index: usize,
    count: usize,
}

impl<'a> Iterator for WindowLoader<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        if self.index >= self.count {
            return None;
        }
        let start = self.index * self.seq_len;
        let end = start + self.seq_len;
        self.index += 1;
        Some(Window {
            inputs: &self.ids[start..end],
            targets: &self.ids[start + 1..end + 1],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowLoader<'_> {}

/// Training configuration
///
/// Missing fields take their defaults when loaded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Hidden state width `H`
    pub hidden_size: usize,
    /// Window length `L`
    pub seq_len: usize,
    /// SGD step size
    pub learning_rate: f64,
    /// Number of passes through the corpus
    pub num_epochs: usize,
    /// Element-wise bound for weight-matrix gradients
    pub grad_clip: f64,
    /// Sample and log every N steps (0 disables)
    pub sample_every: usize,
    /// Characters generated per preview sample
    pub sample_len: usize,
    /// Gradient-check perturbation
    pub grad_check_delta: f64,
    /// Gradient-check elements per tensor
    pub grad_check_samples: usize,
    /// Seed for initialisation and sampling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_size: 100,
            seq_len: 25,
            learning_rate: 0.01,
            num_epochs: 10,
            grad_clip: ClippedSgd::DEFAULT_CLIP,
            sample_every: 100,
            sample_len: 50,
            grad_check_delta: 1e-5,
            grad_check_samples: 10,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Create a tiny configuration for quick experiments and tests
    pub fn tiny() -> Self {
        Self {
            hidden_size: 16,
            seq_len: 8,
            learning_rate: 0.1,
            num_epochs: 2,
            sample_every: 10,
            sample_len: 20,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RnnError::InvalidConfig(msg));

        if self.hidden_size == 0 {
            return invalid("hidden_size must be positive".into());
        }
        if self.seq_len == 0 {
            return invalid("seq_len must be positive".into());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if !(self.grad_clip.is_finite() && self.grad_clip >= 0.0) {
            return invalid(format!(
                "grad_clip must be non-negative, got {}",
                self.grad_clip
            ));
        }
        if !(self.grad_check_delta.is_finite() && self.grad_check_delta > 0.0) {
            return invalid(format!(
                "grad_check_delta must be positive, got {}",
                self.grad_check_delta
            ));
        }
        Ok(())
    }

    /// Optimizer described by this configuration
    pub fn optimizer(&self) -> ClippedSgd {
        ClippedSgd::new(self.learning_rate).with_clip(self.grad_clip)
    }

    /// Gradient checker described by this configuration
    pub fn gradient_checker(&self) -> GradientChecker {
        GradientChecker::new(self.grad_check_delta, self.grad_check_samples)
    }
}

/// Metrics from one training step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats {
    /// Global step number (0-based)
    pub step: usize,
    /// Summed cross-entropy over the window
    pub loss: f64,
    /// L2 norm of the gradients before clipping
    pub grad_norm: f64,
    /// Gradient entries changed by clipping
    pub clipped: usize,
}

/// Metrics from one epoch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub steps: usize,
    /// Mean window loss over the finite losses of the epoch
    pub mean_loss: f64,
    /// Loss of the epoch's last window
    pub last_loss: f64,
    /// Preview samples drawn during the epoch
    pub samples_taken: usize,
    /// Windows whose loss was infinite or NaN
    pub degenerate_steps: usize,
}

/// Outcome of a full training run
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochStats>,
    pub total_steps: usize,
    /// Loss of the last window trained on
    pub final_loss: f64,
    /// Preview samples drawn over the whole run
    pub samples_taken: usize,
    /// Most recent preview sample
    pub last_sample: Option<String>,
}

/// Online trainer: parameters, optimizer and the carried hidden state
pub struct Trainer {
    params: ParameterSet,
    optimizer: ClippedSgd,
    config: TrainingConfig,
    hidden: Tensor,
    rng: StdRng,
    step: usize,
    last_sample: Option<String>,
}

impl Trainer {
    /// Create a trainer with freshly initialised parameters
    pub fn new(config: TrainingConfig, vocab_size: usize) -> Result<Self> {
        config.validate()?;
        if vocab_size == 0 {
            return Err(RnnError::InvalidConfig(
                "vocab_size must be positive".into(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let params = ParameterSet::new(config.hidden_size, vocab_size, &mut rng);
        Ok(Self::from_parts(config, params, rng))
    }

    /// Create a trainer around existing parameters
    ///
    /// `config.hidden_size` is ignored in favour of the parameters' own width.
    pub fn with_params(config: TrainingConfig, params: ParameterSet) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self::from_parts(config, params, rng))
    }

    fn from_parts(config: TrainingConfig, params: ParameterSet, rng: StdRng) -> Self {
        tracing::debug!(
            hidden_size = params.hidden_size(),
            vocab_size = params.vocab_size(),
            parameters = params.num_parameters(),
            "initialised model"
        );
        Self {
            hidden: params.zero_hidden(),
            optimizer: config.optimizer(),
            params,
            config,
            rng,
            step: 0,
            last_sample: None,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Hidden state that will seed the next window
    pub fn hidden(&self) -> &Tensor {
        &self.hidden
    }

    /// Steps taken so far
    pub fn step(&self) -> usize {
        self.step
    }

    /// Most recent preview sample drawn by the training loop
    pub fn last_sample(&self) -> Option<&str> {
        self.last_sample.as_deref()
    }

    /// Reset the carried hidden state to zero
    pub fn reset_hidden(&mut self) {
        self.hidden = self.params.zero_hidden();
    }

    /// Forward, loss, backward and update on one window
    ///
    /// The window's final hidden state replaces the carried state. A
    /// non-finite loss is reported as a warning and the update still runs.
    pub fn train_step(&mut self, inputs: &[usize], targets: &[usize]) -> Result<StepStats> {
        let (cache, h_last) = forward(&self.params, inputs, &self.hidden)?;
        let loss = cross_entropy(cache.probs(), targets)?;
        let mut grads = backward(&self.params, &cache, targets)?;
        drop(cache);

        if is_degenerate(loss) {
            tracing::warn!(step = self.step, loss, "non-finite window loss");
        }

        let grad_norm = compute_grad_norm(&grads);
        let clipped = self.optimizer.apply(&mut self.params, &mut grads);
        self.hidden = h_last;

        let stats = StepStats {
            step: self.step,
            loss,
            grad_norm,
            clipped,
        };
        self.step += 1;
        Ok(stats)
    }

    /// Sample text from the current parameters and carried hidden state
    pub fn sample(
        &mut self,
        vocab: &Vocabulary,
        seed_index: usize,
        num_chars: usize,
    ) -> Result<String> {
        sample_text(
            &self.params,
            vocab,
            seed_index,
            &self.hidden,
            num_chars,
            &mut self.rng,
        )
    }

    /// Gradient-check the current parameters on one window from a zero state
    pub fn grad_check(&mut self, inputs: &[usize], targets: &[usize]) -> Result<GradCheckReport> {
        let hprev = self.params.zero_hidden();
        self.config
            .gradient_checker()
            .check(&mut self.params, inputs, targets, &hprev, &mut self.rng)
    }

    /// Train on every window of `corpus` once, starting from a zero hidden state
    ///
    /// Every `sample_every` steps a preview is drawn from the current hidden
    /// state, emitted as a `tracing` event and written to `logger`.
    pub fn train_epoch(
        &mut self,
        corpus: &Corpus,
        epoch: usize,
        mut logger: Option<&mut TrainingLogger>,
    ) -> Result<EpochStats> {
        self.check_corpus(corpus)?;
        self.reset_hidden();

        let mut loss_sum = 0.0;
        let mut finite_steps = 0;
        let mut degenerate_steps = 0;
        let mut steps = 0;
        let mut samples_taken = 0;
        let mut last_loss = f64::NAN;

        for window in corpus.windows(self.config.seq_len) {
            let stats = self.train_step(window.inputs, window.targets)?;
            steps += 1;
            last_loss = stats.loss;
            if is_degenerate(stats.loss) {
                degenerate_steps += 1;
            } else {
                loss_sum += stats.loss;
                finite_steps += 1;
            }

            let every = self.config.sample_every;
            if every > 0 && stats.step % every == 0 {
                let (seed_index, sample_len) = (window.inputs[0], self.config.sample_len);
                let sample = self.sample(corpus.vocab(), seed_index, sample_len)?;
                let ppl = perplexity(stats.loss, self.config.seq_len);
                tracing::info!(
                    epoch,
                    step = stats.step,
                    loss = stats.loss,
                    perplexity = ppl,
                    grad_norm = stats.grad_norm,
                    sample = %sample,
                    "training"
                );
                if let Some(logger) = logger.as_deref_mut() {
                    logger.log(epoch, &stats, ppl, Some(&sample))?;
                }
                samples_taken += 1;
                self.last_sample = Some(sample);
            }
        }

        let mean_loss = if finite_steps == 0 {
            f64::NAN
        } else {
            loss_sum / finite_steps as f64
        };
        tracing::info!(epoch, steps, mean_loss, degenerate_steps, "epoch complete");

        Ok(EpochStats {
            epoch,
            steps,
            mean_loss,
            last_loss,
            samples_taken,
            degenerate_steps,
        })
    }

    /// Train for `config.num_epochs` epochs
    ///
    /// # Errors
    ///
    /// - [`RnnError::CorpusTooShort`] if the corpus has no complete window
    /// - [`RnnError::InvalidConfig`] if the corpus vocabulary does not match
    ///   the model's
    pub fn train(
        &mut self,
        corpus: &Corpus,
        mut logger: Option<&mut TrainingLogger>,
    ) -> Result<TrainingSummary> {
        self.check_corpus(corpus)?;

        let mut epochs = Vec::with_capacity(self.config.num_epochs);
        for epoch in 0..self.config.num_epochs {
            let stats = self.train_epoch(corpus, epoch, logger.as_deref_mut())?;
            epochs.push(stats);
        }
        if let Some(logger) = logger {
            logger.flush()?;
        }

        let final_loss = epochs.last().map_or(f64::NAN, |e| e.last_loss);
        Ok(TrainingSummary {
            samples_taken: epochs.iter().map(|e| e.samples_taken).sum(),
            epochs,
            total_steps: self.step,
            final_loss,
            last_sample: self.last_sample.clone(),
        })
    }

    fn check_corpus(&self, corpus: &Corpus) -> Result<()> {
        if corpus.vocab().vocab_size() != self.params.vocab_size() {
            return Err(RnnError::InvalidConfig(format!(
                "corpus vocabulary has {} characters, model expects {}",
                corpus.vocab().vocab_size(),
                self.params.vocab_size()
            )));
        }
        if corpus.windows_per_epoch(self.config.seq_len) == 0 {
            return Err(RnnError::CorpusTooShort {
                len: corpus.len(),
                required: self.config.seq_len + 1,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Param;
    use std::fs;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn repeating_corpus(repeats: usize) -> Corpus {
        Corpus::new(&"abcd".repeat(repeats)).unwrap()
    }

    #[test]
    fn test_windows_shift_targets_by_one() {
        let corpus = Corpus::new("abcdefghij").unwrap();
        let windows: Vec<Window> = corpus.windows(4).collect();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].inputs, &[0, 1, 2, 3]);
        assert_eq!(windows[0].targets, &[1, 2, 3, 4]);
        assert_eq!(windows[1].inputs, &[4, 5, 6, 7]);
        assert_eq!(windows[1].targets, &[5, 6, 7, 8]);
    }

    #[test]
    fn test_windows_per_epoch() {
        let corpus = Corpus::new("abcdefghi").unwrap();
        assert_eq!(corpus.windows_per_epoch(4), 2);
        assert_eq!(corpus.windows(4).len(), 2);
        assert_eq!(Corpus::new("abcde").unwrap().windows_per_epoch(4), 1);
        assert_eq!(Corpus::new("abcd").unwrap().windows_per_epoch(4), 0);
        assert_eq!(Corpus::new("").unwrap().windows_per_epoch(4), 0);
        assert_eq!(corpus.windows_per_epoch(0), 0);
    }

    #[test]
    fn test_corpus_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, "hello world").unwrap();

        let corpus = Corpus::from_file(&path).unwrap();
        assert_eq!(corpus.len(), 11);
        assert_eq!(corpus.vocab().vocab_size(), 8);
        assert_eq!(corpus.vocab().decode(corpus.ids()).unwrap(), "hello world");
    }

    #[test]
    fn test_corpus_with_foreign_vocab() {
        let vocab = Vocabulary::from_text("ab");
        assert!(matches!(
            Corpus::with_vocab("abc", vocab),
            Err(RnnError::UnknownCharacter('c'))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.hidden_size, 100);
        assert_eq!(config.seq_len, 25);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.grad_clip, 5.0);
        assert_eq!(config.grad_check_delta, 1e-5);
        assert_eq!(config.grad_check_samples, 10);
        assert!(config.validate().is_ok());
        assert!(TrainingConfig::tiny().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let edits: [fn(&mut TrainingConfig); 6] = [
            |c| c.hidden_size = 0,
            |c| c.seq_len = 0,
            |c| c.learning_rate = 0.0,
            |c| c.learning_rate = f64::NAN,
            |c| c.grad_clip = -1.0,
            |c| c.grad_check_delta = 0.0,
        ];
        for edit in edits {
            let mut config = TrainingConfig::default();
            edit(&mut config);
            assert!(matches!(config.validate(), Err(RnnError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "hidden_size": 32, "learning_rate": 0.05 }"#).unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        assert_eq!(config.hidden_size, 32);
        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.seq_len, 25);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_config_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TrainingConfig::from_json_file(&path),
            Err(RnnError::Json(_))
        ));

        fs::write(&path, r#"{ "seq_len": 0 }"#).unwrap();
        assert!(matches!(
            TrainingConfig::from_json_file(&path),
            Err(RnnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_step_updates_parameters() {
        let config = TrainingConfig {
            hidden_size: 3,
            seq_len: 2,
            learning_rate: 0.1,
            ..TrainingConfig::default()
        };
        let mut trainer = Trainer::new(config, 4).unwrap();
        let before = trainer.params().clone();
        let (_, expected_hidden) = forward(&before, &[0, 1], &before.zero_hidden()).unwrap();

        let stats = trainer.train_step(&[0, 1], &[1, 2]).unwrap();

        assert_eq!(stats.step, 0);
        assert!(stats.loss.is_finite() && stats.loss > 0.0);
        assert!(stats.grad_norm > 0.0);
        assert_eq!(trainer.step(), 1);
        assert_eq!(trainer.hidden(), &expected_hidden);
        assert!(trainer.params().is_finite());
        for p in Param::ALL {
            assert_ne!(trainer.params().get(p), before.get(p), "{} unchanged", p);
        }
    }

    /// Parameters that put probability exactly 1 on index 1 at every step
    fn certain_params() -> ParameterSet {
        let (h, v) = (2, 3);
        ParameterSet::from_tensors(
            Tensor::zeros(vec![h, v]),
            Tensor::zeros(vec![h, h]),
            Tensor::zeros(vec![v, h]),
            Tensor::zeros(vec![h]),
            Tensor::new(vec![0.0, 1000.0, 0.0], vec![v]),
        )
    }

    #[test]
    fn test_zero_loss_leaves_parameters_unchanged() {
        let mut trainer = Trainer::with_params(TrainingConfig::tiny(), certain_params()).unwrap();
        let before = trainer.params().clone();

        let stats = trainer.train_step(&[0, 2, 1], &[1, 1, 1]).unwrap();

        assert_eq!(stats.loss, 0.0);
        assert_eq!(stats.grad_norm, 0.0);
        assert_eq!(trainer.params(), &before);
    }

    #[test]
    fn test_infinite_loss_still_updates_finitely() {
        let mut trainer = Trainer::with_params(TrainingConfig::tiny(), certain_params()).unwrap();

        let stats = trainer.train_step(&[1, 1], &[0, 0]).unwrap();

        assert!(is_degenerate(stats.loss));
        assert!(trainer.params().is_finite());
        assert!(trainer.hidden().is_finite());
    }

    #[test]
    fn test_training_reduces_loss() {
        let config = TrainingConfig {
            learning_rate: 0.3,
            num_epochs: 30,
            sample_every: 0,
            ..TrainingConfig::tiny()
        };
        let corpus = repeating_corpus(50);
        let mut trainer = Trainer::new(config, corpus.vocab().vocab_size()).unwrap();

        let summary = trainer.train(&corpus, None).unwrap();

        assert_eq!(summary.epochs.len(), 30);
        assert_eq!(summary.total_steps, 30 * corpus.windows_per_epoch(8));
        assert_eq!(summary.samples_taken, 0);
        assert!(summary.last_sample.is_none());
        let first = summary.epochs[0].mean_loss;
        let last = summary.epochs[29].mean_loss;
        assert!(last < first, "loss went from {} to {}", first, last);
        assert_eq!(summary.final_loss, summary.epochs[29].last_loss);
        assert!(trainer.params().is_finite());
    }

    #[test]
    fn test_samples_taken_on_schedule() {
        let corpus = repeating_corpus(25);
        let config = TrainingConfig::tiny();
        let steps_per_epoch = corpus.windows_per_epoch(config.seq_len);
        let vocab_size = corpus.vocab().vocab_size();
        let mut trainer = Trainer::new(config.clone(), vocab_size).unwrap();

        let summary = trainer.train(&corpus, None).unwrap();

        // 12 steps per epoch: samples at steps 0 and 10, then 20
        let total = steps_per_epoch * config.num_epochs;
        assert_eq!(summary.total_steps, total);
        assert_eq!(summary.samples_taken, total.div_ceil(config.sample_every));
        assert_eq!(summary.epochs[0].samples_taken, 2);
        assert_eq!(summary.epochs[1].samples_taken, 1);

        let sample = summary.last_sample.unwrap();
        assert_eq!(trainer.last_sample(), Some(sample.as_str()));
        assert_eq!(sample.chars().count(), config.sample_len + 1);
        assert!(sample.chars().all(|c| "abcd".contains(c)));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_samples_stream_through_tracing() {
        let corpus = repeating_corpus(25);
        let mut trainer = Trainer::new(TrainingConfig::tiny(), 4).unwrap();
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();

        let run = || trainer.train(&corpus, None);
        let summary = tracing::subscriber::with_default(subscriber, run).unwrap();

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        let sample_events = output.lines().filter(|l| l.contains(" sample=")).count();
        assert_eq!(sample_events, summary.samples_taken);
        let last = summary.last_sample.unwrap();
        assert!(output.contains(&format!("sample={}", last)));
    }

    #[test]
    fn test_training_is_deterministic() {
        let corpus = repeating_corpus(25);
        let vocab_size = corpus.vocab().vocab_size();
        let run = || {
            let mut trainer = Trainer::new(TrainingConfig::tiny(), vocab_size).unwrap();
            let summary = trainer.train(&corpus, None).unwrap();
            (summary, trainer.params().clone())
        };
        let (a, params_a) = run();
        let (b, params_b) = run();
        assert_eq!(a, b);
        assert_eq!(params_a, params_b);
    }

    #[test]
    fn test_logger_receives_sample_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let corpus = repeating_corpus(25);
        let vocab_size = corpus.vocab().vocab_size();
        let mut trainer = Trainer::new(TrainingConfig::tiny(), vocab_size).unwrap();
        let mut logger = TrainingLogger::new(&path).unwrap();

        let summary = trainer.train(&corpus, Some(&mut logger)).unwrap();

        assert_eq!(logger.rows(), summary.samples_taken);
        drop(logger);
        let lines = fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(lines, summary.samples_taken + 1);
    }

    #[test]
    fn test_corpus_too_short() {
        let corpus = Corpus::new("abcd").unwrap();
        let mut trainer = Trainer::new(TrainingConfig::tiny(), 4).unwrap();
        assert!(matches!(
            trainer.train(&corpus, None),
            Err(RnnError::CorpusTooShort { len: 4, required: 9 })
        ));
    }

    #[test]
    fn test_vocab_mismatch() {
        let corpus = repeating_corpus(10);
        let mut trainer = Trainer::new(TrainingConfig::tiny(), 7).unwrap();
        assert!(matches!(
            trainer.train(&corpus, None),
            Err(RnnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_hidden() {
        let mut trainer = Trainer::new(TrainingConfig::tiny(), 4).unwrap();
        trainer.train_step(&[0, 1, 2], &[1, 2, 3]).unwrap();
        assert!(trainer.hidden().data.iter().any(|&x| x != 0.0));

        trainer.reset_hidden();
        assert_eq!(trainer.hidden(), &trainer.params().zero_hidden());
    }

    fn quiet_tiny() -> TrainingConfig {
        TrainingConfig {
            sample_every: 0,
            ..TrainingConfig::tiny()
        }
    }

    #[test]
    fn test_epoch_carries_hidden_between_windows() {
        // Two windows of length 8
        let corpus = Corpus::new(&format!("{}a", "abcd".repeat(4))).unwrap();
        let windows: Vec<Window> = corpus.windows(8).collect();
        assert_eq!(windows.len(), 2);

        let mut epoch_trainer = Trainer::new(quiet_tiny(), 4).unwrap();
        epoch_trainer.train_epoch(&corpus, 0, None).unwrap();

        let (first, second) = (windows[0], windows[1]);
        let mut manual = Trainer::new(quiet_tiny(), 4).unwrap();
        let start = manual.params().clone();
        let zero = start.zero_hidden();
        let (_, h_first) = forward(&start, first.inputs, &zero).unwrap();
        manual.train_step(first.inputs, first.targets).unwrap();
        assert_eq!(manual.hidden(), &h_first);

        let after_first = manual.params().clone();
        let (cache, h_second) = forward(&after_first, second.inputs, &h_first).unwrap();
        let expected_loss = cross_entropy(cache.probs(), second.targets).unwrap();
        let stats = manual.train_step(second.inputs, second.targets).unwrap();
        assert_eq!(stats.loss, expected_loss);
        assert_eq!(manual.hidden(), &h_second);

        assert_eq!(epoch_trainer.params(), manual.params());
        assert_eq!(epoch_trainer.hidden(), manual.hidden());
    }

    #[test]
    fn test_epoch_starts_from_zero_hidden() {
        // One window of length 8 per epoch
        let corpus = Corpus::new(&format!("{}a", "abcd".repeat(2))).unwrap();
        let window = corpus.windows(8).next().unwrap();
        let mut trainer = Trainer::new(quiet_tiny(), 4).unwrap();

        trainer.train_epoch(&corpus, 0, None).unwrap();
        assert!(trainer.hidden().data.iter().any(|&x| x != 0.0));

        let params = trainer.params().clone();
        let zero = params.zero_hidden();
        let (cache, _) = forward(&params, window.inputs, &zero).unwrap();
        let from_zero = cross_entropy(cache.probs(), window.targets).unwrap();
        let (cache, _) = forward(&params, window.inputs, trainer.hidden()).unwrap();
        let from_carried = cross_entropy(cache.probs(), window.targets).unwrap();
        assert_ne!(from_zero, from_carried);

        let stats = trainer.train_epoch(&corpus, 1, None).unwrap();
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.last_loss, from_zero);
    }

    #[test]
    fn test_trainer_grad_check() {
        let corpus = repeating_corpus(10);
        let config = TrainingConfig::tiny();
        let vocab_size = corpus.vocab().vocab_size();
        let mut trainer = Trainer::new(config.clone(), vocab_size).unwrap();
        let before = trainer.params().clone();
        let window = corpus.windows(config.seq_len).next().unwrap();

        let report = trainer.grad_check(window.inputs, window.targets).unwrap();

        assert_eq!(report.entries.len(), 5 * config.grad_check_samples);
        assert!(
            report.passes(1e-4),
            "max error {:e}",
            report.max_relative_error()
        );
        assert_eq!(trainer.params(), &before);
    }
}
