//! Training Logger
//!
//! Records training metrics to a CSV file so runs can be plotted and compared
//! afterwards. Console output goes through `tracing` in the training loop; this
//! logger only owns the file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use char_rnn::TrainingLogger;
//! use char_rnn::train::StepStats;
//!
//! let mut logger = TrainingLogger::new("training_log.csv")?;
//! let stats = StepStats { step: 100, loss: 52.0, grad_norm: 3.1, clipped: 0 };
//! logger.log(0, &stats, 8.0, Some("To be, or not to be"))?;
//! # Ok::<(), char_rnn::RnnError>(())
//! ```
//!
//! ## CSV Format
//!
//! - `step`: Global training step
//! - `epoch`: Epoch the step belongs to
//! - `elapsed_seconds`: Time since the logger was created
//! - `loss`: Summed cross-entropy over the window
//! - `perplexity`: exp(loss / seq_len)
//! - `grad_norm`: Gradient L2 norm before clipping
//! - `clipped`: Gradient entries changed by clipping
//! - `sample`: Generated text sample, quoted
//!
//! ## Perplexity
//!
//! The window loss is a sum over `seq_len` predictions, so it is averaged
//! before exponentiating. A model guessing uniformly over a vocabulary of
//! `V` characters has perplexity `V`; a perfect model has perplexity 1.

use crate::error::Result;
use crate::train::StepStats;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

const HEADER: &str = "step,epoch,elapsed_seconds,loss,perplexity,grad_norm,clipped,sample";

/// CSV logger for training metrics
pub struct TrainingLogger {
    writer: Box<dyn Write>,
    start_time: Instant,
    rows: usize,
}

impl TrainingLogger {
    /// Create `log_path` and write the CSV header
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        let file = File::create(log_path)?;
        Self::from_writer(BufWriter::new(file))
    }

    /// Log to an arbitrary writer
    pub fn from_writer<W: Write + 'static>(writer: W) -> Result<Self> {
        let mut writer: Box<dyn Write> = Box::new(writer);
        writeln!(writer, "{}", HEADER)?;
        Ok(Self {
            writer,
            start_time: Instant::now(),
            rows: 0,
        })
    }

    /// Append one row
    ///
    /// Each row is flushed immediately so a crashed run keeps its history.
    pub fn log(
        &mut self,
        epoch: usize,
        stats: &StepStats,
        perplexity: f64,
        sample: Option<&str>,
    ) -> Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let sample_escaped = sample.map(|s| s.replace('"', "\"\"")).unwrap_or_default();

        writeln!(
            self.writer,
            "{},{},{:.2},{:.4},{:.4},{:.4},{},\"{}\"",
            stats.step,
            epoch,
            elapsed,
            stats.loss,
            perplexity,
            stats.grad_norm,
            stats.clipped,
            sample_escaped
        )?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, excluding the header
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
