//! Train a Character-Level RNN on a Text File
//!
//! Trains on any UTF-8 text, logging a generated sample every
//! `--sample-every` steps as training runs, and optionally verifies the
//! backward pass with a gradient check first.
//!
//! ## Usage
//!
//! ```bash
//! # Default hyperparameters (H=100, L=25, lr=0.01)
//! cargo run --release --example train -- --data input.txt
//!
//! # Small and fast
//! cargo run --release --example train -- --data input.txt --preset tiny
//!
//! # Check gradients before training, log metrics to CSV
//! cargo run --release --example train -- --data input.txt --grad-check --log training_log.csv
//!
//! # Load settings from JSON, then override some of them
//! cargo run --release --example train -- --data input.txt --config rnn.json --epochs 3
//! ```
//!
//! Set `RUST_LOG=debug` to see every gradient-check entry.

use char_rnn::{Corpus, Trainer, TrainingConfig, TrainingLogger};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "train", about = "Train a character-level vanilla RNN")]
struct Args {
    /// Path to training text file
    #[arg(long, default_value = "input.txt")]
    data: String,

    /// Base settings: `default` or `tiny`
    #[arg(long, default_value = "default")]
    preset: String,

    /// JSON configuration file (replaces the preset)
    #[arg(long)]
    config: Option<String>,

    /// Hidden state width
    #[arg(long)]
    hidden: Option<usize>,

    /// Characters per training window
    #[arg(long)]
    seq_len: Option<usize>,

    /// SGD learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Passes through the corpus
    #[arg(long)]
    epochs: Option<usize>,

    /// Element-wise weight gradient clip
    #[arg(long)]
    grad_clip: Option<f64>,

    /// Steps between samples (0 disables)
    #[arg(long)]
    sample_every: Option<usize>,

    /// Characters per sample
    #[arg(long)]
    sample_len: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Run a gradient check on the first window before training
    #[arg(long)]
    grad_check: bool,

    /// Write metrics to this CSV file
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn to_config(&self) -> Result<TrainingConfig, Box<dyn std::error::Error>> {
        let mut config = match (&self.config, self.preset.as_str()) {
            (Some(path), _) => TrainingConfig::from_json_file(path)?,
            (None, "default") => TrainingConfig::default(),
            (None, "tiny") => TrainingConfig::tiny(),
            (None, other) => return Err(format!("unknown preset '{}'", other).into()),
        };

        if let Some(v) = self.hidden {
            config.hidden_size = v;
        }
        if let Some(v) = self.seq_len {
            config.seq_len = v;
        }
        if let Some(v) = self.lr {
            config.learning_rate = v;
        }
        if let Some(v) = self.epochs {
            config.num_epochs = v;
        }
        if let Some(v) = self.grad_clip {
            config.grad_clip = v;
        }
        if let Some(v) = self.sample_every {
            config.sample_every = v;
        }
        if let Some(v) = self.sample_len {
            config.sample_len = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = args.to_config()?;
    let corpus = Corpus::from_file(&args.data)?;

    println!("\n=== Character RNN ===");
    println!("Corpus:      {} characters", corpus.len());
    let vocab_size = corpus.vocab().vocab_size();
    println!("Vocabulary:  {} unique characters", vocab_size);
    println!(
        "Model:       H={} L={} lr={} clip={}",
        config.hidden_size, config.seq_len, config.learning_rate, config.grad_clip
    );
    println!(
        "Windows:     {} per epoch x {} epochs\n",
        corpus.windows_per_epoch(config.seq_len),
        config.num_epochs
    );

    let mut trainer = Trainer::new(config.clone(), vocab_size)?;

    if args.grad_check {
        let window = corpus
            .windows(config.seq_len)
            .next()
            .ok_or("corpus too short for one window")?;
        let report = trainer.grad_check(window.inputs, window.targets)?;
        for param in char_rnn::Param::ALL {
            println!(
                "grad check {:>3}: mean relative error {:.3e}",
                param.name(),
                report.mean_relative_error(param)
            );
        }
        println!();
    }

    let mut logger = args.log.as_deref().map(TrainingLogger::new).transpose()?;
    let summary = trainer.train(&corpus, logger.as_mut())?;

    if let Some(sample) = &summary.last_sample {
        println!("\n--- final sample ---\n{}\n", sample);
    }
    for epoch in &summary.epochs {
        println!(
            "epoch {:3}: mean loss {:.4} ({} degenerate windows)",
            epoch.epoch, epoch.mean_loss, epoch.degenerate_steps
        );
    }
    println!(
        "\nDone: {} steps, final window loss {:.4}",
        summary.total_steps, summary.final_loss
    );

    Ok(())
}
