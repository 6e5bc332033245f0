//! Autoregressive Sampling
//!
//! Generates a character sequence by running the recurrence one step at a
//! time and feeding each drawn character back in as the next input.
//!
//! ```text
//! idx = seed
//! h   = hprev
//! repeat num_chars times:
//!     h, p = step(idx, h)
//!     idx  ~ Categorical(p)
//!     emit idx
//! ```
//!
//! Draws are stochastic (not argmax), so output varies between runs unless
//! the random source is seeded. The only state carried between steps is the
//! hidden vector and the current index; nothing is cached.
//!
//! ## Example
//!
//! ```rust
//! use char_rnn::{sampler, ParameterSet};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let params = ParameterSet::new(8, 4, &mut StdRng::seed_from_u64(0));
//! let mut rng = StdRng::seed_from_u64(1);
//! let ids = sampler::sample(&params, 2, &params.zero_hidden(), 10, &mut rng).unwrap();
//! assert_eq!(ids.len(), 11);
//! assert_eq!(ids[0], 2);
//! ```

use crate::error::Result;
use crate::layers::recurrent::step;
use crate::model::ParameterSet;
use crate::tensor::Tensor;
use crate::vocab::Vocabulary;
use rand::Rng;
use rand_distr::weighted::WeightedIndex;
use rand_distr::Distribution;

/// Draw an index from a probability vector
///
/// Falls back to the most likely index if the weights cannot form a
/// distribution (all zero, or containing NaN).
pub fn sample_from_probs<R: Rng + ?Sized>(probs: &Tensor, rng: &mut R) -> usize {
    match WeightedIndex::new(&probs.data) {
        Ok(dist) => dist.sample(rng),
        Err(err) => {
            tracing::warn!(%err, "invalid sampling distribution, falling back to argmax");
            argmax(&probs.data)
        }
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

/// Sample `num_chars` indices following `seed_index`
///
/// # Arguments
///
/// * `params` - Network parameters
/// * `seed_index` - First character; also the first element of the output
/// * `hprev` - Hidden state to start from `[H]`
/// * `num_chars` - Number of characters to generate after the seed
/// * `rng` - Random source for the categorical draws
///
/// # Returns
///
/// `num_chars + 1` indices, beginning with `seed_index`
///
/// # Errors
///
/// [`crate::RnnError::InvalidVocabularyIndex`] if the seed is out of range
pub fn sample<R: Rng + ?Sized>(
    params: &ParameterSet,
    seed_index: usize,
    hprev: &Tensor,
    num_chars: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let mut sequence = Vec::with_capacity(num_chars + 1);
    sequence.push(seed_index);

    let mut index = seed_index;
    let mut h = hprev.clone();
    for _ in 0..num_chars {
        let (h_next, probs) = step(params, index, &h)?;
        h = h_next;
        index = sample_from_probs(&probs, rng);
        sequence.push(index);
    }

    Ok(sequence)
}

/// Sample and decode to text through `vocab`
pub fn sample_text<R: Rng + ?Sized>(
    params: &ParameterSet,
    vocab: &Vocabulary,
    seed_index: usize,
    hprev: &Tensor,
    num_chars: usize,
    rng: &mut R,
) -> Result<String> {
    let ids = sample(params, seed_index, hprev, num_chars, rng)?;
    vocab.decode(&ids)
}
