//! Character Vocabulary
//!
//! A character-level model sees text as a stream of small integer indices,
//! one per character. The vocabulary is the bidirectional mapping between
//! the distinct characters of a corpus and the indices `0..vocab_size`.
//!
//! ## Index Assignment
//!
//! Indices are assigned in sorted character order. Any consistent order would
//! do for training; sorting makes the mapping reproducible across runs on the
//! same corpus.
//!
//! ```text
//! Corpus: "hello"
//! Distinct (sorted): ['e', 'h', 'l', 'o']
//! Mapping: e→0, h→1, l→2, o→3
//! "hello" → [1, 0, 2, 2, 3]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use char_rnn::Vocabulary;
//!
//! let vocab = Vocabulary::from_text("hello");
//! assert_eq!(vocab.vocab_size(), 4);
//!
//! let ids = vocab.encode("hole").unwrap();
//! assert_eq!(vocab.decode(&ids).unwrap(), "hole");
//! ```

use crate::error::{check_index, Result, RnnError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Bidirectional mapping between characters and vocabulary indices
///
/// Serialises as the ordered character list; the reverse map is rebuilt on
/// deserialisation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "Vec<char>", into = "Vec<char>")]
pub struct Vocabulary {
    /// Maps each character to its index
    char_to_index: HashMap<char, usize>,

    /// Character for each index, in index order
    index_to_char: Vec<char>,
}

impl Vocabulary {
    /// Build a vocabulary from the distinct characters of `text`
    pub fn from_text(text: &str) -> Self {
        let distinct: BTreeSet<char> = text.chars().collect();
        Self::from_chars(distinct)
    }

    /// Build a vocabulary from an explicit character list
    ///
    /// Duplicates are ignored; indices follow sorted character order.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let index_to_char: Vec<char> = chars
            .into_iter()
            .collect::<BTreeSet<char>>()
            .into_iter()
            .collect();
        let char_to_index = index_to_char
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        Self {
            char_to_index,
            index_to_char,
        }
    }

    /// Number of distinct characters (`V`)
    pub fn vocab_size(&self) -> usize {
        self.index_to_char.len()
    }

    /// Index of a character
    pub fn char_to_index(&self, c: char) -> Result<usize> {
        self.char_to_index
            .get(&c)
            .copied()
            .ok_or(RnnError::UnknownCharacter(c))
    }

    /// Character at an index
    pub fn index_to_char(&self, index: usize) -> Result<char> {
        check_index(index, self.vocab_size())?;
        Ok(self.index_to_char[index])
    }

    /// Encode text into vocabulary indices
    ///
    /// Fails on the first character the vocabulary was not built with.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        text.chars().map(|c| self.char_to_index(c)).collect()
    }

    /// Decode vocabulary indices back into text
    pub fn decode(&self, ids: &[usize]) -> Result<String> {
        ids.iter().map(|&i| self.index_to_char(i)).collect()
    }
}

impl From<Vec<char>> for Vocabulary {
    fn from(chars: Vec<char>) -> Self {
        Self::from_chars(chars)
    }
}

impl From<Vocabulary> for Vec<char> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.index_to_char
    }
}
