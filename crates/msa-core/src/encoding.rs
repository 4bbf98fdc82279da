//! 5-bit packed encoding of the 25-symbol protein alphabet.
//!
//! Encoding scheme: each symbol occupies 5 bits (`0..25`), six symbols packed
//! per 32-bit word (`W = 6`, 30 of 32 bits used). The tail is padded with the
//! `*` code up to the next word boundary, and reads at or past the logical
//! length are defined to return `*` rather than erroring — the caller never
//! has to special-case end-of-sequence.

use crate::alphabet::{self, PAD_CODE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbols packed per 32-bit word.
pub const SYMBOLS_PER_WORD: usize = 6;
const BITS_PER_SYMBOL: u32 = 5;
const SYMBOL_MASK: u32 = 0b1_1111;

/// A finite ordered sequence of alphabet symbols, 5-bit packed into 32-bit
/// words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSequence {
    words: Vec<u32>,
    /// Length in symbols, not words. May be less than `words.len() *
    /// SYMBOLS_PER_WORD`; the remainder reads back as `*`.
    length: usize,
}

impl EncodedSequence {
    /// Encode an ASCII string over the protein alphabet, folding unknown
    /// characters to `X` per [`alphabet::code_of`].
    pub fn from_ascii(seq: &[u8]) -> Self {
        let num_words = (seq.len() + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD;
        let mut words = vec![0u32; num_words.max(0)];

        for (i, &symbol) in seq.iter().enumerate() {
            let code = alphabet::code_of(symbol) as u32;
            let word_idx = i / SYMBOLS_PER_WORD;
            let slot = i % SYMBOLS_PER_WORD;
            words[word_idx] |= code << (slot as u32 * BITS_PER_SYMBOL);
        }

        Self {
            words,
            length: seq.len(),
        }
    }

    /// Length in symbols (excludes padding beyond the last real symbol).
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Indexed read of the alphabet code at `index`. Positions at or beyond
    /// [`Self::len`] return [`PAD_CODE`] rather than `None` — the caller
    /// never has to bounds-check before reading a terminal `*`.
    pub fn get(&self, index: usize) -> u8 {
        let word_idx = index / SYMBOLS_PER_WORD;
        match self.words.get(word_idx) {
            Some(&word) if index < self.length => {
                let slot = index % SYMBOLS_PER_WORD;
                ((word >> (slot as u32 * BITS_PER_SYMBOL)) & SYMBOL_MASK) as u8
            }
            _ => PAD_CODE,
        }
    }

    /// Indexed read as the canonical ASCII symbol.
    pub fn get_symbol(&self, index: usize) -> u8 {
        alphabet::symbol_of(self.get(index))
    }

    /// Decode back to an ASCII string truncated at [`Self::len`] (the
    /// padding tail is not part of the logical sequence).
    pub fn to_ascii(&self) -> Vec<u8> {
        (0..self.length).map(|i| self.get_symbol(i)).collect()
    }

    /// Raw packed words, exposed for the GPU backend's buffer flattening.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// The prefix length up to (but excluding) the first embedded `*`, or
    /// [`Self::len`] if the sequence contains none. A literal `*` embedded
    /// before the natural end of the sequence is end-of-sequence padding,
    /// not a residue, so callers that score a prefix (the pairwise engine's
    /// early-termination rule) scan only up to this length.
    pub fn effective_len(&self) -> usize {
        (0..self.length)
            .find(|&i| self.get(i) == alphabet::PAD_CODE)
            .unwrap_or(self.length)
    }
}

impl fmt::Display for EncodedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_ascii()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_through_ascii() {
        for seq in [
            &b"AAAA"[..],
            b"ACGT",
            b"",
            b"A",
            b"ACGTACGTACGTACGT",
            b"ACGTAC", // exactly one word
        ] {
            let encoded = EncodedSequence::from_ascii(seq);
            assert_eq!(encoded.to_ascii(), seq.to_vec());
        }
    }

    #[test]
    fn reads_past_length_return_padding_symbol() {
        let encoded = EncodedSequence::from_ascii(b"AC");
        assert_eq!(encoded.get_symbol(2), b'*');
        assert_eq!(encoded.get_symbol(100), b'*');
    }

    #[test]
    fn folds_unknown_characters_to_x() {
        let encoded = EncodedSequence::from_ascii(b"A?GT");
        assert_eq!(encoded.to_ascii(), b"AXGT");
    }

    #[test]
    fn effective_len_stops_at_embedded_padding() {
        let encoded = EncodedSequence::from_ascii(b"ACGT***");
        assert_eq!(encoded.len(), 7);
        assert_eq!(encoded.effective_len(), 4);

        let no_padding = EncodedSequence::from_ascii(b"ACGT");
        assert_eq!(no_padding.effective_len(), 4);
    }

    #[test]
    fn word_count_matches_symbols_per_word() {
        let encoded = EncodedSequence::from_ascii(b"ACGTACGT"); // 8 symbols
        assert_eq!(encoded.words().len(), 2); // ceil(8/6)
    }

    proptest! {
        #[test]
        fn encode_decode_roundtrip(seq in "[ACTGRNDQEHILKMFPSWYVBJZX]{0,64}") {
            let encoded = EncodedSequence::from_ascii(seq.as_bytes());
            prop_assert_eq!(encoded.to_ascii(), seq.as_bytes().to_vec());
            prop_assert_eq!(encoded.len(), seq.len());
        }

        #[test]
        fn padding_past_length_is_always_star(seq in "[ACGT]{0,32}", extra in 0usize..16) {
            let encoded = EncodedSequence::from_ascii(seq.as_bytes());
            prop_assert_eq!(encoded.get(seq.len() + extra), PAD_CODE);
        }
    }
}
