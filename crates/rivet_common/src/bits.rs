//! Packed two-state bit vectors for constants and folded values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Number of bits packed per `u64` word.
const BITS_PER_WORD: u32 = 64;

/// A fixed-width vector of two-state bits, packed 64 per `u64` word.
///
/// Bit index 0 is the least significant bit. Used for literal constants in
/// the signal graph, register reset values, and the results of constant
/// folding. Bits above `width` in the last word are always zero.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitsValue {
    width: u32,
    words: Vec<u64>,
}

/// Error returned when parsing a [`BitsValue`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBitsError {
    /// The input string was empty.
    #[error("empty bit string")]
    Empty,
    /// The input contained a character other than `0`, `1`, or `_`.
    #[error("invalid character `{0}` in bit string")]
    InvalidChar(char),
}

impl BitsValue {
    /// Creates a new `BitsValue` of the given width, initialized to all zeros.
    pub fn zero(width: u32) -> Self {
        Self {
            width,
            words: vec![0; word_count(width)],
        }
    }

    /// Creates a `BitsValue` with every bit set.
    pub fn ones(width: u32) -> Self {
        let mut v = Self::zero(width);
        for w in &mut v.words {
            *w = u64::MAX;
        }
        v.clear_padding();
        v
    }

    /// Creates a `BitsValue` from a `u64`, truncating to `width` bits.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::zero(width);
        if let Some(first) = v.words.first_mut() {
            *first = value;
        }
        v.clear_padding();
        v
    }

    /// Parses a binary string such as `"1010_0101"`.
    ///
    /// The leftmost character is the most significant bit. Underscores are
    /// separators and do not count toward the width.
    pub fn from_binary_str(s: &str) -> Result<Self, ParseBitsError> {
        let digits: Vec<char> = s.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return Err(ParseBitsError::Empty);
        }
        let mut v = Self::zero(digits.len() as u32);
        for (i, c) in digits.iter().rev().enumerate() {
            match c {
                '0' => {}
                '1' => v.set(i as u32, true),
                other => return Err(ParseBitsError::InvalidChar(*other)),
            }
        }
        Ok(v)
    }

    /// Returns the number of bits in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = self.words[(index / BITS_PER_WORD) as usize];
        (word >> (index % BITS_PER_WORD)) & 1 == 1
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = &mut self.words[(index / BITS_PER_WORD) as usize];
        let mask = 1u64 << (index % BITS_PER_WORD);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Converts to a `u64`, or `None` if the width exceeds 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > BITS_PER_WORD {
            return None;
        }
        Some(self.words.first().copied().unwrap_or(0))
    }

    /// Returns `true` if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Concatenates values; the first part occupies the most significant bits.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a BitsValue>) -> BitsValue {
        let parts: Vec<&BitsValue> = parts.into_iter().collect();
        let width = parts.iter().map(|p| p.width).sum();
        let mut out = BitsValue::zero(width);
        let mut offset = 0;
        for part in parts.iter().rev() {
            for i in 0..part.width {
                if part.get(i) {
                    out.set(offset + i, true);
                }
            }
            offset += part.width;
        }
        out
    }

    /// Extracts `width` bits starting at bit `low`.
    ///
    /// # Panics
    ///
    /// Panics if the requested range extends past the end of the vector.
    pub fn slice(&self, low: u32, width: u32) -> BitsValue {
        assert!(
            low + width <= self.width,
            "slice [{low} +: {width}] out of bounds for width {}",
            self.width
        );
        let mut out = BitsValue::zero(width);
        for i in 0..width {
            if self.get(low + i) {
                out.set(i, true);
            }
        }
        out
    }

    fn clear_padding(&mut self) {
        let rem = self.width % BITS_PER_WORD;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    fn zip_words(&self, rhs: &BitsValue, what: &str, f: impl Fn(u64, u64) -> u64) -> BitsValue {
        assert_eq!(self.width, rhs.width, "BitsValue width mismatch in {what}");
        BitsValue {
            width: self.width,
            words: self
                .words
                .iter()
                .zip(&rhs.words)
                .map(|(a, b)| f(*a, *b))
                .collect(),
        }
    }
}

impl fmt::Display for BitsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitsValue({self})")
    }
}

impl BitAnd for &BitsValue {
    type Output = BitsValue;

    fn bitand(self, rhs: Self) -> BitsValue {
        self.zip_words(rhs, "AND", |a, b| a & b)
    }
}

impl BitOr for &BitsValue {
    type Output = BitsValue;

    fn bitor(self, rhs: Self) -> BitsValue {
        self.zip_words(rhs, "OR", |a, b| a | b)
    }
}

impl BitXor for &BitsValue {
    type Output = BitsValue;

    fn bitxor(self, rhs: Self) -> BitsValue {
        self.zip_words(rhs, "XOR", |a, b| a ^ b)
    }
}

impl Not for &BitsValue {
    type Output = BitsValue;

    fn not(self) -> BitsValue {
        let mut out = BitsValue {
            width: self.width,
            words: self.words.iter().map(|w| !w).collect(),
        };
        out.clear_padding();
        out
    }
}

/// Returns the number of u64 words needed to store `width` bits.
fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_width() {
        let v = BitsValue::zero(8);
        assert_eq!(v.width(), 8);
        assert!(v.is_zero());
    }

    #[test]
    fn set_get_roundtrip() {
        let mut v = BitsValue::zero(70);
        v.set(0, true);
        v.set(69, true);
        assert!(v.get(0));
        assert!(!v.get(1));
        assert!(v.get(69));
    }

    #[test]
    fn from_u64_truncates() {
        let v = BitsValue::from_u64(0x1ff, 8);
        assert_eq!(v.to_u64(), Some(0xff));
    }

    #[test]
    fn to_u64_too_wide() {
        assert_eq!(BitsValue::zero(65).to_u64(), None);
    }

    #[test]
    fn ones_clears_padding() {
        let v = BitsValue::ones(4);
        assert_eq!(v.to_u64(), Some(0b1111));
    }

    #[test]
    fn from_binary_str_msb_first() {
        let v = BitsValue::from_binary_str("1010_0101").unwrap();
        assert_eq!(v.width(), 8);
        assert_eq!(v.to_u64(), Some(0xa5));
        assert_eq!(format!("{v}"), "10100101");
    }

    #[test]
    fn from_binary_str_errors() {
        assert_eq!(BitsValue::from_binary_str(""), Err(ParseBitsError::Empty));
        assert_eq!(
            BitsValue::from_binary_str("10x1"),
            Err(ParseBitsError::InvalidChar('x'))
        );
    }

    #[test]
    fn concat_first_part_is_most_significant() {
        let a = BitsValue::from_u64(0b1010, 4);
        let b = BitsValue::from_u64(0b0101, 4);
        let r = BitsValue::concat([&a, &b]);
        assert_eq!(r.width(), 8);
        assert_eq!(r.to_u64(), Some(0b1010_0101));
    }

    #[test]
    fn concat_across_word_boundary() {
        let hi = BitsValue::from_u64(1, 1);
        let lo = BitsValue::zero(64);
        let r = BitsValue::concat([&hi, &lo]);
        assert_eq!(r.width(), 65);
        assert!(r.get(64));
        assert!(!r.get(63));
    }

    #[test]
    fn slice_extracts_range() {
        let v = BitsValue::from_u64(0b1010_0101, 8);
        assert_eq!(v.slice(4, 4).to_u64(), Some(0b1010));
        assert_eq!(v.slice(0, 4).to_u64(), Some(0b0101));
    }

    #[test]
    fn bitwise_ops() {
        let a = BitsValue::from_binary_str("1100").unwrap();
        let b = BitsValue::from_binary_str("1010").unwrap();
        assert_eq!(format!("{}", &a & &b), "1000");
        assert_eq!(format!("{}", &a | &b), "1110");
        assert_eq!(format!("{}", &a ^ &b), "0110");
        assert_eq!(format!("{}", !&a), "0011");
    }

    #[test]
    #[should_panic(expected = "width mismatch")]
    fn bitwise_width_mismatch_panics() {
        let _ = &BitsValue::zero(4) & &BitsValue::zero(8);
    }

    #[test]
    fn serde_roundtrip() {
        let v = BitsValue::from_u64(0xdead, 16);
        let json = serde_json::to_string(&v).unwrap();
        let back: BitsValue = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
