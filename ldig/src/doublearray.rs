//! The double-array trie: a packed, pointer-free structure mapping
//! substring features to dense integer ids, plus a linear-scan
//! feature-extraction operator over arbitrary input text.
mod builder;

use std::collections::HashMap as StdHashMap;
use std::io::{Read, Write};

use bincode::{Decode, Encode};
use hashbrown::HashMap;

use crate::common;
use crate::errors::Result;

pub use builder::build;

/// The reserved code for the end-of-string transition. Real code points
/// are assigned codes starting at 1 (§4.1), leaving 0 free to mark a
/// feature that both terminates here and continues as a strict prefix
/// of a longer feature.
const EOS_CODE: i32 = 0;

/// A double-array trie over a fixed, immutable-after-build feature set.
///
/// Invariants (§3):
///  - (I1) index 1 is the root; `check[1] == -1`.
///  - (I2) every used non-root slot `j` satisfies `j = base[i] + code(c)`
///    for some parent `i` and code `c`, with `check[j] == i`.
///  - (I3) a parent's children never collide with another used slot.
///  - (I4) terminal nodes have `base[t] < 0` and `value[t] == -(base[t]+1)`.
///  - (I5) `code` is an injection from the feature alphabet into the
///    positive integers, persisted alongside the arrays.
#[derive(Decode, Encode)]
pub struct DoubleArray {
    base: Vec<i32>,
    check: Vec<i32>,
    value: Vec<i32>,
    code_map: StdHashMap<char, i32>,
}

/// Identifier returned when a string is not present in the trie.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NotFound;

impl DoubleArray {
    /// Builds a double array over a sorted, deduplicated feature list.
    ///
    /// # Errors
    ///
    /// [`crate::errors::LdigError::InvalidFeatureSet`] if `features` is
    /// not strictly sorted, contains a duplicate, or contains an empty
    /// string.
    pub fn build<S: AsRef<str>>(features: &[S]) -> Result<Self> {
        builder::build(features)
    }

    /// The number of slots in the packed arrays (`N` in §8's scenarios).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// `true` if there are no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.base.len() <= 1
    }

    /// Exact point lookup (§4.2). Returns the feature id or [`NotFound`]
    /// if `s` is not a feature in this trie, including when `s` contains
    /// a code point outside the trie's alphabet.
    pub fn get(&self, s: &str) -> std::result::Result<u32, NotFound> {
        let mut i = 1usize;
        for c in s.chars() {
            let Some(&code) = self.code_map.get(&c) else {
                return Err(NotFound);
            };
            match self.step(i, code) {
                Some(j) => i = j,
                None => return Err(NotFound),
            }
        }
        self.terminal_at(i).ok_or(NotFound)
    }

    /// Extracts the multiset of feature occurrences in `text` (§4.3).
    /// For every starting position, the scan advances as far as the
    /// trie allows, counting every terminal node encountered along the
    /// way, including non-maximal matches.
    pub fn extract(&self, text: &str) -> HashMap<u32, u32> {
        let chars: Vec<char> = text.chars().collect();
        let mut counts = HashMap::new();
        for p in 0..chars.len() {
            let mut i = 1usize;
            for &c in &chars[p..] {
                let Some(&code) = self.code_map.get(&c) else {
                    break;
                };
                match self.step(i, code) {
                    Some(j) => i = j,
                    None => break,
                }
                if let Some(id) = self.terminal_at(i) {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Advances from node `i` by `code`, returning the child node if the
    /// transition is valid (in bounds and actually owned by `i`).
    #[inline(always)]
    fn step(&self, i: usize, code: i32) -> Option<usize> {
        let j = self.base[i].checked_add(code)?;
        if j <= 0 {
            return None;
        }
        let j = j as usize;
        if j >= self.check.len() || self.check[j] != i as i32 {
            return None;
        }
        Some(j)
    }

    /// Feature id terminating exactly at node `i`, whether `i` is itself
    /// a leaf (`base[i] < 0`) or an internal node that also holds an
    /// end-of-string child (`i` is a feature and a strict prefix of a
    /// longer one).
    #[inline(always)]
    fn terminal_at(&self, i: usize) -> Option<u32> {
        if self.base[i] < 0 {
            return Some(self.value[i] as u32);
        }
        self.step(i, EOS_CODE).and_then(|j| {
            if self.base[j] < 0 {
                Some(self.value[j] as u32)
            } else {
                None
            }
        })
    }

    /// Serializes the arrays and code map.
    pub fn write<W: Write>(&self, mut wtr: W) -> Result<usize> {
        Ok(bincode::encode_into_std_write(
            self,
            &mut wtr,
            common::bincode_config(),
        )?)
    }

    /// Deserializes a previously-written double array.
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        Ok(bincode::decode_from_std_read(
            &mut rdr,
            common::bincode_config(),
        )?)
    }
}
