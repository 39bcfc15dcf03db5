//! Fixed-size Bloom filter used as a negative pre-check in front of the table.
//!
//! Bit positions come from enhanced double hashing (Kirsch and Mitzenmacher,
//! *Less Hashing, Same Performance*):
//!
//! g<sub>i</sub>(x) = (H<sub>1</sub>(x) + iH<sub>2</sub>(x) + i<sup>3</sup>) mod m
//!
//! where H<sub>1</sub> and H<sub>2</sub> are SipHash-1-3 instances with distinct keys.
//! With 10 bits per expected key and 7 hash functions the false positive rate stays
//! below 1%.

use std::hash::{Hash, Hasher};

use bitvec::prelude::*;
use siphasher::sip::SipHasher13;

/// Keys of the first SipHash instance
const PRIMARY_KEYS: (u64, u64) = (0x736f_6d65_7073_6575, 0x646f_7261_6e64_6f6d);
/// Keys of the second SipHash instance
const SECONDARY_KEYS: (u64, u64) = (0x6c79_6765_6e65_7261, 0x7465_6462_7974_6573);

/// Probabilistic set over hashed keys with no false negatives.
///
/// Bits are never cleared individually, so a key cannot be removed once added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    /// The bit vector
    bits: BitVec<u64, Lsb0>,
    /// Number of bit positions set per key
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates an empty filter of `num_bits` bits probed by `num_hashes` hash functions.
    ///
    /// Both counts are raised to at least one so the filter is always addressable.
    #[must_use]
    pub fn new(num_bits: usize, num_hashes: u32) -> Self {
        Self { bits: BitVec::repeat(false, num_bits.max(1)), num_hashes: num_hashes.max(1) }
    }

    /// Records `item` as present
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let (h1, h2) = Self::hash_pair(item);
        for index in Self::positions(self.bits.len(), self.num_hashes, h1, h2) {
            self.bits.set(index, true);
        }
    }

    /// Returns false only if `item` was definitely never inserted
    #[must_use]
    pub fn contains<T: Hash + ?Sized>(&self, item: &T) -> bool {
        let (h1, h2) = Self::hash_pair(item);
        Self::positions(self.bits.len(), self.num_hashes, h1, h2)
            .all(|index| self.bits.get(index).is_some_and(|bit| *bit))
    }

    /// Clears every bit
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Size of the bit vector
    #[must_use]
    pub fn len_bits(&self) -> usize {
        self.bits.len()
    }

    /// Number of hash functions applied per key
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Number of set bits
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Expected false positive probability after `items` distinct insertions
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    pub fn estimated_false_positive_rate(&self, items: usize) -> f64 {
        let k = f64::from(self.num_hashes);
        let m = self.bits.len() as f64;
        let n = items as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    /// Computes the two base hashes of `item`
    fn hash_pair<T: Hash + ?Sized>(item: &T) -> (u64, u64) {
        let mut primary = SipHasher13::new_with_keys(PRIMARY_KEYS.0, PRIMARY_KEYS.1);
        item.hash(&mut primary);
        let mut secondary = SipHasher13::new_with_keys(SECONDARY_KEYS.0, SECONDARY_KEYS.1);
        item.hash(&mut secondary);
        (primary.finish(), secondary.finish())
    }

    /// Bit positions g<sub>0</sub> .. g<sub>k-1</sub> in a vector of `len` bits
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn positions(len: usize, num_hashes: u32, h1: u64, h2: u64) -> impl Iterator<Item = usize> {
        let len = len as u64;
        (0..u64::from(num_hashes)).map(move |i| {
            let hash = h1.wrapping_add(i.wrapping_mul(h2)).wrapping_add(i.wrapping_pow(3));
            // `len` came from a usize, so the remainder fits back into one
            (hash % len) as usize
        })
    }
}
