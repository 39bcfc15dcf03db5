//! Construction options for [`TransposeMap`](crate::TransposeMap)

use crate::error::{MapError, Result};

/// Bucket count used by [`MapConfig::default`] and restored by `clear`
pub const DEFAULT_CAPACITY: usize = 16;

/// Growth trigger used by [`MapConfig::default`] and restored by `clear`
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Filter bits allocated per bucket of the table
pub const FILTER_BITS_PER_BUCKET: usize = 10;

/// Filter size for a map at the default capacity
pub const DEFAULT_FILTER_BITS: usize = DEFAULT_CAPACITY * FILTER_BITS_PER_BUCKET;

/// Number of hash functions the membership filter applies per key
pub const FILTER_HASHES: u32 = 7;

/// Options recognised when building a map.
///
/// ```rust
/// use transpose_map::{MapConfig, TransposeMap};
///
/// let config = MapConfig::default().with_initial_capacity(64).with_bloom_filter(true);
/// let map: TransposeMap<String, u32> = TransposeMap::with_config(config).unwrap();
/// assert!(map.has_filter());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Bucket count at creation
    pub initial_capacity: usize,
    /// Ratio of inserted entries to buckets that triggers growth; must be finite and positive
    pub load_factor: f64,
    /// Whether to maintain the probabilistic membership pre-filter
    pub bloom_filter: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            bloom_filter: false,
        }
    }
}

impl MapConfig {
    /// Sets the bucket count at creation
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the growth trigger ratio
    #[must_use]
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Enables or disables the membership filter
    #[must_use]
    pub fn with_bloom_filter(mut self, enabled: bool) -> Self {
        self.bloom_filter = enabled;
        self
    }

    /// Checks the options, reporting the first problem found
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] when the load factor is not a finite
    /// positive number, or when the filter size for the initial capacity overflows.
    pub fn validate(&self) -> Result<()> {
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(MapError::invalid_config(format!(
                "load factor must be finite and positive, got {}",
                self.load_factor
            )));
        }
        if self.bloom_filter && self.filter_bits().is_none() {
            return Err(MapError::invalid_config(format!(
                "initial capacity {} is too large for a membership filter",
                self.initial_capacity
            )));
        }
        Ok(())
    }

    /// Bit count of the membership filter sized for the initial capacity
    pub(crate) fn filter_bits(&self) -> Option<usize> {
        filter_bits_for(self.initial_capacity)
    }
}

/// Filter size for a table of `capacity` buckets
pub(crate) fn filter_bits_for(capacity: usize) -> Option<usize> {
    capacity.max(1).checked_mul(FILTER_BITS_PER_BUCKET)
}
