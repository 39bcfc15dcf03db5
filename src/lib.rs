//! # Transpose Map
//!
//! A chained hash map with two lookup accelerators:
//!
//! - **Self-organizing chains**: each successful [`TransposeMap::get`] swaps the
//!   entry with its predecessor in the bucket chain, so hot keys migrate towards the
//!   head of their chain one step per access.
//! - **Membership pre-filter**: an optional [`BloomFilter`] answers "definitely
//!   absent" for most missing keys without walking a chain.
//!
//! The table grows to the first prime above twice its bucket count whenever the
//! number of insertions since the last resize reaches the load factor.
//!
//! ## Basic Usage
//!
//! ```rust
//! use transpose_map::TransposeMap;
//!
//! // Create a new map
//! let mut map = TransposeMap::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Update values
//! assert_eq!(map.insert("apple".to_string(), 10), Some(1));
//! assert_eq!(map.get("apple"), Some(&10));
//!
//! // Remove values
//! map.remove("apple");
//! assert_eq!(map.get("apple"), None);
//! ```
//!
//! ## Membership Filter
//!
//! ```rust
//! use transpose_map::{MapConfig, TransposeMap};
//!
//! let config = MapConfig::default().with_bloom_filter(true);
//! let mut map = TransposeMap::with_config(config)?;
//!
//! map.insert("kate".to_string(), 7);
//! map.remove("kate");
//!
//! // The filter keeps a removed key until the next resize or clear
//! assert_eq!(map.might_contain("kate"), Ok(true));
//! assert!(!map.contains_key("kate"));
//! # Ok::<(), transpose_map::MapError>(())
//! ```

/// Module implementing the Bloom filter used as a negative pre-check
mod bloom_filter;
/// Module holding construction options and sizing constants
mod config;
/// Module implementing collection views and fail-fast cursors
mod cursor;
/// Module defining the crate error type
mod error;
/// Module implementing the chained, self-organizing hash map
mod transpose_map;
/// Prime helpers for the growth policy
mod utils;

pub use bloom_filter::BloomFilter;
pub use config::{
    DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, FILTER_BITS_PER_BUCKET, FILTER_HASHES, MapConfig,
};
pub use cursor::{
    Cursor, EntriesView, EntryProjection, KeyProjection, KeysIter, KeysView, Projection,
    ValueProjection, ValuesIter, ValuesView,
};
pub use error::{MapError, Result};
pub use transpose_map::{Iter, TransposeMap};
pub use utils::{is_prime, next_prime_after};
