//! Error type shared by the map, its configuration and its cursors

use thiserror::Error;

/// Errors reported by [`TransposeMap`](crate::TransposeMap) and its cursors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// The configuration handed to a constructor was rejected
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },

    /// `might_contain` was called on a map built without the membership filter
    #[error("Membership filter is not enabled for this map")]
    FilterDisabled,

    /// The map was structurally modified behind a cursor's back
    #[error("Concurrent modification: cursor expected generation {expected}, map is at {actual}")]
    ConcurrentModification {
        /// Generation the cursor last synchronized with
        expected: u64,
        /// Generation the map reports now
        actual: u64,
    },

    /// Cursor removal without a preceding advance, or twice in a row
    #[error("Cursor has no current entry to remove")]
    IllegalCursorState,

    /// Growing the bucket array would overflow `usize`
    #[error("Capacity overflow: cannot grow past {requested} buckets")]
    CapacityOverflow {
        /// Bucket count that could not be represented
        requested: usize,
    },

    /// The allocator refused the new bucket array
    #[error("Allocation failed for {buckets} buckets")]
    AllocationFailed {
        /// Bucket count that was requested
        buckets: usize,
    },
}

impl MapError {
    /// Creates an [`MapError::InvalidConfig`] from anything string-like
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            MapError::invalid_config("load factor must be positive").to_string(),
            "Invalid configuration: load factor must be positive"
        );
        assert_eq!(
            MapError::FilterDisabled.to_string(),
            "Membership filter is not enabled for this map"
        );
        assert_eq!(
            MapError::ConcurrentModification { expected: 3, actual: 4 }.to_string(),
            "Concurrent modification: cursor expected generation 3, map is at 4"
        );
    }
}
