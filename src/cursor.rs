//! Entry, key and value views over a [`TransposeMap`], and the fail-fast cursors
//! that walk them.
//!
//! A view borrows the map, so its plain iterators can never observe a mutation.
//! A [`Cursor`] holds no borrow between steps: it remembers its position and the
//! map generation it last saw, and refuses to continue once the map has been
//! modified by anything other than the cursor itself.
//!
//! ```rust
//! use transpose_map::{MapError, TransposeMap};
//!
//! let mut map = TransposeMap::new();
//! map.insert("a", 1);
//! map.insert("b", 2);
//!
//! let mut cursor = map.values().cursor();
//! while let Some(value) = cursor.advance(&map)? {
//!     if *value == 1 {
//!         cursor.remove(&mut map)?;
//!     }
//! }
//! assert_eq!(map.len(), 1);
//!
//! let mut cursor = map.keys().cursor();
//! map.insert("c", 3);
//! assert!(matches!(cursor.advance(&map), Err(MapError::ConcurrentModification { .. })));
//! # Ok::<(), MapError>(())
//! ```

use std::marker::PhantomData;

use crate::{
    error::{MapError, Result},
    transpose_map::{Iter, TransposeMap},
};

/// Shapes the item a cursor yields from an entry
pub trait Projection {
    /// Item produced for one entry
    type Item<'a, K: 'a, V: 'a>;

    /// Builds the item from an entry's key and value
    fn project<'a, K, V>(key: Option<&'a K>, value: &'a V) -> Self::Item<'a, K, V>;
}

/// Yields `(key, value)` pairs
#[derive(Debug, Clone, Copy)]
pub struct EntryProjection;

/// Yields keys
#[derive(Debug, Clone, Copy)]
pub struct KeyProjection;

/// Yields values
#[derive(Debug, Clone, Copy)]
pub struct ValueProjection;

impl Projection for EntryProjection {
    type Item<'a, K: 'a, V: 'a> = (Option<&'a K>, &'a V);

    fn project<'a, K, V>(key: Option<&'a K>, value: &'a V) -> Self::Item<'a, K, V> {
        (key, value)
    }
}

impl Projection for KeyProjection {
    type Item<'a, K: 'a, V: 'a> = Option<&'a K>;

    fn project<'a, K, V>(key: Option<&'a K>, _value: &'a V) -> Self::Item<'a, K, V> {
        key
    }
}

impl Projection for ValueProjection {
    type Item<'a, K: 'a, V: 'a> = &'a V;

    fn project<'a, K, V>(_key: Option<&'a K>, value: &'a V) -> Self::Item<'a, K, V> {
        value
    }
}

/// Fail-fast position in a [`TransposeMap`], walking buckets in order and each chain
/// head to tail.
///
/// The cursor must only be used with the map that created it. Once it reports the
/// end it stays there.
#[derive(Debug, Clone)]
pub struct Cursor<P> {
    /// Bucket of the next entry to examine
    bucket: usize,
    /// Slot within that bucket's chain
    slot: usize,
    /// Map generation the cursor last synchronized with
    expected: u64,
    /// Position of the entry returned by the last advance, cleared by removal
    last: Option<(usize, usize)>,
    /// Set once the end has been reached
    exhausted: bool,
    /// What each step yields
    _projection: PhantomData<P>,
}

impl<P: Projection> Cursor<P> {
    /// Starts a cursor at the first bucket, synchronized with `generation`
    fn new(generation: u64) -> Self {
        Self {
            bucket: 0,
            slot: 0,
            expected: generation,
            last: None,
            exhausted: false,
            _projection: PhantomData,
        }
    }

    /// Moves to the next entry and returns it, or `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ConcurrentModification`] if the map moved or removed
    /// entries since the cursor was created or last removed through.
    pub fn advance<'m, K, V, S>(
        &mut self,
        map: &'m TransposeMap<K, V, S>,
    ) -> Result<Option<P::Item<'m, K, V>>> {
        self.check(map)?;
        if self.exhausted {
            return Ok(None);
        }

        let chains = map.chains();
        while let Some(chain) = chains.get(self.bucket) {
            if let Some(entry) = chain.get(self.slot) {
                self.last = Some((self.bucket, self.slot));
                self.slot = self.slot.saturating_add(1);
                return Ok(Some(P::project(entry.key.as_ref(), &entry.value)));
            }
            self.bucket = self.bucket.saturating_add(1);
            self.slot = 0;
        }

        self.exhausted = true;
        Ok(None)
    }

    /// Removes the entry returned by the last [`advance`](Self::advance) and
    /// resynchronizes, so the cursor can keep going.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IllegalCursorState`] if nothing was returned since the
    /// cursor was created or last removed through, and
    /// [`MapError::ConcurrentModification`] if the map changed behind the cursor.
    pub fn remove<K, V, S>(&mut self, map: &mut TransposeMap<K, V, S>) -> Result<(Option<K>, V)> {
        let (bucket, slot) = self.last.ok_or(MapError::IllegalCursorState)?;
        self.check(map)?;
        self.last = None;

        let entry = map.unlink(bucket, slot).ok_or(MapError::IllegalCursorState)?;
        if self.bucket == bucket && self.slot > slot {
            self.slot = self.slot.saturating_sub(1);
        }
        self.expected = map.generation();
        Ok((entry.key, entry.value))
    }

    /// Fails if the map generation moved since the last synchronization
    fn check<K, V, S>(&self, map: &TransposeMap<K, V, S>) -> Result<()> {
        let actual = map.generation();
        if actual == self.expected {
            Ok(())
        } else {
            Err(MapError::ConcurrentModification { expected: self.expected, actual })
        }
    }
}

/// View of the `(key, value)` pairs of a map
#[derive(Debug)]
pub struct EntriesView<'a, K, V, S> {
    /// The viewed map
    map: &'a TransposeMap<K, V, S>,
}

/// View of the keys of a map
#[derive(Debug)]
pub struct KeysView<'a, K, V, S> {
    /// The viewed map
    map: &'a TransposeMap<K, V, S>,
}

/// View of the values of a map
#[derive(Debug)]
pub struct ValuesView<'a, K, V, S> {
    /// The viewed map
    map: &'a TransposeMap<K, V, S>,
}

impl<'a, K, V, S> EntriesView<'a, K, V, S> {
    /// Number of entries in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrowing iterator over the pairs
    #[must_use]
    pub fn iter(&self) -> Iter<'a, K, V> {
        self.map.iter()
    }

    /// Fail-fast cursor over the pairs, supporting removal
    #[must_use]
    pub fn cursor(&self) -> Cursor<EntryProjection> {
        Cursor::new(self.map.generation())
    }
}

impl<'a, K, V, S> KeysView<'a, K, V, S> {
    /// Number of keys in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrowing iterator over the keys
    #[must_use]
    pub fn iter(&self) -> KeysIter<'a, K, V> {
        KeysIter { inner: self.map.iter() }
    }

    /// Fail-fast cursor over the keys, supporting removal
    #[must_use]
    pub fn cursor(&self) -> Cursor<KeyProjection> {
        Cursor::new(self.map.generation())
    }
}

impl<'a, K, V, S> ValuesView<'a, K, V, S> {
    /// Number of values in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrowing iterator over the values
    #[must_use]
    pub fn iter(&self) -> ValuesIter<'a, K, V> {
        ValuesIter { inner: self.map.iter() }
    }

    /// Fail-fast cursor over the values, supporting removal
    #[must_use]
    pub fn cursor(&self) -> Cursor<ValueProjection> {
        Cursor::new(self.map.generation())
    }
}

/// Iterator over the keys of a map
#[derive(Debug, Clone)]
pub struct KeysIter<'a, K, V> {
    /// Underlying entry iterator
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for KeysIter<'a, K, V> {
    type Item = Option<&'a K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over the values of a map
#[derive(Debug, Clone)]
pub struct ValuesIter<'a, K, V> {
    /// Underlying entry iterator
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesIter<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> TransposeMap<K, V, S> {
    /// View of the `(key, value)` pairs
    #[must_use]
    pub fn entries(&self) -> EntriesView<'_, K, V, S> {
        EntriesView { map: self }
    }

    /// View of the keys
    #[must_use]
    pub fn keys(&self) -> KeysView<'_, K, V, S> {
        KeysView { map: self }
    }

    /// View of the values
    #[must_use]
    pub fn values(&self) -> ValuesView<'_, K, V, S> {
        ValuesView { map: self }
    }
}
