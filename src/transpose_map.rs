use std::{
    borrow::Borrow,
    collections::VecDeque,
    fmt,
    hash::{BuildHasher, Hash, RandomState},
    iter::Flatten,
    mem, slice,
};

use log::{debug, error, trace};

use crate::{
    bloom_filter::BloomFilter,
    config::{
        DEFAULT_CAPACITY, DEFAULT_FILTER_BITS, DEFAULT_LOAD_FACTOR, FILTER_HASHES, MapConfig,
        filter_bits_for,
    },
    error::{MapError, Result},
    utils::grown_capacity,
};

/// A key-value pair stored in a chain
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    /// The key, `None` for the single unkeyed entry
    pub(crate) key: Option<K>,
    /// The value associated with the key
    pub(crate) value: V,
}

/// Entries sharing a bucket, head first
pub(crate) type Chain<K, V> = VecDeque<Entry<K, V>>;

/// A chained hash map whose chains reorganize themselves on access.
///
/// Every successful [`get`](Self::get) swaps the found entry with its predecessor in
/// the bucket chain (the transpose heuristic), so frequently read keys drift towards
/// the head of their chain one step per access.
///
/// When built with the membership filter, lookups, removals and updates first ask a
/// [`BloomFilter`] whether the key may be present at all and skip the chain walk on a
/// definite miss. Removal leaves the filter untouched and only a resize or `clear`
/// rebuilds it, so [`might_contain`](Self::might_contain) is an upper bound on
/// presence, not an answer.
///
/// Besides ordinary keys the map holds at most one unkeyed entry, addressed through
/// the `*_unkeyed` methods; it always lives in bucket 0 and bypasses the filter.
///
/// Note: This implementation is not thread-safe. Wrap it in a lock to share it.
#[derive(Clone)]
pub struct TransposeMap<K, V, S = RandomState> {
    /// The bucket chains
    buckets: Vec<Chain<K, V>>,
    /// Number of live entries
    len: usize,
    /// Entries inserted since the last resize; drives the growth check
    inserted: usize,
    /// Ratio of inserted entries to buckets that triggers growth
    load_factor: f64,
    /// Optional negative pre-check over keys
    filter: Option<BloomFilter>,
    /// Bumped on every change that moves an entry, checked by cursors
    generation: u64,
    /// Hasher factory for bucket selection
    hash_builder: S,
}

impl<K, V, S> fmt::Debug for TransposeMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for TransposeMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TransposeMap<K, V, RandomState> {
    /// Creates an empty map with 16 buckets, a 0.75 load factor and no filter
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(DEFAULT_CAPACITY),
            len: 0,
            inserted: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
            filter: None,
            generation: 0,
            hash_builder: RandomState::new(),
        }
    }

    /// Creates an empty map with `capacity` buckets
    ///
    /// # Errors
    ///
    /// Fails if the bucket array cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(MapConfig::default().with_initial_capacity(capacity))
    }

    /// Creates an empty map with `capacity` buckets and the membership filter enabled
    ///
    /// # Errors
    ///
    /// Fails if the filter size overflows or the bucket array cannot be allocated.
    pub fn with_filter(capacity: usize) -> Result<Self> {
        Self::with_config(
            MapConfig::default().with_initial_capacity(capacity).with_bloom_filter(true),
        )
    }

    /// Creates an empty map from validated options
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] for a rejected configuration, or an
    /// allocation error if the bucket array cannot be reserved.
    pub fn with_config(config: MapConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V> TransposeMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Creates a map from `config` and bulk-imports every pair of `source`
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`with_config`](Self::with_config).
    pub fn from_source<I>(config: MapConfig, source: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_config(config)?;
        map.extend(source);
        Ok(map)
    }
}

impl<K, V, S> TransposeMap<K, V, S> {
    /// Creates an empty map from validated options, hashing keys with `hash_builder`.
    ///
    /// A zero initial capacity is raised to a single bucket.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] for a rejected configuration, or an
    /// allocation error if the bucket array cannot be reserved.
    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;

        let capacity = config.initial_capacity.max(1);
        let buckets = try_empty_buckets(capacity)?;
        let filter = match config.filter_bits() {
            Some(bits) if config.bloom_filter => Some(BloomFilter::new(bits, FILTER_HASHES)),
            _ => None,
        };

        Ok(Self {
            buckets,
            len: 0,
            inserted: 0,
            load_factor: config.load_factor,
            filter,
            generation: 0,
            hash_builder,
        })
    }

    /// Returns the number of entries in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current ratio of entries to buckets
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        load_ratio(self.len, self.buckets.len())
    }

    /// Returns the ratio at which the map grows
    #[must_use]
    pub fn configured_load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns true if the map was built with the membership filter
    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Returns an iterator over the entries in bucket order, then chain order
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { chains: self.buckets.iter().flatten(), remaining: self.len }
    }

    /// Returns true if some entry holds `value`. Scans every chain
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, candidate)| candidate == value)
    }

    /// Removes every entry and restores the default capacity and load factor.
    ///
    /// The membership filter, if enabled, is emptied and resized to match.
    pub fn clear(&mut self) {
        self.buckets = empty_buckets(DEFAULT_CAPACITY);
        self.len = 0;
        self.inserted = 0;
        self.load_factor = DEFAULT_LOAD_FACTOR;
        if let Some(filter) = self.filter.as_mut() {
            if filter.len_bits() == DEFAULT_FILTER_BITS {
                filter.clear();
            } else {
                *filter = BloomFilter::new(DEFAULT_FILTER_BITS, FILTER_HASHES);
            }
            debug!("membership filter reset to {} bits", filter.len_bits());
        }
        self.bump_generation();
    }

    /// Returns the membership filter, if enabled
    #[must_use]
    pub fn filter(&self) -> Option<&BloomFilter> {
        self.filter.as_ref()
    }

    /// Unlinks the entry at a (bucket, slot) position
    pub(crate) fn unlink(&mut self, bucket: usize, slot: usize) -> Option<Entry<K, V>> {
        let entry = self.buckets.get_mut(bucket)?.remove(slot)?;
        self.len = self.len.saturating_sub(1);
        self.bump_generation();
        Some(entry)
    }

    /// Counter of structural changes, compared by cursors
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// The bucket chains, for cursors
    pub(crate) fn chains(&self) -> &[Chain<K, V>] {
        &self.buckets
    }

    /// Records a structural change
    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<K, V, S> TransposeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair, returning the previous value of the key if any.
    ///
    /// A new key may first grow the table; if growth fails the failure is logged and
    /// the pair goes into the current table.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_slot(Some(key), value)
    }

    /// Inserts the value of the unkeyed entry, returning its previous value if any
    pub fn insert_unkeyed(&mut self, value: V) -> Option<V> {
        self.insert_slot(None, value)
    }

    /// Retrieves the value for `key`, promoting its entry one step towards the chain head
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, slot) = self.promote(Some(key))?;
        self.entry_at(bucket, slot).map(|entry| &entry.value)
    }

    /// Retrieves a mutable reference to the value for `key`, promoting it like [`get`](Self::get)
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, slot) = self.promote(Some(key))?;
        self.buckets.get_mut(bucket)?.get_mut(slot).map(|entry| &mut entry.value)
    }

    /// Retrieves the value of the unkeyed entry, promoting it like [`get`](Self::get)
    pub fn get_unkeyed(&mut self) -> Option<&V> {
        let (bucket, slot) = self.promote::<K>(None)?;
        self.entry_at(bucket, slot).map(|entry| &entry.value)
    }

    /// Retrieves the value for `key` without reordering its chain
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(Some(key))
    }

    /// Returns true if the map holds `key`. Never reorders
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(Some(key)).is_some()
    }

    /// Returns true if the map holds the unkeyed entry
    pub fn contains_unkeyed(&self) -> bool {
        self.lookup::<K>(None).is_some()
    }

    /// Removes `key`, returning its value. The membership filter keeps the key
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_slot(Some(key)).map(|entry| entry.value)
    }

    /// Removes the unkeyed entry, returning its value
    pub fn remove_unkeyed(&mut self) -> Option<V> {
        self.remove_slot::<K>(None).map(|entry| entry.value)
    }

    /// Asks the membership filter whether `key` may be present.
    ///
    /// A `false` answer is definite; `true` may be a false positive. A removed key
    /// stays admitted until the next resize or [`clear`](Self::clear) rebuilds the
    /// filter from the keys still present.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FilterDisabled`] if the map was built without the filter.
    pub fn might_contain<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.filter.as_ref().map(|filter| filter.contains(key)).ok_or(MapError::FilterDisabled)
    }

    /// Asks the membership filter about the unkeyed entry, which it always admits
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FilterDisabled`] if the map was built without the filter.
    pub fn might_contain_unkeyed(&self) -> Result<bool> {
        self.filter.as_ref().map(|_| true).ok_or(MapError::FilterDisabled)
    }

    /// Computes the bucket of a key; the unkeyed entry always lives in bucket 0
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn bucket_index<Q>(&self, key: Option<&Q>) -> usize
    where
        Q: Hash + ?Sized,
    {
        let Some(key) = key else {
            return 0;
        };
        let capacity = self.buckets.len().max(1) as u64;
        // The remainder is below the bucket count, which is a usize
        (self.hash_builder.hash_one(key) % capacity) as usize
    }

    /// Returns true if the filter proves `key` absent. The unkeyed entry is never rejected
    fn filter_rejects<Q>(&self, key: Option<&Q>) -> bool
    where
        Q: Hash + ?Sized,
    {
        match (&self.filter, key) {
            (Some(filter), Some(key)) => !filter.contains(key),
            _ => false,
        }
    }

    /// Locates `key` as a (bucket, slot) pair without consulting the filter
    fn find<Q>(&self, key: Option<&Q>) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_index(key);
        let slot = self.buckets.get(bucket)?.iter().position(|entry| match (&entry.key, key) {
            (Some(stored), Some(key)) => stored.borrow() == key,
            (None, None) => true,
            _ => false,
        })?;
        Some((bucket, slot))
    }

    /// Filter check followed by a chain walk, without reordering
    fn lookup<Q>(&self, key: Option<&Q>) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.filter_rejects(key) {
            return None;
        }
        let (bucket, slot) = self.find(key)?;
        self.entry_at(bucket, slot).map(|entry| &entry.value)
    }

    /// Finds `key` and swaps it with its chain predecessor, returning its new position
    fn promote<Q>(&mut self, key: Option<&Q>) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.filter_rejects(key) {
            return None;
        }
        let (bucket, slot) = self.find(key)?;
        let Some(previous) = slot.checked_sub(1) else {
            // Already the chain head
            return Some((bucket, slot));
        };

        let chain = self.buckets.get_mut(bucket)?;
        chain.swap(previous, slot);
        // Reordering invalidates cursor positions just like an insertion would
        self.bump_generation();
        trace!("promoted entry in bucket {bucket} from slot {slot} to {previous}");
        Some((bucket, previous))
    }

    /// Shared insertion path for keyed and unkeyed entries
    fn insert_slot(&mut self, key: Option<K>, value: V) -> Option<V> {
        if !self.filter_rejects(key.as_ref()) {
            if let Some((bucket, slot)) = self.find(key.as_ref()) {
                let entry = self.buckets.get_mut(bucket)?.get_mut(slot)?;
                return Some(mem::replace(&mut entry.value, value));
            }
        }

        if load_ratio(self.inserted, self.buckets.len()) >= self.load_factor {
            if let Err(err) = self.grow() {
                error!("keeping {} buckets after failed resize: {err}", self.buckets.len());
            }
        }

        self.link(Entry { key, value });
        None
    }

    /// Prepends a new entry to its chain and registers its key with the filter
    fn link(&mut self, entry: Entry<K, V>) {
        let bucket = self.bucket_index(entry.key.as_ref());
        if let (Some(filter), Some(key)) = (self.filter.as_mut(), entry.key.as_ref()) {
            filter.insert(key);
        }

        if let Some(chain) = self.buckets.get_mut(bucket) {
            chain.push_front(entry);
            self.len = self.len.saturating_add(1);
            self.inserted = self.inserted.saturating_add(1);
            self.bump_generation();
        } else {
            // The bucket array is never empty, so this should never happen
            error!("dropped entry for missing bucket {bucket}");
        }
    }

    /// Unlinks `key` from its chain
    fn remove_slot<Q>(&mut self, key: Option<&Q>) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.filter_rejects(key) {
            return None;
        }
        let (bucket, slot) = self.find(key)?;
        self.unlink(bucket, slot)
    }

    /// Rehashes every entry into the first prime capacity above twice the current one.
    ///
    /// Growth repeats until one more entry fits within the load factor. A load factor
    /// no allocatable table can satisfy fails before any prime search. Everything that
    /// can fail happens before the old table is touched, so on error the map is unchanged.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.buckets.len();
        let max_buckets = max_buckets::<K, V>();
        let overflow = |capacity: usize| MapError::CapacityOverflow {
            requested: capacity.saturating_mul(2),
        };

        // Smallest bucket count keeping one more entry within the load factor
        let needed = load_ratio(self.len.saturating_add(1), 1) / self.load_factor;
        if !needed.is_finite() || needed > max_buckets as f64 {
            // Float to integer casts saturate
            return Err(MapError::CapacityOverflow { requested: needed as usize });
        }

        let mut capacity = old_capacity;
        loop {
            capacity = grown_capacity(capacity)
                .filter(|&next| next <= max_buckets)
                .ok_or_else(|| overflow(capacity))?;
            if load_ratio(self.len.saturating_add(1), capacity) <= self.load_factor {
                break;
            }
        }

        let buckets = try_empty_buckets(capacity)?;
        let filter = match self.filter {
            Some(_) => {
                let bits = filter_bits_for(capacity)
                    .ok_or(MapError::CapacityOverflow { requested: capacity })?;
                Some(BloomFilter::new(bits, FILTER_HASHES))
            }
            None => None,
        };

        let old_buckets = mem::replace(&mut self.buckets, buckets);
        self.filter = filter;
        self.len = 0;
        self.inserted = 0;
        for entry in old_buckets.into_iter().flatten() {
            self.link(entry);
        }
        self.bump_generation();

        debug!(
            "resized from {old_capacity} to {capacity} buckets, replayed {} entries",
            self.len
        );
        Ok(())
    }

    /// Returns the entry at a (bucket, slot) position
    fn entry_at(&self, bucket: usize, slot: usize) -> Option<&Entry<K, V>> {
        self.buckets.get(bucket)?.get(slot)
    }
}

impl<K, V, S> Extend<(K, V)> for TransposeMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TransposeMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S> PartialEq for TransposeMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.iter().all(|(key, value)| match key {
                Some(key) => other.peek(key) == Some(value),
                None => other.lookup::<K>(None) == Some(value),
            })
    }
}

impl<K, V, S> Eq for TransposeMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<'a, K, V, S> IntoIterator for &'a TransposeMap<K, V, S> {
    type Item = (Option<&'a K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`TransposeMap`], in bucket order then chain order
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Every chain, flattened head to tail
    chains: Flatten<slice::Iter<'a, Chain<K, V>>>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.chains.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((entry.key.as_ref(), &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Ratio of `entries` to `capacity` buckets
#[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
fn load_ratio(entries: usize, capacity: usize) -> f64 {
    entries as f64 / capacity.max(1) as f64
}

/// Largest bucket count whose chain array fits in a single allocation
fn max_buckets<K, V>() -> usize {
    isize::MAX.unsigned_abs().checked_div(mem::size_of::<Chain<K, V>>()).unwrap_or(usize::MAX)
}

/// Allocates `capacity` empty chains, aborting on allocation failure
fn empty_buckets<K, V>(capacity: usize) -> Vec<Chain<K, V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, VecDeque::new);
    buckets
}

/// Allocates `capacity` empty chains, reporting allocation failure
fn try_empty_buckets<K, V>(capacity: usize) -> Result<Vec<Chain<K, V>>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(capacity)
        .map_err(|_| MapError::AllocationFailed { buckets: capacity })?;
    buckets.resize_with(capacity, VecDeque::new);
    Ok(buckets)
}
