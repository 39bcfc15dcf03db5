#![allow(missing_docs, clippy::missing_docs_in_private_items, clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use transpose_map::{MapConfig, MapError, TransposeMap, is_prime};

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, i32),
    InsertUnkeyed(i32),
    Get(u16),
    Remove(u16),
    RemoveUnkeyed,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..64_u16, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => any::<i32>().prop_map(Op::InsertUnkeyed),
        3 => (0..64_u16).prop_map(Op::Get),
        2 => (0..64_u16).prop_map(Op::Remove),
        1 => Just(Op::RemoveUnkeyed),
    ]
}

fn config() -> impl Strategy<Value = MapConfig> {
    (0..8_usize, 0.1..2.0_f64, any::<bool>()).prop_map(|(capacity, load_factor, filter)| {
        MapConfig::default()
            .with_initial_capacity(capacity)
            .with_load_factor(load_factor)
            .with_bloom_filter(filter)
    })
}

fn snapshot(map: &TransposeMap<u16, i32>) -> BTreeMap<Option<u16>, i32> {
    map.iter().map(|(key, value)| (key.copied(), *value)).collect()
}

proptest! {
    #[test]
    fn behaves_like_a_model_map(config in config(), ops in prop::collection::vec(op(), 0..200)) {
        let mut map = TransposeMap::with_config(config).unwrap();
        let mut model: BTreeMap<Option<u16>, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(map.insert(key, value), model.insert(Some(key), value));
                }
                Op::InsertUnkeyed(value) => {
                    prop_assert_eq!(map.insert_unkeyed(value), model.insert(None, value));
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key).copied(), model.get(&Some(key)).copied());
                }
                Op::Remove(key) => {
                    let len = map.len();
                    let removed = map.remove(&key);
                    prop_assert_eq!(removed, model.remove(&Some(key)));
                    prop_assert!(!map.contains_key(&key));
                    let expected = if removed.is_some() { len - 1 } else { len };
                    prop_assert_eq!(map.len(), expected);
                }
                Op::RemoveUnkeyed => {
                    prop_assert_eq!(map.remove_unkeyed(), model.remove(&None));
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        prop_assert_eq!(snapshot(&map), model);
    }

    #[test]
    fn capacity_stays_prime_after_growth(
        keys in prop::collection::btree_set(any::<u32>(), 1..300),
    ) {
        let mut map = TransposeMap::new();
        for &key in &keys {
            map.insert(key, ());
        }
        prop_assert_eq!(map.len(), keys.len());
        if map.capacity() != 16 {
            prop_assert!(is_prime(map.capacity()));
        }
    }

    #[test]
    fn growth_preserves_every_mapping(
        pairs in prop::collection::btree_map(any::<u16>(), any::<i32>(), 1..200),
    ) {
        let config = MapConfig::default().with_initial_capacity(2).with_load_factor(0.5);
        let mut map = TransposeMap::with_config(config).unwrap();
        for (&key, &value) in &pairs {
            map.insert(key, value);
        }

        let expected: BTreeMap<Option<u16>, i32> =
            pairs.iter().map(|(&key, &value)| (Some(key), value)).collect();
        prop_assert_eq!(snapshot(&map), expected);
    }

    #[test]
    fn filter_has_no_false_negatives(
        keys in prop::collection::vec(any::<String>(), 1..200),
        removed in prop::collection::vec(any::<prop::sample::Index>(), 0..50),
    ) {
        let mut map = TransposeMap::with_filter(4).unwrap();
        for key in &keys {
            map.insert(key.clone(), key.len());
        }
        for index in removed {
            map.remove(index.get(&keys));
        }
        for key in &keys {
            prop_assert_eq!(map.might_contain(key.as_str()), Ok(true));
        }
    }

    #[test]
    fn filter_admits_live_keys_across_resizes(
        steps in prop::collection::vec(
            (any::<String>(), any::<Option<prop::sample::Index>>()),
            1..300,
        ),
    ) {
        // A tiny table resizes many times while removals are interleaved
        let mut map = TransposeMap::with_filter(2).unwrap();
        let mut inserted: Vec<String> = Vec::new();
        let mut live: BTreeSet<String> = BTreeSet::new();
        for (key, removal) in steps {
            map.insert(key.clone(), key.len());
            live.insert(key.clone());
            inserted.push(key);
            if let Some(index) = removal {
                let victim = index.get(&inserted);
                map.remove(victim.as_str());
                live.remove(victim);
            }
        }

        prop_assert_eq!(map.len(), live.len());
        for key in &live {
            prop_assert_eq!(map.might_contain(key.as_str()), Ok(true));
            prop_assert_eq!(map.peek(key.as_str()), Some(&key.len()));
        }
        for key in map.keys().iter().flatten() {
            prop_assert!(live.contains(key));
        }
    }

    #[test]
    fn repeated_reads_reach_the_chain_head(chain in 3..20_usize, competitors in 0..3_usize) {
        // A single bucket that never grows: the whole table is one chain
        let config = MapConfig::default().with_initial_capacity(1).with_load_factor(1e9);
        let mut map = TransposeMap::with_config(config).unwrap();
        for key in 0..chain {
            map.insert(key, key);
        }
        // The first key inserted sits at the tail
        let hot = 0_usize;
        let position = |map: &TransposeMap<usize, usize>| {
            map.keys().iter().position(|key| key == Some(&hot)).unwrap()
        };

        let mut previous = position(&map);
        prop_assert_eq!(previous, chain - 1);
        for round in 0..(chain * (competitors + 1)) {
            for offset in 0..competitors {
                let other = 1 + (round + offset) % (chain - 1);
                map.get(&other);
                // A competitor can push the hot key back by at most one slot
                let now = position(&map);
                prop_assert!(now <= previous + 1);
                previous = now;
            }
            map.get(&hot);
            let now = position(&map);
            prop_assert!(now == 0 || now < previous);
            previous = now;
        }
        // Once competitors go quiet, one step per read brings the key to the head
        for _ in 0..previous {
            map.get(&hot);
        }
        prop_assert_eq!(position(&map), 0);
    }
}

#[test]
fn scenario_three_colliding_keys() {
    use std::hash::{Hash, Hasher};

    #[derive(Debug, PartialEq, Eq)]
    struct Same(&'static str);
    impl Hash for Same {
        fn hash<H: Hasher>(&self, state: &mut H) {
            state.write_u8(1);
        }
    }

    let mut map = TransposeMap::new();
    map.insert(Same("a"), 1);
    map.insert(Same("b"), 2);
    map.insert(Same("c"), 3);
    // Prepending puts "c" at the head already
    let order = |map: &TransposeMap<Same, i32>| {
        map.keys().iter().map(|key| key.unwrap().0).collect::<Vec<_>>()
    };
    assert_eq!(order(&map), vec!["c", "b", "a"]);

    for _ in 0..3 {
        assert_eq!(map.get(&Same("c")), Some(&3));
        assert_eq!(order(&map), vec!["c", "b", "a"]);
    }

    assert_eq!(map.get(&Same("a")), Some(&1));
    assert_eq!(order(&map), vec!["c", "a", "b"]);
}

#[test]
fn scenario_small_table_growth() {
    let config = MapConfig::default()
        .with_initial_capacity(2)
        .with_load_factor(0.5)
        .with_bloom_filter(false);
    let mut map = TransposeMap::with_config(config).unwrap();
    map.insert("one", 1);
    map.insert("two", 2);
    map.insert("three", 3);

    assert!(map.capacity() >= 4);
    assert!(is_prime(map.capacity()));
    assert_eq!(map.get("one"), Some(&1));
    assert_eq!(map.get("two"), Some(&2));
    assert_eq!(map.get("three"), Some(&3));
}

#[test]
fn scenario_put_during_iteration() {
    let mut map: TransposeMap<String, i32> = (0..5).map(|i| (i.to_string(), i)).collect();
    let mut cursor = map.entries().cursor();
    assert!(cursor.advance(&map).unwrap().is_some());

    map.insert("new".to_string(), 5);

    assert!(matches!(cursor.advance(&map), Err(MapError::ConcurrentModification { .. })));
}

#[test]
fn scenario_filter_rejects_unknown_keys() {
    let config = MapConfig::default().with_bloom_filter(true);
    let map: TransposeMap<u64, u64> =
        TransposeMap::from_source(config, (0..1000).map(|i| (i, i))).unwrap();
    let unknown: BTreeSet<u64> = (1_000_000..1_001_000).collect();
    let false_positives =
        unknown.iter().filter(|key| map.might_contain(*key).unwrap()).count();

    assert!(false_positives < 10, "{false_positives} false positives");
}
