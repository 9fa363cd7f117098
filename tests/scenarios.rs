use std::collections::BTreeMap;

use ordered_index::{
    AnyIndex, AvlTree, BPlusTree, BTree, IndexConfig, OrderStatistic, OrderedIndex, RedBlackTree,
    Treap, Variant, WavlTree,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn keys_of<I: OrderedIndex<i64, i64>>(index: &I) -> Vec<i64> {
    index.iter().map(|(k, _)| *k).collect()
}

fn shuffled(n: i64, seed: u64) -> Vec<i64> {
    let mut keys: Vec<i64> = (0..n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

// ─── Worked scenarios ────────────────────────────────────────────────────────

#[test]
fn avl_keeps_order_and_ranks() {
    let mut tree = AvlTree::new();
    for key in [10, 20, 30, 40, 50, 25] {
        assert!(tree.insert(key, key));
    }
    tree.validate();
    assert_eq!(keys_of(&tree), [10, 20, 25, 30, 40, 50]);
    assert_eq!(tree.get_by_rank(2), Some((&25, &25)));
    assert_eq!(tree.rank_of(&50), Some(5));
    assert_eq!(tree.get_by_rank(6), None);
}

#[test]
fn bplus_tree_range_walks_leaves() {
    let mut tree = BPlusTree::with_min_degree(3).unwrap();
    for key in [3, 7, 1, 5, 11, 17, 13, 2, 19, 23] {
        assert!(tree.insert(key, key * 100));
    }
    tree.validate();
    let hits: Vec<(i64, i64)> = tree.range(&5, &15).map(|(k, v)| (*k, *v)).collect();
    assert_eq!(hits, [(5, 500), (7, 700), (11, 1100), (13, 1300)]);
}

#[test]
fn every_variant_finds_present_keys_only() {
    for variant in Variant::ALL {
        let mut index = AnyIndex::new(variant);
        for key in [50, 30, 70, 20, 40, 60, 80] {
            index.insert(key, key);
        }
        index.validate();
        assert!(index.contains_key(&40), "{variant}");
        assert!(!index.contains_key(&90), "{variant}");
        assert_eq!(keys_of(&index), [20, 30, 40, 50, 60, 70, 80], "{variant}");
    }
}

// ─── Edge cases shared by every variant ──────────────────────────────────────

#[test]
fn empty_index_answers_nothing() {
    for variant in Variant::ALL {
        let mut index: AnyIndex<i64, i64> = AnyIndex::new(variant);
        assert!(index.is_empty());
        assert_eq!(index.get(&1), None);
        assert_eq!(index.remove(&1), None);
        assert_eq!(index.first_key_value(), None);
        assert_eq!(index.last_key_value(), None);
        assert_eq!(index.range(&0, &10).count(), 0);
        index.validate();
    }
}

#[test]
fn duplicate_insert_is_idempotent() {
    for variant in Variant::ALL {
        let mut index = AnyIndex::new(variant);
        index.extend((0..100).map(|k| (k, k)));
        let before = keys_of(&index);
        for key in 0..100 {
            assert!(!index.insert(key, -1), "{variant} insert({key})");
        }
        assert_eq!(index.len(), 100);
        assert_eq!(keys_of(&index), before);
        assert_eq!(index.get(&42), Some(&42));
        index.validate();
    }
}

#[test]
fn inverted_range_is_empty() {
    for variant in Variant::ALL {
        let mut index = AnyIndex::new(variant);
        index.extend((0..100).map(|k| (k, k)));
        assert_eq!(index.range(&60, &40).count(), 0, "{variant}");
        assert_eq!(index.range(&40, &40).count(), 1, "{variant}");
        assert_eq!(index.range(&200, &300).count(), 0, "{variant}");
        assert_eq!(index.range(&-50, &-1).count(), 0, "{variant}");
    }
}

#[test]
fn range_can_be_restarted_from_a_clone() {
    for variant in Variant::ALL {
        let mut index = AnyIndex::new(variant);
        index.extend(shuffled(500, 7).into_iter().map(|k| (k, k)));
        let mut range = index.range(&100, &199);
        range.next();
        let rest: Vec<_> = range.clone().collect();
        assert_eq!(rest.len(), 99, "{variant}");
        assert!(range.eq(rest.into_iter()));
    }
}

#[test]
fn removing_every_other_key_then_the_rest() {
    for variant in Variant::ALL {
        let config = IndexConfig::default().with_variant(variant).with_min_degree(2);
        let mut index = AnyIndex::with_config(&config).unwrap();
        let keys = shuffled(1_000, 11);
        index.extend(keys.iter().map(|&k| (k, k * 2)));

        for k in (0..1_000i64).step_by(2) {
            assert_eq!(index.remove(&k), Some(k * 2), "{variant} remove({k})");
        }
        index.validate();
        assert_eq!(keys_of(&index), (1..1_000i64).step_by(2).collect::<Vec<_>>());

        for &k in &keys {
            index.remove(&k);
        }
        assert!(index.is_empty());
        index.validate();
    }
}

#[test]
fn borrowed_string_keys() {
    for variant in Variant::ALL {
        let mut index: AnyIndex<String, usize> = AnyIndex::new(variant);
        for (i, word) in ["pear", "apple", "fig", "kiwi", "lime"].iter().enumerate() {
            index.insert((*word).to_string(), i);
        }
        assert_eq!(index.get("fig"), Some(&2));
        let hits: Vec<&str> = index.range("b", "l").map(|(k, _)| k.as_str()).collect();
        assert_eq!(hits, ["fig", "kiwi"], "{variant}");
        assert_eq!(index.remove("pear"), Some(0));
    }
}

// ─── Shape bounds ────────────────────────────────────────────────────────────

#[test]
fn multiway_height_stays_logarithmic() {
    let mut btree = BTree::with_min_degree(3).unwrap();
    let mut bplus = BPlusTree::with_min_degree(3).unwrap();
    for key in shuffled(10_000, 3) {
        btree.insert(key, ());
        bplus.insert(key, ());
    }
    // A tree of minimum degree t holding n keys has height at most log_t((n + 1) / 2) + 1.
    assert!(btree.height() <= 9, "btree height {}", btree.height());
    assert!(bplus.height() <= 9, "bplus height {}", bplus.height());
    btree.validate();
    bplus.validate();
}

#[test]
fn treap_takes_priorities_from_a_closure() {
    // Every new entry gets a lower priority, so later keys sink below earlier ones.
    let mut next = 1.0f64;
    let mut treap = Treap::with_priorities(move || {
        next /= 2.0;
        next
    });
    for key in shuffled(300, 5) {
        treap.insert(key, ());
    }
    treap.validate();
    assert_eq!(treap.len(), 300);
    assert_eq!(treap.rank_of(&150), Some(150));
    assert_eq!(treap.remove(&150), Some(()));
    treap.validate();
}

// ─── Order statistics ────────────────────────────────────────────────────────

fn check_order_statistics<T>(mut tree: T, keys: &[i64])
where
    T: OrderedIndex<i64, i64> + OrderStatistic<i64, i64>,
{
    let mut model = BTreeMap::new();
    for &k in keys {
        tree.insert(k, k);
        model.insert(k, k);
    }
    for (rank, (k, v)) in model.iter().enumerate() {
        assert_eq!(tree.get_by_rank(rank), Some((k, v)));
        assert_eq!(tree.rank_of(k), Some(rank));
    }
    assert_eq!(tree.get_by_rank(model.len()), None);
    assert_eq!(tree.rank_of(&i64::MAX), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn binary_variants_answer_rank_queries(keys in proptest::collection::vec(-500i64..500, 0..400)) {
        check_order_statistics(AvlTree::new(), &keys);
        check_order_statistics(RedBlackTree::new(), &keys);
        check_order_statistics(WavlTree::new(), &keys);
        check_order_statistics(Treap::new(), &keys);
    }

    #[test]
    fn config_survives_json(variant in prop::sample::select(Variant::ALL.to_vec()), min_degree in 2usize..64, seed in any::<u64>()) {
        let config = IndexConfig::default()
            .with_variant(variant)
            .with_min_degree(min_degree)
            .with_treap_seed(seed);
        let json = serde_json::to_string(&config).unwrap();
        let decoded: IndexConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, config);
    }
}
