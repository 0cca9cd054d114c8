/*
 * This file is part of avltree, a concurrent ordered set library.
 *
 * Copyright (c) 2026, avltree authors.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! Multi-threaded scenarios exercised against every scheme through the
//! shared `IntSet` interface, using plain `std::thread` fan-out and `rand`
//! for workload generation (no dedicated concurrency-testing crate).

use avltree_core::{IntSet, Scheme, Tree};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::thread;

/// `preorder()` walks root-left-right, not in sorted order; this sorts a
/// copy to check the set has no duplicate or phantom entries.
fn no_duplicate_keys(tree: &Tree) -> bool {
    let mut seq = tree.preorder();
    let before = seq.len();
    seq.sort_unstable();
    seq.dedup();
    seq.len() == before
}

#[test]
fn s2_sequential_random_permutation_insert() {
    for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
        let tree = Tree::new(scheme);
        let mut keys: Vec<i32> = (1..=1000).collect();
        keys.shuffle(&mut rand::thread_rng());
        for k in &keys {
            assert!(tree.insert(*k), "{scheme}: insert {k} should succeed");
        }
        for k in 1..=1000 {
            assert!(tree.contains(k), "{scheme}: missing {k}");
        }
        assert!(no_duplicate_keys(&tree), "{scheme}: duplicate key in preorder dump");
    }
}

#[test]
fn s3_remove_every_odd_key() {
    for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
        let tree = Tree::new(scheme);
        for k in 1..=1000 {
            tree.insert(k);
        }
        for k in (1..1000).step_by(2) {
            assert!(tree.remove(k), "{scheme}: remove {k} should succeed");
        }
        for k in 1..=1000 {
            assert_eq!(tree.contains(k), k % 2 == 0, "{scheme}: parity mismatch at {k}");
        }
        assert!(no_duplicate_keys(&tree), "{scheme}: duplicate key in preorder dump");
    }
}

#[test]
fn s4_disjoint_concurrent_inserts() {
    for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
        let tree = Arc::new(Tree::new(scheme));
        let mut handles = Vec::new();
        for block in 0..8i32 {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    let k = block * 100 + i + 1;
                    assert!(tree.insert(k), "{scheme}: insert {k} should succeed");
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for k in 1..=800 {
            assert!(tree.contains(k), "{scheme}: missing {k}");
        }
        assert!(no_duplicate_keys(&tree), "{scheme}: duplicate key in preorder dump");
    }
}

#[test]
fn s5_mixed_workload_no_crash_and_quiescent_invariants() {
    for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
        let tree = Arc::new(Tree::new(scheme));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..2000 {
                    let key = rng.gen_range(0..10_000);
                    let roll: f64 = rng.gen();
                    if roll < 0.5 {
                        tree.insert(key);
                    } else if roll < 0.8 {
                        tree.remove(key);
                    } else {
                        tree.contains(key);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(no_duplicate_keys(&tree), "{scheme}: duplicate key in preorder dump at quiescence");
    }
}

#[test]
fn s6_insert_then_remove_churn_leaves_nothing_behind() {
    for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
        let tree = Arc::new(Tree::new(scheme));
        let mut handles = Vec::new();
        for block in 0..4i32 {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    for i in 0..100 {
                        let k = block * 100 + i + 1;
                        tree.insert(k);
                        tree.remove(k);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for block in 0..4 {
            for i in 0..100 {
                let k = block * 100 + i + 1;
                assert!(!tree.contains(k), "{scheme}: {k} should be absent at quiescence");
            }
        }
    }
}
