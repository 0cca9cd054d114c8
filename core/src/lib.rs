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

//! A concurrent ordered set of `i32` keys, backed by a height-balanced (AVL)
//! tree, with a choice of three synchronization schemes behind one API:
//!
//! - [`Scheme::Coarse`] — a single `RwLock` around a plain owned tree. The
//!   reference oracle: simple, obviously correct, not meant to scale.
//! - [`Scheme::Optimistic`] — Bronson-style per-node optimistic locking with
//!   version validation and a lazily-unlinked routing-node trick for
//!   two-child deletion.
//! - [`Scheme::Kcas`] — lock-free, built on a multi-word compare-and-swap
//!   primitive with a hardware-transactional-memory fast path.
//!
//! All three are exposed through [`Tree`], a tagged enum-dispatch wrapper
//! chosen once at construction — there is no `dyn` dispatch in this crate.

#![forbid(unsafe_op_in_unsafe_fn)]
#![cfg_attr(target_arch = "x86_64", feature(stdarch_x86_rtm, rtm_target_feature))]

pub mod balance;
pub mod coarse;
pub mod kcas;
pub mod node;
pub mod optimistic;
pub mod sync;

use coarse::CoarseTree;
use kcas::KcasTree;
use optimistic::OptimisticTree;

/// The common operations every synchronization scheme provides. Exists so
/// call sites generic over scheme (the benchmark harness, in particular) can
/// be written once instead of three times.
pub trait IntSet {
    fn contains(&self, key: i32) -> bool;
    /// Returns `true` if `key` was absent and is now present.
    fn insert(&self, key: i32) -> bool;
    /// Returns `true` if `key` was present and is now absent.
    fn remove(&self, key: i32) -> bool;
    /// An in-order-equivalent dump of every key currently in the set, for
    /// testing and the CLI's script-verification mode. Not linearizable with
    /// concurrent mutation; intended for single-threaded inspection.
    fn preorder(&self) -> Vec<i32>;
}

impl IntSet for CoarseTree {
    fn contains(&self, key: i32) -> bool {
        CoarseTree::contains(self, key)
    }
    fn insert(&self, key: i32) -> bool {
        CoarseTree::insert(self, key)
    }
    fn remove(&self, key: i32) -> bool {
        CoarseTree::remove(self, key)
    }
    fn preorder(&self) -> Vec<i32> {
        CoarseTree::preorder(self)
    }
}

impl IntSet for OptimisticTree {
    fn contains(&self, key: i32) -> bool {
        OptimisticTree::contains(self, key)
    }
    fn insert(&self, key: i32) -> bool {
        OptimisticTree::insert(self, key)
    }
    fn remove(&self, key: i32) -> bool {
        OptimisticTree::remove(self, key)
    }
    fn preorder(&self) -> Vec<i32> {
        OptimisticTree::preorder(self)
    }
}

impl IntSet for KcasTree {
    fn contains(&self, key: i32) -> bool {
        KcasTree::contains(self, key)
    }
    fn insert(&self, key: i32) -> bool {
        KcasTree::insert(self, key)
    }
    fn remove(&self, key: i32) -> bool {
        KcasTree::remove(self, key)
    }
    fn preorder(&self) -> Vec<i32> {
        KcasTree::preorder(self)
    }
}

/// Which synchronization scheme a [`Tree`] should use. Chosen once at
/// construction and fixed for the tree's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Single `RwLock`, plain owned tree (C3).
    Coarse,
    /// Per-node optimistic locking (C4).
    Optimistic,
    /// Lock-free multi-word CAS with an HTM fast path (C5).
    Kcas,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Coarse => "coarse",
            Scheme::Optimistic => "optimistic",
            Scheme::Kcas => "kcas",
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coarse" => Ok(Scheme::Coarse),
            "optimistic" => Ok(Scheme::Optimistic),
            "kcas" => Ok(Scheme::Kcas),
            other => Err(format!("unknown scheme '{other}' (expected coarse, optimistic or kcas)")),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A concurrent ordered set of `i32`s. Wraps exactly one of the three scheme
/// implementations, picked at construction via [`Scheme`]; dispatch is a
/// single match per call, not a vtable.
pub enum Tree {
    Coarse(CoarseTree),
    Optimistic(OptimisticTree),
    Kcas(KcasTree),
}

impl Tree {
    pub fn new(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Coarse => Tree::Coarse(CoarseTree::new()),
            Scheme::Optimistic => Tree::Optimistic(OptimisticTree::new()),
            Scheme::Kcas => Tree::Kcas(KcasTree::new()),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Tree::Coarse(_) => Scheme::Coarse,
            Tree::Optimistic(_) => Scheme::Optimistic,
            Tree::Kcas(_) => Scheme::Kcas,
        }
    }
}

impl IntSet for Tree {
    fn contains(&self, key: i32) -> bool {
        match self {
            Tree::Coarse(t) => t.contains(key),
            Tree::Optimistic(t) => t.contains(key),
            Tree::Kcas(t) => t.contains(key),
        }
    }

    fn insert(&self, key: i32) -> bool {
        match self {
            Tree::Coarse(t) => t.insert(key),
            Tree::Optimistic(t) => t.insert(key),
            Tree::Kcas(t) => t.insert(key),
        }
    }

    fn remove(&self, key: i32) -> bool {
        match self {
            Tree::Coarse(t) => t.remove(key),
            Tree::Optimistic(t) => t.remove(key),
            Tree::Kcas(t) => t.remove(key),
        }
    }

    fn preorder(&self) -> Vec<i32> {
        match self {
            Tree::Coarse(t) => t.preorder(),
            Tree::Optimistic(t) => t.preorder(),
            Tree::Kcas(t) => t.preorder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scheme_agrees_on_a_scenario() {
        for scheme in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
            let t = Tree::new(scheme);
            for k in [20, 12, 53, 1, 21, 17, 82, 73, 15, 2] {
                assert!(t.insert(k), "{scheme}: insert {k}");
            }
            assert!(!t.insert(20), "{scheme}: duplicate insert must fail");
            assert!(t.remove(12), "{scheme}: remove 12");
            assert!(!t.contains(12), "{scheme}: 12 should be gone");
            assert!(t.contains(53), "{scheme}: 53 should remain");
        }
    }

    #[test]
    fn scheme_from_str_roundtrip() {
        for s in [Scheme::Coarse, Scheme::Optimistic, Scheme::Kcas] {
            assert_eq!(s.name().parse::<Scheme>().unwrap(), s);
        }
        assert!("bogus".parse::<Scheme>().is_err());
    }
}
