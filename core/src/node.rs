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

//! Node storage and ordering primitives shared by every scheme (C1).
//!
//! All three schemes key their trees on a plain `i32`; this module defines the
//! one piece of vocabulary that is common to all of them: the notion of a
//! child *direction* and a total order over keys. Every scheme-specific node
//! type (coarse, optimistic, kcas) embeds its own fields, but all traversal,
//! rotation and rebalance code is written generically over `Dir` so that left
//! and right are never handled by copy-pasted twin code paths.

/// A child direction. Rotation and rebalance code is written symmetrically in
/// terms of `Dir` so that left/right logic is never duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    /// The direction opposite `self`.
    #[inline]
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Three-way comparison result, matching the ordering one would get back from
/// `Ord::cmp` but spelled out as the spec's `{-1, 0, +1}` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering3 {
    Less,
    Equal,
    Greater,
}

/// Compares two keys and reports which direction `k1` would need to travel
/// from a node holding `k2` to find its place.
#[inline]
pub fn compare(k1: i32, k2: i32) -> Ordering3 {
    if k1 < k2 {
        Ordering3::Less
    } else if k1 > k2 {
        Ordering3::Greater
    } else {
        Ordering3::Equal
    }
}

/// Which child slot a key bound for `k1` would travel through from a node
/// holding `k2`. Panics if `k1 == k2`; callers must handle the equal case
/// themselves since "found" is not a direction.
#[inline]
pub fn direction_for(k1: i32, k2: i32) -> Dir {
    match compare(k1, k2) {
        Ordering3::Less => Dir::Left,
        Ordering3::Greater => Dir::Right,
        Ordering3::Equal => unreachable!("direction_for called with equal keys"),
    }
}
