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

//! Per-node layout for the optimistic scheme (C4): a version word packing
//! three status bits plus grow/shrink counters, a per-node mutex, and
//! epoch-managed child/parent links.

use crate::node::Dir;
use crate::sync::atm::{Atomic, Shared};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU64, Ordering};

pub const UNLINKED: u64 = 0x1;
pub const GROWING: u64 = 0x2;
pub const SHRINKING: u64 = 0x4;
pub const GROW_COUNT_INCR: u64 = 1 << 3;
pub const GROW_COUNT_MASK: u64 = 0xff << 3;
pub const SHRINK_COUNT_INCR: u64 = 1 << 11;
/// Every bit except GROWING and the grow-count: a version change restricted
/// to those bits cannot invalidate a downward search past the node, so
/// validation masks them out.
pub const IGNORE_GROW: u64 = !(GROWING | GROW_COUNT_MASK);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Internal,
    Removed,
}

impl NodeState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => NodeState::Internal,
            _ => NodeState::Removed,
        }
    }
    fn as_u8(self) -> u8 {
        match self {
            NodeState::Internal => 0,
            NodeState::Removed => 1,
        }
    }
}

/// Returns true if `observed` and `current` agree on everything but the
/// GROWING bit and grow-count, i.e. no retry is required.
#[inline]
pub fn validates(observed: u64, current: u64) -> bool {
    (observed ^ current) & IGNORE_GROW == 0
}

#[inline]
pub fn is_unlinked(version: u64) -> bool {
    version & UNLINKED != 0
}

#[inline]
pub fn is_shrinking(version: u64) -> bool {
    version & SHRINKING != 0
}

pub struct OptNode {
    /// Immutable after publication: the key this node carries while
    /// `state == Internal`. Routing (`Removed`) nodes ignore it.
    pub key: i32,
    pub state: AtomicU8,
    pub version: AtomicU64,
    pub height: AtomicI64,
    pub left: Atomic<OptNode>,
    pub right: Atomic<OptNode>,
    /// Non-owning: never the target of `defer_destroy`.
    pub parent: Atomic<OptNode>,
    pub lock: Mutex<()>,
}

impl OptNode {
    pub fn new(key: i32, parent: Atomic<OptNode>) -> Self {
        Self {
            key,
            state: AtomicU8::new(NodeState::Internal.as_u8()),
            version: AtomicU64::new(0),
            height: AtomicI64::new(1),
            left: Atomic::null(),
            right: Atomic::null(),
            parent,
            lock: Mutex::new(()),
        }
    }

    pub fn sentinel() -> Self {
        Self {
            key: 0,
            state: AtomicU8::new(NodeState::Internal.as_u8()),
            version: AtomicU64::new(0),
            height: AtomicI64::new(0),
            left: Atomic::null(),
            right: Atomic::null(),
            parent: Atomic::null(),
            lock: Mutex::new(()),
        }
    }

    pub fn child(&self, dir: Dir) -> &Atomic<OptNode> {
        match dir {
            Dir::Left => &self.left,
            Dir::Right => &self.right,
        }
    }

    pub fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, s: NodeState) {
        self.state.store(s.as_u8(), Ordering::Release);
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn height(&self) -> i64 {
        self.height.load(Ordering::Acquire)
    }

    pub fn set_height(&self, h: i64) {
        self.height.store(h, Ordering::Release);
    }

    /// Acquires this node's lock. Held while mutating its own links, state
    /// or version bits.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Sets the GROWING bit, to be cleared (and the grow-count bumped) once
    /// the rotation moving this node toward the root has finished linking.
    pub fn begin_grow(&self) {
        let v = self.version.load(Ordering::Relaxed);
        self.version.store(v | GROWING, Ordering::Release);
    }

    /// Sets the SHRINKING bit, to be cleared (and the shrink-count bumped)
    /// once the rotation moving this node away from the root has finished.
    pub fn begin_shrink(&self) {
        let v = self.version.load(Ordering::Relaxed);
        self.version.store(v | SHRINKING, Ordering::Release);
    }

    pub fn end_grow(&self) {
        let v = self.version.load(Ordering::Relaxed);
        let next = (v & !GROWING).wrapping_add(GROW_COUNT_INCR);
        self.version.store(next, Ordering::Release);
    }

    pub fn end_shrink(&self) {
        let v = self.version.load(Ordering::Relaxed);
        let next = (v & !SHRINKING).wrapping_add(SHRINK_COUNT_INCR);
        self.version.store(next, Ordering::Release);
    }

    pub fn mark_unlinked(&self) {
        let v = self.version.load(Ordering::Relaxed);
        self.version.store(v | UNLINKED, Ordering::Release);
    }
}

/// Reconstructs a `Shared` pointer to a node we already have a live
/// reference into (used to re-point a `parent` back-link at an existing,
/// still-reachable node).
#[inline]
pub fn as_shared(n: &OptNode) -> Shared<'_, OptNode> {
    unsafe { Shared::from(n as *const OptNode) }
}
