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

//! The optimistic per-node scheme (C4), after Bronson et al.'s "practical
//! concurrent binary search tree": hand-over-hand optimistic traversal
//! validated against a per-node version word, committed under per-node
//! locks, with routing nodes standing in for two-child deletions until the
//! rebalance walk can physically unlink them.

mod node;
mod rotate;

use crate::node::{compare, Dir, Ordering3};
use crate::sync::atm::{pin, Atomic, Guard, Owned, Shared};
use node::{as_shared, is_shrinking, is_unlinked, validates, NodeState, OptNode};
use std::hint;

/// Bounded spin before falling back to a blocking lock acquisition, per the
/// wait-until-not-changing protocol.
const SPIN_BOUND: u32 = 100;

fn wait_until_not_changing(n: &OptNode) {
    for _ in 0..SPIN_BOUND {
        if !is_shrinking(n.version()) {
            return;
        }
        hint::spin_loop();
    }
    // guaranteed forward progress: the rotator releases this lock when done
    drop(n.lock());
}

fn try_contains<'g>(parent: Shared<'g, OptNode>, dir: Dir, key: i32, guard: &'g Guard) -> Option<bool> {
    let p = unsafe { parent.deref() };
    let v_parent = p.version();
    let child = p.child(dir).ld_acq(guard);
    if !validates(v_parent, p.version()) {
        return None;
    }
    if child.is_null() {
        return Some(false);
    }
    let c = unsafe { child.deref() };
    let v_child = c.version();
    if is_shrinking(v_child) {
        wait_until_not_changing(c);
        return None;
    }
    if is_unlinked(v_child) {
        return None;
    }
    match compare(key, c.key) {
        Ordering3::Equal => Some(c.state() == NodeState::Internal),
        Ordering3::Less => try_contains(child, Dir::Left, key, guard),
        Ordering3::Greater => try_contains(child, Dir::Right, key, guard),
    }
}

fn try_insert<'g>(parent: Shared<'g, OptNode>, dir: Dir, key: i32, guard: &'g Guard) -> Option<bool> {
    let p = unsafe { parent.deref() };
    let v_parent = p.version();
    let child = p.child(dir).ld_acq(guard);
    if !validates(v_parent, p.version()) {
        return None;
    }
    if child.is_null() {
        let _pg = p.lock();
        if !validates(v_parent, p.version()) {
            return None;
        }
        if !p.child(dir).ld_acq(guard).is_null() {
            return None;
        }
        let new_node = OptNode::new(key, Atomic::from(parent));
        p.child(dir).store(Owned::new(new_node), crate::sync::atm::ORD_REL);
        let touched: *const OptNode = p;
        drop(_pg);
        rotate::rebalance_from(touched);
        return Some(true);
    }
    let c = unsafe { child.deref() };
    let v_child = c.version();
    if is_shrinking(v_child) {
        wait_until_not_changing(c);
        return None;
    }
    if is_unlinked(v_child) {
        return None;
    }
    match compare(key, c.key) {
        Ordering3::Equal => {
            if c.state() == NodeState::Internal {
                Some(false)
            } else {
                let _cg = c.lock();
                if !validates(v_child, c.version()) {
                    return None;
                }
                if c.state() == NodeState::Internal {
                    return Some(false);
                }
                c.set_state(NodeState::Internal);
                Some(true)
            }
        }
        Ordering3::Less => try_insert(child, Dir::Left, key, guard),
        Ordering3::Greater => try_insert(child, Dir::Right, key, guard),
    }
}

fn try_remove<'g>(parent: Shared<'g, OptNode>, dir: Dir, key: i32, guard: &'g Guard) -> Option<bool> {
    let p = unsafe { parent.deref() };
    let v_parent = p.version();
    let child = p.child(dir).ld_acq(guard);
    if !validates(v_parent, p.version()) {
        return None;
    }
    if child.is_null() {
        return Some(false);
    }
    let c = unsafe { child.deref() };
    let v_child = c.version();
    if is_shrinking(v_child) {
        wait_until_not_changing(c);
        return None;
    }
    if is_unlinked(v_child) {
        return None;
    }
    match compare(key, c.key) {
        Ordering3::Less => try_remove(child, Dir::Left, key, guard),
        Ordering3::Greater => try_remove(child, Dir::Right, key, guard),
        Ordering3::Equal => {
            if c.state() != NodeState::Internal {
                return Some(false);
            }
            let left = c.left.ld_acq(guard);
            let right = c.right.ld_acq(guard);
            if !left.is_null() && !right.is_null() {
                // two children: the routing-node trick. Flip to REMOVED
                // under the node's own lock; physical unlink happens later,
                // lazily, from the rebalance walk.
                let _cg = c.lock();
                if !validates(v_child, c.version()) {
                    return None;
                }
                if c.state() != NodeState::Internal {
                    return Some(false);
                }
                c.set_state(NodeState::Removed);
                let touched: *const OptNode = c;
                drop(_cg);
                rotate::rebalance_from(touched);
                Some(true)
            } else {
                // zero or one child: take both locks, swing the parent's
                // link to the (possibly null) child, mark unlinked.
                let _pg = p.lock();
                if !validates(v_parent, p.version()) {
                    return None;
                }
                let _cg = c.lock();
                let left = c.left.ld_acq(guard);
                let right = c.right.ld_acq(guard);
                if !left.is_null() && !right.is_null() {
                    // raced with a concurrent insert into the "missing" side
                    return None;
                }
                if c.state() != NodeState::Internal {
                    return Some(false);
                }
                let only = if !left.is_null() { left } else { right };
                if !only.is_null() {
                    unsafe { only.deref() }
                        .parent
                        .store(as_shared(p), crate::sync::atm::ORD_REL);
                }
                p.child(dir).store(only, crate::sync::atm::ORD_REL);
                c.mark_unlinked();
                unsafe {
                    guard.defer_destroy(child);
                }
                let touched: *const OptNode = p;
                drop(_cg);
                drop(_pg);
                rotate::rebalance_from(touched);
                Some(true)
            }
        }
    }
}

fn preorder_at(node: Shared<'_, OptNode>, guard: &Guard, out: &mut Vec<i32>) {
    if node.is_null() {
        return;
    }
    let n = unsafe { node.deref() };
    if n.state() == NodeState::Internal {
        out.push(n.key);
    }
    preorder_at(n.left.ld_acq(guard), guard, out);
    preorder_at(n.right.ld_acq(guard), guard, out);
}

/// A tree governed by Bronson-style optimistic per-node locking. Not
/// strictly lock-free: pathological adversarial schedules may starve a
/// thread, though no schedule can deadlock it.
pub struct OptimisticTree {
    holder: Atomic<OptNode>,
}

impl OptimisticTree {
    pub fn new() -> Self {
        Self {
            holder: Atomic::new_alloc(OptNode::sentinel()),
        }
    }

    pub fn contains(&self, key: i32) -> bool {
        let guard = pin();
        loop {
            let holder = self.holder.ld_acq(&guard);
            if let Some(result) = try_contains(holder, Dir::Right, key, &guard) {
                return result;
            }
        }
    }

    pub fn insert(&self, key: i32) -> bool {
        let guard = pin();
        loop {
            let holder = self.holder.ld_acq(&guard);
            if let Some(result) = try_insert(holder, Dir::Right, key, &guard) {
                return result;
            }
        }
    }

    pub fn remove(&self, key: i32) -> bool {
        let guard = pin();
        loop {
            let holder = self.holder.ld_acq(&guard);
            if let Some(result) = try_remove(holder, Dir::Right, key, &guard) {
                return result;
            }
        }
    }

    pub fn preorder(&self) -> Vec<i32> {
        let guard = pin();
        let holder = self.holder.ld_acq(&guard);
        let h = unsafe { holder.deref() };
        let mut out = Vec::new();
        preorder_at(h.right.ld_acq(&guard), &guard, &mut out);
        out
    }
}

impl Default for OptimisticTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OptimisticTree {
    fn drop(&mut self) {
        // single-threaded by the time Drop runs: free the whole tree
        // without going through the epoch (nothing else can be racing us).
        let guard = unsafe { crate::sync::atm::unprotected() };
        fn free(node: Shared<'_, OptNode>, guard: &Guard) {
            if node.is_null() {
                return;
            }
            let n = unsafe { node.deref() };
            free(n.left.ld_acq(guard), guard);
            free(n.right.ld_acq(guard), guard);
            unsafe {
                drop(node.into_owned());
            }
        }
        let holder = self.holder.ld_acq(guard);
        let h = unsafe { holder.deref() };
        free(h.left.ld_acq(guard), guard);
        free(h.right.ld_acq(guard), guard);
        unsafe {
            drop(holder.into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains() {
        let t = OptimisticTree::new();
        assert!(t.insert(5));
        assert!(!t.insert(5));
        assert!(t.contains(5));
        assert!(t.remove(5));
        assert!(!t.remove(5));
        assert!(!t.contains(5));
    }

    #[test]
    fn scenario_s1() {
        let t = OptimisticTree::new();
        for k in [20, 12, 53, 1, 21, 17, 82, 73, 15, 2] {
            t.insert(k);
        }
        let present = [1, 2, 12, 15, 17, 20, 21, 53, 73, 82];
        for k in present {
            assert!(t.contains(k), "expected {k} present");
        }
        for k in 1..=100 {
            if !present.contains(&k) {
                assert!(!t.contains(k), "expected {k} absent");
            }
        }
    }

    #[test]
    fn two_child_removal_routing() {
        let t = OptimisticTree::new();
        for k in [10, 5, 15, 3, 7, 12, 20] {
            t.insert(k);
        }
        assert!(t.remove(5));
        assert!(!t.contains(5));
        for k in [10, 15, 3, 7, 12, 20] {
            assert!(t.contains(k));
        }
    }

    #[test]
    fn concurrent_disjoint_inserts() {
        use std::sync::Arc;
        use std::thread;
        let t = Arc::new(OptimisticTree::new());
        let mut handles = Vec::new();
        for block in 0..8 {
            let t = Arc::clone(&t);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    let k = block * 100 + i + 1;
                    assert!(t.insert(k));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for k in 1..=800 {
            assert!(t.contains(k), "missing {k}");
        }
    }
}
