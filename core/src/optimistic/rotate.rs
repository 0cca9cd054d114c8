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

//! The upward rebalance walk and rotation commit for the optimistic scheme.
//!
//! `fix_height_and_rebalance` walks from a freshly touched node up to the
//! root holder, classifying each node as needing nothing, a height-only
//! repair, a physical unlink (a routing node down to <=1 child) or a
//! rotation. It walks parent-links rather than relying on the call stack,
//! since a rotation partway up can change the ancestry a stack frame would
//! otherwise assume is stable.

use super::node::{as_shared, NodeState, OptNode};
use crate::balance::{balance_factor, plan_rotation, recompute_height, RotationPlan};
use crate::node::Dir;
use crate::sync::atm::{pin, Guard, Shared};
use std::sync::atomic::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    HeightOnly,
    Unlink,
    Rotate,
}

#[inline]
fn deref<'g>(s: Shared<'g, OptNode>) -> &'g OptNode {
    unsafe { s.deref() }
}

#[inline]
fn height_of(child: Shared<'_, OptNode>) -> i64 {
    if child.is_null() {
        0
    } else {
        deref(child).height()
    }
}

/// Whether `p`'s `dir` slot currently holds exactly `expected`.
#[inline]
fn slot_is<'g>(p: &OptNode, dir: Dir, expected: Shared<'g, OptNode>, guard: &'g Guard) -> bool {
    p.child(dir).ld_acq(guard) == expected
}

fn child_count(n: &OptNode, guard: &Guard) -> usize {
    let mut c = 0;
    if !n.left.ld_acq(guard).is_null() {
        c += 1;
    }
    if !n.right.ld_acq(guard).is_null() {
        c += 1;
    }
    c
}

fn classify(n: &OptNode, guard: &Guard) -> Action {
    if n.state() == NodeState::Removed && child_count(n, guard) <= 1 {
        return Action::Unlink;
    }
    let hl = height_of(n.left.ld_acq(guard));
    let hr = height_of(n.right.ld_acq(guard));
    let b = balance_factor(hl, hr);
    if b.abs() > 1 {
        return Action::Rotate;
    }
    if recompute_height(hl, hr) != n.height() {
        return Action::HeightOnly;
    }
    Action::Nothing
}

fn recompute_and_set_height(n: &OptNode, guard: &Guard) {
    let hl = height_of(n.left.ld_acq(guard));
    let hr = height_of(n.right.ld_acq(guard));
    n.set_height(recompute_height(hl, hr));
}

/// Which child slot of `p` points at `n`, if any.
fn dir_of<'g>(p: &OptNode, n: Shared<'g, OptNode>, guard: &'g Guard) -> Option<Dir> {
    if slot_is(p, Dir::Left, n, guard) {
        Some(Dir::Left)
    } else if slot_is(p, Dir::Right, n, guard) {
        Some(Dir::Right)
    } else {
        None
    }
}

/// Physically unlinks a routing node `n` (<=1 child) from its parent `p`.
/// Caller holds both `p`'s and `n`'s locks.
fn unlink_routing_node<'g>(p: &OptNode, n: &OptNode, n_shared: Shared<'g, OptNode>, guard: &'g Guard) {
    let dir = match dir_of(p, n_shared, guard) {
        Some(d) => d,
        None => return, // topology already moved past this edge
    };
    let only_child = if !n.left.ld_acq(guard).is_null() {
        n.left.ld_acq(guard)
    } else {
        n.right.ld_acq(guard)
    };
    if !only_child.is_null() {
        deref(only_child).parent.store(as_shared(p), Ordering::Release);
    }
    p.child(dir).store(only_child, Ordering::Release);
    n.mark_unlinked();
    unsafe {
        guard.defer_destroy(n_shared);
    }
}

/// Single rotation of `pivot` toward `dir`: the child opposite `dir` rises
/// to occupy `pivot`'s slot under `parent`. Caller holds `parent`'s,
/// `pivot`'s and the rising child's locks.
fn rotate<'g>(
    parent: &OptNode,
    pivot: &OptNode,
    pivot_shared: Shared<'g, OptNode>,
    dir: Dir,
    guard: &'g Guard,
) -> Shared<'g, OptNode> {
    let opp = dir.opposite();
    let new_top_shared = pivot.child(opp).ld_acq(guard);
    let new_top = deref(new_top_shared);

    pivot.begin_shrink();
    new_top.begin_grow();

    let moved = new_top.child(dir).ld_acq(guard);
    pivot.child(opp).store(moved, Ordering::Release);
    if !moved.is_null() {
        deref(moved).parent.store(as_shared(pivot), Ordering::Release);
    }
    recompute_and_set_height(pivot, guard);

    new_top.child(dir).store(pivot_shared, Ordering::Release);
    pivot.parent.store(as_shared(new_top), Ordering::Release);
    recompute_and_set_height(new_top, guard);

    if let Some(d) = dir_of(parent, pivot_shared, guard) {
        parent.child(d).store(new_top_shared, Ordering::Release);
    }
    new_top.parent.store(as_shared(parent), Ordering::Release);

    pivot.end_shrink();
    new_top.end_grow();
    new_top_shared
}

/// Performs the rotation(s) `classify` called for at `n` (child of `p`),
/// returning the node from which the upward walk should continue.
fn rebalance_once<'g>(p: &OptNode, n: &OptNode, n_shared: Shared<'g, OptNode>, guard: &'g Guard) -> Shared<'g, OptNode> {
    let hl = height_of(n.left.ld_acq(guard));
    let hr = height_of(n.right.ld_acq(guard));
    let b = balance_factor(hl, hr);
    let heavy_child_shared = if b > 1 {
        n.left.ld_acq(guard)
    } else {
        n.right.ld_acq(guard)
    };
    let heavy_child = deref(heavy_child_shared);
    let _hg = heavy_child.lock();
    let child_hl = height_of(heavy_child.left.ld_acq(guard));
    let child_hr = height_of(heavy_child.right.ld_acq(guard));
    let child_b = balance_factor(child_hl, child_hr);

    match plan_rotation(b, child_b) {
        RotationPlan::None => n_shared,
        RotationPlan::SingleRight => rotate(p, n, n_shared, Dir::Right, guard),
        RotationPlan::SingleLeft => rotate(p, n, n_shared, Dir::Left, guard),
        RotationPlan::LeftRight => {
            let grandchild_shared = heavy_child.right.ld_acq(guard);
            let grandchild = deref(grandchild_shared);
            let _gg = grandchild.lock();
            rotate(n, heavy_child, heavy_child_shared, Dir::Left, guard);
            rotate(p, n, n_shared, Dir::Right, guard)
        }
        RotationPlan::RightLeft => {
            let grandchild_shared = heavy_child.left.ld_acq(guard);
            let grandchild = deref(grandchild_shared);
            let _gg = grandchild.lock();
            rotate(n, heavy_child, heavy_child_shared, Dir::Right, guard);
            rotate(p, n, n_shared, Dir::Left, guard)
        }
    }
}

/// Walks from `start` up to the root holder, repairing heights, unlinking
/// drained routing nodes and rotating as needed. Never recurses: the walk
/// restarts from the parent of whatever node it just touched, since a
/// rotation may have changed that node's ancestry.
pub fn fix_height_and_rebalance(start: Shared<'_, OptNode>, guard: &Guard) {
    let mut node = start;
    loop {
        if node.is_null() {
            return;
        }
        let n = deref(node);
        if n.parent.ld_acq(guard).is_null() {
            // reached the sentinel root holder
            return;
        }
        match classify(n, guard) {
            Action::Nothing => return,
            Action::HeightOnly => {
                let _ng = n.lock();
                recompute_and_set_height(n, guard);
                drop(_ng);
                node = n.parent.ld_acq(guard);
            }
            Action::Unlink | Action::Rotate => {
                let parent = n.parent.ld_acq(guard);
                if parent.is_null() {
                    return;
                }
                let p = deref(parent);
                let _pg = p.lock();
                if dir_of(p, node, guard).is_none() {
                    // `n` was already relocated by a racing mutation; resume
                    // the walk from its parent's current position.
                    drop(_pg);
                    node = parent;
                    continue;
                }
                let _ng = n.lock();
                match classify(n, guard) {
                    Action::Unlink => {
                        unlink_routing_node(p, n, node, guard);
                        drop(_ng);
                        drop(_pg);
                        node = parent;
                    }
                    Action::Rotate => {
                        let continue_from = rebalance_once(p, n, node, guard);
                        drop(_ng);
                        drop(_pg);
                        node = continue_from;
                    }
                    _ => {
                        drop(_ng);
                        drop(_pg);
                    }
                }
            }
        }
    }
}

/// Pins a fresh guard and kicks off the walk from the node `insert`/`remove`
/// just touched.
pub fn rebalance_from(node_raw: *const OptNode) {
    let guard = pin();
    let shared: Shared<'_, OptNode> = unsafe { Shared::from(node_raw) };
    fix_height_and_rebalance(shared, &guard);
}
