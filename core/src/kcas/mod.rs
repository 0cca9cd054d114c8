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

//! The lock-free kcas scheme (C5): every structural edit is a single
//! multi-word compare-and-swap over version-stamped nodes, with a
//! hardware-transactional-memory fast path attempted first. Two sentinels at
//! the extremes of `i32` eliminate root-edge special-casing; the real tree
//! hangs off the lower sentinel's right child.

mod node;
mod primitive;

use crate::balance::{balance_factor, plan_rotation, recompute_height, RotationPlan};
use crate::node::Dir;
use node::{encode_child, encode_height, encode_key, encode_parent, encode_version, KNode, NULL_WORD};
use primitive::{CasWord, Entry};

fn height_or_zero(p: *const KNode) -> i64 {
    if p.is_null() {
        0
    } else {
        unsafe { &*p }.height()
    }
}

struct PathEntry {
    node: *const KNode,
    version: u64,
}

enum SearchOutcome {
    Found { path: Vec<PathEntry> },
    NotFound { path: Vec<PathEntry>, dir: Dir },
}

fn validate(path: &[PathEntry]) -> bool {
    path.iter().all(|e| unsafe { &*e.node }.version() == e.version)
}

/// Descends from the upper sentinel, collecting a `(node, version)` snapshot
/// at every step. Returns `None` (meaning "retry from the top") on any mark
/// or version mismatch observed during the final one-pass validation.
fn search_path(max_root: *const KNode, key: i32) -> Option<SearchOutcome> {
    let mut path = Vec::new();
    let root = unsafe { &*max_root };
    path.push(PathEntry {
        node: max_root,
        version: root.version(),
    });
    let mut cur = root.left_ptr(); // the lower sentinel
    loop {
        let c = unsafe { &*cur };
        let cv = c.version();
        if cv & 1 != 0 {
            return None;
        }
        path.push(PathEntry { node: cur, version: cv });
        let dir = if key < c.key() {
            Dir::Left
        } else if key > c.key() {
            Dir::Right
        } else {
            return if validate(&path) {
                Some(SearchOutcome::Found { path })
            } else {
                None
            };
        };
        let next = c.child_ptr(dir);
        if next.is_null() {
            return if validate(&path) {
                Some(SearchOutcome::NotFound { path, dir })
            } else {
                None
            };
        }
        cur = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    HeightOnly,
    Rotate,
}

fn classify(n: &KNode) -> Action {
    let hl = height_or_zero(n.left_ptr());
    let hr = height_or_zero(n.right_ptr());
    let b = balance_factor(hl, hr);
    if b.abs() > 1 {
        return Action::Rotate;
    }
    if recompute_height(hl, hr) != n.height() {
        return Action::HeightOnly;
    }
    Action::Nothing
}

fn fix_height(n_ptr: *const KNode) -> bool {
    let n = unsafe { &*n_ptr };
    let new_h = recompute_height(height_or_zero(n.left_ptr()), height_or_zero(n.right_ptr()));
    let v = n.version();
    primitive::execute(vec![
        Entry {
            addr: &n.height as *const CasWord,
            old: n.raw_height_word(),
            new: encode_height(new_h),
        },
        Entry {
            addr: &n.version as *const CasWord,
            old: encode_version(v),
            new: encode_version(v + 2),
        },
    ])
}

/// Bundles every link, height and version bump a single rotation of `pivot`
/// (a child of `parent`) toward `dir` touches into one KCAS transaction.
/// Aborts (returns `false`) if any participant has been marked removed since
/// the caller classified the imbalance; the rebalance walk will retry later.
fn rotate(parent_ptr: *const KNode, pivot_ptr: *const KNode, dir: Dir) -> bool {
    let parent = unsafe { &*parent_ptr };
    let pivot = unsafe { &*pivot_ptr };
    let opp = dir.opposite();
    let new_top_ptr = pivot.child_ptr(opp);
    if new_top_ptr.is_null() {
        return false;
    }
    let new_top = unsafe { &*new_top_ptr };
    if pivot.is_marked() || new_top.is_marked() {
        return false;
    }
    let dir_slot = if parent.left_ptr() == pivot_ptr {
        Dir::Left
    } else if parent.right_ptr() == pivot_ptr {
        Dir::Right
    } else {
        return false;
    };
    let moved_ptr = new_top.child_ptr(dir);

    let (new_pivot_left, new_pivot_right) = if dir == Dir::Right {
        (pivot.left_ptr(), moved_ptr)
    } else {
        (moved_ptr, pivot.right_ptr())
    };
    let new_pivot_height = recompute_height(height_or_zero(new_pivot_left), height_or_zero(new_pivot_right));

    let (new_top_left, new_top_right) = if dir == Dir::Right {
        (pivot_ptr, new_top.right_ptr())
    } else {
        (new_top.left_ptr(), pivot_ptr)
    };
    let new_top_height = recompute_height(height_or_zero(new_top_left), height_or_zero(new_top_right));

    let pivot_v = pivot.version();
    let new_top_v = new_top.version();

    let mut entries = vec![
        Entry {
            addr: pivot.child_word(opp) as *const CasWord,
            old: encode_child(new_top_ptr),
            new: encode_child(moved_ptr),
        },
        Entry {
            addr: &pivot.height as *const CasWord,
            old: pivot.raw_height_word(),
            new: encode_height(new_pivot_height),
        },
        Entry {
            addr: &pivot.version as *const CasWord,
            old: encode_version(pivot_v),
            new: encode_version(pivot_v + 2),
        },
        Entry {
            addr: &pivot.parent as *const CasWord,
            old: encode_parent(parent_ptr),
            new: encode_parent(new_top_ptr),
        },
        Entry {
            addr: new_top.child_word(dir) as *const CasWord,
            old: encode_child(moved_ptr),
            new: encode_child(pivot_ptr),
        },
        Entry {
            addr: &new_top.height as *const CasWord,
            old: new_top.raw_height_word(),
            new: encode_height(new_top_height),
        },
        Entry {
            addr: &new_top.version as *const CasWord,
            old: encode_version(new_top_v),
            new: encode_version(new_top_v + 2),
        },
        Entry {
            addr: &new_top.parent as *const CasWord,
            old: encode_parent(pivot_ptr),
            new: encode_parent(parent_ptr),
        },
        Entry {
            addr: parent.child_word(dir_slot) as *const CasWord,
            old: encode_child(pivot_ptr),
            new: encode_child(new_top_ptr),
        },
    ];
    if !moved_ptr.is_null() {
        let moved = unsafe { &*moved_ptr };
        let moved_v = moved.version();
        entries.push(Entry {
            addr: &moved.parent as *const CasWord,
            old: encode_parent(new_top_ptr),
            new: encode_parent(pivot_ptr),
        });
        entries.push(Entry {
            addr: &moved.version as *const CasWord,
            old: encode_version(moved_v),
            new: encode_version(moved_v + 2),
        });
    }
    primitive::execute(entries)
}

/// A double rotation is executed as two single-rotation KCAS transactions in
/// sequence rather than one composite bundle. Both remain individually
/// linearizable edits; the walk tolerates the brief transient imbalance
/// between them the same way it tolerates any other racing mutation.
fn rebalance_walk(start: *const KNode) {
    let mut node = start;
    loop {
        if node.is_null() {
            return;
        }
        let n = unsafe { &*node };
        let parent_ptr = n.parent_ptr();
        if parent_ptr.is_null() {
            return; // reached the upper sentinel
        }
        if n.is_marked() {
            node = parent_ptr;
            continue;
        }
        match classify(n) {
            Action::Nothing => return,
            Action::HeightOnly => {
                let _ = fix_height(node);
                node = parent_ptr;
            }
            Action::Rotate => {
                let hl = height_or_zero(n.left_ptr());
                let hr = height_or_zero(n.right_ptr());
                let b = balance_factor(hl, hr);
                let heavy_ptr = if b > 1 { n.left_ptr() } else { n.right_ptr() };
                if heavy_ptr.is_null() {
                    node = parent_ptr;
                    continue;
                }
                let heavy = unsafe { &*heavy_ptr };
                let child_b = balance_factor(height_or_zero(heavy.left_ptr()), height_or_zero(heavy.right_ptr()));
                match plan_rotation(b, child_b) {
                    RotationPlan::None => {}
                    RotationPlan::SingleRight => {
                        let _ = rotate(parent_ptr, node, Dir::Right);
                    }
                    RotationPlan::SingleLeft => {
                        let _ = rotate(parent_ptr, node, Dir::Left);
                    }
                    RotationPlan::LeftRight => {
                        let _ = rotate(node, heavy_ptr, Dir::Left);
                        let _ = rotate(parent_ptr, node, Dir::Right);
                    }
                    RotationPlan::RightLeft => {
                        let _ = rotate(node, heavy_ptr, Dir::Right);
                        let _ = rotate(parent_ptr, node, Dir::Left);
                    }
                }
                node = parent_ptr;
            }
        }
    }
}

fn preorder_at(node: *const KNode, out: &mut Vec<i32>) {
    if node.is_null() {
        return;
    }
    let n = unsafe { &*node };
    if !n.is_marked() {
        out.push(n.key());
    }
    preorder_at(n.left_ptr(), out);
    preorder_at(n.right_ptr(), out);
}

/// A lock-free tree built on the kcas primitive. Sentinels sit at the two
/// extremes of `i32`; the values `i32::MIN` and `i32::MAX` themselves are
/// reserved for them and are not valid set members.
pub struct KcasTree {
    max_root: *const KNode,
}

unsafe impl Send for KcasTree {}
unsafe impl Sync for KcasTree {}

impl KcasTree {
    pub fn new() -> Self {
        let min_root = Box::leak(Box::new(KNode::new(i32::MIN, std::ptr::null(), 1)));
        let max_root = Box::leak(Box::new(KNode::new(i32::MAX, std::ptr::null(), 2)));
        max_root.left.store_raw(encode_child(min_root));
        min_root.parent.store_raw(encode_parent(max_root));
        Self { max_root }
    }

    pub fn contains(&self, key: i32) -> bool {
        loop {
            match search_path(self.max_root, key) {
                None => continue,
                Some(SearchOutcome::Found { .. }) => return true,
                Some(SearchOutcome::NotFound { .. }) => return false,
            }
        }
    }

    pub fn insert(&self, key: i32) -> bool {
        loop {
            match search_path(self.max_root, key) {
                None => continue,
                Some(SearchOutcome::Found { .. }) => return false,
                Some(SearchOutcome::NotFound { path, dir }) => {
                    let parent_entry = path.last().unwrap();
                    let parent = unsafe { &*parent_entry.node };
                    let ancestor_entry = if path.len() >= 2 { Some(&path[path.len() - 2]) } else { None };
                    let new_node: *const KNode = Box::leak(Box::new(KNode::new(key, parent_entry.node, 1)));

                    let mut entries = vec![
                        Entry {
                            addr: parent.child_word(dir) as *const CasWord,
                            old: NULL_WORD,
                            new: encode_child(new_node),
                        },
                        Entry {
                            addr: &parent.version as *const CasWord,
                            old: encode_version(parent_entry.version),
                            new: encode_version(parent_entry.version + 2),
                        },
                    ];
                    if let Some(anc) = ancestor_entry {
                        let anc_node = unsafe { &*anc.node };
                        entries.push(Entry {
                            addr: &anc_node.version as *const CasWord,
                            old: encode_version(anc.version),
                            new: encode_version(anc.version),
                        });
                    }
                    if primitive::execute(entries) {
                        rebalance_walk(parent_entry.node);
                        return true;
                    }
                    unsafe {
                        drop(Box::from_raw(new_node as *mut KNode));
                    }
                }
            }
        }
    }

    pub fn remove(&self, key: i32) -> bool {
        loop {
            match search_path(self.max_root, key) {
                None => continue,
                Some(SearchOutcome::NotFound { .. }) => return false,
                Some(SearchOutcome::Found { path }) => {
                    let n_entry = &path[path.len() - 1];
                    let p_entry = &path[path.len() - 2];
                    let n = unsafe { &*n_entry.node };
                    let p = unsafe { &*p_entry.node };
                    let left = n.left_ptr();
                    let right = n.right_ptr();

                    if left.is_null() || right.is_null() {
                        if self.try_erase_simple(p, p_entry, n, n_entry, left, right) {
                            rebalance_walk(p_entry.node);
                            return true;
                        }
                    } else if let Some(continue_from) = self.try_erase_two_child(n, n_entry, right) {
                        rebalance_walk(continue_from);
                        return true;
                    }
                    // any failure above means a concurrent mutation raced us; retry from the top
                }
            }
        }
    }

    fn try_erase_simple(
        &self,
        p: &KNode,
        p_entry: &PathEntry,
        n: &KNode,
        n_entry: &PathEntry,
        left: *const KNode,
        right: *const KNode,
    ) -> bool {
        let dir = if p.left_ptr() == n_entry.node { Dir::Left } else { Dir::Right };
        let only_child = if left.is_null() { right } else { left };
        let mut entries = vec![
            Entry {
                addr: p.child_word(dir) as *const CasWord,
                old: encode_child(n_entry.node),
                new: encode_child(only_child),
            },
            Entry {
                addr: &p.version as *const CasWord,
                old: encode_version(p_entry.version),
                new: encode_version(p_entry.version + 2),
            },
            Entry {
                addr: &n.version as *const CasWord,
                old: encode_version(n_entry.version),
                new: encode_version(n_entry.version + 1),
            },
        ];
        if !only_child.is_null() {
            let c = unsafe { &*only_child };
            let cv = c.version();
            entries.push(Entry {
                addr: &c.parent as *const CasWord,
                old: encode_parent(n_entry.node),
                new: encode_parent(p_entry.node),
            });
            entries.push(Entry {
                addr: &c.version as *const CasWord,
                old: encode_version(cv),
                new: encode_version(cv + 2),
            });
        }
        primitive::execute(entries)
    }

    /// Overwrites `n`'s key with its in-order successor `s`'s, then unlinks
    /// `s` (which has at most a right child). Returns the node the
    /// rebalance walk should start from on success.
    fn try_erase_two_child(&self, n: &KNode, n_entry: &PathEntry, right: *const KNode) -> Option<*const KNode> {
        let mut sp = n_entry.node;
        let mut s = right;
        loop {
            let s_ref = unsafe { &*s };
            let sl = s_ref.left_ptr();
            if sl.is_null() {
                break;
            }
            sp = s;
            s = sl;
        }
        let s_ref = unsafe { &*s };
        let sp_ref = unsafe { &*sp };
        let s_version = s_ref.version();
        let sr = s_ref.right_ptr();

        let mut entries = vec![
            Entry {
                addr: &n.key as *const CasWord,
                old: n.raw_key_word(),
                new: encode_key(s_ref.key()),
            },
            Entry {
                addr: &s_ref.version as *const CasWord,
                old: encode_version(s_version),
                new: encode_version(s_version + 1),
            },
        ];
        let continue_from;
        if sp == n_entry.node {
            entries.push(Entry {
                addr: n.child_word(Dir::Right) as *const CasWord,
                old: encode_child(s),
                new: encode_child(sr),
            });
            entries.push(Entry {
                addr: &n.version as *const CasWord,
                old: encode_version(n_entry.version),
                new: encode_version(n_entry.version + 2),
            });
            if !sr.is_null() {
                let sr_ref = unsafe { &*sr };
                let sr_v = sr_ref.version();
                entries.push(Entry {
                    addr: &sr_ref.parent as *const CasWord,
                    old: encode_parent(s),
                    new: encode_parent(n_entry.node),
                });
                entries.push(Entry {
                    addr: &sr_ref.version as *const CasWord,
                    old: encode_version(sr_v),
                    new: encode_version(sr_v + 2),
                });
            }
            continue_from = n_entry.node;
        } else {
            let sp_v = sp_ref.version();
            entries.push(Entry {
                addr: sp_ref.child_word(Dir::Left) as *const CasWord,
                old: encode_child(s),
                new: encode_child(sr),
            });
            entries.push(Entry {
                addr: &sp_ref.version as *const CasWord,
                old: encode_version(sp_v),
                new: encode_version(sp_v + 2),
            });
            entries.push(Entry {
                addr: &n.version as *const CasWord,
                old: encode_version(n_entry.version),
                new: encode_version(n_entry.version + 2),
            });
            if !sr.is_null() {
                let sr_ref = unsafe { &*sr };
                let sr_v = sr_ref.version();
                entries.push(Entry {
                    addr: &sr_ref.parent as *const CasWord,
                    old: encode_parent(s),
                    new: encode_parent(sp),
                });
                entries.push(Entry {
                    addr: &sr_ref.version as *const CasWord,
                    old: encode_version(sr_v),
                    new: encode_version(sr_v + 2),
                });
            }
            continue_from = sp;
        }
        if primitive::execute(entries) {
            Some(continue_from)
        } else {
            None
        }
    }

    pub fn preorder(&self) -> Vec<i32> {
        let root = unsafe { &*self.max_root };
        let min_root = unsafe { &*root.left_ptr() };
        let mut out = Vec::new();
        preorder_at(min_root.right_ptr(), &mut out);
        out
    }
}

impl Default for KcasTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KcasTree {
    fn drop(&mut self) {
        // single-threaded by now: plain recursive free, no helping needed.
        fn free(node: *const KNode) {
            if node.is_null() {
                return;
            }
            let n = unsafe { &*node };
            free(n.left_ptr());
            free(n.right_ptr());
            unsafe {
                drop(Box::from_raw(node as *mut KNode));
            }
        }
        let root = unsafe { &*self.max_root };
        let min_root_ptr = root.left_ptr();
        let min_root = unsafe { &*min_root_ptr };
        free(min_root.right_ptr());
        unsafe {
            drop(Box::from_raw(min_root_ptr as *mut KNode));
            drop(Box::from_raw(self.max_root as *mut KNode));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains() {
        let t = KcasTree::new();
        assert!(t.insert(5));
        assert!(!t.insert(5));
        assert!(t.contains(5));
        assert!(t.remove(5));
        assert!(!t.remove(5));
        assert!(!t.contains(5));
    }

    #[test]
    fn scenario_s1() {
        let t = KcasTree::new();
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
    fn two_child_removal() {
        let t = KcasTree::new();
        for k in [10, 5, 15, 3, 7, 12, 20] {
            t.insert(k);
        }
        assert!(t.remove(5));
        assert!(!t.contains(5));
        for k in [10, 15, 3, 7, 12, 20] {
            assert!(t.contains(k));
        }
    }
}
