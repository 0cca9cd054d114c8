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

//! Per-node layout for the kcas scheme (C5). Every mutable field — key
//! (overwritten only during two-child erase), child links, parent back-link,
//! height and version — is a [`CasWord`] so that every structural edit can be
//! bundled into a single multi-word compare-and-swap.

use super::primitive::{decode_ptr, decode_val, encode_ptr, encode_val, read, CasWord};
use crate::node::Dir;

pub const NULL_WORD: u64 = 0;

pub struct KNode {
    pub key: CasWord,
    pub left: CasWord,
    pub right: CasWord,
    pub parent: CasWord,
    pub height: CasWord,
    /// Low bit: mark (logically removed). Remaining bits: a counter bumped
    /// by 2 on every structural change that affects this node.
    pub version: CasWord,
}

#[inline]
fn ptr_to_word(p: *const KNode) -> u64 {
    if p.is_null() {
        NULL_WORD
    } else {
        encode_ptr(p as usize)
    }
}

#[inline]
fn word_to_ptr(w: u64) -> *const KNode {
    decode_ptr(w) as *const KNode
}

impl KNode {
    pub fn new(key: i32, parent: *const KNode, height: i64) -> Self {
        Self {
            key: CasWord::new(encode_val(key as i64 as u64)),
            left: CasWord::new(NULL_WORD),
            right: CasWord::new(NULL_WORD),
            parent: CasWord::new(ptr_to_word(parent)),
            height: CasWord::new(encode_val(height as u64)),
            version: CasWord::new(encode_val(0)),
        }
    }

    pub fn key(&self) -> i32 {
        decode_val(read(&self.key)) as i64 as i32
    }

    pub fn raw_key_word(&self) -> u64 {
        read(&self.key)
    }

    pub fn child_word(&self, dir: Dir) -> &CasWord {
        match dir {
            Dir::Left => &self.left,
            Dir::Right => &self.right,
        }
    }

    pub fn left_ptr(&self) -> *const KNode {
        word_to_ptr(read(&self.left))
    }

    pub fn right_ptr(&self) -> *const KNode {
        word_to_ptr(read(&self.right))
    }

    pub fn child_ptr(&self, dir: Dir) -> *const KNode {
        word_to_ptr(read(self.child_word(dir)))
    }

    pub fn parent_ptr(&self) -> *const KNode {
        word_to_ptr(read(&self.parent))
    }

    pub fn height(&self) -> i64 {
        decode_val(read(&self.height)) as i64
    }

    pub fn raw_height_word(&self) -> u64 {
        read(&self.height)
    }

    pub fn version(&self) -> u64 {
        decode_val(read(&self.version))
    }

    pub fn raw_version_word(&self) -> u64 {
        read(&self.version)
    }

    pub fn is_marked(&self) -> bool {
        self.version() & 1 != 0
    }
}

#[inline]
pub fn encode_child(p: *const KNode) -> u64 {
    ptr_to_word(p)
}

#[inline]
pub fn encode_parent(p: *const KNode) -> u64 {
    ptr_to_word(p)
}

#[inline]
pub fn encode_height(h: i64) -> u64 {
    encode_val(h as u64)
}

#[inline]
pub fn encode_version(v: u64) -> u64 {
    encode_val(v)
}

#[inline]
pub fn encode_key(k: i32) -> u64 {
    encode_val(k as i64 as u64)
}
