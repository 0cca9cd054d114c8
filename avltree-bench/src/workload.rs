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

//! Random workload generation for the throughput sweep: a mix of reads
//! (`contains`) and writes (`insert`/`remove`, split evenly) over a fixed key
//! space, drawn with `rand` the way `sky-bench` draws its own query mix.

use avltree_core::{IntSet, Tree};
use rand::{rngs::ThreadRng, Rng};

/// The range of keys a benchmark run draws from. Large enough that
/// concurrent mutators collide only occasionally at high thread counts.
pub const KEY_SPACE: i32 = 200_000;

#[derive(Debug, Clone, Copy)]
pub enum BenchOp {
    Insert(i32),
    Remove(i32),
    Contains(i32),
}

fn draw_op(rng: &mut ThreadRng, read_ratio: f64) -> BenchOp {
    let key = rng.gen_range(0..KEY_SPACE);
    let roll: f64 = rng.gen();
    if roll < read_ratio {
        BenchOp::Contains(key)
    } else if roll < read_ratio + (1.0 - read_ratio) / 2.0 {
        BenchOp::Insert(key)
    } else {
        BenchOp::Remove(key)
    }
}

/// Splits `total_ops` evenly across `threads` batches, each an independently
/// drawn random mix per `read_ratio`.
pub fn generate(total_ops: usize, threads: usize, read_ratio: f64) -> Vec<Vec<BenchOp>> {
    let mut rng = rand::thread_rng();
    let per_thread = total_ops / threads.max(1);
    (0..threads)
        .map(|_| (0..per_thread).map(|_| draw_op(&mut rng, read_ratio)).collect())
        .collect()
}

/// Seeds a fresh tree with half the key space so reads and removes have
/// something to find; not counted toward the timed workload.
pub fn prepopulate(tree: &Tree) {
    let mut rng = rand::thread_rng();
    for _ in 0..(KEY_SPACE / 2) {
        let key = rng.gen_range(0..KEY_SPACE);
        tree.insert(key);
    }
}

pub fn apply(tree: &Tree, op: BenchOp) {
    match op {
        BenchOp::Insert(k) => {
            tree.insert(k);
        }
        BenchOp::Remove(k) => {
            tree.remove(k);
        }
        BenchOp::Contains(k) => {
            tree.contains(k);
        }
    }
}
