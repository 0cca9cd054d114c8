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

//! Sweeps thread counts 1, 2, 4, ... up to the configured maximum, timing a
//! fixed-size random workload against a freshly built tree at each point and
//! reporting throughput and speedup relative to the single-thread run — the
//! measurement the C++ origin made in `speedup.cpp`/`performance.cpp`.

use crate::error::BResult;
use crate::report::AggregateReport;
use crate::workload::{self, BenchOp};
use avltree_core::{Scheme, Tree};
use devtimer::SimpleTimer;
use libstress::Workpool;
use std::sync::Arc;

fn thread_sweep(max_threads: usize) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut t = 1;
    while t < max_threads {
        counts.push(t);
        t *= 2;
    }
    counts.push(max_threads.max(1));
    counts.dedup();
    counts
}

fn run_one(scheme: Scheme, ops: usize, read_ratio: f64, threads: usize) -> BResult<f64> {
    let tree = Arc::new(Tree::new(scheme));
    workload::prepopulate(&tree);
    let batches = workload::generate(ops, threads, read_ratio);

    let pool: Workpool<Arc<Tree>, BenchOp, _, _, _> = Workpool::new(
        threads,
        move || tree.clone(),
        |tree: &mut Arc<Tree>, op: BenchOp| workload::apply(tree, op),
        |_tree: &mut Arc<Tree>| {},
        false,
    )?;

    let mut timer = SimpleTimer::new();
    timer.start();
    let mut dispatched = 0usize;
    for batch in batches {
        for op in batch {
            pool.execute(op)?;
            dispatched += 1;
        }
    }
    drop(pool); // blocks until every queued operation has run
    timer.stop();

    let elapsed_nanos = timer
        .time_in_nanos()
        .ok_or_else(|| crate::error::Error::Runtime("timer never started".into()))?;
    let elapsed_secs = elapsed_nanos as f64 / 1_000_000_000.0;
    Ok(dispatched as f64 / elapsed_secs)
}

pub fn run(scheme: Scheme, ops: usize, read_ratio: f64, max_threads: usize) -> BResult<AggregateReport> {
    let mut timings = Vec::new();
    for threads in thread_sweep(max_threads) {
        info!("running {} ops over {} threads (scheme={})", ops, threads, scheme);
        let qps = run_one(scheme, ops, read_ratio, threads)?;
        timings.push((threads, qps));
    }
    Ok(AggregateReport::from_timings(scheme.to_string(), ops, read_ratio, timings))
}
