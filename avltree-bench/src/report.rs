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

use serde::Serialize;

#[derive(Serialize, Clone, Copy)]
pub struct SingleReport {
    threads: usize,
    ops_per_sec: f64,
    speedup: f64,
}

#[derive(Serialize)]
pub struct AggregateReport {
    scheme: String,
    ops_per_run: usize,
    read_ratio: f64,
    runs: Vec<SingleReport>,
}

impl AggregateReport {
    /// `timings` are `(threads, ops_per_run / elapsed_seconds)` pairs, in the
    /// order the sweep was run; the first entry is the single-thread
    /// baseline every other entry's speedup is computed against.
    pub fn from_timings(scheme: String, ops_per_run: usize, read_ratio: f64, timings: Vec<(usize, f64)>) -> Self {
        let baseline = timings.first().map(|(_, qps)| *qps).unwrap_or(1.0);
        let runs = timings
            .into_iter()
            .map(|(threads, ops_per_sec)| SingleReport {
                threads,
                ops_per_sec,
                speedup: ops_per_sec / baseline,
            })
            .collect();
        Self {
            scheme,
            ops_per_run,
            read_ratio,
            runs,
        }
    }

    pub fn into_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("report serializes without error")
    }

    pub fn into_table(&self) -> String {
        let mut out = format!(
            "scheme={} ops_per_run={} read_ratio={:.2}\n",
            self.scheme, self.ops_per_run, self.read_ratio
        );
        out.push_str(&format!("{:>8}  {:>14}  {:>8}\n", "threads", "ops/sec", "speedup"));
        for run in &self.runs {
            out.push_str(&format!(
                "{:>8}  {:>14.1}  {:>7.2}x\n",
                run.threads, run.ops_per_sec, run.speedup
            ));
        }
        out
    }
}
