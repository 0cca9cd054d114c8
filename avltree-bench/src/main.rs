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

use {
    crate::cli::Cli,
    avltree_core::Scheme,
    clap::Parser,
    std::{env, fs, process, str::FromStr},
};

#[macro_use]
extern crate log;

mod bench;
mod cli;
mod error;
mod report;
mod workload;

fn main() {
    env_logger::Builder::new()
        .parse_filters(&env::var("AVLTREE_BENCH_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    if let Err(e) = run() {
        error!("avltree-bench exited with error: {e}");
        process::exit(0x01);
    }
}

fn run() -> error::BResult<()> {
    let cli = Cli::parse();
    if !(0.0..=1.0).contains(&cli.read_ratio) {
        return Err(error::Error::Config(format!(
            "read-ratio must be between 0.0 and 1.0, got {}",
            cli.read_ratio
        )));
    }
    let scheme = Scheme::from_str(&cli.scheme).map_err(error::Error::Config)?;

    let report = bench::run(scheme, cli.ops, cli.read_ratio, cli.threads.max(1))?;
    let rendered = if cli.json { report.into_json() } else { report.into_table() };

    match cli.file {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}
