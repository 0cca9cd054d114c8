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
    avltree_core::{Scheme, Tree},
    clap::Parser,
    std::{env, fs::File, io::BufReader, process, str::FromStr, sync::Arc},
};

#[macro_use]
extern crate log;

mod cli;
mod error;
mod runner;
mod script;

fn main() {
    env_logger::Builder::new()
        .parse_filters(&env::var("AVLTREE_CLI_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    if let Err(e) = run() {
        error!("avltree-cli exited with error: {e}");
        process::exit(0x01);
    }
}

fn run() -> error::CResult<()> {
    let cli = Cli::parse();
    let scheme = Scheme::from_str(&cli.scheme).map_err(|e| error::Error::Parse { line: 0, reason: e })?;
    let file = File::open(&cli.file)?;
    let ops = script::parse(BufReader::new(file))?;
    info!("loaded {} operations from {}", ops.len(), cli.file);

    let tree = Arc::new(Tree::new(scheme));
    runner::run(tree, ops, cli.threads.max(1))?;
    info!("script completed");
    Ok(())
}
