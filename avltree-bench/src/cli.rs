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

use clap::{ArgAction, Parser};

const HELP_TEMPLATE: &str = r#"
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"#;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None, disable_help_flag=true, help_template=HELP_TEMPLATE)]
pub struct Cli {
    #[arg(
        long = "scheme",
        help = "Synchronization scheme to benchmark",
        value_name = "SCHEME",
        default_value = "optimistic"
    )]
    pub scheme: String,

    #[arg(
        long = "ops",
        help = "Total operations issued per thread-count run",
        value_name = "COUNT",
        default_value_t = 200_000
    )]
    pub ops: usize,

    #[arg(
        long = "read-ratio",
        help = "Fraction of operations that are contains() reads (remainder splits evenly between insert and remove)",
        value_name = "RATIO",
        default_value_t = 0.8
    )]
    pub read_ratio: f64,

    #[arg(
        short = 'n',
        long = "threads",
        help = "Maximum worker thread count; the run sweeps 1, 2, 4, ... up to this value",
        value_name = "COUNT",
        default_value_t = 8
    )]
    pub threads: usize,

    #[arg(
        short = 'f',
        long = "file",
        help = "Write the report to this path instead of stdout",
        value_name = "PATH"
    )]
    pub file: Option<String>,

    #[arg(long, help = "Emit the report as JSON", default_value_t = false)]
    pub json: bool,

    #[arg(long, help = "Print help information", action=ArgAction::Help)]
    pub help: Option<bool>,
}
