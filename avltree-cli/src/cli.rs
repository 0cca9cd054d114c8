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
    #[arg(short = 'f', long = "file", help = "Path to the operation script", value_name = "PATH")]
    pub file: String,

    #[arg(
        short = 'n',
        long = "threads",
        help = "Number of worker threads to dispatch operations across",
        value_name = "COUNT",
        default_value_t = 1
    )]
    pub threads: usize,

    #[arg(
        long = "scheme",
        help = "Synchronization scheme to exercise",
        value_name = "SCHEME",
        default_value = "optimistic"
    )]
    pub scheme: String,

    #[arg(long, help = "Print help information", action=ArgAction::Help)]
    pub help: Option<bool>,
}
