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

use {libstress::WorkpoolError, std::fmt::Display, std::num::ParseIntError};

pub type CResult<T> = Result<T, Error>;

/// Errors the script-driven harness can report. Distinct from the core's own
/// "no exceptions escape a well-formed call" contract: everything here
/// originates from the harness's I/O and parsing, not from the tree.
#[derive(Debug)]
pub enum Error {
    /// Could not open or read the script file.
    Io(std::io::Error),
    /// A line of the script did not match `{insert|delete|search} <int>`.
    Parse { line: usize, reason: String },
    /// A line named an operation other than insert/delete/search.
    UnknownOperation { line: usize, op: String },
    /// A worker thread failed.
    Runtime(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<WorkpoolError> for Error {
    fn from(e: WorkpoolError) -> Self {
        Error::Runtime(format!("threadpool error: {e}"))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Parse { line, reason } => write!(f, "parse error at line {line}: {reason}"),
            Error::UnknownOperation { line, op } => {
                write!(f, "unknown operation '{op}' at line {line}")
            }
            Error::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

pub fn int_parse_error(line: usize, e: ParseIntError) -> Error {
    Error::Parse {
        line,
        reason: format!("expected an integer: {e}"),
    }
}
