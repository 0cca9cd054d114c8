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

use {libstress::WorkpoolError, std::fmt::Display};

pub type BResult<T> = Result<T, Error>;

/// Benchmark tool errors.
pub enum Error {
    /// An error originating from the benchmark configuration.
    Config(String),
    /// A runtime error (thread pool, timing).
    Runtime(String),
    /// An error writing the report.
    Io(std::io::Error),
}

impl From<WorkpoolError> for Error {
    fn from(e: WorkpoolError) -> Self {
        Error::Runtime(format!("threadpool error: {e}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config error: {e}"),
            Error::Runtime(e) => write!(f, "runtime error: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}
