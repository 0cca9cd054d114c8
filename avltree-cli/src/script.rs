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

//! Parses the operation-script grammar: a leading line holding the operation
//! count, followed by that many `{insert|delete|search} <int>` lines.

use crate::error::{int_parse_error, CResult, Error};
use std::io::BufRead;

#[derive(Debug, Clone, Copy)]
pub enum Op {
    Insert(i32),
    Delete(i32),
    Search(i32),
}

pub fn parse<R: BufRead>(reader: R) -> CResult<Vec<Op>> {
    let mut lines = reader.lines();
    let count_line = lines.next().ok_or_else(|| Error::Parse {
        line: 1,
        reason: "expected an operation count on the first line".into(),
    })??;
    let count: usize = count_line.trim().parse().map_err(|e| int_parse_error(1, e))?;

    let mut ops = Vec::with_capacity(count);
    for idx in 0..count {
        let line_no = idx + 2;
        let line = lines.next().ok_or_else(|| Error::Parse {
            line: line_no,
            reason: format!("script declared {count} operations but ran out of lines"),
        })??;
        ops.push(parse_line(line_no, &line)?);
    }
    Ok(ops)
}

fn parse_line(line_no: usize, line: &str) -> CResult<Op> {
    let mut parts = line.split_whitespace();
    let op = parts.next().ok_or_else(|| Error::Parse {
        line: line_no,
        reason: "empty operation line".into(),
    })?;
    let arg = parts.next().ok_or_else(|| Error::Parse {
        line: line_no,
        reason: "missing integer argument".into(),
    })?;
    let key: i32 = arg.parse().map_err(|e| int_parse_error(line_no, e))?;
    match op {
        "insert" => Ok(Op::Insert(key)),
        "delete" => Ok(Op::Delete(key)),
        "search" => Ok(Op::Search(key)),
        other => Err(Error::UnknownOperation {
            line: line_no,
            op: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_script() {
        let text = "3\ninsert 5\ndelete 3\nsearch 5\n";
        let ops = parse(text.as_bytes()).unwrap();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], Op::Insert(5)));
        assert!(matches!(ops[1], Op::Delete(3)));
        assert!(matches!(ops[2], Op::Search(5)));
    }

    #[test]
    fn rejects_unknown_operation() {
        let text = "1\nfrobnicate 5\n";
        assert!(matches!(parse(text.as_bytes()), Err(Error::UnknownOperation { .. })));
    }

    #[test]
    fn rejects_bad_integer() {
        let text = "1\ninsert abc\n";
        assert!(matches!(parse(text.as_bytes()), Err(Error::Parse { .. })));
    }

    #[test]
    fn rejects_truncated_script() {
        let text = "2\ninsert 5\n";
        assert!(matches!(parse(text.as_bytes()), Err(Error::Parse { .. })));
    }
}
