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

//! Dispatches a parsed script across a [`libstress::Workpool`] of `n` worker
//! threads, each executing operations against one shared [`avltree_core::Tree`].

use crate::error::CResult;
use crate::script::Op;
use avltree_core::{IntSet, Tree};
use libstress::Workpool;
use std::sync::Arc;

pub fn run(tree: Arc<Tree>, ops: Vec<Op>, threads: usize) -> CResult<()> {
    let pool: Workpool<Arc<Tree>, Op, _, _, _> = Workpool::new(
        threads,
        move || tree.clone(),
        |tree: &mut Arc<Tree>, op: Op| {
            dispatch(tree, op);
        },
        |_tree: &mut Arc<Tree>| {},
        false,
    )?;
    for op in ops {
        pool.execute(op)?;
    }
    drop(pool); // blocks until every queued operation has been handled
    Ok(())
}

fn dispatch(tree: &Tree, op: Op) {
    match op {
        Op::Insert(k) => {
            tree.insert(k);
        }
        Op::Delete(k) => {
            tree.remove(k);
        }
        Op::Search(k) => {
            tree.contains(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avltree_core::Scheme;

    #[test]
    fn runs_a_script_to_completion() {
        let tree = Arc::new(Tree::new(Scheme::Coarse));
        let ops = vec![Op::Insert(1), Op::Insert(2), Op::Delete(1), Op::Search(2)];
        run(tree.clone(), ops, 2).unwrap();
        assert!(!tree.contains(1));
        assert!(tree.contains(2));
    }
}
