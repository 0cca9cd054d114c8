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

//! Balance algebra (C2): the rotation decision shared by every scheme.
//!
//! The four rotation templates themselves (single left/right, double
//! left-right/right-left) are necessarily expressed against each scheme's own
//! node representation and synchronization discipline — a coarse tree rotates
//! owned `Box`es, the optimistic scheme rotates `Arc`-shared nodes under
//! locks, and the kcas scheme rotates via a multi-word CAS bundle. What *is*
//! shared, and lives here, is the pure decision of which rotation a node's
//! balance factor calls for; duplicating this arithmetic per scheme is
//! exactly the kind of left/right, scheme-a/scheme-b copy this crate avoids.

/// The rotation (or lack of one) that a node's current balance factor calls
/// for, expressed purely in terms of heights — no node representation leaks
/// into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPlan {
    /// `|balance| <= 1`; nothing to do.
    None,
    /// Single rotation toward the right (left-heavy node, left child not
    /// right-heavy).
    SingleRight,
    /// Left child rotated left, then node rotated right (left-heavy node,
    /// left child right-heavy).
    LeftRight,
    /// Single rotation toward the left (right-heavy node, right child not
    /// left-heavy).
    SingleLeft,
    /// Right child rotated right, then node rotated left (right-heavy node,
    /// right child left-heavy).
    RightLeft,
}

/// `height(left) - height(right)`, with an absent child treated as height 0.
#[inline]
pub fn balance_factor(height_left: i64, height_right: i64) -> i64 {
    height_left - height_right
}

/// `1 + max(height(left), height(right))`, the cached height of a node given
/// its children's heights.
#[inline]
pub fn recompute_height(height_left: i64, height_right: i64) -> i64 {
    1 + height_left.max(height_right)
}

/// Decides which rotation, if any, a node with balance factor `b` and whose
/// heavier child has balance factor `child_b` requires. Mirrors the table in
/// the balance algebra exactly:
///
/// - `b > 1`, `child_b >= 0` -> single right.
/// - `b > 1`, `child_b < 0`  -> left(left-child) then right(node).
/// - `b < -1`, `child_b <= 0` -> single left.
/// - `b < -1`, `child_b > 0`  -> right(right-child) then left(node).
#[inline]
pub fn plan_rotation(b: i64, child_b: i64) -> RotationPlan {
    if b > 1 {
        if child_b >= 0 {
            RotationPlan::SingleRight
        } else {
            RotationPlan::LeftRight
        }
    } else if b < -1 {
        if child_b <= 0 {
            RotationPlan::SingleLeft
        } else {
            RotationPlan::RightLeft
        }
    } else {
        RotationPlan::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_needs_nothing() {
        assert_eq!(plan_rotation(0, 0), RotationPlan::None);
        assert_eq!(plan_rotation(1, 0), RotationPlan::None);
        assert_eq!(plan_rotation(-1, 0), RotationPlan::None);
    }

    #[test]
    fn left_heavy_cases() {
        assert_eq!(plan_rotation(2, 1), RotationPlan::SingleRight);
        assert_eq!(plan_rotation(2, 0), RotationPlan::SingleRight);
        assert_eq!(plan_rotation(2, -1), RotationPlan::LeftRight);
    }

    #[test]
    fn right_heavy_cases() {
        assert_eq!(plan_rotation(-2, -1), RotationPlan::SingleLeft);
        assert_eq!(plan_rotation(-2, 0), RotationPlan::SingleLeft);
        assert_eq!(plan_rotation(-2, 1), RotationPlan::RightLeft);
    }

    #[test]
    fn heights_and_balance() {
        assert_eq!(recompute_height(2, 3), 4);
        assert_eq!(balance_factor(2, 3), -1);
    }
}
