//! FILENAME: core/crosstab-engine/src/fold.rs
//! Result Folder - nests flat aggregate rows into a tree keyed by axis values.
//!
//! Algorithm:
//! 1. Build an empty tree shaped like the header set, in fold order (row axis
//!    outermost, then the column axes in selection order). Every leaf exists
//!    and starts as `Leaf(None)`, so "no data" stays distinct from zero.
//! 2. Turn each flat row into a single-path tree ending in its metric.
//! 3. Merge each path into the tree with a distinct recursive merge: branches
//!    merge key by key, anything else replaces. Cost is O(rows x depth).

use serde::{Deserialize, Serialize};

use crate::cache::{AxisValue, FlatRow, HeaderSet};
use crate::definition::{AggregationMode, OrderedMap};
use crate::logging::CAT_FOLD;
use crate::selection::AxisSelection;

/// One level of the folded tree, in header order.
pub type FoldLevel = OrderedMap<AxisValue, FoldNode>;

/// A node of the folded tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FoldNode {
    /// Innermost position: the metric, or `None` when no row supplied one.
    Leaf(Option<f64>),
    Branch(#[serde(with = "indexmap::map::serde_seq")] FoldLevel),
}

impl FoldNode {
    /// Appends every leaf below this node, depth-first in level order.
    pub fn collect_leaves(&self, out: &mut Vec<Option<f64>>) {
        match self {
            FoldNode::Leaf(value) => out.push(*value),
            FoldNode::Branch(level) => {
                for child in level.values() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn leaves(&self) -> Vec<Option<f64>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }
}

/// The folded result: top level keyed by the row axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldedTree {
    #[serde(with = "indexmap::map::serde_seq")]
    pub root: FoldLevel,
}

impl FoldedTree {
    /// Builds the complete empty skeleton for the given header set.
    pub fn skeleton(headers: &HeaderSet, selection: &AxisSelection) -> Self {
        let mut node: Option<FoldLevel> = None;

        // Innermost level first, then wrap outwards
        for axis in selection.fold_order().iter().rev() {
            let Some(labels) = headers.axis(&axis.key) else {
                continue;
            };
            let mut level = FoldLevel::with_capacity_and_hasher(labels.len(), Default::default());
            for id in labels.keys() {
                let child = match &node {
                    Some(inner) => FoldNode::Branch(inner.clone()),
                    None => FoldNode::Leaf(None),
                };
                level.insert(id.clone(), child);
            }
            node = Some(level);
        }

        FoldedTree { root: node.unwrap_or_default() }
    }

    /// Skeleton plus every row merged in, in row order (last row wins).
    pub fn fold(
        rows: &[FlatRow],
        headers: &HeaderSet,
        selection: &AxisSelection,
        mode: AggregationMode,
    ) -> Self {
        let mut tree = FoldedTree::skeleton(headers, selection);
        let order = fold_positions(selection);

        for row in rows {
            let path = row_path(row, &order, mode);
            merge_distinct(&mut tree.root, path);
        }

        log_debug!(CAT_FOLD, "folded {} rows into {} top-level entries", rows.len(), tree.root.len());
        tree
    }

    pub fn get(&self, id: &AxisValue) -> Option<&FoldNode> {
        self.root.get(id)
    }
}

/// Positions into `FlatRow::axes` (selection order) in fold order.
fn fold_positions(selection: &AxisSelection) -> Vec<usize> {
    let n = selection.len();
    if n == 0 {
        return Vec::new();
    }
    std::iter::once(n - 1).chain(0..n - 1).collect()
}

/// Single-path tree: outermost id -> ... -> innermost id -> metric.
fn row_path(row: &FlatRow, order: &[usize], mode: AggregationMode) -> FoldLevel {
    let id_at = |pos: usize| row.axes.get(pos).map_or(AxisValue::Empty, |cell| cell.id.clone());
    let mut path = FoldLevel::default();
    let Some((&outer, inner)) = order.split_first() else {
        return path;
    };

    let mut node = FoldNode::Leaf(row.metric(mode));
    for &pos in inner.iter().rev() {
        let mut level = FoldLevel::default();
        level.insert(id_at(pos), node);
        node = FoldNode::Branch(level);
    }
    path.insert(id_at(outer), node);
    path
}

/// Merges `incoming` into `target`. For a key where both sides are branches
/// the merge recurses; otherwise the incoming node replaces the existing one.
pub fn merge_distinct(target: &mut FoldLevel, incoming: FoldLevel) {
    for (key, node) in incoming {
        match node {
            FoldNode::Branch(next) => {
                if let Some(FoldNode::Branch(existing)) = target.get_mut(&key) {
                    merge_distinct(existing, next);
                    continue;
                }
                target.insert(key, FoldNode::Branch(next));
            }
            leaf => {
                target.insert(key, leaf);
            }
        }
    }
}
