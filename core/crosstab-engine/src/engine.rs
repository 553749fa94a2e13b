//! FILENAME: core/crosstab-engine/src/engine.rs
//! Crosstab Engine - turns a cached result set into a `TableMatrix`.
//!
//! Algorithm:
//! 1. Colspans and header frequencies from the header set sizes
//! 2. Column header rows, repeated per frequency, with formatted labels
//! 3. Fold the flat rows into a tree (see `fold`)
//! 4. Walk the tree per row-axis identity, flattening each subtree
//!    depth-first into the row's values; accumulate row and column totals
//! 5. A single footer row with the per-column totals

use rustc_hash::FxHashMap;

use crate::cache::{AxisValue, HeaderSet, ResultSet};
use crate::definition::{AggregationMode, AxisKey, OrderedMap};
use crate::fold::FoldedTree;
use crate::logging::CAT_CROSSTAB;
use crate::selection::{AxisSelection, SelectedAxis};
use crate::view::{FooterRow, HeaderCell, HeaderRow, MatrixAxis, MatrixRow, TableMatrix};

// ============================================================================
// HEADER FORMATTING
// ============================================================================

/// Applies each axis' header-format function once per identity and reuses
/// the result.
#[derive(Debug, Clone, Default)]
pub struct HeaderFormatter {
    cache: FxHashMap<AxisKey, FxHashMap<AxisValue, String>>,
}

impl HeaderFormatter {
    pub fn new() -> Self {
        HeaderFormatter::default()
    }

    pub fn format(&mut self, axis: &SelectedAxis, id: &AxisValue, label: &str) -> String {
        self.cache
            .entry(axis.key.clone())
            .or_default()
            .entry(id.clone())
            .or_insert_with(|| match &axis.definition.header_format {
                Some(format) => format.apply(label),
                None => label.to_string(),
            })
            .clone()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

// ============================================================================
// SPANS
// ============================================================================

/// Colspans per axis, in selection order.
///
/// Walking the fold order from innermost to outermost: the innermost axis
/// spans 1, each outer axis spans (labels of the axis one level in) times
/// (that axis' colspan).
pub fn calculate_colspans(selection: &AxisSelection, headers: &HeaderSet) -> OrderedMap<AxisKey, usize> {
    let mut colspans = OrderedMap::default();
    if headers.is_empty() {
        return colspans;
    }

    let fold = selection.fold_order();
    let mut spans = vec![1usize; fold.len()];
    for i in (0..fold.len().saturating_sub(1)).rev() {
        spans[i] = headers.size(&fold[i + 1].key) * spans[i + 1];
    }
    let by_key: FxHashMap<&str, usize> = fold
        .iter()
        .zip(spans.iter())
        .map(|(axis, span)| (axis.key.as_str(), *span))
        .collect();

    for axis in selection.iter() {
        colspans.insert(axis.key.clone(), by_key.get(axis.key.as_str()).copied().unwrap_or(1));
    }
    colspans
}

/// How many times each column axis' header row repeats across the table.
/// The outermost column axis appears once; each inner one repeats once per
/// combination of the axes outside it (1, then previous frequency times
/// previous label count). This is what the rendered header rows need; it is
/// not the product of the label counts of the axes inside the axis. The row
/// axis has no entry.
pub fn calculate_header_frequencies(
    selection: &AxisSelection,
    headers: &HeaderSet,
) -> OrderedMap<AxisKey, usize> {
    let mut frequencies = OrderedMap::default();
    if headers.is_empty() {
        return frequencies;
    }

    let mut frequency = 1usize;
    let mut previous_size: Option<usize> = None;
    for axis in selection.column_axes() {
        if let Some(size) = previous_size {
            frequency *= size;
        }
        frequencies.insert(axis.key.clone(), frequency);
        previous_size = Some(headers.size(&axis.key));
    }
    frequencies
}

// ============================================================================
// TOTALS
// ============================================================================

/// Running aggregate over a row or a column. Empty positions are skipped.
#[derive(Debug, Clone, Copy, Default)]
struct TotalAccumulator {
    sum: f64,
    count: usize,
}

impl TotalAccumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn compute(&self, mode: AggregationMode) -> Option<f64> {
        match mode {
            AggregationMode::Count | AggregationMode::Sum => Some(self.sum),
            AggregationMode::Average if self.count == 0 => None,
            AggregationMode::Average => Some(self.sum / self.count as f64),
        }
    }
}

// ============================================================================
// MATRIX
// ============================================================================

/// Builds the table matrix for `mode` from a cached result set.
pub fn build_table_matrix(
    selection: &AxisSelection,
    result: &ResultSet,
    formatter: &mut HeaderFormatter,
    mode: AggregationMode,
) -> TableMatrix {
    let headers = &result.headers;
    let Some(row_axis) = selection.row_axis() else {
        return TableMatrix::empty(mode);
    };
    if headers.is_empty() {
        return TableMatrix::empty(mode);
    }

    let mut matrix = TableMatrix::empty(mode);
    matrix.axes = selection
        .iter()
        .map(|axis| MatrixAxis {
            key: axis.key.clone(),
            group: axis.group.clone(),
            title: axis.title().to_string(),
        })
        .collect();
    matrix.colspans = calculate_colspans(selection, headers);
    matrix.header_frequencies = calculate_header_frequencies(selection, headers);

    for axis in selection.column_axes() {
        let frequency = matrix.header_frequencies.get(&axis.key).copied().unwrap_or(1);
        let colspan = matrix.colspans.get(&axis.key).copied().unwrap_or(1);
        let mut cells = Vec::new();
        if let Some(labels) = headers.axis(&axis.key) {
            for repeat in 1..=frequency {
                for (id, label) in labels {
                    cells.push(HeaderCell {
                        repeat,
                        id: id.clone(),
                        label: formatter.format(axis, id, label),
                        colspan,
                    });
                }
            }
        }
        matrix.headers.push(HeaderRow { axis: axis.key.clone(), cells });
    }

    let tree = FoldedTree::fold(&result.rows, headers, selection, mode);
    let with_row_totals = selection.len() > 1;
    let mut column_totals: Vec<TotalAccumulator> = Vec::new();

    if let Some(row_labels) = headers.axis(&row_axis.key) {
        for (id, label) in row_labels {
            let mut values = tree.get(id).map(|node| node.leaves()).unwrap_or_default();

            if column_totals.len() < values.len() {
                column_totals.resize(values.len(), TotalAccumulator::default());
            }
            let mut row_total = TotalAccumulator::default();
            for (column, value) in values.iter().enumerate() {
                column_totals[column].add(*value);
                row_total.add(*value);
            }
            if with_row_totals {
                values.push(row_total.compute(mode));
            }

            matrix.rows.push(MatrixRow {
                id: id.clone(),
                label: formatter.format(row_axis, id, label),
                values,
            });
        }
    }

    matrix.footers.push(FooterRow {
        label: mode.footer_label().to_string(),
        values: column_totals.iter().map(|total| total.compute(mode)).collect(),
    });

    log_debug!(
        CAT_CROSSTAB,
        "built {} matrix: rows={} columns={} header_rows={}",
        mode,
        matrix.rows.len(),
        column_totals.len(),
        matrix.headers.len()
    );
    matrix
}
