//! FILENAME: core/crosstab-engine/src/view.rs
//! Table Matrix - renderable output for the rendering layer.
//!
//! The matrix describes an HTML-style table:
//! - one header row per column axis (repeated `header_frequencies` times)
//! - one body row per row-axis label, values in column order, plus a row
//!   total when more than one axis is selected
//! - a single footer row of per-column totals, sums or averages
//!
//! `None` in any value position means "no data", which is distinct from 0.

use serde::{Deserialize, Serialize};

use crate::cache::AxisValue;
use crate::definition::{AggregationMode, AxisKey, GroupName, OrderedMap};

/// Describes one selected axis for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixAxis {
    pub key: AxisKey,
    pub group: GroupName,
    pub title: String,
}

/// One cell of a column header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    /// 1-based repetition this cell belongs to.
    pub repeat: usize,
    pub id: AxisValue,
    /// Formatted label.
    pub label: String,
    pub colspan: usize,
}

impl HeaderCell {
    /// `"{repeat}.{label}"`, unique within its header row.
    pub fn key(&self) -> String {
        format!("{}.{}", self.repeat, self.id.display_value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRow {
    pub axis: AxisKey,
    pub cells: Vec<HeaderCell>,
}

/// One body row, keyed by an identity of the row axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub id: AxisValue,
    /// Formatted label.
    pub label: String,
    /// Leaf values in column order; ends with the row total when present.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterRow {
    /// `totals`, `sum` or `averages`.
    pub label: String,
    /// One aggregate per column position.
    pub values: Vec<Option<f64>>,
}

/// The complete crosstab. Rebuilt from scratch on every build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMatrix {
    pub mode: AggregationMode,
    pub axes: Vec<MatrixAxis>,
    pub colspans: OrderedMap<AxisKey, usize>,
    pub header_frequencies: OrderedMap<AxisKey, usize>,
    pub headers: Vec<HeaderRow>,
    pub rows: Vec<MatrixRow>,
    pub footers: Vec<FooterRow>,
}

impl TableMatrix {
    /// An all-empty matrix for the given mode.
    pub fn empty(mode: AggregationMode) -> Self {
        TableMatrix {
            mode,
            ..TableMatrix::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.headers.is_empty() && self.footers.is_empty()
    }

    /// Number of data columns (excluding the row total).
    pub fn column_count(&self) -> usize {
        self.footers.first().map_or(0, |f| f.values.len())
    }

    pub fn row(&self, label: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn footer(&self) -> Option<&FooterRow> {
        self.footers.first()
    }

    pub fn header_row(&self, axis: &str) -> Option<&HeaderRow> {
        self.headers.iter().find(|h| h.axis == axis)
    }

    pub fn colspan(&self, axis: &str) -> Option<usize> {
        self.colspans.get(axis).copied()
    }
}
