//! FILENAME: core/crosstab-engine/src/cache.rs
//! Result Cache - the fetched aggregate rows and the header set.
//!
//! One query execution produces a `ResultSet`: the flat rows (one per unique
//! combination of axis values) and, per axis, the first-seen mapping from
//! grouping identity to display label. Both are reused by every matrix build
//! until the query is executed again.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use sql_query::{Row, Value};

use crate::definition::{AggregationMode, AxisKey, OrderedMap};
use crate::selection::AxisSelection;

// ============================================================================
// AXIS VALUES
// ============================================================================

/// A normalized, hashable grouping identity. Used as keys in headers and in
/// the folded tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl From<&Value> for AxisValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AxisValue::Empty,
            Value::Integer(i) => AxisValue::Number(OrderedFloat(*i as f64)),
            Value::Float(f) => AxisValue::Number(OrderedFloat(*f)),
            Value::Text(s) => AxisValue::Text(s.clone()),
            Value::Boolean(b) => AxisValue::Boolean(*b),
        }
    }
}

impl From<&str> for AxisValue {
    fn from(value: &str) -> Self {
        AxisValue::Text(value.to_string())
    }
}

impl From<f64> for AxisValue {
    fn from(value: f64) -> Self {
        AxisValue::Number(OrderedFloat(value))
    }
}

impl AxisValue {
    /// Text used as a label when the row carries no separate name.
    pub fn display_value(&self) -> String {
        match self {
            AxisValue::Empty => String::new(),
            AxisValue::Number(n) => Value::Float(n.0).display_value(),
            AxisValue::Text(s) => s.clone(),
            AxisValue::Boolean(b) => b.to_string(),
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // -0.0 == 0.0, so they must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// FLAT ROWS
// ============================================================================

/// One axis coordinate of a flat row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCell {
    pub id: AxisValue,
    pub label: String,
}

/// One grouped aggregate record: a coordinate per selected axis (selection
/// order) plus the metrics the query produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub axes: SmallVec<[AxisCell; 4]>,
    pub count: Option<f64>,
    pub sum: Option<f64>,
    pub avg: Option<f64>,
}

impl FlatRow {
    /// Reads `{key}_id` (or the legacy `{key}_column`) and `{key}_name` for
    /// each selected axis, and the `cross_*` metrics.
    pub fn from_row(row: &Row, selection: &AxisSelection) -> Self {
        let axes = selection
            .iter()
            .map(|axis| {
                let id = row
                    .get(&id_alias(&axis.key))
                    .or_else(|| row.get(&format!("{}_column", axis.key)))
                    .map(AxisValue::from)
                    .unwrap_or(AxisValue::Empty);
                let label = match row.get(&name_alias(&axis.key)) {
                    Some(name) if !name.is_null() => name.display_value(),
                    _ => id.display_value(),
                };
                AxisCell { id, label }
            })
            .collect();

        let metric = |mode: AggregationMode| row.get(mode.metric_field()).and_then(Value::as_f64);

        FlatRow {
            axes,
            count: metric(AggregationMode::Count),
            sum: metric(AggregationMode::Sum),
            avg: metric(AggregationMode::Average),
        }
    }

    /// The metric for a mode; `None` when the query did not produce it.
    pub fn metric(&self, mode: AggregationMode) -> Option<f64> {
        match mode {
            AggregationMode::Count => self.count,
            AggregationMode::Sum => self.sum,
            AggregationMode::Average => self.avg,
        }
    }
}

/// Alias of the grouping identity column of an axis.
pub fn id_alias(key: &str) -> String {
    format!("{}_id", key)
}

/// Alias of the display label column of an axis.
pub fn name_alias(key: &str) -> String {
    format!("{}_name", key)
}

// ============================================================================
// HEADER SET
// ============================================================================

type AxisLabels = OrderedMap<AxisKey, OrderedMap<AxisValue, String>>;

/// Per-axis ordered mapping from identity to label, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderSet {
    #[serde(serialize_with = "serialize_labels", deserialize_with = "deserialize_labels")]
    axes: AxisLabels,
}

// Identities are not valid JSON object keys; each axis is written as an
// ordered list of [identity, label] pairs.
fn serialize_labels<S: Serializer>(axes: &AxisLabels, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(
        axes.iter()
            .map(|(key, labels)| (key, labels.iter().collect::<Vec<(&AxisValue, &String)>>())),
    )
}

fn deserialize_labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AxisLabels, D::Error> {
    let raw: OrderedMap<AxisKey, Vec<(AxisValue, String)>> = Deserialize::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, labels)| (key, labels.into_iter().collect()))
        .collect())
}

impl HeaderSet {
    /// Scans the rows once. Axis order follows the selection.
    pub fn build(rows: &[FlatRow], selection: &AxisSelection) -> Self {
        let mut axes = AxisLabels::default();
        if rows.is_empty() {
            return HeaderSet { axes };
        }

        for axis in selection.iter() {
            axes.insert(axis.key.clone(), OrderedMap::default());
        }
        for row in rows {
            for (axis, cell) in selection.iter().zip(row.axes.iter()) {
                if let Some(labels) = axes.get_mut(&axis.key) {
                    labels.entry(cell.id.clone()).or_insert_with(|| cell.label.clone());
                }
            }
        }

        HeaderSet { axes }
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn axis(&self, key: &str) -> Option<&OrderedMap<AxisValue, String>> {
        self.axes.get(key)
    }

    /// Number of distinct identities on an axis (0 if unknown).
    pub fn size(&self, key: &str) -> usize {
        self.axes.get(key).map_or(0, |labels| labels.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AxisKey, &OrderedMap<AxisValue, String>)> {
        self.axes.iter()
    }
}

/// Rows and headers of the last execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub rows: Vec<FlatRow>,
    pub headers: HeaderSet,
}

impl ResultSet {
    pub fn from_rows(rows: &[Row], selection: &AxisSelection) -> Self {
        let rows: Vec<FlatRow> = rows.iter().map(|r| FlatRow::from_row(r, selection)).collect();
        let headers = HeaderSet::build(&rows, selection);
        ResultSet { rows, headers }
    }
}
