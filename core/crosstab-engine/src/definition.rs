//! FILENAME: core/crosstab-engine/src/definition.rs
//! Crosstab Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a crosstab:
//! - Per-axis definitions (value expression, label expression, ordering)
//! - The registry of definitions, keyed by group name and axis key
//! - The aggregation mode a matrix is built for
//!
//! Callables attached to a definition (header format, join, selection hook)
//! are not serialized; they are set programmatically.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CrosstabError, Result};
use crate::hooks::{HeaderFormat, JoinCallback, SelectHook};

/// Identity of an axis slot (e.g. "a" .. "d").
pub type AxisKey = String;

/// Name of a configured grouping dimension (e.g. "region").
pub type GroupName = String;

/// Insertion-ordered map used throughout the crate.
pub type OrderedMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Default slot sequence; also bounds the number of axes.
pub const DEFAULT_AXIS_KEYS: [&str; 4] = ["a", "b", "c", "d"];

pub fn default_axis_keys() -> Vec<AxisKey> {
    DEFAULT_AXIS_KEYS.iter().map(|k| k.to_string()).collect()
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Metric a table matrix is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Count,
    Sum,
    #[serde(rename = "avg", alias = "average")]
    Average,
}

impl AggregationMode {
    /// Result field carrying the metric for this mode.
    pub fn metric_field(&self) -> &'static str {
        match self {
            AggregationMode::Count => "cross_count",
            AggregationMode::Sum => "cross_sum",
            AggregationMode::Average => "cross_avg",
        }
    }

    /// Name of the single footer entry.
    pub fn footer_label(&self) -> &'static str {
        match self {
            AggregationMode::Count => "totals",
            AggregationMode::Sum => "sum",
            AggregationMode::Average => "averages",
        }
    }
}

impl FromStr for AggregationMode {
    type Err = CrosstabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(AggregationMode::Count),
            "sum" => Ok(AggregationMode::Sum),
            "avg" | "average" => Ok(AggregationMode::Average),
            other => Err(CrosstabError::Configuration(format!(
                "unknown aggregation mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggregationMode::Count => "count",
            AggregationMode::Sum => "sum",
            AggregationMode::Average => "avg",
        })
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// How an axis orders its rows in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDirective {
    /// ORDER BY the grouping identity column.
    ByValue,
    /// ORDER BY the display label column.
    ByLabel,
    /// ORDER BY a raw SQL expression.
    Raw(String),
}

impl From<&str> for OrderDirective {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "column" | "value" | "id" | "by-value" => OrderDirective::ByValue,
            "name" | "label" | "by-label" => OrderDirective::ByLabel,
            _ => OrderDirective::Raw(s.to_string()),
        }
    }
}

impl Serialize for OrderDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OrderDirective::ByValue => serializer.serialize_str("by-value"),
            OrderDirective::ByLabel => serializer.serialize_str("by-label"),
            OrderDirective::Raw(sql) => serializer.serialize_str(sql),
        }
    }
}

impl<'de> Deserialize<'de> for OrderDirective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrderDirective::from(raw.as_str()))
    }
}

// ============================================================================
// AXIS DEFINITION
// ============================================================================

/// Everything needed to turn one grouping dimension into query columns and
/// table headers. Every option defaults to absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AxisDefinition {
    /// SQL expression (or column) giving the grouping identity.
    #[serde(alias = "column")]
    pub id: Option<String>,

    /// SQL expression giving the display label. Falls back to `id`.
    pub name: Option<String>,

    pub order_by: Option<OrderDirective>,

    /// Human title of the dimension, for renderers.
    pub title: Option<String>,

    #[serde(skip)]
    pub header_format: Option<HeaderFormat>,

    #[serde(skip)]
    pub join: Option<JoinCallback>,

    /// Runs immediately when the axis is selected.
    #[serde(skip)]
    pub hook: Option<SelectHook>,
}

impl AxisDefinition {
    /// Definition whose identity and label are the same expression.
    pub fn new(id: impl Into<String>) -> Self {
        AxisDefinition {
            id: Some(id.into()),
            ..AxisDefinition::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_order(mut self, order: OrderDirective) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_header_format(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.header_format = Some(HeaderFormat::new(f));
        self
    }

    pub fn with_join(mut self, f: impl Fn(&mut dyn sql_query::QueryBuilder) + 'static) -> Self {
        self.join = Some(JoinCallback::new(f));
        self
    }

    pub fn with_hook(mut self, f: impl Fn() + 'static) -> Self {
        self.hook = Some(SelectHook::new(f));
        self
    }

    /// The grouping expression. Required for every selected axis.
    pub fn value_expression(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// A label expression, only when it differs from the value expression.
    pub fn label_expression(&self) -> Option<&str> {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        match self.value_expression() {
            Some(id) if id == name => None,
            _ => Some(name),
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Axis definitions keyed by group name, then axis key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrosstabConfig {
    groups: OrderedMap<GroupName, OrderedMap<AxisKey, AxisDefinition>>,
}

impl CrosstabConfig {
    pub fn new() -> Self {
        CrosstabConfig::default()
    }

    /// Parses a `{ group: { axis key: { options } } }` document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registers the same definition for every given axis key.
    pub fn define(
        mut self,
        group: impl Into<GroupName>,
        keys: &[&str],
        definition: AxisDefinition,
    ) -> Self {
        let slots = self.groups.entry(group.into()).or_default();
        for key in keys {
            slots.insert(key.to_string(), definition.clone());
        }
        self
    }

    pub fn insert(&mut self, group: impl Into<GroupName>, key: impl Into<AxisKey>, definition: AxisDefinition) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(key.into(), definition);
    }

    /// Merges `other` into self; a later (group, key) replaces an earlier one.
    pub fn merge(&mut self, other: CrosstabConfig) {
        for (group, slots) in other.groups {
            let existing = self.groups.entry(group).or_default();
            for (key, definition) in slots {
                existing.insert(key, definition);
            }
        }
    }

    pub fn lookup(&self, group: &str, key: &str) -> Option<&AxisDefinition> {
        self.groups.get(group).and_then(|slots| slots.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}
