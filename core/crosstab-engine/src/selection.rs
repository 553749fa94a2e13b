//! FILENAME: core/crosstab-engine/src/selection.rs
//! Axis Selector - maps requested groups onto axis slots.
//!
//! Requested groups are deduplicated (first occurrence wins) and zipped with
//! the allowed slot sequence. A group with no definition for its slot leaves
//! that slot empty; groups beyond the slot count are dropped.

use crate::definition::{AxisDefinition, AxisKey, CrosstabConfig, GroupName};
use crate::logging::CAT_CROSSTAB;

/// One chosen axis: the slot it occupies and the definition behind it.
#[derive(Debug, Clone)]
pub struct SelectedAxis {
    pub key: AxisKey,
    pub group: GroupName,
    pub definition: AxisDefinition,
}

impl SelectedAxis {
    /// Display title, falling back to the group name.
    pub fn title(&self) -> &str {
        self.definition.title.as_deref().unwrap_or(&self.group)
    }
}

/// Ordered list of selected axes, outermost (first) to innermost (last).
#[derive(Debug, Clone, Default)]
pub struct AxisSelection {
    axes: Vec<SelectedAxis>,
}

impl AxisSelection {
    pub fn new() -> Self {
        AxisSelection::default()
    }

    /// Assigns groups to slots and fires each selected axis' hook in
    /// assignment order.
    pub fn select<S: AsRef<str>>(
        requested: &[S],
        allowed: &[AxisKey],
        config: &CrosstabConfig,
    ) -> Self {
        let mut groups: Vec<&str> = Vec::with_capacity(requested.len());
        for group in requested {
            let group = group.as_ref();
            if !groups.contains(&group) {
                groups.push(group);
            }
        }

        let mut axes = Vec::new();
        for (key, group) in allowed.iter().zip(groups.iter()) {
            let Some(definition) = config.lookup(group, key) else {
                log_warn!(CAT_CROSSTAB, "no definition for group '{}' on axis '{}', skipped", group, key);
                continue;
            };
            if let Some(hook) = &definition.hook {
                hook.apply();
            }
            axes.push(SelectedAxis {
                key: key.clone(),
                group: group.to_string(),
                definition: definition.clone(),
            });
        }

        if groups.len() > allowed.len() {
            log_warn!(
                CAT_CROSSTAB,
                "{} groups requested but only {} axes allowed; extra groups dropped",
                groups.len(),
                allowed.len()
            );
        }
        log_debug!(
            CAT_CROSSTAB,
            "selected axes: {:?}",
            axes.iter().map(|a| format!("{}={}", a.key, a.group)).collect::<Vec<_>>()
        );

        AxisSelection { axes }
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedAxis> {
        self.axes.iter()
    }

    pub fn as_slice(&self) -> &[SelectedAxis] {
        &self.axes
    }

    pub fn get(&self, key: &str) -> Option<&SelectedAxis> {
        self.axes.iter().find(|a| a.key == key)
    }

    /// The axis whose labels key the table rows (the last selected).
    pub fn row_axis(&self) -> Option<&SelectedAxis> {
        self.axes.last()
    }

    /// Axes forming the column header rows, outer to inner.
    pub fn column_axes(&self) -> &[SelectedAxis] {
        match self.axes.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    /// Nesting order of the folded tree: row axis first, then column axes.
    pub fn fold_order(&self) -> Vec<&SelectedAxis> {
        self.row_axis()
            .into_iter()
            .chain(self.column_axes().iter())
            .collect()
    }
}
