//! FILENAME: core/crosstab-engine/src/crosstab.rs
//! Crosstab facade - configuration, selection, execution and matrix builds.
//!
//! Lifecycle:
//!   new -> config -> axis -> (hook / sum / avg) -> get -> build_table_matrix
//!
//! The data source passed in is never mutated; `query()` assembles on a
//! clone, so the same instance can be re-executed.

use sql_query::QueryBuilder;

use crate::cache::{HeaderSet, ResultSet};
use crate::definition::{default_axis_keys, AggregationMode, AxisKey, CrosstabConfig};
use crate::engine::{self, HeaderFormatter};
use crate::error::{CrosstabError, Result};
use crate::hooks::{Hook, HookRegistry};
use crate::logging::CAT_CROSSTAB;
use crate::query::{assemble, MetricTargets};
use crate::selection::{AxisSelection, SelectedAxis};
use crate::view::TableMatrix;

#[derive(Debug)]
pub struct Crosstab<Q> {
    allowed_axes: Vec<AxisKey>,
    config: CrosstabConfig,
    source: Option<Q>,
    selection: AxisSelection,
    hooks: HookRegistry,
    metrics: MetricTargets,
    result: Option<ResultSet>,
    formatter: HeaderFormatter,
    table_matrix: TableMatrix,
}

impl<Q> Default for Crosstab<Q> {
    fn default() -> Self {
        Crosstab {
            allowed_axes: default_axis_keys(),
            config: CrosstabConfig::default(),
            source: None,
            selection: AxisSelection::default(),
            hooks: HookRegistry::default(),
            metrics: MetricTargets::default(),
            result: None,
            formatter: HeaderFormatter::default(),
            table_matrix: TableMatrix::default(),
        }
    }
}

impl<Q: QueryBuilder + Clone> Crosstab<Q> {
    pub fn new() -> Self {
        Crosstab::default()
    }

    pub fn with_source(source: Q) -> Self {
        Crosstab {
            source: Some(source),
            ..Crosstab::default()
        }
    }

    // ========================================================================
    // SETUP
    // ========================================================================

    /// Sets the data source the crosstab query is built from.
    pub fn db(&mut self, source: Q) -> &mut Self {
        self.source = Some(source);
        self
    }

    /// Replaces the slot sequence. An empty sequence restores `a`..`d`.
    /// Takes effect on the next `axis` call.
    pub fn allowed_axes<S: Into<AxisKey>>(&mut self, keys: impl IntoIterator<Item = S>) -> &mut Self {
        let keys: Vec<AxisKey> = keys.into_iter().map(Into::into).collect();
        self.allowed_axes = if keys.is_empty() { default_axis_keys() } else { keys };
        self
    }

    /// Merges definitions into the registry.
    pub fn config(&mut self, config: CrosstabConfig) -> &mut Self {
        self.config.merge(config);
        self
    }

    /// Selects the grouping dimensions, replacing any earlier selection.
    /// Fires each selected axis' hook, and drops results cached for the
    /// previous selection.
    pub fn axis<S: AsRef<str>>(&mut self, groups: &[S]) -> &mut Self {
        self.selection = AxisSelection::select(groups, &self.allowed_axes, &self.config);
        self.result = None;
        self.formatter.clear();
        self.table_matrix = TableMatrix::default();
        self
    }

    pub fn hook(&mut self, hook: Hook) -> &mut Self {
        self.hooks.register(hook);
        self
    }

    /// Adds `SUM(column)` as the `cross_sum` metric.
    pub fn sum(&mut self, column: impl Into<String>) -> &mut Self {
        self.metrics.sum = Some(column.into());
        self
    }

    /// Adds `AVG(column)` as the `cross_avg` metric.
    pub fn avg(&mut self, column: impl Into<String>) -> &mut Self {
        self.metrics.avg = Some(column.into());
        self
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// The assembled crosstab query, not yet executed.
    pub fn query(&self) -> Result<Q> {
        self.ensure_configured()?;
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| CrosstabError::Configuration("no data source set".to_string()))?;

        let mut query = source.clone();
        assemble(&mut query, &self.selection, &self.hooks, &self.metrics)?;
        Ok(query)
    }

    /// Executes the crosstab query and caches rows and headers.
    pub fn get(&mut self) -> Result<&ResultSet> {
        let mut query = self.query()?;
        let rows = query.get()?;
        let result = ResultSet::from_rows(&rows, &self.selection);

        log_info!(
            CAT_CROSSTAB,
            "fetched {} rows over {} axes",
            result.rows.len(),
            self.selection.len()
        );
        Ok(self.result.insert(result))
    }

    /// Builds the table matrix for `mode` from the cached result, fetching
    /// first if nothing has been fetched. Replaces the previous matrix.
    pub fn build_table_matrix(&mut self, mode: AggregationMode) -> Result<&TableMatrix> {
        self.ensure_configured()?;
        if self.result.is_none() {
            self.get()?;
        }

        let matrix = match &self.result {
            Some(result) => engine::build_table_matrix(&self.selection, result, &mut self.formatter, mode),
            None => TableMatrix::empty(mode),
        };
        log_info!(
            CAT_CROSSTAB,
            "table matrix ({}) has {} rows and {} columns",
            mode,
            matrix.rows.len(),
            matrix.column_count()
        );
        self.table_matrix = matrix;
        Ok(&self.table_matrix)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.is_empty() {
            return Err(CrosstabError::Configuration("no axis configuration loaded".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// The last built matrix (empty before the first build).
    pub fn table_matrix(&self) -> &TableMatrix {
        &self.table_matrix
    }

    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Headers of the cached result, if any.
    pub fn headers(&self) -> Option<&HeaderSet> {
        self.result.as_ref().map(|r| &r.headers)
    }

    pub fn selected_axes(&self) -> &[SelectedAxis] {
        self.selection.as_slice()
    }

    pub fn number_of_axes(&self) -> usize {
        self.selection.len()
    }

    pub fn is_single_dimension(&self) -> bool {
        self.selection.len() == 1
    }

    pub fn source(&self) -> Option<&Q> {
        self.source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AxisDefinition;
    use sql_query::{Query, Row, StaticExecutor};

    type TestCrosstab = Crosstab<Query<StaticExecutor>>;

    fn source(rows: Vec<Row>) -> (Query<StaticExecutor>, StaticExecutor) {
        let executor = StaticExecutor::new(rows);
        (Query::new("tickets", executor.clone()), executor)
    }

    fn config() -> CrosstabConfig {
        CrosstabConfig::new().define("status", &["a", "b"], AxisDefinition::new("tickets.status"))
    }

    #[test]
    fn missing_config_is_reported() {
        let (query, _) = source(Vec::new());
        let mut crosstab = TestCrosstab::with_source(query);

        assert!(matches!(crosstab.query(), Err(CrosstabError::Configuration(_))));
        assert!(matches!(
            crosstab.build_table_matrix(AggregationMode::Count),
            Err(CrosstabError::Configuration(_))
        ));
    }

    #[test]
    fn missing_source_is_reported() {
        let mut crosstab = TestCrosstab::new();
        crosstab.config(config()).axis(&["status"]);

        assert!(matches!(crosstab.get(), Err(CrosstabError::Configuration(_))));
    }

    #[test]
    fn source_is_left_untouched() {
        let (query, _) = source(Vec::new());
        let mut crosstab = TestCrosstab::with_source(query);
        crosstab.config(config()).axis(&["status"]);

        let first = crosstab.query().unwrap().to_sql();
        let second = crosstab.query().unwrap().to_sql();

        assert_eq!(first, second);
        assert!(crosstab.source().unwrap().statement().columns.is_empty());
    }

    #[test]
    fn build_fetches_once_and_reuses_cache() {
        let (query, executor) = source(vec![
            Row::new().with("a_id", "open").with("cross_count", 3),
            Row::new().with("a_id", "closed").with("cross_count", 7),
        ]);
        let mut crosstab = TestCrosstab::with_source(query);
        crosstab.config(config()).axis(&["status"]);

        crosstab.build_table_matrix(AggregationMode::Count).unwrap();
        crosstab.build_table_matrix(AggregationMode::Count).unwrap();

        assert_eq!(executor.execution_count(), 1);
        assert!(crosstab.is_single_dimension());
        assert_eq!(crosstab.table_matrix().footer().unwrap().values, vec![Some(10.0)]);
    }

    #[test]
    fn reselecting_replaces_selection_and_cache() {
        let (query, _) = source(vec![Row::new().with("a_id", "open").with("cross_count", 1)]);
        let mut crosstab = TestCrosstab::with_source(query);
        crosstab
            .config(config().define("queue", &["a", "b"], AxisDefinition::new("tickets.queue")))
            .axis(&["status", "queue"]);
        assert_eq!(crosstab.number_of_axes(), 2);
        crosstab.get().unwrap();

        crosstab.axis(&["queue"]);

        assert_eq!(crosstab.number_of_axes(), 1);
        assert_eq!(crosstab.selected_axes()[0].group, "queue");
        assert!(crosstab.result().is_none());
    }

    #[test]
    fn empty_allowed_axes_restore_defaults() {
        let mut crosstab = TestCrosstab::new();
        crosstab.allowed_axes(["x"]);
        crosstab.allowed_axes(Vec::<String>::new());
        crosstab.config(config()).axis(&["status"]);

        assert_eq!(crosstab.selected_axes()[0].key, "a");
    }
}
