//! FILENAME: core/crosstab-engine/src/query.rs
//! Query Assembler - composes the grouped aggregate query.
//!
//!   SELECT <value> AS a_id, <label> AS a_name, ..., COUNT(1) AS cross_count
//!   FROM <source> JOIN ...
//!   GROUP BY a_id, a_name, ...
//!   ORDER BY ...
//!
//! The assembler only mutates the query object; it never executes it.

use once_cell::sync::Lazy;
use regex::Regex;
use sql_query::{Direction, Expr, QueryBuilder, SelectColumn};

use crate::cache::{id_alias, name_alias};
use crate::definition::{AggregationMode, OrderDirective};
use crate::error::{CrosstabError, Result};
use crate::hooks::{HookPoint, HookRegistry};
use crate::logging::CAT_QUERY;
use crate::selection::AxisSelection;

/// SQL aggregate functions that make an axis expression ungroupable.
pub const AGGREGATE_KEYWORDS: [&str; 16] = [
    "AVG", "BIT_AND", "BIT_OR", "BIT_XOR", "COUNT", "GROUP_CONCAT", "MAX", "MIN", "STD",
    "STDDEV_POP", "STDDEV_SAMP", "STDDEV", "SUM", "VAR_POP", "VAR_SAMP", "VARIANCE",
];

static AGGREGATE_CALL: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)\b(?:{})\s*\(", AGGREGATE_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("aggregate keyword pattern is valid")
});

/// True when the expression calls an aggregate function.
pub fn is_group_by_aggregate(expr: &str) -> bool {
    AGGREGATE_CALL.is_match(expr)
}

/// Optional metric targets beyond the always-present count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTargets {
    pub sum: Option<String>,
    pub avg: Option<String>,
}

/// Mutates `query` into the crosstab's grouped aggregate query.
///
/// Order: `before-query` hooks, `before-columns` hooks, axis columns with
/// grouping and ordering, metric columns, SELECT, axis joins.
pub fn assemble(
    query: &mut dyn QueryBuilder,
    selection: &AxisSelection,
    hooks: &HookRegistry,
    metrics: &MetricTargets,
) -> Result<()> {
    hooks.run_before_query(query);

    let mut columns: Vec<SelectColumn> = Vec::new();
    hooks.run_before_columns(&mut columns);

    for axis in selection.iter() {
        let value = axis.definition.value_expression().ok_or_else(|| {
            CrosstabError::Configuration(format!(
                "axis '{}' (group '{}') has no value expression",
                axis.key, axis.group
            ))
        })?;

        let id = id_alias(&axis.key);
        columns.push(SelectColumn::raw_as(value, id.clone()));

        let name = axis.definition.label_expression().map(|label| {
            let alias = name_alias(&axis.key);
            columns.push(SelectColumn::raw_as(label, alias.clone()));
            alias
        });

        if is_group_by_aggregate(value) {
            continue;
        }
        query.group_by(Expr::column(id.clone()));
        if let Some(name) = &name {
            query.group_by(Expr::column(name.clone()));
        }

        match &axis.definition.order_by {
            Some(OrderDirective::ByValue) => query.order_by(Expr::column(id), Direction::Asc),
            Some(OrderDirective::ByLabel) => {
                let column = name.unwrap_or(id);
                query.order_by(Expr::column(column), Direction::Asc);
            }
            Some(OrderDirective::Raw(sql)) => query.order_by(Expr::raw(sql.clone()), Direction::Asc),
            None => {}
        }
    }

    if let Some(avg) = &metrics.avg {
        columns.push(SelectColumn::raw_as(
            format!("AVG({})", avg),
            AggregationMode::Average.metric_field(),
        ));
    }
    if let Some(sum) = &metrics.sum {
        columns.push(SelectColumn::raw_as(
            format!("SUM({})", sum),
            AggregationMode::Sum.metric_field(),
        ));
    }
    columns.push(SelectColumn::raw_as("COUNT(1)", AggregationMode::Count.metric_field()));

    let column_count = columns.len();
    query.add_select(columns);

    for axis in selection.iter() {
        if let Some(join) = &axis.definition.join {
            join.apply(query);
        }
    }

    log_debug!(
        CAT_QUERY,
        "assembled query: axes={} columns={} {}={} {}={}",
        selection.len(),
        column_count,
        HookPoint::BeforeQuery.as_str(),
        hooks.len(HookPoint::BeforeQuery),
        HookPoint::BeforeColumns.as_str(),
        hooks.len(HookPoint::BeforeColumns)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{default_axis_keys, AxisDefinition, CrosstabConfig};
    use crate::hooks::Hook;
    use sql_query::{Join, Query, StaticExecutor};

    fn query() -> Query<StaticExecutor> {
        Query::new("circulation", StaticExecutor::default())
    }

    fn config() -> CrosstabConfig {
        CrosstabConfig::new()
            .define(
                "branch",
                &["a", "b"],
                AxisDefinition::new("branch.id")
                    .with_name("branch.name")
                    .with_order(OrderDirective::ByLabel)
                    .with_join(|q| q.join(Join::inner("branch", "branch.id = circulation.branch_id"))),
            )
            .define("year", &["a", "b"], AxisDefinition::new("circulation.year").with_order(OrderDirective::ByValue))
            .define("peak", &["a", "b"], AxisDefinition::new("MAX(circulation.loans)").with_order(OrderDirective::ByValue))
    }

    #[test]
    fn aggregate_keywords_match_function_calls_only() {
        assert!(is_group_by_aggregate("SUM(amount)"));
        assert!(is_group_by_aggregate("round(avg (x), 2)"));
        assert!(is_group_by_aggregate("STDDEV_SAMP(x)"));
        assert!(!is_group_by_aggregate("account_id"));
        assert!(!is_group_by_aggregate("summary.count_total"));
    }

    #[test]
    fn assembles_grouped_select_with_joins() {
        let selection = AxisSelection::select(&["year", "branch"], &default_axis_keys(), &config());
        let metrics = MetricTargets { sum: Some("circulation.loans".into()), avg: None };
        let mut q = query();

        assemble(&mut q, &selection, &HookRegistry::new(), &metrics).unwrap();

        assert_eq!(
            q.to_sql().unwrap(),
            "SELECT circulation.year AS a_id, branch.id AS b_id, branch.name AS b_name, \
             SUM(circulation.loans) AS cross_sum, COUNT(1) AS cross_count FROM circulation \
             JOIN branch ON branch.id = circulation.branch_id \
             GROUP BY a_id, b_id, b_name ORDER BY a_id ASC, b_name ASC"
        );
    }

    #[test]
    fn aggregate_axis_is_not_grouped_or_ordered() {
        let selection = AxisSelection::select(&["peak"], &default_axis_keys(), &config());
        let mut q = query();

        assemble(&mut q, &selection, &HookRegistry::new(), &MetricTargets::default()).unwrap();

        assert!(q.statement().groups.is_empty());
        assert!(q.statement().orders.is_empty());
        assert_eq!(q.statement().columns.len(), 2);
    }

    #[test]
    fn hooks_run_before_axis_columns() {
        let mut hooks = HookRegistry::new();
        hooks.register(Hook::before_query(|q| q.where_raw("circulation.year >= 2020")));
        hooks.register(Hook::before_columns(|columns| {
            assert!(columns.is_empty());
            columns.push(SelectColumn::raw_as("MIN(circulation.day)", "first_day"));
        }));
        let selection = AxisSelection::select(&["year"], &default_axis_keys(), &config());
        let mut q = query();

        assemble(&mut q, &selection, &hooks, &MetricTargets::default()).unwrap();

        let names: Vec<&str> = q.statement().columns.iter().map(|c| c.output_name()).collect();
        assert_eq!(names, vec!["first_day", "a_id", "cross_count"]);
        assert_eq!(q.statement().conditions, vec!["circulation.year >= 2020".to_string()]);
    }

    #[test]
    fn missing_value_expression_is_a_configuration_error() {
        let config = CrosstabConfig::new().define("broken", &["a"], AxisDefinition::default());
        let selection = AxisSelection::select(&["broken"], &default_axis_keys(), &config);

        let err = assemble(&mut query(), &selection, &HookRegistry::new(), &MetricTargets::default())
            .unwrap_err();
        assert!(matches!(err, CrosstabError::Configuration(_)));
    }

    #[test]
    fn average_column_precedes_sum() {
        let selection = AxisSelection::select(&["year"], &default_axis_keys(), &config());
        let metrics = MetricTargets { sum: Some("loans".into()), avg: Some("loans".into()) };
        let mut q = query();

        assemble(&mut q, &selection, &HookRegistry::new(), &metrics).unwrap();

        let names: Vec<&str> = q.statement().columns.iter().map(|c| c.output_name()).collect();
        assert_eq!(names, vec!["a_id", "cross_avg", "cross_sum", "cross_count"]);
    }
}
