//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for crosstab integration tests.

use crosstab_engine::{AxisDefinition, Crosstab, CrosstabConfig, OrderDirective, TableMatrix};
use sql_query::{Join, Query, Row, StaticExecutor};

pub type SalesCrosstab = Crosstab<Query<StaticExecutor>>;

pub const SLOTS: [&str; 4] = ["a", "b", "c", "d"];

/// Test harness: a crosstab wired to a static executor.
pub struct TestHarness {
    pub executor: StaticExecutor,
    pub crosstab: SalesCrosstab,
}

impl TestHarness {
    /// Harness serving `rows`, with the sales configuration loaded.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        let executor = StaticExecutor::new(rows);
        let mut crosstab = SalesCrosstab::with_source(Query::new("sales", executor.clone()));
        crosstab.config(SalesFixture::config());
        TestHarness { executor, crosstab }
    }

    /// Harness serving the fixture grouped by `groups`, with those axes
    /// selected and sum/avg targets set.
    pub fn with_sales(groups: &[&str]) -> Self {
        let mut harness = Self::with_rows(SalesFixture::grouped(groups));
        harness.crosstab.axis(groups).sum("sales.amount").avg("sales.amount");
        harness
    }
}

/// Small sales table: (region, quarter, product, channel, amount).
pub struct SalesFixture;

impl SalesFixture {
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, &'static str, f64)> {
        vec![
            ("North", "Q1", "Book", "Online", 10.0),
            ("North", "Q1", "DVD", "Store", 20.0),
            ("North", "Q2", "Book", "Store", 30.0),
            ("South", "Q1", "Book", "Online", 40.0),
            ("South", "Q2", "DVD", "Online", 50.0),
            ("South", "Q2", "DVD", "Store", 60.0),
            ("East", "Q2", "Book", "Online", 70.0),
            ("East", "Q1", "DVD", "Store", 80.0),
        ]
    }

    pub fn config() -> CrosstabConfig {
        CrosstabConfig::new()
            .define("region", &SLOTS, AxisDefinition::new("sales.region").with_title("Region"))
            .define(
                "quarter",
                &SLOTS,
                AxisDefinition::new("sales.quarter").with_order(OrderDirective::ByValue),
            )
            .define(
                "product",
                &SLOTS,
                AxisDefinition::new("sales.product_id")
                    .with_name("products.title")
                    .with_order(OrderDirective::ByLabel)
                    .with_join(|q| q.join(Join::left("products", "products.id = sales.product_id"))),
            )
            .define("channel", &SLOTS, AxisDefinition::new("sales.channel"))
    }

    /// What the database would return for the crosstab query over `groups`:
    /// one row per combination, in first-seen order.
    pub fn grouped(groups: &[&str]) -> Vec<Row> {
        let mut combos: Vec<(Vec<&'static str>, Vec<f64>)> = Vec::new();
        for record in Self::data() {
            let key: Vec<&'static str> = groups.iter().map(|g| Self::field(&record, g)).collect();
            match combos.iter_mut().find(|(k, _)| *k == key) {
                Some((_, amounts)) => amounts.push(record.4),
                None => combos.push((key, vec![record.4])),
            }
        }

        combos
            .into_iter()
            .map(|(key, amounts)| {
                let sum: f64 = amounts.iter().sum();
                let mut row = Row::new();
                for (slot, value) in SLOTS.iter().zip(key) {
                    row.set(format!("{}_id", slot), value);
                }
                row.with("cross_avg", sum / amounts.len() as f64)
                    .with("cross_sum", sum)
                    .with("cross_count", amounts.len() as i64)
            })
            .collect()
    }

    fn field(
        record: &(&'static str, &'static str, &'static str, &'static str, f64),
        group: &str,
    ) -> &'static str {
        match group {
            "region" => record.0,
            "quarter" => record.1,
            "product" => record.2,
            "channel" => record.3,
            other => panic!("no fixture field for group '{}'", other),
        }
    }
}

/// Row label -> value at each column position, using the innermost column
/// header labels as column names. Independent of header order.
pub fn cells_by_label(matrix: &TableMatrix) -> Vec<(String, String, Option<f64>)> {
    let columns: Vec<String> = match matrix.headers.last() {
        Some(header) => header.cells.iter().map(|c| c.label.clone()).collect(),
        None => vec![String::new()],
    };
    let mut cells: Vec<(String, String, Option<f64>)> = matrix
        .rows
        .iter()
        .flat_map(|row| {
            columns
                .iter()
                .zip(row.values.iter())
                .map(move |(column, value)| (row.label.clone(), column.clone(), *value))
        })
        .collect();
    cells.sort_by(|x, y| (&x.0, &x.1).cmp(&(&y.0, &y.1)));
    cells
}
