//! FILENAME: core/sql-query/src/builder.rs
//! PURPOSE: The query-object contract and a concrete executor-backed query.
//! CONTEXT: `QueryBuilder` is object safe so hooks and join callbacks can
//! receive `&mut dyn QueryBuilder` without knowing the backend.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::QueryError;
use crate::row::Row;
use crate::select::{Direction, Expr, Join, OrderBy, Select, SelectColumn};

// ============================================================================
// CONTRACT
// ============================================================================

/// Mutable query state plus an execute-and-fetch-all operation.
pub trait QueryBuilder {
    /// Appends columns to the SELECT list.
    fn add_select(&mut self, columns: Vec<SelectColumn>);

    fn group_by(&mut self, expr: Expr);

    fn order_by(&mut self, expr: Expr, direction: Direction);

    fn join(&mut self, join: Join);

    /// Adds a raw WHERE condition (AND-ed with existing ones).
    fn where_raw(&mut self, condition: &str);

    /// Read-only view of the accumulated statement.
    fn statement(&self) -> &Select;

    /// Executes the statement and returns every row in result order.
    fn get(&mut self) -> Result<Vec<Row>, QueryError>;
}

/// Runs a finished statement against a data store.
pub trait Executor {
    fn fetch_all(&mut self, select: &Select) -> Result<Vec<Row>, QueryError>;
}

// ============================================================================
// EXECUTOR-BACKED QUERY
// ============================================================================

/// A `Select` paired with the executor that will run it.
#[derive(Debug, Clone)]
pub struct Query<E> {
    select: Select,
    executor: E,
}

impl<E: Executor> Query<E> {
    pub fn new(table: impl Into<String>, executor: E) -> Self {
        Query {
            select: Select::from_table(table),
            executor,
        }
    }

    pub fn to_sql(&self) -> Option<String> {
        self.select.to_sql()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: Executor> QueryBuilder for Query<E> {
    fn add_select(&mut self, columns: Vec<SelectColumn>) {
        self.select.columns.extend(columns);
    }

    fn group_by(&mut self, expr: Expr) {
        self.select.groups.push(expr);
    }

    fn order_by(&mut self, expr: Expr, direction: Direction) {
        self.select.orders.push(OrderBy { expr, direction });
    }

    fn join(&mut self, join: Join) {
        self.select.joins.push(join);
    }

    fn where_raw(&mut self, condition: &str) {
        self.select.conditions.push(condition.to_string());
    }

    fn statement(&self) -> &Select {
        &self.select
    }

    fn get(&mut self) -> Result<Vec<Row>, QueryError> {
        if self.select.table.is_none() {
            return Err(QueryError::MissingTable);
        }
        self.executor.fetch_all(&self.select)
    }
}

// ============================================================================
// STATIC EXECUTOR
// ============================================================================

/// Serves a fixed result set and records every statement it was asked to run.
/// Clones share the recorded statement log.
#[derive(Debug, Clone, Default)]
pub struct StaticExecutor {
    rows: Rc<Vec<Row>>,
    executed: Rc<RefCell<Vec<String>>>,
}

impl StaticExecutor {
    pub fn new(rows: Vec<Row>) -> Self {
        StaticExecutor {
            rows: Rc::new(rows),
            executed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// SQL of every executed statement, oldest first.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executed.borrow().len()
    }
}

impl Executor for StaticExecutor {
    fn fetch_all(&mut self, select: &Select) -> Result<Vec<Row>, QueryError> {
        let sql = select.to_sql().ok_or(QueryError::MissingTable)?;
        self.executed.borrow_mut().push(sql);
        Ok(self.rows.as_ref().clone())
    }
}
