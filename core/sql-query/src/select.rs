//! FILENAME: core/sql-query/src/select.rs
//! PURPOSE: Statement state for a grouped SELECT and its SQL rendering.
//! CONTEXT: The crosstab engine never writes SQL text itself. It pushes
//! columns, GROUP BY, ORDER BY and JOIN instructions into a `Select` (through
//! the `QueryBuilder` trait) and the executor turns the result into a query.

use serde::{Deserialize, Serialize};

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// A column reference or a raw SQL fragment passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Raw(String),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    pub fn to_sql(&self) -> &str {
        match self {
            Expr::Column(name) => name,
            Expr::Raw(sql) => sql,
        }
    }
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn new(expr: Expr) -> Self {
        SelectColumn { expr, alias: None }
    }

    /// `<sql> AS <alias>`
    pub fn raw_as(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectColumn {
            expr: Expr::raw(sql),
            alias: Some(alias.into()),
        }
    }

    /// Name the column is visible under in fetched rows.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.expr.to_sql())
    }

    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.expr.to_sql(), alias),
            None => self.expr.to_sql().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: Direction,
}

impl OrderBy {
    pub fn to_sql(&self) -> String {
        match (&self.expr, self.direction) {
            // Raw fragments carry their own direction, if any
            (Expr::Raw(sql), _) => sql.clone(),
            (Expr::Column(name), Direction::Asc) => format!("{} ASC", name),
            (Expr::Column(name), Direction::Desc) => format!("{} DESC", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: String,
}

impl Join {
    pub fn inner(table: impl Into<String>, on: impl Into<String>) -> Self {
        Join { kind: JoinKind::Inner, table: table.into(), on: on.into() }
    }

    pub fn left(table: impl Into<String>, on: impl Into<String>) -> Self {
        Join { kind: JoinKind::Left, table: table.into(), on: on.into() }
    }

    pub fn to_sql(&self) -> String {
        let keyword = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        };
        format!("{} {} ON {}", keyword, self.table, self.on)
    }
}

// ============================================================================
// SELECT STATEMENT
// ============================================================================

/// Accumulated state of a grouped SELECT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub table: Option<String>,
    pub columns: Vec<SelectColumn>,
    pub joins: Vec<Join>,
    pub conditions: Vec<String>,
    pub groups: Vec<Expr>,
    pub orders: Vec<OrderBy>,
}

impl Select {
    pub fn new() -> Self {
        Select::default()
    }

    pub fn from_table(table: impl Into<String>) -> Self {
        Select {
            table: Some(table.into()),
            ..Select::default()
        }
    }

    /// Renders the statement. Conditions are AND-ed together.
    pub fn to_sql(&self) -> Option<String> {
        let table = self.table.as_ref()?;

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(SelectColumn::to_sql)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", columns, table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.groups.is_empty() {
            let groups: Vec<&str> = self.groups.iter().map(Expr::to_sql).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }
        if !self.orders.is_empty() {
            let orders: Vec<String> = self.orders.iter().map(OrderBy::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        Some(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_grouped_select() {
        let mut select = Select::from_table("circulation");
        select.columns.push(SelectColumn::raw_as("branch.name", "a_id"));
        select.columns.push(SelectColumn::raw_as("COUNT(1)", "cross_count"));
        select.joins.push(Join::left("branch", "branch.id = circulation.branch_id"));
        select.conditions.push("year = 2024".to_string());
        select.groups.push(Expr::column("a_id"));
        select.orders.push(OrderBy { expr: Expr::column("a_id"), direction: Direction::Asc });

        assert_eq!(
            select.to_sql().as_deref(),
            Some(
                "SELECT branch.name AS a_id, COUNT(1) AS cross_count FROM circulation \
                 LEFT JOIN branch ON branch.id = circulation.branch_id \
                 WHERE year = 2024 GROUP BY a_id ORDER BY a_id ASC"
            )
        );
    }

    #[test]
    fn raw_order_keeps_its_own_direction() {
        let order = OrderBy { expr: Expr::raw("FIELD(a_id, 3, 1, 2)"), direction: Direction::Desc };
        assert_eq!(order.to_sql(), "FIELD(a_id, 3, 1, 2)");
    }

    #[test]
    fn no_table_renders_nothing() {
        assert!(Select::new().to_sql().is_none());
    }

    #[test]
    fn output_name_prefers_alias() {
        assert_eq!(SelectColumn::raw_as("SUM(x)", "cross_sum").output_name(), "cross_sum");
        assert_eq!(SelectColumn::new(Expr::column("x")).output_name(), "x");
    }
}
