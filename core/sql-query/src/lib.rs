//! FILENAME: core/sql-query/src/lib.rs
//! Grouped query contract for the crosstab engine.
//!
//! The crosstab never generates SQL on its own; it only pushes column,
//! grouping, ordering and join instructions into a query object and asks it
//! to execute. This crate defines that contract and a small concrete
//! implementation.
//!
//! Layers:
//! - `value` / `row`: what an executed query hands back
//! - `select`: statement state and SQL rendering
//! - `builder`: the `QueryBuilder` / `Executor` traits and `Query`

pub mod builder;
pub mod error;
pub mod row;
pub mod select;
pub mod value;

pub use builder::{Executor, Query, QueryBuilder, StaticExecutor};
pub use error::QueryError;
pub use row::Row;
pub use select::{Direction, Expr, Join, JoinKind, OrderBy, Select, SelectColumn};
pub use value::Value;
