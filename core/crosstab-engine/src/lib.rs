//! FILENAME: core/crosstab-engine/src/lib.rs
//! Crosstab (pivot) subsystem.
//!
//! Builds a grouped aggregate query over up to four axes, executes it once,
//! and reshapes the flat result into a table matrix of headers, rows and
//! totals. It depends on `sql-query` only for the query-object contract.
//!
//! Layers:
//! - `definition`: Serializable configuration (what an axis IS)
//! - `selection` / `query`: Which axes are used and the query they produce
//! - `cache`: Fetched rows and header sets (what we computed FROM)
//! - `fold` / `engine`: Tree folding and linearization (HOW we calculate)
//! - `view`: Renderable output (WHAT we display)
//! - `crosstab`: The facade tying the layers together

#[macro_use]
mod logging;

pub mod definition;
pub mod error;
pub mod hooks;
pub mod selection;
pub mod query;
pub mod cache;
pub mod fold;
pub mod view;
pub mod engine;
pub mod crosstab;

pub use definition::*;
pub use error::{CrosstabError, Result};
pub use hooks::{Hook, HookPoint, HookRegistry};
pub use selection::{AxisSelection, SelectedAxis};
pub use query::{assemble, is_group_by_aggregate, MetricTargets, AGGREGATE_KEYWORDS};
pub use cache::*;
pub use fold::{FoldNode, FoldedTree};
pub use view::*;
pub use engine::{build_table_matrix, calculate_colspans, calculate_header_frequencies, HeaderFormatter};
pub use crosstab::Crosstab;
pub use logging::{CAT_CROSSTAB, CAT_FOLD, CAT_QUERY};
