//! FILENAME: core/crosstab-engine/src/hooks.rs
//! Typed extension points.
//!
//! Each extension point is an ordered list of function values. An unset hook
//! is simply an absent entry; nothing is checked for callability at runtime.
//! Hooks run synchronously, inline, in registration order.

use std::fmt;
use std::rc::Rc;

use sql_query::{QueryBuilder, SelectColumn};

// ============================================================================
// CALLBACK WRAPPER
// ============================================================================

/// Shared, cloneable function value. Opaque in `Debug` output.
pub struct Callback<F: ?Sized>(Rc<F>);

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Callback(Rc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Turns a display label into the header text shown in the table.
pub type HeaderFormat = Callback<dyn Fn(&str) -> String>;

/// Adds the joins an axis needs to the query.
pub type JoinCallback = Callback<dyn Fn(&mut dyn QueryBuilder)>;

/// Side effect run as soon as an axis is selected.
pub type SelectHook = Callback<dyn Fn()>;

/// `before-query`: may mutate the query object (filters, joins, ...).
pub type BeforeQuery = Callback<dyn Fn(&mut dyn QueryBuilder)>;

/// `before-columns`: may mutate the column list before axis columns are added.
pub type BeforeColumns = Callback<dyn Fn(&mut Vec<SelectColumn>)>;

impl Callback<dyn Fn(&str) -> String> {
    pub fn new(f: impl Fn(&str) -> String + 'static) -> Self {
        Callback(Rc::new(f))
    }

    pub fn apply(&self, label: &str) -> String {
        (self.0)(label)
    }
}

impl Callback<dyn Fn(&mut dyn QueryBuilder)> {
    pub fn new(f: impl Fn(&mut dyn QueryBuilder) + 'static) -> Self {
        Callback(Rc::new(f))
    }

    pub fn apply(&self, query: &mut dyn QueryBuilder) {
        (self.0)(query)
    }
}

impl Callback<dyn Fn()> {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Callback(Rc::new(f))
    }

    pub fn apply(&self) {
        (self.0)()
    }
}

impl Callback<dyn Fn(&mut Vec<SelectColumn>)> {
    pub fn new(f: impl Fn(&mut Vec<SelectColumn>) + 'static) -> Self {
        Callback(Rc::new(f))
    }

    pub fn apply(&self, columns: &mut Vec<SelectColumn>) {
        (self.0)(columns)
    }
}

// ============================================================================
// NAMED HOOKS
// ============================================================================

/// Named extension points that run while the query is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    BeforeQuery,
    BeforeColumns,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeQuery => "before-query",
            HookPoint::BeforeColumns => "before-columns",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Hook {
    BeforeQuery(BeforeQuery),
    BeforeColumns(BeforeColumns),
}

impl Hook {
    pub fn before_query(f: impl Fn(&mut dyn QueryBuilder) + 'static) -> Self {
        Hook::BeforeQuery(BeforeQuery::new(f))
    }

    pub fn before_columns(f: impl Fn(&mut Vec<SelectColumn>) + 'static) -> Self {
        Hook::BeforeColumns(BeforeColumns::new(f))
    }

    pub fn point(&self) -> HookPoint {
        match self {
            Hook::BeforeQuery(_) => HookPoint::BeforeQuery,
            Hook::BeforeColumns(_) => HookPoint::BeforeColumns,
        }
    }
}

/// Registered hooks, kept per extension point in registration order.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    before_query: Vec<BeforeQuery>,
    before_columns: Vec<BeforeColumns>,
}

impl HookRegistry {
    pub fn new() -> Self {
        HookRegistry::default()
    }

    pub fn register(&mut self, hook: Hook) {
        match hook {
            Hook::BeforeQuery(f) => self.before_query.push(f),
            Hook::BeforeColumns(f) => self.before_columns.push(f),
        }
    }

    pub fn len(&self, point: HookPoint) -> usize {
        match point {
            HookPoint::BeforeQuery => self.before_query.len(),
            HookPoint::BeforeColumns => self.before_columns.len(),
        }
    }

    /// Runs every `before-query` hook. Returns false if none are registered.
    pub fn run_before_query(&self, query: &mut dyn QueryBuilder) -> bool {
        for hook in &self.before_query {
            hook.apply(query);
        }
        !self.before_query.is_empty()
    }

    /// Runs every `before-columns` hook. Returns false if none are registered.
    pub fn run_before_columns(&self, columns: &mut Vec<SelectColumn>) -> bool {
        for hook in &self.before_columns {
            hook.apply(columns);
        }
        !self.before_columns.is_empty()
    }
}
