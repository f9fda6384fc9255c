use std::collections::{HashMap, HashSet};

use crate::collection::Collection;
use crate::database::Database;
use crate::value::{Value, ValueType};

/// Name of the loop variable bound by `foreach` and `filter`.
pub const VALUE_ROOT: &str = "value";

/// A root variable binding: a scalar, an ordered sequence, or a set.
///
/// Paths wrap whichever shape is bound into a collection uniformly, using
/// the value type declared for the root.
#[derive(Debug, Clone, PartialEq)]
pub enum RootValue {
    Single(Value),
    List(Vec<Value>),
    Set(HashSet<Value>),
}

impl RootValue {
    pub(crate) fn to_collection(&self, value_type: ValueType) -> Collection {
        match self {
            RootValue::Single(v) => Collection::singleton(v.clone(), value_type),
            RootValue::List(values) => Collection::from_values(values.clone(), value_type),
            RootValue::Set(set) => Collection::from_set(set.clone(), value_type),
        }
    }
}

/// Everything an evaluation needs: the root variable bindings, their
/// declared value types, the default root name, and the database.
///
/// Contexts are extended immutably: a control that needs to bind the loop
/// variable calls [`EvalContext::with_root`] and evaluates the body
/// against the returned child context. The parent context is never
/// touched, so nested and reentrant `foreach`/`filter` evaluation needs
/// no save/restore discipline. Each concurrently running query should use
/// its own context; the database only needs to support shared reads.
#[derive(Clone)]
pub struct EvalContext<'db> {
    roots: HashMap<String, RootValue>,
    root_value_types: HashMap<String, ValueType>,
    default_root_name: String,
    database: &'db dyn Database,
}

impl<'db> EvalContext<'db> {
    pub fn new(
        roots: HashMap<String, RootValue>,
        root_value_types: HashMap<String, ValueType>,
        default_root_name: impl Into<String>,
        database: &'db dyn Database,
    ) -> Self {
        EvalContext {
            roots,
            root_value_types,
            default_root_name: default_root_name.into(),
            database,
        }
    }

    /// A context with a single root binding, which is also the default.
    pub fn with_single_root(
        name: impl Into<String>,
        root: RootValue,
        value_type: ValueType,
        database: &'db dyn Database,
    ) -> Self {
        let name = name.into();
        let mut roots = HashMap::new();
        roots.insert(name.clone(), root);
        let mut root_value_types = HashMap::new();
        root_value_types.insert(name.clone(), value_type);
        EvalContext {
            roots,
            root_value_types,
            default_root_name: name,
            database,
        }
    }

    pub fn root(&self, name: &str) -> Option<&RootValue> {
        self.roots.get(name)
    }

    /// The declared value type for a root; unknown roots read as "text".
    pub fn root_value_type(&self, name: &str) -> ValueType {
        self.root_value_types
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    pub fn default_root_name(&self) -> &str {
        &self.default_root_name
    }

    pub fn database(&self) -> &'db dyn Database {
        self.database
    }

    /// A child context with one root rebound. The receiver is unchanged.
    pub fn with_root(&self, name: &str, root: RootValue, value_type: ValueType) -> Self {
        let mut child = self.clone();
        child.roots.insert(name.to_string(), root);
        child
            .root_value_types
            .insert(name.to_string(), value_type);
        child
    }

    /// A child context with the `value` loop variable bound.
    pub(crate) fn with_value(&self, value: Value, value_type: ValueType) -> Self {
        self.with_root(VALUE_ROOT, RootValue::Single(value), value_type)
    }
}
