use std::collections::{HashMap, HashSet};

use crate::collection::Collection;
use crate::value::{Value, ValueType};

/// A declared database property: what a forward hop over it yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub id: String,
    pub value_type: ValueType,
}

/// The graph database collaborator consumed by [`crate::path::Path`].
///
/// The engine only reads: per-value object/subject lookups for array-mode
/// hops, bulk union lookups (with an optional filter set) for everything
/// else, an indexed range scan, and the property table that supplies
/// result value types. Implementations must tolerate unknown properties
/// by returning empty results and `None` from [`Database::get_property`];
/// the engine then degrades the value type to "text".
pub trait Database {
    /// All objects of triples `subject --property--> object`.
    fn get_objects(&self, subject: &Value, property: &str) -> Collection;

    /// All subjects of triples `subject --property--> object`.
    fn get_subjects(&self, object: &Value, property: &str) -> Collection;

    /// Union of `get_objects` over a set of subjects, optionally keeping
    /// only objects present in `filter`.
    fn get_objects_union(
        &self,
        subjects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value>;

    /// Union of `get_subjects` over a set of objects, optionally keeping
    /// only subjects present in `filter`.
    fn get_subjects_union(
        &self,
        objects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value>;

    /// Fill `out` with subjects whose value for `property` falls within
    /// `[from, to)`, or `[from, to]` when `inclusive`.
    fn get_subjects_in_range(
        &self,
        property: &str,
        from: f64,
        to: f64,
        inclusive: bool,
        out: &mut HashSet<Value>,
        filter: Option<&HashSet<Value>>,
    );

    fn get_property(&self, property: &str) -> Option<&Property>;
}

/// A small in-memory triple store, mainly for fixtures and embedding.
///
/// Statements are double-indexed subject→property→objects and
/// object→property→subjects so both traversal directions are cheap. Range
/// scans run over the forward index comparing numeric keys (numbers
/// directly, dates by timestamp, text by float-prefix parse).
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    spo: HashMap<Value, HashMap<String, Vec<Value>>>,
    ops: HashMap<Value, HashMap<String, Vec<Value>>>,
    properties: HashMap<String, Property>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property's value type. Undeclared properties still
    /// traverse; they just report no type.
    pub fn define_property(&mut self, id: impl Into<String>, value_type: ValueType) {
        let id = id.into();
        self.properties.insert(
            id.clone(),
            Property {
                id,
                value_type,
            },
        );
    }

    /// Add one `subject --property--> object` statement.
    pub fn add_statement(&mut self, subject: Value, property: impl Into<String>, object: Value) {
        let property = property.into();
        self.spo
            .entry(subject.clone())
            .or_default()
            .entry(property.clone())
            .or_default()
            .push(object.clone());
        self.ops
            .entry(object)
            .or_default()
            .entry(property)
            .or_default()
            .push(subject);
    }

    pub fn statement_count(&self) -> usize {
        self.spo
            .values()
            .flat_map(|props| props.values())
            .map(|objects| objects.len())
            .sum()
    }

    fn lookup(
        index: &HashMap<Value, HashMap<String, Vec<Value>>>,
        x: &Value,
        property: &str,
    ) -> HashSet<Value> {
        index
            .get(x)
            .and_then(|props| props.get(property))
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lookup_union(
        index: &HashMap<Value, HashMap<String, Vec<Value>>>,
        xs: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value> {
        let mut out = HashSet::new();
        for x in xs {
            if let Some(values) = index.get(x).and_then(|props| props.get(property)) {
                for v in values {
                    if filter.is_none_or(|f| f.contains(v)) {
                        out.insert(v.clone());
                    }
                }
            }
        }
        out
    }

    fn range_key(value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Date(_) => value.date_millis(),
            _ => value.to_number(),
        }
    }
}

impl Database for MemoryDatabase {
    fn get_objects(&self, subject: &Value, property: &str) -> Collection {
        let value_type = self
            .get_property(property)
            .map(|p| p.value_type)
            .unwrap_or_default();
        Collection::from_set(Self::lookup(&self.spo, subject, property), value_type)
    }

    fn get_subjects(&self, object: &Value, property: &str) -> Collection {
        Collection::from_set(Self::lookup(&self.ops, object, property), ValueType::Item)
    }

    fn get_objects_union(
        &self,
        subjects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value> {
        Self::lookup_union(&self.spo, subjects, property, filter)
    }

    fn get_subjects_union(
        &self,
        objects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value> {
        Self::lookup_union(&self.ops, objects, property, filter)
    }

    fn get_subjects_in_range(
        &self,
        property: &str,
        from: f64,
        to: f64,
        inclusive: bool,
        out: &mut HashSet<Value>,
        filter: Option<&HashSet<Value>>,
    ) {
        for (subject, props) in &self.spo {
            let Some(objects) = props.get(property) else {
                continue;
            };
            for object in objects {
                let key = Self::range_key(object);
                if key >= from && (key < to || (key == to && inclusive)) {
                    if filter.is_none_or(|f| f.contains(subject)) {
                        out.insert(subject.clone());
                    }
                    break;
                }
            }
        }
    }

    fn get_property(&self, property: &str) -> Option<&Property> {
        self.properties.get(property)
    }
}
