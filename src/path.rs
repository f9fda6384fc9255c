use std::collections::HashSet;

use log::trace;

use crate::collection::Collection;
use crate::context::EvalContext;
use crate::database::Database;
use crate::error::EvalError;
use crate::value::{Value, ValueType};

/// One hop of a graph path.
///
/// `forward` walks subject→object, backward walks object→subject.
/// `is_array` forces the hop to run once per incoming value instead of as
/// one bulk union, preserving duplicates and positional order; required
/// when a later stage depends on positional correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub property: String,
    pub forward: bool,
    pub is_array: bool,
}

/// Result of a backward range scan: the surviving values after walking
/// every remaining hop in reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeResult {
    pub value_type: ValueType,
    pub values: HashSet<Value>,
    pub count: usize,
}

/// An ordered list of graph hops with an optional root-variable override.
///
/// Built once, programmatically or by the parser, and immutable during
/// evaluation; the same path can be evaluated against many contexts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    root_name: Option<String>,
    segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-hop path over `property`.
    pub fn from_property(property: impl Into<String>, forward: bool) -> Self {
        let mut path = Path::new();
        path.append_segment(property, forward, false);
        path
    }

    pub fn set_root_name(&mut self, name: impl Into<String>) {
        self.root_name = Some(name.into());
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    pub fn append_segment(&mut self, property: impl Into<String>, forward: bool, is_array: bool) {
        self.segments.push(Segment {
            property: property.into(),
            forward,
            is_array,
        });
    }

    /// Append a hop given its surface operator: `.` or `!`, with a `@`
    /// suffix for array mode.
    pub fn append_hop(&mut self, property: impl Into<String>, hop_operator: &str) {
        self.append_segment(
            property,
            hop_operator.starts_with('.'),
            hop_operator.len() > 1,
        );
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Resolve the root collection from the context and walk every hop
    /// forward. A zero-segment path returns the root collection unchanged.
    pub fn evaluate(&self, ctx: &EvalContext) -> Result<Collection, EvalError> {
        let root_name = self.root_name.as_deref().unwrap_or(ctx.default_root_name());
        let value_type = ctx.root_value_type(root_name);

        let root = ctx
            .root(root_name)
            .ok_or_else(|| EvalError::NoSuchVariable(root_name.to_string()))?;
        let collection = root.to_collection(value_type);

        trace!(
            "path: {} segment(s) from root {:?} ({} values)",
            self.segments.len(),
            root_name,
            collection.size()
        );
        Ok(self.walk_forward_from(collection, ctx.database()))
    }

    /// Whether evaluation yields at least one value.
    pub fn test_exists(&self, ctx: &EvalContext) -> Result<bool, EvalError> {
        Ok(self.evaluate(ctx)?.size() > 0)
    }

    /// Walk the hops forward from an explicit starting collection.
    pub fn walk_forward(&self, start: Collection, database: &dyn Database) -> Collection {
        self.walk_forward_from(start, database)
    }

    /// Walk the hops in reverse from an explicit starting collection,
    /// from known values back toward matching roots.
    pub fn walk_backward(
        &self,
        start: Collection,
        filter: Option<&HashSet<Value>>,
        database: &dyn Database,
    ) -> Collection {
        self.walk_backward_from(start, filter, database)
    }

    /// Walk backward from a single known value.
    pub fn evaluate_backward(
        &self,
        value: Value,
        value_type: ValueType,
        filter: Option<&HashSet<Value>>,
        database: &dyn Database,
    ) -> Collection {
        self.walk_backward_from(Collection::singleton(value, value_type), filter, database)
    }

    /// Seed a result set from an indexed range scan over the last hop's
    /// property, then walk the remaining hops in reverse.
    ///
    /// The last segment must be forward. The range filter is applied by
    /// the scan itself only when it is the sole segment; during the
    /// reverse walk the filter applies only while processing segment 0.
    pub fn range_backward(
        &self,
        from: f64,
        to: f64,
        inclusive: bool,
        filter: Option<&HashSet<Value>>,
        database: &dyn Database,
    ) -> Result<RangeResult, EvalError> {
        let mut set = HashSet::new();
        let mut value_type = ValueType::Item;

        if let Some(last) = self.segments.last() {
            if !last.forward {
                return Err(EvalError::MustBeForward);
            }
            let scan_filter = if self.segments.len() == 1 { filter } else { None };
            database.get_subjects_in_range(&last.property, from, to, inclusive, &mut set, scan_filter);

            for i in (0..self.segments.len() - 1).rev() {
                let segment = &self.segments[i];
                let hop_filter = if i == 0 { filter } else { None };
                if segment.forward {
                    set = database.get_subjects_union(&set, &segment.property, hop_filter);
                    value_type = ValueType::Item;
                } else {
                    set = database.get_objects_union(&set, &segment.property, hop_filter);
                    value_type = property_value_type(database, &segment.property);
                }
            }
        }

        let count = set.len();
        Ok(RangeResult {
            value_type,
            values: set,
            count,
        })
    }

    fn walk_forward_from(&self, start: Collection, database: &dyn Database) -> Collection {
        let mut collection = start;
        for segment in &self.segments {
            collection = if segment.is_array {
                let mut values = Vec::new();
                collection.for_each_value(|v| {
                    let step = if segment.forward {
                        database.get_objects(v, &segment.property)
                    } else {
                        database.get_subjects(v, &segment.property)
                    };
                    values.extend(step.iter().cloned());
                    false
                });
                Collection::from_values(values, hop_value_type(segment, database))
            } else if segment.forward {
                let objects =
                    database.get_objects_union(&collection.to_set(), &segment.property, None);
                Collection::from_set(objects, property_value_type(database, &segment.property))
            } else {
                let subjects =
                    database.get_subjects_union(&collection.to_set(), &segment.property, None);
                Collection::from_set(subjects, ValueType::Item)
            };
        }
        collection
    }

    fn walk_backward_from(
        &self,
        start: Collection,
        filter: Option<&HashSet<Value>>,
        database: &dyn Database,
    ) -> Collection {
        let mut collection = start;
        // The filter applies only while processing segment index 0, the
        // original first hop. This is a positional rule, not "the last hop
        // processed"; the two diverge once array hops are interleaved.
        for (i, segment) in self.segments.iter().enumerate().rev() {
            collection = if segment.is_array {
                let mut values = Vec::new();
                collection.for_each_value(|v| {
                    let step = if segment.forward {
                        database.get_objects(v, &segment.property)
                    } else {
                        database.get_subjects(v, &segment.property)
                    };
                    for v2 in step.iter() {
                        if i > 0 || filter.is_none_or(|f| f.contains(v2)) {
                            values.push(v2.clone());
                        }
                    }
                    false
                });
                Collection::from_values(values, hop_value_type(segment, database))
            } else if segment.forward {
                let hop_filter = if i == 0 { filter } else { None };
                let subjects =
                    database.get_subjects_union(&collection.to_set(), &segment.property, hop_filter);
                Collection::from_set(subjects, ValueType::Item)
            } else {
                let hop_filter = if i == 0 { filter } else { None };
                let objects =
                    database.get_objects_union(&collection.to_set(), &segment.property, hop_filter);
                Collection::from_set(objects, property_value_type(database, &segment.property))
            };
        }
        collection
    }
}

/// Value type after a hop: the property's declared type after a forward
/// hop (unknown properties degrade to "text"), always "item" after a
/// backward hop.
fn hop_value_type(segment: &Segment, database: &dyn Database) -> ValueType {
    if segment.forward {
        property_value_type(database, &segment.property)
    } else {
        ValueType::Item
    }
}

fn property_value_type(database: &dyn Database, property: &str) -> ValueType {
    database
        .get_property(property)
        .map(|p| p.value_type)
        .unwrap_or_default()
}
