use std::collections::HashSet;

use crate::value::{Value, ValueType};

/// How a collection stores its values.
///
/// `Ordered` keeps duplicates and preserves insertion order; `Unique`
/// deduplicates and makes no ordering promise. The distinction matters:
/// array-mode path hops and `foreach` bodies produce ordered output,
/// while set algebra (`union`, `remove`, bulk path hops) produces unique
/// output.
#[derive(Debug, Clone, PartialEq)]
pub enum Backing {
    Ordered(Vec<Value>),
    Unique(HashSet<Value>),
}

/// The engine's runtime result type: an immutable multiset or sequence of
/// values tagged with a [`ValueType`].
///
/// Collections are created fresh per evaluation and never mutated;
/// combinators produce new collections. Construction never fails and no
/// homogeneity check is performed; the tag is the caller's claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    backing: Backing,
    value_type: ValueType,
}

impl Collection {
    /// An ordered, duplicate-preserving collection.
    pub fn from_values(values: Vec<Value>, value_type: ValueType) -> Self {
        Collection {
            backing: Backing::Ordered(values),
            value_type,
        }
    }

    /// A deduplicated collection.
    pub fn from_set(set: HashSet<Value>, value_type: ValueType) -> Self {
        Collection {
            backing: Backing::Unique(set),
            value_type,
        }
    }

    pub fn singleton(value: Value, value_type: ValueType) -> Self {
        Collection::from_values(vec![value], value_type)
    }

    pub fn empty(value_type: ValueType) -> Self {
        Collection::from_values(Vec::new(), value_type)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Number of stored values. For an ordered backing duplicates count;
    /// for a unique backing this is the set cardinality. O(1).
    pub fn size(&self) -> usize {
        match &self.backing {
            Backing::Ordered(values) => values.len(),
            Backing::Unique(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Membership test: hash lookup on a unique backing, linear scan by
    /// strict equality on an ordered backing.
    pub fn contains(&self, value: &Value) -> bool {
        match &self.backing {
            Backing::Ordered(values) => values.contains(value),
            Backing::Unique(set) => set.contains(value),
        }
    }

    /// Visit each value until the visitor returns `true`.
    ///
    /// Finite and restartable: the same collection can be walked any
    /// number of times. Returns whether a visitor call short-circuited.
    pub fn for_each_value<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&Value) -> bool,
    {
        match &self.backing {
            Backing::Ordered(values) => {
                for v in values {
                    if visitor(v) {
                        return true;
                    }
                }
            }
            Backing::Unique(set) => {
                for v in set {
                    if visitor(v) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Iterate the values: insertion order for an ordered backing,
    /// arbitrary order for a unique one.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.backing {
            Backing::Ordered(values) => Box::new(values.iter()),
            Backing::Unique(set) => Box::new(set.iter()),
        }
    }

    /// The values as a deduplicated set. Cheap for a unique backing;
    /// builds the set for an ordered one.
    pub fn to_set(&self) -> HashSet<Value> {
        match &self.backing {
            Backing::Ordered(values) => values.iter().cloned().collect(),
            Backing::Unique(set) => set.clone(),
        }
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }
}
