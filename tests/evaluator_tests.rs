use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use facetql::{
    Collection, Database, EvalContext, EvalError, Expression, MemoryDatabase, Parser, Property,
    RootValue, Value, ValueType,
};

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn item(id: &str) -> Value {
    Value::Item(id.to_string())
}

/// Wraps a database and records which properties bulk lookups touch, to
/// observe which sub-expressions actually evaluated.
struct RecordingDb {
    inner: MemoryDatabase,
    touched: RefCell<Vec<String>>,
}

impl RecordingDb {
    fn new(inner: MemoryDatabase) -> Self {
        RecordingDb {
            inner,
            touched: RefCell::new(Vec::new()),
        }
    }
}

impl Database for RecordingDb {
    fn get_objects(&self, subject: &Value, property: &str) -> Collection {
        self.inner.get_objects(subject, property)
    }

    fn get_subjects(&self, object: &Value, property: &str) -> Collection {
        self.inner.get_subjects(object, property)
    }

    fn get_objects_union(
        &self,
        subjects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value> {
        self.touched.borrow_mut().push(property.to_string());
        self.inner.get_objects_union(subjects, property, filter)
    }

    fn get_subjects_union(
        &self,
        objects: &HashSet<Value>,
        property: &str,
        filter: Option<&HashSet<Value>>,
    ) -> HashSet<Value> {
        self.inner.get_subjects_union(objects, property, filter)
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
        self.inner
            .get_subjects_in_range(property, from, to, inclusive, out, filter)
    }

    fn get_property(&self, property: &str) -> Option<&Property> {
        self.inner.get_property(property)
    }
}

fn number_list_ctx<'db>(values: &[f64], db: &'db dyn Database) -> EvalContext<'db> {
    EvalContext::with_single_root(
        "value",
        RootValue::List(values.iter().copied().map(num).collect()),
        ValueType::Number,
        db,
    )
}

#[test]
fn constants_evaluate_to_singletons() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0], &db);
    let result = Expression::number(4.0).evaluate(&ctx).unwrap();
    assert_eq!(result.size(), 1);
    assert!(result.contains(&num(4.0)));
    assert_eq!(result.value_type(), ValueType::Number);
}

#[test]
fn operator_walks_the_cartesian_product_left_outer() {
    let db = MemoryDatabase::new();
    let mut roots = HashMap::new();
    roots.insert("l".to_string(), RootValue::List(vec![num(1.0), num(2.0)]));
    roots.insert("r".to_string(), RootValue::List(vec![num(10.0), num(20.0)]));
    let mut types = HashMap::new();
    types.insert("l".to_string(), ValueType::Number);
    types.insert("r".to_string(), ValueType::Number);
    let ctx = EvalContext::new(roots, types, "l", &db);

    let result = Parser::parse("l + r").unwrap().evaluate(&ctx).unwrap();
    let values: Vec<Value> = result.iter().cloned().collect();
    assert_eq!(values, vec![num(11.0), num(21.0), num(12.0), num(22.0)]);
    assert_eq!(result.value_type(), ValueType::Number);
}

#[test]
fn arithmetic_on_non_numbers_propagates_nan() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0], &db);
    let result = Parser::parse("'pear' + 1").unwrap().evaluate(&ctx).unwrap();
    assert!(result.contains(&num(f64::NAN)));
}

#[test]
fn ordering_comparisons_with_nan_are_false() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0], &db);
    for input in ["'pear' < 1", "'pear' > 1", "'pear' <= 1", "'pear' >= 1"] {
        let result = Parser::parse(input).unwrap().evaluate(&ctx).unwrap();
        assert!(result.contains(&Value::Boolean(false)), "{input}");
    }
}

#[test]
fn unknown_function_names_the_function() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0], &db);
    let err = Parser::parse("frobnicate(1)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap_err();
    assert_eq!(err, EvalError::UnknownFunction("frobnicate".to_string()));
}

#[test]
fn function_arguments_evaluate_before_the_registry_lookup() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0], &db);

    // A failing argument wins over the unknown function name.
    let mut path = facetql::Path::new();
    path.set_root_name("nowhere");
    let expr = Expression::Function {
        name: "frobnicate".to_string(),
        args: vec![Expression::Path(path)],
    };
    let err = expr.evaluate(&ctx).unwrap_err();
    assert_eq!(err, EvalError::NoSuchVariable("nowhere".to_string()));

    // Argument side effects still happen when the name is unknown.
    let mut inner = MemoryDatabase::new();
    inner.add_statement(item("x"), "a", num(1.0));
    let db = RecordingDb::new(inner);
    let ctx = EvalContext::with_single_root(
        "value",
        RootValue::Single(item("x")),
        ValueType::Item,
        &db,
    );
    let err = Parser::parse("frobnicate(.a)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap_err();
    assert_eq!(err, EvalError::UnknownFunction("frobnicate".to_string()));
    assert_eq!(*db.touched.borrow(), vec!["a".to_string()]);
}

#[test]
fn if_evaluates_only_the_selected_branch() {
    let mut inner = MemoryDatabase::new();
    inner.add_statement(item("x"), "a", num(1.0));
    inner.add_statement(item("x"), "b", num(2.0));
    let db = RecordingDb::new(inner);
    let ctx = EvalContext::with_single_root(
        "value",
        RootValue::Single(item("x")),
        ValueType::Item,
        &db,
    );

    let expr = Parser::parse("if(1, .a, .b)").unwrap();
    let result = expr.evaluate(&ctx).unwrap();
    assert!(result.contains(&num(1.0)));
    assert_eq!(*db.touched.borrow(), vec!["a".to_string()]);

    db.touched.borrow_mut().clear();
    let expr = Parser::parse("if(0, .a, .b)").unwrap();
    let result = expr.evaluate(&ctx).unwrap();
    assert!(result.contains(&num(2.0)));
    assert_eq!(*db.touched.borrow(), vec!["b".to_string()]);
}

#[test]
fn if_condition_is_truthy_when_any_value_is() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[0.0, 0.0, 5.0], &db);
    let result = Parser::parse("if(value, 'yes', 'no')")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    assert!(result.contains(&Value::Text("yes".to_string())));
}

#[test]
fn foreach_over_an_empty_source_is_an_empty_text_collection() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[], &db);
    let result = Parser::parse("foreach(value, value + 1)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    assert_eq!(result.size(), 0);
    assert_eq!(result.value_type(), ValueType::Text);
}

#[test]
fn foreach_preserves_source_order() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[1.0, 2.0, 3.0], &db);
    let result = Parser::parse("foreach(value, value)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    let values: Vec<Value> = result.iter().cloned().collect();
    assert_eq!(values, vec![num(1.0), num(2.0), num(3.0)]);
    assert_eq!(result.value_type(), ValueType::Number);
}

#[test]
fn foreach_rebinding_does_not_leak_into_the_outer_context() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[1.0, 2.0], &db);
    Parser::parse("foreach(value, value * 10)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    // The outer binding is untouched afterwards.
    let outer = Parser::parse("value").unwrap().evaluate(&ctx).unwrap();
    let values: Vec<Value> = outer.iter().cloned().collect();
    assert_eq!(values, vec![num(1.0), num(2.0)]);
}

#[test]
fn nested_foreach_scopes_compose() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[1.0, 2.0], &db);
    // Inner loop shadows the binding, outer iteration continues unharmed.
    let result = Parser::parse("foreach(value, foreach(value * 10, value + 1))")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    let values: Vec<Value> = result.iter().cloned().collect();
    assert_eq!(values, vec![num(11.0), num(21.0)]);
}

#[test]
fn filter_keeps_elements_whose_predicate_says_true() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[1.0, 2.0, 3.0], &db);
    let result = Parser::parse("filter(value, if(value > 1, 'true', 'false'))")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    let expected: HashSet<Value> = [num(2.0), num(3.0)].into_iter().collect();
    assert_eq!(result.to_set(), expected);
    assert_eq!(result.value_type(), ValueType::Number);
}

#[test]
fn filter_tests_the_literal_string_true() {
    let db = MemoryDatabase::new();
    let ctx = number_list_ctx(&[1.0, 2.0], &db);
    // A boolean true is not the string "true"; nothing survives.
    let result = Parser::parse("filter(value, value > 0)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    assert_eq!(result.size(), 0);
}

#[test]
fn default_returns_the_first_non_empty_result() {
    let db = MemoryDatabase::new();
    let ctx = EvalContext::with_single_root(
        "value",
        RootValue::Single(item("x")),
        ValueType::Item,
        &db,
    );
    let result = Parser::parse("default(.missing, 'fallback')")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    assert!(result.contains(&Value::Text("fallback".to_string())));

    let result = Parser::parse("default(.missing, .also-missing)")
        .unwrap()
        .evaluate(&ctx)
        .unwrap();
    assert_eq!(result.size(), 0);
    assert_eq!(result.value_type(), ValueType::Text);
}

#[test]
fn re_evaluation_is_deterministic() {
    let mut db = MemoryDatabase::new();
    db.define_property("score", ValueType::Number);
    db.add_statement(item("a"), "score", num(1.0));
    db.add_statement(item("b"), "score", num(2.0));
    let set: HashSet<Value> = [item("a"), item("b")].into_iter().collect();
    let ctx =
        EvalContext::with_single_root("value", RootValue::Set(set), ValueType::Item, &db);

    let expr = Parser::parse("foreach(.score, value * 2)").unwrap();
    let first = expr.evaluate(&ctx).unwrap();
    let second = expr.evaluate(&ctx).unwrap();
    assert_eq!(first.to_set(), second.to_set());
    assert_eq!(first.value_type(), second.value_type());
}
