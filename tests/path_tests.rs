use std::collections::HashSet;

use facetql::{
    Collection, EvalContext, EvalError, Function, MemoryDatabase, Path, RootValue, Value, ValueType,
};

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn item(id: &str) -> Value {
    Value::Item(id.to_string())
}

fn item_set(ids: &[&str]) -> HashSet<Value> {
    ids.iter().map(|id| item(id)).collect()
}

/// Items a, b, c carrying 1, 2, 3 on the numeric property `score`.
fn score_db() -> MemoryDatabase {
    let mut db = MemoryDatabase::new();
    db.define_property("score", ValueType::Number);
    db.add_statement(item("a"), "score", num(1.0));
    db.add_statement(item("b"), "score", num(2.0));
    db.add_statement(item("c"), "score", num(3.0));
    db
}

fn item_set_ctx<'db>(ids: &[&str], db: &'db MemoryDatabase) -> EvalContext<'db> {
    EvalContext::with_single_root("value", RootValue::Set(item_set(ids)), ValueType::Item, db)
}

fn forward_path(property: &str) -> Path {
    Path::from_property(property, true)
}

#[test]
fn zero_segment_path_returns_the_root_unchanged() {
    let db = MemoryDatabase::new();
    let ctx = EvalContext::with_single_root(
        "value",
        RootValue::List(vec![num(1.0), num(2.0)]),
        ValueType::Number,
        &db,
    );
    let result = Path::new().evaluate(&ctx).unwrap();
    let values: Vec<Value> = result.iter().cloned().collect();
    assert_eq!(values, vec![num(1.0), num(2.0)]);
    assert_eq!(result.value_type(), ValueType::Number);
}

#[test]
fn unbound_root_is_an_error() {
    let db = MemoryDatabase::new();
    let ctx = item_set_ctx(&[], &db);
    let mut path = Path::new();
    path.set_root_name("nowhere");
    assert_eq!(
        path.evaluate(&ctx),
        Err(EvalError::NoSuchVariable("nowhere".to_string()))
    );
}

#[test]
fn forward_hop_collects_objects_with_the_property_type() {
    let db = score_db();
    let ctx = item_set_ctx(&["a", "b", "c"], &db);
    let result = forward_path("score").evaluate(&ctx).unwrap();
    let expected: HashSet<Value> = [num(1.0), num(2.0), num(3.0)].into_iter().collect();
    assert_eq!(result.to_set(), expected);
    assert_eq!(result.value_type(), ValueType::Number);

    // Feeding the result to max completes the facet pipeline.
    let max = Function::Max.apply(&[result]);
    assert_eq!(max.size(), 1);
    assert!(max.contains(&num(3.0)));
    assert_eq!(max.value_type(), ValueType::Number);
}

#[test]
fn unknown_property_degrades_to_text() {
    let db = score_db();
    let ctx = item_set_ctx(&["a"], &db);
    let result = forward_path("shoe-size").evaluate(&ctx).unwrap();
    assert_eq!(result.size(), 0);
    assert_eq!(result.value_type(), ValueType::Text);
}

#[test]
fn backward_hop_yields_items() {
    let db = score_db();
    let start = Collection::from_set([num(2.0)].into_iter().collect(), ValueType::Number);
    let result = Path::from_property("score", false).walk_forward(start, &db);
    assert_eq!(result.to_set(), item_set(&["b"]));
    assert_eq!(result.value_type(), ValueType::Item);
}

#[test]
fn array_hops_preserve_duplicates_and_order() {
    let mut db = MemoryDatabase::new();
    db.define_property("tag", ValueType::Text);
    db.add_statement(item("a"), "tag", Value::Text("z".to_string()));
    db.add_statement(item("b"), "tag", Value::Text("z".to_string()));
    let ctx = EvalContext::with_single_root(
        "value",
        RootValue::List(vec![item("a"), item("b")]),
        ValueType::Item,
        &db,
    );

    let mut array_path = Path::new();
    array_path.append_hop("tag", ".@");
    let result = array_path.evaluate(&ctx).unwrap();
    assert_eq!(result.size(), 2);

    let mut bulk_path = Path::new();
    bulk_path.append_hop("tag", ".");
    let result = bulk_path.evaluate(&ctx).unwrap();
    assert_eq!(result.size(), 1);
}

#[test]
fn backward_walk_with_filter_inverts_a_forward_walk() {
    let mut db = score_db();
    // An extra subject sharing a value, to prove the filter matters.
    db.add_statement(item("d"), "score", num(1.0));

    let roots = item_set(&["a", "b", "c"]);
    let start = Collection::from_set(roots.clone(), ValueType::Item);
    let path = forward_path("score");

    let forward = path.walk_forward(start, &db);
    let back = path.walk_backward(forward, Some(&roots), &db);
    assert_eq!(back.to_set(), roots);
    assert_eq!(back.value_type(), ValueType::Item);
}

#[test]
fn evaluate_backward_finds_subjects_of_one_value() {
    let db = score_db();
    let path = forward_path("score");
    let result = path.evaluate_backward(num(3.0), ValueType::Number, None, &db);
    assert_eq!(result.to_set(), item_set(&["c"]));
}

#[test]
fn backward_filter_applies_only_at_the_first_segment() {
    let mut db = MemoryDatabase::new();
    db.define_property("part-of", ValueType::Item);
    db.define_property("label", ValueType::Text);
    db.add_statement(item("x"), "part-of", item("m"));
    db.add_statement(item("y"), "part-of", item("m"));
    db.add_statement(item("m"), "label", Value::Text("v".to_string()));

    let mut path = Path::new();
    path.append_segment("part-of", true, false);
    path.append_segment("label", true, false);

    let start = Collection::from_set(
        [Value::Text("v".to_string())].into_iter().collect(),
        ValueType::Text,
    );
    // The filter set contains neither "m" nor "v"; if it applied at the
    // later (label) segment nothing would survive to reach segment 0.
    let filter = item_set(&["x"]);
    let result = path.walk_backward(start, Some(&filter), &db);
    assert_eq!(result.to_set(), item_set(&["x"]));
}

#[test]
fn range_backward_requires_a_forward_final_segment() {
    let db = score_db();
    let path = Path::from_property("score", false);
    let err = path
        .range_backward(0.0, 10.0, true, None, &db)
        .unwrap_err();
    assert_eq!(err, EvalError::MustBeForward);
}

#[test]
fn range_backward_matches_a_brute_force_scan() {
    let db = score_db();
    let path = forward_path("score");
    let result = path.range_backward(2.0, 3.0, true, None, &db).unwrap();
    assert_eq!(result.values, item_set(&["b", "c"]));
    assert_eq!(result.count, 2);
    assert_eq!(result.value_type, ValueType::Item);

    // Exclusive upper bound drops the boundary item.
    let result = path.range_backward(2.0, 3.0, false, None, &db).unwrap();
    assert_eq!(result.values, item_set(&["b"]));
}

#[test]
fn range_backward_applies_the_filter_on_a_sole_segment() {
    let db = score_db();
    let path = forward_path("score");
    let filter = item_set(&["c"]);
    let result = path.range_backward(0.0, 10.0, true, Some(&filter), &db).unwrap();
    assert_eq!(result.values, item_set(&["c"]));
    assert_eq!(result.count, 1);
}

#[test]
fn range_backward_walks_remaining_segments_in_reverse() {
    let mut db = MemoryDatabase::new();
    db.define_property("member", ValueType::Item);
    db.define_property("score", ValueType::Number);
    db.add_statement(item("g1"), "member", item("a"));
    db.add_statement(item("g2"), "member", item("b"));
    db.add_statement(item("a"), "score", num(1.0));
    db.add_statement(item("b"), "score", num(5.0));

    // group .member .score, scanned by score range.
    let mut path = Path::new();
    path.append_segment("member", true, false);
    path.append_segment("score", true, false);

    let result = path.range_backward(4.0, 6.0, true, None, &db).unwrap();
    assert_eq!(result.values, item_set(&["g2"]));
    assert_eq!(result.value_type, ValueType::Item);
}

#[test]
fn test_exists_reflects_result_size() {
    let db = score_db();
    let ctx = item_set_ctx(&["a"], &db);
    assert!(forward_path("score").test_exists(&ctx).unwrap());
    assert!(!forward_path("shoe-size").test_exists(&ctx).unwrap());
}
