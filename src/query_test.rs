use super::*;
use crate::index_registry::IndexKind;
use crate::options::Options;
use crate::record::{Meta, Record};

fn rec(store: &mut RecordStore, fields: Vec<Value>) -> RecordId {
    store.insert(Record::new(fields, Meta::empty()))
}

#[test]
fn ttree_backed_eq_query_finds_the_matching_row() {
    // spec.md §8 scenario A: insert records, then find one by EQ.
    let mut store = RecordStore::new();
    let mut reg = IndexRegistry::new(&Options::builder().ttree_node_size(3).build());
    reg.create(&store, vec![0], IndexKind::TTree, None).unwrap();

    let ids: Vec<RecordId> = (0..30i64).map(|v| rec(&mut store, vec![Value::Int(v)])).collect();
    for &rid in &ids {
        reg.add_rec(&store, rid).unwrap();
    }

    let args = vec![Arg::new(0, Condition::Eq, Value::Int(17))];
    let mut query = Query::new(&store, &reg, None, args);
    assert_eq!(query.fetch(), Some(ids[17]));
    assert_eq!(query.fetch(), None);
}

#[test]
fn updating_an_indexed_field_keeps_the_query_result_in_sync() {
    // spec.md §8 scenario B: update-preserves-index.
    let mut store = RecordStore::new();
    let mut reg = IndexRegistry::new(&Options::builder().ttree_node_size(3).build());
    reg.create(&store, vec![0], IndexKind::TTree, None).unwrap();

    let rid = rec(&mut store, vec![Value::Int(5)]);
    reg.add_rec(&store, rid).unwrap();

    reg.del_field(&store, rid, 0).unwrap();
    store.set_field(rid, 0, Value::Int(99)).unwrap();
    reg.add_field(&store, rid, 0).unwrap();

    let mut old_query = Query::new(&store, &reg, None, vec![Arg::new(0, Condition::Eq, Value::Int(5))]);
    assert_eq!(old_query.fetch(), None);

    let mut new_query = Query::new(&store, &reg, None, vec![Arg::new(0, Condition::Eq, Value::Int(99))]);
    assert_eq!(new_query.fetch(), Some(rid));
}

#[test]
fn range_query_folds_bounds_and_still_applies_residual_check() {
    let mut store = RecordStore::new();
    let mut reg = IndexRegistry::new(&Options::builder().ttree_node_size(3).build());
    reg.create(&store, vec![0], IndexKind::TTree, None).unwrap();

    let ids: Vec<RecordId> = (0..20i64)
        .map(|v| rec(&mut store, vec![Value::Int(v), Value::str(if v % 2 == 0 { "even" } else { "odd" })]))
        .collect();
    for &rid in &ids {
        reg.add_rec(&store, rid).unwrap();
    }

    let args = vec![
        Arg::new(0, Condition::Ge, Value::Int(5)),
        Arg::new(0, Condition::Lt, Value::Int(10)),
        Arg::new(1, Condition::Eq, Value::str("even")),
    ];
    let mut query = Query::new(&store, &reg, None, args);
    let mut found = Vec::new();
    while let Some(rid) = query.fetch() {
        found.push(rid);
    }
    assert_eq!(found, vec![ids[6], ids[8]]);
}

#[test]
fn ne_argument_on_the_indexed_column_is_checked_per_row() {
    let mut store = RecordStore::new();
    let mut reg = IndexRegistry::new(&Options::builder().ttree_node_size(3).build());
    reg.create(&store, vec![0], IndexKind::TTree, None).unwrap();

    let ids: Vec<RecordId> = (0..5i64).map(|v| rec(&mut store, vec![Value::Int(v)])).collect();
    for &rid in &ids {
        reg.add_rec(&store, rid).unwrap();
    }

    let args = vec![Arg::new(0, Condition::Ne, Value::Int(2))];
    let mut query = Query::new(&store, &reg, None, args);
    let mut found = Vec::new();
    while let Some(rid) = query.fetch() {
        found.push(rid);
    }
    assert_eq!(found, vec![ids[0], ids[1], ids[3], ids[4]]);
}

#[test]
fn no_indexed_column_falls_back_to_a_full_scan() {
    let mut store = RecordStore::new();
    let reg = IndexRegistry::new(&Options::default());

    let ids: Vec<RecordId> = (0..5i64).map(|v| rec(&mut store, vec![Value::Int(v)])).collect();

    let args = vec![Arg::new(0, Condition::Eq, Value::Int(3))];
    let mut query = Query::new(&store, &reg, None, args);
    assert_eq!(query.fetch(), Some(ids[3]));
    assert_eq!(query.fetch(), None);
}

#[test]
fn hidden_notdata_records_never_surface_via_full_scan() {
    let mut store = RecordStore::new();
    let reg = IndexRegistry::new(&Options::default());

    let visible = rec(&mut store, vec![Value::Int(1)]);
    store.insert(Record::new(vec![Value::Int(1)], Meta::NOTDATA | Meta::MATCH));

    let mut query = Query::new(&store, &reg, None, vec![Arg::new(0, Condition::Eq, Value::Int(1))]);
    assert_eq!(query.fetch(), Some(visible));
    assert_eq!(query.fetch(), None);
}

#[test]
fn match_record_wildcards_normalise_to_eq_arguments_on_fixed_slots() {
    let mut store = RecordStore::new();
    let reg = IndexRegistry::new(&Options::default());

    let a = rec(&mut store, vec![Value::Int(1), Value::Int(5)]);
    let _b = rec(&mut store, vec![Value::Int(2), Value::Int(6)]);

    let template = vec![Value::Var(0), Value::Int(5)];
    let mut query = Query::new(&store, &reg, Some(&template), Vec::new());
    assert_eq!(query.fetch(), Some(a));
    assert_eq!(query.fetch(), None);
}

#[test]
fn query_with_limit_stops_after_the_configured_row_count() {
    let mut store = RecordStore::new();
    let mut reg = IndexRegistry::new(&Options::builder().ttree_node_size(3).build());
    reg.create(&store, vec![0], IndexKind::TTree, None).unwrap();

    for v in 0..10i64 {
        let rid = rec(&mut store, vec![Value::Int(v)]);
        reg.add_rec(&store, rid).unwrap();
    }

    let mut query = Query::with_limit(&store, &reg, None, Vec::new(), Some(3));
    let mut count = 0;
    while query.fetch().is_some() {
        count += 1;
    }
    assert_eq!(count, 3);
}

#[test]
fn rewind_replays_the_same_result_set() {
    let mut store = RecordStore::new();
    let reg = IndexRegistry::new(&Options::default());
    let rid = rec(&mut store, vec![Value::Int(1)]);

    let mut query = Query::new(&store, &reg, None, vec![Arg::new(0, Condition::Eq, Value::Int(1))]);
    assert_eq!(query.fetch(), Some(rid));
    assert_eq!(query.fetch(), None);
    query.rewind();
    assert_eq!(query.fetch(), Some(rid));
}
