use super::*;
use crate::query::Condition;

#[test]
fn create_index_then_insert_and_query_round_trips_through_the_database() {
    let mut db = Database::new();
    db.create_index(vec![0], IndexKind::TTree, None).unwrap();

    let ids: Vec<RecordId> = (0..10i64)
        .map(|v| db.insert(vec![Value::Int(v)], Meta::empty()).unwrap())
        .collect();

    let mut query = db.make_query(None, vec![Arg::new(0, Condition::Eq, Value::Int(7))]);
    assert_eq!(query.fetch(), Some(ids[7]));
    assert_eq!(query.fetch(), None);
}

#[test]
fn set_field_keeps_indexes_and_query_results_consistent() {
    let mut db = Database::new();
    db.create_index(vec![0], IndexKind::TTree, None).unwrap();
    let rid = db.insert(vec![Value::Int(1)], Meta::empty()).unwrap();

    db.set_field(rid, 0, Value::Int(42)).unwrap();

    let mut stale = db.make_query(None, vec![Arg::new(0, Condition::Eq, Value::Int(1))]);
    assert_eq!(stale.fetch(), None);

    let mut fresh = db.make_query(None, vec![Arg::new(0, Condition::Eq, Value::Int(42))]);
    assert_eq!(fresh.fetch(), Some(rid));
}

#[test]
fn remove_drops_a_record_from_the_index_and_from_get() {
    let mut db = Database::new();
    db.create_index(vec![0], IndexKind::TTree, None).unwrap();
    let rid = db.insert(vec![Value::Int(1)], Meta::empty()).unwrap();

    db.remove(rid).unwrap();

    assert!(db.get(rid).is_none());
    let mut query = db.make_query(None, vec![Arg::new(0, Condition::Eq, Value::Int(1))]);
    assert_eq!(query.fetch(), None);
}

#[test]
fn drop_index_removes_it_from_get_all_indexes() {
    let mut db = Database::new();
    let id = db.create_index(vec![0], IndexKind::Hash, None).unwrap();
    assert_eq!(db.get_all_indexes(), vec![id]);

    db.drop_index(id).unwrap();
    assert!(db.get_all_indexes().is_empty());
    assert_eq!(db.column_to_index(&[0], None), None);
}

#[test]
fn json_document_lifecycle_build_query_then_delete() {
    let mut db = Database::new();
    let b_kv = db.create_kvpair(Value::str("b"), Value::Double(55.0), false).unwrap();
    let a_obj = db.create_object(vec![Value::Record(b_kv)], false, false).unwrap();
    let root = db.create_object(vec![Value::Record(a_obj)], true, false).unwrap();

    assert_eq!(db.find_document(b_kv), Some(root));

    let mut query = db.make_json_query(vec![crate::json_query::Clause::new(Value::str("b"), Value::Double(55.0))]);
    assert_eq!(query.fetch(), Some(root));
    assert_eq!(query.fetch(), None);

    let deleted = db.delete_document(root).unwrap();
    assert_eq!(deleted, 3);
    assert!(db.get(root).is_none());
    assert!(db.get(a_obj).is_none());
    assert!(db.get(b_kv).is_none());
}

#[test]
fn make_query_with_limit_caps_the_row_count() {
    let mut db = Database::new();
    db.create_index(vec![0], IndexKind::TTree, None).unwrap();
    for v in 0..10i64 {
        db.insert(vec![Value::Int(v)], Meta::empty()).unwrap();
    }

    let mut query = db.make_query_with_limit(None, Vec::new(), 4);
    let mut count = 0;
    while query.fetch().is_some() {
        count += 1;
    }
    assert_eq!(count, 4);
}

#[test]
fn template_restricted_index_reports_its_template_and_kind() {
    let mut db = Database::new();
    let id = db
        .create_index(vec![0], IndexKind::TTree, Some(vec![Value::Var(0), Value::Int(5)]))
        .unwrap();

    assert_eq!(db.get_index_type(id), Some(IndexKind::TTree));
    assert!(db.get_index_template(id).is_some());
}
