use super::*;
use crate::options::Options;

fn registry() -> IndexRegistry {
    IndexRegistry::new(&Options::default())
}

#[test]
fn create_triple_is_indexable_and_create_kvpair_has_a_null_first_slot() {
    let mut store = RecordStore::new();
    let mut reg = registry();
    reg.create(&store, vec![0], crate::index_registry::IndexKind::TTree, None).unwrap();

    let triple = create_triple(&mut store, &mut reg, Value::Int(1), Value::str("p"), Value::Int(2), false).unwrap();
    assert_eq!(store.get(triple).unwrap().fields.len(), 3);
    assert_eq!(reg.ttree(reg.column_to_index(&[0], None).unwrap()).unwrap().find_first(&store, &Value::Int(1)), Some(triple));

    let kv = create_kvpair(&mut store, &mut reg, Value::str("k"), Value::Int(9), false).unwrap();
    assert_eq!(store.get(kv).unwrap().get(0), Some(&Value::Null));
    assert_eq!(store.get(kv).unwrap().get(1), Some(&Value::str("k")));
}

#[test]
fn isparam_records_are_hidden_and_never_indexed() {
    let mut store = RecordStore::new();
    let mut reg = registry();
    reg.create(&store, vec![0], crate::index_registry::IndexKind::TTree, None).unwrap();

    let rid = create_triple(&mut store, &mut reg, Value::Int(1), Value::str("p"), Value::Int(2), true).unwrap();
    assert!(store.get(rid).unwrap().meta.is_hidden_from_scan());
    let idx = reg.column_to_index(&[0], None).unwrap();
    assert_eq!(reg.ttree(idx).unwrap().stats().element_count, 0);
}

#[test]
fn find_document_walks_backlinks_to_the_nearest_document_root() {
    let mut store = RecordStore::new();
    let mut reg = registry();

    let leaf = create_kvpair(&mut store, &mut reg, Value::str("b"), Value::Int(55), false).unwrap();
    let inner = create_object(&mut store, &mut reg, vec![Value::Record(leaf)], false, false).unwrap();
    let root = create_object(&mut store, &mut reg, vec![Value::Record(inner)], true, false).unwrap();

    assert_eq!(find_document(&store, leaf, 64), Some(root));
    assert_eq!(find_document(&store, inner, 64), Some(root));
    assert_eq!(find_document(&store, root, 64), Some(root));
}

#[test]
fn find_document_respects_the_depth_bound() {
    let mut store = RecordStore::new();
    let mut reg = registry();

    let leaf = create_kvpair(&mut store, &mut reg, Value::str("b"), Value::Int(55), false).unwrap();
    let inner = create_object(&mut store, &mut reg, vec![Value::Record(leaf)], false, false).unwrap();
    let root = create_object(&mut store, &mut reg, vec![Value::Record(inner)], true, false).unwrap();

    assert_eq!(find_document(&store, leaf, 0), None);
    assert_eq!(find_document(&store, leaf, 1), None); // reaches `inner`, which isn't a document root
    assert_eq!(find_document(&store, leaf, 2), Some(root));
}

#[test]
fn delete_document_removes_every_reachable_record() {
    // spec.md §8 invariant 7: deleting a document frees the whole tree.
    let mut store = RecordStore::new();
    let mut reg = registry();

    let leaf = create_kvpair(&mut store, &mut reg, Value::str("b"), Value::Int(55), false).unwrap();
    let inner = create_object(&mut store, &mut reg, vec![Value::Record(leaf)], false, false).unwrap();
    let root = create_object(&mut store, &mut reg, vec![Value::Record(inner)], true, false).unwrap();

    let deleted = delete_document(&mut store, &mut reg, root).unwrap();
    assert_eq!(deleted, 3);
    assert!(store.get(root).is_none());
    assert!(store.get(inner).is_none());
    assert!(store.get(leaf).is_none());
}

#[test]
fn create_object_rejects_duplicate_kvpair_keys_without_an_index() {
    let mut store = RecordStore::new();
    let mut reg = registry();

    let a = create_kvpair(&mut store, &mut reg, Value::str("k"), Value::Int(1), false).unwrap();
    let b = create_kvpair(&mut store, &mut reg, Value::str("k"), Value::Int(2), false).unwrap();

    let err = create_object(&mut store, &mut reg, vec![Value::Record(a), Value::Record(b)], false, false).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn create_object_rejects_duplicate_kvpair_keys_with_an_index() {
    let mut store = RecordStore::new();
    let mut reg = registry();
    reg.create(&store, vec![1], crate::index_registry::IndexKind::TTree, None).unwrap();

    let a = create_kvpair(&mut store, &mut reg, Value::str("dup"), Value::Int(1), false).unwrap();
    let b = create_kvpair(&mut store, &mut reg, Value::str("dup"), Value::Int(2), false).unwrap();

    let err = create_object(&mut store, &mut reg, vec![Value::Record(a), Value::Record(b)], false, false).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn create_object_allows_distinct_kvpair_keys() {
    let mut store = RecordStore::new();
    let mut reg = registry();

    let a = create_kvpair(&mut store, &mut reg, Value::str("k1"), Value::Int(1), false).unwrap();
    let b = create_kvpair(&mut store, &mut reg, Value::str("k2"), Value::Int(2), false).unwrap();

    create_object(&mut store, &mut reg, vec![Value::Record(a), Value::Record(b)], false, false).unwrap();
}

#[test]
fn delete_document_also_unindexes_every_removed_record() {
    let mut store = RecordStore::new();
    let mut reg = registry();
    reg.create(&store, vec![1], crate::index_registry::IndexKind::TTree, None).unwrap();

    let leaf = create_kvpair(&mut store, &mut reg, Value::str("b"), Value::Int(55), false).unwrap();
    let root = create_object(&mut store, &mut reg, vec![Value::Record(leaf)], true, false).unwrap();

    let idx = reg.column_to_index(&[1], None).unwrap();
    assert_eq!(reg.ttree(idx).unwrap().stats().element_count, 1);

    delete_document(&mut store, &mut reg, root).unwrap();
    assert_eq!(reg.ttree(idx).unwrap().stats().element_count, 0);
}
