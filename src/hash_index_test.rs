use super::*;
use crate::record::Record;

fn rec(store: &mut RecordStore, fields: Vec<Value>) -> RecordId {
    store.insert(Record::new(fields, Meta::empty()))
}

#[test]
fn multi_column_hash_finds_inserted_pairs_and_misses_others() {
    let mut store = RecordStore::new();
    let mut index = HashIndex::new(vec![1, 2], false);
    let mut inserted = Vec::new();
    for i in 0..10i64 {
        let rid = rec(&mut store, vec![Value::Null, Value::Int(i), Value::str(format!("s{i}"))]);
        index.add(&store, rid).unwrap();
        inserted.push((i, format!("s{i}")));
    }

    for (k, s) in &inserted {
        let hits = index.search(&[Value::Int(*k), Value::str(s.clone())]).unwrap();
        assert!(hits.len() == 1);
    }
    let miss = index.search(&[Value::Int(999), Value::str("nope")]).unwrap();
    assert!(miss.is_empty());
}

#[test]
fn json_variant_unwraps_array_valued_column_at_top_level() {
    let mut store = RecordStore::new();
    let array_fields = vec![Value::str("a"), Value::str("b"), Value::str("c")];
    let array_rid = store.insert(Record::new(array_fields, Meta::ARRAY));
    let plain_rid = rec(&mut store, vec![Value::Null, Value::str("tag"), Value::Record(array_rid)]);

    let mut index = HashIndex::new(vec![1, 2], true);
    index.add(&store, plain_rid).unwrap();

    for letter in ["a", "b", "c"] {
        let hits = index.search(&[Value::str("tag"), Value::str(letter)]).unwrap();
        assert_eq!(hits, &[plain_rid]);
    }
    let miss = index.search(&[Value::str("tag"), Value::str("d")]).unwrap();
    assert!(miss.is_empty());
}

#[test]
fn non_json_index_does_not_unwrap_arrays() {
    let mut store = RecordStore::new();
    let array_rid = store.insert(Record::new(vec![Value::str("a"), Value::str("b")], Meta::ARRAY));
    let plain_rid = rec(&mut store, vec![Value::Null, Value::str("tag"), Value::Record(array_rid)]);

    let mut index = HashIndex::new(vec![1, 2], false);
    index.add(&store, plain_rid).unwrap();

    let hits = index.search(&[Value::str("tag"), Value::Record(array_rid)]).unwrap();
    assert_eq!(hits, &[plain_rid]);
    assert!(index.search(&[Value::str("tag"), Value::str("a")]).unwrap().is_empty());
}

#[test]
fn remove_is_symmetric_with_add_including_unwrapped_keys() {
    let mut store = RecordStore::new();
    let array_rid = store.insert(Record::new(vec![Value::str("a"), Value::str("b")], Meta::ARRAY));
    let plain_rid = rec(&mut store, vec![Value::Null, Value::str("tag"), Value::Record(array_rid)]);

    let mut index = HashIndex::new(vec![1, 2], true);
    index.add(&store, plain_rid).unwrap();
    index.remove(&store, plain_rid).unwrap();

    assert!(index.search(&[Value::str("tag"), Value::str("a")]).unwrap().is_empty());
    assert!(index.search(&[Value::str("tag"), Value::str("b")]).unwrap().is_empty());
    assert_eq!(index.stats().entry_count, 0);
}

#[test]
fn search_rejects_wrong_argument_count() {
    let index = HashIndex::new(vec![1, 2], false);
    let err = index.search(&[Value::Int(1)]).unwrap_err();
    assert!(matches!(err, WgError::BadArgument(_)));
}

#[test]
fn out_of_memory_during_add_leaves_partial_state_for_caller_to_delete() {
    let mut store = RecordStore::new();
    let mut index = HashIndex::with_capacity(vec![1, 2], true, 2);
    let array_rid = store.insert(Record::new(
        vec![Value::str("a"), Value::str("b"), Value::str("c")],
        Meta::ARRAY,
    ));
    let plain_rid = rec(&mut store, vec![Value::Null, Value::str("tag"), Value::Record(array_rid)]);

    let err = index.add(&store, plain_rid).unwrap_err();
    assert!(matches!(err, WgError::OutOfMemory(_)));
    // Two of the three unwrapped keys were committed before the cap hit.
    assert_eq!(index.stats().entry_count, 2);

    // Caller deletes the record: a symmetric remove cleans up the partial state.
    index.remove(&store, plain_rid).unwrap();
    assert_eq!(index.stats().entry_count, 0);
}
