use super::*;

#[test]
fn insert_and_get_round_trips() {
    let mut store = RecordStore::new();
    let id = store.insert(Record::new(vec![Value::Int(1), Value::str("a")], Meta::empty()));
    assert_eq!(store.get(id).unwrap().fields[0], Value::Int(1));
}

#[test]
fn notdata_and_match_records_are_hidden_from_scan() {
    let mut store = RecordStore::new();
    store.insert(Record::new(vec![Value::Int(1)], Meta::empty()));
    store.insert(Record::new(vec![Value::Int(2)], Meta::NOTDATA | Meta::MATCH));
    let visible: Vec<_> = store.iter_visible().collect();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].1.fields[0], Value::Int(1));
}

#[test]
fn set_field_maintains_backlinks() {
    let mut store = RecordStore::new();
    let child = store.insert(Record::new(vec![Value::Int(7)], Meta::empty()));
    let parent = store.insert(Record::new(vec![Value::Record(child)], Meta::empty()));
    assert_eq!(store.backlinks_of(child), &[parent]);

    store.set_field(parent, 0, Value::Null).unwrap();
    assert_eq!(store.backlinks_of(child), &[] as &[RecordId]);
}

#[test]
fn remove_clears_backlinks_and_reuses_slot() {
    let mut store = RecordStore::new();
    let child = store.insert(Record::new(vec![Value::Int(7)], Meta::empty()));
    let parent = store.insert(Record::new(vec![Value::Record(child)], Meta::empty()));
    store.remove(parent);
    assert!(store.backlinks_of(child).is_empty());
    assert!(store.get(parent).is_none());

    let reused = store.insert(Record::new(vec![Value::Int(0)], Meta::empty()));
    assert_eq!(reused, parent);
}
