use super::*;
use crate::record::Meta;

fn rec(fields: Vec<Value>) -> Record {
    Record::new(fields, Meta::empty())
}

#[test]
fn wildcard_matches_any_value_fixed_position_must_agree() {
    // {_, 5, _}
    let template = Template::new(vec![Value::Var(0), Value::Int(5), Value::Var(1)]);
    assert!(template.matches(&rec(vec![Value::Int(1), Value::Int(5), Value::str("x")])));
    assert!(!template.matches(&rec(vec![Value::Int(1), Value::Int(6), Value::str("x")])));
}

#[test]
fn length_mismatch_never_matches() {
    let template = Template::new(vec![Value::Var(0), Value::Int(5)]);
    assert!(!template.matches(&rec(vec![Value::Int(1), Value::Int(5), Value::Int(9)])));
}

#[test]
fn fixed_count_ignores_wildcards() {
    let template = Template::new(vec![Value::Var(0), Value::Int(5), Value::Int(6)]);
    assert_eq!(template.fixed_count(), 2);
}

#[test]
fn intern_deduplicates_structurally_identical_templates_and_refcounts() {
    let mut store = TemplateStore::new();
    let a = store.intern(vec![Value::Var(0), Value::Int(5)]);
    let b = store.intern(vec![Value::Var(0), Value::Int(5)]);
    assert_eq!(a, b);
    assert_eq!(store.refcount(a), 2);

    let c = store.intern(vec![Value::Var(0), Value::Int(6)]);
    assert_ne!(a, c);
}

#[test]
fn release_frees_template_once_refcount_reaches_zero() {
    let mut store = TemplateStore::new();
    let id = store.intern(vec![Value::Int(1)]);
    store.intern(vec![Value::Int(1)]);
    assert_eq!(store.refcount(id), 2);

    assert!(!store.release(id));
    assert!(store.get(id).is_some());
    assert!(store.release(id));
    assert!(store.get(id).is_none());
}
