use std::cmp::Ordering;

use proptest::prelude::*;

use super::compare;
use crate::value::Value;

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        any::<i32>().prop_map(Value::Date),
        any::<i32>().prop_map(Value::Time),
        "[a-z]{0,8}".prop_map(Value::str),
        any::<u32>().prop_map(Value::Var),
    ]
}

fn flip(o: Ordering) -> Ordering {
    match o {
        Ordering::Less => Ordering::Greater,
        Ordering::Greater => Ordering::Less,
        Ordering::Equal => Ordering::Equal,
    }
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in arb_value(), b in arb_value()) {
        prop_assert_eq!(compare(&a, &b, None), flip(compare(&b, &a, None)));
    }

    #[test]
    fn compare_is_transitive(a in arb_value(), b in arb_value(), c in arb_value()) {
        if compare(&a, &b, None) == Ordering::Less && compare(&b, &c, None) == Ordering::Less {
            prop_assert_eq!(compare(&a, &c, None), Ordering::Less);
        }
    }

    #[test]
    fn compare_is_reflexive(a in arb_value()) {
        prop_assert_eq!(compare(&a, &a, None), Ordering::Equal);
    }
}

#[test]
fn different_types_order_by_type_rank_not_payload() {
    // An Int and a Str never compare equal even with "matching" payloads,
    // and the ordering is consistent both ways (spec.md §4.1 step 2).
    let i = Value::Int(0);
    let s = Value::str("");
    assert_eq!(compare(&i, &s, None), Ordering::Less);
    assert_eq!(compare(&s, &i, None), Ordering::Greater);
}

#[test]
fn uri_missing_prefix_sorts_before_any_prefix() {
    let bare = Value::Uri {
        value: "x".into(),
        prefix: None,
    };
    let prefixed = Value::Uri {
        value: "x".into(),
        prefix: Some("ns".into()),
    };
    assert_eq!(compare(&bare, &prefixed, None), Ordering::Less);
}

#[test]
fn blobs_compare_by_shared_prefix_bytes_before_length() {
    // spec.md §4.1 step 3: memcmp over the shared prefix first, length
    // only breaks a tie over that prefix.
    let shorter_but_greater = Value::Blob {
        bytes: vec![2],
        type_tag: None,
    };
    let longer_but_lesser = Value::Blob {
        bytes: vec![1, 1],
        type_tag: None,
    };
    assert_eq!(compare(&shorter_but_greater, &longer_but_lesser, None), Ordering::Greater);
}

#[test]
fn blobs_with_equal_shared_prefix_break_the_tie_on_length() {
    let short = Value::Blob {
        bytes: vec![9, 9],
        type_tag: None,
    };
    let long = Value::Blob {
        bytes: vec![9, 9, 0],
        type_tag: None,
    };
    assert_eq!(compare(&short, &long, None), Ordering::Less);
}

#[test]
fn uri_missing_prefix_equals_an_empty_prefix() {
    let bare = Value::Uri {
        value: "x".into(),
        prefix: None,
    };
    let empty = Value::Uri {
        value: "x".into(),
        prefix: Some(String::new()),
    };
    assert_eq!(compare(&bare, &empty, None), Ordering::Equal);
}
