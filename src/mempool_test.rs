use super::*;

fn rid(n: u32) -> RecordId {
    RecordId(n)
}

#[test]
fn empty_set_fetches_nothing() {
    let set = ResultSet::new();
    let mut pos = set.start();
    assert_eq!(set.fetch(&mut pos), None);
    assert!(set.is_empty());
}

#[test]
fn push_and_fetch_preserve_order_across_a_page_boundary() {
    let mut set = ResultSet::new();
    let total = QUERY_PAGE_SIZE * 2 + 3;
    for i in 0..total {
        set.push(rid(i as u32));
    }
    assert_eq!(set.len(), total);

    let mut pos = set.start();
    for i in 0..total {
        assert_eq!(set.fetch(&mut pos), Some(rid(i as u32)));
    }
    assert_eq!(set.fetch(&mut pos), None);
}

#[test]
fn two_cursors_over_the_same_set_are_independent() {
    let mut set = ResultSet::new();
    for i in 0..5 {
        set.push(rid(i));
    }

    let mut a = set.start();
    let mut b = set.start();
    assert_eq!(set.fetch(&mut a), Some(rid(0)));
    assert_eq!(set.fetch(&mut a), Some(rid(1)));
    assert_eq!(set.fetch(&mut b), Some(rid(0)));
}

#[test]
fn rewinding_to_start_replays_without_reallocating_pages() {
    let mut set = ResultSet::new();
    for i in 0..5 {
        set.push(rid(i));
    }

    let mut pos = set.start();
    while set.fetch(&mut pos).is_some() {}

    pos = set.start();
    assert_eq!(set.fetch(&mut pos), Some(rid(0)));
}
