use super::*;

#[test]
fn reuses_removed_slots() {
    let mut slab: Slab<i32> = Slab::new();
    let a = slab.insert(1);
    let b = slab.insert(2);
    slab.remove(a);
    let c = slab.insert(3);
    assert_eq!(a, c);
    assert_eq!(slab.get(b), Some(&2));
    assert_eq!(slab.len(), 2);
}
