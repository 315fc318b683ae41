//! Algebraic laws of the list CRDT

use proptest::prelude::*;
use shopring_consistency::PnCounterMap;

#[derive(Clone, Debug)]
enum Op {
    Increment(usize, usize, u64),
    Decrement(usize, usize, u64),
    Remove(usize, usize),
    Set(usize, usize, u64),
}

const ITEMS: [&str; 4] = ["milk", "bread", "eggs", "rice"];
const ACTORS: [&str; 3] = ["alice", "bob", "carol"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ITEMS.len(), 0..ACTORS.len(), 1u64..20).prop_map(|(i, a, n)| Op::Increment(i, a, n)),
        (0..ITEMS.len(), 0..ACTORS.len(), 1u64..20).prop_map(|(i, a, n)| Op::Decrement(i, a, n)),
        (0..ITEMS.len(), 0..ACTORS.len()).prop_map(|(i, a)| Op::Remove(i, a)),
        (0..ITEMS.len(), 0..ACTORS.len(), 0u64..20).prop_map(|(i, a, n)| Op::Set(i, a, n)),
    ]
}

fn list() -> impl Strategy<Value = PnCounterMap> {
    prop::collection::vec(op(), 0..24).prop_map(|ops| {
        let mut list = PnCounterMap::new();
        for op in ops {
            match op {
                Op::Increment(i, a, n) => list.increment(ITEMS[i], ACTORS[a], n),
                Op::Decrement(i, a, n) => list.decrement(ITEMS[i], ACTORS[a], n),
                Op::Remove(i, a) => list.remove(ITEMS[i], ACTORS[a]),
                Op::Set(i, a, n) => list.set(ITEMS[i], ACTORS[a], n),
            }
        }
        list
    })
}

proptest! {
    #[test]
    fn merge_is_commutative(a in list(), b in list()) {
        prop_assert_eq!(a.merge(&b), b.merge(&a));
    }

    #[test]
    fn merge_is_associative(a in list(), b in list(), c in list()) {
        prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn merge_is_idempotent(a in list()) {
        prop_assert_eq!(a.merge(&a), a.clone());
    }

    #[test]
    fn merge_absorbs_own_history(a in list(), ops in prop::collection::vec(op(), 0..8)) {
        let mut later = a.clone();
        for op in ops {
            match op {
                Op::Increment(i, x, n) => later.increment(ITEMS[i], ACTORS[x], n),
                Op::Decrement(i, x, n) => later.decrement(ITEMS[i], ACTORS[x], n),
                Op::Remove(i, x) => later.remove(ITEMS[i], ACTORS[x]),
                Op::Set(i, x, n) => later.set(ITEMS[i], ACTORS[x], n),
            }
        }
        prop_assert_eq!(later.merge(&a), later.clone());
    }

    #[test]
    fn set_reaches_requested_quantity(a in list(), item in 0..ITEMS.len(), qty in 0u64..50) {
        let mut list = a.clone();
        list.set(ITEMS[item], "dave", qty);
        prop_assert_eq!(list.value(ITEMS[item]), qty as i64);
    }

    #[test]
    fn json_preserves_state(a in list()) {
        let json = a.to_json().unwrap();
        prop_assert_eq!(PnCounterMap::from_json(&json).unwrap(), a);
    }
}
