use proptest::prelude::*;
use reactive_state_bridge::{impl_shallow_eq, ref_equality, shallow_equal, SameValue};
use std::{collections::BTreeMap, rc::Rc};

#[derive(Debug, Clone)]
struct Point {
    x: f64,
    label: String,
}

impl_shallow_eq!(Point { x, label });

fn any_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<f64>(),
        Just(f64::NAN),
        Just(0.0),
        Just(-0.0),
        Just(f64::INFINITY),
    ]
}

proptest! {
    #[test]
    fn shallow_equal_is_reflexive(values in proptest::collection::vec(any_f64(), 0..16)) {
        prop_assert!(shallow_equal(&values, &values.clone()));
    }

    #[test]
    fn shallow_equal_is_symmetric(
        a in proptest::collection::vec(0i32..3, 0..6),
        b in proptest::collection::vec(0i32..3, 0..6),
    ) {
        prop_assert_eq!(shallow_equal(&a, &b), shallow_equal(&b, &a));
    }

    #[test]
    fn shallow_equal_matches_same_value_per_entry(
        entries in proptest::collection::btree_map(0u8..8, any_f64(), 0..8),
        flip in 0u8..8,
    ) {
        let mut other = entries.clone();
        if let Some(value) = other.get_mut(&flip) {
            *value = -*value;
        }
        let expected = entries
            .iter()
            .all(|(key, value)| other.get(key).map_or(false, |o| value.same_value(o)));
        prop_assert_eq!(expected, shallow_equal(&entries, &other));
    }

    #[test]
    fn derived_shallow_eq_compares_fields(x in any_f64(), label in "[a-z]{0,4}") {
        let a = Point { x, label: label.clone() };
        let b = Point { x, label };
        prop_assert!(shallow_equal(&a, &b));
        prop_assert!(shallow_equal(&Rc::new(a), &Rc::new(b)));
    }
}

#[test]
fn nan_and_signed_zero() {
    assert!(shallow_equal(&vec![f64::NAN], &vec![f64::NAN]));
    assert!(!shallow_equal(&vec![0.0], &vec![-0.0]));

    // strict equality keeps `===` semantics for the defaults
    assert!(!ref_equality(&f64::NAN, &f64::NAN));
    assert!(ref_equality(&0.0, &-0.0));
}

#[test]
fn extra_keys_are_not_equal() {
    let mut a = BTreeMap::new();
    a.insert("a", 1);
    let mut b = a.clone();
    b.insert("b", 2);
    assert!(!shallow_equal(&a, &b));
    assert!(!shallow_equal(&b, &a));
}

#[test]
fn nested_values_compare_by_reference() {
    let inner = Rc::new(vec![1]);
    let a = vec![inner.clone()];
    let b = vec![inner];
    let c = vec![Rc::new(vec![1])];
    assert!(shallow_equal(&a, &b));
    assert!(!shallow_equal(&a, &c));
}
