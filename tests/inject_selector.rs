//! Tests for `inject_selector` and `inject_selector_with`.

use proptest::prelude::*;
use reactive_state_bridge::{
    inject_redux_context, inject_selector, inject_selector_with, provide_redux, shallow_equal,
    ReadSignal, Scope, Store, Subscription,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug)]
struct NormalState {
    count: i32,
}

type NormalStore = Store<NormalState, ()>;

fn normal_store() -> Rc<NormalStore> {
    Rc::new(Store::new(
        |state: &Rc<NormalState>, _: &()| {
            Rc::new(NormalState {
                count: state.count + 1,
            })
        },
        NormalState { count: 0 },
    ))
}

/// Records every value a signal takes, including the initial one,
/// the way a rendering effect would.
fn record<T: Clone + 'static>(signal: &ReadSignal<T>) -> Rc<RefCell<Vec<T>>> {
    let rendered = Rc::new(RefCell::new(vec![signal.get()]));
    let rendered_copy = rendered.clone();
    let signal_copy = signal.clone();
    signal.subscribe(move || rendered_copy.borrow_mut().push(signal_copy.get()));
    rendered
}

// ============================================================================
// Core subscription behaviour
// ============================================================================

#[test]
fn selects_the_state_on_creation() {
    let app = Scope::root();
    provide_redux(&app, normal_store()).unwrap();

    let count = inject_selector::<NormalStore, _, _>(&app, |s: &NormalState| s.count).unwrap();

    assert_eq!("Count: 0", format!("Count: {}", count.get()));
}

#[test]
fn updates_when_the_store_updates() {
    let app = Scope::root();
    let store = normal_store();
    provide_redux(&app, store.clone()).unwrap();

    let calls = Rc::new(RefCell::new(0));
    let calls_copy = calls.clone();
    let count = inject_selector::<NormalStore, _, _>(&app, move |s: &NormalState| {
        *calls_copy.borrow_mut() += 1;
        s.count
    })
    .unwrap();
    assert_eq!(1, *calls.borrow());

    store.dispatch(());

    assert_eq!("Count: 1", format!("Count: {}", count.get()));
    assert_eq!(2, *calls.borrow());
}

#[test]
fn always_uses_the_latest_state() {
    let store: Rc<Store<i32, ()>> = Rc::new(Store::new(|c: &Rc<i32>, _: &()| Rc::new(**c + 1), -1));
    let app = Scope::root();
    provide_redux(&app, store.clone()).unwrap();

    let value = inject_selector::<Store<i32, ()>, _, _>(&app, |c: &i32| c + 1).unwrap();
    let rendered = record(&value);
    assert_eq!(vec![0], *rendered.borrow());

    store.dispatch(());
    assert_eq!(vec![0, 1], *rendered.borrow());
}

#[test]
fn scenario_increment_by_one() {
    let store: Rc<Store<i32, ()>> = Rc::new(Store::new(|c: &Rc<i32>, _: &()| Rc::new(**c + 1), 1));
    let app = Scope::root();
    provide_redux(&app, store.clone()).unwrap();

    let value = inject_selector::<Store<i32, ()>, _, _>(&app, |c: &i32| c + 1).unwrap();
    assert_eq!(2, value.get());

    store.dispatch(());
    assert_eq!(3, value.get());
}

// ============================================================================
// Mount / unmount lifecycle
// ============================================================================

struct Child {
    scope: Scope,
    count: ReadSignal<i32>,
}

fn mount_child(parent: &Scope) -> Child {
    let scope = parent.child();
    let count = inject_selector::<NormalStore, _, _>(&scope, |s: &NormalState| s.count).unwrap();
    Child { scope, count }
}

struct Parent {
    subscription: Subscription,
    child: Rc<RefCell<Option<Child>>>,
}

/// A parent component whose template shows a child only while
/// `count == mount_when`.
fn mount_parent(app: &Scope, mount_when: i32) -> Parent {
    let scope = app.child();
    let context = inject_redux_context::<NormalStore>(&scope, "mount_parent").unwrap();
    let count = inject_selector::<NormalStore, _, _>(&scope, |s: &NormalState| s.count).unwrap();
    let child: Rc<RefCell<Option<Child>>> = Rc::new(RefCell::new(None));

    let render = {
        let scope = scope.clone();
        let count = count.clone();
        let child = child.clone();
        move || {
            let show = count.get() == mount_when;
            let mounted = child.borrow().is_some();
            if show && !mounted {
                *child.borrow_mut() = Some(mount_child(&scope));
            } else if !show && mounted {
                let unmounted = child.borrow_mut().take();
                if let Some(unmounted) = unmounted {
                    unmounted.scope.destroy();
                }
            }
        }
    };
    render();
    count.subscribe(render);

    Parent {
        subscription: context.subscription().clone(),
        child,
    }
}

#[test]
fn subscribes_to_the_store_synchronously() {
    let app = Scope::root();
    let store = normal_store();
    provide_redux(&app, store.clone()).unwrap();

    let parent = mount_parent(&app, 1);
    // parent component only
    assert_eq!(1, parent.subscription.listener_count());

    store.dispatch(());

    // parent component + 1 child component
    assert_eq!(2, parent.subscription.listener_count());
    let child = parent.child.borrow();
    assert_eq!(1, child.as_ref().unwrap().count.get());
}

#[test]
fn unsubscribes_when_the_component_is_unmounted() {
    let app = Scope::root();
    let store = normal_store();
    provide_redux(&app, store.clone()).unwrap();

    let parent = mount_parent(&app, 0);
    assert_eq!(2, parent.subscription.listener_count());
    let child_count = parent.child.borrow().as_ref().unwrap().count.clone();

    store.dispatch(());

    assert_eq!(1, parent.subscription.listener_count());
    assert!(parent.child.borrow().is_none());
    // the unmounted child was skipped in the pass that removed it
    assert_eq!(0, child_count.get());
    assert_eq!(0, child_count.version());
}

#[test]
fn releasing_twice_does_not_double_count() {
    let app = Scope::root();
    let store = normal_store();
    let context = provide_redux(&app, store.clone()).unwrap();

    let first = app.child();
    let second = app.child();
    inject_selector::<NormalStore, _, _>(&first, |s: &NormalState| s.count).unwrap();
    inject_selector::<NormalStore, _, _>(&second, |s: &NormalState| s.count).unwrap();
    assert_eq!(2, context.subscription().listener_count());

    first.destroy();
    first.destroy();

    assert_eq!(1, context.subscription().listener_count());
    assert_eq!(1, store.listener_count());
}

// ============================================================================
// Performance optimisations and bail-outs
// ============================================================================

#[test]
fn defaults_to_ref_equality() {
    #[derive(Debug)]
    struct Unchanged;

    let store: Rc<Store<Unchanged, ()>> =
        Rc::new(Store::new(|s: &Rc<Unchanged>, _: &()| s.clone(), Unchanged));
    let app = Scope::root();
    provide_redux(&app, store.clone()).unwrap();

    let whole = store.clone();
    let value = inject_selector::<Store<Unchanged, ()>, _, _>(&app, move |_: &Unchanged| {
        whole.state()
    })
    .unwrap();
    let rendered = record(&value);

    store.dispatch(());

    assert_eq!(1, rendered.borrow().len());
}

#[test]
fn ref_equality_updates_on_new_allocation() {
    let app = Scope::root();
    let store = normal_store();
    provide_redux(&app, store.clone()).unwrap();

    let value =
        inject_selector::<NormalStore, _, _>(&app, |_: &NormalState| Rc::new(vec!["count"]))
            .unwrap();

    store.dispatch(());
    store.dispatch(());
    assert_eq!(2, value.version());
}

#[derive(Debug)]
struct Stable;

#[derive(Debug)]
struct StableState {
    count: i32,
    stable: Rc<Stable>,
}

impl StableState {
    fn keys(&self) -> Vec<&'static str> {
        vec!["count", "stable"]
    }
}

#[test]
fn allows_other_equality_functions_to_prevent_updates() {
    let store: Rc<Store<StableState, ()>> = Rc::new(Store::new(
        |s: &Rc<StableState>, _: &()| {
            Rc::new(StableState {
                count: s.count + 1,
                stable: s.stable.clone(),
            })
        },
        StableState {
            count: 0,
            stable: Rc::new(Stable),
        },
    ));
    let app = Scope::root();
    provide_redux(&app, store.clone()).unwrap();

    let first = app.child();
    let second = app.child();
    let keys = inject_selector_with::<Store<StableState, ()>, _, _, _>(
        &first,
        |s: &StableState| Rc::new(s.keys()),
        shallow_equal,
    )
    .unwrap();
    let stable = inject_selector_with::<Store<StableState, ()>, _, _, _>(
        &second,
        |s: &StableState| (s.stable.clone(), Rc::new(Stable)),
        |a: &(Rc<Stable>, Rc<Stable>), b: &(Rc<Stable>, Rc<Stable>)| Rc::ptr_eq(&a.0, &b.0),
    )
    .unwrap();
    let rendered_keys = record(&keys);
    let rendered_stable = record(&stable);

    store.dispatch(());
    store.dispatch(());

    assert_eq!(1, rendered_keys.borrow().len());
    assert_eq!(1, rendered_stable.borrow().len());
    assert_eq!(2, store.state().count);
}

#[test]
fn selector_runs_once_on_mount_and_once_per_update() {
    let app = Scope::root();
    let store = normal_store();
    provide_redux(&app, store.clone()).unwrap();

    let calls = Rc::new(RefCell::new(0));
    let calls_copy = calls.clone();
    let value = inject_selector::<NormalStore, _, _>(&app, move |_: &NormalState| {
        *calls_copy.borrow_mut() += 1;
        7
    })
    .unwrap();
    let rendered = record(&value);
    assert_eq!(1, *calls.borrow());

    store.dispatch(());

    assert_eq!(2, *calls.borrow());
    assert_eq!(1, rendered.borrow().len());
}

#[test]
fn panicking_selector_aborts_the_pass() {
    let app = Scope::root();
    let store = normal_store();
    let context = provide_redux(&app, store.clone()).unwrap();

    inject_selector::<NormalStore, _, _>(&app, |s: &NormalState| {
        if s.count == 1 {
            panic!("selector failed");
        }
        s.count
    })
    .unwrap();
    let later = inject_selector::<NormalStore, _, _>(&app, |s: &NormalState| s.count).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.dispatch(())));
    assert!(result.is_err());
    assert_eq!(0, later.get());
    assert!(context.subscription().is_subscribed());
    assert_eq!(2, context.subscription().listener_count());

    store.dispatch(());
    assert_eq!(2, later.get());
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug)]
struct Total {
    value: u32,
}

proptest! {
    #[test]
    fn updates_exactly_when_the_projection_changes(
        steps in proptest::collection::vec(0u32..4, 0..40)
    ) {
        let store: Rc<Store<Total, u32>> = Rc::new(Store::new(
            |s: &Rc<Total>, step: &u32| {
                if *step == 0 {
                    s.clone()
                } else {
                    Rc::new(Total { value: s.value + step })
                }
            },
            Total { value: 0 },
        ));
        let app = Scope::root();
        provide_redux(&app, store.clone()).unwrap();

        let projection = |s: &Total| s.value / 3;
        let value = inject_selector::<Store<Total, u32>, _, _>(&app, projection).unwrap();
        let rendered = record(&value);

        let mut expected = vec![0];
        let mut total = 0;
        for step in &steps {
            total += step;
            let next = total / 3;
            if *expected.last().unwrap() != next {
                expected.push(next);
            }
            store.dispatch(*step);
        }

        prop_assert_eq!(expected.clone(), rendered.borrow().clone());
        prop_assert_eq!((expected.len() - 1) as u64, value.version());
        prop_assert_eq!(total / 3, value.get());
    }
}
