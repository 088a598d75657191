//! Accessors which read the nearest [ReduxContext](crate::ReduxContext)
//! out of a [Scope] on behalf of a consumer.
//!
//! [inject_selector()] binds a projection of the store state to a
//! [ReadSignal]. The signal is seeded with the projection of the
//! current state and written to only when a later projection differs
//! according to the binder's [EqualityFn]. The binder's listener is
//! released when the scope is destroyed.

use crate::{
    equality::ref_equality,
    error::Result,
    provider::inject_redux_context,
    EqualityFn, ObservableStore, ReadSignal, Scope, Signal, StrictEq,
};
use std::{fmt::Debug, marker::PhantomData, rc::Rc};

/// Bind `selector` to a signal, using [ref_equality()] to suppress
/// updates.
pub fn inject_selector<St, Selected, F>(scope: &Scope, selector: F) -> Result<ReadSignal<Selected>>
where
    St: ObservableStore,
    Selected: StrictEq + 'static,
    F: Fn(&St::State) -> Selected + 'static,
{
    bind::<St, Selected, F, _>(scope, "inject_selector", selector, ref_equality::<Selected>)
}

/// Bind `selector` to a signal, using `equality` (any [EqualityFn],
/// such as [shallow_equal()](crate::shallow_equal())) to decide
/// whether a newly selected value replaces the current one.
pub fn inject_selector_with<St, Selected, F, E>(
    scope: &Scope,
    selector: F,
    equality: E,
) -> Result<ReadSignal<Selected>>
where
    St: ObservableStore,
    Selected: 'static,
    F: Fn(&St::State) -> Selected + 'static,
    E: Fn(&Selected, &Selected) -> bool + 'static,
{
    bind::<St, Selected, F, E>(scope, "inject_selector_with", selector, equality)
}

fn bind<St, Selected, F, E>(
    scope: &Scope,
    accessor: &'static str,
    selector: F,
    equality: E,
) -> Result<ReadSignal<Selected>>
where
    St: ObservableStore,
    Selected: 'static,
    F: Fn(&St::State) -> Selected + 'static,
    E: EqualityFn<Selected> + 'static,
{
    let context = inject_redux_context::<St>(scope, accessor)?;
    let store = context.store().clone();

    let selected = Signal::new(selector(&*store.state()));
    let cell = selected.clone();

    let handle = context.subscription().add_nested_sub(move || {
        let next = selector(&*store.state());
        if cell.with(|current| equality(current, &next)) {
            return;
        }
        cell.set(next);
    });

    scope.on_destroy(move || handle.unsubscribe());

    Ok(selected.read_only())
}

/// A handle which dispatches actions into the store of the
/// [ReduxContext](crate::ReduxContext) it was injected from.
pub struct Dispatch<St>(Rc<St>);

impl<St> Clone for Dispatch<St> {
    fn clone(&self) -> Self {
        Dispatch(self.0.clone())
    }
}

impl<St: ObservableStore> Dispatch<St> {
    pub fn dispatch<A: Into<St::Action>>(&self, action: A) {
        self.0.dispatch(action.into());
    }

    /// Returns `true` if this handle dispatches into `store`.
    pub fn is_for(&self, store: &Rc<St>) -> bool {
        Rc::ptr_eq(&self.0, store)
    }
}

impl<St> Debug for Dispatch<St> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dispatch(store @ {:p})", Rc::as_ptr(&self.0))
    }
}

/// The dispatch handle of the nearest store.
pub fn inject_dispatch<St: ObservableStore>(scope: &Scope) -> Result<Dispatch<St>> {
    let context = inject_redux_context::<St>(scope, "inject_dispatch")?;
    Ok(Dispatch(context.store().clone()))
}

/// The nearest store itself.
pub fn inject_store<St: ObservableStore>(scope: &Scope) -> Result<Rc<St>> {
    let context = inject_redux_context::<St>(scope, "inject_store")?;
    Ok(context.store().clone())
}

/// The accessors of this module with the store type fixed once, so
/// call sites do not need to name it.
///
/// ```
/// use reactive_state_bridge::{provide_redux, Inject, Scope, Store};
/// use std::rc::Rc;
///
/// type AppStore = Store<i32, ()>;
/// const APP: Inject<AppStore> = Inject::with_types();
///
/// let scope = Scope::root();
/// let store: Rc<AppStore> = Rc::new(Store::new(|s: &Rc<i32>, _: &()| Rc::new(**s + 1), 0));
/// provide_redux(&scope, store).unwrap();
///
/// let count = APP.selector(&scope, |state: &i32| *state).unwrap();
/// APP.dispatch(&scope).unwrap().dispatch(());
/// assert_eq!(1, count.get());
/// ```
pub struct Inject<St>(PhantomData<fn() -> St>);

impl<St> Clone for Inject<St> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<St> Copy for Inject<St> {}

impl<St> Inject<St> {
    pub const fn with_types() -> Self {
        Inject(PhantomData)
    }
}

impl<St: ObservableStore> Inject<St> {
    pub fn selector<Selected, F>(&self, scope: &Scope, selector: F) -> Result<ReadSignal<Selected>>
    where
        Selected: StrictEq + 'static,
        F: Fn(&St::State) -> Selected + 'static,
    {
        inject_selector::<St, Selected, F>(scope, selector)
    }

    pub fn selector_with<Selected, F, E>(
        &self,
        scope: &Scope,
        selector: F,
        equality: E,
    ) -> Result<ReadSignal<Selected>>
    where
        Selected: 'static,
        F: Fn(&St::State) -> Selected + 'static,
        E: Fn(&Selected, &Selected) -> bool + 'static,
    {
        inject_selector_with::<St, Selected, F, E>(scope, selector, equality)
    }

    pub fn dispatch(&self, scope: &Scope) -> Result<Dispatch<St>> {
        inject_dispatch::<St>(scope)
    }

    pub fn store(&self, scope: &Scope) -> Result<Rc<St>> {
        inject_store::<St>(scope)
    }
}
