use std::rc::Rc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an `Action` submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce the next
/// `State` of the store.
///
/// The previous state is never mutated. Returning the same `Rc` that
/// was passed in signals that nothing changed, which lets selectors
/// that return the whole state (or an `Rc` inside it) skip updates.
///
/// Any `Fn(&Rc<State>, &Action) -> Rc<State>` closure is a reducer.
pub trait Reducer<State, Action> {
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(&Rc<State>, &Action) -> Rc<State>,
{
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State> {
        (self)(prev_state, action)
    }
}
