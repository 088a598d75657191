use crate::{Callback, ListenerSet, Reducer};
use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
};

/// An owned one-shot closure that removes a store subscription when
/// called.
pub type Unsubscribe = Box<dyn FnOnce()>;

/// The surface of a global state store which the bindings in this
/// crate rely upon. Nothing else about the store (how actions are
/// reduced, middleware, action shape) is assumed.
pub trait ObservableStore: 'static {
    type State: 'static;
    type Action: 'static;

    /// The current state of the store.
    fn state(&self) -> Rc<Self::State>;

    /// Submit an `Action` to the store. Subscribers are notified
    /// synchronously before this returns.
    fn dispatch(&self, action: Self::Action);

    /// Register a listener which is called after every dispatch.
    fn subscribe(&self, listener: Callback) -> Unsubscribe;
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application.
///
/// The current state of this store ([Store::state()]()) can only be
/// modified by dispatching an `Action` via [Store::dispatch()] to the
/// store. These actions are taken by a [Reducer] which you provided
/// to the store (at construction) and a new current state is
/// produced. The previous state is never mutated, and remains as a
/// reference for any element of your application which may rely upon
/// it.
///
/// Listeners subscribed with
/// [ObservableStore::subscribe()](ObservableStore::subscribe()) are
/// notified after every action, whether or not the state changed.
pub struct Store<State, Action> {
    /// This lock is used to prevent dispatch recursion.
    dispatch_lock: RefCell<()>,
    /// Queue of actions to be dispatched by [Store::dispatch()].
    dispatch_queue: RefCell<VecDeque<Action>>,
    /// The [Reducer] for this store, which takes `Actions` and
    /// produces the next `State`.
    reducer: Box<dyn Reducer<State, Action>>,
    /// The current state of this store.
    state: RefCell<Rc<State>>,
    /// Shared with the [Unsubscribe] closures handed out by
    /// [ObservableStore::subscribe()].
    listeners: Rc<ListenerSet>,
}

impl<State, Action> Store<State, Action> {
    /// Create a new [Store], which uses the specified `reducer` to
    /// handle `Action`s, and with the `initial_state`.
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self {
            dispatch_lock: RefCell::new(()),
            dispatch_queue: RefCell::new(VecDeque::new()),
            reducer: Box::new(reducer),
            state: RefCell::new(Rc::new(initial_state)),
            listeners: Rc::new(ListenerSet::new()),
        }
    }

    /// Get the current `State` stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an `Action` to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Rc<State> {
        self.state.borrow().clone()
    }

    /// Dispatch an `Action` to be passed to the [Reducer] in order to
    /// produce the next `State`, then notify the store listeners.
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        self.dispatch_impl(action.into());
    }

    /// Concrete version of [Store::dispatch()], for code size
    /// reduction purposes, to avoid generating multiple versions of
    /// this function per action that implements `Into<Action>`.
    fn dispatch_impl(&self, action: Action) {
        self.dispatch_queue.borrow_mut().push_back(action);

        // If the lock fails to acquire, then the dispatch is already in progress.
        // This prevents recursion, when a listener callback also triggers another
        // dispatch; the queued action runs once the current one has finished
        // notifying.
        if let Ok(_lock) = self.dispatch_lock.try_borrow_mut() {
            let _discard = DiscardQueueOnUnwind(&self.dispatch_queue);
            loop {
                let dispatch_action = self.dispatch_queue.borrow_mut().pop_front();

                match dispatch_action {
                    Some(action) => {
                        let next_state = self.reducer.reduce(&self.state(), &action);
                        *self.state.borrow_mut() = next_state;
                        self.listeners.notify();
                    }
                    None => {
                        break;
                    }
                }
            }
        }
    }

    /// The number of listeners currently subscribed to this store.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Drops the actions still queued if a reducer or listener panics
/// partway through [Store::dispatch()], so they are not run by the
/// next, unrelated dispatch.
struct DiscardQueueOnUnwind<'a, Action>(&'a RefCell<VecDeque<Action>>);

impl<Action> Drop for DiscardQueueOnUnwind<'_, Action> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if let Ok(mut queue) = self.0.try_borrow_mut() {
                queue.clear();
            }
        }
    }
}

impl<State, Action> std::fmt::Debug for Store<State, Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store<{}, {}> @ {:p}",
            std::any::type_name::<State>(),
            std::any::type_name::<Action>(),
            self as *const Self
        )
    }
}

impl<State: 'static, Action: 'static> ObservableStore for Store<State, Action> {
    type State = State;
    type Action = Action;

    fn state(&self) -> Rc<State> {
        Store::state(self)
    }

    fn dispatch(&self, action: Action) {
        self.dispatch_impl(action);
    }

    fn subscribe(&self, listener: Callback) -> Unsubscribe {
        let key = self.listeners.subscribe(listener);
        let listeners: Weak<ListenerSet> = Rc::downgrade(&self.listeners);

        Box::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.unsubscribe(key);
            }
        })
    }
}
