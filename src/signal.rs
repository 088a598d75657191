use crate::{Callback, ListenerKey, ListenerSet};
use std::{
    cell::{Cell, Ref, RefCell},
    fmt::Debug,
    rc::Rc,
};

struct SignalInner<T> {
    value: RefCell<T>,
    /// Bumped once per [Signal::set()].
    version: Cell<u64>,
    observers: ListenerSet,
}

/// A reactive cell: a shared value which notifies its observers
/// every time a new value is written to it.
///
/// Cloning a `Signal` creates a new handle to the same cell.
/// Observers are plain [Callback]s which read the cell themselves;
/// a rendering layer subscribes here to learn what to redraw.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                observers: ListenerSet::new(),
            }),
        }
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Borrow the current value. The borrow must be released before
    /// the signal is written to.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    /// Replace the value and notify every observer.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.observers.notify();
    }

    /// Modify the value in place and notify every observer.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.observers.notify();
    }

    /// The number of writes this cell has seen since it was created.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscribe<C: Into<Callback>>(&self, observer: C) -> ListenerKey {
        self.inner.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.inner.observers.unsubscribe(key)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// A handle to this cell which cannot write to it.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal(self.clone())
    }

    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Signal<T> {
    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: Debug> Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

/// The read half of a [Signal], handed out to consumers of selected
/// values.
pub struct ReadSignal<T>(Signal<T>);

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        ReadSignal(self.0.clone())
    }
}

impl<T> ReadSignal<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn version(&self) -> u64 {
        self.0.version()
    }

    pub fn subscribe<C: Into<Callback>>(&self, observer: C) -> ListenerKey {
        self.0.subscribe(observer)
    }

    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.0.unsubscribe(key)
    }

    pub fn observer_count(&self) -> usize {
        self.0.observer_count()
    }

    pub fn ptr_eq(&self, other: &ReadSignal<T>) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl<T: Clone> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.0.get()
    }
}

impl<T: Debug> Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
