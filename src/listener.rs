use std::{cell::RefCell, fmt::Debug, rc::Rc};

/// A wrapper for a zero-argument callback which is notified when
/// something it listens to has changed. Listeners read whatever they
/// need (store state, signal value) themselves.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    pub fn new<C: Fn() + 'static>(closure: C) -> Self {
        Callback(Rc::new(closure))
    }

    pub fn emit(&self) {
        (self.0)()
    }

    /// Returns `true` if both callbacks wrap the same closure.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback(@ {:p})", Rc::as_ptr(&self.0))
    }
}

impl<C> From<C> for Callback
where
    C: Fn() + 'static,
{
    fn from(closure: C) -> Self {
        Callback(Rc::new(closure))
    }
}

#[cfg(feature = "yew")]
impl From<yew::Callback<()>> for Callback {
    fn from(yew_callback: yew::Callback<()>) -> Self {
        Callback(Rc::new(move || {
            yew_callback.emit(());
        }))
    }
}

/// Identifies one registration in a [ListenerSet]. Keys are never
/// reused, so removing with a stale key is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    index: usize,
    generation: u64,
}

struct Entry {
    callback: Callback,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

/// Slots form a doubly linked list threaded through a vector, so
/// insertion at the tail and removal by key are both O(1), while
/// iteration from `head` yields registration order.
#[derive(Default)]
struct Slots {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    next_generation: u64,
}

impl Slots {
    fn insert(&mut self, callback: Callback) -> ListenerKey {
        self.next_generation += 1;
        let generation = self.next_generation;
        let entry = Entry {
            callback,
            prev: self.tail,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Slot {
                    generation,
                    entry: Some(entry),
                };
                index
            }
            None => {
                self.slots.push(Slot {
                    generation,
                    entry: Some(entry),
                });
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_entry) = self.slots[tail].entry.as_mut() {
                    tail_entry.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        ListenerKey { index, generation }
    }

    fn contains(&self, key: ListenerKey) -> bool {
        match self.slots.get(key.index) {
            Some(slot) => slot.generation == key.generation && slot.entry.is_some(),
            None => false,
        }
    }

    fn remove(&mut self, key: ListenerKey) -> bool {
        if !self.contains(key) {
            return false;
        }

        let entry = match self.slots[key.index].entry.take() {
            Some(entry) => entry,
            None => return false,
        };

        match entry.prev {
            Some(prev) => {
                if let Some(prev_entry) = self.slots[prev].entry.as_mut() {
                    prev_entry.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(next_entry) = self.slots[next].entry.as_mut() {
                    next_entry.prev = entry.prev;
                }
            }
            None => self.tail = entry.prev,
        }

        self.free.push(key.index);
        self.len -= 1;
        true
    }

    fn snapshot(&self) -> Vec<(ListenerKey, Callback)> {
        let mut snapshot = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let slot = &self.slots[index];
            match &slot.entry {
                Some(entry) => {
                    snapshot.push((
                        ListenerKey {
                            index,
                            generation: slot.generation,
                        },
                        entry.callback.clone(),
                    ));
                    cursor = entry.next;
                }
                None => break,
            }
        }
        snapshot
    }
}

/// An ordered collection of [Callback]s which may be mutated while
/// it is being notified.
///
/// [ListenerSet::notify()] works on a snapshot taken when the pass
/// starts: a listener added during the pass is first called on the
/// next pass, and a listener removed during the pass is skipped if it
/// has not been reached yet. No borrow is held while a callback runs,
/// so callbacks may freely subscribe and unsubscribe, and a panicking
/// callback leaves the set usable.
#[derive(Default)]
pub struct ListenerSet {
    slots: RefCell<Slots>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the end of the set.
    pub fn subscribe<C: Into<Callback>>(&self, callback: C) -> ListenerKey {
        self.slots.borrow_mut().insert(callback.into())
    }

    /// Remove the listener registered under `key`. Returns `false` if
    /// it was already removed; calling this more than once is safe.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.slots.borrow_mut().remove(key)
    }

    pub fn contains(&self, key: ListenerKey) -> bool {
        self.slots.borrow().contains(key)
    }

    /// Invoke every registered listener in registration order.
    pub fn notify(&self) {
        for (key, callback) in self.snapshot() {
            if self.contains(key) {
                callback.emit();
            }
        }
    }

    /// The registered listeners with their keys, in registration
    /// order. A key may be checked with [ListenerSet::contains()]
    /// before its callback is run later.
    pub(crate) fn snapshot(&self) -> Vec<(ListenerKey, Callback)> {
        self.slots.borrow().snapshot()
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut slots = self.slots.borrow_mut();
        let next_generation = slots.next_generation;
        *slots = Slots {
            next_generation,
            ..Slots::default()
        };
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The currently registered listeners, in registration order.
    pub fn listeners(&self) -> Vec<Callback> {
        self.slots
            .borrow()
            .snapshot()
            .into_iter()
            .map(|(_, callback)| callback)
            .collect()
    }
}

impl Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListenerSet {{ len: {} }}", self.len())
    }
}
