//! The nested subscription tree.
//!
//! A [Subscription] is one node of a tree whose root is attached to
//! an [ObservableStore]. Every node owns a [ListenerSet] of direct
//! listeners and an ordered list of child nodes. When the store
//! changes, [Subscription::notify_nested_subs()] runs a node's own
//! listeners to completion before descending into its children, in
//! the order the children were created. A listener on a parent node
//! can therefore unmount whatever is subscribed below it before those
//! subscriptions are evaluated. Anything it mounts below waits for the
//! next notification.
//!
//! # Lifecycle
//!
//! Each node is in one of three [SubscriptionState]s. The store
//! subscription is opened lazily when the first listener anywhere in
//! the tree is added, and closed again when the last one is released.
//! A non-root node which loses its last listener (and has no children)
//! is detached from its parent; adding a listener re-attaches it.

use crate::{Callback, ListenerKey, ListenerSet, ObservableStore, Unsubscribe};
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::{Rc, Weak},
};

/// Opens the store subscription for a root node.
type StoreSource = Box<dyn Fn(Callback) -> Unsubscribe>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No active subscription. Listeners may be registered.
    Unsubscribed,
    /// Notifications flow through this node.
    Subscribed,
    /// Terminal. Every further operation is a no-op.
    Destroyed,
}

struct SubscriptionInner {
    /// Present on the root node only.
    source: Option<StoreSource>,
    parent: Option<Weak<SubscriptionInner>>,
    state: Cell<SubscriptionState>,
    listeners: ListenerSet,
    children: RefCell<Vec<Subscription>>,
    /// Whether this node is currently in its parent's child list.
    attached: Cell<bool>,
    /// Position among the siblings created by the same parent.
    order: u64,
    next_child_order: Cell<u64>,
    store_unsubscribe: RefCell<Option<Unsubscribe>>,
    /// Invoked by the store subscription of the root node.
    on_state_change: RefCell<Option<Callback>>,
}

/// A node in the nested subscription tree. Cloning it creates a new
/// handle to the same node.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

impl Subscription {
    /// Create a root node which subscribes to `store` once a listener
    /// is added somewhere in its tree.
    pub fn new<St: ObservableStore>(store: Rc<St>) -> Self {
        let source: StoreSource = Box::new(move |callback| store.subscribe(callback));
        Self::from_inner(Some(source), None, 0)
    }

    fn from_inner(
        source: Option<StoreSource>,
        parent: Option<Weak<SubscriptionInner>>,
        order: u64,
    ) -> Self {
        Subscription {
            inner: Rc::new(SubscriptionInner {
                source,
                parent,
                state: Cell::new(SubscriptionState::Unsubscribed),
                listeners: ListenerSet::new(),
                children: RefCell::new(Vec::new()),
                attached: Cell::new(false),
                order,
                next_child_order: Cell::new(0),
                store_unsubscribe: RefCell::new(None),
                on_state_change: RefCell::new(None),
            }),
        }
    }

    /// Create a child node. It joins this node's child list when its
    /// first listener is added, ahead of any sibling created after it.
    pub fn create_child(&self) -> Subscription {
        let order = self.inner.next_child_order.get();
        self.inner.next_child_order.set(order + 1);
        Self::from_inner(None, Some(Rc::downgrade(&self.inner)), order)
    }

    fn parent(&self) -> Option<Subscription> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Subscription { inner })
    }

    pub fn state(&self) -> SubscriptionState {
        self.inner.state.get()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state() == SubscriptionState::Subscribed
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// The number of listeners registered directly on this node.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// The listeners registered directly on this node, in
    /// registration order.
    pub fn listeners(&self) -> Vec<Callback> {
        self.inner.listeners.listeners()
    }

    /// The child nodes currently attached, in creation order.
    pub fn children(&self) -> Vec<Subscription> {
        self.inner.children.borrow().clone()
    }

    /// Set the callback the root node runs when the store notifies
    /// it. [crate::provide_redux()] installs one which calls
    /// [Subscription::notify_nested_subs()].
    pub fn set_on_state_change<C: Into<Callback>>(&self, callback: C) {
        *self.inner.on_state_change.borrow_mut() = Some(callback.into());
    }

    pub fn clear_on_state_change(&self) {
        self.inner.on_state_change.borrow_mut().take();
    }

    fn handle_change(&self) {
        let callback = self.inner.on_state_change.borrow().clone();
        if let Some(callback) = callback {
            callback.emit();
        }
    }

    fn attach(&self, child: &Subscription) {
        if child.inner.attached.replace(true) {
            return;
        }
        log::trace!("attaching nested subscription #{}", child.inner.order);
        let mut children = self.inner.children.borrow_mut();
        let position =
            children.partition_point(|existing| existing.inner.order < child.inner.order);
        children.insert(position, child.clone());
    }

    fn detach(&self, child: &Subscription) {
        if !child.inner.attached.replace(false) {
            return;
        }
        log::trace!("detaching nested subscription");
        self.inner
            .children
            .borrow_mut()
            .retain(|existing| !Rc::ptr_eq(&existing.inner, &child.inner));
    }

    /// `Unsubscribed -> Subscribed`. Activates the ancestors first,
    /// opens the store subscription on the root, then activates the
    /// attached children in order. No-op unless `Unsubscribed`.
    pub fn try_subscribe(&self) {
        if self.state() != SubscriptionState::Unsubscribed {
            return;
        }

        if let Some(parent) = self.parent() {
            parent.attach(self);
            parent.try_subscribe();
            // The parent activates its attached children, this one
            // included, if it was not active yet.
            if self.state() != SubscriptionState::Unsubscribed {
                return;
            }
        }

        self.inner.state.set(SubscriptionState::Subscribed);
        log::trace!("subscription activated (root: {})", self.is_root());

        if let Some(source) = &self.inner.source {
            let weak = Rc::downgrade(&self.inner);
            let unsubscribe = source(Callback::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Subscription { inner }.handle_change();
                }
            }));
            *self.inner.store_unsubscribe.borrow_mut() = Some(unsubscribe);
        }

        for child in self.children() {
            child.try_subscribe();
        }
    }

    /// `Subscribed -> Unsubscribed`. Closes the store subscription on
    /// the root and deactivates the attached children. Registered
    /// listeners are kept. Idempotent.
    pub fn try_unsubscribe(&self) {
        if self.state() != SubscriptionState::Subscribed {
            return;
        }

        self.inner.state.set(SubscriptionState::Unsubscribed);
        log::trace!("subscription deactivated (root: {})", self.is_root());

        let unsubscribe = self.inner.store_unsubscribe.borrow_mut().take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }

        for child in self.children() {
            child.try_unsubscribe();
        }
    }

    /// Register a listener on this node, activating the node (and its
    /// ancestors) if it was `Unsubscribed`. The returned handle
    /// removes exactly this listener.
    ///
    /// On a `Destroyed` node the listener is dropped and an inert
    /// handle is returned.
    pub fn add_nested_sub<C: Into<Callback>>(&self, listener: C) -> SubscriptionHandle {
        if self.state() == SubscriptionState::Destroyed {
            log::warn!("listener added to a destroyed subscription; it will never be called");
            return SubscriptionHandle {
                node: Weak::new(),
                key: None,
                released: Cell::new(true),
            };
        }

        let key = self.inner.listeners.subscribe(listener);
        log::trace!(
            "listener added, {} on this node",
            self.inner.listeners.len()
        );
        self.try_subscribe();

        SubscriptionHandle {
            node: Rc::downgrade(&self.inner),
            key: Some(key),
            released: Cell::new(false),
        }
    }

    fn remove_listener(&self, key: ListenerKey) {
        if self.inner.listeners.unsubscribe(key) {
            log::trace!(
                "listener removed, {} left on this node",
                self.inner.listeners.len()
            );
            self.release_if_idle();
        }
    }

    /// Detach this node, or close the store subscription if this is
    /// the root, once nothing below it is listening anymore.
    fn release_if_idle(&self) {
        if self.state() == SubscriptionState::Destroyed {
            return;
        }
        if !self.inner.listeners.is_empty() || !self.inner.children.borrow().is_empty() {
            return;
        }

        match self.parent() {
            Some(parent) => {
                parent.detach(self);
                self.try_unsubscribe();
                parent.release_if_idle();
            }
            None => self.try_unsubscribe(),
        }
    }

    /// Run this node's listeners in registration order, then notify
    /// each attached child in creation order. Does nothing unless
    /// `Subscribed`.
    ///
    /// Every listener of the subtree is collected before the first one
    /// runs. A listener or child node added during the pass is first
    /// notified on the next pass. One removed, detached or destroyed
    /// during the pass is skipped if it has not been reached yet.
    ///
    /// A panicking listener unwinds out of this call and the rest of
    /// the pass is skipped.
    pub fn notify_nested_subs(&self) {
        if self.state() != SubscriptionState::Subscribed {
            return;
        }

        let mut pass = Vec::new();
        self.collect_pass(&mut pass);

        for (node, key, callback) in pass {
            if node.is_subscribed() && node.inner.listeners.contains(key) {
                callback.emit();
            }
        }
    }

    fn collect_pass(&self, pass: &mut Vec<(Subscription, ListenerKey, Callback)>) {
        for (key, callback) in self.inner.listeners.snapshot() {
            pass.push((self.clone(), key, callback));
        }
        for child in self.inner.children.borrow().iter() {
            if child.is_subscribed() {
                child.collect_pass(pass);
            }
        }
    }

    /// `* -> Destroyed`. Destroys the children, drops every listener,
    /// closes the store subscription if open and detaches from the
    /// parent. Idempotent.
    pub fn destroy(&self) {
        if self.state() == SubscriptionState::Destroyed {
            return;
        }

        let children: Vec<Subscription> = self.inner.children.borrow_mut().drain(..).collect();
        for child in children {
            child.inner.attached.set(false);
            child.destroy();
        }

        self.inner.listeners.clear();
        self.try_unsubscribe();
        self.inner.state.set(SubscriptionState::Destroyed);
        self.clear_on_state_change();
        log::trace!("subscription destroyed (root: {})", self.is_root());

        if let Some(parent) = self.parent() {
            parent.detach(self);
            parent.release_if_idle();
        }
    }

    pub fn ptr_eq(&self, other: &Subscription) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakSubscription {
        WeakSubscription(Rc::downgrade(&self.inner))
    }
}

/// A non-owning handle to a [Subscription] node, for callbacks stored
/// inside the tree itself.
#[derive(Clone)]
pub struct WeakSubscription(Weak<SubscriptionInner>);

impl WeakSubscription {
    pub fn upgrade(&self) -> Option<Subscription> {
        self.0.upgrade().map(|inner| Subscription { inner })
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("state", &self.state())
            .field("root", &self.is_root())
            .field("listeners", &self.listener_count())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

/// Removes one listener from its [Subscription] node.
///
/// Releasing is idempotent. Dropping the handle without releasing it
/// leaves the listener registered until its node is destroyed.
pub struct SubscriptionHandle {
    node: Weak<SubscriptionInner>,
    key: Option<ListenerKey>,
    released: Cell<bool>,
}

impl SubscriptionHandle {
    /// Remove the listener. If it was the last listener of a nested
    /// node, the node is detached from its parent; if it was the last
    /// one in the tree, the store subscription is closed.
    pub fn unsubscribe(&self) {
        if self.released.replace(true) {
            return;
        }
        if let (Some(inner), Some(key)) = (self.node.upgrade(), self.key) {
            Subscription { inner }.remove_listener(key);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}

impl Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("released", &self.released.get())
            .finish()
    }
}
