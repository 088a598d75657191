//! Explicit injection scopes.
//!
//! A [Scope] stands for the lifetime of one consumer (typically a
//! component instance). Scopes form a tree: values provided on a
//! scope are visible to the scope and all of its descendants, with
//! the nearest provider winning. Destroying a scope destroys its
//! descendants first, then runs its own teardown hooks in the order
//! they were registered.
//!
//! Scopes are passed explicitly to every accessor; there is no
//! ambient "current scope".

use crate::error::{InjectError, Result};
use std::{
    any::{Any, TypeId},
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::Debug,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a [Scope] within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

struct ScopeInner {
    id: ScopeId,
    parent: Option<Scope>,
    destroyed: Cell<bool>,
    providers: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
    teardown: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<Weak<ScopeInner>>>,
}

/// A handle to a consumer's construction and lifetime context.
/// Cloning it creates a new handle to the same scope.
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

impl Scope {
    /// Create a scope with no parent.
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Scope>) -> Self {
        Scope(Rc::new(ScopeInner {
            id: ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)),
            parent,
            destroyed: Cell::new(false),
            providers: RefCell::new(HashMap::new()),
            teardown: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    /// Create a child of this scope. The child is destroyed when this
    /// scope is, unless it was destroyed earlier.
    pub fn child(&self) -> Scope {
        let child = Self::with_parent(Some(self.clone()));
        let mut children = self.0.children.borrow_mut();
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Rc::downgrade(&child.0));
        child
    }

    pub fn id(&self) -> ScopeId {
        self.0.id
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Returns [InjectError::Scope] if this scope can no longer be
    /// used to construct anything. `accessor` names the caller in the
    /// error.
    pub fn ensure_active(&self, accessor: &'static str) -> Result<()> {
        if self.is_destroyed() {
            Err(InjectError::Scope { accessor })
        } else {
            Ok(())
        }
    }

    /// Make `value` available to this scope and its descendants,
    /// replacing any value of the same type provided directly on this
    /// scope.
    pub fn provide<T: 'static>(&self, value: Rc<T>) {
        self.0
            .providers
            .borrow_mut()
            .insert(TypeId::of::<T>(), value as Rc<dyn Any>);
    }

    /// The value of type `T` provided directly on this scope, ignoring
    /// ancestors.
    pub fn get_local<T: 'static>(&self) -> Option<Rc<T>> {
        let provided = self.0.providers.borrow().get(&TypeId::of::<T>()).cloned();
        provided.and_then(|value| value.downcast::<T>().ok())
    }

    /// The value of type `T` provided on the nearest scope, starting
    /// with this one and walking up through its ancestors.
    pub fn inject<T: 'static>(&self) -> Option<Rc<T>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.get_local::<T>() {
                return Some(value);
            }
            current = scope.parent();
        }
        None
    }

    /// Register a hook which runs when this scope is destroyed. If
    /// the scope is already destroyed the hook runs immediately.
    pub fn on_destroy<F: FnOnce() + 'static>(&self, hook: F) {
        if self.is_destroyed() {
            hook();
            return;
        }
        self.0.teardown.borrow_mut().push(Box::new(hook));
    }

    /// Destroy this scope: descendants first, then this scope's hooks
    /// in registration order, then its provided values are dropped.
    /// Calling this more than once has no further effect.
    pub fn destroy(&self) {
        if self.0.destroyed.replace(true) {
            return;
        }
        log::debug!("destroying scope {:?}", self.0.id);

        let children: Vec<Weak<ScopeInner>> = self.0.children.borrow_mut().drain(..).collect();
        for child in children {
            if let Some(child) = child.upgrade() {
                Scope(child).destroy();
            }
        }

        let hooks: Vec<Box<dyn FnOnce()>> = self.0.teardown.borrow_mut().drain(..).collect();
        for hook in hooks {
            hook();
        }

        self.0.providers.borrow_mut().clear();
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Scope {}

impl Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.0.id)
            .field("parent", &self.0.parent.as_ref().map(|parent| parent.id()))
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}
