use crate::{
    error::{InjectError, Result},
    ObservableStore, ProviderOptions, Scope, Subscription,
};
use std::{any::type_name, fmt::Debug, rc::Rc};

/// The store access point installed into a [Scope]: one store
/// reference plus the [Subscription] node through which every binder
/// created below the scope is notified.
///
/// A context installed with [provide_redux()] owns the root node of a
/// tree. A context installed with [nest_subscription()] shares the
/// store of the nearest enclosing context and owns a child node of
/// its subscription.
pub struct ReduxContext<St> {
    store: Rc<St>,
    subscription: Subscription,
    nested: bool,
}

impl<St: ObservableStore> ReduxContext<St> {
    pub fn store(&self) -> &Rc<St> {
        &self.store
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    fn teardown(&self) {
        if self.nested {
            self.subscription.destroy();
        } else {
            self.subscription.try_unsubscribe();
            self.subscription.clear_on_state_change();
        }
        log::debug!(
            "{} redux context for `{}` torn down",
            if self.nested { "nested" } else { "root" },
            type_name::<St>()
        );
    }
}

impl<St> Debug for ReduxContext<St> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ReduxContext {{ store: {} @ {:p}, subscription: {:?}, nested: {} }}",
            type_name::<St>(),
            Rc::as_ptr(&self.store),
            self.subscription,
            self.nested
        )
    }
}

fn ensure_no_local_context<St: ObservableStore>(scope: &Scope) -> Result<()> {
    if scope.get_local::<ReduxContext<St>>().is_some() {
        log::warn!(
            "a provider for `{}` is already installed on {:?}",
            type_name::<St>(),
            scope.id()
        );
        return Err(InjectError::DuplicateProvider {
            store: type_name::<St>(),
        });
    }
    Ok(())
}

fn install<St: ObservableStore>(scope: &Scope, context: ReduxContext<St>) -> Rc<ReduxContext<St>> {
    let context = Rc::new(context);
    scope.provide(context.clone());

    let teardown = context.clone();
    scope.on_destroy(move || teardown.teardown());
    context
}

/// Install `store` into `scope` with default [ProviderOptions]. See
/// [provide_redux_with()].
pub fn provide_redux<St: ObservableStore>(
    scope: &Scope,
    store: Rc<St>,
) -> Result<Rc<ReduxContext<St>>> {
    provide_redux_with(scope, store, ProviderOptions::default())
}

/// Install `store` into `scope`, making it and a fresh root
/// [Subscription] available to the scope and its descendants.
///
/// The store subscription is only opened once the first binder
/// registers. When the scope is destroyed the root node stops
/// listening to the store. A descendant scope may install another
/// provider; its subtree then only ever sees that nearer store.
pub fn provide_redux_with<St: ObservableStore>(
    scope: &Scope,
    store: Rc<St>,
    options: ProviderOptions,
) -> Result<Rc<ReduxContext<St>>> {
    scope.ensure_active("provide_redux")?;
    ensure_no_local_context::<St>(scope)?;

    let subscription = Subscription::new(store.clone());
    let weak = subscription.downgrade();
    let level = options.get_log_level().level();
    subscription.set_on_state_change(move || {
        if let Some(root) = weak.upgrade() {
            log::log!(
                level,
                "store `{}` changed, notifying {} listeners and {} nested subscriptions",
                type_name::<St>(),
                root.listener_count(),
                root.children().len()
            );
            root.notify_nested_subs();
        }
    });

    log::debug!(
        "installing redux context for `{}` on {:?}",
        type_name::<St>(),
        scope.id()
    );

    Ok(install(
        scope,
        ReduxContext {
            store,
            subscription,
            nested: false,
        },
    ))
}

/// Give `scope` its own [Subscription] node, a child of the node of
/// the nearest enclosing context for `St`. Binders created in `scope`
/// and its descendants are notified after every listener of the
/// enclosing node has run. The node is destroyed with the scope.
pub fn nest_subscription<St: ObservableStore>(scope: &Scope) -> Result<Rc<ReduxContext<St>>> {
    let parent = inject_redux_context::<St>(scope, "nest_subscription")?;
    ensure_no_local_context::<St>(scope)?;

    log::debug!(
        "nesting subscription for `{}` on {:?}",
        type_name::<St>(),
        scope.id()
    );

    Ok(install(
        scope,
        ReduxContext {
            store: parent.store.clone(),
            subscription: parent.subscription.create_child(),
            nested: true,
        },
    ))
}

/// The nearest [ReduxContext] for `St` visible from `scope`.
/// `accessor` names the caller in a [InjectError::Scope].
pub fn inject_redux_context<St: ObservableStore>(
    scope: &Scope,
    accessor: &'static str,
) -> Result<Rc<ReduxContext<St>>> {
    scope.ensure_active(accessor)?;
    scope
        .inject::<ReduxContext<St>>()
        .ok_or(InjectError::MissingProvider {
            store: type_name::<St>(),
        })
}
