//! Bindings between a redux-like global state store and fine-grained
//! reactive cells.
//!
//! A [Store] (or anything implementing [ObservableStore]) is installed
//! into a [Scope] with [provide_redux()]. Consumers created in that
//! scope or below it use [inject_selector()] to project the store
//! state into a [ReadSignal], which is only written to when the
//! projected value actually changes. Notifications travel through a
//! tree of [Subscription]s, so listeners of an enclosing node always
//! run before the ones nested below it.

mod equality;
mod error;
mod inject;
mod listener;
mod options;
pub mod provider;
mod reducer;
mod scope;
mod signal;
mod store;
pub mod subscription;

pub use equality::*;
pub use error::InjectError;
pub use inject::*;
pub use listener::*;
pub use options::*;
pub use provider::{
    inject_redux_context, nest_subscription, provide_redux, provide_redux_with, ReduxContext,
};
pub use reducer::*;
pub use scope::{Scope, ScopeId};
pub use signal::{ReadSignal, Signal};
pub use store::{ObservableStore, Store, Unsubscribe};
pub use subscription::{Subscription, SubscriptionHandle, SubscriptionState, WeakSubscription};
