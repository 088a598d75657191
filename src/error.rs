use thiserror::Error;

/// Errors produced by the accessors which read the
/// [ReduxContext](crate::ReduxContext) out of a [Scope](crate::Scope).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The accessor was invoked with a scope that has already been
    /// destroyed, so nothing created now could ever be torn down.
    #[error("`{accessor}` was called with a scope that has already been destroyed")]
    Scope { accessor: &'static str },

    /// No provider for the requested store type is installed in the
    /// scope or any of its ancestors.
    #[error("no provider for store `{store}` is installed in this scope or any of its ancestors")]
    MissingProvider { store: &'static str },

    /// A provider for the same store type was already installed
    /// directly on this scope.
    #[error("a provider for store `{store}` is already installed on this scope")]
    DuplicateProvider { store: &'static str },
}

pub type Result<T, E = InjectError> = std::result::Result<T, E>;
