use thiserror::Error;

/// Errors that can occur when operating a [`PoolList`][crate::PoolList].
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// No node in the list holds the value.
    #[error("value {value} is not in the list")]
    NotFound {
        /// The value that was searched for.
        value: u16,
    },

    /// The node handle does not refer to a node of this list, for example because the node
    /// has already been deleted.
    #[error("the node is not part of this list")]
    UnknownNode,

    /// The pool that stores the nodes reported an error, most likely because it is out of
    /// memory.
    #[error(transparent)]
    Pool(#[from] fixed_pool::Error),
}

/// A specialized `Result` type for list operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
