/// Determines what happens when [`PoolAllocator::init()`][1] is called on an allocator that
/// already owns a pool.
///
/// By default, the existing pool is discarded and replaced with a fresh one.
///
/// # Examples
///
/// ```
/// use fixed_pool::{Error, PoolAllocator, ReinitPolicy};
///
/// let mut pool = PoolAllocator::builder()
///     .capacity(1024)
///     .reinit_policy(ReinitPolicy::Reject)
///     .build()?;
///
/// assert_eq!(pool.init(2048), Err(Error::AlreadyInitialized));
/// # Ok::<(), fixed_pool::Error>(())
/// ```
///
/// [1]: crate::PoolAllocator::init
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ReinitPolicy {
    /// The existing pool is released and a new one takes its place. All addresses issued by the
    /// previous pool become invalid. This is the default.
    #[default]
    Reset,

    /// Initializing an allocator that already owns a pool fails with
    /// [`Error::AlreadyInitialized`][crate::Error::AlreadyInitialized], leaving the existing
    /// pool untouched. The pool must be explicitly deinitialized before it can be replaced.
    Reject,
}
