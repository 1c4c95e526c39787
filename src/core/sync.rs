//! Synchronization utilities for robust mutex handling
//!
//! Session state is shared between the opening path and concurrent descriptor
//! reads; these helpers convert lock poisoning into component errors instead
//! of propagating panics across the host build driver boundary.

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// Converts a mutex poison error into an application-specific error using the
/// provided constructor, so every component reports poisoning the same way.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use buildver::core::sync::handle_mutex_poison;
/// use buildver::session::SessionError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |msg| SessionError::Internal { message: msg }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(
            format!(
                "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
                poison_err
            )
        )
    })
}
