//! Concurrency guard and execution-context wrappers for the session-open path
//!
//! Opening a session is expensive (repository inspection) and may be entered
//! from more than one host entry point, so the whole opening path runs behind
//! one process-wide mutual-exclusion section. Descriptor reads are never
//! serialized here.
//!
//! Some hosts additionally require the opener to run under a specific
//! resolution context (e.g. an isolated plugin realm). That is modelled as a
//! composable [`ExecutionContext`]: install before the opener runs, restore
//! on every exit path, including panics, via an RAII guard.

use std::sync::Mutex;

/// Serializes the session-opening code path end-to-end.
///
/// One instance guards all roots: opening is rare and not a hot path, so a
/// single section is the conservative, correct choice.
#[derive(Default)]
pub struct ConcurrencyGuard {
    lock: Mutex<()>,
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the guard; concurrent callers block until the
    /// current opener finishes.
    pub fn serialized<T>(&self, f: impl FnOnce() -> T) -> T {
        // A poisoned guard only means a previous opener panicked; the lock
        // itself protects no data, so continue with the inner value.
        let _held = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f()
    }
}

/// A switchable execution context around the opener invocation.
///
/// `install` saves whatever needs saving and switches to the required
/// context; `restore` switches back. Restoration is driven by a drop guard,
/// so it happens on early returns and panics as well.
pub trait ExecutionContext {
    fn install(&self);
    fn restore(&self);
}

/// Context that changes nothing; the default for hosts without realm
/// switching requirements.
#[derive(Default, Clone, Copy)]
pub struct NoContext;

impl ExecutionContext for NoContext {
    fn install(&self) {}
    fn restore(&self) {}
}

struct RestoreOnDrop<'a, C: ExecutionContext + ?Sized> {
    context: &'a C,
}

impl<C: ExecutionContext + ?Sized> Drop for RestoreOnDrop<'_, C> {
    fn drop(&mut self) {
        self.context.restore();
    }
}

/// Run `f` under `context`, guaranteeing restoration on all exit paths.
pub fn with_context<C: ExecutionContext + ?Sized, T>(context: &C, f: impl FnOnce() -> T) -> T {
    context.install();
    let _restore = RestoreOnDrop { context };
    f()
}

impl ConcurrencyGuard {
    /// Compose both wrappers: mutual exclusion outermost, context switch
    /// innermost, mirroring a chained-invoker arrangement.
    pub fn serialized_with_context<C: ExecutionContext + ?Sized, T>(
        &self,
        context: &C,
        f: impl FnOnce() -> T,
    ) -> T {
        self.serialized(|| with_context(context, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_serialized_excludes_concurrent_openers() {
        let guard = Arc::new(ConcurrencyGuard::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(thread::spawn(move || {
                guard.serialized(|| {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(std::time::Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    struct RecordingContext {
        installed: AtomicUsize,
        restored: AtomicUsize,
    }

    impl RecordingContext {
        fn new() -> Self {
            Self {
                installed: AtomicUsize::new(0),
                restored: AtomicUsize::new(0),
            }
        }
    }

    impl ExecutionContext for RecordingContext {
        fn install(&self) {
            self.installed.fetch_add(1, Ordering::SeqCst);
        }
        fn restore(&self) {
            self.restored.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_context_installed_and_restored() {
        let context = RecordingContext::new();
        let result = with_context(&context, || 42);
        assert_eq!(result, 42);
        assert_eq!(context.installed.load(Ordering::SeqCst), 1);
        assert_eq!(context.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_context_restored_on_panic() {
        let context = RecordingContext::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_context(&context, || panic!("opener failed"));
        }));
        assert!(outcome.is_err());
        assert_eq!(context.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_serialized_with_context_composes() {
        let guard = ConcurrencyGuard::new();
        let context = RecordingContext::new();
        let result = guard.serialized_with_context(&context, || "opened");
        assert_eq!(result, "opened");
        assert_eq!(context.installed.load(Ordering::SeqCst), 1);
        assert_eq!(context.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_usable_after_panicking_opener() {
        let guard = ConcurrencyGuard::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            guard.serialized(|| panic!("opener failed"));
        }));
        // guard must still serialize subsequent openers
        assert_eq!(guard.serialized(|| 7), 7);
    }
}
