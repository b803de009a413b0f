use crate::runtime::{ReactiveRuntime, RuntimeInner};
use std::sync::{Arc, Weak};

/// A side effect that runs when its dependencies change.
///
/// Effects automatically track signal reads and re-run when those signals
/// change. The effect runs immediately on creation to establish initial
/// dependencies, and is unregistered when dropped.
///
/// # Examples
///
/// ```
/// use tincan_sync::runtime::ReactiveRuntime;
/// use tincan_sync::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let runtime = ReactiveRuntime::new();
/// let count = Signal::new(&runtime, 0);
/// let counter = Arc::new(AtomicUsize::new(0));
/// let counter_clone = counter.clone();
///
/// let _effect = Effect::new(&runtime, {
///     let count = count.clone();
///     move || {
///         let _ = count.get();
///         counter_clone.fetch_add(1, Ordering::SeqCst);
///     }
/// });
///
/// assert_eq!(counter.load(Ordering::SeqCst), 1);
/// count.set(1);
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// ```
pub struct Effect {
    id: usize,
    runtime: Weak<RuntimeInner>,
}

impl Effect {
    /// Create a new effect on `runtime`.
    pub fn new<F>(runtime: &Arc<ReactiveRuntime>, effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = runtime.next_id();
        let effect = Arc::new(effect);
        let effect_clone = Arc::clone(&effect);

        runtime.create_observer(id, move || {
            effect_clone();
        });

        // Run immediately within the observer context to track dependencies
        runtime.with_observer(id, || {
            effect();
        });

        Self {
            id,
            runtime: Arc::downgrade(runtime.inner()),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}

/// Create a new effect that runs when dependencies change.
pub fn create_effect<F>(runtime: &Arc<ReactiveRuntime>, effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(runtime, effect)
}
