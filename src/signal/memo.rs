use crate::runtime::ReactiveRuntime;
use parking_lot::RwLock;
use std::sync::Arc;

/// A memoized computed value that automatically tracks dependencies.
///
/// Memos only recompute when their dependencies change. Collection slots
/// use them for derived getters such as `has_error`.
pub struct Memo<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    cached: Arc<RwLock<Option<T>>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            compute: Arc::clone(&self.compute),
            cached: Arc::clone(&self.cached),
            id: self.id,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo on `runtime` with the given computation function.
    pub fn new<F>(runtime: &Arc<ReactiveRuntime>, compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let id = runtime.next_id();
        runtime.register_memo(id);

        Self {
            compute: Arc::new(compute),
            cached: Arc::new(RwLock::new(None)),
            id,
            runtime: Arc::clone(runtime),
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);

        // Held across the recompute so that an older result can never
        // overwrite a newer one in the cache.
        let mut cached = self.cached.write();
        let dirty = self.runtime.take_memo_dirty(self.id);
        if !dirty {
            if let Some(value) = cached.as_ref() {
                return value.clone();
            }
        }

        // Recompute within observer context to track dependencies
        let value = self.runtime.with_observer(self.id, || (self.compute)());
        *cached = Some(value.clone());
        value
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

/// Create a new memoized computation on `runtime`.
///
/// # Example
///
/// ```
/// use tincan_sync::runtime::ReactiveRuntime;
/// use tincan_sync::{create_memo, create_signal};
///
/// let runtime = ReactiveRuntime::new();
/// let count = create_signal(&runtime, 5);
/// let doubled = create_memo(&runtime, {
///     let count = count.clone();
///     move || count.get() * 2
/// });
/// assert_eq!(doubled.get(), 10);
/// ```
pub fn create_memo<T, F>(runtime: &Arc<ReactiveRuntime>, compute: F) -> Memo<T>
where
    T: Clone + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(runtime, compute)
}
