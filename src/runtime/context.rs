use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

type ObserverFn = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph shared by every primitive created on one runtime.
struct ReactiveContext {
    // Observer currently running on each thread (effects may settle on any worker)
    current_observers: HashMap<ThreadId, usize>,
    // Map from source ID to set of observer IDs that depend on it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to set of source IDs it depends on
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to the effect function
    observers: HashMap<usize, ObserverFn>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
}

impl ReactiveContext {
    fn new() -> Self {
        Self {
            current_observers: HashMap::new(),
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            observers: HashMap::new(),
            memo_dirty: HashMap::new(),
        }
    }

    fn unlink(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                }
            }
        }
    }
}

/// Inner runtime state that can be shared with RAII guards.
pub struct RuntimeInner {
    context: Mutex<ReactiveContext>,
}

impl RuntimeInner {
    fn new() -> Self {
        Self {
            context: Mutex::new(ReactiveContext::new()),
        }
    }

    pub(crate) fn remove_observer(&self, observer_id: usize) {
        let mut ctx = self.context.lock();
        ctx.observers.remove(&observer_id);
        ctx.unlink(observer_id);
    }
}

/// Reactive runtime that owns one dependency graph.
///
/// There is no ambient runtime: every signal, memo and effect is created
/// against an explicit `Arc<ReactiveRuntime>`, normally the one owned by a
/// [`SyncStore`](crate::SyncStore). Reads are tracked per thread, so observers
/// running concurrently on different tokio workers do not see each other's
/// dependencies.
///
/// # Examples
///
/// ```
/// use tincan_sync::runtime::ReactiveRuntime;
/// use tincan_sync::Signal;
///
/// let runtime = ReactiveRuntime::new();
/// let signal = Signal::new(&runtime, 42);
/// assert_eq!(signal.get(), 42);
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    inner: Arc<RuntimeInner>,
}

impl ReactiveRuntime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            inner: Arc::new(RuntimeInner::new()),
        })
    }

    /// Get a reference to the inner runtime state.
    pub(crate) fn inner(&self) -> &Arc<RuntimeInner> {
        &self.inner
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of live observers (effects and watchers).
    pub fn observer_count(&self) -> usize {
        self.inner.context.lock().observers.len()
    }

    /// Track a read of a source by the observer running on this thread.
    pub(crate) fn track_read(&self, source_id: usize) {
        let mut ctx = self.inner.context.lock();
        if let Some(&current) = ctx.current_observers.get(&thread::current().id()) {
            if current == source_id {
                return;
            }
            ctx.dependencies
                .entry(source_id)
                .or_default()
                .insert(current);
            ctx.observer_deps
                .entry(current)
                .or_default()
                .insert(source_id);
        }
    }

    /// Notify all observers that depend on a source.
    pub(crate) fn notify_observers(&self, source_id: usize) {
        let observers = {
            let ctx = self.inner.context.lock();
            ctx.dependencies
                .get(&source_id)
                .map(|obs| obs.iter().copied().collect::<Vec<_>>())
        };

        if let Some(observers) = observers {
            for observer_id in observers {
                self.mark_observer_dirty(observer_id);
            }
        }
    }

    /// Mark an observer (memo or effect) as dirty and propagate to dependents.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut ctx = self.inner.context.lock();

        if let Some(dirty) = ctx.memo_dirty.get_mut(&observer_id) {
            if *dirty {
                return;
            }
            *dirty = true;

            let dependents = ctx
                .dependencies
                .get(&observer_id)
                .map(|deps| deps.iter().copied().collect::<Vec<_>>());
            drop(ctx);

            for dependent_id in dependents.into_iter().flatten() {
                self.mark_observer_dirty(dependent_id);
            }
            return;
        }

        let effect = ctx.observers.get(&observer_id).cloned();
        drop(ctx);

        if let Some(effect) = effect {
            self.with_observer(observer_id, || effect());
        }
    }

    /// Register an observer function, dropping any dependencies it had.
    pub(crate) fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut ctx = self.inner.context.lock();
        ctx.unlink(observer_id);
        ctx.observers.insert(observer_id, Arc::new(f));
    }

    /// Run a function with a specific observer as the current context.
    pub(crate) fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let thread_id = thread::current().id();
        let prev = self
            .inner
            .context
            .lock()
            .current_observers
            .insert(thread_id, observer_id);

        let result = f();

        let mut ctx = self.inner.context.lock();
        match prev {
            Some(prev) => ctx.current_observers.insert(thread_id, prev),
            None => ctx.current_observers.remove(&thread_id),
        };

        result
    }

    /// Register a memo and mark it as dirty initially.
    pub(crate) fn register_memo(&self, memo_id: usize) {
        self.inner.context.lock().memo_dirty.insert(memo_id, true);
    }

    /// Clear a memo's dirty flag, returning whether it was set.
    ///
    /// The flag is cleared before the memo recomputes, so a write landing
    /// during the computation marks it dirty again instead of being lost.
    pub(crate) fn take_memo_dirty(&self, memo_id: usize) -> bool {
        let mut ctx = self.inner.context.lock();
        ctx.memo_dirty.insert(memo_id, false).unwrap_or(true)
    }
}
