use crate::runtime::{ReactiveRuntime, RuntimeInner};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// A reactive signal that holds a value and notifies subscribers when changed.
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            id: self.id,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal on `runtime` with the given initial value.
    pub fn new(runtime: &Arc<ReactiveRuntime>, initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            id: runtime.next_id(),
            runtime: Arc::clone(runtime),
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);
        self.value.read().clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *self.value.write() = new_value;
        self.runtime.notify_observers(self.id);
    }

    /// Update the value using a function.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.value.write();
            f(&mut *value);
        }
        self.runtime.notify_observers(self.id);
    }

    /// Replace the value without notifying observers.
    ///
    /// Pair with [`notify`](Self::notify) once every related write is done,
    /// so observers never run in the middle of a multi-signal transition.
    pub(crate) fn set_silent(&self, new_value: T) {
        *self.value.write() = new_value;
    }

    /// Notify observers of this signal.
    pub(crate) fn notify(&self) {
        self.runtime.notify_observers(self.id);
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        f(&*self.value.read())
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Read-only view of this signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: self.clone(),
        }
    }

    /// Watch this signal for changes.
    ///
    /// The callback runs once with the current value and again after every
    /// write, until the returned guard is dropped.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let observer_id = self.runtime.next_id();
        let value = Arc::clone(&self.value);
        let callback = Arc::new(callback);
        let callback_clone = Arc::clone(&callback);

        self.runtime.create_observer(observer_id, move || {
            let val = value.read().clone();
            callback_clone(val);
        });

        self.runtime.with_observer(observer_id, || {
            self.runtime.track_read(self.id);
        });

        let val = self.value.read().clone();
        callback(val);

        WatchGuard {
            observer_id,
            runtime: Arc::downgrade(self.runtime.inner()),
        }
    }
}

/// Read-only handle to a [`Signal`].
///
/// Handed out by collection slots so that views can read and watch state
/// without being able to write it.
pub struct ReadSignal<T> {
    inner: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.inner.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    pub fn id(&self) -> usize {
        self.inner.id()
    }

    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner.watch(callback)
    }
}

/// Create a signal on `runtime`.
pub fn create_signal<T>(runtime: &Arc<ReactiveRuntime>, initial: T) -> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    Signal::new(runtime, initial)
}

/// RAII guard for signal watchers.
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<RuntimeInner>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.observer_id);
        }
    }
}
