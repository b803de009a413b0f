use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::FetchError;
use crate::runtime::ReactiveRuntime;
use crate::signal::{create_memo, create_signal, Memo, ReadSignal, Signal};

/// Point-in-time copy of a slot's state.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSnapshot<R> {
    pub items: Vec<R>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<R> SlotSnapshot<R> {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// How a fetch left its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Items were replaced with this many records.
    Loaded(usize),
    /// The slot error was set to this message; items were kept.
    Failed(String),
    /// A newer fetch was issued before this one settled; its result was dropped.
    Superseded,
}

/// State of one named collection.
///
/// Every field is a signal on the owning store's runtime, so effects that
/// read a slot re-run when it changes. Only the store writes to a slot;
/// consumers get values or [`ReadSignal`] views.
pub struct CollectionSlot<R> {
    name: String,
    endpoint: String,
    items: Signal<Vec<R>>,
    is_loading: Signal<bool>,
    error: Signal<Option<String>>,
    has_error: Memo<bool>,
    // Generation of the latest issued fetch. Field writes and snapshots
    // happen under this lock; observers are notified after it is released.
    generation: Mutex<u64>,
}

impl<R: Clone + Send + Sync + 'static> CollectionSlot<R> {
    pub(crate) fn new(runtime: &Arc<ReactiveRuntime>, name: String, endpoint: String) -> Self {
        let error = create_signal(runtime, None::<String>);
        let has_error = create_memo(runtime, {
            let error = error.clone();
            move || error.with(Option::is_some)
        });

        Self {
            name,
            endpoint,
            items: create_signal(runtime, Vec::new()),
            is_loading: create_signal(runtime, false),
            error,
            has_error,
            generation: Mutex::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn items(&self) -> Vec<R> {
        self.items.get()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    pub fn error(&self) -> Option<String> {
        self.error.get()
    }

    pub fn has_error(&self) -> bool {
        self.has_error.get()
    }

    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items_signal(&self) -> ReadSignal<Vec<R>> {
        self.items.read_only()
    }

    pub fn loading_signal(&self) -> ReadSignal<bool> {
        self.is_loading.read_only()
    }

    pub fn error_signal(&self) -> ReadSignal<Option<String>> {
        self.error.read_only()
    }

    pub fn has_error_memo(&self) -> Memo<bool> {
        self.has_error.clone()
    }

    /// Copy of all three fields, taken between transitions.
    pub fn snapshot(&self) -> SlotSnapshot<R> {
        let _generation = self.generation.lock();
        SlotSnapshot {
            items: self.items(),
            is_loading: self.is_loading(),
            error: self.error(),
        }
    }

    /// Enter Loading and return the generation of the new fetch.
    pub(crate) fn begin(&self) -> u64 {
        let generation = {
            let mut latest = self.generation.lock();
            *latest += 1;
            self.error.set_silent(None);
            self.is_loading.set_silent(true);
            *latest
        };

        self.error.notify();
        self.is_loading.notify();
        generation
    }

    /// Apply a fetch result if `generation` is still the latest one.
    pub(crate) fn settle(&self, generation: u64, result: Result<Vec<R>, FetchError>) -> Outcome {
        let outcome = {
            let latest = self.generation.lock();
            if *latest != generation {
                return Outcome::Superseded;
            }

            self.is_loading.set_silent(false);
            match result {
                Ok(items) => {
                    let count = items.len();
                    self.items.set_silent(items);
                    Outcome::Loaded(count)
                }
                Err(err) => {
                    let message = format!("Error loading {}: {}", self.name, err);
                    self.error.set_silent(Some(message.clone()));
                    Outcome::Failed(message)
                }
            }
        };

        self.is_loading.notify();
        match outcome {
            Outcome::Loaded(_) => self.items.notify(),
            _ => self.error.notify(),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::create_effect;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    fn slot() -> CollectionSlot<u32> {
        let runtime = ReactiveRuntime::new();
        CollectionSlot::new(&runtime, "containers".into(), "/api/containers".into())
    }

    #[test]
    fn starts_empty_and_idle() {
        let slot = slot();
        assert_eq!(
            slot.snapshot(),
            SlotSnapshot {
                items: vec![],
                is_loading: false,
                error: None
            }
        );
        assert!(!slot.has_error());
        assert!(slot.is_empty());
    }

    #[test]
    fn begin_clears_error_and_sets_loading() {
        let slot = slot();
        let generation = slot.begin();
        slot.settle(generation, Err(FetchError::Transport("timeout".into())));
        assert!(slot.has_error());

        slot.begin();
        assert!(slot.is_loading());
        assert_eq!(slot.error(), None);
        assert!(!slot.has_error());
    }

    #[test]
    fn failure_keeps_last_known_good() {
        let slot = slot();
        let generation = slot.begin();
        assert_eq!(slot.settle(generation, Ok(vec![1, 2])), Outcome::Loaded(2));

        let generation = slot.begin();
        let outcome = slot.settle(generation, Err(FetchError::Transport("timeout".into())));
        assert_eq!(
            outcome,
            Outcome::Failed("Error loading containers: timeout".into())
        );
        assert_eq!(slot.items(), vec![1, 2]);
        assert!(!slot.is_loading());
    }

    #[test]
    fn stale_generation_is_ignored() {
        let slot = slot();
        let first = slot.begin();
        let second = slot.begin();

        assert_eq!(slot.settle(first, Ok(vec![1])), Outcome::Superseded);
        assert!(slot.is_loading());
        assert!(slot.items().is_empty());

        assert_eq!(slot.settle(second, Ok(vec![2])), Outcome::Loaded(1));
        assert_eq!(slot.items(), vec![2]);
        assert!(!slot.is_loading());
    }

    #[test]
    fn snapshots_never_tear_across_threads() {
        let slot = slot();
        let done = AtomicBool::new(false);
        let torn = AtomicUsize::new(0);

        thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..20_000 {
                    let generation = slot.begin();
                    slot.settle(generation, Err(FetchError::Transport("timeout".into())));
                }
                done.store(true, Ordering::SeqCst);
            });
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = slot.snapshot();
                    if snapshot.is_loading && snapshot.has_error() {
                        torn.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        });

        assert_eq!(torn.load(Ordering::SeqCst), 0);
        assert!(slot.has_error());
        assert!(!slot.is_loading());
    }

    #[test]
    fn observers_run_after_the_slot_lock_is_released() {
        let runtime = ReactiveRuntime::new();
        let a = Arc::new(CollectionSlot::<u32>::new(
            &runtime,
            "containers".into(),
            "/api/containers".into(),
        ));
        let b = Arc::new(CollectionSlot::<u32>::new(
            &runtime,
            "deployments".into(),
            "/api/deployments".into(),
        ));

        // Settling one slot begins a fetch of the other, from both sides.
        let _a_to_b = create_effect(&runtime, {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            move || {
                if a.error.get().is_some() {
                    b.begin();
                }
            }
        });
        let _b_to_a = create_effect(&runtime, {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            move || {
                if b.error.get().is_some() {
                    a.begin();
                }
            }
        });

        thread::scope(|scope| {
            for (this, other) in [(&a, &b), (&b, &a)] {
                scope.spawn(move || {
                    for _ in 0..500 {
                        let generation = this.begin();
                        this.settle(generation, Err(FetchError::Transport("refused".into())));
                        let _ = other.snapshot();
                    }
                });
            }
        });

        for slot in [&a, &b] {
            let snapshot = slot.snapshot();
            assert!(!(snapshot.is_loading && snapshot.has_error()));
        }
    }
}
