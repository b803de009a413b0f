//! Fine-grained reactive primitives.
//!
//! This module provides the building blocks collection slots are made of:
//! - Signals: Reactive state containers, with read-only views for consumers
//! - Memos: Cached computed values (derived getters)
//! - Effects: Side effects that react to changes

mod effect;
mod memo;
mod signal;

pub use effect::{create_effect, Effect};
pub use memo::{create_memo, Memo};
pub use signal::{create_signal, ReadSignal, Signal, WatchGuard};
