//! Runtime support for reactive primitives.
//!
//! This module provides the dependency tracking and reactive graph shared
//! by the signals, memos and effects of one store.

mod context;

pub use context::ReactiveRuntime;
pub(crate) use context::RuntimeInner;
