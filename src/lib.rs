//! # Tincan Sync
//!
//! Reactive collection stores kept in sync with remote JSON endpoints.
//!
//! Tincan Sync is built from two layers:
//!
//! ## Signals (Low-level primitives)
//!
//! Fine-grained reactive primitives, all living on an explicitly owned
//! [`ReactiveRuntime`](runtime::ReactiveRuntime):
//! - `Signal<T>` - Reactive values that notify dependents when changed
//! - `Memo<T>` - Computed values that automatically track dependencies
//! - `Effect` - Side effects that run when dependencies change
//!
//! ## Store (Remote collections)
//!
//! - `SyncStore<R>` - A fixed set of named collections, each with its items,
//!   a loading flag and the last fetch error
//! - `ResourceClient<R>` - The request/response seam, with `HttpClient` as
//!   the reqwest implementation
//! - `SyncConfig` - Base URL and collection list, from TOML and environment
//!
//! ```no_run
//! use tincan_sync::{SyncConfig, SyncStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tincan_sync::StoreError> {
//!     let config = SyncConfig::default().with_env_overrides();
//!     let store: SyncStore = SyncStore::from_config(&config)?;
//!
//!     let _log = store.subscribe("containers", |slot| {
//!         println!("loading={} items={}", slot.is_loading, slot.items.len());
//!     })?;
//!
//!     store.fetch("containers")?.settled().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod records;
pub mod runtime;
pub mod signal;
pub mod store;

// Re-export main types for convenience
pub use client::{HttpClient, ResourceClient};
pub use config::{CollectionConfig, SyncConfig};
pub use error::{ConfigError, FetchError, StoreError};
pub use records::{Container, Deployment, Record};
pub use signal::{
    create_effect, create_memo, create_signal, Effect, Memo, ReadSignal, Signal, WatchGuard,
};
pub use store::{CollectionSlot, FetchHandle, Outcome, SlotSnapshot, SyncStore};
