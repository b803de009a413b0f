//! Synchronized collection stores.
//!
//! A [`SyncStore`] owns one [`CollectionSlot`] per named remote collection
//! and drives each through Idle, Loading and Settled as fetches are issued
//! and complete.

mod slot;
mod store;

pub use slot::{CollectionSlot, Outcome, SlotSnapshot};
pub use store::{FetchHandle, SyncStore};
