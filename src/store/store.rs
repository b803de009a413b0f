use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::slot::{CollectionSlot, Outcome, SlotSnapshot};
use crate::client::{HttpClient, ResourceClient};
use crate::config::{validate_collections, CollectionConfig, SyncConfig};
use crate::error::{Result, StoreError};
use crate::records::Record;
use crate::runtime::ReactiveRuntime;
use crate::signal::Effect;

/// A store keeping a fixed set of named collections in sync with a remote API.
///
/// Each collection has its own [`CollectionSlot`]: the last fetched items, a
/// loading flag and the error of the last failed fetch. Slots are created at
/// construction and never added or removed. State only changes through
/// [`fetch`](Self::fetch); everything else is a read.
///
/// The store owns its [`ReactiveRuntime`]. Construct it once at startup and
/// share it (`Arc<SyncStore>` or `&SyncStore`) with whatever needs to read or
/// refresh it.
///
/// # Examples
///
/// ```no_run
/// use tincan_sync::{SyncConfig, SyncStore};
///
/// # async fn run() -> Result<(), tincan_sync::StoreError> {
/// let store: SyncStore = SyncStore::from_config(&SyncConfig::default())?;
///
/// store.fetch("containers")?.settled().await?;
/// if store.has_error("containers")? {
///     eprintln!("{}", store.error("containers")?.unwrap_or_default());
/// }
/// for container in store.items("containers")? {
///     println!("{:?}", container.get("name"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct SyncStore<R = Record> {
    runtime: Arc<ReactiveRuntime>,
    client: Arc<dyn ResourceClient<R>>,
    slots: IndexMap<String, Arc<CollectionSlot<R>>>,
}

impl<R> SyncStore<R>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Build a store backed by an [`HttpClient`] for `config`.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let client = HttpClient::from_config(config)?;
        info!(base_url = %client.base_url(), "using remote api");
        Self::new(Arc::new(client), config.collections.clone())
    }
}

impl<R> SyncStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Build a store with one empty slot per collection.
    pub fn new(
        client: Arc<dyn ResourceClient<R>>,
        collections: Vec<CollectionConfig>,
    ) -> Result<Self> {
        validate_collections(&collections)?;

        let runtime = ReactiveRuntime::new();
        let slots = collections
            .into_iter()
            .map(|collection| {
                let endpoint = collection.endpoint_path();
                let slot = CollectionSlot::new(&runtime, collection.name.clone(), endpoint);
                (collection.name, Arc::new(slot))
            })
            .collect::<IndexMap<_, _>>();

        info!(collections = ?slots.keys().collect::<Vec<_>>(), "sync store ready");
        Ok(Self {
            runtime,
            client,
            slots,
        })
    }

    /// The slot for `name`.
    pub fn slot(&self, name: &str) -> Result<Arc<CollectionSlot<R>>> {
        self.slots
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownCollection(name.to_owned()))
    }

    fn get_slot(&self, name: &str) -> Result<&CollectionSlot<R>> {
        self.slots
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_owned()))
    }

    /// Refresh the collection `name` from its endpoint.
    ///
    /// The slot enters Loading before this returns; the request itself runs
    /// on a spawned task. The handle may be dropped, or awaited with
    /// [`FetchHandle::settled`] to observe settlement. If another fetch of
    /// the same collection is issued before this one settles, this one's
    /// result is discarded.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch(&self, name: &str) -> Result<FetchHandle> {
        let slot = self.slot(name)?;
        let handle =
            Handle::try_current().map_err(|_| StoreError::NoRuntime(name.to_owned()))?;

        let generation = slot.begin();
        debug!(collection = name, generation, "fetch started");

        let client = Arc::clone(&self.client);
        let task = handle.spawn(async move {
            let result = client.fetch_collection(slot.endpoint()).await;
            let outcome = slot.settle(generation, result);
            match &outcome {
                Outcome::Loaded(count) => {
                    debug!(collection = slot.name(), count, "collection loaded");
                }
                Outcome::Failed(message) => {
                    warn!(collection = slot.name(), error = %message, "collection fetch failed");
                }
                Outcome::Superseded => {
                    debug!(collection = slot.name(), generation, "discarding stale response");
                }
            }
            outcome
        });

        Ok(FetchHandle {
            collection: name.to_owned(),
            generation,
            task,
        })
    }

    /// Refresh every collection.
    pub fn fetch_all(&self) -> Result<Vec<FetchHandle>> {
        self.slots.keys().map(|name| self.fetch(name)).collect()
    }

    pub fn items(&self, name: &str) -> Result<Vec<R>> {
        self.get_slot(name).map(CollectionSlot::items)
    }

    pub fn is_loading(&self, name: &str) -> Result<bool> {
        self.get_slot(name).map(CollectionSlot::is_loading)
    }

    pub fn error(&self, name: &str) -> Result<Option<String>> {
        self.get_slot(name).map(CollectionSlot::error)
    }

    pub fn has_error(&self, name: &str) -> Result<bool> {
        self.get_slot(name).map(CollectionSlot::has_error)
    }

    pub fn snapshot(&self, name: &str) -> Result<SlotSnapshot<R>> {
        self.get_slot(name).map(CollectionSlot::snapshot)
    }

    /// Collection names in configuration order.
    pub fn collections(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Whether any collection has a fetch in flight.
    pub fn any_loading(&self) -> bool {
        self.slots.values().any(|slot| slot.is_loading())
    }

    /// Current error messages, by collection.
    pub fn errors(&self) -> Vec<(&str, String)> {
        self.slots
            .iter()
            .filter_map(|(name, slot)| slot.error().map(|error| (name.as_str(), error)))
            .collect()
    }

    /// The runtime all slot signals live on.
    pub fn runtime(&self) -> &Arc<ReactiveRuntime> {
        &self.runtime
    }

    /// Run `effect` now and again whenever a slot it reads changes.
    pub fn watch<F>(&self, effect: F) -> Effect
    where
        F: Fn() + Send + Sync + 'static,
    {
        Effect::new(&self.runtime, effect)
    }

    /// Call `callback` with a snapshot of `name` now and after every change to it.
    ///
    /// The subscription lasts as long as the returned [`Effect`].
    pub fn subscribe<F>(&self, name: &str, callback: F) -> Result<Effect>
    where
        F: Fn(SlotSnapshot<R>) + Send + Sync + 'static,
    {
        let slot = self.slot(name)?;
        Ok(self.watch(move || callback(slot.snapshot())))
    }
}

/// Handle to an in-flight fetch.
///
/// Dropping it does not cancel the request.
#[derive(Debug)]
pub struct FetchHandle {
    collection: String,
    generation: u64,
    task: JoinHandle<Outcome>,
}

impl FetchHandle {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the fetch has settled its slot.
    pub async fn settled(self) -> Result<Outcome> {
        match self.task.await {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(StoreError::TaskAborted {
                collection: self.collection,
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Reply = std::result::Result<Vec<u32>, FetchError>;

    /// Client answering from a fixed table, counting requests.
    #[derive(Default)]
    struct TableClient {
        responses: HashMap<String, Reply>,
        requests: AtomicUsize,
    }

    impl TableClient {
        fn with(mut self, endpoint: &str, response: Reply) -> Self {
            self.responses.insert(endpoint.to_owned(), response);
            self
        }
    }

    #[async_trait]
    impl ResourceClient<u32> for TableClient {
        async fn fetch_collection(&self, endpoint_path: &str) -> Reply {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.responses.get(endpoint_path).cloned().unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    url: endpoint_path.to_owned(),
                })
            })
        }
    }

    fn store(client: TableClient) -> SyncStore<u32> {
        SyncStore::new(
            Arc::new(client),
            vec![
                CollectionConfig::new("containers"),
                CollectionConfig::new("deployments").with_endpoint("/v2/deployments"),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_uses_configured_endpoint() {
        let store = store(TableClient::default().with("/v2/deployments", Ok(vec![7, 8])));

        let outcome = store.fetch("deployments").unwrap().settled().await.unwrap();
        assert_eq!(outcome, Outcome::Loaded(2));
        assert_eq!(store.items("deployments").unwrap(), vec![7, 8]);
        assert!(store.items("containers").unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_lists_failed_collections_only() {
        let store = store(
            TableClient::default()
                .with("/api/containers", Ok(vec![1]))
                .with(
                    "/v2/deployments",
                    Err(FetchError::Transport("connection reset".into())),
                ),
        );

        for handle in store.fetch_all().unwrap() {
            handle.settled().await.unwrap();
        }

        assert!(!store.any_loading());
        assert_eq!(
            store.errors(),
            vec![("deployments", "Error loading deployments: connection reset".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_collection_is_a_usage_error() {
        let client = Arc::new(TableClient::default());
        let store = SyncStore::new(
            Arc::clone(&client) as Arc<dyn ResourceClient<u32>>,
            vec![CollectionConfig::new("containers")],
        )
        .unwrap();

        assert!(matches!(
            store.fetch("widgets"),
            Err(StoreError::UnknownCollection(name)) if name == "widgets"
        ));
        assert!(store.items("widgets").is_err());
        assert!(!store.contains("widgets"));
        assert_eq!(client.requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fetch_outside_runtime_fails_without_touching_state() {
        let store = store(TableClient::default());
        assert!(matches!(
            store.fetch("containers"),
            Err(StoreError::NoRuntime(_))
        ));
        assert!(!store.is_loading("containers").unwrap());
    }

    #[tokio::test]
    async fn subscribe_sees_every_transition() {
        let store = store(TableClient::default().with("/api/containers", Ok(vec![1, 2, 3])));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _subscription = store
            .subscribe("containers", {
                let seen = Arc::clone(&seen);
                move |snapshot| seen.lock().push(snapshot)
            })
            .unwrap();

        store.fetch("containers").unwrap().settled().await.unwrap();

        let seen = seen.lock();
        assert!(seen.iter().all(|s| !(s.is_loading && s.has_error())));
        assert!(seen.iter().any(|s| s.is_loading));
        let last = seen.last().unwrap();
        assert_eq!(last.items, vec![1, 2, 3]);
        assert!(!last.is_loading);
    }

    #[test]
    fn empty_collection_list_is_rejected() {
        let result = SyncStore::<u32>::new(Arc::new(TableClient::default()), Vec::new());
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
