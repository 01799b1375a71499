//! Orchestrates the brand → model → year → vehicle chain.
//!
//! The controller is the only writer of [`SelectionState`]. User choices go
//! through [`CascadeController::select`]; list resolutions arrive as cache
//! events and go through [`CascadeController::handle_resolved`]. Both apply a
//! pure transition from [`crate::selection`] and then call
//! [`CascadeController::sync`], which requests whatever the new selection
//! needs.

use std::sync::Arc;

use infocars_core::Stage;
use infocars_fipe::{CatalogSource, FipeError};
use tokio::sync::{broadcast, watch};

use crate::query_cache::{QueryCache, QueryState};
use crate::selection::{SelectionState, StageData, StageKey};
use crate::views::{CascadeSnapshot, SelectorBinding};

pub struct CascadeController<S: CatalogSource> {
    source: Arc<S>,
    cache: QueryCache<StageKey, StageData>,
    selection: watch::Sender<SelectionState>,
}

impl<S: CatalogSource> CascadeController<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(Arc::new(source), QueryCache::new())
    }

    /// Builds a controller over an existing cache, e.g. one shared with
    /// another controller for the same source.
    pub fn with_cache(source: Arc<S>, cache: QueryCache<StageKey, StageData>) -> Self {
        let (selection, _) = watch::channel(SelectionState::default());
        Self {
            source,
            cache,
            selection,
        }
    }

    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.selection.borrow().clone()
    }

    /// Notified on every selection change.
    #[must_use]
    pub fn watch_selection(&self) -> watch::Receiver<SelectionState> {
        self.selection.subscribe()
    }

    /// Notified with the key of every cache entry that finished loading.
    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<StageKey> {
        self.cache.subscribe()
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache<StageKey, StageData> {
        &self.cache
    }

    #[must_use]
    pub fn snapshot(&self) -> CascadeSnapshot {
        CascadeSnapshot::build(self.selection(), |key| self.cache.peek(key))
    }

    /// Binding for one of the three selectable stages.
    #[must_use]
    pub fn binding(&self, stage: Stage) -> Option<SelectorBinding<'_, S>> {
        Stage::SELECTABLE
            .contains(&stage)
            .then(|| SelectorBinding::new(self, stage))
    }

    pub fn set_brand(&self, code: &str) {
        self.select(Stage::Brand, code);
    }

    pub fn set_model(&self, code: &str) {
        self.select(Stage::Model, code);
    }

    pub fn set_year(&self, code: &str) {
        self.select(Stage::Year, code);
    }

    /// Applies a user choice for `stage`, resetting its downstream stages,
    /// and requests whatever the new selection needs.
    pub fn select(&self, stage: Stage, code: &str) {
        let changed = self.selection.send_if_modified(|current| {
            let next = current.select(stage, code);
            if next == *current {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(%stage, code, "selection changed");
        }
        self.sync();
    }

    /// Requests every stage the current selection can form a key for, in
    /// cascade order.
    ///
    /// A list that is already cached is applied immediately, since its
    /// resolution event fired long ago.
    pub fn sync(&self) {
        for stage in [Stage::Brand, Stage::Model, Stage::Year, Stage::Vehicle] {
            let Some(key) = self.selection().key_for(stage) else {
                break;
            };
            if let QueryState::Success(data) = self.request(&key) {
                self.auto_select(&key, &data);
            }
        }
    }

    /// Reacts to a finished load.
    ///
    /// Resolutions for keys the current selection no longer produces are
    /// dropped; their entries stay cached but never touch the selection.
    pub fn handle_resolved(&self, key: &StageKey) {
        let current = self.selection().key_for(key.stage());
        if current.as_ref() != Some(key) {
            tracing::debug!(?key, "ignoring resolution for abandoned selection");
            return;
        }
        if let Some(QueryState::Success(data)) = self.cache.peek(key) {
            self.auto_select(key, &data);
        }
        self.sync();
    }

    /// Event loop: applies every cache resolution until the cache goes away.
    pub async fn run(&self) {
        let mut events = self.cache.subscribe();
        self.sync();
        loop {
            match events.recv().await {
                Ok(key) => self.handle_resolved(&key),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "cascade fell behind cache events, resyncing");
                    self.sync();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Drives the cascade until no stage of the current selection is loading.
    ///
    /// A request that never completes keeps this pending.
    pub async fn settle(&self) {
        self.sync();
        loop {
            let pending = self
                .selection()
                .current_keys()
                .into_iter()
                .find(|key| self.cache.peek(key).is_some_and(|s| s.is_pending()));
            let Some(key) = pending else {
                break;
            };
            self.cache.wait(&key).await;
            self.handle_resolved(&key);
        }
    }

    fn request(&self, key: &StageKey) -> QueryState<StageData> {
        let source = Arc::clone(&self.source);
        let owned = key.clone();
        self.cache
            .get(key.clone(), move || load(source, owned))
    }

    fn auto_select(&self, key: &StageKey, data: &StageData) {
        let Some(items) = data.items() else {
            return;
        };
        let changed = self.selection.send_if_modified(|current| {
            match current.apply_auto_selection(key, items) {
                Some(next) => {
                    *current = next;
                    true
                }
                None => false,
            }
        });
        if changed {
            tracing::debug!(?key, "auto-selected first item");
        }
    }
}

async fn load<S: CatalogSource>(source: Arc<S>, key: StageKey) -> Result<StageData, FipeError> {
    match key {
        StageKey::Brands => source.fetch_brands().await.map(StageData::List),
        StageKey::Models { brand } => source.fetch_models(&brand).await.map(StageData::List),
        StageKey::Years { brand, model } => source
            .fetch_years(&brand, &model)
            .await
            .map(StageData::List),
        StageKey::Vehicle { brand, model, year } => source
            .fetch_vehicle(&brand, &model, &year)
            .await
            .map(StageData::Vehicle),
    }
}
