//! Selection state and the pure transition rules of the cascade.
//!
//! A model code only means something under the brand it was listed for, and a
//! year code only under its `(brand, model)`. Every transition here keeps that
//! invariant: writing a stage clears everything downstream of it, and an
//! auto-selection is only accepted for the list the current ancestors asked
//! for.

use infocars_core::{CatalogItem, Stage, VehicleDetail};
use serde::Serialize;

use crate::query_cache::{CacheKey, QueryState};

/// Cache key: the stage plus every ancestor code that stage's request needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageKey {
    Brands,
    Models {
        brand: String,
    },
    Years {
        brand: String,
        model: String,
    },
    Vehicle {
        brand: String,
        model: String,
        year: String,
    },
}

impl StageKey {
    /// The stage whose list (or detail) this key resolves.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            StageKey::Brands => Stage::Brand,
            StageKey::Models { .. } => Stage::Model,
            StageKey::Years { .. } => Stage::Year,
            StageKey::Vehicle { .. } => Stage::Vehicle,
        }
    }

    fn codes(&self) -> Vec<&str> {
        match self {
            StageKey::Brands => Vec::new(),
            StageKey::Models { brand } => vec![brand.as_str()],
            StageKey::Years { brand, model } => vec![brand.as_str(), model.as_str()],
            StageKey::Vehicle { brand, model, year } => {
                vec![brand.as_str(), model.as_str(), year.as_str()]
            }
        }
    }
}

impl CacheKey for StageKey {
    fn is_ready(&self) -> bool {
        self.codes().iter().all(|c| !c.is_empty())
    }
}

/// Payload of a resolved cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageData {
    List(Vec<CatalogItem>),
    Vehicle(VehicleDetail),
}

impl StageData {
    #[must_use]
    pub fn items(&self) -> Option<&[CatalogItem]> {
        match self {
            StageData::List(items) => Some(items),
            StageData::Vehicle(_) => None,
        }
    }

    #[must_use]
    pub fn vehicle(&self) -> Option<&VehicleDetail> {
        match self {
            StageData::Vehicle(v) => Some(v),
            StageData::List(_) => None,
        }
    }
}

/// Per-stage progress as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    Unselected,
    Loading,
    HasSelection,
}

/// The brand, model and year the user is looking at. `None` means unselected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
}

impl SelectionState {
    #[must_use]
    pub fn get(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Brand => self.brand.as_deref(),
            Stage::Model => self.model.as_deref(),
            Stage::Year => self.year.as_deref(),
            Stage::Vehicle => None,
        }
    }

    /// Sets `stage` to `code` and clears every downstream stage.
    ///
    /// An empty code clears the stage itself. Re-selecting the current code
    /// leaves the state untouched, so downstream choices survive. The vehicle
    /// stage has no selection and is ignored.
    #[must_use]
    pub fn select(&self, stage: Stage, code: &str) -> SelectionState {
        let code = Some(code.trim()).filter(|c| !c.is_empty()).map(str::to_owned);
        if stage == Stage::Vehicle || self.get(stage) == code.as_deref() {
            return self.clone();
        }
        match stage {
            Stage::Brand => SelectionState {
                brand: code,
                model: None,
                year: None,
            },
            Stage::Model => SelectionState {
                brand: self.brand.clone(),
                model: code,
                year: None,
            },
            Stage::Year | Stage::Vehicle => SelectionState {
                year: code,
                ..self.clone()
            },
        }
    }

    /// Key of the request `stage` needs, or `None` while an ancestor is unselected.
    #[must_use]
    pub fn key_for(&self, stage: Stage) -> Option<StageKey> {
        let brand = || self.brand.clone();
        let model = || self.model.clone();
        let year = || self.year.clone();
        match stage {
            Stage::Brand => Some(StageKey::Brands),
            Stage::Model => Some(StageKey::Models { brand: brand()? }),
            Stage::Year => Some(StageKey::Years {
                brand: brand()?,
                model: model()?,
            }),
            Stage::Vehicle => Some(StageKey::Vehicle {
                brand: brand()?,
                model: model()?,
                year: year()?,
            }),
        }
    }

    /// Keys of all four stages under the current selection, in cascade order,
    /// stopping at the first stage whose ancestors are incomplete.
    #[must_use]
    pub fn current_keys(&self) -> Vec<StageKey> {
        [Stage::Brand, Stage::Model, Stage::Year, Stage::Vehicle]
            .into_iter()
            .map_while(|stage| self.key_for(stage))
            .collect()
    }

    /// Default-to-first rule for a freshly resolved list.
    ///
    /// Returns the new state only if the list's stage is still unselected, the
    /// list was requested under the *current* ancestors, and it has at least
    /// one item. A list resolved for an abandoned ancestor yields `None`.
    #[must_use]
    pub fn apply_auto_selection(
        &self,
        resolved: &StageKey,
        items: &[CatalogItem],
    ) -> Option<SelectionState> {
        let stage = resolved.stage();
        if stage == Stage::Vehicle || self.get(stage).is_some() {
            return None;
        }
        if self.key_for(stage).as_ref() != Some(resolved) {
            return None;
        }
        let first = items.first()?;
        Some(self.select(stage, &first.code))
    }

    /// Derives the stage's phase from the selection and its list's cache state.
    #[must_use]
    pub fn phase<V>(&self, stage: Stage, list: Option<&QueryState<V>>) -> StagePhase {
        if self.get(stage).is_some() {
            return StagePhase::HasSelection;
        }
        let ancestors_ready = self.key_for(stage).is_some();
        match list {
            Some(QueryState::Pending) => StagePhase::Loading,
            None if ancestors_ready => StagePhase::Loading,
            _ => StagePhase::Unselected,
        }
    }
}
