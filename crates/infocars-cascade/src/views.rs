//! Presentation bindings: read-only view models of each stage plus a
//! plain-text renderer. Renderers never touch selection state; choices go
//! back through [`SelectorBinding`].

use std::fmt::Write as _;

use infocars_core::{CatalogItem, Stage, VehicleDetail};
use infocars_fipe::CatalogSource;
use serde::Serialize;

use crate::controller::CascadeController;
use crate::query_cache::QueryState;
use crate::selection::{SelectionState, StageData, StageKey, StagePhase};

/// What a stage's view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    /// Nothing to show until an ancestor is chosen.
    Idle,
    Loading,
    Error(String),
    Ready(T),
}

impl<T> ViewState<T> {
    /// Maps a cache entry into a view state.
    ///
    /// `ancestors_ready` distinguishes a key that was never formed (idle) from
    /// one that is formed but not requested yet (about to load).
    fn from_query(
        state: Option<QueryState<StageData>>,
        ancestors_ready: bool,
        project: impl FnOnce(&StageData) -> Option<T>,
    ) -> Self {
        match state {
            Some(QueryState::Success(data)) => {
                project(data.as_ref()).map_or(ViewState::Idle, ViewState::Ready)
            }
            Some(QueryState::Error(message)) => ViewState::Error(message),
            Some(QueryState::Pending) => ViewState::Loading,
            None if ancestors_ready => ViewState::Loading,
            Some(QueryState::Idle) | None => ViewState::Idle,
        }
    }
}

/// One choice control (brand, model or year).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorView {
    pub stage: Stage,
    pub title: &'static str,
    pub phase: StagePhase,
    pub selected: Option<String>,
    pub state: ViewState<Vec<CatalogItem>>,
}

impl SelectorView {
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        match &self.state {
            ViewState::Ready(items) => items,
            _ => &[],
        }
    }

    /// The item matching the current selection, if it is in the list.
    #[must_use]
    pub fn selected_item(&self) -> Option<&CatalogItem> {
        let code = self.selected.as_deref()?;
        self.items().iter().find(|item| item.code == code)
    }
}

/// The resolved vehicle's price and specification panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub state: ViewState<VehicleDetail>,
}

impl DetailView {
    /// Heading of the panel: the vehicle's model name.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match &self.state {
            ViewState::Ready(v) => Some(&v.model_name),
            _ => None,
        }
    }

    /// The seven labelled rows of the panel, in display order.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let ViewState::Ready(v) = &self.state else {
            return Vec::new();
        };
        vec![
            ("Price", v.price.clone()),
            ("Brand", v.brand_name.clone()),
            ("Year", v.model_year.to_string()),
            ("Fuel", v.fuel_type.clone()),
            ("FIPE Code", v.fipe_code.clone()),
            ("Month of reference", v.reference_month.clone()),
            ("Fuel Acronym", v.fuel_acronym.clone()),
        ]
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeSnapshot {
    pub selection: SelectionState,
    pub brand: SelectorView,
    pub model: SelectorView,
    pub year: SelectorView,
    pub vehicle: DetailView,
}

impl CascadeSnapshot {
    /// Builds a snapshot from a selection and a cache lookup.
    pub fn build(
        selection: SelectionState,
        lookup: impl Fn(&StageKey) -> Option<QueryState<StageData>>,
    ) -> Self {
        let selector = |stage: Stage, title: &'static str| {
            let key = selection.key_for(stage);
            let entry = key.as_ref().and_then(&lookup);
            SelectorView {
                stage,
                title,
                phase: selection.phase(stage, entry.as_ref()),
                selected: selection.get(stage).map(str::to_owned),
                state: ViewState::from_query(entry, key.is_some(), |d| {
                    d.items().map(<[CatalogItem]>::to_vec)
                }),
            }
        };

        let brand = selector(Stage::Brand, "Brand");
        let model = selector(Stage::Model, "Model");
        let year = selector(Stage::Year, "Year");

        let vehicle_key = selection.key_for(Stage::Vehicle);
        let vehicle = DetailView {
            state: ViewState::from_query(
                vehicle_key.as_ref().and_then(&lookup),
                vehicle_key.is_some(),
                |d| d.vehicle().cloned(),
            ),
        };

        Self {
            selection,
            brand,
            model,
            year,
            vehicle,
        }
    }

    #[must_use]
    pub fn selectors(&self) -> [&SelectorView; 3] {
        [&self.brand, &self.model, &self.year]
    }

    #[must_use]
    pub fn selector(&self, stage: Stage) -> Option<&SelectorView> {
        self.selectors().into_iter().find(|s| s.stage == stage)
    }
}

/// A selector view tied to its stage's setter on the controller.
pub struct SelectorBinding<'a, S: CatalogSource> {
    controller: &'a CascadeController<S>,
    stage: Stage,
}

impl<'a, S: CatalogSource> SelectorBinding<'a, S> {
    pub(crate) fn new(controller: &'a CascadeController<S>, stage: Stage) -> Self {
        Self { controller, stage }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current view of this selector.
    #[must_use]
    pub fn view(&self) -> SelectorView {
        let snapshot = self.controller.snapshot();
        match self.stage {
            Stage::Model => snapshot.model,
            Stage::Year => snapshot.year,
            Stage::Brand | Stage::Vehicle => snapshot.brand,
        }
    }

    /// Forwards a user choice to the controller.
    pub fn choose(&self, code: &str) {
        self.controller.select(self.stage, code);
    }
}

/// Renders a snapshot as plain text, one line per selector followed by the
/// detail panel.
#[must_use]
pub fn render_text(snapshot: &CascadeSnapshot) -> String {
    let mut out = String::new();
    for selector in snapshot.selectors() {
        let line = match &selector.state {
            ViewState::Idle => "-".to_owned(),
            ViewState::Loading => "Loading...".to_owned(),
            ViewState::Error(message) => format!("Error: {message}"),
            ViewState::Ready(items) => match selector.selected_item() {
                Some(item) => {
                    format!("{} [{}] ({} options)", item.label, item.code, items.len())
                }
                None if items.is_empty() => "no options".to_owned(),
                None => format!("not selected ({} options)", items.len()),
            },
        };
        let _ = writeln!(out, "{}: {line}", selector.title);
    }

    match &snapshot.vehicle.state {
        ViewState::Idle => {}
        ViewState::Loading => out.push_str("\nLoading...\n"),
        ViewState::Error(message) => {
            let _ = write!(out, "\nError: {message}\n");
        }
        ViewState::Ready(_) => {
            let title = snapshot.vehicle.title().unwrap_or_default();
            let _ = write!(out, "\n{title}\n");
            for (label, value) in snapshot.vehicle.fields() {
                let _ = writeln!(out, "  {label}: {value}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;

    fn detail() -> VehicleDetail {
        VehicleDetail {
            model_name: "Integra GS 1.8".to_owned(),
            price: "R$ 12.345,00".to_owned(),
            brand_name: "Acura".to_owned(),
            model_year: 1992,
            fuel_type: "Gasolina".to_owned(),
            fipe_code: "038003-2".to_owned(),
            reference_month: "maio de 2023".to_owned(),
            fuel_acronym: "G".to_owned(),
        }
    }

    fn selection(brand: &str, model: &str, year: &str) -> SelectionState {
        SelectionState::default()
            .select(Stage::Brand, brand)
            .select(Stage::Model, model)
            .select(Stage::Year, year)
    }

    fn list(codes: &[(&str, &str)]) -> QueryState<StageData> {
        QueryState::Success(Arc::new(StageData::List(
            codes.iter().map(|(c, l)| CatalogItem::new(*c, *l)).collect(),
        )))
    }

    #[test]
    fn detail_fields_are_in_fixed_order() {
        let view = DetailView {
            state: ViewState::Ready(detail()),
        };
        let labels: Vec<&str> = view.fields().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            [
                "Price",
                "Brand",
                "Year",
                "Fuel",
                "FIPE Code",
                "Month of reference",
                "Fuel Acronym"
            ]
        );
        assert_eq!(view.title(), Some("Integra GS 1.8"));
    }

    #[test]
    fn snapshot_maps_cache_states_to_views() {
        let sel = selection("1", "7", "1992-1");
        let mut entries: HashMap<StageKey, QueryState<StageData>> = HashMap::new();
        entries.insert(StageKey::Brands, list(&[("1", "Acura"), ("2", "Honda")]));
        entries.insert(sel.key_for(Stage::Model).unwrap(), QueryState::Pending);
        entries.insert(
            sel.key_for(Stage::Year).unwrap(),
            QueryState::Error("HTTP 500".to_owned()),
        );

        let snapshot = CascadeSnapshot::build(sel, |k| entries.get(k).cloned());

        assert_eq!(snapshot.brand.items().len(), 2);
        assert_eq!(
            snapshot.brand.selected_item().map(|i| i.label.as_str()),
            Some("Acura")
        );
        assert_eq!(snapshot.model.state, ViewState::Loading);
        assert_eq!(snapshot.year.state, ViewState::Error("HTTP 500".to_owned()));
        // Vehicle key is formed but not requested yet.
        assert_eq!(snapshot.vehicle.state, ViewState::Loading);
    }

    #[test]
    fn unformed_keys_render_idle() {
        let snapshot = CascadeSnapshot::build(SelectionState::default(), |_| None);
        assert_eq!(snapshot.brand.state, ViewState::Loading);
        assert_eq!(snapshot.model.state, ViewState::Idle);
        assert_eq!(snapshot.year.state, ViewState::Idle);
        assert_eq!(snapshot.vehicle.state, ViewState::Idle);
        assert_eq!(snapshot.model.phase, StagePhase::Unselected);
    }

    #[test]
    fn render_text_shows_selection_and_detail() {
        let sel = selection("1", "7", "1992-1");
        let mut entries: HashMap<StageKey, QueryState<StageData>> = HashMap::new();
        entries.insert(StageKey::Brands, list(&[("1", "Acura")]));
        entries.insert(
            sel.key_for(Stage::Model).unwrap(),
            list(&[("7", "Integra GS 1.8")]),
        );
        entries.insert(
            sel.key_for(Stage::Year).unwrap(),
            list(&[("1992-1", "1992 Gasolina")]),
        );
        entries.insert(
            sel.key_for(Stage::Vehicle).unwrap(),
            QueryState::Success(Arc::new(StageData::Vehicle(detail()))),
        );

        let text = render_text(&CascadeSnapshot::build(sel, |k| entries.get(k).cloned()));

        assert!(text.contains("Brand: Acura [1] (1 options)"), "{text}");
        assert!(text.contains("Year: 1992 Gasolina [1992-1]"), "{text}");
        assert!(text.contains("  Price: R$ 12.345,00"), "{text}");
        assert!(text.contains("  Fuel Acronym: G"), "{text}");
    }

    #[test]
    fn snapshot_serializes_view_state_with_status_tag() {
        let snapshot = CascadeSnapshot::build(SelectionState::default(), |_| None);
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["brand"]["state"]["status"], "loading");
        assert_eq!(json["vehicle"]["state"]["status"], "idle");
    }
}
