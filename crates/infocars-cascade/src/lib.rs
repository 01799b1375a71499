pub mod controller;
pub mod query_cache;
pub mod selection;
pub mod views;

pub use controller::CascadeController;
pub use query_cache::{CacheKey, QueryCache, QueryState};
pub use selection::{SelectionState, StageData, StageKey, StagePhase};
pub use views::{render_text, CascadeSnapshot, DetailView, SelectorBinding, SelectorView, ViewState};
