use contracts::dashboards::d402_sales_panel::{DashboardAction, DateRange, FilterState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::chart_selection::ChartSelection;
use super::error::{DashboardError, DashboardResult};
use super::filter_state::{Catalog, FilterStateManager};
use super::leaderboard_selection::LeaderboardSelection;
use super::staged_edits::StagedEdits;

/// Per-user dashboard state: committed filter, staged table edits and both
/// cross-filter pairs.
#[derive(Debug)]
pub struct DashboardSession {
    filter: FilterStateManager,
    staged: StagedEdits,
    chart: ChartSelection,
    leaderboard: LeaderboardSelection,
    last_seen: Instant,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardSession {
    pub fn new() -> Self {
        Self {
            filter: FilterStateManager::new(),
            staged: StagedEdits::new(),
            chart: ChartSelection::new(),
            leaderboard: LeaderboardSelection::new(),
            last_seen: Instant::now(),
        }
    }

    /// Committed filter, created from the catalog defaults on first use
    pub fn initialize(&mut self, catalog: &Catalog) -> &FilterState {
        self.filter.initialize(catalog)
    }

    pub fn staged(&self) -> &StagedEdits {
        &self.staged
    }

    pub fn chart(&self) -> &ChartSelection {
        &self.chart
    }

    pub fn leaderboard(&self) -> &LeaderboardSelection {
        &self.leaderboard
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Run one user interaction to completion.
    ///
    /// Invalid values are rejected before anything changes.
    pub fn apply(&mut self, catalog: &Catalog, action: DashboardAction) -> DashboardResult<()> {
        self.touch();
        self.filter.initialize(catalog);

        match action {
            DashboardAction::SelectAllStates => {
                self.filter.select_all_states(catalog);
                self.staged.discard_states();
            }
            DashboardAction::SelectNoStates => {
                self.filter.select_no_states(catalog);
                self.staged.discard_states();
            }
            DashboardAction::SelectAllProducts => {
                self.filter.select_all_products(catalog);
                self.staged.discard_products();
            }
            DashboardAction::SelectNoProducts => {
                self.filter.select_no_products(catalog);
                self.staged.discard_products();
            }
            DashboardAction::StageState { code, checked } => {
                let code = catalog
                    .validate_states([&code])?
                    .into_iter()
                    .next()
                    .unwrap_or(code);
                let committed = self.filter.initialize(catalog);
                self.staged.stage_state(committed, &code, checked);
            }
            DashboardAction::StageProduct { name, checked } => {
                catalog.validate_products([&name])?;
                let committed = self.filter.initialize(catalog);
                self.staged.stage_product(committed, &name, checked);
            }
            DashboardAction::ApplyStaged => {
                let (states, products) = self.staged.selections(self.filter.initialize(catalog));
                self.filter
                    .apply_staged_selections(catalog, &states, &products)?;
                self.staged.clear();
            }
            DashboardAction::ResetAll => self.reset_all(catalog),
            DashboardAction::SetDateRange { start, end } => {
                self.filter
                    .set_date_range(catalog, DateRange::new(start, end))?;
            }
            DashboardAction::PinProduct { product } => {
                let committed = self.filter.initialize(catalog);
                if !committed.products.contains(&product) {
                    return Err(DashboardError::invalid(format!(
                        "product '{}' is not in the current filter",
                        product
                    )));
                }
                self.chart.pin_product(product);
            }
            DashboardAction::PinPeriod { period } => self.chart.pin_period(period)?,
            DashboardAction::ChangeGranularity { granularity } => {
                self.chart.change_granularity(granularity)
            }
            DashboardAction::ClearChartSelection => self.chart.reset(),
            DashboardAction::PinSeller { seller } => self.leaderboard.pin_seller(seller),
            DashboardAction::PinStore { store } => self.leaderboard.pin_store(store),
            DashboardAction::ClearLeaderboardSelection => self.leaderboard.reset(),
        }

        // A product that left the filter can no longer be pinned on the bar chart
        let products = &self.filter.initialize(catalog).products;
        self.chart.retain_product(|p| products.contains(p));
        Ok(())
    }

    /// Session defaults, no staged edits, no pins
    pub fn reset_all(&mut self, catalog: &Catalog) {
        self.filter.reset_all(catalog);
        self.staged.clear();
        self.chart.reset();
        self.leaderboard.reset();
    }
}

/// In-memory registry of dashboard sessions.
///
/// Each session sits behind its own async mutex: an interaction holds it
/// from mutation through rendering, so interactions of one session never
/// overlap while different sessions proceed independently.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<DashboardSession>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, Arc<Mutex<DashboardSession>>) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(DashboardSession::new()));
        self.sessions.write().await.insert(id, session.clone());
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> DashboardResult<Arc<Mutex<DashboardSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DashboardError::SessionNotFound(id.to_string()))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than `max_idle`; busy sessions are kept
    pub async fn cleanup_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.idle_for() < max_idle,
            Err(_) => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d402_sales_panel::map_view::render_map;
    use crate::dashboards::d402_sales_panel::test_support::{date, sample_catalog};
    use contracts::dashboards::d402_sales_panel::Granularity;
    use maplit::btreeset;
    use std::collections::BTreeSet;

    fn committed(session: &mut DashboardSession, catalog: &Catalog) -> FilterState {
        session.initialize(catalog).clone()
    }

    #[test]
    fn test_select_none_then_apply_still_highlights_everything() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        let initial = committed(&mut session, &catalog);
        assert!(initial.states.is_empty());
        assert_eq!(
            initial.products,
            btreeset! {"Bike".to_string(), "Helmet".to_string()}
        );

        session
            .apply(&catalog, DashboardAction::SelectNoStates)
            .unwrap();
        session.apply(&catalog, DashboardAction::ApplyStaged).unwrap();

        let filter = committed(&mut session, &catalog);
        assert!(filter.states.is_empty());
        let map = render_map(&catalog, &filter.states, &[]);
        assert!(map.cells.iter().all(|c| c.highlighted));
        assert_eq!(map.caption, "All");
    }

    #[test]
    fn test_staged_edits_need_apply() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();

        session
            .apply(
                &catalog,
                DashboardAction::StageState {
                    code: "tx".to_string(),
                    checked: true,
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::StageProduct {
                    name: "Helmet".to_string(),
                    checked: false,
                },
            )
            .unwrap();
        assert!(committed(&mut session, &catalog).states.is_empty());
        assert_eq!(committed(&mut session, &catalog).products.len(), 2);

        session.apply(&catalog, DashboardAction::ApplyStaged).unwrap();
        let filter = committed(&mut session, &catalog);
        assert_eq!(filter.states, btreeset! {"TX".to_string()});
        assert_eq!(filter.products, btreeset! {"Bike".to_string()});
        assert_eq!(session.staged(), &StagedEdits::new());
    }

    #[test]
    fn test_bulk_actions_commit_immediately_and_drop_staged_table() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(
                &catalog,
                DashboardAction::StageState {
                    code: "CA".to_string(),
                    checked: true,
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::StageProduct {
                    name: "Bike".to_string(),
                    checked: false,
                },
            )
            .unwrap();

        session
            .apply(&catalog, DashboardAction::SelectAllStates)
            .unwrap();

        let filter = committed(&mut session, &catalog);
        assert_eq!(&filter.states, catalog.all_state_codes());
        // The product table edit is still pending
        let (states, products) = session.staged().selections(&filter);
        assert_eq!(&states, catalog.all_state_codes());
        assert_eq!(products, btreeset! {"Helmet".to_string()});
    }

    #[test]
    fn test_unknown_stage_value_is_rejected() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        let err = session
            .apply(
                &catalog,
                DashboardAction::StageState {
                    code: "ZZ".to_string(),
                    checked: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilterValue(_)));
        assert_eq!(session.staged(), &StagedEdits::new());
    }

    #[test]
    fn test_unknown_stage_product_is_rejected() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(
                &catalog,
                DashboardAction::StageState {
                    code: "CA".to_string(),
                    checked: true,
                },
            )
            .unwrap();
        let staged_before = session.staged().clone();

        let err = session
            .apply(
                &catalog,
                DashboardAction::StageProduct {
                    name: "Skateboard".to_string(),
                    checked: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilterValue(_)));
        assert_eq!(session.staged(), &staged_before);

        let filter = committed(&mut session, &catalog);
        let (_, products) = session.staged().selections(&filter);
        assert_eq!(products, filter.products);
    }

    #[test]
    fn test_non_canonical_period_keeps_pinned_product() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(
                &catalog,
                DashboardAction::PinProduct {
                    product: "Bike".to_string(),
                },
            )
            .unwrap();

        for period in [" 2024-3", "+999-01"] {
            let err = session
                .apply(
                    &catalog,
                    DashboardAction::PinPeriod {
                        period: period.to_string(),
                    },
                )
                .unwrap_err();
            assert!(matches!(err, DashboardError::InvalidFilterValue(_)));
        }
        assert_eq!(session.chart().selected_product(), Some("Bike"));
        assert_eq!(session.chart().selected_period(), None);
    }

    #[test]
    fn test_reset_all_clears_everything() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(&catalog, DashboardAction::SelectNoProducts)
            .unwrap();
        session
            .apply(&catalog, DashboardAction::SelectAllStates)
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::SetDateRange {
                    start: date(2023, 3, 1),
                    end: date(2023, 3, 31),
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::PinPeriod {
                    period: "2023-03".to_string(),
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::PinSeller {
                    seller: "Jane Doe".to_string(),
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::StageState {
                    code: "NY".to_string(),
                    checked: false,
                },
            )
            .unwrap();

        session.apply(&catalog, DashboardAction::ResetAll).unwrap();

        assert_eq!(committed(&mut session, &catalog), catalog.defaults());
        assert_eq!(session.staged(), &StagedEdits::new());
        assert_eq!(session.chart().selected_period(), None);
        assert_eq!(session.chart().selected_product(), None);
        assert_eq!(session.leaderboard().selected_seller(), None);
        assert_eq!(session.leaderboard().selected_store(), None);
    }

    #[test]
    fn test_pinning_store_clears_seller() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(
                &catalog,
                DashboardAction::PinSeller {
                    seller: "Jane Doe".to_string(),
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::PinStore {
                    store: "Store A".to_string(),
                },
            )
            .unwrap();

        assert_eq!(session.leaderboard().selected_seller(), None);
        assert_eq!(session.leaderboard().selected_store(), Some("Store A"));
    }

    #[test]
    fn test_pinned_product_dropped_with_product_filter() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        session
            .apply(
                &catalog,
                DashboardAction::PinProduct {
                    product: "Bike".to_string(),
                },
            )
            .unwrap();
        session
            .apply(
                &catalog,
                DashboardAction::ChangeGranularity {
                    granularity: Granularity::Year,
                },
            )
            .unwrap();
        assert_eq!(session.chart().selected_product(), Some("Bike"));

        session
            .apply(&catalog, DashboardAction::SelectNoProducts)
            .unwrap();
        assert_eq!(session.chart().selected_product(), None);

        let err = session
            .apply(
                &catalog,
                DashboardAction::PinProduct {
                    product: "Bike".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilterValue(_)));
    }

    #[test]
    fn test_invalid_apply_keeps_state() {
        let catalog = sample_catalog();
        let mut session = DashboardSession::new();
        let before = committed(&mut session, &catalog);

        let err = session
            .apply(
                &catalog,
                DashboardAction::SetDateRange {
                    start: date(2024, 1, 1),
                    end: date(2023, 1, 1),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilterValue(_)));
        assert_eq!(committed(&mut session, &catalog), before);
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let catalog = sample_catalog();
        let store = SessionStore::new();
        let (first_id, first) = store.create().await;
        let (second_id, _) = store.create().await;
        assert_ne!(first_id, second_id);

        first
            .lock()
            .await
            .apply(&catalog, DashboardAction::SelectNoProducts)
            .unwrap();

        let second = store.get(second_id).await.unwrap();
        let mut second = second.lock().await;
        assert_eq!(second.initialize(&catalog).products.len(), 2);
        let mut first = first.lock().await;
        assert_eq!(first.initialize(&catalog).products, BTreeSet::new());
    }

    #[tokio::test]
    async fn test_store_remove_and_missing() {
        let store = SessionStore::new();
        let (id, _) = store.create().await;
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);

        let err = store.get(id).await.unwrap_err();
        assert!(matches!(err, DashboardError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_cleanup_idle() {
        let store = SessionStore::new();
        store.create().await;
        store.create().await;

        assert_eq!(store.cleanup_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.cleanup_idle(Duration::ZERO).await, 2);
        assert_eq!(store.len().await, 0);
    }
}
