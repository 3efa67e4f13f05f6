use contracts::dashboards::d402_sales_panel::{
    AggregateRow, ChartsView, DashboardView, DateRange, FilterState, Granularity, Kpis,
    Leaderboard, LeaderboardView, SalesRow, StateSalesRow, TablesView,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::chart_selection::sorted_desc;
use super::error::DashboardResult;
use super::filter_state::Catalog;
use super::leaderboard_selection::{LeaderboardQuery, LeaderboardSelection};
use super::map_view::render_map;
use super::repository::SalesDataSource;
use super::session::DashboardSession;
use crate::shared::cache::TtlCache;
use crate::shared::config::DashboardConfig;

/// Map query parameters (states are applied as highlighting, not as a filter)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MapQuery {
    date_range: DateRange,
    products: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SalesQuery {
    date_range: DateRange,
    states: BTreeSet<String>,
    products: BTreeSet<String>,
}

impl SalesQuery {
    fn from_filter(filter: &FilterState) -> Self {
        Self {
            date_range: filter.date_range,
            states: filter.states.clone(),
            products: filter.products.clone(),
        }
    }
}

/// Sales panel queries behind a cache shared by every session, plus rendering.
///
/// Cache keys are the full parameter tuple of each query, so a changed filter
/// never reuses a result computed for the previous one.
pub struct SalesPanelService {
    source: Arc<dyn SalesDataSource>,
    top_n: usize,
    catalog_cache: TtlCache<(), Arc<Catalog>>,
    map_cache: TtlCache<MapQuery, Arc<Vec<StateSalesRow>>>,
    sales_cache: TtlCache<SalesQuery, Arc<Vec<SalesRow>>>,
    leaderboard_cache: TtlCache<LeaderboardQuery, Arc<Leaderboard>>,
}

impl SalesPanelService {
    pub fn new(source: Arc<dyn SalesDataSource>, config: &DashboardConfig) -> Self {
        let query_ttl = Duration::from_secs(config.query_ttl_secs);
        Self {
            source,
            top_n: config.top_n,
            catalog_cache: TtlCache::new(Duration::from_secs(config.metadata_ttl_secs)),
            map_cache: TtlCache::new(query_ttl),
            sales_cache: TtlCache::new(query_ttl),
            leaderboard_cache: TtlCache::new(query_ttl),
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub async fn catalog(&self) -> DashboardResult<Arc<Catalog>> {
        self.catalog_cache
            .get_or_try_insert_with((), || async {
                let metadata = self.source.metadata().await?;
                tracing::info!(
                    "D402 Dashboard: catalog loaded ({} states, {} products, {}..{})",
                    metadata.states.len(),
                    metadata.products.len(),
                    metadata.min_date,
                    metadata.max_date
                );
                Ok(Arc::new(Catalog::from_metadata(metadata)))
            })
            .await
    }

    pub async fn map_sales(&self, filter: &FilterState) -> DashboardResult<Arc<Vec<StateSalesRow>>> {
        let key = MapQuery {
            date_range: filter.date_range,
            products: filter.products.clone(),
        };
        self.map_cache
            .get_or_try_insert_with(key.clone(), || async {
                let rows = self
                    .source
                    .sales_by_state(key.date_range, &key.products)
                    .await?;
                Ok(Arc::new(rows))
            })
            .await
    }

    pub async fn sales(&self, filter: &FilterState) -> DashboardResult<Arc<Vec<SalesRow>>> {
        let key = SalesQuery::from_filter(filter);
        self.sales_cache
            .get_or_try_insert_with(key.clone(), || async {
                let rows = self
                    .source
                    .sales_filtered(key.date_range, &key.states, &key.products)
                    .await?;
                tracing::debug!("D402 Dashboard: fetched {} sales rows", rows.len());
                Ok(Arc::new(rows))
            })
            .await
    }

    pub async fn leaderboard(
        &self,
        filter: &FilterState,
        selection: &LeaderboardSelection,
    ) -> DashboardResult<Arc<Leaderboard>> {
        let key = selection.query(filter, self.top_n);
        self.leaderboard_cache
            .get_or_try_insert_with(key.clone(), || async {
                let board = self.source.top_sellers_and_stores(&key).await?;
                Ok(Arc::new(board))
            })
            .await
    }

    /// Recompute every view of a session from its current state
    pub async fn render(&self, session: &mut DashboardSession) -> DashboardResult<DashboardView> {
        let catalog = self.catalog().await?;
        let filter = session.initialize(&catalog).clone();

        let map_rows = self.map_sales(&filter).await?;
        let sales = self.sales(&filter).await?;
        let board = self.leaderboard(&filter, session.leaderboard()).await?;

        let chart = session.chart();
        let bars = chart.effective_bar_data(&sales);
        let line = chart.effective_line_data(&sales);
        let charts = ChartsView {
            granularity: chart.granularity(),
            selected_product: chart.selected_product().map(str::to_string),
            selected_period: chart.selected_period().map(str::to_string),
            no_data: sales.is_empty(),
            no_bar_data: bars.is_empty(),
            no_line_data: line.is_empty(),
            bars,
            line,
        };

        let leaderboard = LeaderboardView {
            top_n: self.top_n,
            selected_seller: session.leaderboard().selected_seller().map(str::to_string),
            selected_store: session.leaderboard().selected_store().map(str::to_string),
            sellers: board.sellers.clone(),
            stores: board.stores.clone(),
            no_data: board.sellers.is_empty() && board.stores.is_empty(),
        };

        Ok(DashboardView {
            map: render_map(&catalog, &filter.states, &map_rows),
            filters: session.staged().view(&catalog, &filter),
            tables: render_tables(&filter, &sales),
            charts,
            leaderboard,
            filter,
        })
    }
}

/// KPIs and the three summary tables (by state, by product, by month)
pub fn render_tables(filter: &FilterState, rows: &[SalesRow]) -> TablesView {
    let mut by_state: HashMap<&str, f64> = HashMap::new();
    let mut by_product: HashMap<&str, f64> = HashMap::new();
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();

    for row in rows {
        *by_state.entry(row.state_name.as_str()).or_insert(0.0) += row.sales_value;
        *by_product.entry(row.product.as_str()).or_insert(0.0) += row.sales_value;
        *by_month
            .entry(Granularity::Month.bucket(row.order_date))
            .or_insert(0.0) += row.sales_value;
    }

    TablesView {
        kpis: Kpis {
            total_sales: rows.iter().map(|r| r.sales_value).sum(),
            row_count: rows.len(),
            states_filtered: (!filter.states.is_empty()).then_some(filter.states.len()),
        },
        by_state: sorted_desc(by_state),
        by_product: sorted_desc(by_product),
        by_month: by_month
            .into_iter()
            .map(|(label, sales_value)| AggregateRow { label, sales_value })
            .collect(),
        no_data: rows.is_empty(),
    }
}
