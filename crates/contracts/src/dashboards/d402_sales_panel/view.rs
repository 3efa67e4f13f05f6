use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::{FilterState, Granularity};
use super::rows::RankedRow;

/// Response for session creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub view: DashboardView,
}

/// Everything the page renders for one session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub filter: FilterState,
    pub map: MapView,
    pub filters: FiltersView,
    pub tables: TablesView,
    pub charts: ChartsView,
    pub leaderboard: LeaderboardView,
}

/// Choropleth input: one cell per catalog state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapView {
    pub cells: Vec<MapCell>,
    /// Selected codes joined with ", " or "All"
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapCell {
    pub code: String,
    pub name: String,
    pub sales_value: f64,
    pub highlighted: bool,
}

/// Editable state/product tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersView {
    pub states: Vec<FilterRow>,
    pub products: Vec<FilterRow>,
    pub has_pending_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRow {
    pub key: String,
    pub label: String,
    /// Checkbox value shown in the table (staged edit if any)
    pub checked: bool,
    /// Value in the committed filter
    pub committed: bool,
}

/// Label/value pair used by tables and chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub label: String,
    pub sales_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub row_count: usize,
    /// None when every state is included
    pub states_filtered: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesView {
    pub kpis: Kpis,
    pub by_state: Vec<AggregateRow>,
    pub by_product: Vec<AggregateRow>,
    /// Buckets labelled "YYYY-MM"
    pub by_month: Vec<AggregateRow>,
    pub no_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsView {
    pub granularity: Granularity,
    pub selected_product: Option<String>,
    pub selected_period: Option<String>,
    /// Sales by product, descending
    pub bars: Vec<AggregateRow>,
    /// Sales by period, ascending
    pub line: Vec<AggregateRow>,
    /// No sales rows for the committed filter
    pub no_data: bool,
    /// Bar series empty after the period pin
    pub no_bar_data: bool,
    /// Line series empty after the product pin
    pub no_line_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub top_n: usize,
    pub selected_seller: Option<String>,
    pub selected_store: Option<String>,
    pub sellers: Vec<RankedRow>,
    pub stores: Vec<RankedRow>,
    pub no_data: bool,
}
