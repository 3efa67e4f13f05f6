use contracts::dashboards::d402_sales_panel::{DateRange, FilterState};
use std::collections::BTreeSet;

/// Cross-filter between the top sellers and top stores bars.
///
/// Unlike the chart pair this one is applied by the data source: the fetched
/// sales rows carry no seller/store columns, so a pin becomes a query
/// parameter of the leaderboard query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSelection {
    selected_seller: Option<String>,
    selected_store: Option<String>,
}

impl LeaderboardSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_seller(&self) -> Option<&str> {
        self.selected_seller.as_deref()
    }

    pub fn selected_store(&self) -> Option<&str> {
        self.selected_store.as_deref()
    }

    pub fn pin_seller(&mut self, seller: impl Into<String>) {
        self.selected_seller = Some(seller.into());
        self.selected_store = None;
    }

    pub fn pin_store(&mut self, store: impl Into<String>) {
        self.selected_store = Some(store.into());
        self.selected_seller = None;
    }

    pub fn reset(&mut self) {
        self.selected_seller = None;
        self.selected_store = None;
    }

    /// Parameters of the top-N query for the committed filter and current pins
    pub fn query(&self, filter: &FilterState, top_n: usize) -> LeaderboardQuery {
        LeaderboardQuery {
            date_range: filter.date_range,
            states: filter.states.clone(),
            products: filter.products.clone(),
            top_n,
            selected_seller: self.selected_seller.clone(),
            selected_store: self.selected_store.clone(),
        }
    }
}

/// Full parameter tuple of the leaderboard query; also its cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaderboardQuery {
    pub date_range: DateRange,
    pub states: BTreeSet<String>,
    pub products: BTreeSet<String>,
    pub top_n: usize,
    /// Restricts the stores ranking
    pub selected_seller: Option<String>,
    /// Restricts the sellers ranking
    pub selected_store: Option<String>,
}
