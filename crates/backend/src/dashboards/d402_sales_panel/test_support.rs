//! Fixtures shared by the d402 unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use contracts::dashboards::d402_sales_panel::{
    DateRange, Leaderboard, RankedRow, SalesMetadata, SalesRow, StateRef, StateSalesRow,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::chart_selection::sorted_desc;
use super::error::{DashboardError, DashboardResult};
use super::filter_state::Catalog;
use super::leaderboard_selection::LeaderboardQuery;
use super::repository::SalesDataSource;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_metadata() -> SalesMetadata {
    SalesMetadata {
        min_date: date(2023, 1, 1),
        max_date: date(2024, 12, 31),
        states: vec![
            StateRef {
                code: "CA".to_string(),
                name: "California".to_string(),
            },
            StateRef {
                code: "NY".to_string(),
                name: "New York".to_string(),
            },
            StateRef {
                code: "TX".to_string(),
                name: "Texas".to_string(),
            },
        ],
        products: vec!["Bike".to_string(), "Helmet".to_string()],
    }
}

/// AllStates = {CA, NY, TX}, AllProducts = {Bike, Helmet}, 2023-01-01..2024-12-31
pub fn sample_catalog() -> Catalog {
    Catalog::from_metadata(sample_metadata())
}

pub fn sales_row(order_date: &str, state: &str, product: &str, value: f64) -> SalesRow {
    let state_name = match state {
        "CA" => "California",
        "NY" => "New York",
        "TX" => "Texas",
        other => other,
    };
    SalesRow {
        order_date: NaiveDate::parse_from_str(order_date, "%Y-%m-%d").unwrap(),
        state_code: state.to_string(),
        state_name: state_name.to_string(),
        product: product.to_string(),
        sales_value: value,
    }
}

/// One order line of the in-memory fact table
#[derive(Debug, Clone)]
pub struct FactLine {
    pub row: SalesRow,
    pub seller: &'static str,
    pub store: &'static str,
}

/// In-memory data source that follows the repository contract and counts calls
#[derive(Default)]
pub struct InMemorySales {
    pub facts: Vec<FactLine>,
    pub calls: AtomicUsize,
    pub unavailable: AtomicBool,
}

impl InMemorySales {
    pub fn sample() -> Self {
        let line = |d: &str, s: &str, p: &str, v: f64, seller: &'static str, store: &'static str| {
            FactLine {
                row: sales_row(d, s, p, v),
                seller,
                store,
            }
        };
        Self {
            facts: vec![
                line("2023-01-10", "CA", "Bike", 100.0, "Jane Doe", "Store A"),
                line("2023-01-10", "CA", "Helmet", 10.0, "Jane Doe", "Store A"),
                line("2023-02-15", "TX", "Bike", 200.0, "Jane Doe", "Store B"),
                line("2023-03-20", "CA", "Helmet", 50.0, "John Smith", "Store B"),
                line("2024-06-30", "TX", "Bike", 400.0, "John Smith", "Store A"),
            ],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> DashboardResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DashboardError::DataSourceUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn matching<'a>(
        &'a self,
        range: DateRange,
        states: &'a BTreeSet<String>,
        products: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a FactLine> + 'a {
        self.facts.iter().filter(move |f| {
            range.contains(f.row.order_date)
                && products.contains(&f.row.product)
                && (states.is_empty() || states.contains(&f.row.state_code))
        })
    }
}

fn ranked(totals: HashMap<&str, f64>, top_n: usize) -> Vec<RankedRow> {
    sorted_desc(totals)
        .into_iter()
        .take(top_n)
        .map(|r| RankedRow {
            name: r.label,
            sales_value: r.sales_value,
        })
        .collect()
}

#[async_trait]
impl SalesDataSource for InMemorySales {
    async fn metadata(&self) -> DashboardResult<SalesMetadata> {
        self.enter()?;
        Ok(sample_metadata())
    }

    async fn sales_by_state(
        &self,
        range: DateRange,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<StateSalesRow>> {
        self.enter()?;
        let no_states = BTreeSet::new();
        let mut totals: HashMap<String, f64> = HashMap::new();
        for fact in self.matching(range, &no_states, products) {
            *totals.entry(fact.row.state_code.clone()).or_insert(0.0) += fact.row.sales_value;
        }
        let mut rows: Vec<StateSalesRow> = totals
            .into_iter()
            .map(|(state_code, sales_value)| StateSalesRow {
                state_code,
                sales_value,
            })
            .collect();
        rows.sort_by(|a, b| a.state_code.cmp(&b.state_code));
        Ok(rows)
    }

    async fn sales_filtered(
        &self,
        range: DateRange,
        states: &BTreeSet<String>,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<SalesRow>> {
        self.enter()?;
        Ok(self
            .matching(range, states, products)
            .map(|f| f.row.clone())
            .collect())
    }

    async fn top_sellers_and_stores(
        &self,
        query: &LeaderboardQuery,
    ) -> DashboardResult<Leaderboard> {
        self.enter()?;
        let mut sellers: HashMap<&str, f64> = HashMap::new();
        let mut stores: HashMap<&str, f64> = HashMap::new();
        for fact in self.matching(query.date_range, &query.states, &query.products) {
            if query.selected_store.as_deref().map_or(true, |s| s == fact.store) {
                *sellers.entry(fact.seller).or_insert(0.0) += fact.row.sales_value;
            }
            if query.selected_seller.as_deref().map_or(true, |s| s == fact.seller) {
                *stores.entry(fact.store).or_insert(0.0) += fact.row.sales_value;
            }
        }
        Ok(Leaderboard {
            sellers: ranked(sellers, query.top_n),
            stores: ranked(stores, query.top_n),
        })
    }
}
