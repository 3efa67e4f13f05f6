use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ship-to state as listed in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRef {
    pub code: String,
    pub name: String,
}

/// Catalog loaded once per session: date bounds, every state and product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesMetadata {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub states: Vec<StateRef>,
    pub products: Vec<String>,
}

/// Sales total for one state (map query)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSalesRow {
    pub state_code: String,
    pub sales_value: f64,
}

/// Daily aggregate by state and product (tables and charts query)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub order_date: NaiveDate,
    pub state_code: String,
    pub state_name: String,
    pub product: String,
    pub sales_value: f64,
}

/// Leaderboard entry (seller or store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub name: String,
    pub sales_value: f64,
}

/// Top-N sellers and stores for one filter + cross-filter combination
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub sellers: Vec<RankedRow>,
    pub stores: Vec<RankedRow>,
}
