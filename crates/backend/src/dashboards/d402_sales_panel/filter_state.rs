use contracts::dashboards::d402_sales_panel::{DateRange, FilterState, SalesMetadata, StateRef};
use std::collections::BTreeSet;

use super::error::{DashboardError, DashboardResult};

/// Normalized state code: trimmed and upper-cased
pub fn normalize_state_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Session catalog: date bounds plus every known state and product.
///
/// Built once from the metadata query and never mutated; every filter value
/// is checked against it before it reaches the committed filter.
#[derive(Debug, Clone)]
pub struct Catalog {
    bounds: DateRange,
    states: Vec<StateRef>,
    products: Vec<String>,
    state_codes: BTreeSet<String>,
    product_names: BTreeSet<String>,
}

impl Catalog {
    pub fn from_metadata(metadata: SalesMetadata) -> Self {
        let mut state_codes = BTreeSet::new();
        let states: Vec<StateRef> = metadata
            .states
            .into_iter()
            .map(|s| StateRef {
                code: normalize_state_code(&s.code),
                name: s.name,
            })
            .filter(|s| !s.code.is_empty() && state_codes.insert(s.code.clone()))
            .collect();

        let mut product_names = BTreeSet::new();
        let products: Vec<String> = metadata
            .products
            .into_iter()
            .filter(|p| product_names.insert(p.clone()))
            .collect();

        Self {
            bounds: DateRange::new(metadata.min_date, metadata.max_date),
            states,
            products,
            state_codes,
            product_names,
        }
    }

    pub fn bounds(&self) -> DateRange {
        self.bounds
    }

    /// States in catalog order (as returned by the data source)
    pub fn states(&self) -> &[StateRef] {
        &self.states
    }

    /// Products in catalog order
    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn all_state_codes(&self) -> &BTreeSet<String> {
        &self.state_codes
    }

    pub fn all_products(&self) -> &BTreeSet<String> {
        &self.product_names
    }

    pub fn state_name(&self, code: &str) -> Option<&str> {
        self.states
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.name.as_str())
    }

    /// Session defaults: full date range, every product, empty state set (= all states)
    pub fn defaults(&self) -> FilterState {
        FilterState {
            date_range: self.bounds,
            products: self.product_names.clone(),
            states: BTreeSet::new(),
        }
    }

    /// Normalize and check state codes against the catalog
    pub fn validate_states<'a, I>(&self, codes: I) -> DashboardResult<BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out = BTreeSet::new();
        for code in codes {
            let normalized = normalize_state_code(code);
            if !self.state_codes.contains(&normalized) {
                return Err(DashboardError::invalid(format!("unknown state code '{}'", code)));
            }
            out.insert(normalized);
        }
        Ok(out)
    }

    pub fn validate_products<'a, I>(&self, names: I) -> DashboardResult<BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out = BTreeSet::new();
        for name in names {
            if !self.product_names.contains(name) {
                return Err(DashboardError::invalid(format!("unknown product '{}'", name)));
            }
            out.insert(name.clone());
        }
        Ok(out)
    }

    pub fn validate_date_range(&self, range: DateRange) -> DashboardResult<DateRange> {
        if !range.is_ordered() {
            return Err(DashboardError::invalid(format!(
                "start date {} is after end date {}",
                range.start, range.end
            )));
        }
        if !self.bounds.covers(&range) {
            return Err(DashboardError::invalid(format!(
                "date range {}..{} is outside {}..{}",
                range.start, range.end, self.bounds.start, self.bounds.end
            )));
        }
        Ok(range)
    }
}

/// Holder of the committed filter for one session.
///
/// Every write goes through a named operation that validates first, so a
/// rejected value never leaves the filter half-updated. Each operation
/// returns the new committed state.
#[derive(Debug, Clone, Default)]
pub struct FilterStateManager {
    committed: Option<FilterState>,
}

impl FilterStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session defaults unless a filter already exists
    pub fn initialize(&mut self, catalog: &Catalog) -> &FilterState {
        self.committed.get_or_insert_with(|| catalog.defaults())
    }

    pub fn committed(&self) -> Option<&FilterState> {
        self.committed.as_ref()
    }

    /// Replace states and products atomically; the date range is kept
    pub fn apply_staged_selections(
        &mut self,
        catalog: &Catalog,
        states: &BTreeSet<String>,
        products: &BTreeSet<String>,
    ) -> DashboardResult<&FilterState> {
        let states = catalog.validate_states(states)?;
        let products = catalog.validate_products(products)?;

        let filter = self.state_mut(catalog);
        filter.states = states;
        filter.products = products;
        Ok(filter)
    }

    pub fn select_all_states(&mut self, catalog: &Catalog) -> &FilterState {
        let filter = self.state_mut(catalog);
        filter.states = catalog.all_state_codes().clone();
        filter
    }

    /// Clear the state set, which reads as "all states" downstream
    pub fn select_no_states(&mut self, catalog: &Catalog) -> &FilterState {
        let filter = self.state_mut(catalog);
        filter.states.clear();
        filter
    }

    pub fn select_all_products(&mut self, catalog: &Catalog) -> &FilterState {
        let filter = self.state_mut(catalog);
        filter.products = catalog.all_products().clone();
        filter
    }

    /// Clear the product set; every query then yields no rows
    pub fn select_no_products(&mut self, catalog: &Catalog) -> &FilterState {
        let filter = self.state_mut(catalog);
        filter.products.clear();
        filter
    }

    pub fn set_date_range(
        &mut self,
        catalog: &Catalog,
        range: DateRange,
    ) -> DashboardResult<&FilterState> {
        let range = catalog.validate_date_range(range)?;
        let filter = self.state_mut(catalog);
        filter.date_range = range;
        Ok(filter)
    }

    /// Replace the committed filter with the session defaults
    pub fn reset_all(&mut self, catalog: &Catalog) -> &FilterState {
        self.committed.insert(catalog.defaults())
    }

    fn state_mut(&mut self, catalog: &Catalog) -> &mut FilterState {
        self.committed.get_or_insert_with(|| catalog.defaults())
    }
}
