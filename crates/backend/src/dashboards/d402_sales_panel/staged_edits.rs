use contracts::dashboards::d402_sales_panel::{FilterRow, FilterState, FiltersView};
use std::collections::BTreeSet;

use super::filter_state::{normalize_state_code, Catalog};

/// Unapplied checkbox edits of the two filter tables.
///
/// `None` means the table has not been touched and mirrors the committed
/// filter. Edits become effective only through `FilterStateManager::apply_staged_selections`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedEdits {
    states: Option<BTreeSet<String>>,
    products: Option<BTreeSet<String>>,
}

impl StagedEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck one state row
    pub fn stage_state(&mut self, committed: &FilterState, code: &str, checked: bool) {
        let code = normalize_state_code(code);
        let table = self
            .states
            .get_or_insert_with(|| committed.states.clone());
        if checked {
            table.insert(code);
        } else {
            table.remove(&code);
        }
    }

    /// Check or uncheck one product row
    pub fn stage_product(&mut self, committed: &FilterState, name: &str, checked: bool) {
        let table = self
            .products
            .get_or_insert_with(|| committed.products.clone());
        if checked {
            table.insert(name.to_string());
        } else {
            table.remove(name);
        }
    }

    /// Selections an Apply would commit: staged tables, or the committed value for untouched ones
    pub fn selections(&self, committed: &FilterState) -> (BTreeSet<String>, BTreeSet<String>) {
        (
            self.states.clone().unwrap_or_else(|| committed.states.clone()),
            self.products
                .clone()
                .unwrap_or_else(|| committed.products.clone()),
        )
    }

    pub fn discard_states(&mut self) {
        self.states = None;
    }

    pub fn discard_products(&mut self) {
        self.products = None;
    }

    pub fn clear(&mut self) {
        self.states = None;
        self.products = None;
    }

    pub fn has_pending_changes(&self, committed: &FilterState) -> bool {
        self.states.as_ref().is_some_and(|s| s != &committed.states)
            || self
                .products
                .as_ref()
                .is_some_and(|p| p != &committed.products)
    }

    /// Table rows as the filters panel shows them
    pub fn view(&self, catalog: &Catalog, committed: &FilterState) -> FiltersView {
        let (staged_states, staged_products) = self.selections(committed);

        let states = catalog
            .states()
            .iter()
            .map(|s| FilterRow {
                key: s.code.clone(),
                label: s.name.clone(),
                checked: staged_states.contains(&s.code),
                committed: committed.states.contains(&s.code),
            })
            .collect();

        let products = catalog
            .products()
            .iter()
            .map(|p| FilterRow {
                key: p.clone(),
                label: p.clone(),
                checked: staged_products.contains(p),
                committed: committed.products.contains(p),
            })
            .collect();

        FiltersView {
            states,
            products,
            has_pending_changes: self.has_pending_changes(committed),
        }
    }
}
