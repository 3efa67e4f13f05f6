use contracts::dashboards::d402_sales_panel::{MapCell, MapView, StateSalesRow};
use std::collections::{BTreeSet, HashMap};

use super::filter_state::{normalize_state_code, Catalog};

/// Highlight flag of one state on the map.
///
/// An empty committed set highlights every state.
pub fn is_highlighted(committed_states: &BTreeSet<String>, code: &str) -> bool {
    committed_states.is_empty() || committed_states.contains(code)
}

/// Map cells for every catalog state with its sales total (0 when absent)
pub fn render_map(
    catalog: &Catalog,
    committed_states: &BTreeSet<String>,
    sales: &[StateSalesRow],
) -> MapView {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in sales {
        *totals
            .entry(normalize_state_code(&row.state_code))
            .or_insert(0.0) += row.sales_value;
    }

    let cells = catalog
        .states()
        .iter()
        .map(|s| MapCell {
            code: s.code.clone(),
            name: s.name.clone(),
            sales_value: totals.get(&s.code).copied().unwrap_or(0.0),
            highlighted: is_highlighted(committed_states, &s.code),
        })
        .collect();

    let caption = if committed_states.is_empty() {
        "All".to_string()
    } else {
        committed_states
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    MapView { cells, caption }
}
