use contracts::dashboards::d402_sales_panel::{AggregateRow, Granularity, SalesRow};
use std::collections::{BTreeMap, HashMap};

use super::error::{DashboardError, DashboardResult};

/// Cross-filter between the product bar chart and the sales-over-time line.
///
/// At most one side is pinned at a time: a pinned product filters the line,
/// a pinned period filters the bars, and pinning either clears the other so
/// the two derived series never filter each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSelection {
    granularity: Granularity,
    selected_product: Option<String>,
    selected_period: Option<String>,
}

impl ChartSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn selected_product(&self) -> Option<&str> {
        self.selected_product.as_deref()
    }

    pub fn selected_period(&self) -> Option<&str> {
        self.selected_period.as_deref()
    }

    pub fn pin_product(&mut self, product: impl Into<String>) {
        self.selected_product = Some(product.into());
        self.selected_period = None;
    }

    /// Pin a period label; it must match the current granularity
    pub fn pin_period(&mut self, period: impl Into<String>) -> DashboardResult<()> {
        let period = period.into();
        if !self.granularity.accepts(&period) {
            return Err(DashboardError::invalid(format!(
                "period '{}' does not match {:?} granularity",
                period, self.granularity
            )));
        }
        self.selected_period = Some(period);
        self.selected_product = None;
        Ok(())
    }

    /// Switch month/year; a pinned period is dropped since its label no longer applies
    pub fn change_granularity(&mut self, granularity: Granularity) {
        if granularity != self.granularity {
            self.selected_period = None;
            self.granularity = granularity;
        }
    }

    /// Drop both pins, keep the granularity
    pub fn reset(&mut self) {
        self.selected_product = None;
        self.selected_period = None;
    }

    /// Clear the product pin if it is no longer part of the product filter
    pub fn retain_product(&mut self, keep: impl Fn(&str) -> bool) {
        if self.selected_product.as_deref().is_some_and(|p| !keep(p)) {
            self.selected_product = None;
        }
    }

    /// Sales by product, restricted to the pinned period if any. Descending by value.
    pub fn effective_bar_data(&self, rows: &[SalesRow]) -> Vec<AggregateRow> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for row in rows {
            if let Some(period) = &self.selected_period {
                if &self.granularity.bucket(row.order_date) != period {
                    continue;
                }
            }
            *totals.entry(row.product.as_str()).or_insert(0.0) += row.sales_value;
        }
        sorted_desc(totals)
    }

    /// Sales by period, restricted to the pinned product if any. Ascending by period.
    pub fn effective_line_data(&self, rows: &[SalesRow]) -> Vec<AggregateRow> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for row in rows {
            if let Some(product) = &self.selected_product {
                if &row.product != product {
                    continue;
                }
            }
            *totals
                .entry(self.granularity.bucket(row.order_date))
                .or_insert(0.0) += row.sales_value;
        }
        totals
            .into_iter()
            .map(|(label, sales_value)| AggregateRow { label, sales_value })
            .collect()
    }
}

/// Aggregate rows sorted by value descending, label ascending on ties
pub(crate) fn sorted_desc<S: AsRef<str>>(totals: HashMap<S, f64>) -> Vec<AggregateRow> {
    let mut out: Vec<AggregateRow> = totals
        .into_iter()
        .map(|(label, sales_value)| AggregateRow {
            label: label.as_ref().to_string(),
            sales_value,
        })
        .collect();
    out.sort_by(|a, b| {
        b.sales_value
            .partial_cmp(&a.sales_value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    out
}
