use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::Granularity;

/// User interaction sent to a dashboard session.
///
/// Bulk select actions commit immediately; `StageState` / `StageProduct`
/// only edit the filter tables until `ApplyStaged` is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardAction {
    SelectAllStates,
    SelectNoStates,
    SelectAllProducts,
    SelectNoProducts,
    StageState { code: String, checked: bool },
    StageProduct { name: String, checked: bool },
    ApplyStaged,
    ResetAll,
    SetDateRange { start: NaiveDate, end: NaiveDate },
    PinProduct { product: String },
    PinPeriod { period: String },
    ChangeGranularity { granularity: Granularity },
    ClearChartSelection,
    PinSeller { seller: String },
    PinStore { store: String },
    ClearLeaderboardSelection,
}
