//! Settlement (OTS) figures derived from the resolved balances.

use serde::Serialize;

use crate::util::{format_fixed, format_localized_number};

/// Signed results of the settlement formulas. Inputs are expected to be
/// non-negative magnitudes; signs only survive internally and are dropped
/// by [`DerivedMetrics::display`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub settlement_percent: f64,
    pub write_off_amount: f64,
    pub profit_loss_impact: f64,
    pub total_sacrifice: f64,
}

/// Formatted figures ready for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsDisplay {
    pub settlement_percent: String,
    pub write_off_amount: String,
    pub profit_loss_impact: String,
    pub total_sacrifice: String,
}

pub fn compute(
    outstanding: f64,
    proposed_settlement: f64,
    provision: f64,
    base_adjustment: f64,
) -> DerivedMetrics {
    let settlement_percent = if outstanding > 0.0 {
        proposed_settlement * 100.0 / outstanding
    } else {
        0.0
    };
    let write_off_amount = outstanding - proposed_settlement;
    let profit_loss_impact = proposed_settlement - (outstanding - base_adjustment - provision);
    let total_sacrifice = outstanding + write_off_amount - proposed_settlement;
    DerivedMetrics {
        settlement_percent: finite_or_zero(settlement_percent),
        write_off_amount: finite_or_zero(write_off_amount),
        profit_loss_impact: finite_or_zero(profit_loss_impact),
        total_sacrifice: finite_or_zero(total_sacrifice),
    }
}

impl DerivedMetrics {
    pub fn display(&self) -> MetricsDisplay {
        MetricsDisplay {
            settlement_percent: format_fixed(self.settlement_percent.abs(), 2),
            write_off_amount: format_localized_number(self.write_off_amount.abs(), 2),
            profit_loss_impact: format_localized_number(self.profit_loss_impact.abs(), 2),
            total_sacrifice: format_localized_number(self.total_sacrifice.abs(), 2),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
