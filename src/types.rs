use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tabled::Tabled;

/// One account row as stored in a partition file. Keys are whatever the
/// spreadsheet header happened to be at export time, so callers go through
/// `resolver` instead of indexing directly.
pub type RawRecord = Map<String, Value>;

/// Index of partition files, scanned in order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Manifest {
    pub files: Vec<String>,
}

/// Fully formatted one-pager. Every slot is filled; missing data shows as
/// `-` (text/date slots) or `0` (numeric slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportValue {
    pub account: String,
    pub account_name: String,
    pub mobile: String,
    pub branch: String,
    pub region: String,
    pub scheme: String,
    pub sanction_date: String,
    pub sanction_amount: String,
    pub outstanding: String,
    pub npa_date: String,
    pub asset_code: String,
    pub provision: String,
    pub days: String,
    pub uci: String,
    pub uri: String,
    pub follow_up_date: String,
    pub proposed_amount: String,
    pub remarks: String,
    pub settlement_percent: String,
    pub write_off: String,
    pub pl_impact: String,
    pub total_sacrifice: String,
}

impl ReportValue {
    /// Display slots in print order, labelled for the one-pager table.
    pub fn slots(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Account Number", self.account.as_str()),
            ("Account Name", self.account_name.as_str()),
            ("Mobile", self.mobile.as_str()),
            ("Branch", self.branch.as_str()),
            ("Region", self.region.as_str()),
            ("Scheme Code", self.scheme.as_str()),
            ("Sanction Date", self.sanction_date.as_str()),
            ("Sanction Amount", self.sanction_amount.as_str()),
            ("O/S Balance", self.outstanding.as_str()),
            ("NPA Date", self.npa_date.as_str()),
            ("Asset Code", self.asset_code.as_str()),
            ("Provision", self.provision.as_str()),
            ("Days", self.days.as_str()),
            ("UCI", self.uci.as_str()),
            ("URI", self.uri.as_str()),
            ("Follow-up Date", self.follow_up_date.as_str()),
            ("Proposed OTS Amount", self.proposed_amount.as_str()),
            ("Remarks", self.remarks.as_str()),
            ("OTS %", self.settlement_percent.as_str()),
            ("Write-off", self.write_off.as_str()),
            ("P&L Impact", self.pl_impact.as_str()),
            ("Total Sacrifice", self.total_sacrifice.as_str()),
        ]
    }

    /// Short on-screen summary shown after a search.
    pub fn summary_slots(&self) -> Vec<(&'static str, &str)> {
        const SUMMARY: [&str; 10] = [
            "Account Number",
            "Account Name",
            "Mobile",
            "Branch",
            "Region",
            "Scheme Code",
            "O/S Balance",
            "Asset Code",
            "Days",
            "Provision",
        ];
        self.slots()
            .into_iter()
            .filter(|(label, _)| SUMMARY.contains(label))
            .collect()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SlotRow {
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

impl SlotRow {
    pub fn from_slots(slots: &[(&str, &str)]) -> Vec<SlotRow> {
        slots
            .iter()
            .map(|(field, value)| SlotRow {
                field: field.to_string(),
                value: value.to_string(),
            })
            .collect()
    }
}
