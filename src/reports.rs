use crate::errors::LookupError;
use crate::metrics;
use crate::resolver::LogicalField;
use crate::store::RecordStore;
use crate::types::{RawRecord, ReportValue};
use crate::util::{excel_serial_to_date, format_localized_number, normalize_account, to_absolute_magnitude};

/// Operator inputs that travel with a lookup (`dt`, `amt`, `remarks` on the
/// search screen) plus an optional base adjustment for the P&L figure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpInputs {
    pub date: String,
    pub amount: String,
    pub remarks: String,
    pub base_adjustment: Option<String>,
}

/// Builds one-pagers from a shared [`RecordStore`].
pub struct ReportAssembler<'s> {
    store: &'s RecordStore,
}

impl<'s> ReportAssembler<'s> {
    pub fn new(store: &'s RecordStore) -> Self {
        Self { store }
    }

    /// Look up `account` and assemble the complete report, or say why not.
    pub fn assemble(
        &self,
        account: &str,
        follow: &FollowUpInputs,
    ) -> Result<ReportValue, LookupError> {
        let account = normalize_account(account);
        if account.is_empty() {
            return Err(LookupError::InvalidIdentifier);
        }
        let found = self.store.resolve(&account)?;
        Ok(build_report(&account, &found.record, follow))
    }
}

/// Pure assembly step: resolved record plus follow-up inputs to display slots.
pub fn build_report(account: &str, record: &RawRecord, follow: &FollowUpInputs) -> ReportValue {
    let magnitude = |field: LogicalField| {
        field
            .text(record)
            .map(|t| to_absolute_magnitude(&t))
            .unwrap_or(0.0)
    };
    let outstanding = magnitude(LogicalField::Outstanding);
    let provision = magnitude(LogicalField::Provision);
    let proposed = to_absolute_magnitude(&follow.amount);
    let base_adjustment = follow
        .base_adjustment
        .as_deref()
        .map(to_absolute_magnitude)
        .unwrap_or(0.0);

    let derived = metrics::compute(outstanding, proposed, provision, base_adjustment).display();

    ReportValue {
        account: account.to_string(),
        account_name: LogicalField::AccountName.display(record),
        mobile: LogicalField::Mobile.display(record),
        branch: LogicalField::Branch.display(record),
        region: LogicalField::Region.display(record),
        scheme: LogicalField::Scheme.display(record),
        sanction_date: LogicalField::SanctionDate.display(record),
        sanction_amount: LogicalField::SanctionAmount.display(record),
        outstanding: LogicalField::Outstanding.display(record),
        npa_date: LogicalField::NpaDate.display(record),
        asset_code: LogicalField::AssetCode.display(record),
        provision: LogicalField::Provision.display(record),
        days: LogicalField::Days.display(record),
        uci: LogicalField::Uci.display(record),
        uri: LogicalField::Uri.display(record),
        follow_up_date: or_dash(excel_serial_to_date(&follow.date)),
        proposed_amount: format_localized_number(proposed, 2),
        remarks: or_dash(follow.remarks.trim().to_string()),
        settlement_percent: derived.settlement_percent,
        write_off: derived.write_off_amount,
        pl_impact: derived.profit_loss_impact,
        total_sacrifice: derived.total_sacrifice,
    }
}

fn or_dash(s: String) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s
    }
}
