//! Candidate-key field resolution.
//!
//! The dataset has been re-exported many times and the header for a given
//! column drifted between exports (`Acct Name`, `Account Name`, `NAME`, ...).
//! Each logical field therefore carries an ordered list of aliases and the
//! first alias holding a non-empty value wins.

use serde_json::Value;

use crate::types::RawRecord;
use crate::util::{
    excel_serial_to_date, format_localized_number, to_absolute_magnitude, to_number,
};

/// How a resolved value is presented on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    /// Money, shown as an absolute magnitude.
    Amount,
    /// Signed integer-ish count (days past due).
    Count,
}

impl FieldKind {
    pub fn fallback(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Date => "-",
            FieldKind::Amount | FieldKind::Count => "0",
        }
    }

    /// Format already-resolved cell text.
    pub fn present(self, text: &str) -> String {
        match self {
            FieldKind::Text => text.trim().to_string(),
            FieldKind::Date => excel_serial_to_date(text),
            FieldKind::Amount => format_localized_number(to_absolute_magnitude(text), 2),
            FieldKind::Count => {
                let n = to_number(text);
                if n.is_nan() {
                    "0".to_string()
                } else {
                    format_localized_number(n, 2)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    AccountName,
    Mobile,
    Branch,
    Region,
    Scheme,
    Outstanding,
    NpaDate,
    AssetCode,
    SanctionDate,
    SanctionAmount,
    Provision,
    Days,
    Uci,
    Uri,
}

impl LogicalField {
    pub const ALL: [LogicalField; 14] = [
        LogicalField::AccountName,
        LogicalField::Mobile,
        LogicalField::Branch,
        LogicalField::Region,
        LogicalField::Scheme,
        LogicalField::Outstanding,
        LogicalField::NpaDate,
        LogicalField::AssetCode,
        LogicalField::SanctionDate,
        LogicalField::SanctionAmount,
        LogicalField::Provision,
        LogicalField::Days,
        LogicalField::Uci,
        LogicalField::Uri,
    ];

    /// Header aliases in resolution order.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            LogicalField::AccountName => &["Acct Name", "Account Name", "NAME"],
            LogicalField::Mobile => &["Mobile Num", "Mobile", "Mob No"],
            LogicalField::Branch => &["Branch", "Branch Name"],
            LogicalField::Region => &["Region", "RO", "Region Name"],
            LogicalField::Scheme => &["Scheme Code", "Scheme"],
            LogicalField::Outstanding => &["O/S Bal", "OS Bal", "Outstanding"],
            LogicalField::NpaDate => &["CIF NPA date", "NPA Date", "NPA Dt", "Npa Date", "NPA date"],
            LogicalField::AssetCode => &["Asset Code 30.09.25", "Asset Code"],
            LogicalField::SanctionDate => &["Acct Opn Date", "Sanction Date"],
            LogicalField::SanctionAmount => &["Sanct Lim Amount", "Sanction Amt", "Sanction Amount"],
            LogicalField::Provision => &["Provision"],
            LogicalField::Days => &["Days"],
            LogicalField::Uci => &["UCI"],
            LogicalField::Uri => &["URI"],
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            LogicalField::AccountName
            | LogicalField::Mobile
            | LogicalField::Branch
            | LogicalField::Region
            | LogicalField::Scheme
            | LogicalField::AssetCode => FieldKind::Text,
            LogicalField::NpaDate | LogicalField::SanctionDate => FieldKind::Date,
            LogicalField::Outstanding
            | LogicalField::SanctionAmount
            | LogicalField::Provision
            | LogicalField::Uci
            | LogicalField::Uri => FieldKind::Amount,
            LogicalField::Days => FieldKind::Count,
        }
    }

    /// Raw text of this field, if any alias holds a value.
    pub fn text(self, record: &RawRecord) -> Option<String> {
        resolve_text(record, self.candidates())
    }

    /// Display string, falling back to `-` or `0` when nothing resolves.
    pub fn display(self, record: &RawRecord) -> String {
        let kind = self.kind();
        match self.text(record) {
            Some(text) => {
                let shown = kind.present(&text);
                if shown.is_empty() {
                    kind.fallback().to_string()
                } else {
                    shown
                }
            }
            None => kind.fallback().to_string(),
        }
    }
}

/// First candidate present in `record` whose value is not empty.
///
/// Only `null` and whitespace-only strings count as empty; `0` and `false`
/// are real values. An exact key match is preferred, then a key that equals
/// the candidate once surrounding whitespace is trimmed.
pub fn resolve<'a>(record: &'a RawRecord, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|key| lookup_key(record, key).filter(|value| !is_empty(value)))
}

pub fn resolve_text(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    resolve(record, candidates).map(cell_text)
}

fn lookup_key<'a>(record: &'a RawRecord, key: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(key) {
        return Some(value);
    }
    record
        .iter()
        .find(|(name, _)| name.trim() == key)
        .map(|(_, value)| value)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text form of a scalar cell. Floats are written out in plain positional
/// notation so large amounts never reach the parsers as `1.5e+16`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn skips_present_but_empty_key() {
        let rec = record(json!({"Mobile": "", "Mob No": "9876543210"}));
        let got = resolve_text(&rec, &["Mobile Num", "Mobile", "Mob No"]);
        assert_eq!(got.as_deref(), Some("9876543210"));
    }

    #[test]
    fn order_decides_between_aliases() {
        let rec = record(json!({"NAME": "second", "Acct Name": "first"}));
        assert_eq!(LogicalField::AccountName.text(&rec).as_deref(), Some("first"));
    }

    #[test]
    fn zero_and_false_are_values() {
        let rec = record(json!({"Provision": 0, "Flag": false, "Days": null}));
        assert_eq!(resolve(&rec, &["Provision"]), Some(&json!(0)));
        assert_eq!(resolve(&rec, &["Flag"]), Some(&json!(false)));
        assert_eq!(resolve(&rec, &["Days"]), None);
    }

    #[test]
    fn whitespace_only_is_empty() {
        let rec = record(json!({"Branch": "   ", "Branch Name": "Indore"}));
        assert_eq!(LogicalField::Branch.text(&rec).as_deref(), Some("Indore"));
    }

    #[test]
    fn trailing_whitespace_in_header() {
        let rec = record(json!({"Region ": "Ujjain"}));
        assert_eq!(LogicalField::Region.text(&rec).as_deref(), Some("Ujjain"));
    }

    #[test]
    fn missing_everything_uses_fallbacks() {
        let rec = RawRecord::new();
        assert_eq!(LogicalField::AccountName.display(&rec), "-");
        assert_eq!(LogicalField::NpaDate.display(&rec), "-");
        assert_eq!(LogicalField::Outstanding.display(&rec), "0");
        assert_eq!(LogicalField::Days.display(&rec), "0");
    }

    #[test]
    fn display_formats_by_kind() {
        let rec = record(json!({
            "O/S Bal": "-1,25,000.5",
            "CIF NPA date": 43190,
            "Days": "-12",
            "Asset Code 30.09.25": " DA1 ",
            "Asset Code": "SS"
        }));
        assert_eq!(LogicalField::Outstanding.display(&rec), "1,25,000.5");
        assert_eq!(LogicalField::NpaDate.display(&rec), "31-03-2018");
        assert_eq!(LogicalField::Days.display(&rec), "-12");
        assert_eq!(LogicalField::AssetCode.display(&rec), "DA1");
    }

    #[test]
    fn cell_text_covers_scalars() {
        assert_eq!(cell_text(&json!(12.5)), "12.5");
        assert_eq!(cell_text(&json!(" x ")), "x");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn large_float_cells_stay_positional() {
        assert_eq!(cell_text(&json!(1.5e16)), "15000000000000000");
        assert_eq!(cell_text(&json!(100000.0)), "100000");
        assert_eq!(cell_text(&json!(-2.5e20)), "-250000000000000000000");

        let rec = record(json!({"O/S Bal": 1.5e16, "Provision": 2.5e20}));
        assert_eq!(LogicalField::Outstanding.display(&rec), "15,00,00,00,00,00,00,000");
        assert_eq!(LogicalField::Provision.display(&rec), "25,00,00,00,00,00,00,00,00,000");
    }
}
