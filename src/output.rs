use crate::types::{ReportValue, SlotRow};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Two-column `Field,Value` export of the one-pager.
pub fn write_report_csv(path: impl AsRef<Path>, report: &ReportValue) -> Result<(), Box<dyn Error>> {
    write_csv(path, &SlotRow::from_slots(&report.slots()))
}

/// Markdown rendering of labelled slots.
pub fn render_slots(slots: &[(&str, &str)]) -> String {
    render_table(&SlotRow::from_slots(slots))
}

pub fn render_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn preview_report(title: &str, note: Option<&str>, slots: &[(&str, &str)]) {
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_slots(slots));
}
