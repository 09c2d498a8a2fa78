//! HeavyBid actuals workbook: sheet layout and output naming.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::cost_elements::element_code;
use crate::error::Result;
use crate::models::{ActualsRow, BoeNoteRow, ResourceRow};
use crate::pipeline::Conversion;

pub const ACTUALS_SHEET: &str = "Actuals Report";
pub const BOE_SHEET: &str = "Actual BoE";
pub const RESOURCE_SHEET: &str = "Resource File";

pub const ACTUALS_COLUMNS: [&str; 20] = [
    "BidItem",
    "Activity",
    "Resource",
    "Quantity",
    "Units",
    "Unit Price",
    "Tax/OT %",
    "Crew Code",
    "Pieces",
    "Currency",
    "EOE %",
    "Rent Percent",
    "Escalation Percent",
    "Hours Adjustment",
    "Supp. Desc",
    "MH/Unit",
    "Material Factor Type",
    "Material Factor",
    "Description",
    "Cost Type",
];

/// HeavyBid imports the first three columns; the run date trails them.
pub const BOE_COLUMNS: [&str; 4] = ["BidItem", "Activity", "Notes", "Date"];

pub const RESOURCE_COLUMNS: [&str; 13] = [
    "Local Resource Code",
    "Description",
    "Unit",
    "Cost",
    "Non-Tax?(Y/N)",
    "Job Cost Code 1",
    "Job Cost Code 2",
    "Job Cost Description",
    "Joint Venture Material Type",
    "MH/Unit",
    "Header Type? (Y/N)",
    "Quote Folder",
    "Schedule Code",
];

enum Value<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

fn write_row(sheet: &mut Worksheet, row: u32, values: &[Value]) -> Result<()> {
    for (col, value) in values.iter().enumerate() {
        let col = col as u16;
        match value {
            Value::Text(s) => {
                sheet.write_string(row, col, *s)?;
            }
            Value::Number(n) => {
                sheet.write_number(row, col, *n)?;
            }
            Value::Blank => {}
        }
    }
    Ok(())
}

fn add_sheet<'a>(workbook: &'a mut Workbook, name: &str, columns: &[&str]) -> Result<&'a mut Worksheet> {
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(sheet)
}

/// Supp. Desc holds the cost element; numeric codes stay numeric so
/// HeavyBid imports them as it does SAP's own export.
fn supp_desc(raw: Option<&str>) -> Value<'_> {
    match raw {
        None => Value::Blank,
        Some(s) => match element_code(s) {
            Some(code) => Value::Number(code as f64),
            None => Value::Text(s),
        },
    }
}

fn actuals_values(a: &ActualsRow) -> Vec<Value<'_>> {
    vec![
        Value::Number(a.bid_item as f64),
        Value::Text(&a.activity),
        Value::Text(&a.resource),
        Value::Number(a.quantity),
        Value::Text(&a.units),
        Value::Number(a.unit_price),
        Value::Number(a.tax_ot_percent),
        Value::Blank,
        Value::Number(a.pieces as f64),
        Value::Blank,
        Value::Blank,
        Value::Blank,
        Value::Blank,
        Value::Blank,
        supp_desc(a.supp_desc.as_deref()),
        Value::Blank,
        Value::Blank,
        Value::Blank,
        Value::Text(&a.description),
        Value::Text(a.cost_type.label()),
    ]
}

fn boe_values(b: &BoeNoteRow) -> Vec<Value<'_>> {
    vec![
        Value::Number(b.bid_item as f64),
        Value::Text(&b.activity),
        Value::Text(&b.notes),
        Value::Text(&b.date),
    ]
}

fn resource_values(r: &ResourceRow) -> Vec<Value<'_>> {
    let mut values = vec![
        Value::Text(&r.code),
        Value::Text(&r.description),
        Value::Text(&r.unit),
    ];
    values.resize_with(RESOURCE_COLUMNS.len(), || Value::Blank);
    values
}

pub fn write_workbook(conversion: &Conversion, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let sheet = add_sheet(&mut workbook, ACTUALS_SHEET, &ACTUALS_COLUMNS)?;
    for (i, row) in conversion.actuals.iter().enumerate() {
        write_row(sheet, i as u32 + 1, &actuals_values(row))?;
    }
    sheet.autofit();

    let sheet = add_sheet(&mut workbook, BOE_SHEET, &BOE_COLUMNS)?;
    for (i, row) in conversion.boe.iter().enumerate() {
        write_row(sheet, i as u32 + 1, &boe_values(row))?;
    }
    sheet.autofit();

    let sheet = add_sheet(&mut workbook, RESOURCE_SHEET, &RESOURCE_COLUMNS)?;
    for (i, row) in conversion.resources.iter().enumerate() {
        write_row(sheet, i as u32 + 1, &resource_values(row))?;
    }
    sheet.autofit();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// `path` itself when free. Otherwise a sibling with a `_YYYYMMDD_HHMMSS`
/// suffix from `now`, then `_2`, `_3`, ... until an unused name is found.
/// The flag reports whether the name changed.
pub fn avoid_collision(path: &Path, now: NaiveDateTime) -> (PathBuf, bool) {
    if !path.exists() {
        return (path.to_path_buf(), false);
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamped = format!("{stem}_{}", now.format("%Y%m%d_%H%M%S"));

    let mut candidate = path.with_file_name(format!("{stamped}{ext}"));
    let mut n = 2;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stamped}_{n}{ext}"));
        n += 1;
    }
    (candidate, true)
}

/// Output path `<order>_actuals.xlsx` in `dir`, renamed if taken.
pub fn output_path(order: &str, dir: &Path, now: NaiveDateTime) -> (PathBuf, bool) {
    avoid_collision(&dir.join(format!("{order}_actuals.xlsx")), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CostType;
    use crate::pipeline::Summary;
    use calamine::{Data, Reader};

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 1, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    fn sample() -> Conversion {
        Conversion {
            actuals: vec![
                ActualsRow {
                    bid_item: 1010,
                    activity: "0101-1010A".into(),
                    resource: "6ENGSVC15249".into(),
                    quantity: 104.0,
                    units: "HR".into(),
                    unit_price: 120.0,
                    tax_ot_percent: 100.0,
                    pieces: 1,
                    supp_desc: Some("6603023".into()),
                    description: "Engineering Svcs".into(),
                    cost_type: CostType::Labor,
                },
                ActualsRow {
                    bid_item: 1010,
                    activity: "0101-1010A".into(),
                    resource: "6Labor OH".into(),
                    quantity: 1.0,
                    units: "LS".into(),
                    unit_price: 200.0,
                    tax_ot_percent: 100.0,
                    pieces: 1,
                    supp_desc: None,
                    description: "Labor Alloc.".into(),
                    cost_type: CostType::LaborAlloc,
                },
            ],
            boe: vec![BoeNoteRow {
                bid_item: 1010,
                activity: "0101-1010A".into(),
                date: "1/7/26".into(),
                notes: "ENGSVC15249: 104 MH Actuals to date, Projected an additional 0 MH for the remainder of the Activity".into(),
            }],
            resources: vec![ResourceRow {
                code: "6ENGSVC15249".into(),
                description: "Actls. - Labr. - ENGSVC15249".into(),
                unit: "HR".into(),
            }],
            summary: Summary::default(),
        }
    }

    #[test]
    fn test_output_path_without_collision() {
        let dir = tempfile::tempdir().unwrap();
        let (path, collided) = output_path("74066927", dir.path(), now());
        assert_eq!(path, dir.path().join("74066927_actuals.xlsx"));
        assert!(!collided);
    }

    #[test]
    fn test_output_path_adds_timestamp_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("74066927_actuals.xlsx"), b"x").unwrap();
        let (path, collided) = output_path("74066927", dir.path(), now());
        assert_eq!(path, dir.path().join("74066927_actuals_20260107_140509.xlsx"));
        assert!(collided);
    }

    #[test]
    fn test_output_path_counts_past_taken_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("74066927_actuals.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("74066927_actuals_20260107_140509.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("74066927_actuals_20260107_140509_2.xlsx"), b"x").unwrap();
        let (path, collided) = output_path("74066927", dir.path(), now());
        assert_eq!(path, dir.path().join("74066927_actuals_20260107_140509_3.xlsx"));
        assert!(collided);
    }

    #[test]
    fn test_avoid_collision_on_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.xlsx");
        assert_eq!(avoid_collision(&custom, now()), (custom.clone(), false));

        std::fs::write(&custom, b"keep").unwrap();
        let (path, collided) = avoid_collision(&custom, now());
        assert_eq!(path, dir.path().join("custom_20260107_140509.xlsx"));
        assert!(collided);
    }

    #[test]
    fn test_write_workbook_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("74066927_actuals.xlsx");
        write_workbook(&sample(), &path).unwrap();

        let mut wb = calamine::open_workbook_auto(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec![ACTUALS_SHEET, BOE_SHEET, RESOURCE_SHEET]);

        let actuals = wb.worksheet_range(ACTUALS_SHEET).unwrap();
        assert_eq!(actuals.height(), 3);
        let header: Vec<String> = actuals.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, ACTUALS_COLUMNS.to_vec());
        assert_eq!(actuals.get_value((1, 2)), Some(&Data::String("6ENGSVC15249".into())));
        assert_eq!(actuals.get_value((1, 5)), Some(&Data::Float(120.0)));
        assert_eq!(actuals.get_value((1, 14)), Some(&Data::Float(6603023.0)));
        assert_eq!(actuals.get_value((2, 19)), Some(&Data::String("Labor Alloc.".into())));

        let boe = wb.worksheet_range(BOE_SHEET).unwrap();
        assert_eq!(boe.height(), 2);
        let header: Vec<String> = boe.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["BidItem", "Activity", "Notes", "Date"]);
        assert_eq!(
            boe.get_value((1, 2)),
            Some(&Data::String(sample().boe[0].notes.clone()))
        );
        assert_eq!(boe.get_value((1, 3)), Some(&Data::String("1/7/26".into())));

        let resources = wb.worksheet_range(RESOURCE_SHEET).unwrap();
        assert_eq!(resources.height(), 2);
        assert_eq!(
            resources.get_value((1, 1)),
            Some(&Data::String("Actls. - Labr. - ENGSVC15249".into()))
        );
    }
}
