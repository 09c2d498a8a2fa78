use std::path::Path;

use crate::error::{Result, Sap2HbError};
use crate::models::SapRecord;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A logical input column and the header texts SAP layouts use for it.
struct Column {
    label: &'static str,
    aliases: &'static [&'static str],
}

const ORDER: Column = Column { label: "Order", aliases: &["Order"] };
const OPERATION: Column = Column { label: "Operation", aliases: &["Operation"] };
const COST_ELEMENT: Column = Column { label: "Cost Element", aliases: &["Cost Element"] };
const QUANTITY: Column = Column {
    label: "Quantity",
    aliases: &["Total quantity", "Quantity"],
};
const AMOUNT: Column = Column {
    label: "Amount",
    aliases: &["Val.in rep.cur.", "Amount", "Cost"],
};
const ELEMENT_NAME: Column = Column {
    label: "Cost element name",
    aliases: &["Cost element name", "Cost Element Name", "Description"],
};
const PARTNER: Column = Column {
    label: "Partner-CCtr",
    aliases: &["Partner-CCtr", "Partner Cost Center"],
};

const REQUIRED: [&Column; 5] = [&ORDER, &OPERATION, &COST_ELEMENT, &QUANTITY, &AMOUNT];

/// How far down the sheet to look for the header row. KOB1 exports carry a
/// few title lines above it.
const HEADER_SCAN_ROWS: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_code(*n),
        }
    }
}

/// Render a numeric code cell without the `.0` spreadsheets add.
fn format_code(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnMap {
    order: usize,
    operation: usize,
    cost_element: usize,
    quantity: usize,
    amount: usize,
    element_name: Option<usize>,
    partner: Option<usize>,
}

fn find_column(header: &[Cell], column: &Column) -> Option<usize> {
    column.aliases.iter().find_map(|alias| {
        header
            .iter()
            .position(|c| c.text().eq_ignore_ascii_case(alias))
    })
}

fn map_header(header: &[Cell]) -> std::result::Result<ColumnMap, Vec<String>> {
    let found: Vec<Option<usize>> = REQUIRED.iter().map(|c| find_column(header, c)).collect();
    let missing: Vec<String> = REQUIRED
        .iter()
        .zip(&found)
        .filter(|(_, idx)| idx.is_none())
        .map(|(c, _)| c.label.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }
    Ok(ColumnMap {
        order: found[0].unwrap_or_default(),
        operation: found[1].unwrap_or_default(),
        cost_element: found[2].unwrap_or_default(),
        quantity: found[3].unwrap_or_default(),
        amount: found[4].unwrap_or_default(),
        element_name: find_column(header, &ELEMENT_NAME),
        partner: find_column(header, &PARTNER),
    })
}

/// Locate the header row. On failure, report the columns missing from the
/// candidate row that matched the most required columns.
fn find_header(rows: &[Vec<Cell>]) -> Result<(usize, ColumnMap)> {
    let mut best: Option<Vec<String>> = None;
    for (idx, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        match map_header(row) {
            Ok(map) => return Ok((idx, map)),
            Err(missing) => {
                if best.as_ref().map_or(true, |b| missing.len() < b.len()) {
                    best = Some(missing);
                }
            }
        }
    }
    Err(Sap2HbError::MissingColumns(best.unwrap_or_else(|| {
        REQUIRED.iter().map(|c| c.label.to_string()).collect()
    })))
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Parse a numeric text cell. Handles thousands separators, currency
/// symbols, `(500.00)` negatives and SAP's trailing-minus `500.00-`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        inner.trim().parse::<f64>().ok().map(|v| -v)
    } else if let Some(inner) = s.strip_suffix('-') {
        inner.trim().parse::<f64>().ok().map(|v| -v)
    } else {
        s.parse::<f64>().ok()
    };
    // `f64::from_str` accepts "NaN" and "inf"; those are not amounts.
    value.filter(|v| v.is_finite())
}

fn invalid(row: usize, column: &Column, cell: &Cell) -> Sap2HbError {
    Sap2HbError::InvalidValue {
        row,
        column: column.label.to_string(),
        value: cell.text(),
    }
}

fn number_cell(cell: &Cell, row: usize, column: &Column) -> Result<f64> {
    match cell {
        Cell::Number(n) => Ok(*n),
        Cell::Empty => Ok(0.0),
        Cell::Text(s) if s.trim().is_empty() => Ok(0.0),
        Cell::Text(s) => parse_number(s).ok_or_else(|| invalid(row, column, cell)),
    }
}

fn integer_cell(cell: &Cell, row: usize, column: &Column) -> Result<i64> {
    let value = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_number(s),
        Cell::Empty => None,
    };
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => Ok(v as i64),
        _ => Err(invalid(row, column, cell)),
    }
}

static EMPTY: Cell = Cell::Empty;

fn get(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

// ---------------------------------------------------------------------------
// Record extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParsedExport {
    pub records: Vec<SapRecord>,
    /// Rows without an Order (titles, subtotals, totals).
    pub skipped_rows: usize,
}

/// Turn raw sheet rows into records. `first_row` is the 1-based sheet row
/// number of `rows[0]`.
pub fn parse_rows(rows: &[Vec<Cell>], first_row: usize) -> Result<ParsedExport> {
    let (header_idx, map) = find_header(rows)?;
    log::debug!("header found at sheet row {}", first_row + header_idx);

    let mut export = ParsedExport::default();
    for (offset, row) in rows.iter().enumerate().skip(header_idx + 1) {
        let row_no = first_row + offset;
        let order_cell = get(row, map.order);
        if order_cell.is_empty() {
            export.skipped_rows += 1;
            continue;
        }
        let operation = integer_cell(get(row, map.operation), row_no, &OPERATION)?;
        let cost_element = get(row, map.cost_element).text();
        let cost_element_name = map
            .element_name
            .map(|i| get(row, i).text())
            .unwrap_or_default();
        let partner_cctr = match map.partner.map(|i| get(row, i)) {
            None => None,
            Some(c) if c.is_empty() => None,
            Some(c) => {
                let v = integer_cell(c, row_no, &PARTNER)?;
                u64::try_from(v).ok().filter(|p| *p > 0)
            }
        };
        export.records.push(SapRecord {
            row: row_no,
            order: order_cell.text(),
            operation,
            cost_element,
            cost_element_name,
            partner_cctr,
            quantity: number_cell(get(row, map.quantity), row_no, &QUANTITY)?,
            amount: number_cell(get(row, map.amount), row_no, &AMOUNT)?,
        });
    }
    Ok(export)
}

// ---------------------------------------------------------------------------
// File readers
// ---------------------------------------------------------------------------

fn data_to_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Read the first worksheet of an Excel/ODS workbook.
fn read_workbook(file_path: &Path) -> Result<(Vec<Vec<Cell>>, usize)> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| Sap2HbError::Workbook(format!("Failed to open {}: {e}", file_path.display())))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Sap2HbError::Workbook("Workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| Sap2HbError::Workbook(format!("Failed to read sheet '{sheet}': {e}")))?;
    let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let rows = range
        .rows()
        .map(|r| r.iter().map(data_to_cell).collect())
        .collect();
    Ok((rows, first_row))
}

#[cfg(feature = "csv-input")]
fn read_csv(file_path: &Path) -> Result<(Vec<Vec<Cell>>, usize)> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        // The reader skips blank lines; pad so row numbers match the file.
        if let Some(pos) = record.position() {
            while rows.len() + 1 < pos.line() as usize {
                rows.push(Vec::new());
            }
        }
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok((rows, 1))
}

pub fn read_sap_export(file_path: &Path) -> Result<ParsedExport> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let (rows, first_row) = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(file_path)?,
        #[cfg(feature = "csv-input")]
        "csv" => read_csv(file_path)?,
        other => return Err(Sap2HbError::UnsupportedFormat(other.to_string())),
    };
    let export = parse_rows(&rows, first_row)?;
    log::info!(
        "read {} rows from {} ({} skipped without Order)",
        export.records.len(),
        file_path.display(),
        export.skipped_rows
    );
    Ok(export)
}
