use thiserror::Error;

/// An operation code that is not in the lookup table, with the 1-based
/// source rows that used it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownOperation {
    pub code: i64,
    pub rows: Vec<usize>,
}

fn list_unknown(ops: &[UnknownOperation]) -> String {
    ops.iter()
        .map(|op| {
            let rows: Vec<String> = op.rows.iter().map(|r| r.to_string()).collect();
            format!("{} (rows {})", op.code, rows.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum Sap2HbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv-input")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unknown operation code(s): {}", list_unknown(.0))]
    UnknownOperations(Vec<UnknownOperation>),

    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("No usable rows in SAP export")]
    EmptyInput,

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Canceled - {0}")]
    Cancelled(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Sap2HbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operations_message_lists_codes_and_rows() {
        let err = Sap2HbError::UnknownOperations(vec![
            UnknownOperation { code: 9999, rows: vec![4, 7] },
            UnknownOperation { code: 12, rows: vec![9] },
        ]);
        assert_eq!(
            err.to_string(),
            "Unknown operation code(s): 9999 (rows 4, 7); 12 (rows 9)"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let err = Sap2HbError::MissingColumns(vec!["Order".into(), "Amount".into()]);
        assert_eq!(err.to_string(), "Missing required column(s): Order, Amount");
    }
}
