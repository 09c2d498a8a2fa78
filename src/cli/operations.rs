use comfy_table::Table;

use crate::error::{Result, Sap2HbError};
use crate::operations::{all_codes, lookup, OperationEntry};

fn table(entries: &[&OperationEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Operation", "Activity", "Level 2", "Level 3"]);
    for e in entries {
        table.add_row(vec![
            e.code.to_string(),
            e.activity.to_string(),
            e.level2.to_string(),
            e.level3.to_string(),
        ]);
    }
    table
}

pub fn run(code: Option<u32>) -> Result<()> {
    match code {
        Some(c) => {
            let entry = lookup(c)
                .ok_or_else(|| Sap2HbError::Other(format!("Unknown operation code: {c}")))?;
            println!("{}", table(&[entry]));
        }
        None => {
            let all: Vec<&OperationEntry> = all_codes().into_iter().filter_map(lookup).collect();
            println!("{}", table(&all));
            println!("{} operations", all.len());
        }
    }
    Ok(())
}
