pub mod convert;
pub mod operations;
pub mod settings;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sap2hb",
    version,
    about = "Convert SAP cost exports into HeavyBid actuals workbooks."
)]
pub struct Cli {
    /// Show debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a SAP export into a HeavyBid actuals workbook.
    Convert {
        /// SAP export (.xlsx, .xls, .csv). Prompted for when omitted.
        input: Option<String>,
        /// Output folder or .xlsx file (default: settings output_dir, else the input's folder)
        #[arg(short, long)]
        output: Option<String>,
        /// Validate and summarize without writing a workbook.
        #[arg(long)]
        dry_run: bool,
    },
    /// List the SAP operation → HeavyBid activity table.
    Operations {
        /// Show a single operation code
        code: Option<u32>,
    },
    /// Show or update settings.
    Settings {
        /// Default folder for generated workbooks
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        /// Tax/OT % written on every actuals line
        #[arg(long = "tax-ot-percent")]
        tax_ot_percent: Option<f64>,
    },
}
