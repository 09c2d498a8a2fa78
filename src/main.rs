mod cli;
mod cost_elements;
mod error;
mod fmt;
mod importer;
mod models;
mod operations;
mod picker;
mod pipeline;
mod settings;
mod workbook;

use clap::Parser;

use cli::{Cli, Commands};
use error::Sap2HbError;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        None => cli::convert::run(None, None, false),
        Some(Commands::Convert {
            input,
            output,
            dry_run,
        }) => cli::convert::run(input, output, dry_run),
        Some(Commands::Operations { code }) => cli::operations::run(code),
        Some(Commands::Settings {
            output_dir,
            tax_ot_percent,
        }) => cli::settings::run(output_dir, tax_ot_percent),
    };

    match result {
        Ok(()) => {}
        Err(e @ Sap2HbError::Cancelled(_)) => println!("{e}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
