use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use colored::Colorize;
use comfy_table::Table;

use crate::error::{Result, Sap2HbError};
use crate::fmt::money;
use crate::importer::read_sap_export;
use crate::picker::{PathPicker, PromptPicker};
use crate::pipeline::{transform, Conversion};
use crate::settings::{load_settings, shellexpand_path, Settings};
use crate::workbook::{avoid_collision, output_path, write_workbook};

#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    /// Generate `<order>_actuals.xlsx` inside this folder.
    Folder(PathBuf),
    /// Write exactly this file.
    File(PathBuf),
}

impl OutputTarget {
    /// An existing folder or an extension-less path is a folder; otherwise
    /// the path must name an .xlsx file.
    fn from_arg(raw: &str) -> Result<Self> {
        let path = PathBuf::from(shellexpand_path(raw));
        if path.is_dir() {
            return Ok(OutputTarget::Folder(path));
        }
        match path.extension() {
            None => Ok(OutputTarget::Folder(path)),
            Some(e) if e.eq_ignore_ascii_case("xlsx") => Ok(OutputTarget::File(path)),
            Some(e) => Err(Sap2HbError::Other(format!(
                "Output must be a folder or an .xlsx file, got .{} ({})",
                e.to_string_lossy(),
                path.display()
            ))),
        }
    }
}

/// Decide where to read from and write to. Paths given on the command line
/// win; a missing input sends both choices to the picker.
pub fn plan_paths(
    input: Option<&str>,
    output: Option<&str>,
    settings: &Settings,
    picker: &dyn PathPicker,
) -> Result<(PathBuf, OutputTarget)> {
    let Some(input) = input else {
        let input = picker.select_input_file()?;
        let target = match output {
            Some(o) => OutputTarget::from_arg(o)?,
            None => OutputTarget::Folder(picker.select_output_folder()?),
        };
        return Ok((input, target));
    };

    let input = PathBuf::from(shellexpand_path(input));
    let target = match (output, settings.output_dir.as_deref()) {
        (Some(o), _) => OutputTarget::from_arg(o)?,
        (None, Some(dir)) => OutputTarget::Folder(PathBuf::from(shellexpand_path(dir))),
        (None, None) => OutputTarget::Folder(
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        ),
    };
    Ok((input, target))
}

#[derive(Debug)]
pub struct ConvertReport {
    pub conversion: Conversion,
    pub skipped_rows: usize,
    /// None on a dry run.
    pub output: Option<PathBuf>,
}

/// Read, transform and (unless `dry_run`) write. Nothing is written when
/// any step fails, and an existing file is never overwritten.
pub fn convert_file(
    input: &Path,
    target: &OutputTarget,
    settings: &Settings,
    now: NaiveDateTime,
    dry_run: bool,
) -> Result<ConvertReport> {
    let export = read_sap_export(input)?;
    let mut conversion = transform(&export.records, settings, now.date())?;

    let output = if dry_run {
        None
    } else {
        let (wanted, (path, collided)) = match target {
            OutputTarget::File(p) => (p.clone(), avoid_collision(p, now)),
            OutputTarget::Folder(dir) => (
                dir.join(format!("{}_actuals.xlsx", conversion.summary.order)),
                output_path(&conversion.summary.order, dir, now),
            ),
        };
        if collided {
            conversion.summary.warnings.push(format!(
                "{} already exists; wrote {} instead",
                file_name(&wanted),
                file_name(&path)
            ));
        }
        write_workbook(&conversion, &path)?;
        Some(path)
    };

    Ok(ConvertReport {
        conversion,
        skipped_rows: export.skipped_rows,
        output,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_report(report: &ConvertReport) {
    let c = &report.conversion;
    let s = &c.summary;

    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Rows"]);
    table.add_row(vec!["Actuals Report".to_string(), c.actuals.len().to_string()]);
    table.add_row(vec!["Actual BoE".to_string(), c.boe.len().to_string()]);
    table.add_row(vec!["Resource File".to_string(), c.resources.len().to_string()]);

    println!("Order {}", s.order.bold());
    println!(
        "{} SAP rows read, {} without Order skipped",
        s.input_rows, report.skipped_rows
    );
    println!(
        "{} buckets, {} labor overhead, {} AFUDC lines",
        s.buckets, s.overhead_rows, s.afudc_rows
    );
    println!("{table}");
    println!("SAP total:     {}", money(s.input_total));
    println!("Actuals total: {}", money(s.output_total));

    for w in &s.warnings {
        println!("{} {w}", "warning:".yellow().bold());
    }

    match &report.output {
        Some(path) => println!("{} {}", "Wrote".green().bold(), path.display()),
        None => println!("{}", "Dry run: no workbook written.".dimmed()),
    }
}

pub fn run(input: Option<String>, output: Option<String>, dry_run: bool) -> Result<()> {
    let settings = load_settings();
    let picker = PromptPicker {
        default_output: settings.output_dir.as_deref().map(PathBuf::from),
    };
    if input.is_none() {
        println!("Select your SAP export and an output folder. Leave a prompt empty to cancel.");
    }
    let (input, target) = plan_paths(input.as_deref(), output.as_deref(), &settings, &picker)?;

    println!("Reading {}", input.display());
    let now = chrono::Local::now().naive_local();
    let report = convert_file(&input, &target, &settings, now, dry_run)?;
    print_report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::FixedPicker;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 1, 7)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn no_picker() -> FixedPicker {
        FixedPicker { input: None, output: None }
    }

    fn write_csv(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("export.csv");
        let mut content =
            String::from("Order,Operation,Cost Element,Cost element name,Partner-CCtr,Total quantity,Val.in rep.cur.\n");
        for r in rows {
            content.push_str(r);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_plan_paths_defaults_to_input_folder() {
        let (input, target) =
            plan_paths(Some("/data/sap/export.xlsx"), None, &Settings::default(), &no_picker()).unwrap();
        assert_eq!(input, PathBuf::from("/data/sap/export.xlsx"));
        assert_eq!(target, OutputTarget::Folder(PathBuf::from("/data/sap")));
    }

    #[test]
    fn test_plan_paths_uses_settings_output_dir() {
        let settings = Settings {
            output_dir: Some("/srv/actuals".to_string()),
            ..Settings::default()
        };
        let (_, target) = plan_paths(Some("export.xlsx"), None, &settings, &no_picker()).unwrap();
        assert_eq!(target, OutputTarget::Folder(PathBuf::from("/srv/actuals")));
    }

    #[test]
    fn test_plan_paths_explicit_output_file() {
        let (_, target) =
            plan_paths(Some("export.xlsx"), Some("/tmp/out/custom.xlsx"), &Settings::default(), &no_picker())
                .unwrap();
        assert_eq!(target, OutputTarget::File(PathBuf::from("/tmp/out/custom.xlsx")));
    }

    #[test]
    fn test_plan_paths_rejects_other_extensions() {
        let err = plan_paths(Some("export.xlsx"), Some("/tmp/out/report.xls"), &Settings::default(), &no_picker())
            .unwrap_err();
        assert!(err.to_string().contains("folder or an .xlsx file"));
    }

    #[test]
    fn test_plan_paths_extensionless_output_is_folder() {
        let (_, target) =
            plan_paths(Some("export.xlsx"), Some("/tmp/out/actuals"), &Settings::default(), &no_picker()).unwrap();
        assert_eq!(target, OutputTarget::Folder(PathBuf::from("/tmp/out/actuals")));
    }

    #[test]
    fn test_plan_paths_bare_filename_uses_current_dir() {
        let (_, target) = plan_paths(Some("export.xlsx"), None, &Settings::default(), &no_picker()).unwrap();
        assert_eq!(target, OutputTarget::Folder(PathBuf::from(".")));
    }

    #[test]
    fn test_plan_paths_interactive() {
        let picker = FixedPicker {
            input: Some(PathBuf::from("/picked/export.xlsx")),
            output: Some(PathBuf::from("/picked/out")),
        };
        let (input, target) = plan_paths(None, None, &Settings::default(), &picker).unwrap();
        assert_eq!(input, PathBuf::from("/picked/export.xlsx"));
        assert_eq!(target, OutputTarget::Folder(PathBuf::from("/picked/out")));
    }

    #[test]
    fn test_plan_paths_interactive_cancel() {
        let err = plan_paths(None, None, &Settings::default(), &no_picker()).unwrap_err();
        assert!(matches!(err, Sap2HbError::Cancelled(_)));
    }

    #[test]
    fn test_convert_file_writes_named_workbook_and_handles_collision() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), &[
            "74066927,1010,6603023,Engineering Svcs,15249,104,12480.00",
            "74066927,2010,5490000,Contracts,,0,5000.00",
        ]);
        let target = OutputTarget::Folder(dir.path().to_path_buf());

        let first = convert_file(&input, &target, &Settings::default(), now(), false).unwrap();
        assert_eq!(first.output, Some(dir.path().join("74066927_actuals.xlsx")));
        assert!(first.conversion.summary.warnings.is_empty());

        let second = convert_file(&input, &target, &Settings::default(), now(), false).unwrap();
        assert_eq!(
            second.output,
            Some(dir.path().join("74066927_actuals_20260107_093000.xlsx"))
        );
        assert_eq!(second.conversion.summary.warnings.len(), 1);
        assert_eq!(first.conversion.actuals, second.conversion.actuals);
    }

    #[test]
    fn test_convert_file_keeps_existing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), &["74066927,1010,6603023,Engineering Svcs,15249,8,960"]);
        let custom = dir.path().join("custom.xlsx");
        std::fs::write(&custom, b"keep me").unwrap();

        let report = convert_file(
            &input,
            &OutputTarget::File(custom.clone()),
            &Settings::default(),
            now(),
            false,
        )
        .unwrap();

        assert_eq!(std::fs::read(&custom).unwrap(), b"keep me");
        let written = dir.path().join("custom_20260107_093000.xlsx");
        assert_eq!(report.output, Some(written.clone()));
        assert!(written.exists());
        assert_eq!(
            report.conversion.summary.warnings,
            vec!["custom.xlsx already exists; wrote custom_20260107_093000.xlsx instead".to_string()]
        );
    }

    #[test]
    fn test_convert_file_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), &["74066927,1010,6603023,Engineering Svcs,15249,8,960"]);
        let report = convert_file(
            &input,
            &OutputTarget::Folder(dir.path().to_path_buf()),
            &Settings::default(),
            now(),
            true,
        )
        .unwrap();
        assert!(report.output.is_none());
        assert_eq!(report.conversion.boe.len(), 1);
        assert!(!dir.path().join("74066927_actuals.xlsx").exists());
    }

    #[test]
    fn test_convert_file_unknown_operation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), &[
            "74066927,1010,6603023,Engineering Svcs,15249,8,960",
            "74066927,9999,6603023,Engineering Svcs,15249,8,960",
        ]);
        let err = convert_file(
            &input,
            &OutputTarget::Folder(dir.path().to_path_buf()),
            &Settings::default(),
            now(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Sap2HbError::UnknownOperations(_)));
        assert!(!dir.path().join("74066927_actuals.xlsx").exists());
    }
}
