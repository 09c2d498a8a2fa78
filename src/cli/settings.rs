use crate::error::{Result, Sap2HbError};
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(output_dir: Option<String>, tax_ot_percent: Option<f64>) -> Result<()> {
    let mut settings = load_settings();
    let changed = output_dir.is_some() || tax_ot_percent.is_some();

    if let Some(dir) = output_dir {
        settings.output_dir = Some(shellexpand_path(&dir));
    }
    if let Some(pct) = tax_ot_percent {
        if !pct.is_finite() || pct < 0.0 {
            return Err(Sap2HbError::Settings(format!(
                "Tax/OT % must be a non-negative number, got {pct}"
            )));
        }
        settings.tax_ot_percent = pct;
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("Settings:    {}", settings_path().display());
    println!(
        "Output dir:  {}",
        settings.output_dir.as_deref().unwrap_or("(input file's folder)")
    );
    println!("Tax/OT %:    {}", settings.tax_ot_percent);
    println!("Labor unit:  {}", settings.labor_unit);
    println!("Lump sum:    {}", settings.lump_sum_unit);
    Ok(())
}
