use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, Sap2HbError};

/// Template for labor Basis-of-Estimate notes. `{resource}` and `{hours}` are
/// substituted per labor bucket.
pub const BOE_NOTE_TEMPLATE: &str =
    "{resource}: {hours} MH Actuals to date, Projected an additional 0 MH for the remainder of the Activity";

pub const DEFAULT_TAX_OT_PERCENT: f64 = 100.0;
pub const LABOR_UNIT: &str = "HR";
pub const LUMP_SUM_UNIT: &str = "LS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Folder for generated workbooks when none is given on the command line.
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default = "default_tax_ot_percent")]
    pub tax_ot_percent: f64,
    #[serde(default = "default_labor_unit")]
    pub labor_unit: String,
    #[serde(default = "default_lump_sum_unit")]
    pub lump_sum_unit: String,
}

fn default_tax_ot_percent() -> f64 {
    DEFAULT_TAX_OT_PERCENT
}

fn default_labor_unit() -> String {
    LABOR_UNIT.to_string()
}

fn default_lump_sum_unit() -> String {
    LUMP_SUM_UNIT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: None,
            tax_ot_percent: default_tax_ot_percent(),
            labor_unit: default_labor_unit(),
            lump_sum_unit: default_lump_sum_unit(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sap2hb")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files give the defaults.
fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| Sap2HbError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
