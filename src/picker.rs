use std::path::{Path, PathBuf};

use dialoguer::Input;

use crate::error::{Result, Sap2HbError};
use crate::settings::shellexpand_path;

/// Source of input/output locations when none are given on the command line.
pub trait PathPicker {
    fn select_input_file(&self) -> Result<PathBuf>;
    fn select_output_folder(&self) -> Result<PathBuf>;
}

/// Terminal prompts. An empty answer cancels.
pub struct PromptPicker {
    pub default_output: Option<PathBuf>,
}

fn prompt(text: &str, initial: Option<&Path>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(text).allow_empty(true);
    if let Some(p) = initial {
        input = input.with_initial_text(p.to_string_lossy().to_string());
    }
    let answer = input
        .interact_text()
        .map_err(|e| Sap2HbError::Other(format!("Prompt failed: {e}")))?;
    Ok(shellexpand_path(answer.trim().trim_matches('"')))
}

impl PathPicker for PromptPicker {
    fn select_input_file(&self) -> Result<PathBuf> {
        loop {
            let answer = prompt("SAP export file (.xlsx, .xls, .csv)", None)?;
            if answer.is_empty() {
                return Err(Sap2HbError::Cancelled("no file selected".to_string()));
            }
            let path = PathBuf::from(answer);
            if path.is_file() {
                return Ok(path);
            }
            eprintln!("File not found: {}", path.display());
        }
    }

    fn select_output_folder(&self) -> Result<PathBuf> {
        loop {
            let answer = prompt("Output folder", self.default_output.as_deref())?;
            if answer.is_empty() {
                return Err(Sap2HbError::Cancelled("no folder selected".to_string()));
            }
            let path = PathBuf::from(answer);
            if path.is_dir() {
                return Ok(path);
            }
            eprintln!("Not a folder: {}", path.display());
        }
    }
}

/// Picker returning preset paths.
#[cfg(test)]
pub struct FixedPicker {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[cfg(test)]
impl PathPicker for FixedPicker {
    fn select_input_file(&self) -> Result<PathBuf> {
        self.input
            .clone()
            .ok_or_else(|| Sap2HbError::Cancelled("no file selected".to_string()))
    }

    fn select_output_folder(&self) -> Result<PathBuf> {
        self.output
            .clone()
            .ok_or_else(|| Sap2HbError::Cancelled("no folder selected".to_string()))
    }
}
