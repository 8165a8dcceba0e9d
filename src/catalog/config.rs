//! Export configuration.
//!
//! The configuration is a JSON document whose fields all have defaults, so an
//! empty object `{}` reproduces the stock report layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::error::{CatalogError, Result};

/// Paths of the five CSV inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Catalog rows for the datasets in scope.
    pub tables: PathBuf,
    /// Scripts in scope.
    pub scripts: PathBuf,
    /// Calculated fields exported from the dashboard tool.
    pub calculated_fields: PathBuf,
    /// The entire catalog.
    pub full_catalog: PathBuf,
    /// Every exported script.
    pub all_scripts: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            tables: PathBuf::from("input/V_CATALOG_SCOPE.csv"),
            scripts: PathBuf::from("input/SCRIPTS_SCOPE.csv"),
            calculated_fields: PathBuf::from("output/tableau.csv"),
            full_catalog: PathBuf::from("input/V_CATALOG.csv"),
            all_scripts: PathBuf::from("input/ALL_SCRIPTS.csv"),
        }
    }
}

impl InputPaths {
    /// All input paths in read order.
    pub fn all(&self) -> [&Path; 5] {
        [
            self.tables.as_path(),
            self.scripts.as_path(),
            self.calculated_fields.as_path(),
            self.full_catalog.as_path(),
            self.all_scripts.as_path(),
        ]
    }
}

/// Text shown on the index sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Headings {
    pub instructions: String,
    pub navigation: String,
    pub datasets: String,
    pub scripts: String,
    pub calculated_fields: String,
}

impl Default for Headings {
    fn default() -> Self {
        Self {
            instructions: "This document contains details of the datasets and scripts used to \
                           create the dashboard."
                .to_string(),
            navigation: "Click on the sheet names below to navigate to the respective sheet."
                .to_string(),
            datasets: "Datasets used in the dashboard following full dependency trace".to_string(),
            scripts: "Scripts used to create each dataset in the workflow".to_string(),
            calculated_fields: "Tableau Calculated Fields".to_string(),
        }
    }
}

/// Built-in Excel table style, e.g. `TableStyleLight8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableTheme {
    None,
    Light(u8),
    Medium(u8),
    Dark(u8),
}

impl TableTheme {
    /// Parses an Excel style name such as `TableStyleMedium2` or `None`.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || CatalogError::InvalidConfig(format!("unknown table style '{name}'"));
        if name.eq_ignore_ascii_case("none") {
            return Ok(TableTheme::None);
        }

        let rest = name.strip_prefix("TableStyle").ok_or_else(invalid)?;
        let (family, digits, max): (fn(u8) -> TableTheme, &str, u8) =
            if let Some(digits) = rest.strip_prefix("Light") {
                (TableTheme::Light, digits, 21)
            } else if let Some(digits) = rest.strip_prefix("Medium") {
                (TableTheme::Medium, digits, 28)
            } else if let Some(digits) = rest.strip_prefix("Dark") {
                (TableTheme::Dark, digits, 11)
            } else {
                return Err(invalid());
            };

        match digits.parse::<u8>() {
            Ok(number) if (1..=max).contains(&number) => Ok(family(number)),
            _ => Err(invalid()),
        }
    }
}

/// Top-level export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub inputs: InputPaths,
    /// Only calculated fields from this dashboard workbook are listed.
    pub tableau_workbook: String,
    /// Folder scanned for `.twb` files by `extract-calculations`.
    pub tableau_folder: PathBuf,
    pub output_folder: PathBuf,
    pub excel_file_name: String,
    /// Style applied to dataset and script column tables.
    pub table_style: String,
    /// Style applied to the three index tables.
    pub index_table_style: String,
    /// Font used by the header style.
    pub font_name: String,
    pub headings: Headings,
    /// Linked from the refresh instructions sheet when present.
    pub repository_url: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            tableau_workbook: "Dashboard.twb".to_string(),
            tableau_folder: PathBuf::from("input/tableau"),
            output_folder: PathBuf::from("./output"),
            excel_file_name: "CATALOG.xlsx".to_string(),
            table_style: "TableStyleLight8".to_string(),
            index_table_style: "TableStyleLight8".to_string(),
            font_name: "Aptos".to_string(),
            headings: Headings::default(),
            repository_url: None,
        }
    }
}

impl CatalogConfig {
    /// Loads a configuration file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CatalogError::MissingInput(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(&self.excel_file_name)
    }

    /// Resolves the presentation settings, validating the style names.
    pub fn render_settings(&self) -> Result<RenderSettings> {
        Ok(RenderSettings {
            table_theme: TableTheme::parse(&self.table_style)?,
            index_table_theme: TableTheme::parse(&self.index_table_style)?,
            font_name: self.font_name.clone(),
            headings: self.headings.clone(),
            repository_url: self.repository_url.clone(),
        })
    }
}

/// Validated settings consumed by the layout and writer stages.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub table_theme: TableTheme,
    pub index_table_theme: TableTheme,
    pub font_name: String,
    pub headings: Headings,
    pub repository_url: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            table_theme: TableTheme::Light(8),
            index_table_theme: TableTheme::Light(8),
            font_name: "Aptos".to_string(),
            headings: Headings::default(),
            repository_url: None,
        }
    }
}
