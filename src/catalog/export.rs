use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::catalog::config::{CatalogConfig, InputPaths, RenderSettings};
use crate::catalog::error::{CatalogError, Result};
use crate::catalog::io::{csv_read, csv_write, excel_write, twb_read};
use crate::catalog::layout::{WorkbookPlan, build_workbook};
use crate::catalog::model::{CatalogInput, group_tables};

/// Reads the five CSV exports described by `inputs`.
#[instrument(level = "info", skip_all, fields(workbook = %tableau_workbook))]
pub fn read_inputs(inputs: &InputPaths, tableau_workbook: &str) -> Result<CatalogInput> {
    for path in inputs.all() {
        if !path.exists() {
            return Err(CatalogError::MissingInput(path.to_path_buf()));
        }
    }

    let tables = group_tables(&csv_read::read_table_columns(&inputs.tables)?);
    let scripts = csv_read::read_scripts(&inputs.scripts)?;
    let calculated_fields =
        csv_read::read_calculated_fields(&inputs.calculated_fields, tableau_workbook)?;
    let full_catalog = csv_read::read_table_columns(&inputs.full_catalog)?;
    let all_scripts = csv_read::read_scripts(&inputs.all_scripts)?;

    info!(
        tables = tables.len(),
        scripts = scripts.len(),
        calculated_fields = calculated_fields.len(),
        "read catalog inputs"
    );

    Ok(CatalogInput {
        tables,
        scripts,
        calculated_fields,
        full_catalog,
        all_scripts,
    })
}

/// Lays out and writes the workbook for already-loaded inputs.
#[instrument(level = "info", skip(input, settings), fields(output = %output.display()))]
pub fn write_catalog(
    input: &CatalogInput,
    settings: &RenderSettings,
    output: &Path,
) -> Result<WorkbookPlan> {
    let plan = build_workbook(input, settings);
    debug!(sheet_count = plan.sheets.len(), "workbook laid out");
    excel_write::write_workbook(output, &plan, settings)?;
    Ok(plan)
}

/// Runs a full export: reads the inputs named in `config`, ensures the output
/// folder exists and writes the catalog workbook. Returns the written path.
#[instrument(level = "info", skip_all)]
pub fn export_catalog(config: &CatalogConfig) -> Result<PathBuf> {
    let settings = config.render_settings()?;
    let input = read_inputs(&config.inputs, &config.tableau_workbook)?;

    let output = config.output_path();
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let plan = write_catalog(&input, &settings, &output)?;
    info!(
        output = %output.display(),
        sheet_count = plan.sheets.len(),
        "catalog exported"
    );
    Ok(output)
}

/// Extracts calculated fields from every `.twb` file in `folder` and writes
/// them as the calculated-fields CSV. Returns the number of fields written.
#[instrument(
    level = "info",
    skip_all,
    fields(folder = %folder.display(), output = %output.display())
)]
pub fn extract_calculations(folder: &Path, output: &Path) -> Result<usize> {
    let fields = twb_read::extract_folder(folder)?;
    csv_write::write_calculated_fields(output, &fields)?;
    info!(calculated_fields = fields.len(), "calculated fields extracted");
    Ok(fields.len())
}
