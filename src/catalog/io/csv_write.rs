use std::fs;
use std::path::Path;

use crate::catalog::error::Result;
use crate::catalog::model::CalculatedField;

/// Writes calculated fields with the header
/// `Workbook,Data Source,Field Name,Calculation,Data Type`, creating the
/// parent folder when needed.
pub fn write_calculated_fields(path: &Path, fields: &[CalculatedField]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for field in fields {
        writer.serialize(field)?;
    }
    writer.flush()?;
    Ok(())
}
