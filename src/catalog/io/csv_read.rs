use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::error::Result;
use crate::catalog::model::{CalculatedField, ColumnRecord, ScriptRecord};

/// Reads every row of a catalog export.
pub fn read_table_columns(path: &Path) -> Result<Vec<ColumnRecord>> {
    read_records(path)
}

/// Reads every row of a scripts export.
pub fn read_scripts(path: &Path) -> Result<Vec<ScriptRecord>> {
    read_records(path)
}

/// Reads the calculated-fields export, keeping only rows of `workbook`.
pub fn read_calculated_fields(path: &Path, workbook: &str) -> Result<Vec<CalculatedField>> {
    let fields: Vec<CalculatedField> = read_records(path)?;
    let total = fields.len();
    let selected = filter_calculated_fields(fields, workbook);
    debug!(
        path = %path.display(),
        total,
        selected = selected.len(),
        workbook,
        "filtered calculated fields"
    );
    Ok(selected)
}

/// Keeps the fields whose workbook name equals `workbook`, in input order.
pub fn filter_calculated_fields(
    fields: Vec<CalculatedField>,
    workbook: &str,
) -> Vec<CalculatedField> {
    fields
        .into_iter()
        .filter(|field| field.workbook == workbook)
        .collect()
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let records = reader
        .deserialize::<T>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    debug!(path = %path.display(), rows = records.len(), "read CSV export");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::CatalogError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_catalog_rows_ignoring_extra_columns() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("catalog.csv");
        fs::write(
            &path,
            "table_schema,table_name,column_name,data_type,ordinal_position,is_nullable\n\
             sales,orders,id,int,1,false\n\
             sales,orders,total,\"numeric(10,2)\",2.0,true\n",
        )
        .expect("fixture written");

        let rows = read_table_columns(&path).expect("rows read");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].data_type, "numeric(10,2)");
        assert_eq!(rows[1].ordinal_position, 2);
    }

    #[test]
    fn reads_multiline_sql_in_scripts() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("scripts.csv");
        fs::write(
            &path,
            "WORKFLOW_NAME,DATA_SET_MNEMONIC,DATA_SET_VERSION,DATE_MODIFIED,TRANSFORMATION_SQL\n\
             nightly,ORDERS,3,2024-05-01,\"select *\nfrom raw.orders\"\n",
        )
        .expect("fixture written");

        let scripts = read_scripts(&path).expect("scripts read");

        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].data_set_version, "3");
        assert_eq!(scripts[0].transformation_sql, "select *\nfrom raw.orders");
    }

    #[test]
    fn calculated_fields_are_filtered_by_workbook() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("tableau.csv");
        fs::write(
            &path,
            "Workbook,Data Source,Field Name,Calculation,Data Type\n\
             a.twb,Orders,Margin,[Profit]/[Sales],real\n\
             b.twb,Orders,Other,1,integer\n\
             a.twb,Orders,Flag,[Margin] > 0,boolean\n",
        )
        .expect("fixture written");

        let fields = read_calculated_fields(&path, "a.twb").expect("fields read");

        let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["Margin", "Flag"]);
    }

    #[test]
    fn unreadable_file_is_a_csv_error() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("absent.csv");

        let error = read_scripts(&path).expect_err("missing input");

        assert!(matches!(error, CatalogError::Csv(_)));
    }

    #[test]
    fn bad_ordinal_is_a_csv_error() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("catalog.csv");
        fs::write(
            &path,
            "table_schema,table_name,column_name,data_type,ordinal_position\n\
             sales,orders,id,int,first\n",
        )
        .expect("fixture written");

        assert!(matches!(
            read_table_columns(&path),
            Err(CatalogError::Csv(_))
        ));
    }
}
