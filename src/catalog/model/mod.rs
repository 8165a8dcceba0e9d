use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of a catalog export: a single column of a single table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnRecord {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(deserialize_with = "deserialize_ordinal")]
    pub ordinal_position: u32,
}

/// One row of a scripts export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ScriptRecord {
    #[serde(default)]
    pub workflow_name: String,
    pub data_set_mnemonic: String,
    #[serde(default)]
    pub data_set_version: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub transformation_sql: String,
}

/// One calculated field extracted from a dashboard workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedField {
    #[serde(rename = "Workbook")]
    pub workbook: String,
    #[serde(rename = "Data Source", default)]
    pub data_source: String,
    #[serde(rename = "Field Name", default)]
    pub field_name: String,
    #[serde(rename = "Calculation", default)]
    pub calculation: String,
    #[serde(rename = "Data Type", default)]
    pub data_type: String,
}

/// A column as listed on a dataset sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub ordinal: u32,
    pub name: String,
    pub data_type: String,
}

/// A table in scope of the report together with its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub schema: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
        }
    }

    /// Columns ordered by ordinal position; ties keep their input order.
    pub fn sorted_columns(&self) -> Vec<&ColumnDef> {
        let mut columns: Vec<&ColumnDef> = self.columns.iter().collect();
        columns.sort_by_key(|column| column.ordinal);
        columns
    }
}

/// Groups catalog rows by table name. Tables appear in first-seen order and
/// keep the schema of their first row.
pub fn group_tables(rows: &[ColumnRecord]) -> Vec<TableSchema> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut tables: Vec<TableSchema> = Vec::new();

    for row in rows {
        let index = *positions.entry(row.table_name.as_str()).or_insert_with(|| {
            tables.push(TableSchema::new(&row.table_name, &row.table_schema));
            tables.len() - 1
        });
        tables[index].columns.push(ColumnDef {
            ordinal: row.ordinal_position,
            name: row.column_name.clone(),
            data_type: row.data_type.clone(),
        });
    }

    tables
}

/// Everything the workbook layout needs, already read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogInput {
    /// Datasets in scope of the report.
    pub tables: Vec<TableSchema>,
    /// Scripts in scope of the report.
    pub scripts: Vec<ScriptRecord>,
    /// Calculated fields of the selected dashboard workbook.
    pub calculated_fields: Vec<CalculatedField>,
    /// The full catalog, used to list the columns each script produces.
    pub full_catalog: Vec<ColumnRecord>,
    /// Every known script, used to find the SQL that builds each dataset.
    pub all_scripts: Vec<ScriptRecord>,
}

impl CatalogInput {
    /// SQL of the first script whose mnemonic matches `table_name` exactly.
    pub fn transformation_sql(&self, table_name: &str) -> Option<&str> {
        self.all_scripts
            .iter()
            .find(|script| script.data_set_mnemonic == table_name)
            .map(|script| script.transformation_sql.as_str())
    }

    /// Full-catalog rows describing `table_name`, in file order.
    pub fn catalog_columns<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Iterator<Item = &'a ColumnRecord> + 'a {
        self.full_catalog
            .iter()
            .filter(move |row| row.table_name == table_name)
    }
}

/// Accepts `3` as well as `3.0`, which spreadsheet round trips tend to produce.
fn deserialize_ordinal<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_ordinal(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid ordinal_position '{raw}'"))
    })
}

fn parse_ordinal(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}
