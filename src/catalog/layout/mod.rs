//! In-memory description of the catalog workbook.
//!
//! [`build_workbook`] turns the parsed inputs into a [`WorkbookPlan`] without
//! touching the file system; [`excel_write`](crate::catalog::io::excel_write)
//! renders the plan. Rows and columns are zero-based, as in the writer.

mod sheets;

use tracing::debug;

use crate::catalog::config::{RenderSettings, TableTheme};
use crate::catalog::model::CatalogInput;
use crate::catalog::naming::{SheetNameRegistry, TableNameRegistry, sheet_title};

/// Name of the navigation sheet.
pub const INDEX_SHEET: &str = "Index";
/// Name of the sheet describing how to refresh the workbook.
pub const INSTRUCTIONS_SHEET: &str = "Refresh Instructions";
/// Label of the link every content sheet carries back to the index.
pub const BACK_TO_INDEX: &str = "Back to Index";

/// Name of the sheet generated for the script at zero-based `index`.
pub fn script_sheet_name(index: usize) -> String {
    format!("Script_{}", index + 1)
}

/// Where a hyperlink points.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// Cell `A1` of another sheet in the workbook.
    Sheet(String),
    /// An external URL.
    External(String),
}

/// Cell payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Link { text: String, target: LinkTarget },
}

/// Named cell styles used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    /// Configured font, 14pt, bold.
    Header,
    Bold,
    /// Wrapped, aligned top-left; used for SQL blocks.
    Code,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub style: CellStyle,
}

/// A merged rectangular block holding a single text value.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedBlock {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
    pub text: String,
    pub style: CellStyle,
}

/// A styled Excel table. The header row is `first_row`; data rows must be
/// written as regular cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    pub name: String,
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub headers: Vec<String>,
    pub theme: TableTheme,
}

impl TablePlan {
    pub fn last_col(&self) -> u16 {
        self.first_col + (self.headers.len() as u16).saturating_sub(1)
    }
}

/// Everything needed to render one worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetPlan {
    pub name: String,
    pub column_widths: Vec<(u16, f64)>,
    pub cells: Vec<Cell>,
    pub merges: Vec<MergedBlock>,
    pub tables: Vec<TablePlan>,
}

impl SheetPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn text(&mut self, row: u32, col: u16, value: impl Into<String>, style: CellStyle) {
        self.cells.push(Cell {
            row,
            col,
            value: CellValue::Text(value.into()),
            style,
        });
    }

    pub fn number(&mut self, row: u32, col: u16, value: f64) {
        self.cells.push(Cell {
            row,
            col,
            value: CellValue::Number(value),
            style: CellStyle::Plain,
        });
    }

    pub fn link(&mut self, row: u32, col: u16, text: impl Into<String>, target: LinkTarget) {
        self.cells.push(Cell {
            row,
            col,
            value: CellValue::Link {
                text: text.into(),
                target,
            },
            style: CellStyle::Plain,
        });
    }

    pub fn widths(&mut self, cols: impl IntoIterator<Item = u16>, width: f64) {
        self.column_widths
            .extend(cols.into_iter().map(|col| (col, width)));
    }

    /// Looks up the value written at a position, if any.
    #[cfg(test)]
    pub(crate) fn cell(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells
            .iter()
            .rev()
            .find(|cell| cell.row == row && cell.col == col)
            .map(|cell| &cell.value)
    }

    #[cfg(test)]
    pub(crate) fn table(&self, name: &str) -> Option<&TablePlan> {
        self.tables.iter().find(|table| table.name == name)
    }
}

/// The whole workbook, sheets in output order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookPlan {
    pub sheets: Vec<SheetPlan>,
}

impl WorkbookPlan {
    #[cfg(test)]
    pub(crate) fn sheet(&self, name: &str) -> Option<&SheetPlan> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    #[cfg(test)]
    pub(crate) fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}

/// Index entry for a dataset sheet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DatasetEntry {
    pub schema: String,
    pub table_name: String,
    pub sheet_name: String,
}

/// Lays out the catalog workbook: index, refresh instructions, one sheet per
/// dataset, then one sheet per script.
pub fn build_workbook(input: &CatalogInput, settings: &RenderSettings) -> WorkbookPlan {
    let mut sheet_names = SheetNameRegistry::new();
    let mut table_names = TableNameRegistry::new();

    sheet_names.claim(INDEX_SHEET);
    sheet_names.claim(INSTRUCTIONS_SHEET);
    for index in 0..input.scripts.len() {
        sheet_names.claim(&script_sheet_name(index));
    }

    let mut dataset_sheets = Vec::with_capacity(input.tables.len());
    let mut entries = Vec::with_capacity(input.tables.len());
    for table in &input.tables {
        let sheet_name = sheet_names.assign(&sheet_title(&table.name));
        debug!(table = %table.name, sheet = %sheet_name, "assigned dataset sheet");
        entries.push(DatasetEntry {
            schema: table.schema.clone(),
            table_name: table.name.clone(),
            sheet_name: sheet_name.clone(),
        });
        dataset_sheets.push(sheets::dataset_sheet(
            table,
            &sheet_name,
            input.transformation_sql(&table.name),
            settings,
            &mut table_names,
        ));
    }

    let script_sheets: Vec<SheetPlan> = input
        .scripts
        .iter()
        .enumerate()
        .map(|(index, script)| {
            sheets::script_sheet(
                script,
                &script_sheet_name(index),
                input.catalog_columns(&script.data_set_mnemonic),
                settings,
                &mut table_names,
            )
        })
        .collect();

    let index = sheets::index_sheet(
        &entries,
        &input.scripts,
        &input.calculated_fields,
        settings,
        &mut table_names,
    );
    let instructions = sheets::instructions_sheet(settings);

    let mut all_sheets = vec![index, instructions];
    all_sheets.extend(dataset_sheets);
    all_sheets.extend(script_sheets);

    WorkbookPlan { sheets: all_sheets }
}
