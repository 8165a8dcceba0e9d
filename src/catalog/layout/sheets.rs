use crate::catalog::config::{RenderSettings, TableTheme};
use crate::catalog::model::{CalculatedField, ColumnRecord, ScriptRecord, TableSchema};
use crate::catalog::naming::TableNameRegistry;

use super::{
    BACK_TO_INDEX, CellStyle, DatasetEntry, INDEX_SHEET, INSTRUCTIONS_SHEET, LinkTarget,
    MergedBlock, SheetPlan, TablePlan,
};

const COLUMN_HEADERS: [&str; 3] = ["#", "Column Name", "Data Type"];

/// Height of the merged SQL block on dataset sheets.
const DATASET_SQL_ROWS: u32 = 500;
/// Height of the merged SQL block on script sheets.
const SCRIPT_SQL_ROWS: u32 = 501;

/// Appends a table whose header sits at `header_row` and whose data occupies
/// `data_rows` rows below it. Returns the last row the table covers.
fn push_table(
    sheet: &mut SheetPlan,
    name: String,
    header_row: u32,
    first_col: u16,
    headers: &[&str],
    data_rows: usize,
    theme: TableTheme,
) -> u32 {
    // Excel cannot store a table without at least one data row.
    let last_row = header_row + (data_rows as u32).max(1);
    sheet.tables.push(TablePlan {
        name,
        first_row: header_row,
        first_col,
        last_row,
        headers: headers.iter().map(|header| header.to_string()).collect(),
        theme,
    });
    last_row
}

fn back_to_index(sheet: &mut SheetPlan) {
    sheet.link(
        0,
        4,
        BACK_TO_INDEX,
        LinkTarget::Sheet(INDEX_SHEET.to_string()),
    );
}

pub(super) fn index_sheet(
    datasets: &[DatasetEntry],
    scripts: &[ScriptRecord],
    fields: &[CalculatedField],
    settings: &RenderSettings,
    table_names: &mut TableNameRegistry,
) -> SheetPlan {
    let headings = &settings.headings;
    let theme = settings.index_table_theme;

    let mut sheet = SheetPlan::new(INDEX_SHEET);
    sheet.widths(0..3, 40.0);
    sheet.widths(3..5, 15.0);

    sheet.text(0, 0, "Instructions", CellStyle::Header);
    sheet.text(1, 0, &headings.instructions, CellStyle::Plain);
    sheet.text(2, 0, &headings.navigation, CellStyle::Plain);

    sheet.text(4, 0, &headings.datasets, CellStyle::Header);
    let header_row = 5;
    for (offset, entry) in datasets.iter().enumerate() {
        let row = header_row + 1 + offset as u32;
        sheet.text(row, 0, &entry.schema, CellStyle::Plain);
        sheet.text(row, 1, &entry.table_name, CellStyle::Plain);
        sheet.link(
            row,
            2,
            &entry.sheet_name,
            LinkTarget::Sheet(entry.sheet_name.clone()),
        );
    }
    let last_row = push_table(
        &mut sheet,
        table_names.assign("DatasetsTable"),
        header_row,
        0,
        &["Schema", "Table Name", "Sheet Name"],
        datasets.len(),
        theme,
    );

    let heading_row = last_row + 2;
    sheet.text(heading_row, 0, &headings.scripts, CellStyle::Header);
    let header_row = heading_row + 1;
    for (index, script) in scripts.iter().enumerate() {
        let row = header_row + 1 + index as u32;
        let sheet_name = super::script_sheet_name(index);
        sheet.text(row, 0, &script.workflow_name, CellStyle::Plain);
        sheet.text(row, 1, &script.data_set_mnemonic, CellStyle::Plain);
        sheet.text(row, 2, &script.data_set_version, CellStyle::Plain);
        sheet.text(row, 3, &script.date_modified, CellStyle::Plain);
        sheet.link(row, 4, &sheet_name, LinkTarget::Sheet(sheet_name.clone()));
    }
    let last_row = push_table(
        &mut sheet,
        table_names.assign("ScriptsTable"),
        header_row,
        0,
        &[
            "Workflow Name",
            "Dataset Mnemonic",
            "Dataset Version",
            "Date Modified",
            "Sheet Name",
        ],
        scripts.len(),
        theme,
    );

    let heading_row = last_row + 2;
    sheet.text(heading_row, 0, &headings.calculated_fields, CellStyle::Header);
    let header_row = heading_row + 1;
    for (offset, field) in fields.iter().enumerate() {
        let row = header_row + 1 + offset as u32;
        sheet.text(row, 0, &field.data_source, CellStyle::Plain);
        sheet.text(row, 1, &field.field_name, CellStyle::Plain);
        sheet.text(row, 2, &field.calculation, CellStyle::Plain);
        sheet.text(row, 3, &field.data_type, CellStyle::Plain);
    }
    push_table(
        &mut sheet,
        table_names.assign("TableauFieldsTable"),
        header_row,
        0,
        &["Data Source", "Field Name", "Calculation", "Data Type"],
        fields.len(),
        theme,
    );

    sheet
}

/// One line of the refresh instructions sheet.
enum Line {
    Title(&'static str),
    Step(&'static str),
    Text(&'static str),
    Repository,
    Blank,
}

const REFRESH_INSTRUCTIONS: &[Line] = &[
    Line::Title("Refresh Instructions"),
    Line::Text(
        "This document contains instructions on how to refresh and update the data for this \
         Excel workbook.",
    ),
    Line::Step("1. Expected Files:"),
    Line::Text("   - Two catalog files:"),
    Line::Text("     1. Specific datasets for the report scope."),
    Line::Text("     2. Entire catalog."),
    Line::Text("   - Two script files:"),
    Line::Text("     1. Specific datasets in scope of the report."),
    Line::Text("     2. All scripts."),
    Line::Blank,
    Line::Step("2. Running the Datasets:"),
    Line::Text("   - Run and export these 4 datasets to CSV format."),
    Line::Blank,
    Line::Step("3. Preparing the Tool:"),
    Line::Repository,
    Line::Text("   - Install the 'catalog-tools' binary."),
    Line::Blank,
    Line::Step("4. Saving the Datasets:"),
    Line::Text("   - Save the four datasets in the 'input' directory."),
    Line::Blank,
    Line::Step("5. Adding Calculated Fields:"),
    Line::Text("   - Copy the dashboard '.twb' files into 'input/tableau'."),
    Line::Text("   - Run 'catalog-tools extract-calculations' to write 'output/tableau.csv'."),
    Line::Blank,
    Line::Step("6. Generating the Excel File:"),
    Line::Text("   - Adjust the configuration file to load the correct files and update titles."),
    Line::Text("   - Run 'catalog-tools export --config <file>' to generate the workbook."),
    Line::Blank,
    Line::Text("If you encounter any issues, please refer to the repository README."),
];

pub(super) fn instructions_sheet(settings: &RenderSettings) -> SheetPlan {
    let mut sheet = SheetPlan::new(INSTRUCTIONS_SHEET);

    let mut row = 0;
    for line in REFRESH_INSTRUCTIONS {
        match line {
            Line::Title(text) => sheet.text(row, 0, *text, CellStyle::Header),
            Line::Step(text) => sheet.text(row, 0, *text, CellStyle::Bold),
            Line::Text(text) => sheet.text(row, 0, *text, CellStyle::Plain),
            // Without a URL the checkout lines are left out entirely.
            Line::Repository => {
                let Some(url) = &settings.repository_url else {
                    continue;
                };
                sheet.text(row, 0, "   - Check out the repository:", CellStyle::Plain);
                row += 1;
                sheet.link(
                    row,
                    0,
                    format!("     {url}"),
                    LinkTarget::External(url.clone()),
                );
            }
            Line::Blank => {}
        }
        row += 1;
    }

    sheet
}

pub(super) fn dataset_sheet(
    table: &TableSchema,
    sheet_name: &str,
    sql: Option<&str>,
    settings: &RenderSettings,
    table_names: &mut TableNameRegistry,
) -> SheetPlan {
    let mut sheet = SheetPlan::new(sheet_name);
    sheet.widths([1, 2], 30.0);
    sheet.widths(4..9, 30.0);

    sheet.text(0, 0, table.name.to_uppercase(), CellStyle::Plain);
    sheet.text(1, 0, format!("Schema: {}", table.schema), CellStyle::Plain);
    back_to_index(&mut sheet);

    let header_row = 3;
    let columns = table.sorted_columns();
    for (offset, column) in columns.iter().enumerate() {
        let row = header_row + 1 + offset as u32;
        sheet.text(row, 0, column.ordinal.to_string(), CellStyle::Plain);
        sheet.text(row, 1, &column.name, CellStyle::Plain);
        sheet.text(row, 2, &column.data_type, CellStyle::Plain);
    }
    push_table(
        &mut sheet,
        table_names.assign(&format!("{sheet_name}_table")),
        header_row,
        0,
        &COLUMN_HEADERS,
        columns.len(),
        settings.table_theme,
    );

    sheet.text(2, 4, "SQL_TRANSFORMATION", CellStyle::Header);
    sheet.merges.push(MergedBlock {
        first_row: header_row,
        first_col: 4,
        last_row: header_row + DATASET_SQL_ROWS - 1,
        last_col: 8,
        text: sql.unwrap_or_default().to_string(),
        style: CellStyle::Code,
    });

    sheet
}

pub(super) fn script_sheet<'a>(
    script: &ScriptRecord,
    sheet_name: &str,
    catalog_columns: impl Iterator<Item = &'a ColumnRecord>,
    settings: &RenderSettings,
    table_names: &mut TableNameRegistry,
) -> SheetPlan {
    let mut sheet = SheetPlan::new(sheet_name);
    sheet.widths(0..2, 20.0);
    sheet.widths(13..16, 15.0);

    sheet.text(
        0,
        0,
        format!("{} Script", script.data_set_mnemonic),
        CellStyle::Header,
    );
    back_to_index(&mut sheet);

    let details = [
        ("WORKFLOW_NAME", &script.workflow_name),
        ("DATA_SET_MNEMONIC", &script.data_set_mnemonic),
        ("DATA_SET_VERSION", &script.data_set_version),
        ("DATE_MODIFIED", &script.date_modified),
    ];
    for (offset, (label, value)) in details.into_iter().enumerate() {
        let row = 2 + offset as u32;
        sheet.text(row, 0, label, CellStyle::Plain);
        sheet.text(row, 1, value.as_str(), CellStyle::Plain);
    }

    sheet.text(7, 0, "TRANSFORMATION_SQL", CellStyle::Header);
    sheet.merges.push(MergedBlock {
        first_row: 8,
        first_col: 0,
        last_row: 8 + SCRIPT_SQL_ROWS - 1,
        last_col: 11,
        text: script.transformation_sql.clone(),
        style: CellStyle::Code,
    });

    sheet.text(7, 13, "Table Columns", CellStyle::Header);
    let header_row = 8;
    let mut rows = 0;
    for (offset, column) in catalog_columns.enumerate() {
        let row = header_row + 1 + offset as u32;
        sheet.number(row, 13, f64::from(column.ordinal_position));
        sheet.text(row, 14, &column.column_name, CellStyle::Plain);
        sheet.text(row, 15, &column.data_type, CellStyle::Plain);
        rows += 1;
    }
    push_table(
        &mut sheet,
        table_names.assign(&format!("{}_Columns", script.data_set_mnemonic)),
        header_row,
        13,
        &COLUMN_HEADERS,
        rows,
        settings.table_theme,
    );

    sheet
}
