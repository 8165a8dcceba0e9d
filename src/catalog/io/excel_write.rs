use std::borrow::Cow;
use std::path::Path;

use rust_xlsxwriter::{
    Format, FormatAlign, Table, TableColumn, TableStyle, Workbook, Worksheet,
};
use tracing::{debug, warn};

use crate::catalog::config::{RenderSettings, TableTheme};
use crate::catalog::error::{CatalogError, Result};
use crate::catalog::layout::{
    CellStyle, CellValue, LinkTarget, MergedBlock, SheetPlan, TablePlan, WorkbookPlan,
};

/// Longest string Excel stores in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;
/// Appended to text cut at [`MAX_CELL_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n-- [truncated: exceeds Excel cell limit]";

/// Formats shared by every sheet of one workbook.
struct Formats {
    plain: Format,
    header: Format,
    bold: Format,
    code: Format,
}

impl Formats {
    fn new(settings: &RenderSettings) -> Self {
        Self {
            plain: Format::new(),
            header: Format::new()
                .set_font_name(settings.font_name.as_str())
                .set_font_size(14.0)
                .set_bold(),
            bold: Format::new().set_bold(),
            code: Format::new()
                .set_font_name("Calibri")
                .set_font_size(11.0)
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_align(FormatAlign::Left),
        }
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Plain => &self.plain,
            CellStyle::Header => &self.header,
            CellStyle::Bold => &self.bold,
            CellStyle::Code => &self.code,
        }
    }
}

/// Writes the planned workbook to the given path.
pub fn write_workbook(path: &Path, plan: &WorkbookPlan, settings: &RenderSettings) -> Result<()> {
    let formats = Formats::new(settings);
    let mut workbook = Workbook::new();

    for sheet in &plan.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &formats)?;
        debug!(
            sheet = %sheet.name,
            cells = sheet.cells.len(),
            tables = sheet.tables.len(),
            "sheet written"
        );
    }

    workbook.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetPlan, formats: &Formats) -> Result<()> {
    worksheet.set_name(&sheet.name)?;
    for (col, width) in &sheet.column_widths {
        worksheet.set_column_width(*col, *width)?;
    }

    for table in &sheet.tables {
        add_table(worksheet, table)?;
    }

    for merge in &sheet.merges {
        write_merge(worksheet, sheet, merge, formats)?;
    }

    for cell in &sheet.cells {
        match &cell.value {
            CellValue::Text(text) => {
                let text = cell_text(sheet, cell.row, cell.col, text);
                if cell.style == CellStyle::Plain {
                    worksheet.write_string(cell.row, cell.col, &*text)?;
                } else {
                    worksheet.write_string_with_format(
                        cell.row,
                        cell.col,
                        &*text,
                        formats.get(cell.style),
                    )?;
                }
            }
            CellValue::Number(value) => {
                worksheet.write_number(cell.row, cell.col, *value)?;
            }
            CellValue::Link { text, target } => {
                let url = link_url(target);
                let text = cell_text(sheet, cell.row, cell.col, text);
                worksheet.write_url_with_text(cell.row, cell.col, url.as_str(), &*text)?;
            }
        }
    }

    Ok(())
}

fn add_table(worksheet: &mut Worksheet, plan: &TablePlan) -> Result<()> {
    let columns: Vec<TableColumn> = plan
        .headers
        .iter()
        .map(|header| TableColumn::new().set_header(header.as_str()))
        .collect();

    let mut table = Table::new();
    table.set_name(plan.name.as_str());
    table.set_style(table_style(plan.theme)?);
    table.set_columns(&columns);

    worksheet.add_table(
        plan.first_row,
        plan.first_col,
        plan.last_row,
        plan.last_col(),
        &table,
    )?;
    Ok(())
}

fn write_merge(
    worksheet: &mut Worksheet,
    sheet: &SheetPlan,
    merge: &MergedBlock,
    formats: &Formats,
) -> Result<()> {
    let text = cell_text(sheet, merge.first_row, merge.first_col, &merge.text);
    worksheet.merge_range(
        merge.first_row,
        merge.first_col,
        merge.last_row,
        merge.last_col,
        &*text,
        formats.get(merge.style),
    )?;
    Ok(())
}

/// Cuts text that would not fit in one cell so a single oversized script
/// does not abort the export.
fn cell_text<'a>(sheet: &SheetPlan, row: u32, col: u16, text: &'a str) -> Cow<'a, str> {
    let total = text.chars().count();
    if total <= MAX_CELL_CHARS {
        return Cow::Borrowed(text);
    }

    let keep = MAX_CELL_CHARS - TRUNCATION_MARKER.chars().count();
    warn!(
        sheet = %sheet.name,
        row,
        col,
        chars = total,
        "cell text exceeds Excel limit; truncating"
    );
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    Cow::Owned(truncated)
}

/// Builds the hyperlink target understood by the writer. Internal links are
/// always quoted so sheet names with spaces resolve.
fn link_url(target: &LinkTarget) -> String {
    match target {
        LinkTarget::Sheet(name) => format!("internal:'{}'!A1", name.replace('\'', "''")),
        LinkTarget::External(url) => url.clone(),
    }
}

fn table_style(theme: TableTheme) -> Result<TableStyle> {
    let style = match theme {
        TableTheme::None => TableStyle::None,
        TableTheme::Light(n) => match n {
            1 => TableStyle::Light1,
            2 => TableStyle::Light2,
            3 => TableStyle::Light3,
            4 => TableStyle::Light4,
            5 => TableStyle::Light5,
            6 => TableStyle::Light6,
            7 => TableStyle::Light7,
            8 => TableStyle::Light8,
            9 => TableStyle::Light9,
            10 => TableStyle::Light10,
            11 => TableStyle::Light11,
            12 => TableStyle::Light12,
            13 => TableStyle::Light13,
            14 => TableStyle::Light14,
            15 => TableStyle::Light15,
            16 => TableStyle::Light16,
            17 => TableStyle::Light17,
            18 => TableStyle::Light18,
            19 => TableStyle::Light19,
            20 => TableStyle::Light20,
            21 => TableStyle::Light21,
            _ => return Err(unknown_theme(theme)),
        },
        TableTheme::Medium(n) => match n {
            1 => TableStyle::Medium1,
            2 => TableStyle::Medium2,
            3 => TableStyle::Medium3,
            4 => TableStyle::Medium4,
            5 => TableStyle::Medium5,
            6 => TableStyle::Medium6,
            7 => TableStyle::Medium7,
            8 => TableStyle::Medium8,
            9 => TableStyle::Medium9,
            10 => TableStyle::Medium10,
            11 => TableStyle::Medium11,
            12 => TableStyle::Medium12,
            13 => TableStyle::Medium13,
            14 => TableStyle::Medium14,
            15 => TableStyle::Medium15,
            16 => TableStyle::Medium16,
            17 => TableStyle::Medium17,
            18 => TableStyle::Medium18,
            19 => TableStyle::Medium19,
            20 => TableStyle::Medium20,
            21 => TableStyle::Medium21,
            22 => TableStyle::Medium22,
            23 => TableStyle::Medium23,
            24 => TableStyle::Medium24,
            25 => TableStyle::Medium25,
            26 => TableStyle::Medium26,
            27 => TableStyle::Medium27,
            28 => TableStyle::Medium28,
            _ => return Err(unknown_theme(theme)),
        },
        TableTheme::Dark(n) => match n {
            1 => TableStyle::Dark1,
            2 => TableStyle::Dark2,
            3 => TableStyle::Dark3,
            4 => TableStyle::Dark4,
            5 => TableStyle::Dark5,
            6 => TableStyle::Dark6,
            7 => TableStyle::Dark7,
            8 => TableStyle::Dark8,
            9 => TableStyle::Dark9,
            10 => TableStyle::Dark10,
            11 => TableStyle::Dark11,
            _ => return Err(unknown_theme(theme)),
        },
    };
    Ok(style)
}

fn unknown_theme(theme: TableTheme) -> CatalogError {
    CatalogError::InvalidConfig(format!("unsupported table style {theme:?}"))
}
