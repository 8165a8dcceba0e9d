//! Calculated-field extraction from dashboard workbooks (`.twb`).
//!
//! A `.twb` file is XML. Every `workbook/datasources/datasource` holds
//! `column` elements; calculated ones carry a `calculation` child whose
//! `formula` refers to other calculations by internal id (`[Calculation_123]`)
//! and to published sources through `[sqlproxy.<key>].[field]`. Both are
//! rewritten to readable names.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::catalog::error::{CatalogError, Result};
use crate::catalog::model::CalculatedField;

static CALCULATION_RE: OnceLock<Regex> = OnceLock::new();
static SQLPROXY_RE: OnceLock<Regex> = OnceLock::new();

/// Datasource holding workbook parameters rather than data.
const PARAMETERS_DATASOURCE: &str = "parameters";

/// Extracts calculated fields from every `.twb` file directly inside
/// `folder`, sorted by workbook, data source and field name.
pub fn extract_folder(folder: &Path) -> Result<Vec<CalculatedField>> {
    if !folder.is_dir() {
        return Err(CatalogError::MissingInput(folder.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<_>>()?;
    paths.retain(|path| {
        path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("twb"))
    });
    paths.sort();

    let mut fields = Vec::new();
    for path in &paths {
        let workbook = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let xml = fs::read_to_string(path)?;
        let extracted = parse_workbook(&workbook, xml.trim_start_matches('\u{feff}'))?;
        debug!(workbook = %workbook, fields = extracted.len(), "extracted calculated fields");
        fields.extend(extracted);
    }

    sort_fields(&mut fields);
    Ok(fields)
}

/// Parses one workbook document. `workbook` is the value recorded in the
/// `Workbook` column, normally the file name.
pub fn parse_workbook(workbook: &str, xml: &str) -> Result<Vec<CalculatedField>> {
    let document = Document::parse(xml)?;
    let mut fields = Vec::new();

    let datasources = document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name("datasources"))
        .flat_map(|node| node.children())
        .filter(|node| node.has_tag_name("datasource"));

    for datasource in datasources {
        let source_name = datasource
            .attribute("caption")
            .filter(|caption| !caption.is_empty())
            .or_else(|| datasource.attribute("name"))
            .unwrap_or_default();
        if source_name.eq_ignore_ascii_case(PARAMETERS_DATASOURCE) {
            continue;
        }

        let columns: Vec<Node> = datasource
            .children()
            .filter(|node| node.has_tag_name("column"))
            .collect();

        let field_names: HashMap<String, String> = columns
            .iter()
            .filter_map(|column| {
                let id = strip_brackets(column.attribute("name")?);
                Some((id.to_string(), field_name(column)))
            })
            .collect();

        for column in &columns {
            let Some(formula) = formula(column) else {
                continue;
            };
            fields.push(CalculatedField {
                workbook: workbook.to_string(),
                data_source: source_name.to_string(),
                field_name: field_name(column),
                calculation: resolve_references(formula.trim(), &field_names, source_name)
                    .replace("\r\n", " ")
                    .replace('\n', " "),
                data_type: column.attribute("datatype").unwrap_or_default().to_string(),
            });
        }
    }

    Ok(fields)
}

/// Replaces `[Calculation_N]` ids with the field names they stand for and
/// `[sqlproxy.<key>].[field]` with `[<data source>].[field]`. Unknown ids are
/// left untouched.
pub fn resolve_references(
    calculation: &str,
    field_names: &HashMap<String, String>,
    data_source: &str,
) -> String {
    let calculation_re = CALCULATION_RE
        .get_or_init(|| Regex::new(r"\[(Calculation_\d+)\]").expect("Invalid regex"));
    let sqlproxy_re = SQLPROXY_RE.get_or_init(|| {
        Regex::new(r"\[sqlproxy\.(\w+)\]\.\[([^\]]+)\]").expect("Invalid regex")
    });

    let named = calculation_re.replace_all(calculation, |caps: &Captures| {
        match field_names.get(&caps[1]) {
            Some(name) => format!("[{name}]"),
            None => caps[0].to_string(),
        }
    });

    sqlproxy_re
        .replace_all(&named, |caps: &Captures| format!("[{data_source}].[{}]", &caps[2]))
        .into_owned()
}

/// Orders fields by workbook, then data source, then field name.
pub fn sort_fields(fields: &mut [CalculatedField]) {
    fields.sort_by(|lhs, rhs| {
        (&lhs.workbook, &lhs.data_source, &lhs.field_name).cmp(&(
            &rhs.workbook,
            &rhs.data_source,
            &rhs.field_name,
        ))
    });
}

fn formula<'a>(column: &Node<'a, '_>) -> Option<&'a str> {
    column
        .children()
        .find(|node| node.has_tag_name("calculation"))
        .and_then(|calculation| calculation.attribute("formula"))
        .filter(|formula| !formula.trim().is_empty())
}

fn field_name(column: &Node) -> String {
    column
        .attribute("caption")
        .filter(|caption| !caption.is_empty())
        .or_else(|| column.attribute("name").map(strip_brackets))
        .unwrap_or_default()
        .to_string()
}

fn strip_brackets(value: &str) -> &str {
    value
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(value)
}
