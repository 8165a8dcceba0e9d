use std::fs;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use catalog_tools::CatalogError;
use catalog_tools::config::{CatalogConfig, InputPaths};
use catalog_tools::export;
use catalog_tools::io::excel_write::{MAX_CELL_CHARS, TRUNCATION_MARKER};
use tempfile::tempdir;

const TABLES_CSV: &str = "\
table_schema,table_name,column_name,data_type,ordinal_position
analytics,patients,name,varchar(80),2
analytics,patients,id,int,1
analytics,a_really_long_dataset_name_that_overflows,id,int,1
staging,A_REALLY_LONG_DATASET_NAME_THAT_OVERFLOWS,id,int,1
";

const SCRIPTS_CSV: &str = "\
WORKFLOW_NAME,DATA_SET_MNEMONIC,DATA_SET_VERSION,DATE_MODIFIED,TRANSFORMATION_SQL
Case Finding,PATIENTS,4,2024-02-11,\"select id,
       name
from raw.patients\"
";

const CALCULATED_FIELDS_CSV: &str = "\
Workbook,Data Source,Field Name,Calculation,Data Type
Dash.twb,Patients,Age Band,\"IF [Age] > 65 THEN 'Older' END\",string
Other.twb,Patients,Ignored,1,integer
";

const FULL_CATALOG_CSV: &str = "\
table_schema,table_name,column_name,data_type,ordinal_position
analytics,PATIENTS,id,int,1
analytics,PATIENTS,name,varchar(80),2
analytics,ENCOUNTERS,id,int,1
";

const ALL_SCRIPTS_CSV: &str = "\
WORKFLOW_NAME,DATA_SET_MNEMONIC,DATA_SET_VERSION,DATE_MODIFIED,TRANSFORMATION_SQL
Case Finding,patients,4,2024-02-11,select id from raw.patients
";

fn write_inputs(dir: &Path) -> InputPaths {
    let inputs = InputPaths {
        tables: dir.join("tables.csv"),
        scripts: dir.join("scripts.csv"),
        calculated_fields: dir.join("tableau.csv"),
        full_catalog: dir.join("catalog.csv"),
        all_scripts: dir.join("all_scripts.csv"),
    };
    fs::write(&inputs.tables, TABLES_CSV).expect("tables written");
    fs::write(&inputs.scripts, SCRIPTS_CSV).expect("scripts written");
    fs::write(&inputs.calculated_fields, CALCULATED_FIELDS_CSV).expect("fields written");
    fs::write(&inputs.full_catalog, FULL_CATALOG_CSV).expect("catalog written");
    fs::write(&inputs.all_scripts, ALL_SCRIPTS_CSV).expect("all scripts written");
    inputs
}

fn config_for(dir: &Path) -> CatalogConfig {
    CatalogConfig {
        inputs: write_inputs(dir),
        tableau_workbook: "Dash.twb".to_string(),
        output_folder: dir.join("nested").join("output"),
        excel_file_name: "catalog.xlsx".to_string(),
        ..CatalogConfig::default()
    }
}

fn text(range: &Range<DataType>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn sheet(workbook: &mut Xlsx<std::io::BufReader<fs::File>>, name: &str) -> Range<DataType> {
    workbook
        .worksheet_range(name)
        .expect("sheet present")
        .expect("sheet readable")
}

#[test]
fn export_writes_linked_catalog_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());

    let output = export::export_catalog(&config).expect("catalog exported");

    assert_eq!(output, config.output_path());
    assert!(output.exists());

    let mut workbook: Xlsx<_> = open_workbook(&output).expect("workbook opened");
    assert_eq!(
        workbook.sheet_names().to_vec(),
        vec![
            "Index".to_string(),
            "Refresh Instructions".to_string(),
            "PATIENTS".to_string(),
            "A_REALLY_LONG_DATASET_NAME_THAT".to_string(),
            "A_REALLY_LONG_DATASET_NAME__1".to_string(),
            "Script_1".to_string(),
        ]
    );

    let index = sheet(&mut workbook, "Index");
    assert_eq!(text(&index, 0, 0), "Instructions");
    assert_eq!(text(&index, 5, 0), "Schema");
    assert_eq!(text(&index, 6, 1), "patients");
    assert_eq!(text(&index, 6, 2), "PATIENTS");
    assert_eq!(text(&index, 8, 2), "A_REALLY_LONG_DATASET_NAME__1");
    assert_eq!(text(&index, 11, 4), "Sheet Name");
    assert_eq!(text(&index, 12, 1), "PATIENTS");
    assert_eq!(text(&index, 12, 4), "Script_1");
    assert_eq!(text(&index, 16, 1), "Age Band");
    assert_eq!(text(&index, 17, 1), "");
}

#[test]
fn dataset_and_script_sheets_carry_columns_and_sql() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let output = export::export_catalog(&config).expect("catalog exported");
    let mut workbook: Xlsx<_> = open_workbook(&output).expect("workbook opened");

    let dataset = sheet(&mut workbook, "PATIENTS");
    assert_eq!(text(&dataset, 0, 0), "PATIENTS");
    assert_eq!(text(&dataset, 0, 4), "Back to Index");
    assert_eq!(text(&dataset, 1, 0), "Schema: analytics");
    assert_eq!(text(&dataset, 3, 1), "Column Name");
    assert_eq!(text(&dataset, 4, 1), "id");
    assert_eq!(text(&dataset, 5, 1), "name");
    assert_eq!(text(&dataset, 3, 4), "select id from raw.patients");

    let script = sheet(&mut workbook, "Script_1");
    assert_eq!(text(&script, 0, 0), "PATIENTS Script");
    assert_eq!(text(&script, 2, 1), "Case Finding");
    assert_eq!(text(&script, 4, 1), "4");
    assert_eq!(
        text(&script, 8, 0),
        "select id,\n       name\nfrom raw.patients"
    );
    assert_eq!(text(&script, 8, 14), "Column Name");
    assert_eq!(text(&script, 10, 14), "name");
    assert_eq!(text(&script, 10, 13), "2");
}

#[test]
fn missing_input_is_reported_before_writing() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut config = config_for(temp_dir.path());
    config.inputs.all_scripts = temp_dir.path().join("absent.csv");

    let error = export::export_catalog(&config).expect_err("export fails");

    assert!(matches!(error, CatalogError::MissingInput(path) if path.ends_with("absent.csv")));
    assert!(!config.output_path().exists());
}

#[test]
fn unknown_table_style_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut config = config_for(temp_dir.path());
    config.index_table_style = "TableStyleShiny3".to_string();

    let error = export::export_catalog(&config).expect_err("export fails");

    assert!(matches!(error, CatalogError::InvalidConfig(_)));
}

#[test]
fn config_file_round_trips_through_disk() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("catalog.json");
    let config = CatalogConfig {
        repository_url: Some("https://example.com/catalog-tools".to_string()),
        ..CatalogConfig::default()
    };

    config.save(&path).expect("config saved");
    let restored = CatalogConfig::load(&path).expect("config loaded");

    assert_eq!(config, restored);
}

#[test]
fn oversized_sql_is_truncated_instead_of_failing() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let sql = format!("select {} from raw.patients", "x".repeat(40_000));
    let header = "WORKFLOW_NAME,DATA_SET_MNEMONIC,DATA_SET_VERSION,DATE_MODIFIED,TRANSFORMATION_SQL";
    fs::write(
        &config.inputs.scripts,
        format!("{header}\nCase Finding,PATIENTS,4,2024-02-11,{sql}\n"),
    )
    .expect("scripts written");
    fs::write(
        &config.inputs.all_scripts,
        format!("{header}\nCase Finding,patients,4,2024-02-11,{sql}\n"),
    )
    .expect("all scripts written");

    let output = export::export_catalog(&config).expect("catalog exported");
    let mut workbook: Xlsx<_> = open_workbook(&output).expect("workbook opened");

    for (name, row, col) in [("Script_1", 8, 0), ("PATIENTS", 3, 4)] {
        let range = sheet(&mut workbook, name);
        let cell = text(&range, row, col);
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS, "{name}");
        assert!(cell.starts_with("select xxx"), "{name}");
        assert!(cell.ends_with(TRUNCATION_MARKER), "{name}");
    }
}

const DASHBOARD_TWB: &str = r#"<?xml version='1.0' encoding='utf-8' ?>
<workbook version='18.1'>
  <datasources>
    <datasource name='Parameters'>
      <column caption='Cutoff' datatype='integer' name='[Parameter 1]'>
        <calculation class='tableau' formula='65' />
      </column>
    </datasource>
    <datasource caption='Patients' name='federated.1'>
      <column caption='Risk Score' datatype='real' name='[Calculation_7]'>
        <calculation class='tableau' formula='[sqlproxy.k1].[Age]&#10;/ 10' />
      </column>
    </datasource>
  </datasources>
</workbook>"#;

#[test]
fn extracted_calculations_feed_the_index_sheet() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let folder = temp_dir.path().join("tableau");
    fs::create_dir_all(&folder).expect("folder created");
    fs::write(folder.join("Dash.twb"), DASHBOARD_TWB).expect("workbook written");

    let count = export::extract_calculations(&folder, &config.inputs.calculated_fields)
        .expect("calculations extracted");
    assert_eq!(count, 1);
    let csv = fs::read_to_string(&config.inputs.calculated_fields).expect("csv read");
    assert_eq!(
        csv,
        "Workbook,Data Source,Field Name,Calculation,Data Type\n\
         Dash.twb,Patients,Risk Score,[Patients].[Age] / 10,real\n"
    );

    let output = export::export_catalog(&config).expect("catalog exported");
    let mut workbook: Xlsx<_> = open_workbook(&output).expect("workbook opened");
    let index = sheet(&mut workbook, "Index");
    assert_eq!(text(&index, 16, 0), "Patients");
    assert_eq!(text(&index, 16, 1), "Risk Score");
    assert_eq!(text(&index, 16, 2), "[Patients].[Age] / 10");
}

#[test]
fn extraction_requires_an_existing_folder() {
    let temp_dir = tempdir().expect("temporary directory");
    let folder = temp_dir.path().join("missing");

    let error = export::extract_calculations(&folder, &temp_dir.path().join("out.csv"))
        .expect_err("extraction fails");

    assert!(matches!(error, CatalogError::MissingInput(path) if path == folder));
}
