use std::path::PathBuf;

use catalog_tools::config::CatalogConfig;
use catalog_tools::export;
use catalog_tools::{CatalogError, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()
        .map_err(|error| CatalogError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export(args) => execute_export(args),
        Command::ExtractCalculations(args) => execute_extract(args),
        Command::InitConfig { output } => CatalogConfig::default().save(&output),
    }
}

fn execute_extract(args: ExtractArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    let folder = args.input.unwrap_or(config.tableau_folder);
    let output = args.output.unwrap_or(config.inputs.calculated_fields);

    let count = export::extract_calculations(&folder, &output)?;
    println!("{count} calculated fields written to {}", output.display());
    Ok(())
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let output = export::export_catalog(&config)?;
    println!("Schema and scripts exported to {}", output.display());
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render catalog, script, and calculated-field exports into a linked Excel workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the catalog workbook.
    Export(ExportArgs),

    /// Extract calculated fields from dashboard workbooks into CSV.
    ExtractCalculations(ExtractArgs),

    /// Write the default configuration as JSON.
    InitConfig {
        /// Destination of the configuration file.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct ExportArgs {
    /// JSON configuration file; defaults apply to anything it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog export for the datasets in scope.
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Scripts export for the datasets in scope.
    #[arg(long)]
    scripts: Option<PathBuf>,

    /// Calculated-fields export.
    #[arg(long)]
    calculated_fields: Option<PathBuf>,

    /// Catalog export covering every dataset.
    #[arg(long)]
    full_catalog: Option<PathBuf>,

    /// Scripts export covering every dataset.
    #[arg(long)]
    all_scripts: Option<PathBuf>,

    /// Dashboard workbook whose calculated fields are listed.
    #[arg(long)]
    tableau_workbook: Option<String>,

    /// Output workbook path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// JSON configuration file supplying the default folders.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder containing `.twb` files.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Calculated-fields CSV to write.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    fn resolve_config(self) -> Result<CatalogConfig> {
        let mut config = match &self.config {
            Some(path) => CatalogConfig::load(path)?,
            None => CatalogConfig::default(),
        };

        let inputs = &mut config.inputs;
        for (slot, value) in [
            (&mut inputs.tables, self.tables),
            (&mut inputs.scripts, self.scripts),
            (&mut inputs.calculated_fields, self.calculated_fields),
            (&mut inputs.full_catalog, self.full_catalog),
            (&mut inputs.all_scripts, self.all_scripts),
        ] {
            if let Some(path) = value {
                *slot = path;
            }
        }

        if let Some(workbook) = self.tableau_workbook {
            config.tableau_workbook = workbook;
        }

        if let Some(output) = self.output {
            if let Some(parent) = output.parent() {
                config.output_folder = parent.to_path_buf();
            }
            if let Some(name) = output.file_name() {
                config.excel_file_name = name.to_string_lossy().into_owned();
            }
        }

        Ok(config)
    }
}
