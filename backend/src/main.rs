//! Metaboflow CLI - Split, round and average lipid measurement sheets
//!
//! # Main Commands
//!
//! ```bash
//! metaboflow serve                       # Start HTTP server (port 5000)
//! metaboflow filter input.xlsx           # Write PC_/LPC_/plasmalogen_ files
//! metaboflow round input.xlsx            # Write Roundoff_Retention_ file
//! metaboflow mean Roundoff_Retention_input.xlsx
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! metaboflow inspect input.xlsx          # Print the first sheet as JSON
//! metaboflow status --id lab7 --filename input.xlsx
//! ```

use clap::{Parser, Subcommand};
use metaboflow::{
    build_key, grouped_mean, round_retention, sheet, split_categories, Category, ServerConfig,
    Stage, StorageConfig, Table, WorkflowStatus,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "metaboflow")]
#[command(about = "Split, round and average lipid measurement spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Directory for uploaded files
        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,

        /// Directory for derived files
        #[arg(long, default_value = "download_folder")]
        download_dir: PathBuf,

        /// Largest accepted upload, in MiB
        #[arg(long, default_value = "50")]
        max_upload_mb: usize,
    },

    /// Split rows into PC, LPC and plasmalogen files
    Filter {
        /// Input xlsx file
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add the rounded retention-time column
    Round {
        /// Input xlsx file
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Average every column per rounded retention time
    Mean {
        /// A file produced by `round`
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the first worksheet as JSON
    Inspect {
        /// Input xlsx file
        input: PathBuf,
    },

    /// Show which steps have run for an uploaded file
    Status {
        /// Caller id used for the upload
        #[arg(long)]
        id: String,

        /// Original filename of the upload
        #[arg(long)]
        filename: String,

        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,

        #[arg(long, default_value = "download_folder")]
        download_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            upload_dir,
            download_dir,
            max_upload_mb,
        } => {
            let config = ServerConfig {
                port,
                storage: StorageConfig::new(upload_dir, download_dir),
                max_upload_bytes: max_upload_mb * 1024 * 1024,
            };
            metaboflow::server::start_server(config).await
        }

        Commands::Filter { input, output } => cmd_filter(&input, output.as_deref()),

        Commands::Round { input, output } => cmd_round(&input, output.as_deref()),

        Commands::Mean { input, output } => cmd_mean(&input, output.as_deref()),

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Status {
            id,
            filename,
            upload_dir,
            download_dir,
        } => cmd_status(&id, &filename, StorageConfig::new(upload_dir, download_dir)),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_filter(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_input(input)?;
    let split = split_categories(&table)?;

    for category in Category::ALL {
        let subset = split.get(category);
        let path = write_stage(input, output, category.stage(), subset)?;
        eprintln!("   {} rows → {}", subset.row_count(), path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_round(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_input(input)?;
    let rounded = round_retention(&table)?;
    let path = write_stage(input, output, Stage::RoundoffRetention, &rounded)?;

    eprintln!("💾 Output written to: {}", path.display());
    Ok(())
}

fn cmd_mean(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_input(input)?;
    let means = grouped_mean(&table)?;
    eprintln!("   {} retention-time groups", means.row_count());

    let path = write_stage(input, output, Stage::MeanDataFrame, &means)?;
    eprintln!("💾 Output written to: {}", path.display());
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_input(input)?;
    eprintln!("   Columns: {}", table.headers().join(", "));

    let json = serde_json::to_string_pretty(&table.to_json())?;
    println!("{}", json);
    Ok(())
}

fn cmd_status(
    id: &str,
    filename: &str,
    storage: StorageConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = build_key(id, filename)?;
    let status = WorkflowStatus::derive(&key, &storage);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn load_input(input: &Path) -> Result<Table, Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let table = sheet::load(input)?;
    eprintln!("   Rows: {}", table.row_count());
    Ok(table)
}

/// Save `table` as `<prefix><input name>` in `output` or next to the input.
fn write_stage(
    input: &Path,
    output: Option<&Path>,
    stage: Stage,
    table: &Table,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid input path: {}", input.display()))?;
    let dir = match output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let path = dir.join(format!("{}{}", stage.prefix(), name));
    sheet::save(table, &path)?;
    Ok(path)
}
