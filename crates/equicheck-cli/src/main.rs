mod config;
mod display;
mod export;
mod input;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use equicheck_ai::AnalysisService;
use equicheck_core::AnalysisResult;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Settings;

#[derive(Parser)]
#[command(
    name = "equicheck",
    version,
    about = "Compare buy-side and sell-side diligence documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key.
    #[arg(long, env = "API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name.
    #[arg(long, env = "EQUICHECK_MODEL", global = true)]
    model: Option<String>,

    /// Firebase web API key. With the project id, enables remote history.
    #[arg(long, env = "FIREBASE_API_KEY", global = true, hide_env_values = true)]
    firebase_api_key: Option<String>,

    /// Firebase project id.
    #[arg(long, env = "FIREBASE_PROJECT_ID", global = true)]
    firebase_project_id: Option<String>,

    /// Directory for local history.
    #[arg(long, env = "EQUICHECK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a buy-side and a sell-side PDF.
    Analyze {
        #[arg(long, value_name = "PDF")]
        buy_side: PathBuf,
        #[arg(long, value_name = "PDF")]
        sell_side: PathBuf,
        /// Do not save the result to history.
        #[arg(long)]
        no_save: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List past analyses, newest first.
    History {
        #[arg(long)]
        json: bool,
    },
    /// Show one analysis from history.
    Show {
        /// Analysis id or a unique prefix of it.
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Export one analysis as a CSV report.
    Export {
        /// Analysis id or a unique prefix of it.
        id: String,
        /// Output file (default EquiCheck_Report_<id>.csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Clear local history. Remote history is not touched.
    Clear,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            firebase_api_key: self.firebase_api_key.clone(),
            firebase_project_id: self.firebase_project_id.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    match cli.command {
        Command::Analyze {
            buy_side,
            sell_side,
            no_save,
            json,
        } => cmd_analyze(&settings, buy_side, sell_side, no_save, json).await,
        Command::History { json } => cmd_history(&settings, json).await,
        Command::Show { id, json } => cmd_show(&settings, &id, json).await,
        Command::Export { id, output } => cmd_export(&settings, &id, output).await,
        Command::Clear => cmd_clear(&settings).await,
    }
}

async fn cmd_analyze(
    settings: &Settings,
    buy_side: PathBuf,
    sell_side: PathBuf,
    no_save: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = settings.gemini_client()?;
    let buy = input::load_pdf(&buy_side).await?;
    let sell = input::load_pdf(&sell_side).await?;

    let service = AnalysisService::new(client);
    let result = service
        .analyze(&buy.bytes, &sell.bytes, &buy.name, &sell.name)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", display::render_card(&result));
    }

    if no_save {
        return Ok(());
    }
    // A failed save does not discard the analysis the user already has.
    let store = settings.record_store()?;
    match store.save(&result).await {
        Ok(()) => info!(id = %result.id, "analysis saved to history"),
        Err(e) => warn!(id = %result.id, error = %e, "failed to save analysis"),
    }
    Ok(())
}

async fn cmd_history(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let store = settings.record_store()?;
    let records = store.list_all().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", display::render_history(&records));
    }
    Ok(())
}

async fn cmd_show(settings: &Settings, query: &str, json: bool) -> anyhow::Result<()> {
    let record = lookup(settings, query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", display::render_card(&record));
    }
    Ok(())
}

async fn cmd_export(
    settings: &Settings,
    query: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let record = lookup(settings, query).await?;
    let path = output.unwrap_or_else(|| export::default_file_name(&record));
    export::write_report_file(&record, &path)
        .with_context(|| format!("exporting analysis {}", record.id))?;
    info!(id = %record.id, path = %path.display(), "report written");
    println!("{}", path.display());
    Ok(())
}

async fn cmd_clear(settings: &Settings) -> anyhow::Result<()> {
    let store = settings.record_store()?;
    let outcome = store.clear().await?;
    println!("{outcome}");
    Ok(())
}

async fn lookup(settings: &Settings, query: &str) -> anyhow::Result<AnalysisResult> {
    let store = settings.record_store()?;
    let records = store.list_all().await?;
    find_record(records, query)
}

/// Exact id match, else the single record whose id starts with `query`.
fn find_record(records: Vec<AnalysisResult>, query: &str) -> anyhow::Result<AnalysisResult> {
    let query = query.trim();
    if query.is_empty() {
        bail!("analysis id must not be empty");
    }
    let mut matches: Vec<AnalysisResult> = Vec::new();
    for r in records {
        if r.id == query {
            return Ok(r);
        }
        if r.id.starts_with(query) {
            matches.push(r);
        }
    }
    match matches.len() {
        0 => bail!("no analysis matches '{query}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{query}' is ambiguous ({n} analyses match); use more characters"),
    }
}
