// Engine main entry point: analyze one quote CSV and print the report.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taylor_engine::config::AnalysisConfig;
use taylor_engine::data::analysis_store::AnalysisStore;
use taylor_engine::services::AnalysisService;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Taylor session pattern analysis over 5-minute bars", long_about = None)]
struct Cli {
    /// Quote export with Time, Open, High, Low, Last and Volume columns
    csv: PathBuf,

    /// JSON analysis config; defaults apply to any key it leaves out
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the trade plan as text instead of the JSON report
    #[arg(long, default_value_t = false)]
    summary: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path).with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    info!("Starting Taylor pattern analysis...");
    let service = AnalysisService::new(config, Arc::new(RwLock::new(AnalysisStore::new())));
    let report = service
        .analyze_csv(&args.csv)
        .await
        .with_context(|| format!("analyzing {}", args.csv.display()))?;

    if args.summary {
        for line in report.trade_plan.summary_lines() {
            println!("{}", line);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
