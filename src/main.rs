mod app;
mod config;
mod error;
mod upload;
mod utils;

use app::{BrowserNavigator, CsvUploader};
use clap::Parser;
use config::{load_config, load_default_config, validate_config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upload::HttpSheetClient;

#[derive(Parser, Debug)]
#[command(name = "sheet-uploader", version, about = "Upload CSV timesheets for invoicing")]
struct Args {
    /// Config file; defaults to ~/.config/sheet-uploader/config.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `server_url` from the config file.
    #[arg(long)]
    server_url: Option<String>,
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    if let Some(server_url) = args.server_url {
        config.server_url = server_url;
        validate_config(&config)?;
    }

    let api = Arc::new(HttpSheetClient::new(&config)?);
    let uploader = CsvUploader::new(&config, api, Box::new(BrowserNavigator))?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([520.0, 560.0])
            .with_min_inner_size([400.0, 460.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CSV Sheet Uploader",
        options,
        Box::new(move |_cc| Box::new(uploader)),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {e}"))
}
