//! carlot-intake - headless vehicle intake driver
//!
//! Runs one intake session from the command line: optionally stage an image
//! for AI extraction, add gallery images, apply field edits, submit, and print
//! the resulting form as JSON. Notices are logged as they are raised.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use carlot_common::config::{default_config_path, load_toml_config, write_toml_config};
use carlot_common::events::EventBus;
use carlot_intake::config::{
    resolve_log_level, CliOverrides, IntakeConfig, DEFAULT_LOG_LEVEL, ENV_LOG_LEVEL,
};
use carlot_intake::models::{FileCandidate, VehicleField};
use carlot_intake::services::{
    run_event_logger, BusNotifier, DataUriDecoder, HttpInferenceClient, HttpRecordClient,
};
use carlot_intake::workflow::{Collaborators, IntakeSession};
use carlot_intake::IntakeError;

/// Command-line arguments for carlot-intake
#[derive(Parser, Debug)]
#[command(name = "carlot-intake")]
#[command(about = "Add a vehicle to the marketplace inventory")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/carlot/carlot-intake.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective TOML config to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// Inference service endpoint
    #[arg(long)]
    inference_url: Option<String>,

    /// Record service endpoint
    #[arg(long)]
    records_url: Option<String>,

    /// Bearer token for both services
    #[arg(long)]
    api_token: Option<String>,

    /// Log filter (e.g. "debug", "carlot_intake=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Image to run AI extraction on
    #[arg(long)]
    ai_image: Option<PathBuf>,

    /// Gallery image (repeatable)
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Field edit as key=value, applied after extraction (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    edits: Vec<(VehicleField, String)>,

    /// Submit the record when done
    #[arg(long)]
    submit: bool,
}

fn parse_assignment(raw: &str) -> std::result::Result<(VehicleField, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let field = key.trim().parse::<VehicleField>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path("carlot-intake")?,
    };
    let toml_config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Initialize tracing
    let level = resolve_log_level(
        args.log_level.as_deref(),
        std::env::var(ENV_LOG_LEVEL).ok().as_deref(),
        &toml_config,
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&level)
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.write_config {
        write_toml_config(&toml_config, &config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        info!("Config written to {}", config_path.display());
        return Ok(());
    }

    let cli = CliOverrides {
        inference_url: args.inference_url.clone(),
        records_url: args.records_url.clone(),
        api_token: args.api_token.clone(),
    };
    let config = IntakeConfig::resolve(&cli, &toml_config)?;

    info!("Starting carlot-intake {}", env!("CARGO_PKG_VERSION"));
    info!("Inference service: {}", config.inference_url);
    info!("Record service: {}", config.records_url);

    let event_bus = EventBus::new(100);
    let logger = tokio::spawn(run_event_logger(event_bus.subscribe()));

    let session_id = Uuid::new_v4();
    let bus_notifier = Arc::new(BusNotifier::new(event_bus.clone(), session_id));
    let collaborators = Collaborators {
        inference: Arc::new(
            HttpInferenceClient::new(
                config.inference_url.clone(),
                config.api_token.clone(),
                config.request_timeout,
            )
            .context("Failed to build inference client")?,
        ),
        records: Arc::new(
            HttpRecordClient::new(
                config.records_url.clone(),
                config.api_token.clone(),
                config.request_timeout,
            )
            .context("Failed to build record client")?,
        ),
        decoder: Arc::new(DataUriDecoder::new()),
        notifier: bus_notifier.clone(),
        navigator: bus_notifier,
    };

    let mut session = IntakeSession::with_id(session_id, collaborators, config.session_settings())
        .with_event_bus(event_bus.clone());

    if let Some(path) = &args.ai_image {
        let file = FileCandidate::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match session.stage_ai_image(file).await {
            Ok(()) => {
                if let Err(e) = session.extract_details().await {
                    warn!(error = %e, next_step = e.next_step(), "Extraction did not apply");
                }
            }
            Err(e) => warn!(error = %e, next_step = e.next_step(), "AI image not staged"),
        }
    }

    if !args.images.is_empty() {
        let mut files = Vec::with_capacity(args.images.len());
        for path in &args.images {
            files.push(
                FileCandidate::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            );
        }
        let report = session.add_images(files).await;
        info!(
            added = report.added,
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            gallery_size = session.gallery().len(),
            "Gallery updated"
        );
    }

    for (field, value) in &args.edits {
        session
            .set_field(*field, value)
            .with_context(|| format!("Cannot set {}", field))?;
    }

    let mut submit_failed = false;
    if args.submit {
        match session.submit().await {
            Ok(outcome) if outcome.success => {}
            Ok(outcome) => {
                warn!(reason = ?outcome.message, "Submission failed");
                submit_failed = true;
            }
            Err(IntakeError::Validation(errors)) => {
                for error in errors.iter() {
                    warn!(field = %error.field, "{}", error.message);
                }
                submit_failed = true;
            }
            Err(e) => {
                warn!(error = %e, next_step = e.next_step(), "Submission blocked");
                submit_failed = true;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(session.form())?);

    drop(session);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(1), logger).await;

    if submit_failed {
        anyhow::bail!("Vehicle was not added");
    }
    Ok(())
}
