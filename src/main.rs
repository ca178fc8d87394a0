//! Hemascreen: Thalassemia Minor and Iron Deficiency screening
//!
//! Main entry point for the command-line calculator.
//!
//! ```text
//! hemascreen predict <age> <gender> <hb> <mcv> <mch> <rdw> <rbc> \
//!     <fatigue_freq> <family_relation> <jaundice> <spleen_chole>
//! hemascreen metrics
//! ```
//!
//! Exactly one JSON line is written to stdout: the result, or `{"error": ...}`.

use anyhow::Result;
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hemascreen::adapters::sanitize::SanitizingMakeWriter;
use hemascreen::adapters::PngChartRenderer;
use hemascreen::application::{PredictionService, ReportService};
use hemascreen::config::{LogMode, Settings};
use hemascreen::{error_payload, HemascreenError};

fn usage() -> HemascreenError {
    HemascreenError::Input("Usage: hemascreen <predict <11 values> | metrics>".into())
}

fn run(settings: &Settings, args: &[String]) -> Result<serde_json::Value, HemascreenError> {
    let (command, rest) = args.split_first().ok_or_else(usage)?;
    match command.as_str() {
        "predict" => {
            let verdict = PredictionService::new(settings).predict(rest)?;
            Ok(serde_json::to_value(verdict)?)
        }
        "metrics" => {
            let report = ReportService::new(settings, PngChartRenderer::default()).generate()?;
            Ok(serde_json::to_value(report)?)
        }
        _ => Err(usage()),
    }
}

fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Stdout carries the JSON result only; logs go to stderr or a file.
    let (writer, _guard) = match settings.log_mode {
        LogMode::File => {
            if let Some(parent) = settings.log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.log_file)?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = run(&settings, &args).unwrap_or_else(|e| {
        tracing::error!("Request failed: {}", e);
        error_payload(&e)
    });

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
