//! # price-forecast
//!
//! Command-line front end: load a price CSV, forecast it and print the
//! recent history next to the forecast.

use clap::{Parser, ValueEnum};
use price_forecast::utils::date_parser::format_date;
use price_forecast::{LoadPolicy, Pipeline, PipelineConfig, PipelineOutput, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "price-forecast")]
#[command(about = "Forecast daily commodity prices with ARIMA(1,1,1)", long_about = None)]
struct Cli {
    /// Input CSV with `data` and `preco` columns
    #[arg(short, long)]
    input: PathBuf,

    /// Days to forecast (defaults to the configured horizon)
    #[arg(long, allow_hyphen_values = true)]
    horizon: Option<i64>,

    /// Fit on the last N observations only
    #[arg(short, long)]
    window: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Abort on the first malformed row instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Fit deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Calendar days of history to show
    #[arg(long)]
    history_days: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;

    if cli.strict {
        config.load_policy = LoadPolicy::Strict;
    }
    if let Some(ms) = cli.timeout_ms {
        config.fit_timeout_ms = Some(ms);
    }
    if let Some(days) = cli.history_days {
        config.history_days = days;
    }
    config.validate()?;

    let horizon = cli.horizon.unwrap_or(config.default_horizon as i64);
    let bytes = std::fs::read(&cli.input)?;
    let mut pipeline = Pipeline::new(config)?;
    let output = pipeline.run(&bytes, horizon, cli.window)?;

    // Render fully before writing so a failure leaves no partial output
    let mut rendered = Vec::new();
    match cli.format {
        OutputFormat::Table => render_table(&output, &mut rendered)?,
        OutputFormat::Json => {
            writeln!(rendered, "{}", output.forecast.to_json()?)?;
        }
        OutputFormat::Csv => output.forecast.write_csv(&mut rendered)?,
    }

    io::stdout().lock().write_all(&rendered)?;
    Ok(())
}

fn render_table<W: Write>(output: &PipelineOutput, out: &mut W) -> Result<()> {
    let report = &output.report;
    writeln!(
        out,
        "Loaded {} observations ({} skipped, {} duplicate dates replaced)",
        report.series.len(),
        report.skipped_total(),
        report.duplicates_replaced
    )?;
    writeln!(out)?;

    writeln!(out, "History")?;
    writeln!(out, "{:<12} {:>12}", "date", "price")?;
    for (date, price) in output.history.iter() {
        writeln!(out, "{:<12} {:>12.4}", format_date(date), price)?;
    }
    writeln!(out)?;

    let forecast = &output.forecast;
    writeln!(
        out,
        "Forecast ({}, {:.0}% band)",
        forecast.order(),
        forecast.confidence_level() * 100.0
    )?;
    writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>12} {:>10}",
        "date", "predicted", "lower", "upper", "margin %"
    )?;
    for point in forecast.points() {
        let margin = point
            .error_margin_pct
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(
            out,
            "{:<12} {:>12.4} {:>12.4} {:>12.4} {:>10}",
            format_date(point.date),
            point.predicted,
            point.lower_bound,
            point.upper_bound,
            margin
        )?;
    }
    Ok(())
}
