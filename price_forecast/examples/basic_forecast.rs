use price_forecast::data::SeriesLoader;
use price_forecast::models::{ForecastModel, TrainedForecastModel};
use price_forecast::{ArimaModel, ArimaOrder, Horizon, Pipeline, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Price Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/examples/csv/brent_sample.csv");

    // Load data
    println!("Loading {}...", path);
    let report = SeriesLoader::new().load_path(path)?;
    println!(
        "Loaded {} observations from {} to {} ({} rows skipped)\n",
        report.series.len(),
        report.series.first_date(),
        report.series.last_date(),
        report.skipped_total()
    );

    // Fit once, forecast several horizons
    println!("Training model...");
    let model = ArimaModel::new(ArimaOrder::ONE_ONE_ONE)?;
    let fitted = model.train(&report.series)?;
    println!(
        "{}: phi = {:.4}, theta = {:.4}, sigma2 = {:.4}, AIC = {:.2}",
        fitted.name(),
        fitted.ar_coefficient(),
        fitted.ma_coefficient(),
        fitted.sigma2(),
        fitted.aic()
    );
    println!(
        "Likelihood search {} after {} iterations\n",
        if fitted.converged() { "converged" } else { "stopped" },
        fitted.iterations()
    );

    for days in [7, 30] {
        let forecast = fitted.forecast(Horizon::new(days, 365)?)?;
        let last = &forecast.points()[forecast.len() - 1];
        println!(
            "{:>2}-day forecast ends {}: {:.2} in [{:.2}, {:.2}]",
            days, last.date, last.predicted, last.lower_bound, last.upper_bound
        );
    }

    // Same forecast through the cached pipeline, fitted on the last 60 days
    println!("\nPipeline with a 60-observation window:");
    let bytes = std::fs::read(path)?;
    let mut pipeline = Pipeline::new(PipelineConfig::default())?;
    let output = pipeline.run(&bytes, 5, Some(60))?;
    for point in output.forecast.points() {
        let margin = point
            .error_margin_pct
            .map(|m| format!("{:.2}%", m))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {}: {:.2} ({:.2}, {:.2}) +/- {}",
            point.date, point.predicted, point.lower_bound, point.upper_bound, margin
        );
    }

    let again = pipeline.run(&bytes, 5, Some(60))?;
    println!("\nSecond run served from cache: {}", again.cache_hit);

    Ok(())
}
