use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cma_engine::config::AppConfig;
use cma_engine::demo;
use cma_engine::error::AppError;
use cma_engine::pool::CsvSalePool;
use cma_engine::telemetry;
use cma_engine::valuation::{
    EngineConfig, MarketUnitValues, PropertyType, StaticMarketData, ValuationCache,
    ValuationRequest, ValuationResult, ValuationService,
};

#[derive(Parser, Debug)]
#[command(
    name = "cma-engine",
    about = "Run a comparative market analysis against a pool of recent sales",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value a subject property against a CSV export of comparable sales
    Analyze(AnalyzeArgs),
    /// Run the engine against a seeded sample market
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Subject property street address
    address: String,
    /// CSV file of candidate sales
    #[arg(long)]
    pool: PathBuf,
    /// Geocoded subject latitude (no live geocoder in the CLI)
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    /// Geocoded subject longitude
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
    /// Search radius in miles
    #[arg(long)]
    radius: Option<f64>,
    /// Maximum comparables to use
    #[arg(long)]
    max_comparables: Option<usize>,
    /// Subject property type (single_family, condo, townhouse, multi_family)
    #[arg(long, value_parser = parse_property_type)]
    property_type: Option<PropertyType>,
    /// Subject square footage
    #[arg(long)]
    sqft: Option<f64>,
    /// Subject bedroom count
    #[arg(long)]
    beds: Option<f64>,
    /// Subject bathroom count
    #[arg(long)]
    baths: Option<f64>,
    /// Subject year built
    #[arg(long)]
    year_built: Option<f64>,
    /// Subject lot size in square feet
    #[arg(long)]
    lot_size: Option<f64>,
    /// Analysis date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Emit the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Analysis date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Emit the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Analyze(args) => run_analyze(&config, args),
        Command::Demo(args) => run_demo(&config, args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_property_type(raw: &str) -> Result<PropertyType, String> {
    PropertyType::parse(raw).ok_or_else(|| {
        format!("unknown property type '{raw}' (expected single_family, condo, townhouse, or multi_family)")
    })
}

fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> Result<(), AppError> {
    let pool = CsvSalePool::from_path(&args.pool)?;
    info!(records = pool.len(), pool = %args.pool.display(), "loaded sale pool");

    let geocoder = demo::StaticGeocoder::new(cma_engine::valuation::Coordinates {
        latitude: args.latitude,
        longitude: args.longitude,
    });

    let service = ValuationService::new(
        Arc::new(geocoder),
        Arc::new(pool),
        Arc::new(StaticMarketData::new(MarketUnitValues::default())),
        EngineConfig {
            max_age_days: config.analysis.max_age_days,
            ..EngineConfig::default()
        },
    )
    .with_cache(Arc::new(ValuationCache::new(config.analysis.cache_ttl)));

    let mut request = ValuationRequest::new(args.address);
    request.search_radius_miles = args.radius.unwrap_or(config.analysis.search_radius_miles);
    request.max_comparables = args.max_comparables.unwrap_or(config.analysis.max_comparables);
    request.property_type = args.property_type;
    request.square_footage = args.sqft;
    request.bedrooms = args.beds;
    request.bathrooms = args.baths;
    request.year_built = args.year_built;
    request.lot_size = args.lot_size;

    let result = evaluate(&service, &request, args.as_of)?;
    print_result(&result, args.json)
}

fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let service = ValuationService::new(
        Arc::new(demo::seeded_geocoder()),
        Arc::new(demo::SeededSalePool::new(demo::seeded_records(as_of))),
        Arc::new(StaticMarketData::new(MarketUnitValues::default())),
        EngineConfig {
            max_age_days: config.analysis.max_age_days,
            ..EngineConfig::default()
        },
    );

    let mut request = ValuationRequest::new(demo::DEMO_SUBJECT_ADDRESS);
    request.search_radius_miles = 10.0;
    request.max_comparables = config.analysis.max_comparables;
    request.property_type = Some(PropertyType::SingleFamily);
    request.square_footage = Some(2300.0);
    request.bedrooms = Some(4.0);
    request.bathrooms = Some(3.0);
    request.year_built = Some(2014.0);
    request.lot_size = Some(8000.0);

    let result = evaluate(&service, &request, args.as_of)?;
    print_result(&result, args.json)
}

fn evaluate<G, P, M>(
    service: &ValuationService<G, P, M>,
    request: &ValuationRequest,
    as_of: Option<NaiveDate>,
) -> Result<ValuationResult, AppError>
where
    G: cma_engine::valuation::Geocoder + 'static,
    P: cma_engine::valuation::SalePool + 'static,
    M: cma_engine::valuation::MarketDataProvider + 'static,
{
    let result = match as_of {
        Some(date) => {
            let now = Utc
                .from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap_or_default());
            service.evaluate_at(request, now, None)?
        }
        None => service.evaluate(request)?,
    };
    Ok(result)
}

fn print_result(result: &ValuationResult, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Subject: {}", result.subject_address);
    println!(
        "Estimated value: ${:.0}  (range ${:.0} - ${:.0})",
        result.estimated_value.most_likely, result.estimated_value.low, result.estimated_value.high
    );
    println!("Confidence: {:.2}", result.confidence_score);
    println!(
        "Average adjustment: ${:.0} (min ${:.0}, max ${:.0})",
        result.adjustment_summary.average_adjustment,
        result.adjustment_summary.min_adjustment,
        result.adjustment_summary.max_adjustment
    );
    println!("Comparables ({}):", result.comparables.len());
    for comp in &result.comparables {
        println!(
            "  {:<50} sold ${:>10.0} on {}  sim {:>5.1}  adj ${:>+9.0}  -> ${:>10.0}",
            comp.sale.address,
            comp.sale.sale_price,
            comp.sale.sale_date,
            comp.similarity_score,
            comp.adjustments.total,
            comp.adjusted_price
        );
    }
    Ok(())
}
