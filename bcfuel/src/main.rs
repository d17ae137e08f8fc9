use anyhow::{Context, Result};
use bcfuel::collect::global_variables::{BC_OWS_URL, FUEL_TYPE_LAYER, OUTPUT_CSV};
use bcfuel::{FeatureSource, FileCollect, FuelTypes, WfsCollect, WfsQuery};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Download BC wildfire fuel types and save them as CSV with WKT geometry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WFS endpoint
    #[arg(long, default_value = BC_OWS_URL)]
    base_url: String,

    /// Feature type to request
    #[arg(long, default_value = FUEL_TYPE_LAYER)]
    type_name: String,

    /// CSV file to write
    #[arg(short, long, default_value = OUTPUT_CSV)]
    output: PathBuf,

    /// Convert a local GeoJSON file instead of querying the WFS
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Maximum number of features to request
    #[arg(long)]
    count: Option<u64>,

    /// GeoServer CQL filter, e.g. "FUEL_TYPE_CD='C-3'"
    #[arg(long)]
    cql_filter: Option<String>,

    /// Round WKT coordinates to this many decimal places
    #[arg(long)]
    wkt_precision: Option<usize>,

    /// HTTP timeout in seconds (no timeout by default)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn build_source(args: &Args) -> Result<Box<dyn FeatureSource>> {
    if let Some(input) = &args.input {
        return Ok(Box::new(FileCollect::new(input)));
    }

    url::Url::parse(&args.base_url)
        .with_context(|| format!("Invalid WFS base URL: {}", args.base_url))?;

    let mut query = WfsQuery::new(&args.base_url, &args.type_name);
    if let Some(count) = args.count {
        query = query.with_count(count);
    }
    if let Some(cql_filter) = &args.cql_filter {
        query = query.with_cql_filter(cql_filter);
    }

    let mut collect = WfsCollect::new(query);
    collect.set_timeout(args.timeout_secs.map(Duration::from_secs));
    Ok(Box::new(collect))
}

fn try_main() -> Result<()> {
    let args = Args::try_parse()?;
    log::debug!("{:?}", args);

    let source = build_source(&args)?;

    let mut fuel_types = FuelTypes::with_source(source, None);
    fuel_types.set_output_path(args.output);
    fuel_types.set_wkt_precision(args.wkt_precision);

    let fuel_types = fuel_types.run()?;
    fuel_types.to_csv()?;
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    if let Err(e) = try_main() {
        if let Some(clap_error) = e.downcast_ref::<clap::Error>() {
            clap_error.exit();
        }
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
