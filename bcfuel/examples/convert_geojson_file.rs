use anyhow::{Context, Result};
use bcfuel::{FileCollect, FuelTypes};

/// Example: Converting a saved GetFeature response to CSV
/// Usage: cargo run --example convert_geojson_file -- fuel_types.geojson out.csv
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args.next().context("missing input GeoJSON path")?;
    let output = args.next();

    let fuel_types = FuelTypes::with_source(Box::new(FileCollect::new(input)), output).run()?;
    fuel_types.to_csv()?;

    Ok(())
}
