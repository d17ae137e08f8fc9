use anyhow::Result;
use bcfuel::FuelTypes;

/// Example: Loading BC wildfire fuel types from the BC WFS
fn main() -> Result<()> {
    println!("=== Example: Loading fuel types from openmaps.gov.bc.ca ===\n");

    let mut fuel_types = FuelTypes::new(Some("./output/bc_wildfire_fuel_types.csv".to_string()));

    // Six decimals is sub-millimetre in BC Albers (EPSG:3005)
    fuel_types.set_wkt_precision(Some(6));

    std::fs::create_dir_all("./output")?;
    let fuel_types = fuel_types.run()?;

    if let Some(table) = fuel_types.get_table() {
        println!("\nFuel types processed successfully!");
        println!("  - Number of polygons: {}", table.len());
        println!("  - Attribute columns: {}", table.columns.len());
    }

    fuel_types.to_csv()?;

    println!("\nProcessing complete!");
    println!("  - Output file: {:?}", fuel_types.get_output_path());

    Ok(())
}
