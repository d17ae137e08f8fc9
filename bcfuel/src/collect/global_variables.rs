use std::path::PathBuf;

/// BC Geographic Warehouse public OWS endpoint
pub const BC_OWS_URL: &str = "https://openmaps.gov.bc.ca/geo/pub/ows";

/// Fire fuel types layer, as advertised in the WFS capabilities
pub const FUEL_TYPE_LAYER: &str = "pub:WHSE_LAND_AND_NATURAL_RESOURCE.PROT_FUEL_TYPE_SP";

pub const OUTPUT_CSV: &str = "bc_wildfire_fuel_types.csv";

/// Name of the CSV column holding the WKT geometry
pub const GEOMETRY_WKT_COLUMN: &str = "geometry_wkt";

pub fn get_output_path() -> PathBuf {
    PathBuf::from(OUTPUT_CSV)
}
