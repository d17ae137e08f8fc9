pub mod feature_table;
pub mod fuel_types;
pub mod wkt_writer;
