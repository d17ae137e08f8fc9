pub mod collect;
pub mod commons;
pub mod error;
pub mod geo_core;
pub mod geometric;

pub use collect::wfs::wfs_collect::{FeatureSource, FileCollect, WfsCollect, WfsQuery};
pub use error::FuelTypesError;
pub use geometric::feature_table::{FeatureRow, FeatureTable};
pub use geometric::fuel_types::FuelTypes;
