use thiserror::Error;

/// Errors raised while retrieving or decoding a WFS feature collection
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FuelTypesError {
    #[error("WFS service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The service answered 200 with an OGC exception document instead of features
    #[error("WFS service exception: {0}")]
    ServiceException(String),

    #[error("expected a GeoJSON FeatureCollection, found a {0}")]
    NotFeatureCollection(&'static str),

    #[error("position has {0} ordinate(s), at least 2 are required")]
    InvalidPosition(usize),
}
