use geo::{coord, Rect};
use serde::Deserialize;
use std::fmt;

use crate::commons::basic_functions::format_ordinate;

/// Coordinate reference system attached to a feature collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crs {
    Epsg(u32),
    /// WGS84 longitude/latitude axis order
    Crs84,
    /// Any other identifier, kept verbatim
    Named(String),
}

/// GeoJSON 2008 `crs` member, still emitted by GeoServer
#[derive(Debug, Deserialize)]
struct NamedCrsMember {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

impl Crs {
    /// Parse an OGC CRS identifier such as `urn:ogc:def:crs:EPSG::3005`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Crs::Crs84;
        }

        let code = if let Some(rest) = name.strip_prefix("urn:ogc:def:crs:EPSG:") {
            // urn form may carry a version: EPSG:9.8.15:3005 or EPSG::3005
            rest.rsplit(':').next()
        } else if let Some(rest) = name.strip_prefix("http://www.opengis.net/def/crs/EPSG/") {
            rest.rsplit('/').next()
        } else if let Some(rest) = name.strip_prefix("EPSG:") {
            Some(rest)
        } else {
            None
        };

        match code.and_then(|c| c.parse::<u32>().ok()) {
            Some(epsg) => Crs::Epsg(epsg),
            None => Crs::Named(name.to_string()),
        }
    }

    /// Read the `crs` foreign member; RFC 7946 data without one is WGS84
    pub fn from_crs_member(member: Option<&serde_json::Value>) -> Self {
        let Some(member) = member else {
            return Crs::Epsg(4326);
        };
        match NamedCrsMember::deserialize(member) {
            Ok(named) => Crs::from_name(&named.properties.name),
            Err(e) => {
                log::warn!("Ignoring unreadable crs member ({}), assuming EPSG:4326", e);
                Crs::Epsg(4326)
            }
        }
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Crs84 => Some(4326),
            Crs::Named(_) => None,
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::Epsg(4326)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Crs84 => write!(f, "OGC:CRS84"),
            Crs::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Bounding box structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> Self {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
    }

    /// `[min_x min_y max_x max_y]`, or `[nan nan nan nan]` when there is nothing to bound
    pub fn describe(bbox: Option<&BoundingBox>) -> String {
        match bbox {
            Some(b) => b.to_string(),
            None => "[nan nan nan nan]".to_string(),
        }
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} {} {} {}]",
            format_ordinate(self.min_x, None),
            format_ordinate(self.min_y, None),
            format_ordinate(self.max_x, None),
            format_ordinate(self.max_y, None),
        )
    }
}
