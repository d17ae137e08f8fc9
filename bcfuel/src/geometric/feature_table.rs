use anyhow::{Context, Result};
use geo::BoundingRect;
use geojson::{feature::Id, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};
use std::collections::HashSet;

use crate::collect::global_variables::GEOMETRY_WKT_COLUMN;
use crate::commons::basic_functions::format_cell;
use crate::error::FuelTypesError;
use crate::geo_core::{BoundingBox, Crs};
use crate::geometric::wkt_writer::to_wkt;

/// Name under which the geometry column is reported before conversion
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One feature: its attribute values and optional geometry
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub attributes: JsonObject,
    pub geometry: Option<Geometry>,
}

/// In-memory table of features loaded from a GeoJSON FeatureCollection
///
/// `columns` is the union of the attribute names of every feature, in the
/// order they were first seen. Rows missing a column render it empty.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub crs: Crs,
    /// Server-side match count, when the service reports one
    pub number_matched: Option<u64>,
    pub number_returned: Option<u64>,
}

impl FeatureTable {
    /// Parse a GeoJSON document
    pub fn from_slice(content: &[u8]) -> Result<Self> {
        let geojson_str = String::from_utf8_lossy(content);
        let geojson: GeoJson = geojson_str
            .parse()
            .context("Failed to parse GeoJSON from WFS response")?;
        Self::from_geojson(geojson)
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        match geojson {
            GeoJson::FeatureCollection(fc) => Ok(Self::from_feature_collection(fc)),
            GeoJson::Feature(_) => Err(FuelTypesError::NotFeatureCollection("Feature").into()),
            GeoJson::Geometry(_) => Err(FuelTypesError::NotFeatureCollection("Geometry").into()),
        }
    }

    pub fn from_feature_collection(fc: FeatureCollection) -> Self {
        let foreign = fc.foreign_members.unwrap_or_default();
        let crs = Crs::from_crs_member(foreign.get("crs"));
        let number_matched = foreign
            .get("numberMatched")
            .or_else(|| foreign.get("totalFeatures"))
            .and_then(JsonValue::as_u64);
        let number_returned = foreign.get("numberReturned").and_then(JsonValue::as_u64);

        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(fc.features.len());

        for feature in fc.features {
            let mut attributes = feature.properties.unwrap_or_default();

            // Reserved names would clash with the geometry columns
            for reserved in [GEOMETRY_COLUMN, GEOMETRY_WKT_COLUMN] {
                if attributes.contains_key(reserved) {
                    log::warn!("Dropping attribute {:?}, the name is reserved", reserved);
                    attributes = attributes.into_iter().filter(|(k, _)| k != reserved).collect();
                }
            }

            if let Some(id) = feature.id {
                if !attributes.contains_key("id") {
                    let value = match id {
                        Id::String(s) => JsonValue::String(s),
                        Id::Number(n) => JsonValue::Number(n),
                    };
                    if seen.insert("id".to_string()) {
                        columns.push("id".to_string());
                    }
                    attributes.insert("id".to_string(), value);
                }
            }

            for key in attributes.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }

            rows.push(FeatureRow {
                attributes,
                geometry: feature.geometry,
            });
        }

        let missing = rows.iter().filter(|r| r.geometry.is_none()).count();
        if missing > 0 {
            log::warn!("{} feature(s) have no geometry", missing);
        }

        FeatureTable {
            columns,
            rows,
            crs,
            number_matched,
            number_returned,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Attribute columns followed by the geometry column
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.columns.clone();
        names.push(GEOMETRY_COLUMN.to_string());
        names
    }

    /// CSV header: attribute columns followed by `geometry_wkt`
    pub fn header(&self) -> Vec<String> {
        let mut header = self.columns.clone();
        header.push(GEOMETRY_WKT_COLUMN.to_string());
        header
    }

    /// Bounds of every geometry in the table, `None` if there are none
    pub fn total_bounds(&self) -> Result<Option<BoundingBox>> {
        let mut total: Option<BoundingBox> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let Some(geometry) = &row.geometry else {
                continue;
            };
            let geom: geo::Geometry<f64> = geometry
                .value
                .clone()
                .try_into()
                .with_context(|| format!("Invalid geometry in feature {}", i))?;
            if let Some(rect) = geom.bounding_rect() {
                let bbox = BoundingBox::from(rect);
                total = Some(match total {
                    Some(t) => t.union(&bbox),
                    None => bbox,
                });
            }
        }
        Ok(total)
    }

    /// CSV record for `row`, in `header()` order
    pub fn wkt_record(&self, row: &FeatureRow, precision: Option<usize>) -> Result<Vec<String>> {
        let mut record: Vec<String> = self
            .columns
            .iter()
            .map(|c| format_cell(row.attributes.get(c)))
            .collect();
        let wkt = match &row.geometry {
            Some(geometry) => to_wkt(geometry, precision)?,
            None => String::new(),
        };
        record.push(wkt);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOSERVER_RESPONSE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "WHSE_LAND_AND_NATURAL_RESOURCE.PROT_FUEL_TYPE_SP.fid-1",
                "geometry": {"type": "Polygon", "coordinates": [[[10, 20], [30, 20], [30, 40], [10, 20]]]},
                "geometry_name": "SHAPE",
                "properties": {"FUEL_TYPE_CD": "C-3", "AREA_SQM": 1250.5}
            },
            {
                "type": "Feature",
                "id": "WHSE_LAND_AND_NATURAL_RESOURCE.PROT_FUEL_TYPE_SP.fid-2",
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[-5, 0], [0, 0], [0, 5], [-5, 0]]]]},
                "properties": {"FUEL_TYPE_CD": "O-1a", "OBJECTID": 7}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"FUEL_TYPE_CD": "W"}
            }
        ],
        "totalFeatures": 3,
        "numberMatched": 3,
        "numberReturned": 3,
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3005"}}
    }"#;

    #[test]
    fn test_from_geoserver_response() {
        let table = FeatureTable::from_slice(GEOSERVER_RESPONSE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns, vec!["id", "FUEL_TYPE_CD", "AREA_SQM", "OBJECTID"]);
        assert_eq!(
            table.column_names().last().map(String::as_str),
            Some(GEOMETRY_COLUMN)
        );
        assert_eq!(table.crs, Crs::Epsg(3005));
        assert_eq!(table.number_matched, Some(3));
        assert_eq!(table.number_returned, Some(3));
    }

    #[test]
    fn test_total_bounds() {
        let table = FeatureTable::from_slice(GEOSERVER_RESPONSE.as_bytes()).unwrap();
        let bounds = table.total_bounds().unwrap().unwrap();
        assert_eq!(bounds, BoundingBox::new(-5.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn test_records_follow_header() {
        let table = FeatureTable::from_slice(GEOSERVER_RESPONSE.as_bytes()).unwrap();
        assert_eq!(
            table.header(),
            vec!["id", "FUEL_TYPE_CD", "AREA_SQM", "OBJECTID", "geometry_wkt"]
        );

        let first = table.wkt_record(&table.rows[0], None).unwrap();
        assert_eq!(
            first,
            vec![
                "WHSE_LAND_AND_NATURAL_RESOURCE.PROT_FUEL_TYPE_SP.fid-1",
                "C-3",
                "1250.5",
                "",
                "POLYGON ((10 20, 30 20, 30 40, 10 20))",
            ]
        );

        let last = table.wkt_record(&table.rows[2], None).unwrap();
        assert_eq!(last, vec!["", "W", "", "", ""]);
    }

    #[test]
    fn test_reserved_names_are_dropped() {
        let doc = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null,
             "properties": {"geometry": "x", "geometry_wkt": "y", "NAME": "a"}}
        ]}"#;
        let table = FeatureTable::from_slice(doc.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["NAME"]);
        assert_eq!(table.crs, Crs::Epsg(4326));
    }

    #[test]
    fn test_empty_collection() {
        let doc = r#"{"type": "FeatureCollection", "features": []}"#;
        let table = FeatureTable::from_slice(doc.as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.header(), vec!["geometry_wkt"]);
        assert_eq!(table.total_bounds().unwrap(), None);
    }

    #[test]
    fn test_rejects_non_collection() {
        let doc = r#"{"type": "Point", "coordinates": [1, 2]}"#;
        let err = FeatureTable::from_slice(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
        assert!(FeatureTable::from_slice(b"not json").is_err());
    }
}
