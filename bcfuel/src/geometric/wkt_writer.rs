//! Well-Known Text encoding of GeoJSON geometries
//!
//! Output follows the GEOS writer layout: a space between the tag and the
//! coordinate list, `, ` between members, `Z` when every position carries
//! a third ordinate, and `EMPTY` for geometries without coordinates.

use anyhow::Result;
use geojson::{Geometry, Value};

use crate::commons::basic_functions::format_ordinate;
use crate::error::FuelTypesError;

type Position = Vec<f64>;

/// Encode a geometry as WKT, rounding ordinates to `precision` decimals if set
pub fn to_wkt(geometry: &Geometry, precision: Option<usize>) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, &geometry.value, precision)?;
    Ok(out)
}

/// Uppercase WKT tag for a geometry value
pub fn wkt_tag(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "POINT",
        Value::MultiPoint(_) => "MULTIPOINT",
        Value::LineString(_) => "LINESTRING",
        Value::MultiLineString(_) => "MULTILINESTRING",
        Value::Polygon(_) => "POLYGON",
        Value::MultiPolygon(_) => "MULTIPOLYGON",
        Value::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
}

fn write_value(out: &mut String, value: &Value, precision: Option<usize>) -> Result<()> {
    out.push_str(wkt_tag(value));

    if let Value::GeometryCollection(members) = value {
        if members.is_empty() {
            out.push_str(" EMPTY");
            return Ok(());
        }
        out.push_str(" (");
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_value(out, &member.value, precision)?;
        }
        out.push(')');
        return Ok(());
    }

    let coords = positions(value);
    if coords.is_empty() {
        out.push_str(" EMPTY");
        return Ok(());
    }
    if let Some(bad) = coords.iter().find(|p| p.len() < 2) {
        return Err(FuelTypesError::InvalidPosition(bad.len()).into());
    }
    let has_z = coords.iter().all(|p| p.len() >= 3);
    if has_z {
        out.push_str(" Z");
    }
    out.push(' ');

    let dims = if has_z { 3 } else { 2 };
    let mut w = CoordWriter {
        out,
        dims,
        precision,
    };
    match value {
        Value::Point(p) => w.sequence(std::slice::from_ref(p)),
        Value::MultiPoint(points) => {
            w.list(points, |w, p| w.sequence(std::slice::from_ref(p)))
        }
        Value::LineString(line) => w.sequence(line),
        Value::MultiLineString(lines) => w.list(lines, |w, line| w.sequence(line)),
        Value::Polygon(rings) => w.rings(rings),
        Value::MultiPolygon(polygons) => w.list(polygons, |w, rings| w.rings(rings)),
        Value::GeometryCollection(_) => unreachable!("handled above"),
    }
    Ok(())
}

/// Every position of a non-collection geometry, in document order
fn positions(value: &Value) -> Vec<&Position> {
    match value {
        Value::Point(p) if p.is_empty() => Vec::new(),
        Value::Point(p) => vec![p],
        Value::MultiPoint(points) => points.iter().collect(),
        Value::LineString(line) => line.iter().collect(),
        Value::MultiLineString(lines) => lines.iter().flatten().collect(),
        Value::Polygon(rings) => rings.iter().flatten().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().collect(),
        Value::GeometryCollection(_) => Vec::new(),
    }
}

struct CoordWriter<'a> {
    out: &'a mut String,
    dims: usize,
    precision: Option<usize>,
}

impl CoordWriter<'_> {
    /// `(x y, x y, ...)`
    fn sequence(&mut self, positions: &[Position]) {
        self.out.push('(');
        for (i, position) in positions.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            for (j, ordinate) in position.iter().take(self.dims).enumerate() {
                if j > 0 {
                    self.out.push(' ');
                }
                self.out.push_str(&format_ordinate(*ordinate, self.precision));
            }
        }
        self.out.push(')');
    }

    fn rings(&mut self, rings: &[Vec<Position>]) {
        self.list(rings, |w, ring| w.sequence(ring));
    }

    /// `(<item>, <item>, ...)`
    fn list<T>(&mut self, items: &[T], mut write_item: impl FnMut(&mut Self, &T)) {
        self.out.push('(');
        let mut first = true;
        for item in items {
            if !first {
                self.out.push_str(", ");
            }
            first = false;
            write_item(self, item);
        }
        self.out.push(')');
    }
}
