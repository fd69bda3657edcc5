//! GeoJSON conversion for boundaries and point tables.

use crate::config::CoordinateFields;
use crate::error::{BrammError, Result};
use bramm_types::table::PointTable;
use bramm_types::value::Value;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value as GeoValue};
use serde_json::Map;

/// Parses a boundary from GeoJSON text.
///
/// Accepts a Feature (its geometry member is used), a bare Geometry, or a
/// FeatureCollection whose polygon parts are gathered into one multi-polygon.
/// Geometries must be Polygon or MultiPolygon.
pub fn multi_polygon_from_geojson(source: &str) -> Result<MultiPolygon> {
    let parsed: GeoJson = source
        .parse()
        .map_err(|e| BrammError::Geometry(format!("Failed to parse GeoJSON: {}", e)))?;

    match parsed {
        GeoJson::Geometry(geometry) => multi_polygon_from_geometry(&geometry),
        GeoJson::Feature(feature) => multi_polygon_from_feature(&feature),
        GeoJson::FeatureCollection(collection) => {
            if collection.features.is_empty() {
                return Err(BrammError::Geometry(
                    "FeatureCollection has no features".to_string(),
                ));
            }
            let mut parts = Vec::new();
            for feature in &collection.features {
                parts.extend(multi_polygon_from_feature(feature)?.0);
            }
            Ok(MultiPolygon::new(parts))
        }
    }
}

/// Boundary from the geometry member of a Feature.
pub fn multi_polygon_from_feature(feature: &Feature) -> Result<MultiPolygon> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| BrammError::Geometry("Feature has no geometry member".to_string()))?;
    multi_polygon_from_geometry(geometry)
}

pub fn multi_polygon_from_geometry(geometry: &Geometry) -> Result<MultiPolygon> {
    match &geometry.value {
        GeoValue::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        GeoValue::MultiPolygon(polygons) => {
            let parts = polygons
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon::new(parts))
        }
        other => Err(BrammError::Geometry(format!(
            "GeoJSON geometry is not a Polygon or MultiPolygon: {}",
            geometry_kind(other)
        ))),
    }
}

fn geometry_kind(value: &GeoValue) -> &'static str {
    match value {
        GeoValue::Point(_) => "Point",
        GeoValue::MultiPoint(_) => "MultiPoint",
        GeoValue::LineString(_) => "LineString",
        GeoValue::MultiLineString(_) => "MultiLineString",
        GeoValue::GeometryCollection(_) => "GeometryCollection",
        _ => "unsupported geometry",
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(BrammError::Geometry(
            "Polygon must have at least one ring".to_string(),
        ));
    };

    let interiors = interiors
        .iter()
        .map(|ring| ring_from_positions(ring))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(ring_from_positions(exterior)?, interiors))
}

fn ring_from_positions(ring: &[Vec<f64>]) -> Result<LineString> {
    let coords = ring
        .iter()
        .map(|position| {
            if position.len() < 2 {
                return Err(BrammError::Geometry(
                    "Coordinate must have at least 2 values".to_string(),
                ));
            }
            Ok(Coord {
                x: position[0],
                y: position[1],
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}

/// JSON rendering of a table cell. Dates become `YYYY-MM-DD` strings and
/// non-finite numbers become null.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
    }
}

/// Converts a point table to a GeoJSON FeatureCollection string.
///
/// Each row becomes a Point feature whose id is the row identity and whose
/// properties are the remaining columns. Rows without usable coordinates are
/// skipped.
pub fn table_to_feature_collection(table: &PointTable, fields: &CoordinateFields) -> Result<String> {
    let lon = table
        .column_index(&fields.longitude)
        .ok_or_else(|| BrammError::missing_column(&fields.longitude))?;
    let lat = table
        .column_index(&fields.latitude)
        .ok_or_else(|| BrammError::missing_column(&fields.latitude))?;

    let mut skipped = 0usize;
    let features: Vec<Feature> = table
        .iter()
        .filter_map(|row| {
            let (Some(x), Some(y)) = (row.values[lon].as_f64(), row.values[lat].as_f64()) else {
                skipped += 1;
                return None;
            };

            let props: Map<String, serde_json::Value> = table
                .columns()
                .iter()
                .enumerate()
                .filter(|(col, _)| *col != lon && *col != lat)
                .map(|(col, name)| (name.clone(), value_to_json(&row.values[col])))
                .collect();

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(vec![x, y]))),
                id: Some(Id::Number(row.id.0.into())),
                properties: Some(props),
                foreign_members: None,
            })
        })
        .collect();

    if skipped > 0 {
        log::warn!("Skipped {} rows without coordinates while writing GeoJSON", skipped);
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    Ok(serde_json::to_string(&collection)?)
}
