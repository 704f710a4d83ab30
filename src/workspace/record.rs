use crate::error::Result;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson};
use geo_types::Geometry;
use serde_json::{Map, Value};
use std::convert::TryInto;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One row of a feature class or table.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Object id, unique within its class and stable across reads.
    pub oid: i64,
    /// `None` for plain table rows.
    pub geometry: Option<Geometry<f64>>,
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn new(oid: i64, geometry: Option<Geometry<f64>>) -> Self {
        Self { oid, geometry, attributes: Map::new() }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// The field as text; null and missing read as the empty string and
    /// numbers are rendered as JSON would.
    pub fn text(&self, field: &str) -> String {
        match self.get(field) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.attributes.insert(field.to_string(), value.into());
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }
}

fn to_feature(record: &Record) -> Feature {
    Feature {
        bbox: None,
        geometry: record.geometry.as_ref().map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: Some(Id::Number(record.oid.into())),
        properties: Some(record.attributes.clone()),
        foreign_members: None,
    }
}

fn from_feature(feature: Feature, fallback_oid: i64) -> Result<Record> {
    let oid = match &feature.id {
        Some(Id::Number(n)) => n.as_i64().unwrap_or(fallback_oid),
        Some(Id::String(s)) => s.parse().unwrap_or(fallback_oid),
        None => fallback_oid,
    };
    let geometry: Option<Geometry<f64>> = match feature.geometry {
        Some(geom) => Some(geom.try_into()?),
        None => None,
    };
    Ok(Record {
        oid,
        geometry,
        attributes: feature.properties.unwrap_or_default(),
    })
}

/// Reads every record of a GeoJSON file. Features without an id are
/// numbered from 1 in file order.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let reader = BufReader::new(File::open(path)?);
    let geojson: GeoJson = serde_json::from_reader(reader)?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| from_feature(feature, i as i64 + 1))
        .collect()
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features: records.iter().map(to_feature).collect(),
        foreign_members: None,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &GeoJson::FeatureCollection(collection))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    #[test]
    fn text_of_null_and_numbers() {
        let r = Record::new(1, None)
            .with("A", Value::Null)
            .with("B", 2.5)
            .with("C", "x");
        assert_eq!(r.text("A"), "");
        assert_eq!(r.text("missing"), "");
        assert_eq!(r.text("B"), "2.5");
        assert_eq!(r.text("C"), "x");
        assert_eq!(r.get_f64("B"), Some(2.5));
    }

    #[test]
    fn records_survive_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pts.geojson");
        let records = vec![
            Record::new(7, Some(point!(x: 1.0, y: 2.0).into())).with("MapUnit", "Qal"),
            Record::new(9, None).with("MapUnit", "Tb"),
        ];
        write_records(&path, &records).unwrap();
        let back = read_records(&path).unwrap();
        assert_eq!(back, records);
    }
}
