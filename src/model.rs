//! Typed views over the workspace records MakePolys works with.

use crate::workspace::Record;
use geo_types::{Geometry, LineString, Point, Polygon};
use serde_json::{Map, Value};

pub const OBJECTID: &str = "OBJECTID";
pub const MAP_UNIT: &str = "MapUnit";
pub const IDENTITY_CONFIDENCE: &str = "IdentityConfidence";
pub const DATA_SOURCE_ID: &str = "DataSourceID";
pub const IS_CONCEALED: &str = "IsConcealed";
pub const TYPE: &str = "Type";
pub const MULTIPLE_LABELS: &str = "MultipleLabels";
pub const LEFT_MAP_UNIT: &str = "Left_MapUnit";
pub const RIGHT_MAP_UNIT: &str = "Right_MapUnit";

/// `<class>_ID`, the standard identifier field of a class.
pub fn id_field(class: &str) -> String {
    format!("{}_ID", class)
}

/// Field value as text, `None` when null or absent.
pub(crate) fn field_text(attributes: &Map<String, Value>, field: &str) -> Option<String> {
    match attributes.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A feature of the ContactsAndFaults class.
#[derive(Clone, Debug)]
pub struct ContactLine {
    pub oid: i64,
    /// Value of `<class>_ID`.
    pub id: Option<String>,
    pub parts: Vec<LineString<f64>>,
    /// `Type`, e.g. `contact` or `fault`.
    pub line_type: String,
    pub is_concealed: bool,
    pub attributes: Map<String, Value>,
}

impl ContactLine {
    /// `None` for features without lineal geometry.
    pub fn from_record(record: &Record, id_field: &str) -> Option<Self> {
        let parts = match record.geometry.as_ref()? {
            Geometry::LineString(ls) => vec![ls.clone()],
            Geometry::MultiLineString(mls) => mls.0.clone(),
            Geometry::Line(l) => vec![LineString::from(*l)],
            _ => return None,
        };
        Some(Self {
            oid: record.oid,
            id: field_text(&record.attributes, id_field),
            parts,
            line_type: record.text(TYPE),
            is_concealed: is_concealed_flag(&record.text(IS_CONCEALED)),
            attributes: record.attributes.clone(),
        })
    }

    pub fn is_contact(&self) -> bool {
        self.line_type.trim().eq_ignore_ascii_case("contact")
    }
}

/// `Y` or `y` marks a concealed line.
pub fn is_concealed_flag(value: &str) -> bool {
    matches!(value.trim(), "Y" | "y")
}

/// The attribute tuple compared between labels sharing a polygon.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct LabelAttributes {
    pub map_unit: Option<String>,
    pub identity_confidence: Option<String>,
    pub data_source_id: Option<String>,
    /// Identifier of the polygon the label was made from.
    pub source_id: Option<String>,
}

impl LabelAttributes {
    pub fn from_attributes(attributes: &Map<String, Value>, source_id_field: &str) -> Self {
        Self {
            map_unit: field_text(attributes, MAP_UNIT),
            identity_confidence: field_text(attributes, IDENTITY_CONFIDENCE),
            data_source_id: field_text(attributes, DATA_SOURCE_ID),
            source_id: field_text(attributes, source_id_field),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOrigin {
    /// Interior point of an existing map-unit polygon.
    Polygon(i64),
    /// A digitized MapUnitPoints feature.
    MapUnitPoint(i64),
}

#[derive(Clone, Debug)]
pub struct LabelPoint {
    pub point: Point<f64>,
    pub origin: LabelOrigin,
    pub key: LabelAttributes,
    /// Every attribute of the source feature.
    pub attributes: Map<String, Value>,
}

impl LabelPoint {
    pub fn new(point: Point<f64>, origin: LabelOrigin, attributes: Map<String, Value>, source_id_field: &str) -> Self {
        Self {
            point,
            origin,
            key: LabelAttributes::from_attributes(&attributes, source_id_field),
            attributes,
        }
    }

    pub fn map_unit(&self) -> &str {
        self.key.map_unit.as_deref().unwrap_or("")
    }
}

/// A rebuilt map-unit polygon.
#[derive(Clone, Debug)]
pub struct MapUnitPoly {
    /// 1-based, in polygonizer output order.
    pub oid: i64,
    pub polygon: Polygon<f64>,
    /// Index of the label it was attributed from.
    pub label: Option<usize>,
    pub attributes: Map<String, Value>,
}

impl MapUnitPoly {
    pub fn map_unit(&self) -> &str {
        self.attributes.get(MAP_UNIT).and_then(Value::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.map_unit().is_empty()
    }

    pub fn to_record(&self) -> Record {
        Record {
            oid: self.oid,
            geometry: Some(Geometry::Polygon(self.polygon.clone())),
            attributes: self.attributes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    #[test]
    fn concealed_flag_values() {
        assert!(is_concealed_flag("Y"));
        assert!(is_concealed_flag("y"));
        assert!(!is_concealed_flag("N"));
        assert!(!is_concealed_flag(""));
    }

    #[test]
    fn contact_line_from_record() {
        let record = Record::new(3, Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()))
            .with("ContactsAndFaults_ID", "CAF3")
            .with(TYPE, "Contact")
            .with(IS_CONCEALED, "y");
        let line = ContactLine::from_record(&record, "ContactsAndFaults_ID").unwrap();
        assert_eq!(line.id.as_deref(), Some("CAF3"));
        assert!(line.is_concealed);
        assert!(line.is_contact());
        assert_eq!(line.parts.len(), 1);

        let point = Record::new(4, Some(Point::new(0.0, 0.0).into()));
        assert!(ContactLine::from_record(&point, "ContactsAndFaults_ID").is_none());
    }

    #[test]
    fn null_and_missing_fields_compare_equal() {
        let mut a = Map::new();
        a.insert(MAP_UNIT.into(), "Qal".into());
        a.insert(DATA_SOURCE_ID.into(), Value::Null);
        let mut b = Map::new();
        b.insert(MAP_UNIT.into(), "Qal".into());
        assert_eq!(
            LabelAttributes::from_attributes(&a, "MapUnitPolys_ID"),
            LabelAttributes::from_attributes(&b, "MapUnitPolys_ID")
        );
    }
}
