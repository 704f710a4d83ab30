//! Table-driven schema of an NCGMP09-style geologic map database.

pub mod create;
pub mod definition;

pub use create::CreateDatabase;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Single,
    Double,
    Date,
    Short,
    Integer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Polyline,
    Polygon,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    /// Character length, only meaningful for strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl FieldDef {
    pub fn text(name: &str, length: u32, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::String,
            nullable,
            length: Some(length),
            domain: None,
        }
    }

    pub fn new(name: &str, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            nullable,
            length: None,
            domain: None,
        }
    }
}

/// A feature class (when `geometry_type` is set) or a plain table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<GeometryType>,
    pub fields: Vec<FieldDef>,
}

impl TableDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Adds a field, failing when a field of that name already exists.
    pub fn add_field(&mut self, field: FieldDef) -> crate::Result<()> {
        if self.has_field(&field.name) {
            return Err(crate::MapUnitError::SchemaError(format!(
                "field {} already exists in {}", field.name, self.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodedValue {
    pub code: String,
    pub name: String,
}

/// A coded-value attribute domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub coded_values: Vec<CodedValue>,
}

impl Domain {
    pub fn allows(&self, code: &str) -> bool {
        self.coded_values.iter().any(|cv| cv.code == code)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyRule {
    pub rule: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Topology rules registered on a feature dataset. They are recorded for
/// downstream validators; nothing here enforces them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub name: String,
    pub dataset: String,
    pub feature_classes: Vec<String>,
    pub rules: Vec<TopologyRule>,
}
