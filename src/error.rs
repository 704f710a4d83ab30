use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapUnitError {
    #[error("{0} is locked. Stop editing or close the other session holding it")]
    SchemaLocked(PathBuf),

    #[error("Cannot identify {name} feature class. Candidates are {candidates:?}")]
    AmbiguousFeatureClass { name: String, candidates: Vec<String> },

    #[error("Feature class or table {0} does not exist")]
    MissingFeatureClass(String),

    #[error("Field {field} is not present in {table}")]
    MissingField { table: String, field: String },

    #[error("Feature dataset {0} does not exist")]
    MissingDataset(String),

    #[error("{0} is not a map database workspace")]
    NotAWorkspace(PathBuf),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, MapUnitError>;
