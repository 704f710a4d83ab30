//! Geologic map-unit polygon tooling: rebuilding MapUnitPolys from
//! ContactsAndFaults and label points, creating NCGMP09-style map
//! databases, and exporting them to flat layers.

pub mod error;
pub mod export;
pub mod graph;
pub mod model;
pub mod noding;
pub mod polygonizer;
pub mod reconcile;
pub mod schema;
pub mod utils;
pub mod workspace;

#[cfg(test)]
mod polygonizer_tests;

pub use error::{MapUnitError, Result};
pub use export::Translate;
pub use polygonizer::Polygonizer;
pub use reconcile::MakePolys;
pub use schema::CreateDatabase;
pub use workspace::Workspace;
