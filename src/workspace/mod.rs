//! Directory-backed map database.
//!
//! A workspace is a directory holding `catalog.json` (datasets, feature
//! class and table definitions, domains, topologies) and one
//! `<class>.geojson` file per feature class or table. Class names are
//! unique across the whole workspace.

pub mod lock;
pub mod record;

pub use lock::SchemaLock;
pub use record::{read_records, write_records, Record};

use crate::error::{MapUnitError, Result};
use crate::schema::{Domain, FieldDef, TableDef, Topology};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "catalog.json";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDataset {
    pub name: String,
    /// Opaque coordinate system text; `None` when undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_reference: Option<String>,
    pub feature_classes: Vec<TableDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub datasets: Vec<FeatureDataset>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub topologies: Vec<Topology>,
}

impl Catalog {
    pub fn dataset(&self, name: &str) -> Option<&FeatureDataset> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn table_def(&self, name: &str) -> Option<&TableDef> {
        self.datasets
            .iter()
            .flat_map(|d| d.feature_classes.iter())
            .chain(self.tables.iter())
            .find(|t| t.name == name)
    }

    fn table_def_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.datasets
            .iter_mut()
            .flat_map(|d| d.feature_classes.iter_mut())
            .chain(self.tables.iter_mut())
            .find(|t| t.name == name)
    }

    /// Dataset holding the feature class `name`; `None` for tables and
    /// unknown names.
    pub fn dataset_of(&self, name: &str) -> Option<&str> {
        self.datasets
            .iter()
            .find(|d| d.feature_classes.iter().any(|fc| fc.name == name))
            .map(|d| d.name.as_str())
    }
}

pub struct Workspace {
    root: PathBuf,
    catalog: Catalog,
}

impl Workspace {
    /// Creates an empty workspace. Fails when `root` already holds one.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.join(CATALOG_FILE).exists() {
            return Err(MapUnitError::SchemaError(format!("{} already exists", root.display())));
        }
        fs::create_dir_all(&root)?;
        let ws = Self { root, catalog: Catalog::default() };
        ws.save_catalog()?;
        Ok(ws)
    }

    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let catalog_path = root.join(CATALOG_FILE);
        if !catalog_path.is_file() {
            return Err(MapUnitError::NotAWorkspace(root));
        }
        let catalog = serde_json::from_reader(BufReader::new(File::open(&catalog_path)?))?;
        Ok(Self { root, catalog })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn save_catalog(&self) -> Result<()> {
        let writer = BufWriter::new(File::create(self.root.join(CATALOG_FILE))?);
        serde_json::to_writer_pretty(writer, &self.catalog)?;
        Ok(())
    }

    pub fn schema_lock(&self) -> Result<SchemaLock> {
        SchemaLock::acquire(&self.root)
    }

    pub fn class_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.geojson", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.catalog.table_def(name).is_some()
    }

    pub fn table_def(&self, name: &str) -> Option<&TableDef> {
        self.catalog.table_def(name)
    }

    pub fn feature_classes(&self, dataset: &str) -> Result<Vec<String>> {
        let ds = self
            .catalog
            .dataset(dataset)
            .ok_or_else(|| MapUnitError::MissingDataset(dataset.to_string()))?;
        Ok(ds.feature_classes.iter().map(|fc| fc.name.clone()).collect())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.catalog.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn create_dataset(&mut self, name: &str, spatial_reference: Option<String>) -> Result<()> {
        if self.catalog.dataset(name).is_some() {
            return Err(MapUnitError::SchemaError(format!("feature dataset {} already exists", name)));
        }
        self.catalog.datasets.push(FeatureDataset {
            name: name.to_string(),
            spatial_reference,
            feature_classes: Vec::new(),
        });
        self.save_catalog()
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if self.exists(name) {
            return Err(MapUnitError::SchemaError(format!("{} already exists", name)));
        }
        Ok(())
    }

    pub fn create_feature_class(&mut self, dataset: &str, def: TableDef) -> Result<()> {
        self.check_new_name(&def.name)?;
        if def.geometry_type.is_none() {
            return Err(MapUnitError::SchemaError(format!("feature class {} has no geometry type", def.name)));
        }
        let name = def.name.clone();
        self.catalog
            .datasets
            .iter_mut()
            .find(|d| d.name == dataset)
            .ok_or_else(|| MapUnitError::MissingDataset(dataset.to_string()))?
            .feature_classes
            .push(def);
        write_records(&self.class_path(&name), &[])?;
        self.save_catalog()
    }

    pub fn create_table(&mut self, def: TableDef) -> Result<()> {
        self.check_new_name(&def.name)?;
        let name = def.name.clone();
        self.catalog.tables.push(def);
        write_records(&self.class_path(&name), &[])?;
        self.save_catalog()
    }

    pub fn add_field(&mut self, class: &str, field: FieldDef) -> Result<()> {
        self.catalog
            .table_def_mut(class)
            .ok_or_else(|| MapUnitError::MissingFeatureClass(class.to_string()))?
            .add_field(field)?;
        self.save_catalog()
    }

    pub fn add_domain(&mut self, domain: Domain) -> Result<()> {
        if self.catalog.domain(&domain.name).is_some() {
            return Err(MapUnitError::SchemaError(format!("domain {} already exists", domain.name)));
        }
        self.catalog.domains.push(domain);
        self.save_catalog()
    }

    /// Attaches a domain to a field of a class.
    pub fn assign_domain(&mut self, class: &str, field: &str, domain: &str) -> Result<()> {
        if self.catalog.domain(domain).is_none() {
            return Err(MapUnitError::SchemaError(format!("domain {} does not exist", domain)));
        }
        let def = self
            .catalog
            .table_def_mut(class)
            .ok_or_else(|| MapUnitError::MissingFeatureClass(class.to_string()))?;
        let table = def.name.clone();
        let target = def
            .fields
            .iter_mut()
            .find(|f| f.name == field)
            .ok_or_else(|| MapUnitError::MissingField { table, field: field.to_string() })?;
        target.domain = Some(domain.to_string());
        self.save_catalog()
    }

    pub fn add_topology(&mut self, topology: Topology) -> Result<()> {
        if self.catalog.dataset(&topology.dataset).is_none() {
            return Err(MapUnitError::MissingDataset(topology.dataset));
        }
        self.catalog.topologies.push(topology);
        self.save_catalog()
    }

    pub fn read_class(&self, name: &str) -> Result<Vec<Record>> {
        if !self.exists(name) {
            return Err(MapUnitError::MissingFeatureClass(name.to_string()));
        }
        let path = self.class_path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_records(&path)
    }

    pub fn write_class(&self, name: &str, records: &[Record]) -> Result<()> {
        if !self.exists(name) {
            return Err(MapUnitError::MissingFeatureClass(name.to_string()));
        }
        write_records(&self.class_path(name), records)
    }

    /// Removes a class and its data. Returns false when nothing was there.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let mut found = false;
        for ds in &mut self.catalog.datasets {
            let before = ds.feature_classes.len();
            ds.feature_classes.retain(|fc| fc.name != name);
            found |= ds.feature_classes.len() != before;
        }
        let before = self.catalog.tables.len();
        self.catalog.tables.retain(|t| t.name != name);
        found |= self.catalog.tables.len() != before;

        if !found {
            return Ok(false);
        }
        for topology in &mut self.catalog.topologies {
            topology.feature_classes.retain(|fc| fc != name);
        }
        let path = self.class_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        self.save_catalog()?;
        Ok(true)
    }

    /// Copies a class with its data under a new name, next to the original.
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<()> {
        self.check_new_name(dst)?;
        let mut def = self
            .table_def(src)
            .cloned()
            .ok_or_else(|| MapUnitError::MissingFeatureClass(src.to_string()))?;
        def.name = dst.to_string();
        let records = self.read_class(src)?;
        match self.catalog.dataset_of(src).map(str::to_string) {
            Some(dataset) => self.create_feature_class(&dataset, def)?,
            None => self.create_table(def)?,
        }
        self.write_class(dst, &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, GeometryType};

    fn poly_def(name: &str) -> TableDef {
        TableDef {
            name: name.to_string(),
            geometry_type: Some(GeometryType::Polygon),
            fields: vec![FieldDef::text("MapUnit", 10, false)],
        }
    }

    #[test]
    fn create_then_open_keeps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("map.gdb");
        {
            let mut ws = Workspace::create(&root).unwrap();
            ws.create_dataset("GeologicMap", Some("NAD83".into())).unwrap();
            ws.create_feature_class("GeologicMap", poly_def("MapUnitPolys")).unwrap();
            ws.create_table(TableDef { name: "Glossary".into(), geometry_type: None, fields: vec![] }).unwrap();
        }
        let ws = Workspace::open(&root).unwrap();
        assert_eq!(ws.feature_classes("GeologicMap").unwrap(), vec!["MapUnitPolys"]);
        assert_eq!(ws.table_names(), vec!["Glossary"]);
        assert_eq!(ws.catalog().dataset_of("MapUnitPolys"), Some("GeologicMap"));
        assert!(ws.read_class("MapUnitPolys").unwrap().is_empty());
        assert!(Workspace::create(&root).is_err());
    }

    #[test]
    fn open_plain_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Workspace::open(dir.path()), Err(MapUnitError::NotAWorkspace(_))));
    }

    #[test]
    fn names_are_unique_across_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(dir.path().join("w")).unwrap();
        ws.create_dataset("A", None).unwrap();
        ws.create_dataset("B", None).unwrap();
        ws.create_feature_class("A", poly_def("X")).unwrap();
        assert!(ws.create_feature_class("B", poly_def("X")).is_err());
        assert!(matches!(
            ws.create_feature_class("C", poly_def("Y")),
            Err(MapUnitError::MissingDataset(_))
        ));
    }

    #[test]
    fn copy_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(dir.path().join("w")).unwrap();
        ws.create_dataset("GeologicMap", None).unwrap();
        ws.create_feature_class("GeologicMap", poly_def("MapUnitPolys")).unwrap();
        ws.write_class("MapUnitPolys", &[Record::new(1, None).with("MapUnit", "Qal")]).unwrap();

        ws.copy("MapUnitPolys", "MapUnitPolys001").unwrap();
        assert_eq!(ws.catalog().dataset_of("MapUnitPolys001"), Some("GeologicMap"));
        assert_eq!(ws.read_class("MapUnitPolys001").unwrap()[0].text("MapUnit"), "Qal");

        assert!(ws.delete("MapUnitPolys").unwrap());
        assert!(!ws.delete("MapUnitPolys").unwrap());
        assert!(!ws.class_path("MapUnitPolys").exists());
        assert!(matches!(ws.read_class("MapUnitPolys"), Err(MapUnitError::MissingFeatureClass(_))));
    }

    #[test]
    fn domain_assignment_needs_field_and_domain() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(dir.path().join("w")).unwrap();
        ws.create_dataset("GeologicMap", None).unwrap();
        ws.create_feature_class("GeologicMap", poly_def("MapUnitPolys")).unwrap();
        let domain = Domain {
            name: "d_Units".into(),
            description: "Units".into(),
            field_type: FieldType::String,
            coded_values: vec![],
        };
        assert!(ws.assign_domain("MapUnitPolys", "MapUnit", "d_Units").is_err());
        ws.add_domain(domain).unwrap();
        assert!(matches!(
            ws.assign_domain("MapUnitPolys", "Nope", "d_Units"),
            Err(MapUnitError::MissingField { .. })
        ));
        ws.assign_domain("MapUnitPolys", "MapUnit", "d_Units").unwrap();
        let field = ws.table_def("MapUnitPolys").unwrap().field("MapUnit").unwrap();
        assert_eq!(field.domain.as_deref(), Some("d_Units"));
    }
}
