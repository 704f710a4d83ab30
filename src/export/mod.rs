//! Export of a map database to flat GeoJSON layers with short field names.
//!
//! Two directories are written next to each other: `<db>-open` holds every
//! feature class and table unchanged apart from field names, and
//! `<db>-simple` holds the GeologicMap layers with reference tables folded
//! into them.

pub mod field_names;
pub mod sidecar;
pub mod simple;

pub use field_names::{remap_field_name, short_field_name, MAX_FIELD_NAME};
pub use simple::{describe_unit, equivalent_fraction, std_lith_dictionary};

use crate::error::{MapUnitError, Result};
use crate::schema::definition::GEOLOGIC_MAP;
use crate::schema::{FieldType, GeometryType, TableDef};
use crate::workspace::{write_records, Record, Workspace};
use serde_json::{Map, Value};
use simple::ReferenceTables;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const VERSION_STRING: &str = concat!("mapunit TranslateToShape, version ", env!("CARGO_PKG_VERSION"));
pub const LOGFILE: &str = "logfile.txt";
/// Longest text value a flat layer holds.
pub const MAX_TEXT: usize = 254;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslateReport {
    pub open_dir: PathBuf,
    pub simple_dir: PathBuf,
    /// Every layer written, in order.
    pub written: Vec<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct Translate {
    pub workspace: PathBuf,
    pub output_dir: PathBuf,
}

impl Translate {
    pub fn new(workspace: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { workspace: workspace.into(), output_dir: output_dir.into() }
    }

    pub fn run(&self) -> Result<TranslateReport> {
        log::info!("  {}", VERSION_STRING);
        if !self.output_dir.is_dir() {
            return Err(MapUnitError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output workspace {} does not exist", self.output_dir.display()),
            )));
        }
        let ws = Workspace::open(&self.workspace)?;
        let base = database_base_name(&self.workspace);
        let mut written = Vec::new();

        let open_dir = self.export_open(&ws, &base, &mut written)?;
        let simple_dir = self.export_simple(&ws, &base, &mut written)?;

        Ok(TranslateReport { open_dir, simple_dir, written })
    }

    fn export_open(&self, ws: &Workspace, base: &str, written: &mut Vec<PathBuf>) -> Result<PathBuf> {
        let (dir, mut logfile) = make_output_dir(&self.output_dir, base, true)?;

        for dataset in &ws.catalog().datasets {
            log::info!("  Processing feature data set {}...", dataset.name);
            writeln!(logfile, "Feature data set {} ", dataset.name)?;
            match &dataset.spatial_reference {
                Some(sr) => {
                    writeln!(logfile, "  spatial reference framework")?;
                    writeln!(logfile, "    name = {}", sr)?;
                }
                None => writeln!(logfile, "  spatial reference framework appears to be undefined")?,
            }
            let prefix = dataset_prefix(&dataset.name);
            for def in &dataset.feature_classes {
                let out = dir.join(format!("{}_{}.geojson", prefix, def.name));
                let dumped = ws
                    .read_class(&def.name)
                    .and_then(|records| dump_table(&def.name, def, &records, &out, &mut logfile, true));
                match dumped {
                    Ok(()) => written.push(out),
                    Err(e) => log::warn!("Failed to dump {}: {}", def.name, e),
                }
            }
            writeln!(logfile)?;
        }

        for def in &ws.catalog().tables {
            let out = dir.join(format!("{}.geojson", def.name));
            let dumped = ws
                .read_class(&def.name)
                .and_then(|records| dump_table(&def.name, def, &records, &out, &mut logfile, true));
            match dumped {
                Ok(()) => written.push(out),
                Err(e) => log::warn!("Failed to dump {}: {}", def.name, e),
            }
        }
        logfile.flush()?;
        Ok(dir)
    }

    fn export_simple(&self, ws: &Workspace, base: &str, written: &mut Vec<PathBuf>) -> Result<PathBuf> {
        let (dir, mut logfile) = make_output_dir(&self.output_dir, base, false)?;

        let dmu = load_table(ws, "DescriptionOfMapUnits");
        let data_sources = load_table(ws, "DataSources");
        let glossary = load_table(ws, "Glossary");
        let std_lith = load_table(ws, "StandardLithology").map(|(_, rows)| std_lith_dictionary(&rows));
        let refs = ReferenceTables {
            dmu: dmu.as_ref().map(|(d, r)| (d, r.as_slice())),
            data_sources: data_sources.as_ref().map(|(d, r)| (d, r.as_slice())),
            glossary: glossary.as_ref().map(|(_, r)| r.as_slice()),
            std_lith: std_lith.as_ref(),
        };

        let classes = ws
            .catalog()
            .dataset(GEOLOGIC_MAP)
            .map(|d| d.feature_classes.clone())
            .unwrap_or_default();

        if let Some(mup_def) = classes.iter().find(|c| c.name == "MapUnitPolys") {
            log::info!("  Processing MapUnitPolys...");
            let out = dir.join("MapUnitPolys.geojson");
            let dumped = ws.read_class(&mup_def.name).and_then(|mup| {
                let (def, rows) = simple::join_map_unit_polys(mup_def, &mup, &refs);
                dump_table(&def.name, &def, &rows, &out, &mut logfile, false)
            });
            match dumped {
                Ok(()) => written.push(out),
                Err(e) => log::warn!("Failed to export MapUnitPolys: {}", e),
            }
        }

        let points = classes.iter().filter(|c| c.geometry_type == Some(GeometryType::Point));
        let lines = classes.iter().filter(|c| c.geometry_type == Some(GeometryType::Polyline));
        let flattened = points
            .chain(lines)
            .chain(classes.iter().filter(|c| c.name == "DataSourcePolys"));
        for class_def in flattened {
            log::info!("  Processing {}...", class_def.name);
            let out = dir.join(format!("{}.geojson", class_def.name));
            let dumped = ws.read_class(&class_def.name).and_then(|records| {
                let (def, rows) = simple::lines_and_points(class_def, &records, &refs);
                dump_table(&def.name, &def, &rows, &out, &mut logfile, false)
            });
            match dumped {
                Ok(()) => written.push(out),
                Err(e) => log::warn!("Failed to export {}: {}", class_def.name, e),
            }
        }
        logfile.flush()?;
        Ok(dir)
    }
}

fn load_table(ws: &Workspace, name: &str) -> Option<(TableDef, Vec<Record>)> {
    let def = ws.table_def(name)?.clone();
    match ws.read_class(name) {
        Ok(rows) => Some((def, rows)),
        Err(e) => {
            log::warn!("Cannot read {}: {}", name, e);
            None
        }
    }
}

/// Database name without its `.gdb` or `.mdb` extension.
pub fn database_base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_lowercase();
    if lower.ends_with(".gdb") || lower.ends_with(".mdb") {
        name[..name.len() - 4].to_string()
    } else {
        name
    }
}

/// Capitals of a dataset name, ignoring its last character:
/// `GeologicMap` gives `GM`, `CrossSectionA` gives `CS`.
pub fn dataset_prefix(dataset: &str) -> String {
    let chars: Vec<char> = dataset.chars().collect();
    chars[..chars.len().saturating_sub(1)]
        .iter()
        .filter(|c| c.to_uppercase().eq(std::iter::once(**c)))
        .collect()
}

/// Empties (or creates) `<out>/<base>-open` or `<out>/<base>-simple` and
/// starts its logfile.
pub fn make_output_dir(out: &Path, base: &str, open: bool) -> Result<(PathBuf, BufWriter<File>)> {
    let suffix = if open { "-open" } else { "-simple" };
    let dir = out.join(format!("{}{}", base, suffix));
    log::info!("  Making {}/...", dir.display());
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    let mut logfile = BufWriter::new(File::create(dir.join(LOGFILE))?);
    write!(logfile, "file written by {}\n\n", VERSION_STRING)?;
    Ok((dir, logfile))
}

fn truncate_text(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_TEXT => Value::from(s.chars().take(MAX_TEXT).collect::<String>()),
        other => other.clone(),
    }
}

/// Writes one class or table with shortened field names and truncated
/// text, noting the renames in `logfile`. For the open export, full values
/// of text fields longer than the flat limit go to a `.txt` sidecar.
pub fn dump_table(
    name: &str,
    def: &TableDef,
    records: &[Record],
    out: &Path,
    logfile: &mut impl Write,
    open: bool,
) -> Result<()> {
    let out_name = out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("    Dumping {}...", out_name);
    if def.geometry_type.is_some() {
        writeln!(logfile, "  feature class {} dumped to shapefile {}", name, out_name)?;
    } else {
        writeln!(logfile, "  table {} dumped to table {}", name, out_name)?;
    }
    writeln!(logfile, "    field name remapping: ")?;

    let mut renames: Vec<(String, String)> = Vec::with_capacity(def.fields.len());
    let mut seen: HashMap<String, String> = HashMap::new();
    for field in &def.fields {
        let short = short_field_name(name, &field.name);
        if field.name.chars().count() > MAX_FIELD_NAME {
            writeln!(logfile, "      {} > {}", field.name, short)?;
        }
        if let Some(other) = seen.insert(short.clone(), field.name.clone()) {
            log::warn!("{}: fields {} and {} both map to {}", name, other, field.name, short);
        }
        renames.push((field.name.clone(), short));
    }

    let long_fields: Vec<String> = def
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::String && f.length.map_or(false, |l| l as usize > MAX_TEXT))
        .map(|f| f.name.clone())
        .collect();

    let rows: Vec<Record> = records
        .iter()
        .map(|record| {
            let mut attributes = Map::new();
            for (from, to) in &renames {
                let value = record.attributes.get(from).map_or(Value::Null, truncate_text);
                attributes.insert(to.clone(), value);
            }
            Record { oid: record.oid, geometry: record.geometry.clone(), attributes }
        })
        .collect();
    write_records(out, &rows)?;

    if open && !long_fields.is_empty() {
        sidecar::write_sidecar(&out.with_extension("txt"), name, def, records, &long_fields)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    #[test]
    fn prefixes_use_capitals_before_the_last_letter() {
        assert_eq!(dataset_prefix("GeologicMap"), "GM");
        assert_eq!(dataset_prefix("CrossSectionA"), "CS");
        assert_eq!(dataset_prefix("CorrelationOfMapUnits"), "COMU");
        assert_eq!(dataset_prefix(""), "");
    }

    #[test]
    fn base_name_drops_database_extension() {
        assert_eq!(database_base_name(Path::new("/tmp/maps/Quad.gdb")), "Quad");
        assert_eq!(database_base_name(Path::new("Quad.mdb")), "Quad");
        assert_eq!(database_base_name(Path::new("/tmp/Quad")), "Quad");
    }

    #[test]
    fn output_dir_is_recreated() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join("Quad-open").join("stale.geojson");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "{}").unwrap();

        let (dir, logfile) = make_output_dir(tmp.path(), "Quad", true).unwrap();
        drop(logfile);
        assert!(!stale.exists());
        let log = fs::read_to_string(dir.join(LOGFILE)).unwrap();
        assert_eq!(log, format!("file written by {}\n\n", VERSION_STRING));
    }

    #[test]
    fn dump_renames_truncates_and_writes_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let def = TableDef {
            name: "DescriptionOfMapUnits".into(),
            geometry_type: None,
            fields: vec![
                FieldDef::text("DescriptionOfMapUnits_ID", 50, false),
                FieldDef::text("MapUnit", 10, true),
                FieldDef::text("Description", 3000, true),
            ],
        };
        let long = "x".repeat(400);
        let records = vec![Record::new(1, None)
            .with("DescriptionOfMapUnits_ID", "DMU1")
            .with("MapUnit", "Qal")
            .with("Description", long.as_str())];
        let out = tmp.path().join("DescriptionOfMapUnits.geojson");
        let mut log = Vec::new();

        dump_table("DescriptionOfMapUnits", &def, &records, &out, &mut log, true).unwrap();

        let log = String::from_utf8(log).unwrap();
        assert!(log.starts_with("  table DescriptionOfMapUnits dumped to table DescriptionOfMapUnits.geojson\n"));
        assert!(log.contains("      DescriptionOfMapUnits_ID > DMapUns_ID\n"));
        assert!(log.contains("      Description > Des\n"));
        assert!(!log.contains("MapUnit >"));

        let rows = crate::workspace::read_records(&out).unwrap();
        assert_eq!(rows[0].text("DMapUns_ID"), "DMU1");
        assert_eq!(rows[0].text("MapUnit"), "Qal");
        assert_eq!(rows[0].text("Des").len(), MAX_TEXT);

        let sidecar = fs::read_to_string(tmp.path().join("DescriptionOfMapUnits.txt")).unwrap();
        assert_eq!(sidecar, format!("DescriptionOfMapUnits_ID,Description\nDMU1|{}\n", long));
    }
}
