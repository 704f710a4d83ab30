use super::definition::{self, CORRELATION_OF_MAP_UNITS, GEOLOGIC_MAP};
use super::{FieldDef, FieldType, GeometryType, TableDef, Topology};
use crate::error::Result;
use crate::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};

pub const VERSION_STRING: &str = concat!("mapunit CreateDatabase, version ", env!("CARGO_PKG_VERSION"));

const NO_VALUE: &str = "#";
const MAX_CROSS_SECTIONS: i32 = 26;
const CARTO_REP_CLASSES: &[&str] = &["ContactsAndFaults", "GeologicLines", "OrientationPoints"];

/// Builds an empty map database from the static table dictionary.
///
/// Creation is best effort: after the workspace itself exists, a feature
/// class, field, domain or topology that cannot be created is logged and
/// skipped.
#[derive(Clone, Debug)]
pub struct CreateDatabase {
    pub output_dir: PathBuf,
    /// Database name; `.gdb` is appended unless it ends in `.gdb` or `.mdb`.
    pub db_name: String,
    /// Opaque coordinate system text given to every feature dataset.
    pub spatial_reference: Option<String>,
    /// Non-required elements to create, e.g. `IsoValueLines`,
    /// `FossilPoints`, `CorrelationOfMapUnits`, `RepurposedSymbols`.
    pub optional_elements: Vec<String>,
    /// Number of cross-section datasets, clamped to `0..=26`.
    pub cross_sections: i32,
    /// Add cartographic representation fields (`RuleID`, `Override`).
    pub carto_reps: bool,
    /// Add `LTYPE` to line classes and `PTTYPE` to orientation points.
    pub add_ltype: bool,
}

impl CreateDatabase {
    pub fn new(output_dir: impl Into<PathBuf>, db_name: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            db_name: db_name.to_string(),
            spatial_reference: None,
            optional_elements: Vec::new(),
            cross_sections: 0,
            carto_reps: false,
            add_ltype: false,
        }
    }

    /// Reads the positional command-line values, where `#` stands for the
    /// current directory, an undefined coordinate system, or no optional
    /// elements.
    pub fn from_args(
        output_dir: &str,
        db_name: &str,
        coord_system: &str,
        optional_elements: &str,
        cross_sections: i32,
    ) -> Result<Self> {
        let output_dir = if output_dir == NO_VALUE {
            std::env::current_dir()?
        } else {
            PathBuf::from(output_dir.replace('\\', "/"))
        };
        let mut cfg = Self::new(output_dir, db_name);
        cfg.spatial_reference = (coord_system != NO_VALUE).then(|| coord_system.to_string());
        cfg.optional_elements = parse_optional_elements(optional_elements);
        cfg.cross_sections = cross_sections;
        Ok(cfg)
    }

    pub fn database_name(&self) -> String {
        let lower = self.db_name.to_lowercase();
        if lower.ends_with(".gdb") || lower.ends_with(".mdb") {
            self.db_name.clone()
        } else {
            format!("{}.gdb", self.db_name)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.output_dir.join(self.database_name())
    }

    fn wants(&self, element: &str) -> bool {
        self.optional_elements.iter().any(|e| e == element)
    }

    pub fn run(&self) -> Result<Workspace> {
        log::info!("{}", VERSION_STRING);
        let name = self.database_name();
        let path = self.database_path();
        log::info!("  Creating geodatabase {}...", name);
        if name.to_lowercase().ends_with(".mdb") {
            log::warn!("{} will be written in the same directory format as a .gdb", name);
        }
        let mut ws = Workspace::create(&path)?;

        for domain in definition::domains() {
            let domain_name = domain.name.clone();
            if let Err(e) = ws.add_domain(domain) {
                log::warn!("Failed to create domain {}: {}", domain_name, e);
            }
        }

        log::info!("  Creating feature dataset {}...", GEOLOGIC_MAP);
        if let Err(e) = ws.create_dataset(GEOLOGIC_MAP, self.spatial_reference.clone()) {
            log::warn!("{}", e);
        }
        self.create_geologic_map(&mut ws);
        self.create_topology(&mut ws);

        if self.wants(CORRELATION_OF_MAP_UNITS) {
            log::info!("  Creating feature dataset {}...", CORRELATION_OF_MAP_UNITS);
            match ws.create_dataset(CORRELATION_OF_MAP_UNITS, self.spatial_reference.clone()) {
                Ok(()) => {
                    let cmu = [
                        ("CMUMapUnitPolys", GeometryType::Polygon),
                        ("CMULines", GeometryType::Polyline),
                        ("CMUPoints", GeometryType::Point),
                    ];
                    for (fc, geometry) in cmu {
                        create_feature_class(&mut ws, CORRELATION_OF_MAP_UNITS, fc, geometry, standard_fields(fc));
                    }
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        for letter in cross_section_letters(self.cross_sections) {
            self.create_cross_section(&mut ws, letter);
        }

        let optional_tables = definition::OPTIONAL_TABLES.iter().filter(|t| self.wants(t));
        for &table in definition::TABLES.iter().chain(optional_tables) {
            log::info!("  Creating table {}...", table);
            let def = TableDef { name: table.to_string(), geometry_type: None, fields: Vec::new() };
            if let Err(e) = ws.create_table(def) {
                log::warn!("Failed to create table {}: {}", table, e);
                continue;
            }
            add_fields(&mut ws, table, standard_fields(table), "table");
        }

        assign_domains(&mut ws);

        if self.carto_reps {
            add_carto_reps(&mut ws, |fc| CARTO_REP_CLASSES.iter().any(|c| *c == fc));
        }

        if name.ends_with(".gdb") {
            write_readme(&path);
        }
        Ok(ws)
    }

    fn create_geologic_map(&self, ws: &mut Workspace) {
        for fc in definition::POLY_CLASSES {
            create_feature_class(ws, GEOLOGIC_MAP, fc, GeometryType::Polygon, standard_fields(fc));
        }

        let optional_lines = definition::OPTIONAL_LINE_CLASSES.iter().filter(|fc| self.wants(fc));
        for &fc in definition::LINE_CLASSES.iter().chain(optional_lines) {
            let mut fields = standard_fields(fc);
            if self.add_ltype && matches!(fc, "ContactsAndFaults" | "GeologicLines") {
                fields.push(FieldDef::text("LTYPE", 255, true));
            }
            create_feature_class(ws, GEOLOGIC_MAP, fc, GeometryType::Polyline, fields);
        }

        let optional_points = definition::OPTIONAL_POINT_CLASSES.iter().filter(|fc| self.wants(fc));
        for &fc in definition::POINT_CLASSES.iter().chain(optional_points) {
            let mut fields = standard_fields(fc);
            if self.add_ltype && fc == "OrientationPoints" {
                fields.push(FieldDef::text("PTTYPE", 255, true));
            }
            create_feature_class(ws, GEOLOGIC_MAP, fc, GeometryType::Point, fields);
        }
    }

    fn create_topology(&self, ws: &mut Workspace) {
        let topology = Topology {
            name: definition::TOPOLOGY_NAME.to_string(),
            dataset: GEOLOGIC_MAP.to_string(),
            feature_classes: vec!["ContactsAndFaults".to_string(), "MapUnitPolys".to_string()],
            rules: definition::topology_rules(),
        };
        if let Err(e) = ws.add_topology(topology) {
            log::warn!("Failed to create topology {}: {}", definition::TOPOLOGY_NAME, e);
        }
    }

    fn create_cross_section(&self, ws: &mut Workspace, letter: char) {
        let dataset = format!("CrossSection{}", letter);
        let prefix = format!("CS{}", letter);
        log::info!("  Creating feature data set {}...", dataset);
        if let Err(e) = ws.create_dataset(&dataset, self.spatial_reference.clone()) {
            log::warn!("{}", e);
            return;
        }

        let classes = [
            ("MapUnitPolys", GeometryType::Polygon, None),
            ("ContactsAndFaults", GeometryType::Polyline, Some("LTYPE")),
            ("OrientationPoints", GeometryType::Point, Some("PTTYPE")),
        ];
        for (base, geometry, type_field) in classes {
            let name = format!("{}{}", prefix, base);
            let mut fields = standard_fields(base);
            if let Some(id) = fields.first_mut() {
                id.name = format!("{}_ID", name);
            }
            if let (true, Some(type_field)) = (self.add_ltype, type_field) {
                fields.push(FieldDef::text(type_field, 50, true));
            }
            create_feature_class(ws, &dataset, &name, geometry, fields);
        }

        if self.carto_reps {
            let caf = format!("{}ContactsAndFaults", prefix);
            add_carto_reps(ws, |fc| fc == caf);
        }
    }
}

pub fn parse_optional_elements(arg: &str) -> Vec<String> {
    if arg.trim() == NO_VALUE {
        return Vec::new();
    }
    arg.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Letters of the cross sections to create, `A` upwards.
pub fn cross_section_letters(n: i32) -> impl Iterator<Item = char> {
    let n = n.clamp(0, MAX_CROSS_SECTIONS) as u8;
    (0..n).map(|i| (b'A' + i) as char)
}

fn standard_fields(name: &str) -> Vec<FieldDef> {
    definition::table_fields(name).unwrap_or_else(|| {
        log::warn!("no field definitions for {}", name);
        Vec::new()
    })
}

fn create_feature_class(
    ws: &mut Workspace,
    dataset: &str,
    name: &str,
    geometry: GeometryType,
    fields: Vec<FieldDef>,
) {
    log::info!("    Creating feature class {}...", name);
    let def = TableDef {
        name: name.to_string(),
        geometry_type: Some(geometry),
        fields: Vec::new(),
    };
    if let Err(e) = ws.create_feature_class(dataset, def) {
        log::warn!("Failed to create feature class {} in dataset {}: {}", name, dataset, e);
        return;
    }
    add_fields(ws, name, fields, "feature class");
}

fn add_fields(ws: &mut Workspace, class: &str, fields: Vec<FieldDef>, kind: &str) {
    for field in fields {
        let field_name = field.name.clone();
        if let Err(e) = ws.add_field(class, field) {
            log::warn!("Failed to add field {} to {} {}: {}", field_name, kind, class, e);
        }
    }
}

/// Attaches the standard domains to every class that carries the field.
/// Classes without the field are skipped silently.
fn assign_domains(ws: &mut Workspace) {
    let feature_classes: Vec<String> = ws
        .catalog()
        .datasets
        .iter()
        .flat_map(|d| d.feature_classes.iter().map(|fc| fc.name.clone()))
        .collect();
    let tables = ws.table_names();

    for assignment in definition::DOMAIN_ASSIGNMENTS {
        let mut targets: Vec<&String> = Vec::new();
        if assignment.feature_classes {
            targets.extend(&feature_classes);
        }
        if assignment.tables {
            targets.extend(&tables);
        }
        for class in targets {
            for &field in assignment.fields {
                let has_field = ws.table_def(class).map_or(false, |def| def.has_field(field));
                if !has_field {
                    continue;
                }
                match ws.assign_domain(class, field, assignment.domain) {
                    Ok(()) => log::debug!("  Assigned {} to {}.{}", assignment.domain, class, field),
                    Err(e) => log::warn!("{}", e),
                }
            }
        }
    }
}

fn add_carto_reps(ws: &mut Workspace, wanted: impl Fn(&str) -> bool) {
    let classes: Vec<String> = ws
        .catalog()
        .datasets
        .iter()
        .flat_map(|d| d.feature_classes.iter())
        .map(|fc| fc.name.clone())
        .filter(|fc| wanted(fc))
        .collect();
    for fc in classes {
        log::info!("  Adding cartographic representations to {}", fc);
        add_fields(
            ws,
            &fc,
            vec![FieldDef::new("RuleID", FieldType::Integer, true), FieldDef::text("Override", 254, true)],
            "feature class",
        );
    }
}

fn write_readme(db: &Path) {
    let path = db.join("00readme.txt");
    if let Err(e) = fs::write(&path, format!("Geodatabase created by {}\n", VERSION_STRING)) {
        log::warn!("Failed to write {}: {}", path.display(), e);
    }
}
