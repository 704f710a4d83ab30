//! Rebuilding map-unit polygons from contacts and faults, and reconciling
//! them with label points.

pub mod conflicts;
pub mod excess;
pub mod join;
pub mod labels;

pub use conflicts::{find_conflicts, Conflicts};
pub use excess::{is_excess_contact, split_by_sides, CafPiece};
pub use join::{attribute_polygons, join_labels};
pub use labels::{labels_from_points, labels_from_polygons};

use crate::error::{MapUnitError, Result};
use crate::model::{
    field_text, id_field, ContactLine, LabelPoint, MapUnitPoly, LEFT_MAP_UNIT, MAP_UNIT,
    MULTIPLE_LABELS, RIGHT_MAP_UNIT,
};
use crate::schema::definition::GEOLOGIC_MAP;
use crate::schema::{FieldDef, FieldType, GeometryType, TableDef};
use crate::workspace::{Record, Workspace};
use crate::Polygonizer;
use geo_types::Geometry;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const MAP_UNIT_POLYS: &str = "MapUnitPolys";
pub const CONTACTS_AND_FAULTS: &str = "ContactsAndFaults";
pub const MAP_UNIT_POINTS: &str = "MapUnitPoints";

/// Everything the rebuild produces, before it is written anywhere.
#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub polygons: Vec<MapUnitPoly>,
    /// Polygon index holding each label.
    pub joins: Vec<Option<usize>>,
    pub conflicts: Conflicts,
    /// Indices of polygons without a map unit.
    pub blank: Vec<usize>,
    /// Every contact line split where its adjoining polygons change.
    pub pieces: Vec<CafPiece>,
    /// Indices into `pieces`.
    pub excess: Vec<usize>,
}

impl Reconciliation {
    /// Map unit of the polygon on one side of a piece, `None` outside the map.
    pub fn side_unit(&self, poly: Option<usize>) -> Option<&str> {
        poly.map(|p| self.polygons[p].map_unit())
    }
}

/// Rebuilds polygons from `lines` (concealed lines only split nothing),
/// attributes them from `labels` and finds conflicts, blank polygons and
/// excess contacts.
pub fn reconcile(lines: &[ContactLine], labels: &[LabelPoint], snap_grid_size: f64) -> Result<Reconciliation> {
    let mut polygonizer = Polygonizer::new();
    polygonizer.node_input = true;
    polygonizer.snap_grid_size = snap_grid_size;
    for (i, line) in lines.iter().enumerate() {
        polygonizer.add_line(i, &line.parts, line.is_concealed);
    }
    let planar = polygonizer.polygonize_with_sides()?;

    let shapes: Vec<_> = planar.polygons;
    let joins = join_labels(labels, &shapes);
    let conflicts = find_conflicts(labels, &joins);
    let polygons = attribute_polygons(shapes, labels, &joins);
    let blank = polygons
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_blank())
        .map(|(i, _)| i)
        .collect();

    let pieces = split_by_sides(&planar.segments, &planar.sides);
    let mut result = Reconciliation { polygons, joins, conflicts, blank, pieces, excess: Vec::new() };
    result.excess = result
        .pieces
        .iter()
        .enumerate()
        .filter(|(_, piece)| {
            is_excess_contact(
                &lines[piece.line],
                result.side_unit(piece.sides.left),
                result.side_unit(piece.sides.right),
            )
        })
        .map(|(i, _)| i)
        .collect();

    log::info!(
        "{} polygons from {} lines, {} labels ({} outside the map)",
        result.polygons.len(),
        lines.len(),
        labels.len(),
        result.conflicts.outside.len()
    );
    Ok(result)
}

/// Names of the diagnostic and edit layers for one MapUnitPolys class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNames {
    pub bad_labels: String,
    pub bad_polys: String,
    pub blank_polys: String,
    pub excess_contacts: String,
    pub outside_labels: String,
    pub id_caf: String,
}

impl OutputNames {
    pub fn new(mup: &str) -> Self {
        let prefix = mup.replace(MAP_UNIT_POLYS, "");
        Self {
            bad_labels: format!("errors_{}multilabels", prefix),
            bad_polys: format!("errors_{}multilabelPolys", prefix),
            blank_polys: format!("errors_{}unlabeledPolys", prefix),
            excess_contacts: format!("errors_{}excessContacts", prefix),
            outside_labels: format!("errors_{}outsideLabels", prefix),
            id_caf: format!("edit_{}CAFwithPolys", prefix),
        }
    }

    pub fn all(&self) -> [&str; 6] {
        [
            self.bad_polys.as_str(),
            self.bad_labels.as_str(),
            self.blank_polys.as_str(),
            self.excess_contacts.as_str(),
            self.outside_labels.as_str(),
            self.id_caf.as_str(),
        ]
    }
}

/// Finds the single class whose name contains `base` and ends like it.
pub fn identify_class(classes: &[String], base: &str) -> Result<String> {
    let tail = &base[base.len().saturating_sub(6)..];
    let candidates: Vec<String> = classes
        .iter()
        .filter(|c| c.contains(base) && c.ends_with(tail))
        .cloned()
        .collect();
    match candidates.as_slice() {
        [one] => Ok(one.clone()),
        _ => Err(MapUnitError::AmbiguousFeatureClass { name: base.to_string(), candidates }),
    }
}

/// `<mup>NNN`, one above the highest numbered copy already present.
pub fn next_save_name(classes: &[String], mup: &str) -> String {
    let max = classes
        .iter()
        .filter_map(|c| c.strip_prefix(mup))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:03}", mup, max + 1)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MakePolysReport {
    pub map_unit_polys: String,
    pub contacts_and_faults: String,
    /// Where the previous polygons were saved.
    pub saved_as: Option<String>,
    pub polygons: usize,
    pub bad_polys: usize,
    pub bad_labels: usize,
    pub blank_polys: usize,
    pub excess_contacts: usize,
    pub outside_labels: usize,
}

/// Rebuilds MapUnitPolys in a workspace and writes the error layers.
#[derive(Clone, Debug)]
pub struct MakePolys {
    pub workspace: PathBuf,
    pub dataset: String,
    /// Copy the current polygons to `MapUnitPolysNNN` before rebuilding.
    pub save_mups: bool,
    /// When positive, lines are snap-rounded to a grid of this size.
    pub snap_grid_size: f64,
}

impl MakePolys {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            dataset: GEOLOGIC_MAP.to_string(),
            save_mups: true,
            snap_grid_size: 0.0,
        }
    }

    pub fn run(&self) -> Result<MakePolysReport> {
        let mut ws = Workspace::open(&self.workspace)?;
        log::info!("  testing for schema lock...");
        let _lock = ws.schema_lock()?;

        log::info!("  identifying MapUnitPolys and ContactsAndFaults feature classes:");
        let classes = ws.feature_classes(&self.dataset)?;
        let mup = identify_class(&classes, MAP_UNIT_POLYS)?;
        log::info!("    {}", mup);
        let caf = identify_class(&classes, CONTACTS_AND_FAULTS)?;
        log::info!("    {}", caf);

        log::info!("  checking for _ID fields");
        let mup_def = checked_def(&ws, &mup)?;
        let caf_def = checked_def(&ws, &caf)?;

        let names = OutputNames::new(&mup);
        log::info!("  deleting output feature classes...");
        for name in names.all() {
            if ws.delete(name)? {
                log::debug!("    deleted {}", name);
            }
        }

        log::info!("  making temporary labels from existing mapunit polygons");
        let mup_id = id_field(&mup);
        let mut labels = labels_from_polygons(&ws.read_class(&mup)?, &mup_id);
        // Only points of the dataset being rebuilt label its polygons.
        if classes.iter().any(|c| c == MAP_UNIT_POINTS) {
            log::info!("  appending MapUnitPoints to temporary labels");
            labels.extend(labels_from_points(&ws.read_class(MAP_UNIT_POINTS)?, &mup_id));
        }

        let caf_id = id_field(&caf);
        let lines: Vec<ContactLine> = ws
            .read_class(&caf)?
            .iter()
            .filter_map(|r| {
                let line = ContactLine::from_record(r, &caf_id);
                if line.is_none() {
                    log::warn!("{} feature {} is not a line; skipped", caf, r.oid);
                }
                line
            })
            .collect();

        let mut saved_as = None;
        if self.save_mups {
            let name = next_save_name(&classes, &mup);
            log::info!("  saving {} to {}", mup, name);
            ws.copy(&mup, &name)?;
            saved_as = Some(name);
        }

        log::info!("  creating new {} from {} w/o concealed lines", mup, caf);
        let result = reconcile(&lines, &labels, self.snap_grid_size)?;

        let polys: Vec<Record> = result
            .polygons
            .iter()
            .map(|p| conform(p.to_record(), &mup_def))
            .collect();
        ws.write_class(&mup, &polys)?;

        log::info!("  finding mapunit polygons with conflicting label points");
        let bad_polys: Vec<Record> = result
            .conflicts
            .polygons
            .iter()
            .map(|&i| polys[i].clone().with(MULTIPLE_LABELS, "YES"))
            .collect();
        let fid_field = format!("FID_{}", mup);
        let label_record = |n: usize, i: usize| {
            let label = &labels[i];
            let record = Record {
                oid: n as i64 + 1,
                geometry: Some(Geometry::Point(label.point)),
                attributes: label.attributes.clone(),
            };
            let poly_oid = result.joins[i].map_or(-1, |p| result.polygons[p].oid);
            conform(record, &mup_def).with(&fid_field, poly_oid)
        };
        let bad_labels: Vec<Record> = result
            .conflicts
            .labels
            .iter()
            .enumerate()
            .map(|(n, &i)| label_record(n, i).with(MULTIPLE_LABELS, "YES"))
            .collect();
        let outside_labels: Vec<Record> = result
            .conflicts
            .outside
            .iter()
            .enumerate()
            .map(|(n, &i)| label_record(n, i))
            .collect();
        let blank_polys: Vec<Record> = result.blank.iter().map(|&i| polys[i].clone()).collect();

        let id_caf = caf_identity_records(&result, &lines, &caf, &mup, &caf_def);
        let excess: Vec<Record> = result.excess.iter().map(|&i| id_caf[i].clone()).collect();

        let multi_field = FieldDef::text(MULTIPLE_LABELS, 5, true);
        let mut bad_poly_def = renamed(&mup_def, &names.bad_polys);
        bad_poly_def.fields.push(multi_field.clone());
        let mut outside_label_def = renamed(&mup_def, &names.outside_labels);
        outside_label_def.geometry_type = Some(GeometryType::Point);
        outside_label_def.fields.push(FieldDef::new(&fid_field, FieldType::Integer, true));
        let mut bad_label_def = renamed(&outside_label_def, &names.bad_labels);
        bad_label_def.fields.push(multi_field);
        let id_caf_def = caf_identity_def(&caf_def, &names.id_caf, &caf, &mup);

        replace_class(&mut ws, &self.dataset, bad_poly_def, &bad_polys)?;
        replace_class(&mut ws, &self.dataset, bad_label_def, &bad_labels)?;
        replace_class(&mut ws, &self.dataset, renamed(&mup_def, &names.blank_polys), &blank_polys)?;
        replace_class(&mut ws, &self.dataset, renamed(&id_caf_def, &names.excess_contacts), &excess)?;
        replace_class(&mut ws, &self.dataset, outside_label_def, &outside_labels)?;
        replace_class(&mut ws, &self.dataset, id_caf_def, &id_caf)?;

        let report = MakePolysReport {
            map_unit_polys: mup,
            contacts_and_faults: caf,
            saved_as,
            polygons: polys.len(),
            bad_polys: bad_polys.len(),
            bad_labels: bad_labels.len(),
            blank_polys: blank_polys.len(),
            excess_contacts: excess.len(),
            outside_labels: outside_labels.len(),
        };
        for (count, name) in [
            (report.bad_polys, &names.bad_polys),
            (report.bad_labels, &names.bad_labels),
            (report.blank_polys, &names.blank_polys),
            (report.excess_contacts, &names.excess_contacts),
            (report.outside_labels, &names.outside_labels),
        ] {
            log::info!("  {} rows in {}", count, name);
        }
        Ok(report)
    }
}

fn checked_def(ws: &Workspace, class: &str) -> Result<TableDef> {
    let def = ws
        .table_def(class)
        .cloned()
        .ok_or_else(|| MapUnitError::MissingFeatureClass(class.to_string()))?;
    let id = id_field(class);
    if !def.has_field(&id) {
        return Err(MapUnitError::MissingField { table: class.to_string(), field: id });
    }
    Ok(def)
}

fn renamed(def: &TableDef, name: &str) -> TableDef {
    TableDef { name: name.to_string(), ..def.clone() }
}

/// Keeps only the fields of `def`, null-filling the missing ones.
fn conform(record: Record, def: &TableDef) -> Record {
    let mut attributes = Map::new();
    for field in &def.fields {
        let value = record.attributes.get(&field.name).cloned().unwrap_or(Value::Null);
        attributes.insert(field.name.clone(), value);
    }
    Record { attributes, ..record }
}

fn caf_identity_def(caf_def: &TableDef, name: &str, caf: &str, mup: &str) -> TableDef {
    let mut def = renamed(caf_def, name);
    def.fields.push(FieldDef::new(&format!("FID_{}", caf), FieldType::Integer, true));
    def.fields.push(FieldDef::new(&format!("LEFT_{}", mup), FieldType::Integer, true));
    def.fields.push(FieldDef::new(&format!("RIGHT_{}", mup), FieldType::Integer, true));
    def.fields.push(FieldDef::text(LEFT_MAP_UNIT, 10, true));
    def.fields.push(FieldDef::text(RIGHT_MAP_UNIT, 10, true));
    def
}

fn caf_identity_records(
    result: &Reconciliation,
    lines: &[ContactLine],
    caf: &str,
    mup: &str,
    caf_def: &TableDef,
) -> Vec<Record> {
    let poly_oid = |p: Option<usize>| p.map_or(-1, |p| result.polygons[p].oid);
    let unit = |p: Option<usize>| {
        p.and_then(|p| field_text(&result.polygons[p].attributes, MAP_UNIT))
            .map_or(Value::Null, Value::from)
    };
    result
        .pieces
        .iter()
        .enumerate()
        .map(|(n, piece)| {
            let line = &lines[piece.line];
            let record = Record {
                oid: n as i64 + 1,
                geometry: Some(Geometry::LineString(piece.geometry.clone())),
                attributes: line.attributes.clone(),
            };
            conform(record, caf_def)
                .with(&format!("FID_{}", caf), line.oid)
                .with(&format!("LEFT_{}", mup), poly_oid(piece.sides.left))
                .with(&format!("RIGHT_{}", mup), poly_oid(piece.sides.right))
                .with(LEFT_MAP_UNIT, unit(piece.sides.left))
                .with(RIGHT_MAP_UNIT, unit(piece.sides.right))
        })
        .collect()
}

fn replace_class(ws: &mut Workspace, dataset: &str, def: TableDef, records: &[Record]) -> Result<()> {
    let name = def.name.clone();
    ws.delete(&name)?;
    ws.create_feature_class(dataset, def)?;
    ws.write_class(&name, records)
}
