//! Flattening of reference tables into the simple export layers.

use crate::model::{DATA_SOURCE_ID, MAP_UNIT, OBJECTID, TYPE};
use crate::schema::{FieldDef, TableDef};
use crate::workspace::Record;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const STD_LITH: &str = "StdLith";
pub const DEFINITION: &str = "Definition";
const STD_LITH_LENGTH: usize = 255;

/// Rough fraction of a unit each proportion term stands for, used to rank
/// lithologies that carry no numeric proportion.
pub fn equivalent_fraction(term: &str) -> Option<f64> {
    let fraction = match term {
        "all" | "only part" => 1.0,
        "dominant" => 0.6,
        "major" => 0.5,
        "significant" => 0.4,
        "subordinate" => 0.3,
        "minor" => 0.25,
        "trace" => 0.05,
        "rare" => 0.02,
        "variable" => 0.01,
        "present" => 0.0,
        _ => return None,
    };
    Some(fraction)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LithologyPart {
    /// Proportion used for ranking.
    pub rank: f64,
    pub part_type: String,
    pub lithology: String,
    pub proportion_term: String,
    pub proportion_value: Option<f64>,
}

impl LithologyPart {
    pub fn from_record(record: &Record) -> Self {
        let proportion_term = record.text("ProportionTerm");
        let proportion_value = record.get_f64("ProportionValue");
        let rank = proportion_value
            .or_else(|| equivalent_fraction(&proportion_term))
            .unwrap_or(0.0);
        Self {
            rank,
            part_type: record.text("PartType"),
            lithology: record.text("Lithology"),
            proportion_term,
            proportion_value,
        }
    }

    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.rank
            .partial_cmp(&other.rank)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.part_type.cmp(&other.part_type))
            .then_with(|| self.lithology.cmp(&other.lithology))
            .then_with(|| self.proportion_term.cmp(&other.proportion_term))
    }
}

fn format_proportion(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// `term:lithology; term:lithology`, most abundant first. Parts without a
/// proportion term show their proportion value instead.
pub fn describe_unit(mut parts: Vec<LithologyPart>) -> String {
    parts.sort_by(|a, b| b.cmp_rank(a));
    parts
        .iter()
        .map(|p| {
            let amount = if p.proportion_term.is_empty() {
                format_proportion(p.proportion_value.unwrap_or(p.rank))
            } else {
                p.proportion_term.clone()
            };
            format!("{}:{}", amount, p.lithology)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Standard-lithology summary per map unit.
pub fn std_lith_dictionary(records: &[Record]) -> BTreeMap<String, String> {
    let mut by_unit: BTreeMap<String, Vec<LithologyPart>> = BTreeMap::new();
    for record in records {
        by_unit
            .entry(record.text(MAP_UNIT))
            .or_default()
            .push(LithologyPart::from_record(record));
    }
    by_unit
        .into_iter()
        .map(|(unit, parts)| (unit, describe_unit(parts)))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// First row per key value; later duplicates are ignored.
fn index_by<'a>(records: &'a [Record], key: &str) -> HashMap<String, &'a Record> {
    let mut index = HashMap::new();
    for record in records {
        if let Some(k) = record.get(key) {
            let k = match k {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            index.entry(k).or_insert(record);
        }
    }
    index
}

/// Appends the fields of a joined table, renaming any that collide with
/// an existing name to `<name>_1`. Returns (source name, output name).
fn join_fields(out: &mut TableDef, joined: &TableDef, skip: &[&str]) -> Vec<(String, String)> {
    let mut mapping = Vec::new();
    for field in &joined.fields {
        if skip.contains(&field.name.as_str()) {
            continue;
        }
        let mut name = field.name.clone();
        if out.has_field(&name) {
            name = format!("{}_1", name);
        }
        out.fields.push(FieldDef { name: name.clone(), ..field.clone() });
        mapping.push((field.name.clone(), name));
    }
    mapping
}

fn copy_joined(target: &mut Map<String, Value>, source: Option<&Record>, mapping: &[(String, String)]) {
    for (from, to) in mapping {
        let value = source
            .and_then(|r| r.attributes.get(from))
            .cloned()
            .unwrap_or(Value::Null);
        target.insert(to.clone(), value);
    }
}

/// Reference tables for the simple export.
pub struct ReferenceTables<'a> {
    pub dmu: Option<(&'a TableDef, &'a [Record])>,
    pub data_sources: Option<(&'a TableDef, &'a [Record])>,
    pub glossary: Option<&'a [Record]>,
    pub std_lith: Option<&'a BTreeMap<String, String>>,
}

/// MapUnitPolys with its DescriptionOfMapUnits row (and standard
/// lithology summary) and its DataSources row folded into each feature.
pub fn join_map_unit_polys(
    mup_def: &TableDef,
    mup: &[Record],
    refs: &ReferenceTables<'_>,
) -> (TableDef, Vec<Record>) {
    let mut def = TableDef {
        name: mup_def.name.clone(),
        geometry_type: mup_def.geometry_type,
        fields: mup_def.fields.iter().filter(|f| f.name != DATA_SOURCE_ID).cloned().collect(),
    };

    let dmu_mapping = refs.dmu.map(|(dmu_def, _)| {
        let dmu_id = format!("{}_ID", dmu_def.name);
        join_fields(&mut def, dmu_def, &[MAP_UNIT, "Label", OBJECTID, dmu_id.as_str(), "DefinitionSourceID"])
    });
    if refs.std_lith.is_some() && refs.dmu.is_some() {
        def.fields.push(FieldDef::text(STD_LITH, STD_LITH_LENGTH as u32, true));
    }
    let ds_mapping = refs.data_sources.map(|(ds_def, _)| {
        let ds_id = format!("{}_ID", ds_def.name);
        join_fields(&mut def, ds_def, &[OBJECTID, ds_id.as_str(), "DefinitionSourceID"])
    });

    let dmu_index = refs.dmu.map(|(_, rows)| index_by(rows, MAP_UNIT));
    let ds_index = refs.data_sources.map(|(ds_def, rows)| index_by(rows, &format!("{}_ID", ds_def.name)));

    let records = mup
        .iter()
        .map(|poly| {
            let mut attributes = poly.attributes.clone();
            attributes.remove(DATA_SOURCE_ID);
            let unit = poly.text(MAP_UNIT);

            if let (Some(mapping), Some(index)) = (&dmu_mapping, &dmu_index) {
                let row = index.get(&unit).copied();
                copy_joined(&mut attributes, row, mapping);
                if let Some(dict) = refs.std_lith {
                    let summary = row
                        .and_then(|_| dict.get(&unit))
                        .map_or(Value::Null, |s| Value::from(truncate(s, STD_LITH_LENGTH)));
                    attributes.insert(STD_LITH.to_string(), summary);
                }
            }
            if let (Some(mapping), Some(index)) = (&ds_mapping, &ds_index) {
                let row = index.get(&poly.text(DATA_SOURCE_ID)).copied();
                copy_joined(&mut attributes, row, mapping);
            }
            Record { oid: poly.oid, geometry: poly.geometry.clone(), attributes }
        })
        .collect();

    (def, records)
}

/// A point, line or DataSourcePolys class with `Definition` looked up
/// from the Glossary by `Type`, and every `*SourceID` field replaced by a
/// `*Source` field holding the DataSources text.
pub fn lines_and_points(class_def: &TableDef, records: &[Record], refs: &ReferenceTables<'_>) -> (TableDef, Vec<Record>) {
    let source_fields: Vec<String> = class_def
        .fields
        .iter()
        .filter(|f| f.name.ends_with("SourceID"))
        .map(|f| f.name.clone())
        .collect();
    let has_type = class_def.has_field(TYPE);

    let mut def = TableDef {
        name: class_def.name.clone(),
        geometry_type: class_def.geometry_type,
        fields: class_def.fields.iter().filter(|f| !source_fields.contains(&f.name)).cloned().collect(),
    };
    if has_type {
        def.fields.push(FieldDef::text(DEFINITION, 254, true));
    }
    for field in &source_fields {
        def.fields.push(FieldDef::text(&field[..field.len() - 2], 254, true));
    }

    let glossary = refs.glossary.map(|rows| index_by(rows, "Term"));
    let sources = refs.data_sources.map(|(ds_def, rows)| index_by(rows, &format!("{}_ID", ds_def.name)));
    let lookup = |index: &Option<HashMap<String, &Record>>, key: String, field: &str| -> Value {
        index
            .as_ref()
            .and_then(|idx| idx.get(&key))
            .and_then(|r| r.get(field))
            .map_or(Value::Null, |v| match v {
                Value::String(s) => Value::from(truncate(s, 254)),
                other => other.clone(),
            })
    };

    let out = records
        .iter()
        .map(|record| {
            let mut attributes = record.attributes.clone();
            if has_type {
                attributes.insert(DEFINITION.to_string(), lookup(&glossary, record.text(TYPE), DEFINITION));
            }
            for field in &source_fields {
                let source = lookup(&sources, record.text(field), "Source");
                attributes.remove(field);
                attributes.insert(field[..field.len() - 2].to_string(), source);
            }
            Record { oid: record.oid, geometry: record.geometry.clone(), attributes }
        })
        .collect();

    (def, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::definition::table_fields;
    use crate::schema::GeometryType;

    fn part(term: &str, value: Option<f64>, lith: &str) -> LithologyPart {
        let mut r = Record::new(1, None)
            .with("ProportionTerm", term)
            .with("PartType", "Part")
            .with("Lithology", lith);
        if let Some(v) = value {
            r.set("ProportionValue", v);
        }
        LithologyPart::from_record(&r)
    }

    #[test]
    fn lithologies_rank_by_proportion() {
        let parts = vec![
            part("minor", None, "shale"),
            part("dominant", None, "sandstone"),
            part("", Some(0.3), "conglomerate"),
        ];
        assert_eq!(describe_unit(parts), "dominant:sandstone; 0.3:conglomerate; minor:shale");
    }

    #[test]
    fn whole_number_proportions_keep_a_decimal() {
        assert_eq!(describe_unit(vec![part("", Some(40.0), "basalt")]), "40.0:basalt");
    }

    #[test]
    fn dictionary_groups_by_unit() {
        let rows = vec![
            Record::new(1, None).with(MAP_UNIT, "Qal").with("ProportionTerm", "all").with("Lithology", "gravel"),
            Record::new(2, None).with(MAP_UNIT, "Tb").with("ProportionTerm", "all").with("Lithology", "basalt"),
        ];
        let dict = std_lith_dictionary(&rows);
        assert_eq!(dict["Qal"], "all:gravel");
        assert_eq!(dict["Tb"], "all:basalt");
    }

    fn table(name: &str) -> TableDef {
        TableDef { name: name.into(), geometry_type: None, fields: table_fields(name).unwrap() }
    }

    #[test]
    fn map_unit_polys_get_description_and_source() {
        let mut mup_def = table("MapUnitPolys");
        mup_def.geometry_type = Some(GeometryType::Polygon);
        let dmu_def = table("DescriptionOfMapUnits");
        let ds_def = table("DataSources");
        let mup = vec![Record::new(1, None)
            .with(MAP_UNIT, "Qal")
            .with("Label", "Qal")
            .with("Notes", "poly note")
            .with(DATA_SOURCE_ID, "DS1")];
        let dmu = vec![Record::new(1, None)
            .with(MAP_UNIT, "Qal")
            .with("Label", "Qal")
            .with("Name", "Alluvium")
            .with("DescriptionOfMapUnits_ID", "DMU1")];
        let ds = vec![Record::new(1, None)
            .with("DataSources_ID", "DS1")
            .with("Source", "Field work, 2012")
            .with("Notes", "source note")];
        let mut std_lith = BTreeMap::new();
        std_lith.insert("Qal".to_string(), "all:gravel".to_string());
        let refs = ReferenceTables {
            dmu: Some((&dmu_def, dmu.as_slice())),
            data_sources: Some((&ds_def, ds.as_slice())),
            glossary: None,
            std_lith: Some(&std_lith),
        };

        let (def, rows) = join_map_unit_polys(&mup_def, &mup, &refs);
        assert!(!def.has_field(DATA_SOURCE_ID));
        assert!(!def.has_field("DescriptionOfMapUnits_ID"));
        assert!(!def.has_field("DataSources_ID"));
        assert!(def.has_field("Notes_1"));
        let row = &rows[0];
        assert_eq!(row.text("Name"), "Alluvium");
        assert_eq!(row.text(STD_LITH), "all:gravel");
        assert_eq!(row.text("Source"), "Field work, 2012");
        assert_eq!(row.text("Notes"), "poly note");
        assert_eq!(row.text("Notes_1"), "source note");
        assert!(row.get(DATA_SOURCE_ID).is_none());
    }

    #[test]
    fn lines_get_definition_and_source_text() {
        let caf_def = table("ContactsAndFaults");
        let ds_def = table("DataSources");
        let glossary = vec![Record::new(1, None).with("Term", "contact").with(DEFINITION, "Boundary between units")];
        let ds = vec![Record::new(1, None).with("DataSources_ID", "DS1").with("Source", "This map")];
        let lines = vec![Record::new(4, None).with(TYPE, "contact").with(DATA_SOURCE_ID, "DS1")];
        let refs = ReferenceTables {
            dmu: None,
            data_sources: Some((&ds_def, ds.as_slice())),
            glossary: Some(glossary.as_slice()),
            std_lith: None,
        };

        let (def, rows) = lines_and_points(&caf_def, &lines, &refs);
        assert!(def.has_field(DEFINITION));
        assert!(def.has_field("DataSource"));
        assert!(!def.has_field(DATA_SOURCE_ID));
        assert_eq!(rows[0].text(DEFINITION), "Boundary between units");
        assert_eq!(rows[0].text("DataSource"), "This map");
        assert_eq!(rows[0].oid, 4);
    }
}
