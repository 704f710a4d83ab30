//! Static table dictionary of the NCGMP09 v1.1 database design.

use super::{CodedValue, Domain, FieldDef, FieldType, TopologyRule};
use FieldType::*;

const NO_NULLS: bool = false;
const NULLS_OK: bool = true;

/// (name, type, nullable, length). Length is ignored for non-string fields.
type Def = (&'static str, FieldType, bool, u32);

const ID: u32 = 50;
const DEFAULT_TEXT: u32 = 254;
const MEMO: u32 = 3000;

pub const GEOLOGIC_MAP: &str = "GeologicMap";
pub const CORRELATION_OF_MAP_UNITS: &str = "CorrelationOfMapUnits";

pub const POLY_CLASSES: &[&str] = &["MapUnitPolys", "DataSourcePolys", "OtherPolys"];
pub const LINE_CLASSES: &[&str] = &["ContactsAndFaults", "GeologicLines", "CartographicLines"];
pub const OPTIONAL_LINE_CLASSES: &[&str] = &["IsoValueLines"];
pub const POINT_CLASSES: &[&str] = &[
    "OrientationPoints", "GeochronPoints", "MapUnitPoints", "Stations",
    "GenericSamples", "GenericPoints",
];
pub const OPTIONAL_POINT_CLASSES: &[&str] = &["FossilPoints"];
pub const TABLES: &[&str] = &[
    "DescriptionOfMapUnits", "DataSources", "Glossary", "StandardLithology",
    "ExtendedAttributes", "GeologicEvents", "Notes", "SysInfo",
];
pub const OPTIONAL_TABLES: &[&str] = &["RepurposedSymbols"];

const MAP_UNIT_POLYS: &[Def] = &[
    ("MapUnitPolys_ID", String, NO_NULLS, ID),
    ("MapUnit", String, NO_NULLS, 10),
    ("IdentityConfidence", String, NO_NULLS, ID),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const DATA_SOURCE_POLYS: &[Def] = &[
    ("DataSourcePolys_ID", String, NO_NULLS, ID),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const OTHER_POLYS: &[Def] = &[
    ("OtherPolys_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("IdentityConfidence", String, NO_NULLS, ID),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const CONTACTS_AND_FAULTS: &[Def] = &[
    ("ContactsAndFaults_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("IsConcealed", String, NO_NULLS, 1),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("ExistenceConfidence", String, NO_NULLS, ID),
    ("IdentityConfidence", String, NO_NULLS, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Label", String, NULLS_OK, ID),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const GEOLOGIC_LINES: &[Def] = &[
    ("GeologicLines_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("ExistenceConfidence", String, NO_NULLS, ID),
    ("IdentityConfidence", String, NO_NULLS, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Label", String, NULLS_OK, ID),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const CARTOGRAPHIC_LINES: &[Def] = &[
    ("CartographicLines_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Label", String, NULLS_OK, ID),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const ISO_VALUE_LINES: &[Def] = &[
    ("IsoValueLines_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("Value", Single, NO_NULLS, 0),
    ("ValueConfidence", Single, NO_NULLS, 0),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Label", String, NULLS_OK, ID),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const ORIENTATION_POINTS: &[Def] = &[
    ("OrientationPoints_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("StationID", String, NULLS_OK, ID),
    ("Azimuth", Single, NO_NULLS, 0),
    ("Inclination", Single, NO_NULLS, 0),
    ("OrientationConfidenceDegrees", Single, NO_NULLS, 0),
    ("IdentityConfidence", String, NO_NULLS, ID),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("MapUnit", String, NULLS_OK, 10),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("LocationSourceID", String, NO_NULLS, ID),
    ("OrientationSourceID", String, NO_NULLS, ID),
];

const GEOCHRON_POINTS: &[Def] = &[
    ("GeochronPoints_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("FieldSampleID", String, NULLS_OK, ID),
    ("AlternateSampleID", String, NULLS_OK, ID),
    ("StationID", String, NULLS_OK, ID),
    ("MapUnit", String, NULLS_OK, 10),
    ("MaterialAnalyzed", String, NULLS_OK, DEFAULT_TEXT),
    ("NumericAge", Double, NO_NULLS, 0),
    ("AgePlusError", Double, NULLS_OK, 0),
    ("AgeMinusError", Double, NULLS_OK, 0),
    ("AgeUnits", String, NO_NULLS, ID),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("LocationSourceID", String, NO_NULLS, ID),
    ("AnalysisSourceID", String, NO_NULLS, ID),
];

const STATIONS: &[Def] = &[
    ("Stations_ID", String, NO_NULLS, ID),
    ("FieldID", String, NO_NULLS, ID),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("MapUnit", String, NULLS_OK, 10),
    ("LocationMethod", String, NULLS_OK, DEFAULT_TEXT),
    ("TimeDate", Date, NULLS_OK, 0),
    ("Observer", String, NULLS_OK, DEFAULT_TEXT),
    ("SignificantDimensionMeters", Single, NULLS_OK, 0),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const GENERIC_SAMPLES: &[Def] = &[
    ("GenericSamples_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("FieldSampleID", String, NULLS_OK, ID),
    ("AlternateSampleID", String, NULLS_OK, ID),
    ("StationID", String, NULLS_OK, ID),
    ("MapUnit", String, NULLS_OK, 10),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const GENERIC_POINTS: &[Def] = &[
    ("GenericPoints_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("StationID", String, NULLS_OK, ID),
    ("MapUnit", String, NULLS_OK, 10),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const FOSSIL_POINTS: &[Def] = &[
    ("FossilPoints_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("StationID", String, NULLS_OK, ID),
    ("MapUnit", String, NULLS_OK, 10),
    ("FossilForms", String, NULLS_OK, DEFAULT_TEXT),
    ("FossilAge", String, NULLS_OK, DEFAULT_TEXT),
    ("LocationConfidenceMeters", Single, NO_NULLS, 0),
    ("PlotAtScale", Single, NO_NULLS, 0),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const CMU_MAP_UNIT_POLYS: &[Def] = &[
    ("CMUMapUnitPolys_ID", String, NO_NULLS, ID),
    ("MapUnit", String, NO_NULLS, 10),
    ("Label", String, NULLS_OK, ID),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
];

const CMU_LINES: &[Def] = &[
    ("CMULines_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
];

const CMU_POINTS: &[Def] = &[
    ("CMUPoints_ID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("Symbol", String, NULLS_OK, DEFAULT_TEXT),
];

const DESCRIPTION_OF_MAP_UNITS: &[Def] = &[
    ("DescriptionOfMapUnits_ID", String, NO_NULLS, ID),
    ("MapUnit", String, NULLS_OK, 10),
    ("Label", String, NULLS_OK, ID),
    ("Name", String, NULLS_OK, DEFAULT_TEXT),
    ("FullName", String, NULLS_OK, DEFAULT_TEXT),
    ("Age", String, NULLS_OK, DEFAULT_TEXT),
    ("Description", String, NULLS_OK, MEMO),
    ("HierarchyKey", String, NO_NULLS, ID),
    ("ParagraphStyle", String, NO_NULLS, ID),
    ("AreaFillRGB", String, NULLS_OK, ID),
    ("AreaFillPatternDescription", String, NULLS_OK, DEFAULT_TEXT),
    ("DescriptionSourceID", String, NULLS_OK, ID),
    ("GeneralLithologyTerm", String, NULLS_OK, DEFAULT_TEXT),
    ("GeneralLithologyConfidence", String, NULLS_OK, ID),
];

const DATA_SOURCES: &[Def] = &[
    ("DataSources_ID", String, NO_NULLS, ID),
    ("Source", String, NO_NULLS, 500),
    ("Notes", String, NULLS_OK, MEMO),
];

const GLOSSARY: &[Def] = &[
    ("Glossary_ID", String, NO_NULLS, ID),
    ("Term", String, NO_NULLS, DEFAULT_TEXT),
    ("Definition", String, NO_NULLS, 255),
    ("DefinitionSourceID", String, NO_NULLS, ID),
];

const STANDARD_LITHOLOGY: &[Def] = &[
    ("StandardLithology_ID", String, NO_NULLS, ID),
    ("MapUnit", String, NO_NULLS, 10),
    ("PartType", String, NO_NULLS, DEFAULT_TEXT),
    ("Lithology", String, NO_NULLS, DEFAULT_TEXT),
    ("ProportionTerm", String, NULLS_OK, DEFAULT_TEXT),
    ("ProportionValue", Single, NULLS_OK, 0),
    ("ScientificConfidence", String, NO_NULLS, ID),
    ("DataSourceID", String, NO_NULLS, ID),
];

const EXTENDED_ATTRIBUTES: &[Def] = &[
    ("ExtendedAttributes_ID", String, NO_NULLS, ID),
    ("OwnerTable", String, NO_NULLS, DEFAULT_TEXT),
    ("OwnerID", String, NO_NULLS, ID),
    ("Property", String, NO_NULLS, DEFAULT_TEXT),
    ("PropertyValue", String, NULLS_OK, DEFAULT_TEXT),
    ("ValueLinkID", String, NULLS_OK, ID),
    ("Qualifier", String, NULLS_OK, DEFAULT_TEXT),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const GEOLOGIC_EVENTS: &[Def] = &[
    ("GeologicEvents_ID", String, NO_NULLS, ID),
    ("Event", String, NO_NULLS, DEFAULT_TEXT),
    ("AgeDisplay", String, NO_NULLS, DEFAULT_TEXT),
    ("AgeYoungerTerm", String, NULLS_OK, DEFAULT_TEXT),
    ("AgeOlderTerm", String, NULLS_OK, DEFAULT_TEXT),
    ("TimeScale", String, NULLS_OK, DEFAULT_TEXT),
    ("AgeYoungerValue", Double, NULLS_OK, 0),
    ("AgeOlderValue", Double, NULLS_OK, 0),
    ("Notes", String, NULLS_OK, DEFAULT_TEXT),
    ("DataSourceID", String, NO_NULLS, ID),
];

const NOTES: &[Def] = &[
    ("Notes_ID", String, NO_NULLS, ID),
    ("OwnerID", String, NO_NULLS, ID),
    ("Type", String, NO_NULLS, DEFAULT_TEXT),
    ("Note", String, NO_NULLS, MEMO),
    ("DataSourceID", String, NO_NULLS, ID),
];

const SYS_INFO: &[Def] = &[
    ("SysInfo_ID", String, NO_NULLS, ID),
    ("Sub", String, NO_NULLS, DEFAULT_TEXT),
    ("Pred", String, NO_NULLS, DEFAULT_TEXT),
    ("Obj", String, NO_NULLS, MEMO),
];

const REPURPOSED_SYMBOLS: &[Def] = &[
    ("RepurposedSymbols_ID", String, NO_NULLS, ID),
    ("FgdcIdentifier", String, NO_NULLS, ID),
    ("OldExplanation", String, NO_NULLS, DEFAULT_TEXT),
    ("NewExplanation", String, NO_NULLS, DEFAULT_TEXT),
    ("DefinitionSourceID", String, NO_NULLS, ID),
];

fn defs(name: &str) -> Option<&'static [Def]> {
    let defs = match name {
        "MapUnitPolys" | "MapUnitPoints" => MAP_UNIT_POLYS,
        "DataSourcePolys" => DATA_SOURCE_POLYS,
        "OtherPolys" => OTHER_POLYS,
        "ContactsAndFaults" => CONTACTS_AND_FAULTS,
        "GeologicLines" => GEOLOGIC_LINES,
        "CartographicLines" => CARTOGRAPHIC_LINES,
        "IsoValueLines" => ISO_VALUE_LINES,
        "OrientationPoints" => ORIENTATION_POINTS,
        "GeochronPoints" => GEOCHRON_POINTS,
        "Stations" => STATIONS,
        "GenericSamples" => GENERIC_SAMPLES,
        "GenericPoints" => GENERIC_POINTS,
        "FossilPoints" => FOSSIL_POINTS,
        "CMUMapUnitPolys" => CMU_MAP_UNIT_POLYS,
        "CMULines" => CMU_LINES,
        "CMUPoints" => CMU_POINTS,
        "DescriptionOfMapUnits" => DESCRIPTION_OF_MAP_UNITS,
        "DataSources" => DATA_SOURCES,
        "Glossary" => GLOSSARY,
        "StandardLithology" => STANDARD_LITHOLOGY,
        "ExtendedAttributes" => EXTENDED_ATTRIBUTES,
        "GeologicEvents" => GEOLOGIC_EVENTS,
        "Notes" => NOTES,
        "SysInfo" => SYS_INFO,
        "RepurposedSymbols" => REPURPOSED_SYMBOLS,
        _ => return None,
    };
    Some(defs)
}

/// Field definitions for a standard table or feature class, in schema order.
pub fn table_fields(name: &str) -> Option<Vec<FieldDef>> {
    defs(name).map(|defs| {
        defs.iter()
            .map(|&(field, field_type, nullable, length)| match field_type {
                String => FieldDef::text(field, length, nullable),
                other => FieldDef::new(field, other, nullable),
            })
            .collect()
    })
}

fn coded(values: &[(&str, &str)]) -> Vec<CodedValue> {
    values.iter()
        .map(|(code, name)| CodedValue { code: code.to_string(), name: name.to_string() })
        .collect()
}

/// The coded-value domains every new database starts with.
pub fn domains() -> Vec<Domain> {
    let domain = |name: &str, description: &str, values: &[(&str, &str)]| Domain {
        name: name.to_string(),
        description: description.to_string(),
        field_type: String,
        coded_values: coded(values),
    };
    vec![
        domain("d_Confidence", "Confidence Terms", &[
            ("certain", "certain"),
            ("questionable", "questionable"),
            ("unspecified", "unspecified"),
        ]),
        domain("d_DataSources", "Data Sources", &[]),
        domain("d_StationIDs", "Station Identifiers", &[]),
        domain("d_YesNo", "Yes and No", &[("Y", "yes"), ("N", "no")]),
    ]
}

/// Which domain governs which field names, split by where the field lives.
pub struct DomainAssignment {
    pub domain: &'static str,
    pub fields: &'static [&'static str],
    pub feature_classes: bool,
    pub tables: bool,
}

pub const DOMAIN_ASSIGNMENTS: &[DomainAssignment] = &[
    DomainAssignment {
        domain: "d_Confidence",
        fields: &["ExistenceConfidence", "IdentityConfidence"],
        feature_classes: true,
        tables: false,
    },
    DomainAssignment {
        domain: "d_DataSources",
        fields: &["DataSourceID"],
        feature_classes: true,
        tables: false,
    },
    DomainAssignment {
        domain: "d_DataSources",
        fields: &["DataSourceID", "DescriptionSourceID", "DataSources_ID"],
        feature_classes: false,
        tables: true,
    },
    DomainAssignment {
        domain: "d_StationIDs",
        fields: &["StationID"],
        feature_classes: true,
        tables: false,
    },
    DomainAssignment {
        domain: "d_YesNo",
        fields: &["IsConcealed"],
        feature_classes: true,
        tables: false,
    },
];

pub const TOPOLOGY_NAME: &str = "GeologicMapTopology";

/// Rules registered on the GeologicMap topology.
pub fn topology_rules() -> Vec<TopologyRule> {
    let rule = |rule: &str, origin: &str, destination: Option<&str>| TopologyRule {
        rule: rule.to_string(),
        origin: origin.to_string(),
        destination: destination.map(str::to_string),
    };
    vec![
        rule("Must Not Overlap (Line)", "ContactsAndFaults", None),
        rule("Must Not Self-Intersect (Line)", "ContactsAndFaults", None),
        rule("Must Not Have Dangles (Line)", "ContactsAndFaults", None),
        rule("Must Not Overlap (Area)", "MapUnitPolys", None),
        rule("Must Not Have Gaps (Area)", "MapUnitPolys", None),
        rule("Boundary Must Be Covered By (Area-Line)", "MapUnitPolys", Some("ContactsAndFaults")),
    ]
}
