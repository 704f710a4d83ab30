use geo_types::{point, Geometry, LineString};
use mapunit_polys::workspace::Record;
use mapunit_polys::{CreateDatabase, MakePolys, MapUnitError, Workspace};
use std::path::{Path, PathBuf};

fn contact(oid: i64, coords: Vec<(f64, f64)>, concealed: &str) -> Record {
    Record::new(oid, Some(Geometry::LineString(LineString::from(coords))))
        .with("ContactsAndFaults_ID", format!("CAF{}", oid))
        .with("Type", "contact")
        .with("IsConcealed", concealed)
        .with("DataSourceID", "DS1")
}

fn label(oid: i64, x: f64, y: f64, unit: &str) -> Record {
    Record::new(oid, Some(point!(x: x, y: y).into()))
        .with("MapUnit", unit)
        .with("IdentityConfidence", "certain")
        .with("DataSourceID", "DS1")
}

/// Three boxes side by side in a 30 x 10 frame, plus a separate unlabeled
/// square. The west and middle boxes are both Qal; the east box holds two
/// disagreeing labels.
fn build_map(dir: &Path) -> PathBuf {
    let ws = CreateDatabase::new(dir, "Quad").run().unwrap();
    let lines = vec![
        contact(1, vec![(0.0, 0.0), (30.0, 0.0), (30.0, 10.0), (0.0, 10.0), (0.0, 0.0)], "N"),
        contact(2, vec![(10.0, 0.0), (10.0, 10.0)], "N"),
        contact(3, vec![(20.0, 0.0), (20.0, 10.0)], "N"),
        contact(4, vec![(5.0, 0.0), (5.0, 10.0)], "Y"),
        contact(5, vec![(40.0, 0.0), (50.0, 0.0), (50.0, 10.0), (40.0, 10.0), (40.0, 0.0)], "N"),
    ];
    ws.write_class("ContactsAndFaults", &lines).unwrap();
    let labels = vec![
        label(1, 2.5, 5.0, "Qal"),
        label(2, 15.0, 5.0, "Qal"),
        label(3, 25.0, 5.0, "Tb"),
        label(4, 27.0, 5.0, "Ts"),
    ];
    ws.write_class("MapUnitPoints", &labels).unwrap();
    ws.root().to_path_buf()
}

fn append(path: &Path, class: &str, record: Record) {
    let ws = Workspace::open(path).unwrap();
    let mut records = ws.read_class(class).unwrap();
    records.push(record);
    ws.write_class(class, &records).unwrap();
}

fn units(records: &[Record]) -> Vec<String> {
    let mut units: Vec<String> = records.iter().map(|r| r.text("MapUnit")).collect();
    units.sort();
    units
}

#[test]
fn rebuilds_polygons_and_error_layers() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());

    let report = MakePolys::new(&path).run().unwrap();
    assert_eq!(report.map_unit_polys, "MapUnitPolys");
    assert_eq!(report.contacts_and_faults, "ContactsAndFaults");
    assert_eq!(report.saved_as.as_deref(), Some("MapUnitPolys001"));
    assert_eq!(report.polygons, 4);
    assert_eq!(report.bad_polys, 1);
    assert_eq!(report.bad_labels, 2);
    assert_eq!(report.blank_polys, 1);
    assert_eq!(report.excess_contacts, 1);
    assert_eq!(report.outside_labels, 0);

    let ws = Workspace::open(&path).unwrap();
    let polys = ws.read_class("MapUnitPolys").unwrap();
    // The concealed line at x = 5 does not split the west box.
    assert_eq!(units(&polys), vec!["", "Qal", "Qal", "Tb"]);
    assert!(polys.iter().all(|p| matches!(p.geometry, Some(Geometry::Polygon(_)))));

    let bad_polys = ws.read_class("errors_multilabelPolys").unwrap();
    assert_eq!(bad_polys.len(), 1);
    assert_eq!(bad_polys[0].text("MultipleLabels"), "YES");
    assert_eq!(bad_polys[0].text("MapUnit"), "Tb");

    let bad_labels = ws.read_class("errors_multilabels").unwrap();
    assert_eq!(units(&bad_labels), vec!["Tb", "Ts"]);
    let flagged_oid = bad_polys[0].oid;
    for record in &bad_labels {
        assert_eq!(record.get_f64("FID_MapUnitPolys"), Some(flagged_oid as f64));
        assert!(matches!(record.geometry, Some(Geometry::Point(_))));
    }

    let blank = ws.read_class("errors_unlabeledPolys").unwrap();
    assert_eq!(blank.len(), 1);
    assert_eq!(blank[0].text("MapUnit"), "");

    let excess = ws.read_class("errors_excessContacts").unwrap();
    assert_eq!(excess.len(), 1);
    assert_eq!(excess[0].text("ContactsAndFaults_ID"), "CAF2");
    assert_eq!(excess[0].text("Left_MapUnit"), "Qal");
    assert_eq!(excess[0].text("Right_MapUnit"), "Qal");

    let id_caf = ws.read_class("edit_CAFwithPolys").unwrap();
    assert!(id_caf.len() >= 5);
    assert!(ws.read_class("errors_outsideLabels").unwrap().is_empty());
    let outer = id_caf
        .iter()
        .filter(|r| r.get_f64("FID_ContactsAndFaults") == Some(1.0))
        .collect::<Vec<_>>();
    assert!(!outer.is_empty());
    for piece in outer {
        let left = piece.get_f64("LEFT_MapUnitPolys").unwrap();
        let right = piece.get_f64("RIGHT_MapUnitPolys").unwrap();
        assert!((left < 0.0) != (right < 0.0), "frame piece must face the outside once");
    }

    let saved = ws.read_class("MapUnitPolys001").unwrap();
    assert!(saved.is_empty());
    assert!(!path.join(".schema.lock").exists());
}

#[test]
fn second_run_keeps_labels_from_previous_polygons() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());

    MakePolys::new(&path).run().unwrap();
    let report = MakePolys::new(&path).run().unwrap();

    assert_eq!(report.saved_as.as_deref(), Some("MapUnitPolys002"));
    assert_eq!(report.polygons, 4);
    assert_eq!(report.bad_polys, 1);
    // The old Tb polygon adds its own label to the conflicting pair.
    assert_eq!(report.bad_labels, 3);
    assert_eq!(report.blank_polys, 1);

    let ws = Workspace::open(&path).unwrap();
    assert_eq!(ws.read_class("MapUnitPolys002").unwrap().len(), 4);
    assert_eq!(units(&ws.read_class("MapUnitPolys").unwrap()), vec!["", "Qal", "Qal", "Tb"]);
}

#[test]
fn without_saving_no_copy_is_made() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());

    let mut make_polys = MakePolys::new(&path);
    make_polys.save_mups = false;
    let report = make_polys.run().unwrap();

    assert_eq!(report.saved_as, None);
    let ws = Workspace::open(&path).unwrap();
    assert!(!ws.exists("MapUnitPolys001"));
}

#[test]
fn locked_workspace_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());

    let ws = Workspace::open(&path).unwrap();
    let _lock = ws.schema_lock().unwrap();

    match MakePolys::new(&path).run() {
        Err(MapUnitError::SchemaLocked(_)) => {}
        other => panic!("expected a schema lock error, got {:?}", other.map(|r| r.polygons)),
    }
    assert!(ws.read_class("MapUnitPolys").unwrap().is_empty());
}

#[test]
fn snapped_rebuild_matches_exact_rebuild() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());

    let mut make_polys = MakePolys::new(&path);
    make_polys.snap_grid_size = 0.5;
    let report = make_polys.run().unwrap();

    assert_eq!(report.polygons, 4);
    assert_eq!(report.bad_polys, 1);
    assert_eq!(report.bad_labels, 2);
    assert_eq!(report.blank_polys, 1);
    assert_eq!(report.excess_contacts, 1);
    let ws = Workspace::open(&path).unwrap();
    assert_eq!(units(&ws.read_class("MapUnitPolys").unwrap()), vec!["", "Qal", "Qal", "Tb"]);
}

#[test]
fn duplicated_contact_does_not_break_polygons() {
    for snap in [0.0, 0.5] {
        let tmp = tempfile::tempdir().unwrap();
        let path = build_map(tmp.path());
        // Digitized twice over the west divider.
        append(&path, "ContactsAndFaults", contact(6, vec![(10.0, 0.0), (10.0, 10.0)], "N"));

        let mut make_polys = MakePolys::new(&path);
        make_polys.snap_grid_size = snap;
        let report = make_polys.run().unwrap();

        assert_eq!(report.polygons, 4, "snap grid {}", snap);
        assert_eq!(report.blank_polys, 1, "snap grid {}", snap);
        assert_eq!(report.excess_contacts, 1, "snap grid {}", snap);

        let ws = Workspace::open(&path).unwrap();
        let excess = ws.read_class("errors_excessContacts").unwrap();
        assert_eq!(excess[0].text("ContactsAndFaults_ID"), "CAF2");
        // The first copy keeps the shared segment; the second has no pieces.
        let id_caf = ws.read_class("edit_CAFwithPolys").unwrap();
        assert!(id_caf.iter().any(|r| r.get_f64("FID_ContactsAndFaults") == Some(2.0)));
        assert!(!id_caf.iter().any(|r| r.get_f64("FID_ContactsAndFaults") == Some(6.0)));
    }
}

#[test]
fn labels_outside_the_map_get_their_own_layer() {
    let tmp = tempfile::tempdir().unwrap();
    let path = build_map(tmp.path());
    append(&path, "MapUnitPoints", label(5, 35.0, 5.0, "Qs"));

    let report = MakePolys::new(&path).run().unwrap();
    assert_eq!(report.outside_labels, 1);
    assert_eq!(report.bad_labels, 2);

    let ws = Workspace::open(&path).unwrap();
    let outside = ws.read_class("errors_outsideLabels").unwrap();
    assert_eq!(outside.len(), 1);
    assert_eq!(outside[0].text("MapUnit"), "Qs");
    assert_eq!(outside[0].get_f64("FID_MapUnitPolys"), Some(-1.0));
    assert!(outside[0].get("MultipleLabels").is_none());
}

#[test]
fn cross_section_ignores_map_view_points() {
    let tmp = tempfile::tempdir().unwrap();
    let mut create = CreateDatabase::new(tmp.path(), "Quad");
    create.cross_sections = 1;
    let ws = create.run().unwrap();
    ws.write_class(
        "CSAContactsAndFaults",
        &[Record::new(1, Some(Geometry::LineString(LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]))))
        .with("CSAContactsAndFaults_ID", "CSACAF1")
        .with("Type", "contact")
        .with("IsConcealed", "N")],
    )
    .unwrap();
    // Falls inside the cross-section square, but belongs to GeologicMap.
    ws.write_class("MapUnitPoints", &[label(1, 5.0, 5.0, "GeoMapOnly")]).unwrap();
    let path = ws.root().to_path_buf();

    let mut make_polys = MakePolys::new(&path);
    make_polys.dataset = "CrossSectionA".to_string();
    let report = make_polys.run().unwrap();

    assert_eq!(report.map_unit_polys, "CSAMapUnitPolys");
    assert_eq!(report.contacts_and_faults, "CSAContactsAndFaults");
    assert_eq!(report.saved_as.as_deref(), Some("CSAMapUnitPolys001"));
    assert_eq!(report.polygons, 1);
    assert_eq!(report.blank_polys, 1);
    assert_eq!(report.outside_labels, 0);

    let ws = Workspace::open(&path).unwrap();
    assert_eq!(units(&ws.read_class("CSAMapUnitPolys").unwrap()), vec![""]);
    assert_eq!(ws.read_class("errors_CSAunlabeledPolys").unwrap().len(), 1);
    assert!(ws.read_class("MapUnitPolys").unwrap().is_empty());
}
