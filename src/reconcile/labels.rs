use crate::model::{LabelOrigin, LabelPoint, OBJECTID};
use crate::utils::parallel::map_collect;
use crate::workspace::Record;
use geo::InteriorPoint;
use geo_types::{Geometry, Point};

fn interior_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    match geometry {
        Geometry::Polygon(p) => p.interior_point(),
        Geometry::MultiPolygon(mp) => mp.interior_point(),
        Geometry::Point(p) => Some(*p),
        _ => None,
    }
}

fn strip_oid(record: &Record) -> serde_json::Map<String, serde_json::Value> {
    let mut attributes = record.attributes.clone();
    attributes.remove(OBJECTID);
    attributes
}

/// One label per existing polygon, placed at a point guaranteed to lie
/// inside it. Polygons with a blank or null map unit make no label.
pub fn labels_from_polygons(records: &[Record], source_id_field: &str) -> Vec<LabelPoint> {
    let points = map_collect(records, |r| r.geometry.as_ref().and_then(interior_point));

    records
        .iter()
        .zip(points)
        .filter_map(|(record, point)| {
            let Some(point) = point else {
                log::warn!("polygon {} has no interior point; it makes no label", record.oid);
                return None;
            };
            let label = LabelPoint::new(point, LabelOrigin::Polygon(record.oid), strip_oid(record), source_id_field);
            if label.map_unit().is_empty() {
                return None;
            }
            Some(label)
        })
        .collect()
}

/// Labels from digitized MapUnitPoints features, kept even when blank.
pub fn labels_from_points(records: &[Record], source_id_field: &str) -> Vec<LabelPoint> {
    records
        .iter()
        .filter_map(|record| match &record.geometry {
            Some(Geometry::Point(p)) => Some(LabelPoint::new(
                *p,
                LabelOrigin::MapUnitPoint(record.oid),
                strip_oid(record),
                source_id_field,
            )),
            Some(Geometry::MultiPoint(mp)) if mp.0.len() == 1 => Some(LabelPoint::new(
                mp.0[0],
                LabelOrigin::MapUnitPoint(record.oid),
                strip_oid(record),
                source_id_field,
            )),
            _ => {
                log::warn!("map unit point {} has no point geometry; skipped", record.oid);
                None
            }
        })
        .collect()
}
