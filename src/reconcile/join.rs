use crate::model::{LabelPoint, MapUnitPoly, MAP_UNIT, OBJECTID};
use crate::polygonizer::{index_polygons, locate_point};
use crate::utils::parallel::map_collect;
use geo_types::Polygon;
use serde_json::{Map, Value};

/// For each label, the index of the polygon holding it. A label on a
/// shared boundary goes to the lower index.
pub fn join_labels(labels: &[LabelPoint], polygons: &[Polygon<f64>]) -> Vec<Option<usize>> {
    let tree = index_polygons(polygons);
    map_collect(labels, |label| locate_point(&tree, label.point))
}

/// Gives every polygon the attributes of the first label it holds.
/// Polygons holding no label get a blank `MapUnit` and nothing else.
pub fn attribute_polygons(
    polygons: Vec<Polygon<f64>>,
    labels: &[LabelPoint],
    joins: &[Option<usize>],
) -> Vec<MapUnitPoly> {
    let mut first_label: Vec<Option<usize>> = vec![None; polygons.len()];
    for (label_idx, joined) in joins.iter().enumerate() {
        if let Some(poly_idx) = *joined {
            first_label[poly_idx].get_or_insert(label_idx);
        }
    }

    polygons
        .into_iter()
        .zip(first_label)
        .enumerate()
        .map(|(i, (polygon, label))| {
            let attributes = match label {
                Some(label_idx) => {
                    let mut attributes = labels[label_idx].attributes.clone();
                    attributes.remove(OBJECTID);
                    attributes
                }
                None => {
                    let mut attributes = Map::new();
                    attributes.insert(MAP_UNIT.to_string(), Value::from(""));
                    attributes
                }
            };
            MapUnitPoly { oid: i as i64 + 1, polygon, label, attributes }
        })
        .collect()
}
