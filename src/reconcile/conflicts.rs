use crate::model::LabelPoint;

/// Polygons holding labels that disagree, and those labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conflicts {
    /// Ascending polygon indices.
    pub polygons: Vec<usize>,
    /// Ascending indices of every label inside a conflicting polygon.
    pub labels: Vec<usize>,
    /// Labels that fall outside every polygon.
    pub outside: Vec<usize>,
}

impl Conflicts {
    pub fn is_polygon_flagged(&self, poly_idx: usize) -> bool {
        self.polygons.binary_search(&poly_idx).is_ok()
    }
}

/// Groups labels by the polygon holding them and flags any polygon where a
/// label's attribute tuple differs from the first label of its group.
pub fn find_conflicts(labels: &[LabelPoint], joins: &[Option<usize>]) -> Conflicts {
    let mut joined: Vec<(usize, usize)> = Vec::with_capacity(joins.len());
    let mut outside = Vec::new();
    for (label_idx, poly) in joins.iter().enumerate() {
        match poly {
            Some(poly_idx) => joined.push((*poly_idx, label_idx)),
            None => outside.push(label_idx),
        }
    }
    for &label_idx in &outside {
        log::warn!(
            "label {:?} ({}) lies outside every polygon",
            labels[label_idx].origin,
            labels[label_idx].map_unit()
        );
    }

    // Stable, so each group keeps label order.
    joined.sort_by_key(|&(poly_idx, _)| poly_idx);

    let mut polygons: Vec<usize> = Vec::new();
    let mut group_first: Option<(usize, usize)> = None;
    for &(poly_idx, label_idx) in &joined {
        match group_first {
            Some((last_poly, first_label)) if last_poly == poly_idx => {
                if labels[label_idx].key != labels[first_label].key && polygons.last() != Some(&poly_idx) {
                    polygons.push(poly_idx);
                }
            }
            _ => group_first = Some((poly_idx, label_idx)),
        }
    }

    let mut flagged_labels: Vec<usize> = joined
        .iter()
        .filter(|(poly_idx, _)| polygons.binary_search(poly_idx).is_ok())
        .map(|&(_, label_idx)| label_idx)
        .collect();
    flagged_labels.sort_unstable();

    Conflicts { polygons, labels: flagged_labels, outside }
}
