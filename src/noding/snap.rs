use super::{dedup_segments, IndexedLine, TaggedSegment};
use crate::utils::dist2;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};
use rstar::RTree;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Snap-rounding noder: every coordinate, including computed intersection
/// points, is rounded to `grid_size`, and noding repeats until no new splits
/// appear or `max_iter` passes have run.
pub struct SnapNoder {
    pub grid_size: f64,
    pub max_iter: usize,
}

impl SnapNoder {
    pub fn new(grid_size: f64) -> Self {
        Self { grid_size, max_iter: 10 }
    }

    pub fn node(&self, mut segments: Vec<TaggedSegment>) -> Vec<TaggedSegment> {
        // 1. Initial Snap of endpoints
        for s in &mut segments {
            s.line.start = self.snap(s.line.start);
            s.line.end = self.snap(s.line.end);
        }
        // Also drops collapsed segments; a pass with no splits never dedups.
        let mut segments = dedup_segments(segments);

        // 2. Iterative Noding
        for pass in 0..self.max_iter {
            let split_map = self.find_splits(&segments);
            if split_map.is_empty() {
                log::debug!("snap noding converged after {} passes", pass);
                break;
            }

            let mut next = Vec::with_capacity(segments.len() * 2);
            for (i, s) in segments.iter().enumerate() {
                let Some(splits) = split_map.get(&i) else {
                    next.push(*s);
                    continue;
                };

                let start = s.line.start;
                let mut points = splits.clone();
                points.push(s.line.end);
                points.sort_by(|a, b| {
                    dist2(*a, start).partial_cmp(&dist2(*b, start)).unwrap_or(Ordering::Equal)
                });
                points.dedup();

                let mut curr = start;
                for p in points {
                    if p != curr {
                        next.push(TaggedSegment::new(Line::new(curr, p), s.tag));
                        curr = p;
                    }
                }
            }

            segments = dedup_segments(next);
        }

        segments
    }

    fn snap(&self, c: Coord<f64>) -> Coord<f64> {
        if self.grid_size == 0.0 { return c; }
        Coord {
            x: (c.x / self.grid_size).round() * self.grid_size,
            y: (c.y / self.grid_size).round() * self.grid_size,
        }
    }

    fn find_splits(&self, segments: &[TaggedSegment]) -> HashMap<usize, Vec<Coord<f64>>> {
        let mut splits: HashMap<usize, Vec<Coord<f64>>> = HashMap::new();

        let indexed: Vec<IndexedLine> = segments.iter().enumerate()
            .map(|(i, s)| IndexedLine { line: s.line, index: i })
            .collect();
        let tree = RTree::bulk_load(indexed);

        for (c1, c2) in tree.intersection_candidates_with_other_tree(&tree) {
            let i = c1.index;
            let j = c2.index;
            if i >= j { continue; }

            let l1 = c1.line;
            let l2 = c2.line;

            let mut push = |idx: usize, line: Line<f64>, p: Coord<f64>| {
                if p != line.start && p != line.end {
                    splits.entry(idx).or_default().push(p);
                }
            };

            match line_intersection(l1, l2) {
                Some(LineIntersection::SinglePoint { intersection: pt, .. }) => {
                    let snapped = self.snap(pt);
                    push(i, l1, snapped);
                    push(j, l2, snapped);
                },
                Some(LineIntersection::Collinear { intersection: overlap }) => {
                    for p in [self.snap(overlap.start), self.snap(overlap.end)] {
                        push(i, l1, p);
                        push(j, l2, p);
                    }
                },
                None => {}
            }
        }

        splits
    }
}
