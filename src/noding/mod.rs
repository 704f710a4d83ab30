pub mod snap;

pub use snap::SnapNoder;

use crate::utils::dist2;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};
use rstar::{RTree, RTreeObject, AABB};
use std::cmp::Ordering;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where a noded segment came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentTag {
    /// Index of the source line in the caller's input.
    pub line: usize,
    /// Index of the vertex pair within the source line (parts concatenated).
    pub part: usize,
    /// Concealed segments are noded with the network but never bound a face.
    pub concealed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct TaggedSegment {
    pub line: Line<f64>,
    pub tag: SegmentTag,
}

impl TaggedSegment {
    pub fn new(line: Line<f64>, tag: SegmentTag) -> Self {
        Self { line, tag }
    }
}

// Wrapper for Line to be indexable by rstar
#[derive(Clone, Copy, Debug)]
pub(crate) struct IndexedLine {
    pub(crate) line: Line<f64>,
    pub(crate) index: usize,
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let p1 = self.line.start;
        let p2 = self.line.end;
        AABB::from_corners(
            [p1.x.min(p2.x), p1.y.min(p2.y)],
            [p1.x.max(p2.x), p1.y.max(p2.y)],
        )
    }
}

/// Splits every segment at its intersections with every other segment.
///
/// Sub-segments keep the tag and direction of their parent and are emitted in
/// order along it, so the output stays ordered by `(line, part)` when the
/// input is. Exact duplicates (either direction, same concealment) keep only
/// their first occurrence.
pub fn node_segments(segments: Vec<TaggedSegment>, tol: f64) -> Vec<TaggedSegment> {
    let tol2 = tol * tol;

    // 1. Build Index
    let indexed: Vec<IndexedLine> = segments
        .iter()
        .enumerate()
        .map(|(i, s)| IndexedLine { line: s.line, index: i })
        .collect();
    let tree = RTree::bulk_load(indexed);

    // 2. Find ALL intersection events as (segment_index, split_point)
    let process_intersection = |acc: &mut Vec<(usize, Coord<f64>)>, cand1: &IndexedLine, cand2: &IndexedLine| {
        let idx1 = cand1.index;
        let idx2 = cand2.index;

        // only process unique pairs
        if idx1 >= idx2 { return; }

        let s1 = cand1.line;
        let s2 = cand2.line;

        let Some(res) = line_intersection(s1, s2) else {
            return;
        };

        let is_internal = |s: Line<f64>, p: Coord<f64>| {
            dist2(p, s.start) > tol2 && dist2(p, s.end) > tol2
        };

        match res {
            LineIntersection::SinglePoint { intersection: pt, .. } => {
                if is_internal(s1, pt) { acc.push((idx1, pt)); }
                if is_internal(s2, pt) { acc.push((idx2, pt)); }
            },
            LineIntersection::Collinear { intersection: overlap } => {
                for p in [overlap.start, overlap.end] {
                    if is_internal(s1, p) { acc.push((idx1, p)); }
                    if is_internal(s2, p) { acc.push((idx2, p)); }
                }
            }
        }
    };

    #[cfg(feature = "parallel")]
    let mut events: Vec<(usize, Coord<f64>)> = tree
        .intersection_candidates_with_other_tree(&tree)
        .par_bridge()
        .fold(Vec::new, |mut acc, (cand1, cand2)| {
            process_intersection(&mut acc, cand1, cand2);
            acc
        })
        .reduce(Vec::new, |mut a, mut b| {
            a.append(&mut b);
            a
        });

    #[cfg(not(feature = "parallel"))]
    let mut events: Vec<(usize, Coord<f64>)> = tree
        .intersection_candidates_with_other_tree(&tree)
        .fold(Vec::new(), |mut acc, (cand1, cand2)| {
            process_intersection(&mut acc, cand1, cand2);
            acc
        });

    log::debug!("noding {} segments, {} split events", segments.len(), events.len());

    // 3. Apply splits, segment by segment
    events.sort_by(|a, b| a.0.cmp(&b.0));

    let mut noded = Vec::with_capacity(segments.len() + events.len());
    let mut event_idx = 0;
    for (seg_idx, segment) in segments.iter().enumerate() {
        let mut points_on_seg = Vec::new();
        while event_idx < events.len() && events[event_idx].0 == seg_idx {
            points_on_seg.push(events[event_idx].1);
            event_idx += 1;
        }

        if points_on_seg.is_empty() {
            noded.push(*segment);
            continue;
        }

        let start = segment.line.start;
        points_on_seg.sort_by(|a, b| {
            dist2(*a, start).partial_cmp(&dist2(*b, start)).unwrap_or(Ordering::Equal)
        });
        points_on_seg.dedup_by(|a, b| dist2(*a, *b) <= tol2);

        let mut curr = start;
        for pt in points_on_seg {
            if dist2(pt, curr) > tol2 {
                noded.push(TaggedSegment::new(Line::new(curr, pt), segment.tag));
                curr = pt;
            }
        }
        if dist2(segment.line.end, curr) > tol2 {
            noded.push(TaggedSegment::new(Line::new(curr, segment.line.end), segment.tag));
        }
    }

    dedup_segments(noded)
}

/// Removes repeated segments, keeping the first occurrence and the input order.
pub fn dedup_segments(segments: Vec<TaggedSegment>) -> Vec<TaggedSegment> {
    let mut seen = HashSet::with_capacity(segments.len());
    segments
        .into_iter()
        .filter(|s| s.line.start != s.line.end)
        .filter(|s| seen.insert(segment_key(s)))
        .collect()
}

type SegmentKey = (u64, u64, u64, u64, bool);

fn segment_key(s: &TaggedSegment) -> SegmentKey {
    let (a, b) = if crate::utils::cmp_coords(&s.line.start, &s.line.end) == Ordering::Greater {
        (s.line.end, s.line.start)
    } else {
        (s.line.start, s.line.end)
    };
    (a.x.to_bits(), a.y.to_bits(), b.x.to_bits(), b.y.to_bits(), s.tag.concealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64, line: usize) -> TaggedSegment {
        TaggedSegment::new(
            Line::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }),
            SegmentTag { line, part: 0, concealed: false },
        )
    }

    #[test]
    fn crossing_segments_are_split_in_order() {
        let noded = node_segments(vec![seg(0.0, 0.0, 10.0, 0.0, 0), seg(5.0, -5.0, 5.0, 5.0, 1)], 1e-10);
        assert_eq!(noded.len(), 4);
        assert_eq!(noded[0].tag.line, 0);
        assert_relative_eq!(noded[0].line.end.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(noded[0].line.end.y, 0.0, epsilon = 1e-9);
        assert_eq!(noded[0].line.end, noded[1].line.start);
        assert_eq!(noded[1].line.end, Coord { x: 10.0, y: 0.0 });
        assert_eq!(noded[2].tag.line, 1);
        assert_eq!(noded[3].tag.line, 1);
    }

    #[test]
    fn touching_at_endpoint_is_not_split() {
        let noded = node_segments(vec![seg(0.0, 0.0, 10.0, 0.0, 0), seg(10.0, 0.0, 10.0, 10.0, 1)], 1e-10);
        assert_eq!(noded.len(), 2);
    }

    #[test]
    fn reversed_duplicate_is_dropped_but_concealed_copy_kept() {
        let mut concealed = seg(0.0, 0.0, 10.0, 0.0, 2);
        concealed.tag.concealed = true;
        let noded = node_segments(
            vec![seg(0.0, 0.0, 10.0, 0.0, 0), seg(10.0, 0.0, 0.0, 0.0, 1), concealed],
            1e-10,
        );
        assert_eq!(noded.len(), 2);
        assert_eq!(noded[0].tag.line, 0);
        assert!(noded[1].tag.concealed);
    }
}
