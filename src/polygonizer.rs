use crate::error::Result;
use crate::graph::PlanarGraph;
use crate::noding::{node_segments, SegmentTag, SnapNoder, TaggedSegment};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::{Area, Intersects, Point};
use geo_types::{Geometry, LineString, Polygon};
use rstar::{RTree, RTreeObject, AABB};

// Wrapper for Polygon to be indexable by rstar
pub(crate) struct IndexedPolygon<'a> {
    pub(crate) polygon: &'a Polygon<f64>,
    pub(crate) index: usize,
}

impl RTreeObject for IndexedPolygon<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        match self.polygon.bounding_rect() {
            Some(bbox) => AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]),
            None => AABB::from_point([f64::NAN, f64::NAN]),
        }
    }
}

/// Builds an envelope index over `polygons`, keyed by position.
pub(crate) fn index_polygons(polygons: &[Polygon<f64>]) -> RTree<IndexedPolygon<'_>> {
    RTree::bulk_load(
        polygons
            .iter()
            .enumerate()
            .filter(|(_, p)| p.bounding_rect().is_some())
            .map(|(index, polygon)| IndexedPolygon { polygon, index })
            .collect(),
    )
}

/// First polygon (by position) whose interior or boundary holds `pt`.
pub(crate) fn locate_point(tree: &RTree<IndexedPolygon<'_>>, pt: Point<f64>) -> Option<usize> {
    tree.locate_in_envelope_intersecting(&AABB::from_point([pt.x(), pt.y()]))
        .filter(|cand| cand.polygon.intersects(&pt))
        .map(|cand| cand.index)
        .min()
}

/// Polygons adjoining one noded segment. `None` is outside every polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SegmentSides {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Result of planarizing a line network.
#[derive(Clone, Debug, Default)]
pub struct Polygonization {
    pub polygons: Vec<Polygon<f64>>,
    /// The fully noded input, in input order.
    pub segments: Vec<TaggedSegment>,
    /// `sides[i]` belongs to `segments[i]`.
    pub sides: Vec<SegmentSides>,
}

pub struct Polygonizer {
    // Configuration
    /// Split input lines at their mutual intersections before building the graph.
    pub node_input: bool,
    /// When positive, node with snap rounding on a grid of this size.
    pub snap_grid_size: f64,
    /// Coordinates closer than this are treated as the same node.
    pub node_precision: f64,

    inputs: Vec<TaggedSegment>,
    next_line: usize,
}

impl Default for Polygonizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Polygonizer {
    pub fn new() -> Self {
        Self {
            node_input: false,
            snap_grid_size: 0.0,
            node_precision: 1e-9,
            inputs: Vec::new(),
            next_line: 0,
        }
    }

    /// Adds the lineal components of a geometry as a new, unconcealed line.
    pub fn add_geometry(&mut self, geom: Geometry<f64>) {
        let mut lines = Vec::new();
        extract_lines(&geom, &mut lines);
        let line_idx = self.next_line;
        self.push_parts(line_idx, &lines, false);
    }

    /// Adds a line under a caller-chosen index. Concealed lines are noded
    /// with the rest of the network and get sides, but never bound a polygon.
    pub fn add_line(&mut self, line_idx: usize, parts: &[LineString<f64>], concealed: bool) {
        self.push_parts(line_idx, parts, concealed);
    }

    fn push_parts(&mut self, line_idx: usize, parts: &[LineString<f64>], concealed: bool) {
        let mut part = 0;
        for ls in parts {
            for segment in ls.lines() {
                self.inputs.push(TaggedSegment::new(segment, SegmentTag { line: line_idx, part, concealed }));
                part += 1;
            }
        }
        self.next_line = self.next_line.max(line_idx + 1);
    }

    fn noded_segments(&self) -> Vec<TaggedSegment> {
        let inputs = self.inputs.clone();
        if !self.node_input {
            return crate::noding::dedup_segments(inputs);
        }
        if self.snap_grid_size > 0.0 {
            SnapNoder::new(self.snap_grid_size).node(inputs)
        } else {
            node_segments(inputs, 1e-10)
        }
    }

    /// Computes the polygons.
    pub fn polygonize(&mut self) -> Result<Vec<Polygon<f64>>> {
        Ok(self.polygonize_with_sides()?.polygons)
    }

    /// Computes the polygons together with the polygon on each side of every
    /// noded segment.
    pub fn polygonize_with_sides(&mut self) -> Result<Polygonization> {
        let segments = self.noded_segments();

        let mut graph = PlanarGraph::with_precision(self.node_precision);
        let mut edge_of_segment = vec![None; segments.len()];
        for (i, s) in segments.iter().enumerate() {
            if !s.tag.concealed {
                edge_of_segment[i] = graph.add_segment(s.line, i);
            }
        }

        // 1. Sort edges
        graph.sort_edges();

        // 2. Prune dangles
        let dangles = graph.prune_dangles();

        // 3. Trace faces
        let rings = graph.trace_faces();
        log::debug!(
            "polygonizing {} segments: {} nodes, {} dangles pruned, {} rings",
            segments.len(), graph.nodes.len(), dangles, rings.len()
        );

        // 4. Split rings into shells (CCW) and component boundaries (CW)
        let mut shells = Vec::new();
        let mut shell_of_ring = vec![None; rings.len()];
        let mut holes = Vec::new();
        for (ring_idx, face) in rings.iter().enumerate() {
            let poly = Polygon::new(face.ring.clone(), vec![]);
            let area = poly.signed_area();
            if area.abs() < 1e-9 {
                continue; // Degenerate
            }
            if area > 0.0 {
                shell_of_ring[ring_idx] = Some(shells.len());
                shells.push(poly);
            } else {
                holes.push((ring_idx, poly));
            }
        }

        // 5. Assign each component boundary to the smallest shell containing it
        let shell_areas: Vec<f64> = shells.iter().map(|s| s.unsigned_area()).collect();
        let mut shell_holes: Vec<Vec<LineString<f64>>> = vec![vec![]; shells.len()];
        let mut face_polygon = shell_of_ring;
        {
            let tree = index_polygons(&shells);
            for (ring_idx, hole) in &holes {
                let hole_area = hole.unsigned_area();
                let Some(probe) = hole.exterior().0.first().map(|c| Point::from(*c)) else {
                    continue;
                };

                let best = tree
                    .locate_in_envelope_intersecting(&AABB::from_point([probe.x(), probe.y()]))
                    .filter(|cand| shell_areas[cand.index] > hole_area + 1e-6)
                    .filter(|cand| cand.polygon.contains(&probe))
                    .min_by(|a, b| {
                        shell_areas[a.index]
                            .partial_cmp(&shell_areas[b.index])
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|cand| cand.index);

                if let Some(shell_idx) = best {
                    shell_holes[shell_idx].push(hole.exterior().clone());
                    face_polygon[*ring_idx] = Some(shell_idx);
                }
            }
        }

        let polygons: Vec<Polygon<f64>> = shells
            .into_iter()
            .zip(shell_holes)
            .map(|(shell, interiors)| {
                let (exterior, _) = shell.into_inner();
                Polygon::new(exterior, interiors)
            })
            .collect();

        // 6. Sides of every segment
        let tree = index_polygons(&polygons);
        let sides = segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let traced = edge_of_segment[i]
                    .map(|e| &graph.edges[e])
                    .filter(|edge| !edge.is_marked);
                match traced {
                    Some(edge) => {
                        let side = |de: usize| {
                            graph.directed_edges[de].face.and_then(|f| face_polygon[f])
                        };
                        let (fwd, bwd) = (edge.dir_edges[0], edge.dir_edges[1]);
                        SegmentSides { left: side(fwd), right: side(bwd) }
                    }
                    None => {
                        // Dangles, concealed and collapsed segments lie inside a single polygon.
                        let mid = Point::new(
                            (s.line.start.x + s.line.end.x) / 2.0,
                            (s.line.start.y + s.line.end.y) / 2.0,
                        );
                        let inside = locate_point(&tree, mid);
                        SegmentSides { left: inside, right: inside }
                    }
                }
            })
            .collect();

        Ok(Polygonization { polygons, segments, sides })
    }
}

fn extract_lines(geom: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geom {
        Geometry::Line(l) => out.push(LineString::from(*l)),
        Geometry::LineString(ls) => out.push(ls.clone()),
        Geometry::MultiLineString(mls) => {
            out.extend(mls.0.clone());
        },
        Geometry::Polygon(poly) => {
            out.push(poly.exterior().clone());
            out.extend(poly.interiors().iter().cloned());
        },
        Geometry::MultiPolygon(mpoly) => {
            for poly in mpoly {
                out.push(poly.exterior().clone());
                out.extend(poly.interiors().iter().cloned());
            }
        },
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                extract_lines(g, out);
            }
        },
        _ => {},
    }
}
