use crate::utils::parallel::iterate_mut;
use geo::Line;
use geo_types::{Coord, LineString};
use smallvec::SmallVec;
use std::collections::HashMap;

// Type aliases for indices to ensure we don't mix them up
pub type NodeId = usize;
pub type EdgeId = usize;
pub type DirEdgeId = usize;
pub type FaceId = usize;

#[derive(Clone, Debug)]
pub struct Node {
    pub coordinate: Coord<f64>,
    /// Indices of outgoing DirectedEdges.
    /// Sorted by polar angle (CCW) once `sort_edges` has run.
    pub outgoing_edges: SmallVec<[DirEdgeId; 4]>,
    /// Live degree, decremented while pruning dangles.
    pub degree: usize,
    /// Removed as a dangle end.
    pub is_marked: bool,
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub line: Line<f64>,
    /// Index of the input segment this edge was built from.
    pub segment: usize,
    /// `[forward, backward]` with forward running from `line.start` to `line.end`.
    pub dir_edges: [DirEdgeId; 2],
    pub is_marked: bool,
}

#[derive(Clone, Debug)]
pub struct DirectedEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub edge_idx: EdgeId,
    /// Index of the symmetric (reverse) edge
    pub sym_idx: DirEdgeId,
    pub angle: f64,
    pub is_visited: bool,
    /// Part of a pruned dangle.
    pub is_marked: bool,
    /// Orientation relative to the parent edge's line.
    pub edge_direction: bool,
    /// Face traced on the left of this edge.
    pub face: Option<FaceId>,
}

/// A closed ring produced by face tracing, with the directed edges that bound it.
#[derive(Clone, Debug)]
pub struct FaceRing {
    pub ring: LineString<f64>,
    pub edges: Vec<DirEdgeId>,
}

pub struct PlanarGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub directed_edges: Vec<DirectedEdge>,
    /// Lookup map to dedup nodes during construction.
    pub node_map: HashMap<NodeKey, NodeId>,
    /// Coordinates closer than this share a node.
    pub precision: f64,
}

// Quantized coordinate so nodes can be looked up by hash (f64 is not Hash)
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct NodeKey(i64, i64);

impl NodeKey {
    pub fn new(c: Coord<f64>, precision: f64) -> Self {
        if precision > 0.0 {
            NodeKey((c.x / precision).round() as i64, (c.y / precision).round() as i64)
        } else {
            NodeKey(c.x.to_bits() as i64, c.y.to_bits() as i64)
        }
    }
}

impl Default for PlanarGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanarGraph {
    pub fn new() -> Self {
        Self::with_precision(1e-9)
    }

    pub fn with_precision(precision: f64) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            directed_edges: Vec::new(),
            node_map: HashMap::new(),
            precision,
        }
    }

    pub fn node_at(&self, coord: Coord<f64>) -> Option<NodeId> {
        self.node_map.get(&NodeKey::new(coord, self.precision)).copied()
    }

    pub fn add_node(&mut self, coord: Coord<f64>) -> NodeId {
        let key = NodeKey::new(coord, self.precision);
        if let Some(&id) = self.node_map.get(&key) {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            coordinate: coord,
            outgoing_edges: SmallVec::new(),
            degree: 0,
            is_marked: false,
        });
        self.node_map.insert(key, id);
        id
    }

    /// Adds one segment as an undirected edge with its two half-edges.
    /// Returns `None` when both ends collapse onto the same node.
    pub fn add_segment(&mut self, line: Line<f64>, segment: usize) -> Option<EdgeId> {
        let u = self.add_node(line.start);
        let v = self.add_node(line.end);
        if u == v {
            return None;
        }

        // Angles are measured between snapped node coordinates so that every
        // edge leaving a node is sorted around the same point.
        let p0 = self.nodes[u].coordinate;
        let p1 = self.nodes[v].coordinate;

        let edge_idx = self.edges.len();
        let de_u_v_idx = self.directed_edges.len();
        let de_v_u_idx = de_u_v_idx + 1;

        self.directed_edges.push(DirectedEdge {
            src: u,
            dst: v,
            edge_idx,
            sym_idx: de_v_u_idx,
            angle: (p1.y - p0.y).atan2(p1.x - p0.x),
            is_visited: false,
            is_marked: false,
            edge_direction: true,
            face: None,
        });
        self.directed_edges.push(DirectedEdge {
            src: v,
            dst: u,
            edge_idx,
            sym_idx: de_u_v_idx,
            angle: (p0.y - p1.y).atan2(p0.x - p1.x),
            is_visited: false,
            is_marked: false,
            edge_direction: false,
            face: None,
        });

        self.edges.push(Edge {
            line,
            segment,
            dir_edges: [de_u_v_idx, de_v_u_idx],
            is_marked: false,
        });

        self.nodes[u].outgoing_edges.push(de_u_v_idx);
        self.nodes[u].degree += 1;
        self.nodes[v].outgoing_edges.push(de_v_u_idx);
        self.nodes[v].degree += 1;

        Some(edge_idx)
    }

    /// Bulk loads segments, returning for each one the edge it became.
    pub fn bulk_load(&mut self, lines: &[Line<f64>]) -> Vec<Option<EdgeId>> {
        self.edges.reserve(lines.len());
        self.directed_edges.reserve(lines.len() * 2);
        lines.iter().enumerate().map(|(i, l)| self.add_segment(*l, i)).collect()
    }

    /// Adds a line string to the graph.
    /// Assumes the line string is properly noded.
    pub fn add_line_string(&mut self, line: LineString<f64>) {
        for segment in line.lines() {
            let idx = self.edges.len();
            self.add_segment(segment, idx);
        }
    }

    /// Sorts all outgoing edges of all nodes by angle.
    pub fn sort_edges(&mut self) {
        let directed_edges = &self.directed_edges;
        iterate_mut(&mut self.nodes, |node| {
            node.outgoing_edges.sort_by(|&a_idx, &b_idx| {
                let a = &directed_edges[a_idx];
                let b = &directed_edges[b_idx];
                a.angle.partial_cmp(&b.angle).unwrap_or(std::cmp::Ordering::Equal)
            });
        });
    }

    /// Prunes dangles (nodes with degree 1) from the graph iteratively.
    pub fn prune_dangles(&mut self) -> usize {
        let mut dangles_removed = 0;
        let mut to_process: Vec<NodeId> = self.nodes.iter().enumerate()
            .filter(|(_, n)| n.degree == 1 && !n.is_marked)
            .map(|(i, _)| i)
            .collect();

        while let Some(node_idx) = to_process.pop() {
            if self.nodes[node_idx].degree != 1 {
                continue;
            }

            self.nodes[node_idx].is_marked = true;
            self.nodes[node_idx].degree = 0;
            dangles_removed += 1;

            let found_de_idx = self.nodes[node_idx]
                .outgoing_edges
                .iter()
                .copied()
                .find(|&de_idx| !self.directed_edges[de_idx].is_marked);

            if let Some(de_idx) = found_de_idx {
                self.directed_edges[de_idx].is_marked = true;
                let sym_idx = self.directed_edges[de_idx].sym_idx;
                self.directed_edges[sym_idx].is_marked = true;
                let edge_idx = self.directed_edges[de_idx].edge_idx;
                self.edges[edge_idx].is_marked = true;

                let neighbor_idx = self.directed_edges[de_idx].dst;
                let neighbor = &mut self.nodes[neighbor_idx];
                if neighbor.degree > 0 {
                    neighbor.degree -= 1;
                    if neighbor.degree == 1 && !neighbor.is_marked {
                        to_process.push(neighbor_idx);
                    }
                }
            }
        }
        dangles_removed
    }

    /// Traces every face of the graph.
    ///
    /// From each directed edge the walk continues along the next unmarked
    /// edge clockwise from the reverse edge, which keeps the face on the
    /// left. Bounded faces come out counter-clockwise; the outer boundary of
    /// each connected component comes out clockwise. Every traced directed
    /// edge records the index of its ring in `face`.
    pub fn trace_faces(&mut self) -> Vec<FaceRing> {
        let mut rings = Vec::new();

        for de in &mut self.directed_edges {
            de.is_visited = false;
            de.face = None;
        }

        for start_de_idx in 0..self.directed_edges.len() {
            if self.directed_edges[start_de_idx].is_visited || self.directed_edges[start_de_idx].is_marked {
                continue;
            }

            let mut ring_edges = Vec::new();
            let mut curr_de_idx = start_de_idx;
            let mut is_valid_ring = true;

            loop {
                let curr_de = &mut self.directed_edges[curr_de_idx];
                curr_de.is_visited = true;
                ring_edges.push(curr_de_idx);

                let sym_idx = curr_de.sym_idx;
                let dst_node = &self.nodes[curr_de.dst];

                let Some(idx_in_list) = dst_node.outgoing_edges.iter().position(|&idx| idx == sym_idx) else {
                    is_valid_ring = false;
                    break;
                };

                // Find next unmarked edge clockwise from the reverse edge
                let len = dst_node.outgoing_edges.len();
                let next_de_idx = (1..=len)
                    .map(|i| dst_node.outgoing_edges[(idx_in_list + len - i) % len])
                    .find(|&candidate| !self.directed_edges[candidate].is_marked);

                match next_de_idx {
                    Some(next) => curr_de_idx = next,
                    None => {
                        is_valid_ring = false;
                        break;
                    }
                }

                if curr_de_idx == start_de_idx {
                    break;
                }

                if self.directed_edges[curr_de_idx].is_visited {
                    is_valid_ring = false;
                    break;
                }
            }

            if !is_valid_ring || ring_edges.is_empty() {
                log::warn!("discarding unclosed edge ring starting at directed edge {}", start_de_idx);
                continue;
            }

            let face_id = rings.len();
            let mut coords = Vec::with_capacity(ring_edges.len() + 1);
            coords.push(self.nodes[self.directed_edges[ring_edges[0]].src].coordinate);
            for &de_idx in &ring_edges {
                let de = &mut self.directed_edges[de_idx];
                de.face = Some(face_id);
                coords.push(self.nodes[de.dst].coordinate);
            }

            rings.push(FaceRing {
                ring: LineString::new(coords),
                edges: ring_edges,
            });
        }

        rings
    }
}
