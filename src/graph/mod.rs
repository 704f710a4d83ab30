pub mod planar_graph;


pub use planar_graph::{DirEdgeId, EdgeId, FaceId, FaceRing, NodeId, PlanarGraph};
