#[cfg(test)]
mod tests {
    use crate::Polygonizer;
    use geo::Area;
    use geo_types::LineString;

    #[test]
    fn test_polygonize_simple_triangle() {
        let mut poly = Polygonizer::new();
        poly.add_geometry(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]).into());
        poly.add_geometry(LineString::from(vec![(10.0, 0.0), (0.0, 10.0)]).into());
        poly.add_geometry(LineString::from(vec![(0.0, 10.0), (0.0, 0.0)]).into());

        let polygons = poly.polygonize().unwrap();
        assert_eq!(polygons.len(), 1);
        assert!((polygons[0].unsigned_area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygonize_hole() {
        let mut poly = Polygonizer::new();
        // Outer square
        poly.add_geometry(LineString::from(vec![
            (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)
        ]).into());

        // Inner square
        poly.add_geometry(LineString::from(vec![
            (2.0, 2.0), (2.0, 8.0), (8.0, 8.0), (8.0, 2.0), (2.0, 2.0)
        ]).into());

        let polygons = poly.polygonize().unwrap();
        assert_eq!(polygons.len(), 2, "Expected 2 polygons, found {}", polygons.len());

        let donut = polygons.iter().find(|p| (p.unsigned_area() - 64.0).abs() < 1.0);
        assert!(donut.is_some(), "Donut polygon not found");
        assert_eq!(donut.unwrap().interiors().len(), 1);

        let island = polygons.iter().find(|p| (p.unsigned_area() - 36.0).abs() < 1.0);
        assert!(island.is_some(), "Island polygon not found");
    }

    #[test]
    fn test_noding_crossing_lines() {
        let mut poly = Polygonizer::new();
        poly.node_input = true;

        // Frame
        poly.add_geometry(LineString::from(vec![
            (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)
        ]).into());

        // Diagonals
        poly.add_geometry(LineString::from(vec![(0.0, 0.0), (10.0, 10.0)]).into());
        poly.add_geometry(LineString::from(vec![(0.0, 10.0), (10.0, 0.0)]).into());

        let polygons = poly.polygonize().expect("Polygonization failed");
        // The outer boundary is the unbounded face, so only the 4 triangles remain.
        assert_eq!(polygons.len(), 4, "Expected 4 polygons, found {}", polygons.len());
        let triangles_count = polygons.iter().filter(|p| (p.unsigned_area() - 25.0).abs() < 1e-6).count();
        assert_eq!(triangles_count, 4, "Expected 4 triangles of area 25");
    }

    #[test]
    fn test_noding_collinear_lines() {
        let mut poly = Polygonizer::new();
        poly.node_input = true;

        // Overlap on (5,0)-(10,0); the tails at both ends are dangles.
        poly.add_geometry(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]).into());
        poly.add_geometry(LineString::from(vec![(5.0, 0.0), (15.0, 0.0)]).into());
        poly.add_geometry(LineString::from(vec![
            (10.0, 0.0), (10.0, 10.0), (5.0, 10.0), (5.0, 0.0)
        ]).into());

        let polygons = poly.polygonize().expect("Polygonization failed");
        assert_eq!(polygons.len(), 1);
        assert!((polygons[0].unsigned_area() - 50.0).abs() < 1e-6, "Expected rectangle of area 50 from collinear overlap");
    }

    #[test]
    fn test_sides_of_shared_and_outer_edges() {
        let mut poly = Polygonizer::new();
        poly.node_input = true;
        // Line 0: the shared edge, drawn upward at x = 10
        poly.add_line(0, &[LineString::from(vec![(10.0, 0.0), (10.0, 10.0)])], false);
        // Line 1: box around both squares
        poly.add_line(1, &[LineString::from(vec![
            (0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0), (0.0, 0.0)
        ])], false);

        let result = poly.polygonize_with_sides().unwrap();
        assert_eq!(result.polygons.len(), 2);

        let west = result.polygons.iter().position(|p| {
            use geo::Centroid;
            p.centroid().map(|c| c.x() < 10.0).unwrap_or(false)
        }).unwrap();
        let east = 1 - west;

        let shared: Vec<_> = result.segments.iter().zip(&result.sides)
            .filter(|(s, _)| s.tag.line == 0)
            .map(|(_, side)| *side)
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].left, Some(west));
        assert_eq!(shared[0].right, Some(east));

        // Every box segment has the map outside on one side.
        for (s, side) in result.segments.iter().zip(&result.sides) {
            if s.tag.line == 1 {
                assert!(side.left.is_some() != side.right.is_some(), "{:?} {:?}", s, side);
            }
        }
    }

    #[test]
    fn test_concealed_line_is_noded_but_does_not_split() {
        let mut poly = Polygonizer::new();
        poly.node_input = true;
        poly.add_line(0, &[LineString::from(vec![
            (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)
        ])], false);
        poly.add_line(1, &[LineString::from(vec![(5.0, 0.0), (5.0, 10.0)])], true);

        let result = poly.polygonize_with_sides().unwrap();
        assert_eq!(result.polygons.len(), 1);
        assert!((result.polygons[0].unsigned_area() - 100.0).abs() < 1e-9);

        let concealed: Vec<_> = result.segments.iter().zip(&result.sides)
            .filter(|(s, _)| s.tag.concealed)
            .collect();
        assert_eq!(concealed.len(), 1);
        assert_eq!(concealed[0].1.left, Some(0));
        assert_eq!(concealed[0].1.right, Some(0));
    }
}
