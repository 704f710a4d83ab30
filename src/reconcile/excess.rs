use crate::model::ContactLine;
use crate::noding::TaggedSegment;
use crate::polygonizer::SegmentSides;
use geo_types::{Coord, LineString};

/// A stretch of one contact line with the same polygons on either side.
#[derive(Clone, Debug, PartialEq)]
pub struct CafPiece {
    /// Index of the source line.
    pub line: usize,
    pub geometry: LineString<f64>,
    pub sides: SegmentSides,
}

/// Splits every line wherever the polygons beside it change, or where the
/// line itself is discontinuous.
pub fn split_by_sides(segments: &[TaggedSegment], sides: &[SegmentSides]) -> Vec<CafPiece> {
    let mut pieces: Vec<CafPiece> = Vec::new();
    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut current: Option<(usize, SegmentSides)> = None;

    for (segment, side) in segments.iter().zip(sides) {
        let continues = match (current, coords.last()) {
            (Some((line, sides)), Some(last)) => {
                line == segment.tag.line && sides == *side && *last == segment.line.start
            }
            _ => false,
        };
        if !continues {
            if let Some((line, sides)) = current.take() {
                pieces.push(CafPiece { line, geometry: LineString::new(std::mem::take(&mut coords)), sides });
            }
            coords.push(segment.line.start);
            current = Some((segment.tag.line, *side));
        }
        coords.push(segment.line.end);
    }
    if let Some((line, sides)) = current {
        pieces.push(CafPiece { line, geometry: LineString::new(coords), sides });
    }
    pieces
}

/// An unconcealed contact with the same map unit on both sides.
pub fn is_excess_contact(line: &ContactLine, left_unit: Option<&str>, right_unit: Option<&str>) -> bool {
    let unconcealed = line
        .attributes
        .get(crate::model::IS_CONCEALED)
        .and_then(|v| v.as_str())
        .map_or(false, |v| v.trim().eq_ignore_ascii_case("N"));
    match (left_unit, right_unit) {
        (Some(left), Some(right)) => line.is_contact() && unconcealed && left == right,
        _ => false,
    }
}
