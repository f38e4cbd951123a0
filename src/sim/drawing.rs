//! Vector line drawings that describe the map outline
//!
//! A drawing is a bag of line segments in its own coordinate system (y grows
//! downward, as in SVG), tagged with what it outlines and where its local
//! origin sits in the world. Drawings load from JSON or straight from the
//! `<line>` elements of an SVG file.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{MAX_POINTS_PER_SEGMENT, Segment};
use crate::error::Result;

/// What a map outline represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Building,
    Tree,
    Other,
}

/// A line as it appears in the source file; any coordinate may be missing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawSegment {
    pub x1: Option<f32>,
    pub y1: Option<f32>,
    pub x2: Option<f32>,
    pub y2: Option<f32>,
}

impl RawSegment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: Some(x1),
            y1: Some(y1),
            x2: Some(x2),
            y2: Some(y2),
        }
    }

    /// The segment in drawing space, if all four coordinates are usable
    pub fn to_segment(&self) -> Option<Segment> {
        let coords = [self.x1?, self.y1?, self.x2?, self.y2?];
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        Some(Segment::new(
            Vec2::new(coords[0], coords[1]),
            Vec2::new(coords[2], coords[3]),
        ))
    }
}

/// One outline layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapDrawing {
    #[serde(default)]
    pub category: Category,
    /// World position of the drawing's (0, 0); falls back to the map settings
    #[serde(default)]
    pub origin: Option<Vec2>,
    #[serde(default)]
    pub lines: Vec<RawSegment>,
}

impl MapDrawing {
    pub fn new(category: Category, origin: Option<Vec2>, lines: Vec<RawSegment>) -> Self {
        Self {
            category,
            origin,
            lines,
        }
    }

    /// Read every `<line>` element of an SVG document
    ///
    /// Groups and nesting are ignored. A coordinate attribute that is
    /// missing or not a plain number comes through as `None`.
    pub fn from_svg(svg: &str, category: Category, origin: Option<Vec2>) -> Result<Self> {
        let doc = roxmltree::Document::parse(svg)?;
        let lines: Vec<RawSegment> = doc
            .descendants()
            .filter(|n| n.has_tag_name("line"))
            .map(|n| RawSegment {
                x1: svg_coord(n, "x1"),
                y1: svg_coord(n, "y1"),
                x2: svg_coord(n, "x2"),
                y2: svg_coord(n, "y2"),
            })
            .collect();
        log::debug!("Read {} {:?} lines from SVG", lines.len(), category);
        Ok(Self::new(category, origin, lines))
    }

    /// World-space segments plus the number of lines that had to be skipped
    ///
    /// A line is skipped when a coordinate is missing or not finite, or
    /// when resampling it at `fill_gap` would take more than
    /// `MAX_POINTS_PER_SEGMENT` points.
    pub fn world_segments(&self, fallback_origin: Vec2, fill_gap: f32) -> (Vec<Segment>, usize) {
        let origin = self.origin.unwrap_or(fallback_origin);
        let mut skipped = 0;
        let segments = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let Some(seg) = raw.to_segment() else {
                    log::warn!("Skipping malformed {:?} line #{}: {:?}", self.category, i, raw);
                    skipped += 1;
                    return None;
                };
                let seg = seg.to_world(origin);
                if seg.sample_count(fill_gap).is_none() {
                    log::warn!(
                        "Skipping {:?} line #{}: length {} needs over {} points at gap {}",
                        self.category,
                        i,
                        seg.length(),
                        MAX_POINTS_PER_SEGMENT,
                        fill_gap
                    );
                    skipped += 1;
                    return None;
                }
                Some(seg)
            })
            .collect();
        (segments, skipped)
    }
}

fn svg_coord(node: roxmltree::Node<'_, '_>, name: &str) -> Option<f32> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}

/// World position of the bundled drawings' origin
const DEMO_ORIGIN: Vec2 = Vec2::new(-30.0, 20.0);

/// A whole map file: several drawings layered together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSource {
    pub drawings: Vec<MapDrawing>,
}

impl MapSource {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The small city block bundled with the app: buildings from JSON,
    /// trees from SVG
    pub fn demo() -> Result<Self> {
        let mut source = Self::from_json(include_str!("../../assets/demo_map.json"))?;
        source.drawings.push(MapDrawing::from_svg(
            include_str!("../../assets/demo_trees.svg"),
            Category::Tree,
            Some(DEMO_ORIGIN),
        )?);
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_coordinates_are_skipped() {
        let json = r#"{
            "drawings": [{
                "category": "tree",
                "origin": [0.0, 0.0],
                "lines": [
                    { "x1": 0, "y1": 0, "x2": 1, "y2": 0 },
                    { "x1": 0, "y1": 0, "x2": 1 },
                    { "x1": 2, "y1": 2, "x2": 3, "y2": 5 }
                ]
            }]
        }"#;
        let source = MapSource::from_json(json).unwrap();
        let drawing = &source.drawings[0];
        assert_eq!(drawing.category, Category::Tree);

        let (segments, skipped) = drawing.world_segments(Vec2::new(100.0, 100.0), 0.5);
        assert_eq!(skipped, 1);
        assert_eq!(segments.len(), 2);
        // Own origin wins over the fallback, y is flipped
        assert_eq!(segments[1].end, Vec2::new(3.0, -5.0));
    }

    #[test]
    fn test_non_finite_rejected() {
        let raw = RawSegment::new(0.0, f32::NAN, 1.0, 1.0);
        assert!(raw.to_segment().is_none());
    }

    #[test]
    fn test_fallback_origin_and_default_category() {
        let drawing = MapDrawing {
            lines: vec![RawSegment::new(1.0, 1.0, 2.0, 1.0)],
            ..Default::default()
        };
        assert_eq!(drawing.category, Category::Building);
        let (segments, _) = drawing.world_segments(Vec2::new(-10.0, 10.0), 0.5);
        assert_eq!(segments[0].start, Vec2::new(-9.0, 9.0));
    }

    #[test]
    fn test_overflowing_line_is_skipped() {
        let drawing = MapDrawing::new(
            Category::Building,
            Some(Vec2::ZERO),
            vec![
                RawSegment::new(-3.0e38, 0.0, 3.0e38, 0.0),
                RawSegment::new(0.0, 0.0, 1.0e6, 0.0),
                RawSegment::new(0.0, 0.0, 2.0, 0.0),
            ],
        );
        let (segments, skipped) = drawing.world_segments(Vec2::ZERO, 0.5);
        assert_eq!(skipped, 2);
        assert_eq!(segments, vec![Segment::new(Vec2::ZERO, Vec2::new(2.0, 0.0))]);
    }

    #[test]
    fn test_svg_lines() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
            <rect x="0" y="0" width="10" height="10"/>
            <g stroke="black">
                <line x1="1" y1="2" x2="3" y2="4"/>
                <line x1=" 5.5 " y1="0" x2="5.5" y2="8"/>
            </g>
        </svg>"#;
        let drawing = MapDrawing::from_svg(svg, Category::Tree, Some(Vec2::ZERO)).unwrap();
        assert_eq!(drawing.category, Category::Tree);
        assert_eq!(drawing.lines.len(), 2);

        let (segments, skipped) = drawing.world_segments(Vec2::new(50.0, 50.0), 0.5);
        assert_eq!(skipped, 0);
        assert_eq!(segments[0], Segment::new(Vec2::new(1.0, -2.0), Vec2::new(3.0, -4.0)));
        assert_eq!(segments[1].end, Vec2::new(5.5, -8.0));
    }

    #[test]
    fn test_svg_missing_attribute() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
            <line x1="0" y1="0" x2="4"/>
            <line x1="0" y1="0" x2="4" y2="abc"/>
            <line x1="0" y1="1" x2="4" y2="1"/>
        </svg>"#;
        let drawing = MapDrawing::from_svg(svg, Category::Building, None).unwrap();
        assert_eq!(drawing.lines[0].y2, None);
        assert_eq!(drawing.lines[0].x2, Some(4.0));
        assert_eq!(drawing.lines[1].y2, None);

        let (segments, skipped) = drawing.world_segments(Vec2::ZERO, 0.5);
        assert_eq!(skipped, 2);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_bad_svg_is_an_error() {
        let err = MapDrawing::from_svg("<svg><line></svg>", Category::Tree, None).unwrap_err();
        assert!(matches!(err, crate::error::SimError::Svg(_)));
    }

    #[test]
    fn test_demo_map_parses() {
        let source = MapSource::demo().unwrap();
        assert_eq!(source.drawings.len(), 2);
        assert_eq!(source.drawings[1].category, Category::Tree);
        for drawing in &source.drawings {
            let (segments, skipped) = drawing.world_segments(Vec2::ZERO, 0.5);
            assert_eq!(skipped, 0);
            assert!(segments.len() > 10);
        }
    }
}
